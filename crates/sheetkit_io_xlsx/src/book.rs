//! Template container bridge: XLSX edited in place with `umya_spreadsheet`.
//!
//! Template sheets keep everything the engine does not touch (styles, merges, column
//! widths, drawings, formulas). Coordinates here are 1-based `(col, row)` as in the
//! container.

use std::io::Cursor;
use std::path::Path;

use umya_spreadsheet::{Cell, Spreadsheet, Worksheet};

use crate::conf::C_NUM_FORMAT_DATETIME;
use crate::error::{GridMapError, Result};
use crate::spec::{EnumCellValue, SpecRegion};
use crate::util::{convert_datetime_to_excel_serial, letter_to_number, number_to_column};

////////////////////////////////////////////////////////////////////////////////
// #region OpenSave

/// Parse template bytes, deserializing every sheet.
pub fn open_template_from_bytes(bytes: &[u8]) -> Result<Spreadsheet> {
    if bytes.is_empty() {
        return Err(GridMapError::MissingInput("template bytes are empty".to_string()));
    }
    let book = umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes.to_vec()), true)?;
    log::debug!("opened template with {} sheet(s)", book.get_sheet_collection().len());
    Ok(book)
}

/// Read and parse a template file.
///
/// Fails with [`GridMapError::TemplateNotFound`] when `path` does not exist.
pub fn open_template_from_path(path: &Path) -> Result<Spreadsheet> {
    if !path.exists() {
        return Err(GridMapError::TemplateNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path).map_err(|source| GridMapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    open_template_from_bytes(&bytes)
}

/// Serialize an edited template to XLSX bytes.
pub fn save_template_to_buffer(book: &Spreadsheet) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(book, &mut buf)?;
    Ok(buf.into_inner())
}

/// Resolve the target sheet: by name, or the first sheet when `sheet_name` is `None`.
///
/// Returns the sheet's tab index and name. A blank name is [`GridMapError::MissingInput`].
pub fn select_template_sheet(
    book: &Spreadsheet,
    sheet_name: Option<&str>,
) -> Result<(usize, String)> {
    let l_sheets = book.get_sheet_collection();
    match sheet_name {
        None => l_sheets
            .first()
            .map(|sheet| (0, sheet.get_name().to_string()))
            .ok_or_else(|| GridMapError::SheetNotFound("<first sheet>".to_string())),
        Some(c_name) if c_name.trim().is_empty() => {
            Err(GridMapError::MissingInput("template sheet name".to_string()))
        }
        Some(c_name) => l_sheets
            .iter()
            .position(|sheet| sheet.get_name() == c_name)
            .map(|n_idx| (n_idx, c_name.to_string()))
            .ok_or_else(|| GridMapError::SheetNotFound(c_name.to_string())),
    }
}

/// Make tab `n_idx` the active sheet and apply the template default column width.
pub fn finalize_template_sheet(
    book: &mut Spreadsheet,
    n_idx: usize,
    width_col_default: Option<u32>,
) -> Result<()> {
    let n_tab = u32::try_from(n_idx)
        .map_err(|_| GridMapError::SheetNotFound(format!("sheet index {n_idx}")))?;
    book.get_workbook_view_mut().set_active_tab(n_tab);

    if let Some(n_width) = width_col_default {
        let sheet = book
            .get_sheet_mut(&n_idx)
            .ok_or_else(|| GridMapError::SheetNotFound(format!("sheet index {n_idx}")))?;
        sheet
            .get_sheet_format_properties_mut()
            .set_default_column_width(f64::from(n_width));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Cells

/// Overwrite a cell's value, keeping its style. Any formula is dropped.
///
/// Date/times are stored as serial numbers with a date number format.
pub fn write_cell_value(cell: &mut Cell, value: &EnumCellValue) {
    cell.get_cell_value_mut().remove_formula();
    match value {
        EnumCellValue::Empty => {
            cell.set_blank();
        }
        EnumCellValue::Text(val) => {
            cell.set_value_string(val.clone());
        }
        EnumCellValue::Number(val) => {
            cell.set_value_number(*val);
        }
        EnumCellValue::Boolean(val) => {
            cell.set_value_bool(*val);
        }
        EnumCellValue::DateTime(val) => {
            cell.set_value_number(convert_datetime_to_excel_serial(val));
            cell.get_style_mut()
                .get_number_format_mut()
                .set_format_code(C_NUM_FORMAT_DATETIME);
        }
    }
}

/// `true` when the cell at `(n_col, n_row)` is absent, or holds neither a value nor a
/// formula.
pub fn validate_cell_blank(sheet: &Worksheet, n_col: u32, n_row: u32) -> bool {
    sheet
        .get_cell((n_col, n_row))
        .is_none_or(|cell| !cell.is_formula() && cell.get_value().is_empty())
}

/// Last used row (1-based), or `None` for an empty sheet.
pub fn derive_last_row(sheet: &Worksheet) -> Option<u32> {
    match sheet.get_highest_row() {
        0 => None,
        n_row => Some(n_row),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MergedRanges

/// Merged ranges of the sheet as 1-based regions.
///
/// Whole-row or whole-column references are skipped.
pub fn derive_merged_regions(sheet: &Worksheet) -> Vec<SpecRegion> {
    sheet
        .get_merge_cells()
        .iter()
        .filter_map(|range| derive_region_from_reference(&range.get_range()))
        .collect()
}

/// Register `region` as one merged range.
///
/// Fails with [`GridMapError::InvalidRegion`] if it overlaps an existing merge.
pub fn add_merged_region(sheet: &mut Worksheet, region: &SpecRegion) -> Result<()> {
    if let Some(other) = derive_merged_regions(sheet)
        .into_iter()
        .find(|other| validate_regions_overlap(region, other))
    {
        return Err(GridMapError::InvalidRegion(format!(
            "{} overlaps the existing merged range {}",
            derive_reference_from_region(region)?,
            derive_reference_from_region(&other)?
        )));
    }
    sheet.add_merge_cells(derive_reference_from_region(region)?);
    Ok(())
}

/// `true` when the two regions share at least one cell.
pub fn validate_regions_overlap(left: &SpecRegion, right: &SpecRegion) -> bool {
    left.row_start <= right.row_end
        && right.row_start <= left.row_end
        && left.col_start <= right.col_end
        && right.col_start <= left.col_end
}

/// `A1:D4`-style reference of a region.
pub fn derive_reference_from_region(region: &SpecRegion) -> Result<String> {
    Ok(format!(
        "{}{}:{}{}",
        number_to_column(region.col_start)?,
        region.row_start,
        number_to_column(region.col_end)?,
        region.row_end
    ))
}

fn derive_region_from_reference(c_reference: &str) -> Option<SpecRegion> {
    let (c_first, c_last) = c_reference
        .split_once(':')
        .unwrap_or((c_reference, c_reference));
    let (n_col_start, n_row_start) = derive_cell_reference(c_first)?;
    let (n_col_end, n_row_end) = derive_cell_reference(c_last)?;
    Some(SpecRegion {
        row_start: n_row_start,
        row_end: n_row_end,
        col_start: n_col_start,
        col_end: n_col_end,
    })
}

fn derive_cell_reference(c_cell: &str) -> Option<(u32, u32)> {
    let c_cell = c_cell.trim().replace('$', "");
    let n_split = c_cell.find(|chr: char| chr.is_ascii_digit())?;
    let (c_letters, c_digits) = c_cell.split_at(n_split);
    let n_col = letter_to_number(c_letters).ok()?;
    let n_row = c_digits.parse::<u32>().ok().filter(|n_row| *n_row > 0)?;
    Some((n_col, n_row))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
