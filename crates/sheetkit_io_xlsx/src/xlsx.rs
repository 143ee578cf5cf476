//! XLSX container bridge: `rust_xlsxwriter` out, `calamine` in.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Range, Reader, Xlsx, open_workbook_from_rs};
use rust_xlsxwriter::{Format, FormatBorder, FormatUnderline, Workbook, Worksheet};

use crate::conf::C_NUM_FORMAT_DATETIME;
use crate::document::{DocCell, DocSheet, DocWorkbook};
use crate::error::{GridMapError, Result};
use crate::spec::{EnumCellValue, SpecCellFormat};
use crate::util::{
    cast_col_num, cast_row_num, convert_datetime_to_excel_serial,
    convert_excel_serial_to_datetime,
};

////////////////////////////////////////////////////////////////////////////////
// #region Save

/// Serialize a workbook model to XLSX bytes.
///
/// Formats are built once per distinct [`SpecCellFormat`] for the duration of the call.
pub fn save_workbook_to_buffer(doc: &DocWorkbook) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let mut dict_format_cache: HashMap<SpecCellFormat, Format> = HashMap::new();

    if doc.sheets.is_empty() {
        workbook.add_worksheet();
    }
    for sheet in &doc.sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        write_sheet(worksheet, sheet, &mut dict_format_cache)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_sheet(
    worksheet: &mut Worksheet,
    sheet: &DocSheet,
    dict_format_cache: &mut HashMap<SpecCellFormat, Format>,
) -> Result<()> {
    for (row_idx, row) in &sheet.rows {
        for (col_idx, cell) in &row.cells {
            write_cell_with_format(worksheet, *row_idx, *col_idx, cell, dict_format_cache)?;
        }
    }

    for (col_idx, n_width) in &sheet.col_widths {
        worksheet.set_column_width(*col_idx, *n_width)?;
    }

    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: u32,
    col_idx: u16,
    cell: &DocCell,
    dict_format_cache: &mut HashMap<SpecCellFormat, Format>,
) -> Result<()> {
    let mut spec_format = cell.format.clone();
    if matches!(cell.value, EnumCellValue::DateTime(_))
        && spec_format
            .as_ref()
            .is_none_or(|fmt| fmt.num_format.is_none())
    {
        spec_format = Some(spec_format.unwrap_or_default().with_(SpecCellFormat {
            num_format: Some(C_NUM_FORMAT_DATETIME.to_string()),
            ..Default::default()
        }));
    }
    let format = derive_cached_format(spec_format.as_ref(), dict_format_cache);

    if let Some(c_formula) = &cell.formula {
        worksheet.write_formula_with_format(row_idx, col_idx, c_formula.as_str(), &format)?;
        return Ok(());
    }

    match &cell.value {
        EnumCellValue::Empty => {
            if spec_format.is_some() {
                worksheet.write_blank(row_idx, col_idx, &format)?;
            }
        }
        EnumCellValue::Text(val) => {
            worksheet.write_string_with_format(row_idx, col_idx, val, &format)?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(row_idx, col_idx, *val, &format)?;
        }
        EnumCellValue::Boolean(val) => {
            worksheet.write_boolean_with_format(row_idx, col_idx, *val, &format)?;
        }
        EnumCellValue::DateTime(val) => {
            worksheet.write_number_with_format(
                row_idx,
                col_idx,
                convert_datetime_to_excel_serial(val),
                &format,
            )?;
        }
    }
    Ok(())
}

fn derive_cached_format(
    spec: Option<&SpecCellFormat>,
    dict_format_cache: &mut HashMap<SpecCellFormat, Format>,
) -> Format {
    let Some(spec) = spec else {
        return Format::new();
    };
    dict_format_cache
        .entry(spec.clone())
        .or_insert_with(|| derive_rust_xlsx_format(spec))
        .clone()
}

/// Translate a format spec into a `rust_xlsxwriter` format.
pub fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }
    if spec.underline.unwrap_or(false) {
        format = format.set_underline(FormatUnderline::Single);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Load

/// Parse XLSX bytes into a workbook model.
///
/// Values and formulas are loaded; styles and merges are not. Every row up to the end
/// of a sheet's used range is materialized, so blank rows are present (and empty).
/// Templates are edited through [`crate::book`] instead.
pub fn load_workbook_from_bytes(bytes: &[u8]) -> Result<DocWorkbook> {
    if bytes.is_empty() {
        return Err(GridMapError::MissingInput("workbook bytes are empty".to_string()));
    }
    let mut reader: Xlsx<Cursor<Vec<u8>>> = open_workbook_from_rs(Cursor::new(bytes.to_vec()))?;

    let mut doc = DocWorkbook::new();
    let l_names: Vec<String> = reader.sheet_names().to_vec();
    for c_name in l_names {
        let range = reader.worksheet_range(&c_name)?;
        let range_formula = reader.worksheet_formula(&c_name).ok();
        let mut sheet = DocSheet::new(c_name);
        fill_sheet_values(&mut sheet, &range)?;
        if let Some(range_formula) = range_formula {
            fill_sheet_formulas(&mut sheet, &range_formula)?;
        }
        doc.sheets.push(sheet);
    }
    log::debug!("loaded workbook with {} sheet(s)", doc.sheets.len());
    Ok(doc)
}

/// Read and parse an XLSX file.
///
/// Fails with [`GridMapError::TemplateNotFound`] when `path` does not exist.
pub fn load_workbook_from_path(path: &Path) -> Result<DocWorkbook> {
    if !path.exists() {
        return Err(GridMapError::TemplateNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path).map_err(|source| GridMapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_workbook_from_bytes(&bytes)
}

fn fill_sheet_values(sheet: &mut DocSheet, range: &Range<Data>) -> Result<()> {
    let (Some((n_row_start, n_col_start)), Some((n_row_end, _))) = (range.start(), range.end())
    else {
        return Ok(());
    };

    for row_idx in 0..=n_row_end {
        sheet.get_or_create_row(row_idx);
    }
    for (n_row_rel, n_col_rel, data) in range.used_cells() {
        let value = derive_cell_value_from_data(data);
        if value.is_blank() {
            continue;
        }
        let row_idx = cast_row_num(n_row_start as usize + n_row_rel)?;
        let col_idx = cast_col_num(n_col_start as usize + n_col_rel)?;
        sheet.get_or_create_cell(row_idx, col_idx).value = value;
    }
    Ok(())
}

fn fill_sheet_formulas(sheet: &mut DocSheet, range: &Range<String>) -> Result<()> {
    let Some((n_row_start, n_col_start)) = range.start() else {
        return Ok(());
    };
    for (n_row_rel, n_col_rel, c_formula) in range.used_cells() {
        if c_formula.is_empty() {
            continue;
        }
        let row_idx = cast_row_num(n_row_start as usize + n_row_rel)?;
        let col_idx = cast_col_num(n_col_start as usize + n_col_rel)?;
        sheet.get_or_create_cell(row_idx, col_idx).formula = Some(c_formula.clone());
    }
    Ok(())
}

fn derive_cell_value_from_data(data: &Data) -> EnumCellValue {
    match data {
        Data::Empty => EnumCellValue::Empty,
        Data::String(s) => EnumCellValue::Text(s.clone()),
        Data::Float(f) => EnumCellValue::Number(*f),
        Data::Int(i) => EnumCellValue::Number(*i as f64),
        Data::Bool(b) => EnumCellValue::Boolean(*b),
        Data::DateTime(dt) => match convert_excel_serial_to_datetime(dt.as_f64()) {
            Some(val) => EnumCellValue::DateTime(val),
            None => EnumCellValue::Number(dt.as_f64()),
        },
        other => EnumCellValue::Text(other.to_string()),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_save_then_load_keeps_values_and_formulas() {
        let mut doc = DocWorkbook::new();
        let sheet = doc.get_or_create_sheet("Data");
        let dt = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|date| date.and_hms_opt(8, 30, 0))
            .expect("datetime");
        sheet.set_value(0, 0, EnumCellValue::Text("name".to_string()), None);
        sheet.set_value(1, 0, EnumCellValue::Number(2.5), None);
        sheet.set_value(2, 0, EnumCellValue::Boolean(true), None);
        sheet.set_value(3, 0, EnumCellValue::DateTime(dt), None);
        sheet.get_or_create_cell(4, 0).formula = Some("A2*2".to_string());

        let bytes = save_workbook_to_buffer(&doc).expect("save");
        let loaded = load_workbook_from_bytes(&bytes).expect("load");
        let sheet = loaded.sheet("Data").expect("sheet");

        assert_eq!(sheet.value(0, 0), EnumCellValue::Text("name".to_string()));
        assert_eq!(sheet.value(1, 0), EnumCellValue::Number(2.5));
        assert_eq!(sheet.value(2, 0), EnumCellValue::Boolean(true));
        assert_eq!(sheet.value(3, 0), EnumCellValue::DateTime(dt));
        assert_eq!(
            sheet.cell(4, 0).and_then(|cell| cell.formula.clone()).as_deref(),
            Some("A2*2")
        );
    }

    #[test]
    fn test_blank_rows_inside_used_range_are_materialized() {
        let mut doc = DocWorkbook::new();
        let sheet = doc.get_or_create_sheet("S");
        sheet.set_value(0, 0, EnumCellValue::Text("a".to_string()), None);
        sheet.set_value(3, 0, EnumCellValue::Text("d".to_string()), None);

        let loaded = load_workbook_from_bytes(&save_workbook_to_buffer(&doc).expect("save"))
            .expect("load");
        let sheet = loaded.sheet("S").expect("sheet");
        assert!(sheet.row(1).is_some());
        assert!(sheet.row(2).is_some());
        assert_eq!(sheet.last_row(), Some(3));
    }

    #[test]
    fn test_missing_template_path() {
        let err = load_workbook_from_path(Path::new("/definitely/not/here.xlsx"))
            .expect_err("missing");
        assert!(matches!(err, GridMapError::TemplateNotFound { .. }));
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_empty_bytes_are_missing_input() {
        assert!(matches!(
            load_workbook_from_bytes(&[]),
            Err(GridMapError::MissingInput(_))
        ));
    }
}
