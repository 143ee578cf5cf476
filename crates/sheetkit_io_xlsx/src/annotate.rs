//! Annotation placer: merged notes and footer blocks.

use umya_spreadsheet::Worksheet;

use crate::book::{
    add_merged_region, derive_last_row, derive_merged_regions, validate_regions_overlap,
};
use crate::conf::{C_FOOTER_FONT_NAME, N_FOOTER_COLS, N_FOOTER_FONT_SIZE, N_FOOTER_ROWS};
use crate::error::{GridMapError, Result};
use crate::spec::{SpecNote, SpecRegion};

/// Write `note.text` into the first cell of its region and merge the region.
///
/// Call before compaction when both touch the same rows. Fails with
/// [`GridMapError::InvalidRegion`] when the region overlaps an existing merge.
pub fn draw_note(sheet: &mut Worksheet, note: &SpecNote) -> Result<()> {
    if note.text.trim().is_empty() {
        return Err(GridMapError::MissingInput("note text".to_string()));
    }
    let region = &note.region;
    region.validate()?;
    let if_merge = region.row_start != region.row_end || region.col_start != region.col_end;
    if if_merge
        && derive_merged_regions(sheet)
            .iter()
            .any(|other| validate_regions_overlap(region, other))
    {
        return Err(GridMapError::InvalidRegion(format!(
            "note region {region:?} overlaps an existing merged range"
        )));
    }

    sheet.get_cell_mut((region.col_end, region.row_end));
    let cell = sheet.get_cell_mut((region.col_start, region.row_start));
    cell.get_cell_value_mut().remove_formula();
    cell.set_value_string(note.text.clone());

    if if_merge {
        add_merged_region(sheet, region)?;
    }
    Ok(())
}

/// Append a footer block two rows below the last used row.
///
/// The block is one merged range of [`N_FOOTER_COLS`] × [`N_FOOTER_ROWS`] cells from
/// column A, borderless, in small italic wrapped text. Returns the 1-based anchor row.
pub fn draw_footer(sheet: &mut Worksheet, text: &str) -> Result<u32> {
    if text.trim().is_empty() {
        return Err(GridMapError::MissingInput("footer text".to_string()));
    }
    let n_row = derive_last_row(sheet).map_or(1, |n_row_last| n_row_last + 2);
    let region = SpecRegion::new(n_row, n_row + N_FOOTER_ROWS - 1, 1, N_FOOTER_COLS)?;

    let cell = sheet.get_cell_mut((1, n_row));
    cell.set_value_string(text.to_string());
    let style = cell.get_style_mut();
    let font = style.get_font_mut();
    font.set_name(C_FOOTER_FONT_NAME);
    font.set_size(N_FOOTER_FONT_SIZE);
    font.set_italic(true);
    style.get_alignment_mut().set_wrap_text(true);

    add_merged_region(sheet, &region)?;
    log::debug!("footer anchored at row {n_row} of sheet {:?}", sheet.get_name());
    Ok(n_row)
}
