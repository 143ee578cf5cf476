//! Sparse region compactor.

use umya_spreadsheet::Worksheet;

use crate::book::{derive_last_row, derive_merged_regions, validate_cell_blank};
use crate::error::Result;
use crate::spec::SpecRegion;

/// Remove rows of `region` that are blank across its column band.
///
/// Following rows shift up to close each gap; merges and formula references below move
/// with them. A row covered by a merged range touching the band counts as used. The
/// scan covers `row_start..=row_end` clamped to the last used row. Returns the number of
/// removed rows.
pub fn compact_region(sheet: &mut Worksheet, region: &SpecRegion) -> Result<usize> {
    region.validate()?;

    let Some(n_row_last_used) = derive_last_row(sheet) else {
        return Ok(0);
    };
    let mut n_row_end = u32::min(region.row_end, n_row_last_used);
    let mut n_row = region.row_start;
    let mut n_removed = 0usize;

    while n_row <= n_row_end {
        if !validate_row_blank(sheet, n_row, region) {
            n_row += 1;
            continue;
        }
        sheet.remove_row(&n_row, &1);
        n_removed += 1;
        n_row_end -= 1;
    }

    log::debug!(
        "compacted rows {}..={} cols {}..={} of sheet {:?}: {n_removed} row(s) removed",
        region.row_start,
        region.row_end,
        region.col_start,
        region.col_end,
        sheet.get_name()
    );
    Ok(n_removed)
}

fn validate_row_blank(sheet: &Worksheet, n_row: u32, region: &SpecRegion) -> bool {
    let if_merged = derive_merged_regions(sheet).iter().any(|merged| {
        merged.row_start <= n_row
            && n_row <= merged.row_end
            && merged.col_start <= region.col_end
            && region.col_start <= merged.col_end
    });
    !if_merged
        && (region.col_start..=region.col_end).all(|n_col| validate_cell_blank(sheet, n_col, n_row))
}
