//! Template projector: records onto explicit coordinates of an existing sheet.

use std::collections::HashMap;

use umya_spreadsheet::Worksheet;

use crate::book::write_cell_value;
use crate::codec::encode_field_value;
use crate::error::{GridMapError, Result};
use crate::record::{GridRecord, Positionable};
use crate::spec::{EnumCellValue, EnumFieldKind, SpecGridReport};

/// Write every record's fields at the coordinates of its position map.
///
/// All maps, coordinates and values are checked and encoded before the first cell is
/// touched. Coordinates are trusted as given: no uniqueness check is made, later
/// entries overwrite earlier ones. Cell styles of the template are kept.
pub fn project_records<R: GridRecord + Positionable>(
    sheet: &mut Worksheet,
    records: &[R],
    report: &mut SpecGridReport,
) -> Result<()> {
    if records.is_empty() {
        report.warn(format!(
            "sheet {:?}: no records to project onto the template",
            sheet.get_name()
        ));
        return Ok(());
    }

    let l_writes = plan_projection(records)?;
    let n_cells = l_writes.len();
    for (n_col, n_row, value) in l_writes {
        write_cell_value(sheet.get_cell_mut((n_col, n_row)), &value);
    }

    report.rows_written += records.len();
    log::debug!(
        "projected {} record(s), {n_cells} cell(s) onto sheet {:?}",
        records.len(),
        sheet.get_name()
    );
    Ok(())
}

/// Encoded writes as 1-based `(col, row, value)`.
fn plan_projection<R: GridRecord + Positionable>(
    records: &[R],
) -> Result<Vec<(u32, u32, EnumCellValue)>> {
    let dict_kinds: HashMap<String, EnumFieldKind> = R::descriptors()
        .into_iter()
        .map(|descriptor| (descriptor.name, descriptor.kind))
        .collect();

    let mut l_writes = Vec::new();
    for (n_idx, record) in records.iter().enumerate() {
        let dict_positions = record
            .position_map()
            .filter(|dict_positions| !dict_positions.is_empty())
            .ok_or(GridMapError::PositionMapMissing { index: n_idx })?;

        for (c_field, position) in dict_positions {
            let (row_idx, col_idx) = position.to_zero_based()?;
            let unknown = || GridMapError::UnknownField {
                field: c_field.clone(),
                index: n_idx,
            };
            let kind = *dict_kinds.get(c_field).ok_or_else(unknown)?;
            let value = record.field_value(c_field).ok_or_else(unknown)?;
            l_writes.push((
                u32::from(col_idx) + 1,
                row_idx + 1,
                encode_field_value(c_field, kind, &value)?,
            ));
        }
    }
    Ok(l_writes)
}
