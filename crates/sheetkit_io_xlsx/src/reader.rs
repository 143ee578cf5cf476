//! Grid reader: rows back into records.

use crate::codec::decode_cell_value;
use crate::conf::N_NROWS_EXCEL_MAX;
use crate::document::DocSheet;
use crate::error::{GridMapError, Result};
use crate::record::GridRecord;
use crate::spec::{EnumFieldValue, SpecResolvedSchema};

/// Read records from `sheet`, starting at zero-based `row_start`.
///
/// Scanning stops at the first row whose configured columns are all blank. Blank cells
/// leave the field at its default.
pub fn read_grid<R: GridRecord + Default>(
    sheet: &DocSheet,
    schema: &SpecResolvedSchema,
    row_start: u32,
) -> Result<Vec<R>> {
    let mut l_records = Vec::new();
    let mut row_idx = row_start;

    while (row_idx as usize) < N_NROWS_EXCEL_MAX && !is_row_blank(sheet, schema, row_idx) {
        let n_idx_record = l_records.len();
        let mut record = R::default();
        for field in &schema.fields {
            let Some(cell) = sheet.cell(row_idx, field.col_idx()) else {
                continue;
            };
            let value = decode_cell_value(&field.name, field.kind, &cell.value)?;
            if matches!(value, EnumFieldValue::Null) {
                continue;
            }
            if !record.set_field_value(&field.name, value) {
                return Err(GridMapError::UnknownField {
                    field: field.name.clone(),
                    index: n_idx_record,
                });
            }
        }
        l_records.push(record);
        row_idx += 1;
    }

    log::debug!(
        "read {} record(s) from sheet {:?} starting at row {row_start}",
        l_records.len(),
        sheet.name
    );
    Ok(l_records)
}

fn is_row_blank(sheet: &DocSheet, schema: &SpecResolvedSchema, row_idx: u32) -> bool {
    schema.fields.iter().all(|field| {
        sheet
            .cell(row_idx, field.col_idx())
            .is_none_or(|cell| cell.value.is_blank())
    })
}
