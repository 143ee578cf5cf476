//! Grid renderer: header row plus one data row per record.

use crate::codec::encode_field_value;
use crate::conf::N_NROWS_EXCEL_MAX;
use crate::document::DocSheet;
use crate::error::{GridMapError, Result};
use crate::record::{GridRecord, SpecDataTable};
use crate::schema::resolve_schema;
use crate::spec::{
    EnumCellValue, EnumFieldValue, SpecAutofitCellsPolicy, SpecCellFormat, SpecGridReport,
    SpecGridWriteOptions, SpecResolvedSchema,
};
use crate::util::{cast_row_num, estimate_width_len};

/// Render `records` onto `sheet` using a resolved schema.
///
/// Row 0 holds headers; record `i` lands on row `i + 1`. Each row is encoded in full
/// before any of its cells are written.
pub fn render_grid<R: GridRecord>(
    sheet: &mut DocSheet,
    schema: &SpecResolvedSchema,
    records: &[R],
    options: &SpecGridWriteOptions,
    report: &mut SpecGridReport,
) -> Result<()> {
    write_grid(sheet, schema, records.len(), options, report, |n_idx| {
        let record = &records[n_idx];
        schema
            .fields
            .iter()
            .map(|field| {
                record
                    .field_value(&field.name)
                    .ok_or_else(|| GridMapError::UnknownField {
                        field: field.name.clone(),
                        index: n_idx,
                    })
            })
            .collect()
    })
}

/// Render a dynamic table; column `i` lands at position `i + 1`.
///
/// Short rows are padded with nulls; longer rows fail with [`GridMapError::UnknownField`].
pub fn render_table(
    sheet: &mut DocSheet,
    table: &SpecDataTable,
    options: &SpecGridWriteOptions,
    report: &mut SpecGridReport,
) -> Result<()> {
    let schema = resolve_schema(&table.descriptors())?;
    for (n_idx, row) in table.rows.iter().enumerate() {
        if row.len() > table.columns.len() {
            return Err(GridMapError::UnknownField {
                field: format!("column {}", table.columns.len() + 1),
                index: n_idx,
            });
        }
    }

    write_grid(sheet, &schema, table.rows.len(), options, report, |n_idx| {
        let row = &table.rows[n_idx];
        Ok((0..table.columns.len())
            .map(|n_col| row.get(n_col).cloned().unwrap_or_default())
            .collect())
    })
}

fn write_grid<F>(
    sheet: &mut DocSheet,
    schema: &SpecResolvedSchema,
    n_records: usize,
    options: &SpecGridWriteOptions,
    report: &mut SpecGridReport,
    mut derive_values: F,
) -> Result<()>
where
    F: FnMut(usize) -> Result<Vec<EnumFieldValue>>,
{
    validate_policy_autofit(&options.policy_autofit)?;
    if n_records >= N_NROWS_EXCEL_MAX {
        return Err(GridMapError::InvalidRegion(format!(
            "{n_records} records do not fit below the header within {N_NROWS_EXCEL_MAX} rows"
        )));
    }
    if n_records == 0 {
        report.warn(format!(
            "sheet {:?}: no records to render, writing header only",
            sheet.name
        ));
    }

    let l_fmt_by_field: Vec<SpecCellFormat> = schema
        .fields
        .iter()
        .map(|field| {
            options.fmt_body.with_(SpecCellFormat {
                num_format: field.data_format.clone(),
                ..Default::default()
            })
        })
        .collect();

    let mut l_width_by_field: Vec<usize> = vec![0; schema.len()];
    for (n_idx_field, field) in schema.fields.iter().enumerate() {
        let value = EnumCellValue::Text(field.header_name.clone());
        l_width_by_field[n_idx_field] = estimate_width_len(&value, None);
        sheet.set_value(
            0,
            field.col_idx(),
            value,
            Some(options.fmt_header.clone()),
        );
    }

    let n_rows_inferred_max = options
        .policy_autofit
        .height_body_inferred_max
        .unwrap_or(usize::MAX);

    for n_idx in 0..n_records {
        let l_values = derive_values(n_idx)?;
        let mut l_cells = Vec::with_capacity(schema.len());
        for ((field, value), fmt_field) in schema.fields.iter().zip(&l_values).zip(&l_fmt_by_field)
        {
            let cell = encode_field_value(&field.name, field.kind, value)?;
            let fmt_cell = if matches!(value, EnumFieldValue::Null) {
                options.fmt_empty.clone()
            } else {
                fmt_field.clone()
            };
            l_cells.push((field.col_idx(), cell, fmt_cell));
        }

        let row_idx = cast_row_num(n_idx + 1)?;
        for (n_idx_field, (col_idx, cell, fmt_cell)) in l_cells.into_iter().enumerate() {
            if options.policy_autofit.if_enabled && n_idx < n_rows_inferred_max {
                l_width_by_field[n_idx_field] = usize::max(
                    l_width_by_field[n_idx_field],
                    estimate_width_len(&cell, fmt_cell.num_format.as_deref()),
                );
            }
            sheet.set_value(row_idx, col_idx, cell, Some(fmt_cell));
        }
    }

    if options.policy_autofit.if_enabled {
        apply_autofit(sheet, schema, &l_width_by_field, &options.policy_autofit);
    }

    report.rows_written += n_records;
    log::debug!(
        "rendered {n_records} record(s) x {} column(s) onto sheet {:?}",
        schema.len(),
        sheet.name
    );
    Ok(())
}

fn apply_autofit(
    sheet: &mut DocSheet,
    schema: &SpecResolvedSchema,
    l_width_by_field: &[usize],
    policy_autofit: &SpecAutofitCellsPolicy,
) {
    let n_min = usize::max(1, policy_autofit.width_cell_min);
    let n_max = usize::min(255, usize::max(n_min, policy_autofit.width_cell_max));
    let n_pad = policy_autofit.width_cell_padding;

    for (field, n_width_recorded) in schema.fields.iter().zip(l_width_by_field) {
        let n_width_final = usize::min(n_max, usize::max(n_min, n_width_recorded + n_pad));
        sheet.col_widths.insert(field.col_idx(), n_width_final as f64);
    }
}

fn validate_policy_autofit(policy_autofit: &SpecAutofitCellsPolicy) -> Result<()> {
    if policy_autofit.width_cell_min == 0 {
        return Err(GridMapError::FormatError(
            "policy_autofit.width_cell_min must be >= 1.".to_string(),
        ));
    }
    if policy_autofit.width_cell_max < policy_autofit.width_cell_min {
        return Err(GridMapError::FormatError(
            "policy_autofit.width_cell_max must be >= policy_autofit.width_cell_min."
                .to_string(),
        ));
    }
    Ok(())
}
