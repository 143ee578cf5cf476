//! In-memory workbook model shared by the grid renderer and the reader.
//!
//! Indices are zero-based. The model is serialized by [`crate::xlsx`].

use std::collections::BTreeMap;

use crate::error::{GridMapError, Result};
use crate::spec::{EnumCellValue, SpecCellFormat};
use crate::util::sanitize_sheet_name;

////////////////////////////////////////////////////////////////////////////////
// #region Cells

/// One stored cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocCell {
    /// Cached or literal value.
    pub value: EnumCellValue,
    /// Formula text (without a leading `=`), if the cell is computed.
    pub formula: Option<String>,
    /// Cell style.
    pub format: Option<SpecCellFormat>,
}

impl DocCell {
    /// `true` when the cell carries neither a value nor a formula.
    pub fn is_blank(&self) -> bool {
        self.formula.is_none() && self.value.is_blank()
    }

    /// Replace value and style, dropping any formula.
    pub fn set(&mut self, value: EnumCellValue, format: Option<SpecCellFormat>) {
        self.value = value;
        self.formula = None;
        self.format = format;
    }
}

/// One stored row; cells keyed by column index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocRow {
    /// Cells by zero-based column.
    pub cells: BTreeMap<u16, DocCell>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Sheet

/// One worksheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocSheet {
    /// Sheet name.
    pub name: String,
    /// Rows by zero-based index.
    pub rows: BTreeMap<u32, DocRow>,
    /// Explicit column widths (character units).
    pub col_widths: BTreeMap<u16, f64>,
}

impl DocSheet {
    /// Create an empty sheet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Row at `row_idx`, if present.
    pub fn row(&self, row_idx: u32) -> Option<&DocRow> {
        self.rows.get(&row_idx)
    }

    /// Row at `row_idx`, created when absent.
    pub fn get_or_create_row(&mut self, row_idx: u32) -> &mut DocRow {
        self.rows.entry(row_idx).or_default()
    }

    /// Cell at `(row_idx, col_idx)`, if present.
    pub fn cell(&self, row_idx: u32, col_idx: u16) -> Option<&DocCell> {
        self.rows.get(&row_idx)?.cells.get(&col_idx)
    }

    /// Cell at `(row_idx, col_idx)`, creating row and cell when absent.
    ///
    /// Existing cells are reused.
    pub fn get_or_create_cell(&mut self, row_idx: u32, col_idx: u16) -> &mut DocCell {
        self.get_or_create_row(row_idx)
            .cells
            .entry(col_idx)
            .or_default()
    }

    /// Value at `(row_idx, col_idx)`; absent cells read as empty.
    pub fn value(&self, row_idx: u32, col_idx: u16) -> EnumCellValue {
        self.cell(row_idx, col_idx)
            .map(|cell| cell.value.clone())
            .unwrap_or_default()
    }

    /// Write a value and style into a cell.
    pub fn set_value(
        &mut self,
        row_idx: u32,
        col_idx: u16,
        value: EnumCellValue,
        format: Option<SpecCellFormat>,
    ) {
        self.get_or_create_cell(row_idx, col_idx).set(value, format);
    }

    /// Last row index holding at least one cell, or `None` for an empty sheet.
    pub fn last_row(&self) -> Option<u32> {
        self.rows
            .iter()
            .rev()
            .find(|(_, row)| !row.cells.is_empty())
            .map(|(row_idx, _)| *row_idx)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Workbook

/// Ordered collection of sheets; the first one is active when saved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocWorkbook {
    /// Sheets in tab order.
    pub sheets: Vec<DocSheet>,
}

impl DocWorkbook {
    /// Create an empty workbook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sheet by name.
    pub fn sheet(&self, name: &str) -> Option<&DocSheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    /// Mutable sheet by name, or [`GridMapError::SheetNotFound`].
    pub fn sheet_mut(&mut self, name: &str) -> Result<&mut DocSheet> {
        self.sheets
            .iter_mut()
            .find(|sheet| sheet.name == name)
            .ok_or_else(|| GridMapError::SheetNotFound(name.to_string()))
    }

    /// Sheet by name, created (with a sanitized name) when absent.
    pub fn get_or_create_sheet(&mut self, name: &str) -> &mut DocSheet {
        let c_name = sanitize_sheet_name(name, "_");
        let n_idx = match self.sheets.iter().position(|sheet| sheet.name == c_name) {
            Some(n_idx) => n_idx,
            None => {
                self.sheets.push(DocSheet::new(c_name));
                self.sheets.len() - 1
            }
        };
        &mut self.sheets[n_idx]
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> EnumCellValue {
        EnumCellValue::Text(s.to_string())
    }

    #[test]
    fn test_get_or_create_cell_reuses_existing_cell() {
        let mut sheet = DocSheet::new("s");
        sheet.set_value(2, 1, text("kept"), None);
        let cell = sheet.get_or_create_cell(2, 1);
        assert_eq!(cell.value, text("kept"));
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.last_row(), Some(2));
    }

    #[test]
    fn test_workbook_sheet_lookup() {
        let mut wb = DocWorkbook::new();
        wb.get_or_create_sheet("a/b");
        assert!(wb.sheet("a_b").is_some());
        assert!(matches!(
            wb.sheet_mut("zzz"),
            Err(GridMapError::SheetNotFound(_))
        ));
        wb.get_or_create_sheet("a/b");
        assert_eq!(wb.sheets.len(), 1);
    }
}
