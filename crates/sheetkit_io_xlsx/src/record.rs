//! Record contracts: static field descriptors and value access.

use crate::spec::{EnumFieldKind, EnumFieldValue, SpecFieldDescriptor, SpecPositionMap};

/// A record type that can be rendered to and read from a grid.
///
/// Descriptors replace runtime introspection: each implementor lists its fields, their
/// kinds and optional column configuration once.
pub trait GridRecord {
    /// Field descriptors in declaration order.
    fn descriptors() -> Vec<SpecFieldDescriptor>;

    /// Current value of `name`, or `None` if the record has no such field.
    fn field_value(&self, name: &str) -> Option<EnumFieldValue>;

    /// Assign a decoded value. Returns `false` if the field is unknown or the value
    /// kind is not accepted.
    fn set_field_value(&mut self, name: &str, value: EnumFieldValue) -> bool;
}

/// A record that carries its own template coordinates.
pub trait Positionable {
    /// Field name → coordinate map, or `None` when not configured.
    fn position_map(&self) -> Option<&SpecPositionMap>;
}

/// Dynamic table rendered column by column in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecDataTable {
    /// `(name, kind)` per column; column `i` lands at position `i + 1`.
    pub columns: Vec<(String, EnumFieldKind)>,
    /// Row values, one entry per column.
    pub rows: Vec<Vec<EnumFieldValue>>,
}

impl SpecDataTable {
    /// Create an empty table with the given columns.
    pub fn new(columns: Vec<(String, EnumFieldKind)>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append one row.
    pub fn push_row(&mut self, row: Vec<EnumFieldValue>) {
        self.rows.push(row);
    }

    /// Descriptors with explicit positions `1..=n`.
    pub fn descriptors(&self) -> Vec<SpecFieldDescriptor> {
        self.columns
            .iter()
            .enumerate()
            .map(|(n_idx, (c_name, kind))| {
                SpecFieldDescriptor::new(c_name.clone(), *kind).at(n_idx as i64 + 1)
            })
            .collect()
    }
}
