//! Error taxonomy shared by every grid operation.

use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GridMapError>;

/// One failure surfaced by a render/read/project call.
///
/// Variants up to [`GridMapError::FormatError`] are caller-input errors, detected
/// eagerly where possible. The remaining variants report collaborator failures
/// (filesystem, workbook container, converter).
#[derive(Debug, thiserror::Error)]
pub enum GridMapError {
    /// Required argument is null/blank.
    #[error("Missing required input: {0}")]
    MissingInput(String),
    /// Field configuration is invalid (e.g. negative column position).
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// Two fields claim the same explicit column.
    #[error("Cannot have more than 1 field with column position = {position} ({field_first:?}, {field_second:?})")]
    DuplicateColumn {
        /// Conflicting 1-based column position.
        position: u32,
        /// First field declaring the position.
        field_first: String,
        /// Second field declaring the position.
        field_second: String,
    },
    /// Read mode requires every field to carry an explicit column.
    #[error("Schema incomplete: field {field:?} has no explicit column configuration")]
    SchemaIncomplete {
        /// Field lacking configuration.
        field: String,
    },
    /// Template path does not exist.
    #[error("Can't find the excel template on path: {}", path.display())]
    TemplateNotFound {
        /// Missing template path.
        path: PathBuf,
    },
    /// A record in template mode has no coordinates.
    #[error("PositionMap not configured for item: records[{index}]")]
    PositionMapMissing {
        /// Zero-based record index.
        index: usize,
    },
    /// Region bounds are inverted or zero.
    #[error("Invalid region: {0}")]
    InvalidRegion(String),
    /// Field value has no encoding rule.
    #[error("Unsupported type for field {field:?}: {type_name}")]
    UnsupportedType {
        /// Field being encoded.
        field: String,
        /// Semantic type name of the offending value.
        type_name: String,
    },
    /// Stored cell value cannot be converted into the field kind.
    #[error("Cannot convert cell value {raw:?} into field {field:?} ({kind})")]
    CellConversionError {
        /// Target field name.
        field: String,
        /// Raw stored value, stringified.
        raw: String,
        /// Target field kind.
        kind: String,
    },
    /// Malformed column letters or coordinates.
    #[error("Format error: {0}")]
    FormatError(String),
    /// Named sheet is absent from the document.
    #[error("Sheet not found: {0:?}")]
    SheetNotFound(String),
    /// Position map or table row references an undeclared field.
    #[error("Unknown field {field:?} (records[{index}])")]
    UnknownField {
        /// Referenced field name.
        field: String,
        /// Zero-based record index.
        index: usize,
    },
    /// Workbook container library failed (serialize, parse or template edit).
    #[error("xlsx {context} error: {message}")]
    Workbook {
        /// Operation stage (`write`, `read`, ...).
        context: &'static str,
        /// Library error text.
        message: String,
    },
    /// Filesystem failure while reading a template or source file.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// External format converter failed.
    #[error("Document conversion failed: {0}")]
    ConversionFailed(String),
}

impl GridMapError {
    /// `true` for errors caused by caller input rather than a collaborator.
    pub fn is_input_error(&self) -> bool {
        !matches!(
            self,
            Self::TemplateNotFound { .. }
                | Self::Workbook { .. }
                | Self::Io { .. }
                | Self::ConversionFailed(_)
        )
    }
}

impl From<rust_xlsxwriter::XlsxError> for GridMapError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Workbook {
            context: "write",
            message: err.to_string(),
        }
    }
}

impl From<calamine::XlsxError> for GridMapError {
    fn from(err: calamine::XlsxError) -> Self {
        Self::Workbook {
            context: "read",
            message: err.to_string(),
        }
    }
}

impl From<umya_spreadsheet::XlsxError> for GridMapError {
    fn from(err: umya_spreadsheet::XlsxError) -> Self {
        Self::Workbook {
            context: "template",
            message: err.to_string(),
        }
    }
}
