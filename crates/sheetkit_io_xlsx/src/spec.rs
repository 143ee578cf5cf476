//! Shared grid specification models.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::conf::{N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::error::{GridMapError, Result};
use crate::util::letter_to_number;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification.
///
/// Every property is optional so formats can be layered with [`SpecCellFormat::merge`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,
    /// Single underline.
    pub underline: Option<bool>,

    /// Border style for all sides.
    pub border: Option<i64>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color (`#RRGGBB`).
    pub bg_color: Option<String>,
    /// Font color (`#RRGGBB`).
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            underline: other.underline.or(self.underline),
            border: other.border.or(self.border),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }

    /// Build a format from high-level style knobs (font, emphasis, border, colors).
    pub fn from_style_options(options: &SpecCellStyleOptions) -> SpecCellFormat {
        SpecCellFormat {
            font_name: Some(options.font_family.clone()),
            font_size: Some(options.font_size),
            bold: Some(options.if_bold),
            italic: Some(options.if_italic),
            underline: Some(options.if_underlined),
            border: if options.if_bordered { Some(1) } else { None },
            bg_color: options.rgb_background.map(derive_hex_color),
            font_color: options.rgb_font.map(derive_hex_color),
            ..Default::default()
        }
    }
}

/// High-level header/body style knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCellStyleOptions {
    /// Font size in points.
    pub font_size: i64,
    /// Font family name.
    pub font_family: String,
    /// Bold font.
    pub if_bold: bool,
    /// Italic font.
    pub if_italic: bool,
    /// Single underline.
    pub if_underlined: bool,
    /// Thin border on all sides.
    pub if_bordered: bool,
    /// Background fill RGB.
    pub rgb_background: Option<[u8; 3]>,
    /// Font RGB.
    pub rgb_font: Option<[u8; 3]>,
}

impl Default for SpecCellStyleOptions {
    fn default() -> Self {
        Self {
            font_size: 11,
            font_family: "Calibri Light".to_string(),
            if_bold: false,
            if_italic: false,
            if_underlined: false,
            if_bordered: false,
            rgb_background: None,
            rgb_font: None,
        }
    }
}

fn derive_hex_color(rgb: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2])
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ValueSpecification

/// Primitive cell representation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnumCellValue {
    /// Blank cell.
    #[default]
    Empty,
    /// Text value.
    Text(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
    /// Date/time value (stored as an Excel serial with a date format).
    DateTime(NaiveDateTime),
}

impl EnumCellValue {
    /// `true` for blank cells and empty strings.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// Semantic kind declared for a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumFieldKind {
    /// UTF-8 string.
    Text,
    /// Single character.
    Char,
    /// GUID/UUID.
    Guid,
    /// Signed integer.
    Integer,
    /// Unsigned integer.
    UnsignedInteger,
    /// Binary floating point.
    Float,
    /// Fixed-point decimal.
    Decimal,
    /// Boolean.
    Boolean,
    /// Date with time.
    DateTime,
    /// Calendar date.
    Date,
    /// Nested object or list; has no cell encoding.
    Composite,
}

impl EnumFieldKind {
    /// Stable lower-case name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Char => "char",
            Self::Guid => "guid",
            Self::Integer => "integer",
            Self::UnsignedInteger => "unsigned_integer",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
            Self::Date => "date",
            Self::Composite => "composite",
        }
    }
}

/// Native field value handed to (or produced by) the codec.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnumFieldValue {
    /// Absent value.
    #[default]
    Null,
    /// String value.
    Text(String),
    /// Character value.
    Char(char),
    /// GUID value.
    Guid(Uuid),
    /// Signed integer value.
    Int(i64),
    /// Unsigned integer value.
    UInt(u64),
    /// Floating point value.
    Float(f64),
    /// Fixed-point value.
    Decimal(Decimal),
    /// Boolean value.
    Bool(bool),
    /// Date/time value.
    DateTime(NaiveDateTime),
    /// Date value.
    Date(NaiveDate),
    /// Nested list; unsupported by the codec.
    List(Vec<EnumFieldValue>),
    /// Nested object; unsupported by the codec.
    Composite(BTreeMap<String, EnumFieldValue>),
}

impl EnumFieldValue {
    /// Semantic type name of the value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Char(_) => "char",
            Self::Guid(_) => "guid",
            Self::Int(_) => "integer",
            Self::UInt(_) => "unsigned_integer",
            Self::Float(_) => "float",
            Self::Decimal(_) => "decimal",
            Self::Bool(_) => "boolean",
            Self::DateTime(_) => "datetime",
            Self::Date(_) => "date",
            Self::List(_) => "list",
            Self::Composite(_) => "composite",
        }
    }
}

impl From<&str> for EnumFieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EnumFieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for EnumFieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for EnumFieldValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u64> for EnumFieldValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<f64> for EnumFieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for EnumFieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Decimal> for EnumFieldValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<NaiveDateTime> for EnumFieldValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<NaiveDate> for EnumFieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<Uuid> for EnumFieldValue {
    fn from(value: Uuid) -> Self {
        Self::Guid(value)
    }
}

impl<T: Into<EnumFieldValue>> From<Option<T>> for EnumFieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FieldSchemaSpecification

/// Per-field column configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecFieldConfig {
    /// 1-based column; `0` means auto-assign. Negative values are rejected.
    pub col_position: i64,
    /// Header text; defaults to the field name.
    pub header_name: Option<String>,
    /// Number format code; defaults to the kind policy.
    pub data_format: Option<String>,
}

/// Static descriptor of one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFieldDescriptor {
    /// Field identifier.
    pub name: String,
    /// Declared semantic kind.
    pub kind: EnumFieldKind,
    /// Optional explicit configuration.
    pub config: Option<SpecFieldConfig>,
}

impl SpecFieldDescriptor {
    /// Descriptor without explicit configuration.
    pub fn new(name: impl Into<String>, kind: EnumFieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            config: None,
        }
    }

    /// Attach an explicit column position.
    pub fn at(mut self, col_position: i64) -> Self {
        self.config.get_or_insert_with(SpecFieldConfig::default).col_position = col_position;
        self
    }

    /// Attach a header name.
    pub fn header(mut self, header_name: impl Into<String>) -> Self {
        self.config.get_or_insert_with(SpecFieldConfig::default).header_name =
            Some(header_name.into());
        self
    }

    /// Attach a number format code.
    pub fn format(mut self, data_format: impl Into<String>) -> Self {
        self.config.get_or_insert_with(SpecFieldConfig::default).data_format =
            Some(data_format.into());
        self
    }
}

/// Field after column resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecResolvedField {
    /// Field identifier.
    pub name: String,
    /// Declared kind.
    pub kind: EnumFieldKind,
    /// Final 1-based column.
    pub col_position: u32,
    /// Header text.
    pub header_name: String,
    /// Effective number format code.
    pub data_format: Option<String>,
}

impl SpecResolvedField {
    /// Zero-based column index.
    pub fn col_idx(&self) -> u16 {
        // Resolution caps positions at the sheet column limit.
        u16::try_from(self.col_position.saturating_sub(1)).unwrap_or(u16::MAX)
    }
}

/// Ordered field-to-column mapping, sorted by column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecResolvedSchema {
    /// Resolved fields in ascending column order.
    pub fields: Vec<SpecResolvedField>,
}

impl SpecResolvedSchema {
    /// Number of resolved fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` when no field is resolved.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in column order.
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CoordinateSpecification

/// Document coordinate with 1-based row and letter-encoded column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpecPosition {
    /// 1-based row number.
    pub row: u32,
    /// Column letters (case-insensitive).
    pub column: String,
}

impl SpecPosition {
    /// Build a position from row number and column letters.
    pub fn new(row: u32, column: impl Into<String>) -> Self {
        Self {
            row,
            column: column.into(),
        }
    }

    /// Convert to zero-based `(row, col)` indices.
    pub fn to_zero_based(&self) -> Result<(u32, u16)> {
        if self.row == 0 || self.row as usize > N_NROWS_EXCEL_MAX {
            return Err(GridMapError::FormatError(format!(
                "row must be within 1..={N_NROWS_EXCEL_MAX}, got {}",
                self.row
            )));
        }
        let n_col = letter_to_number(&self.column)?;
        if n_col as usize > N_NCOLS_EXCEL_MAX {
            return Err(GridMapError::FormatError(format!(
                "column {:?} exceeds the sheet column limit",
                self.column
            )));
        }
        let n_col_idx = u16::try_from(n_col - 1)
            .map_err(|_| GridMapError::FormatError(format!("column {:?}", self.column)))?;
        Ok((self.row - 1, n_col_idx))
    }
}

/// Field name → coordinate, per record in template mode.
pub type SpecPositionMap = BTreeMap<String, SpecPosition>;

/// Rectangular 1-based inclusive region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecRegion {
    /// First row (1-based).
    pub row_start: u32,
    /// Last row (1-based, inclusive).
    pub row_end: u32,
    /// First column (1-based).
    pub col_start: u32,
    /// Last column (1-based, inclusive).
    pub col_end: u32,
}

impl SpecRegion {
    /// Build and validate a region.
    pub fn new(row_start: u32, row_end: u32, col_start: u32, col_end: u32) -> Result<Self> {
        let region = Self {
            row_start,
            row_end,
            col_start,
            col_end,
        };
        region.validate()?;
        Ok(region)
    }

    /// Validate bound ordering and positivity.
    pub fn validate(&self) -> Result<()> {
        if self.row_start == 0 || self.col_start == 0 {
            return Err(GridMapError::InvalidRegion(
                "region bounds are 1-based; 0 is not allowed".to_string(),
            ));
        }
        if self.row_start > self.row_end {
            return Err(GridMapError::InvalidRegion(format!(
                "row_start ({}) cannot be greater than row_end ({})",
                self.row_start, self.row_end
            )));
        }
        if self.col_start > self.col_end {
            return Err(GridMapError::InvalidRegion(format!(
                "col_start ({}) cannot be greater than col_end ({})",
                self.col_start, self.col_end
            )));
        }
        if self.col_end as usize > N_NCOLS_EXCEL_MAX || self.row_end as usize > N_NROWS_EXCEL_MAX
        {
            return Err(GridMapError::InvalidRegion(
                "region exceeds the sheet limits".to_string(),
            ));
        }
        Ok(())
    }

    /// Zero-based `(row_start, row_end, col_start, col_end)`.
    pub fn to_zero_based(&self) -> (u32, u32, u16, u16) {
        // Bounds are validated against the column limit, which fits in u16.
        let cast_col = |n: u32| u16::try_from(n - 1).unwrap_or(u16::MAX);
        (
            self.row_start - 1,
            self.row_end - 1,
            cast_col(self.col_start),
            cast_col(self.col_end),
        )
    }
}

/// Text note placed in a merged region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecNote {
    /// Merged region.
    pub region: SpecRegion,
    /// Note text.
    pub text: String,
}

/// Target sheet and post-projection steps for template mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecTemplateOptions {
    /// Template sheet to project onto; the first sheet when `None`.
    pub sheet_name: Option<String>,
    /// Data section compacted after projection.
    pub data_section: Option<SpecRegion>,
    /// Note drawn before compaction.
    pub note: Option<SpecNote>,
    /// Footer text appended last.
    pub footer: Option<String>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Autofit policy for rendered grids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Disable to keep default widths.
    pub if_enabled: bool,
    /// Max body rows inspected.
    pub height_body_inferred_max: Option<usize>,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            if_enabled: true,
            height_body_inferred_max: Some(20_000),
            width_cell_min: 8,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

/// Options controlling grid rendering and template output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecGridWriteOptions {
    /// Name of the generated sheet.
    pub sheet_name: String,
    /// Header row format.
    pub fmt_header: SpecCellFormat,
    /// Base body cell format; field number formats are merged on top.
    pub fmt_body: SpecCellFormat,
    /// Highlight format for null field values.
    pub fmt_empty: SpecCellFormat,
    /// Column autofit policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
    /// Default column width applied to template sheets.
    pub width_col_template: Option<u32>,
}

impl Default for SpecGridWriteOptions {
    fn default() -> Self {
        crate::conf::derive_default_grid_write_options()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-call write report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecGridReport {
    /// Target sheet name.
    pub sheet_name: String,
    /// Data rows (grid) or records (template) written.
    pub rows_written: usize,
    /// Rows removed by compaction.
    pub rows_removed: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecGridReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        log::warn!("{}", msg.as_ref());
        self.warnings.push(msg.as_ref().to_string());
    }
}

/// Serialized workbook plus its write report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecGridOutput {
    /// XLSX bytes.
    pub bytes: Vec<u8>,
    /// Write report.
    pub report: SpecGridReport,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overlays_right_side_values() {
        let base = SpecCellFormat {
            font_name: Some("Courier New".to_string()),
            font_size: Some(11),
            ..Default::default()
        };
        let merged = base.with_(SpecCellFormat {
            num_format: Some("0.00".to_string()),
            font_size: Some(14),
            ..Default::default()
        });
        assert_eq!(merged.font_name.as_deref(), Some("Courier New"));
        assert_eq!(merged.font_size, Some(14));
        assert_eq!(merged.num_format.as_deref(), Some("0.00"));
    }

    #[test]
    fn test_style_options_map_to_format() {
        let fmt = SpecCellFormat::from_style_options(&SpecCellStyleOptions {
            if_bordered: true,
            rgb_background: Some([187, 255, 184]),
            ..Default::default()
        });
        assert_eq!(fmt.border, Some(1));
        assert_eq!(fmt.bg_color.as_deref(), Some("#BBFFB8"));
        assert_eq!(fmt.font_color, None);
    }

    #[test]
    fn test_region_validation() {
        assert!(SpecRegion::new(1, 8, 1, 3).is_ok());
        assert!(matches!(
            SpecRegion::new(5, 2, 1, 3),
            Err(GridMapError::InvalidRegion(_))
        ));
        assert!(matches!(
            SpecRegion::new(1, 2, 4, 3),
            Err(GridMapError::InvalidRegion(_))
        ));
        assert!(matches!(
            SpecRegion::new(0, 2, 1, 3),
            Err(GridMapError::InvalidRegion(_))
        ));
    }

    #[test]
    fn test_position_to_zero_based() {
        assert_eq!(
            SpecPosition::new(1, "a").to_zero_based().expect("A1"),
            (0, 0)
        );
        assert_eq!(
            SpecPosition::new(7, "AB").to_zero_based().expect("AB7"),
            (6, 27)
        );
        assert!(matches!(
            SpecPosition::new(0, "A").to_zero_based(),
            Err(GridMapError::FormatError(_))
        ));
        assert!(matches!(
            SpecPosition::new(1, "A1").to_zero_based(),
            Err(GridMapError::FormatError(_))
        ));
    }

    #[test]
    fn test_descriptor_builder_and_option_values() {
        let desc = SpecFieldDescriptor::new("salary", EnumFieldKind::Float)
            .at(3)
            .header("Salary");
        let config = desc.config.expect("config");
        assert_eq!(config.col_position, 3);
        assert_eq!(config.header_name.as_deref(), Some("Salary"));

        assert_eq!(EnumFieldValue::from(None::<i64>), EnumFieldValue::Null);
        assert_eq!(EnumFieldValue::from(Some(5i64)), EnumFieldValue::Int(5));
    }
}
