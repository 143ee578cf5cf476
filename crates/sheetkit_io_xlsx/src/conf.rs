//! XLSX constants and default preset factories.

use crate::spec::{
    EnumFieldKind, SpecAutofitCellsPolicy, SpecCellFormat, SpecCellStyleOptions,
    SpecGridWriteOptions,
};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Sheet name used for generated grids.
pub const C_SHEET_NAME_DEFAULT: &str = "Sheet1";
/// Number format applied to float/decimal fields without an explicit format.
pub const C_NUM_FORMAT_DECIMAL: &str = "0.00";
/// Number format applied to date/time fields without an explicit format.
pub const C_NUM_FORMAT_DATETIME: &str = "dd-mm-yyyy hh:mm:ss";
/// Default column width applied to template sheets.
pub const N_WIDTH_COL_TEMPLATE: u32 = 50;

/// Footer box span in columns.
pub const N_FOOTER_COLS: u32 = 12;
/// Footer box span in rows.
pub const N_FOOTER_ROWS: u32 = 5;
/// Footer font.
pub const C_FOOTER_FONT_NAME: &str = "Times New Roman";
/// Footer font size in points.
pub const N_FOOTER_FONT_SIZE: f64 = 8.0;

/// Default number format for a field kind, or `None` for the plain default.
pub fn derive_default_num_format(kind: EnumFieldKind) -> Option<&'static str> {
    match kind {
        EnumFieldKind::Float | EnumFieldKind::Decimal => Some(C_NUM_FORMAT_DECIMAL),
        EnumFieldKind::DateTime | EnumFieldKind::Date => Some(C_NUM_FORMAT_DATETIME),
        _ => None,
    }
}

/// Default header style knobs.
pub fn derive_default_header_style() -> SpecCellStyleOptions {
    SpecCellStyleOptions {
        font_size: 11,
        font_family: "Courier New".to_string(),
        if_bold: true,
        if_bordered: true,
        rgb_background: Some([187, 255, 184]),
        ..Default::default()
    }
}

/// Default body style knobs.
pub fn derive_default_body_style() -> SpecCellStyleOptions {
    SpecCellStyleOptions {
        font_size: 11,
        font_family: "Courier New".to_string(),
        ..Default::default()
    }
}

/// Build the `(header, body, empty)` format presets used by the renderer.
pub fn derive_default_grid_formats() -> (SpecCellFormat, SpecCellFormat, SpecCellFormat) {
    let fmt_header = SpecCellFormat::from_style_options(&derive_default_header_style());
    let fmt_body = SpecCellFormat::from_style_options(&derive_default_body_style());
    let fmt_empty = fmt_body.with_(SpecCellFormat {
        bg_color: Some("#FFFF96".to_string()),
        ..Default::default()
    });
    (fmt_header, fmt_body, fmt_empty)
}

/// Build default write options.
pub fn derive_default_grid_write_options() -> SpecGridWriteOptions {
    let (fmt_header, fmt_body, fmt_empty) = derive_default_grid_formats();
    SpecGridWriteOptions {
        sheet_name: C_SHEET_NAME_DEFAULT.to_string(),
        fmt_header,
        fmt_body,
        fmt_empty,
        policy_autofit: SpecAutofitCellsPolicy::default(),
        width_col_template: Some(N_WIDTH_COL_TEMPLATE),
    }
}
