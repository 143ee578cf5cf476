//! `sheetkit_io_xlsx` v1:
//! Record ↔ XLSX grid mapping kernel.
//!
//! Modules:
//! - `conf`     : constants and default presets
//! - `spec`     : specs/models/options
//! - `util`     : pure helper functions (column letters, serial dates, widths)
//! - `error`    : error taxonomy
//! - `record`   : record contracts (`GridRecord`, `Positionable`, dynamic tables)
//! - `schema`   : field-to-column resolution
//! - `codec`    : field value ↔ cell value conversion
//! - `document` : in-memory workbook model
//! - `xlsx`     : container bridge (`rust_xlsxwriter` out, `calamine` in)
//! - `book`     : template container bridge (`umya_spreadsheet`)
//! - `writer`   : grid renderer
//! - `reader`   : grid reader
//! - `template` : template projector
//! - `compact`  : sparse region compactor
//! - `annotate` : notes and footers
//! - `convert`  : external converter boundary
//! - `mapper`   : public facade
pub mod annotate;
pub mod book;
pub mod codec;
pub mod compact;
pub mod conf;
pub mod convert;
pub mod document;
pub mod error;
pub mod mapper;
pub mod reader;
pub mod record;
pub mod schema;
pub mod spec;
pub mod template;
pub mod util;
pub mod writer;
pub mod xlsx;

pub use conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
    derive_default_grid_formats, derive_default_grid_write_options,
};
pub use convert::DocumentConverter;
pub use document::{DocCell, DocRow, DocSheet, DocWorkbook};
pub use error::{GridMapError, Result};
pub use mapper::XlsxGridMapper;
pub use record::{GridRecord, Positionable, SpecDataTable};
pub use spec::{
    EnumCellValue, EnumFieldKind, EnumFieldValue, SpecAutofitCellsPolicy, SpecCellFormat,
    SpecCellStyleOptions, SpecFieldConfig, SpecFieldDescriptor, SpecGridOutput, SpecGridReport,
    SpecGridWriteOptions, SpecNote, SpecPosition, SpecPositionMap, SpecRegion,
    SpecResolvedField, SpecResolvedSchema, SpecTemplateOptions,
};
pub use util::{letter_to_number, number_to_column, sanitize_sheet_name};
