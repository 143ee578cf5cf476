//! Public facade: render, project, read and convert XLSX documents.

use std::path::Path;

use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::annotate::{draw_footer, draw_note};
use crate::book::{
    finalize_template_sheet, open_template_from_bytes, open_template_from_path,
    save_template_to_buffer, select_template_sheet,
};
use crate::compact::compact_region;
use crate::convert::{DocumentConverter, convert_document};
use crate::document::{DocSheet, DocWorkbook};
use crate::error::{GridMapError, Result};
use crate::reader::read_grid;
use crate::record::{GridRecord, Positionable, SpecDataTable};
use crate::schema::{resolve_read_schema, resolve_schema};
use crate::spec::{
    SpecGridOutput, SpecGridReport, SpecGridWriteOptions, SpecResolvedSchema, SpecTemplateOptions,
};
use crate::template::project_records;
use crate::writer::{render_grid, render_table};
use crate::xlsx::{load_workbook_from_bytes, load_workbook_from_path, save_workbook_to_buffer};

/// Default first data row for reads (row 0 holds headers).
pub const N_ROW_START_DEFAULT: u32 = 1;

/// Operation-scoped state: the in-progress document and its report.
///
/// Created by one facade call and dropped when it returns. `W` is the in-memory model
/// for fresh grids and the template container for template projections.
struct SpecGridContext<W> {
    workbook: W,
    report: SpecGridReport,
}

impl<W> SpecGridContext<W> {
    fn new(workbook: W, sheet_name: &str) -> Self {
        Self {
            workbook,
            report: SpecGridReport {
                sheet_name: sheet_name.to_string(),
                ..Default::default()
            },
        }
    }
}

impl SpecGridContext<DocWorkbook> {
    fn create(sheet_name: &str) -> Self {
        let mut workbook = DocWorkbook::new();
        let c_name = workbook.get_or_create_sheet(sheet_name).name.clone();
        Self::new(workbook, &c_name)
    }

    fn sheet_mut(&mut self) -> Result<(&mut DocSheet, &mut SpecGridReport)> {
        let sheet = self.workbook.sheet_mut(&self.report.sheet_name)?;
        Ok((sheet, &mut self.report))
    }

    fn finish(self) -> Result<SpecGridOutput> {
        let bytes = save_workbook_to_buffer(&self.workbook)?;
        Ok(SpecGridOutput {
            bytes,
            report: self.report,
        })
    }
}

impl SpecGridContext<Spreadsheet> {
    fn sheet_mut(&mut self) -> Result<(&mut Worksheet, &mut SpecGridReport)> {
        let sheet = self
            .workbook
            .get_sheet_by_name_mut(&self.report.sheet_name)
            .ok_or_else(|| GridMapError::SheetNotFound(self.report.sheet_name.clone()))?;
        Ok((sheet, &mut self.report))
    }

    fn finish(self) -> Result<SpecGridOutput> {
        let bytes = save_template_to_buffer(&self.workbook)?;
        Ok(SpecGridOutput {
            bytes,
            report: self.report,
        })
    }
}

/// Record ↔ XLSX mapper.
///
/// Holds immutable options only; every call builds and owns its own document, so one
/// mapper can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct XlsxGridMapper {
    write_options: SpecGridWriteOptions,
}

impl XlsxGridMapper {
    /// Create a mapper with explicit write options.
    pub fn new(write_options: SpecGridWriteOptions) -> Self {
        Self { write_options }
    }

    /// Active write options.
    pub fn write_options(&self) -> &SpecGridWriteOptions {
        &self.write_options
    }

    /// Render records as a header + data grid on a fresh workbook.
    pub fn generate_grid<R: GridRecord>(&self, records: &[R]) -> Result<SpecGridOutput> {
        let run = || -> Result<SpecGridOutput> {
            let schema = resolve_schema(&R::descriptors())?;
            let mut ctx = SpecGridContext::create(&self.write_options.sheet_name);
            let (sheet, report) = ctx.sheet_mut()?;
            render_grid(sheet, &schema, records, &self.write_options, report)?;
            ctx.finish()
        };
        run().inspect_err(|err| log::error!("generate_grid failed: {err}"))
    }

    /// Render a dynamic table on a fresh workbook.
    pub fn generate_table(&self, table: &SpecDataTable) -> Result<SpecGridOutput> {
        let run = || -> Result<SpecGridOutput> {
            if table.columns.is_empty() {
                return Err(GridMapError::MissingInput("table columns".to_string()));
            }
            let mut ctx = SpecGridContext::create(&self.write_options.sheet_name);
            let (sheet, report) = ctx.sheet_mut()?;
            render_table(sheet, table, &self.write_options, report)?;
            ctx.finish()
        };
        run().inspect_err(|err| log::error!("generate_table failed: {err}"))
    }

    /// Project records onto a sheet of the template at `path`.
    ///
    /// The sheet is `template_options.sheet_name`, or the first one. Steps run in order:
    /// projection, note, compaction of the data section, footer. Everything else in the
    /// template (styles, merges, other sheets) is kept.
    pub fn generate_from_template<R: GridRecord + Positionable>(
        &self,
        path: &Path,
        records: &[R],
        template_options: &SpecTemplateOptions,
    ) -> Result<SpecGridOutput> {
        let run = || -> Result<SpecGridOutput> {
            if path.as_os_str().is_empty() {
                return Err(GridMapError::MissingInput("template path".to_string()));
            }
            let book = open_template_from_path(path)?;
            self.project_onto_template(book, records, template_options)
        };
        run().inspect_err(|err| log::error!("generate_from_template failed: {err}"))
    }

    /// Same as [`Self::generate_from_template`] with a template already in memory.
    pub fn generate_from_template_bytes<R: GridRecord + Positionable>(
        &self,
        template: &[u8],
        records: &[R],
        template_options: &SpecTemplateOptions,
    ) -> Result<SpecGridOutput> {
        let run = || -> Result<SpecGridOutput> {
            let book = open_template_from_bytes(template)?;
            self.project_onto_template(book, records, template_options)
        };
        run().inspect_err(|err| log::error!("generate_from_template_bytes failed: {err}"))
    }

    /// Project a single record onto a template.
    pub fn generate_from_template_single<R: GridRecord + Positionable>(
        &self,
        path: &Path,
        record: &R,
        template_options: &SpecTemplateOptions,
    ) -> Result<SpecGridOutput> {
        self.generate_from_template(path, std::slice::from_ref(record), template_options)
    }

    /// Read records from an XLSX file.
    ///
    /// `sheet_name` defaults to the first sheet, `row_start` (zero-based) to row 1.
    pub fn read_records<R: GridRecord + Default>(
        &self,
        path: &Path,
        sheet_name: Option<&str>,
        row_start: Option<u32>,
    ) -> Result<Vec<R>> {
        let run = || -> Result<Vec<R>> {
            if path.as_os_str().is_empty() {
                return Err(GridMapError::MissingInput("source path".to_string()));
            }
            let schema = resolve_read_schema(&R::descriptors())?;
            let workbook = load_workbook_from_path(path)?;
            read_from_workbook(&workbook, &schema, sheet_name, row_start)
        };
        run().inspect_err(|err| log::error!("read_records failed: {err}"))
    }

    /// Read records from XLSX bytes.
    pub fn read_records_from_bytes<R: GridRecord + Default>(
        &self,
        bytes: &[u8],
        sheet_name: Option<&str>,
        row_start: Option<u32>,
    ) -> Result<Vec<R>> {
        let run = || -> Result<Vec<R>> {
            let schema = resolve_read_schema(&R::descriptors())?;
            let workbook = load_workbook_from_bytes(bytes)?;
            read_from_workbook(&workbook, &schema, sheet_name, row_start)
        };
        run().inspect_err(|err| log::error!("read_records_from_bytes failed: {err}"))
    }

    /// Hand rendered bytes to an external converter.
    pub fn convert<C: DocumentConverter + ?Sized>(
        &self,
        converter: &C,
        bytes: &[u8],
    ) -> Result<Vec<u8>> {
        convert_document(converter, bytes)
            .inspect_err(|err| log::error!("convert failed: {err}"))
    }

    fn project_onto_template<R: GridRecord + Positionable>(
        &self,
        mut book: Spreadsheet,
        records: &[R],
        template_options: &SpecTemplateOptions,
    ) -> Result<SpecGridOutput> {
        if let Some(region) = &template_options.data_section {
            region.validate()?;
        }
        if let Some(note) = &template_options.note {
            note.region.validate()?;
        }

        let (n_idx, c_sheet_name) =
            select_template_sheet(&book, template_options.sheet_name.as_deref())?;
        finalize_template_sheet(&mut book, n_idx, self.write_options.width_col_template)?;

        let mut ctx = SpecGridContext::new(book, &c_sheet_name);
        let (sheet, report) = ctx.sheet_mut()?;

        project_records(sheet, records, report)?;
        if let Some(note) = &template_options.note {
            draw_note(sheet, note)?;
        }
        if let Some(region) = &template_options.data_section {
            report.rows_removed += compact_region(sheet, region)?;
        }
        if let Some(c_footer) = &template_options.footer {
            draw_footer(sheet, c_footer)?;
        }

        ctx.finish()
    }
}

fn read_from_workbook<R: GridRecord + Default>(
    workbook: &DocWorkbook,
    schema: &SpecResolvedSchema,
    sheet_name: Option<&str>,
    row_start: Option<u32>,
) -> Result<Vec<R>> {
    let sheet = match sheet_name {
        Some(c_name) => workbook
            .sheet(c_name)
            .ok_or_else(|| GridMapError::SheetNotFound(c_name.to_string()))?,
        None => workbook
            .sheets
            .first()
            .ok_or_else(|| GridMapError::SheetNotFound("<first sheet>".to_string()))?,
    };
    read_grid(sheet, schema, row_start.unwrap_or(N_ROW_START_DEFAULT))
}
