//! The bulk exporter.
//!
//! Pages through every requested table, serializes each page as soon as it
//! arrives and optionally gzips the result. The request is validated against
//! the allow-list before the row source sees a single call.

use std::io::Write;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use flate2::write::GzEncoder;
use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::error_handling::{ExportError, SourceError};
use crate::source::{PageQuery, RowBatch, RowSource};

use super::compress::{compress_payload, Payload, GZIP_CONTENT_TYPE};
use super::filename::{build_filename, export_stem};
use super::labels::{translate_rows, LabelLookups};
use super::pagination::PageCursor;
use super::tables::{AllowList, ExportTable};
use super::types::{
    CsvDelimiter, ExportFilters, ExportFormat, ExportRequest, ExportResult, ExportSettings,
    ExportSummary,
};
use super::writer::writer_for;

/// A request that passed validation.
#[derive(Debug)]
struct ExportPlan {
    tables: Vec<ExportTable>,
    page_size: u64,
    delimiter: CsvDelimiter,
    labels: bool,
    stem: String,
}

/// Exports tables from an injected [`RowSource`].
///
/// Holds no per-request state, so one exporter can serve concurrent requests.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use planning_export::export::{AllowList, BulkExporter, ExportFormat, ExportRequest, ExportSettings, TableSelection};
/// use planning_export::source::RowSource;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn demo(source: Arc<dyn RowSource>) -> Result<(), Box<dyn std::error::Error>> {
/// let exporter = BulkExporter::new(source, AllowList::all(), ExportSettings::default());
/// let request = ExportRequest::new(
///     TableSelection::from_names(&["customers"])?,
///     ExportFormat::Csv,
/// );
/// let result = exporter.export(&request, &CancellationToken::new()).await?;
/// println!("{} ({} rows)", result.filename, result.total_rows);
/// # Ok(())
/// # }
/// ```
pub struct BulkExporter {
    source: Arc<dyn RowSource>,
    allow_list: AllowList,
    settings: ExportSettings,
}

impl BulkExporter {
    pub fn new(source: Arc<dyn RowSource>, allow_list: AllowList, settings: ExportSettings) -> Self {
        Self {
            source,
            allow_list,
            settings,
        }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Name of the row source, for logs and the status endpoint.
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Rows per page for `format`, never more than the source returns per response.
    pub fn page_size(&self, format: ExportFormat) -> u64 {
        let configured = self.settings.page_size(format);
        match self.source.max_page_size().map(|cap| cap.max(1)) {
            Some(cap) if cap < configured => {
                debug!(
                    "{} returns at most {} rows per response; paging by {} instead of {}",
                    self.source.name(),
                    cap,
                    cap,
                    configured
                );
                cap
            }
            _ => configured,
        }
    }

    /// Validates `request` without touching the row source.
    pub fn validate(&self, request: &ExportRequest) -> Result<Vec<ExportTable>, ExportError> {
        self.plan(request).map(|plan| plan.tables)
    }

    fn plan(&self, request: &ExportRequest) -> Result<ExportPlan, ExportError> {
        let tables = request.tables.resolve(&self.allow_list)?;
        if tables.is_empty() {
            return Err(ExportError::InvalidTable(String::new()));
        }
        if request.format == ExportFormat::Csv && tables.len() > 1 {
            return Err(ExportError::MultiTableCsv(tables.len()));
        }
        let stem = export_stem(request.purpose.as_deref(), &tables, &request.filters);
        Ok(ExportPlan {
            page_size: self.page_size(request.format),
            delimiter: request.delimiter.unwrap_or(self.settings.default_delimiter),
            labels: request.labels_enabled(),
            tables,
            stem,
        })
    }

    /// Runs an export into memory, dated today.
    pub async fn export(
        &self,
        request: &ExportRequest,
        cancel: &CancellationToken,
    ) -> Result<ExportResult, ExportError> {
        self.export_on(request, Local::now().date_naive(), cancel)
            .await
    }

    /// Runs an export into memory; `date` goes into the filename.
    ///
    /// The artifact is only returned once every page has been fetched and
    /// written; any failure returns an error and no partial content.
    pub async fn export_on(
        &self,
        request: &ExportRequest,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<ExportResult, ExportError> {
        let plan = self.plan(request)?;
        let mut raw = Vec::new();
        let counts = self.write_tables(&plan, request, &mut raw, cancel).await?;
        let total_rows: u64 = counts.iter().map(|(_, rows)| rows).sum();

        let payload = if request.compress {
            compress_payload(raw, self.settings.gzip)
        } else {
            Payload::Uncompressed(raw)
        };
        let compressed = payload.is_compressed();
        let content = payload.into_bytes();
        let filename = build_filename(&plan.stem, date, request.format, compressed);
        info!(
            "Exported {} rows from {} table(s) as {} ({} bytes)",
            total_rows,
            plan.tables.len(),
            filename,
            content.len()
        );

        Ok(ExportResult {
            content,
            content_type: content_type(request.format, compressed).to_string(),
            filename,
            total_rows,
            compressed,
        })
    }

    /// Streams an export into `out`, gzipping on the fly when requested.
    ///
    /// On error, `out` may hold a partial artifact; callers that need
    /// all-or-nothing delivery write to a temporary file and keep it only on
    /// success.
    pub async fn export_to_writer(
        &self,
        request: &ExportRequest,
        date: NaiveDate,
        out: &mut (dyn Write + Send),
        cancel: &CancellationToken,
    ) -> Result<ExportSummary, ExportError> {
        let plan = self.plan(request)?;

        let level = if request.compress {
            let level = self.settings.gzip.compression();
            if level.is_none() {
                warn!("Compression requested but gzip is unavailable; writing uncompressed output");
            }
            level
        } else {
            None
        };

        let counts = match level {
            Some(level) => {
                let mut encoder = GzEncoder::new(&mut *out, level);
                let counts = self
                    .write_tables(&plan, request, &mut encoder, cancel)
                    .await?;
                encoder.finish()?;
                counts
            }
            None => self.write_tables(&plan, request, out, cancel).await?,
        };
        out.flush()?;

        let compressed = level.is_some();
        let total_rows: u64 = counts.iter().map(|(_, rows)| rows).sum();
        let filename = build_filename(&plan.stem, date, request.format, compressed);
        info!(
            "Streamed {} rows from {} table(s) as {}",
            total_rows,
            plan.tables.len(),
            filename
        );

        Ok(ExportSummary {
            filename,
            content_type: content_type(request.format, compressed).to_string(),
            total_rows,
            compressed,
            tables: counts,
        })
    }

    /// The pagination loop shared by both entry points.
    async fn write_tables(
        &self,
        plan: &ExportPlan,
        request: &ExportRequest,
        out: &mut (dyn Write + Send),
        cancel: &CancellationToken,
    ) -> Result<Vec<(ExportTable, u64)>, ExportError> {
        let lookups = if plan.labels && plan.tables.iter().any(|t| LabelLookups::needed_for(*t)) {
            self.load_lookups(plan.page_size, cancel).await?
        } else {
            LabelLookups::default()
        };
        let mut writer = writer_for(request.format, plan.delimiter, plan.labels);
        let mut counts = Vec::with_capacity(plan.tables.len());

        writer.begin(out)?;
        for &table in &plan.tables {
            let columns = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ExportError::Cancelled),
                result = self.source.columns(table) => {
                    result.map_err(|e| self.fetch_failed(table, 0, e))?
                }
            };
            writer.begin_table(out, table, &columns)?;

            let mut cursor = PageCursor::new(plan.page_size);
            while let Some(offset) = cursor.next_offset() {
                let query = PageQuery {
                    table,
                    offset,
                    limit: cursor.page_size(),
                    filters: &request.filters,
                };
                let mut batch = self.fetch(&query, cancel).await?;
                cursor.record(batch.len());
                if plan.labels {
                    translate_rows(table, &mut batch.rows, &lookups);
                }
                writer.write_rows(out, &batch.rows)?;
            }

            debug!(
                "{}: {} rows in {} page(s)",
                table,
                cursor.fetched(),
                cursor.pages()
            );
            writer.end_table(out, cursor.fetched())?;
            counts.push((table, cursor.fetched()));
        }
        writer.finish(out)?;

        Ok(counts)
    }

    /// Reads every gas type so labels show the names currently in use.
    async fn load_lookups(
        &self,
        page_size: u64,
        cancel: &CancellationToken,
    ) -> Result<LabelLookups, ExportError> {
        let filters = ExportFilters::default();
        let mut lookups = LabelLookups::default();
        let mut cursor = PageCursor::new(page_size);
        while let Some(offset) = cursor.next_offset() {
            let query = PageQuery {
                table: ExportTable::GasTypes,
                offset,
                limit: cursor.page_size(),
                filters: &filters,
            };
            let batch = self.fetch(&query, cancel).await?;
            cursor.record(batch.len());
            lookups.add_gas_types(&batch.rows);
        }
        debug!("Loaded {} gas type name(s) for labels", lookups.len());
        Ok(lookups)
    }

    /// One page fetch, abandoned as soon as `cancel` fires.
    async fn fetch(
        &self,
        query: &PageQuery<'_>,
        cancel: &CancellationToken,
    ) -> Result<RowBatch, ExportError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ExportError::Cancelled),
            result = self.source.fetch_page(query) => {
                result.map_err(|e| self.fetch_failed(query.table, query.offset, e))
            }
        }
    }

    fn fetch_failed(&self, table: ExportTable, offset: u64, source: SourceError) -> ExportError {
        error!(
            "Export aborted: {} fetch of {} at offset {} failed: {}",
            self.source.name(),
            table,
            offset,
            source
        );
        ExportError::FetchFailed {
            table,
            offset,
            source,
        }
    }
}

fn content_type(format: ExportFormat, compressed: bool) -> &'static str {
    if compressed {
        GZIP_CONTENT_TYPE
    } else {
        format.content_type()
    }
}
