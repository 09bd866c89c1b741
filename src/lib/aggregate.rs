//! The scan driver: reads every shard, filters rows, folds per-subject
//! counts, computes derived metrics and writes the output tables.
//!
//! The scan is all-or-nothing: any shard-read failure aborts the run before
//! anything is written, because a partial aggregate would silently
//! undercount. Degenerate subjects (shard-reported total of zero) are not
//! errors; their derived metrics are left undefined and serialize as empty
//! cells.

use std::path::{Path, PathBuf};

use anyhow::Context;
use fgoxide::io::DelimFile;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::accumulator::SubjectAccumulator;
use crate::errors::{AbfreqError, Result};
use crate::filter;
use crate::progress::ScanProgress;
use crate::query::Query;
use crate::shard::{Record, read_shard};

/// File name of the per-subject summary table.
pub const RESULTS_FILENAME: &str = "results.csv";
/// File name of the concatenated matching rows.
pub const FULL_RESULTS_FILENAME: &str = "fullresults.csv";

/// Glob pattern selecting shard files inside the database directory.
const SHARD_GLOB: &str = "*.csv.gz";

/// Row labels of the transposed summary table.
const SUMMARY_ROWS: [&str; 4] =
    ["Hits", "Total sequences", "Percentage of hits", "Hits per 1 million"];

/// One matched row, annotated with the subject it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchedRow {
    /// V gene segment call(s)
    pub v_call: String,
    /// D gene segment call(s)
    pub d_call: String,
    /// J gene segment call(s)
    pub j_call: String,
    /// Junction length in its original string form
    pub junction_aa_length: String,
    /// Junction amino-acid sequence
    pub junction_aa: String,
    /// Subject the source shard belongs to
    #[serde(rename = "Subject source")]
    pub subject_source: String,
}

impl MatchedRow {
    fn new(record: &Record, subject_id: &str) -> Self {
        Self {
            v_call: record.v_call.clone(),
            d_call: record.d_call.clone(),
            j_call: record.j_call.clone(),
            junction_aa_length: record.junction_length.clone(),
            junction_aa: record.junction_aa.clone(),
            subject_source: subject_id.to_string(),
        }
    }
}

/// Final per-subject summary with derived metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectSummary {
    /// Subject identifier
    pub subject: String,
    /// Matched rows across the subject's shards
    pub hits: u64,
    /// Shard-reported sequence totals across the subject's shards
    pub total: u64,
    /// `round(100 * hits / total, 2)`; undefined when `total` is zero
    pub percentage: Option<f64>,
    /// `round(1_000_000 * hits / total)`; undefined when `total` is zero
    pub hits_per_million: Option<f64>,
}

/// The summary output: per-subject rows plus the query provenance string.
#[derive(Debug)]
pub struct SummaryTable {
    /// One entry per subject, in first-appearance order
    pub subjects: Vec<SubjectSummary>,
    /// Normalized query description recorded once in the `Meta` column
    pub query_description: String,
}

impl SummaryTable {
    fn from_accumulator(accumulator: &SubjectAccumulator, query_description: String) -> Self {
        let subjects = accumulator
            .iter()
            .map(|(subject, aggregate)| {
                let (percentage, hits_per_million) = if aggregate.total == 0 {
                    (None, None)
                } else {
                    let hits = aggregate.hits as f64;
                    let total = aggregate.total as f64;
                    (
                        Some((100.0 * hits / total * 100.0).round() / 100.0),
                        Some((1_000_000.0 * hits / total).round()),
                    )
                };
                SubjectSummary {
                    subject: subject.to_string(),
                    hits: aggregate.hits,
                    total: aggregate.total,
                    percentage,
                    hits_per_million,
                }
            })
            .collect();
        Self { subjects, query_description }
    }

    /// Write the transposed summary table: one column per subject, rows
    /// `Hits`, `Total sequences`, `Percentage of hits`, `Hits per 1
    /// million`, plus a `Meta` column holding the query description on the
    /// first data row. An empty subject set writes the header row only.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written to.
    pub fn write_csv(&self, path: &Path) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create summary file: {}", path.display()))?;

        let mut header = vec![String::new()];
        header.extend(self.subjects.iter().map(|s| s.subject.clone()));
        header.push("Meta".to_string());
        writer.write_record(&header)?;

        if !self.subjects.is_empty() {
            // The Meta cell carries the query description on the first data
            // row only.
            self.write_row(&mut writer, SUMMARY_ROWS[0], &self.query_description, |s| {
                s.hits.to_string()
            })?;
            self.write_row(&mut writer, SUMMARY_ROWS[1], "", |s| s.total.to_string())?;
            self.write_row(&mut writer, SUMMARY_ROWS[2], "", |s| {
                s.percentage.map(|p| format!("{p:.2}")).unwrap_or_default()
            })?;
            self.write_row(&mut writer, SUMMARY_ROWS[3], "", |s| {
                s.hits_per_million.map(|h| format!("{h:.0}")).unwrap_or_default()
            })?;
        }

        writer
            .flush()
            .with_context(|| format!("Failed to write summary file: {}", path.display()))
    }

    fn write_row<W: std::io::Write>(
        &self,
        writer: &mut csv::Writer<W>,
        label: &str,
        meta: &str,
        cell: impl Fn(&SubjectSummary) -> String,
    ) -> csv::Result<()> {
        let mut record = vec![label.to_string()];
        record.extend(self.subjects.iter().map(cell));
        record.push(meta.to_string());
        writer.write_record(&record)
    }
}

/// Everything a completed scan produces.
#[derive(Debug)]
pub struct ScanOutput {
    /// The per-subject summary
    pub summary: SummaryTable,
    /// All matched rows, present only when retention was requested
    pub matched_rows: Option<Vec<MatchedRow>>,
    /// Total data rows scanned across all shards
    pub rows_scanned: u64,
}

/// Discover shard files in the database directory, in sorted order.
///
/// An empty result is valid: scanning an empty directory produces a
/// header-only summary.
///
/// # Errors
/// Returns [`AbfreqError::InvalidDatabase`] when the directory cannot be
/// scanned.
pub fn discover_shards(database: &Path) -> Result<Vec<PathBuf>> {
    let pattern = database.join(SHARD_GLOB);
    let entries =
        glob::glob(&pattern.to_string_lossy()).map_err(|e| AbfreqError::InvalidDatabase {
            path: database.display().to_string(),
            reason: format!("invalid shard pattern: {e}"),
        })?;

    let mut shards = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| AbfreqError::InvalidDatabase {
            path: database.display().to_string(),
            reason: format!("cannot scan directory: {e}"),
        })?;
        shards.push(path);
    }
    shards.sort();
    Ok(shards)
}

/// Drives the filter-and-aggregate pipeline over a set of shards.
pub struct ResultAggregator<'a> {
    query: &'a Query,
    retain_full_rows: bool,
}

impl<'a> ResultAggregator<'a> {
    /// Create an aggregator for one run.
    #[must_use]
    pub fn new(query: &'a Query, retain_full_rows: bool) -> Self {
        Self { query, retain_full_rows }
    }

    /// Scan every shard sequentially: read, filter, accumulate, and
    /// optionally retain the matching rows.
    ///
    /// # Errors
    /// Returns the first [`AbfreqError::ShardRead`] encountered; the whole
    /// run is aborted and nothing is written.
    pub fn run(&self, shards: &[PathBuf]) -> Result<ScanOutput> {
        let mut accumulator = SubjectAccumulator::new();
        let mut matched_rows = self.retain_full_rows.then(Vec::new);
        let mut rows_scanned: u64 = 0;
        let mut progress = ScanProgress::new("Scanned shards", shards.len());

        for path in shards {
            let shard = read_shard(path)?;
            rows_scanned += shard.records.len() as u64;

            let hits: Vec<&Record> =
                shard.records.iter().filter(|record| filter::matches(record, self.query)).collect();
            debug!(
                "{}: subject {} matched {} of {} rows",
                path.display(),
                shard.metadata.subject_id,
                hits.len(),
                shard.records.len()
            );

            accumulator.update(
                &shard.metadata.subject_id,
                hits.len() as u64,
                shard.metadata.unique_sequences,
            );

            if let Some(rows) = matched_rows.as_mut() {
                rows.extend(
                    hits.iter().map(|record| MatchedRow::new(record, &shard.metadata.subject_id)),
                );
            }
            progress.advance();
        }

        let summary = SummaryTable::from_accumulator(&accumulator, self.query.describe());
        Ok(ScanOutput { summary, matched_rows, rows_scanned })
    }
}

/// Write the concatenated matching rows.
///
/// # Errors
/// Returns an error if the file cannot be created or written to.
pub fn write_full_results(path: &Path, rows: &[MatchedRow]) -> anyhow::Result<()> {
    DelimFile::default()
        .write_csv(&path, rows)
        .with_context(|| format!("Failed to write full results: {}", path.display()))
}
