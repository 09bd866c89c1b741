//! Reading compressed repertoire shards.
//!
//! A shard is one gzip-compressed text file per subject/trial. Its first
//! line embeds a quoted metadata blob (inner quotes doubled, CSV style)
//! that unescapes to a JSON mapping carrying at least `Subject` and
//! `Unique sequences`. The remaining lines form a headered CSV table from
//! which only the five columns the filter needs are kept; everything else
//! is ignored.
//!
//! Any failure here is fatal for the whole run: a shard without a usable
//! metadata line cannot attribute its hits to a subject, and skipping it
//! would silently corrupt the aggregate totals.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use serde_json::Value;

use crate::errors::{AbfreqError, Result};

/// Metadata key naming the subject the shard belongs to.
const SUBJECT_KEY: &str = "Subject";
/// Metadata key holding the shard's total unique-sequence count.
const UNIQUE_SEQUENCES_KEY: &str = "Unique sequences";

/// Column names the row table must provide; other columns are ignored.
const REQUIRED_COLUMNS: [&str; 5] =
    ["v_call", "d_call", "j_call", "junction_aa_length", "junction_aa"];

/// One row of a shard, reduced to the fields the filter evaluates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// V gene segment call(s)
    pub v_call: String,
    /// D gene segment call(s)
    pub d_call: String,
    /// J gene segment call(s)
    pub j_call: String,
    /// Junction length in its original string form
    pub junction_length: String,
    /// Junction amino-acid sequence
    pub junction_aa: String,
}

/// The two metadata fields retained from a shard's header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardMetadata {
    /// The accumulation key identifying the subject
    pub subject_id: String,
    /// Shard-reported total unique-sequence count
    pub unique_sequences: u64,
}

/// A fully read shard: its metadata and all of its data rows.
#[derive(Debug)]
pub struct Shard {
    /// Parsed header metadata
    pub metadata: ShardMetadata,
    /// All data rows, in file order
    pub records: Vec<Record>,
}

/// Decompress and parse one shard.
///
/// # Errors
/// Returns [`AbfreqError::ShardRead`] if the file cannot be opened or
/// decompressed, the metadata line is missing or malformed, a required
/// column is absent, or a data row cannot be parsed.
pub fn read_shard(path: &Path) -> Result<Shard> {
    let file = File::open(path).map_err(|e| shard_error(path, format!("cannot open: {e}")))?;
    let mut reader = BufReader::new(MultiGzDecoder::new(file));

    let mut metadata_line = String::new();
    let bytes_read = reader
        .read_line(&mut metadata_line)
        .map_err(|e| shard_error(path, format!("cannot read metadata line: {e}")))?;
    if bytes_read == 0 {
        return Err(shard_error(path, "metadata line is missing".to_string()));
    }

    let metadata = parse_metadata(metadata_line.trim_end(), path)?;
    let records = read_records(reader, path)?;
    Ok(Shard { metadata, records })
}

fn shard_error(path: &Path, reason: String) -> AbfreqError {
    AbfreqError::ShardRead { path: path.display().to_string(), reason }
}

/// Parse the embedded metadata line into its two retained fields.
fn parse_metadata(line: &str, path: &Path) -> Result<ShardMetadata> {
    let unescaped = unquote_embedded(line)
        .ok_or_else(|| shard_error(path, "metadata line is not a quoted blob".to_string()))?;
    let mapping: Value = serde_json::from_str(&unescaped)
        .map_err(|e| shard_error(path, format!("metadata blob is not valid JSON: {e}")))?;

    let subject_id = mapping
        .get(SUBJECT_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| shard_error(path, format!("metadata is missing '{SUBJECT_KEY}'")))?
        .to_string();

    let unique_sequences = match mapping.get(UNIQUE_SEQUENCES_KEY) {
        Some(Value::Number(n)) => n.as_u64().ok_or_else(|| {
            shard_error(path, format!("'{UNIQUE_SEQUENCES_KEY}' is not a non-negative integer"))
        })?,
        Some(Value::String(s)) => s.trim().parse::<u64>().map_err(|_| {
            shard_error(path, format!("'{UNIQUE_SEQUENCES_KEY}' is not an integer: '{s}'"))
        })?,
        _ => {
            return Err(shard_error(path, format!("metadata is missing '{UNIQUE_SEQUENCES_KEY}'")));
        }
    };

    Ok(ShardMetadata { subject_id, unique_sequences })
}

/// Unescape a CSV-style quoted blob embedded in a plain-text line.
///
/// Two-state scanner: the line must open with a quote; inside the blob a
/// doubled quote collapses to one and the first lone quote closes it.
/// Content after the closing quote is ignored. Returns `None` when the
/// line does not open with a quote or the blob is unterminated.
fn unquote_embedded(line: &str) -> Option<String> {
    let mut chars = line.strip_prefix('"')?.chars().peekable();
    let mut unescaped = String::with_capacity(line.len());
    loop {
        match chars.next() {
            Some('"') => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    unescaped.push('"');
                } else {
                    return Some(unescaped);
                }
            }
            Some(c) => unescaped.push(c),
            None => return None,
        }
    }
}

/// Positions of the required columns within a shard's header row.
struct RecordColumns {
    v_call: usize,
    d_call: usize,
    j_call: usize,
    junction_length: usize,
    junction_aa: usize,
}

impl RecordColumns {
    fn locate(headers: &csv::StringRecord) -> std::result::Result<Self, String> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| format!("missing required column '{name}'"))
        };
        Ok(Self {
            v_call: find(REQUIRED_COLUMNS[0])?,
            d_call: find(REQUIRED_COLUMNS[1])?,
            j_call: find(REQUIRED_COLUMNS[2])?,
            junction_length: find(REQUIRED_COLUMNS[3])?,
            junction_aa: find(REQUIRED_COLUMNS[4])?,
        })
    }

    /// Missing trailing cells read as empty fields.
    fn extract(&self, row: &csv::StringRecord) -> Record {
        let cell = |index: usize| row.get(index).unwrap_or_default().to_string();
        Record {
            v_call: cell(self.v_call),
            d_call: cell(self.d_call),
            j_call: cell(self.j_call),
            junction_length: cell(self.junction_length),
            junction_aa: cell(self.junction_aa),
        }
    }
}

fn read_records<R: BufRead>(reader: R, path: &Path) -> Result<Vec<Record>> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader
        .headers()
        .map_err(|e| shard_error(path, format!("cannot read table header: {e}")))?
        .clone();
    let columns = RecordColumns::locate(&headers).map_err(|reason| shard_error(path, reason))?;

    let mut records = Vec::new();
    for row in csv_reader.into_records() {
        let row = row.map_err(|e| shard_error(path, format!("malformed table row: {e}")))?;
        records.push(columns.extract(&row));
    }
    Ok(records)
}
