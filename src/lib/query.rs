//! Query validation, normalization and the compiled query state.
//!
//! Raw user input arrives as five strings (IGHV, IGHD, IGHJ, CDRH3 length,
//! H3 motif). [`QueryParams::validate`] rejects disallowed characters and a
//! motif longer than the stated CDRH3 length before anything is scanned.
//! [`QueryParams::normalize`] then applies the gene-name conventions the
//! repertoire tables use: pipe-separated V/D segments lacking a hyphen get a
//! trailing `-` (so `3` means the `3-` family, not every segment whose name
//! contains a 3), J segments get a leading `J`, and the length becomes its
//! decimal string form. Empty fields stay empty and match everything.

use crate::errors::{AbfreqError, Result};
use crate::pattern::Pattern;

/// Characters allowed in user-supplied pattern fields besides alphanumerics.
const ALLOWED_PUNCTUATION: &[char] = &['|', '-', '.', '*'];

/// Raw, unvalidated user input for one search.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    /// IGHV segment pattern, e.g. `3-20` or `3-20|3-22`
    pub ighv: String,
    /// IGHD segment pattern
    pub ighd: String,
    /// IGHJ segment pattern, e.g. `4` or `4|5`
    pub ighj: String,
    /// CDRH3 length (including the leading C and trailing W residues)
    pub cdrh3_length: Option<u32>,
    /// H3 motif in the wildcard grammar, e.g. `YY.D.*G`
    pub h3_motif: String,
}

impl QueryParams {
    /// Check every field for disallowed characters and the motif for an
    /// impossible length before the scan starts.
    ///
    /// # Errors
    /// Returns [`AbfreqError::InvalidQuery`] naming the offending parameter.
    pub fn validate(&self) -> Result<()> {
        validate_chars("ighv", &self.ighv)?;
        validate_chars("ighd", &self.ighd)?;
        validate_chars("ighj", &self.ighj)?;
        validate_chars("h3-motif", &self.h3_motif)?;

        if let Some(length) = self.cdrh3_length {
            if self.h3_motif.len() > length as usize {
                return Err(AbfreqError::InvalidQuery {
                    parameter: "h3-motif".to_string(),
                    reason: format!(
                        "motif is {} characters but the CDRH3 length is {length}",
                        self.h3_motif.len()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Apply gene-name normalization and compile the five match fields.
    #[must_use]
    pub fn normalize(&self) -> Query {
        let v = adjust_gene(&self.ighv);
        let d = adjust_gene(&self.ighd);
        let j = adjust_j(&self.ighj);
        let length_prefix = self.cdrh3_length.map(|n| n.to_string()).unwrap_or_default();
        Query {
            v: Pattern::compile(&v),
            d: Pattern::compile(&d),
            j: Pattern::compile(&j),
            length_prefix,
            motif: Pattern::compile(&self.h3_motif),
        }
    }
}

fn validate_chars(parameter: &str, value: &str) -> Result<()> {
    for c in value.chars() {
        if !c.is_ascii_alphanumeric() && !ALLOWED_PUNCTUATION.contains(&c) {
            return Err(AbfreqError::InvalidQuery {
                parameter: parameter.to_string(),
                reason: format!("contains disallowed character '{c}'"),
            });
        }
    }
    Ok(())
}

/// Append a trailing `-` to every pipe-separated segment lacking a hyphen,
/// so `3` matches the `3-` gene family rather than any name containing `3`.
/// Empty input stays empty.
fn adjust_gene(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    raw.split('|')
        .map(|part| if part.contains('-') { part.to_string() } else { format!("{part}-") })
        .collect::<Vec<_>>()
        .join("|")
}

/// Prepend `J` to every pipe-separated segment, so `4|5` matches `J4` or
/// `J5`. Empty input stays empty.
fn adjust_j(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    raw.split('|').map(|part| format!("J{part}")).collect::<Vec<_>>().join("|")
}

/// The immutable five-field predicate state for one run.
///
/// Built once from normalized input before scanning begins. Each field,
/// when empty, matches everything.
#[derive(Debug, Clone)]
pub struct Query {
    /// V-segment pattern, matched against `v_call`
    pub v: Pattern,
    /// D-segment pattern, matched against `d_call`
    pub d: Pattern,
    /// J-segment pattern, matched against `j_call`
    pub j: Pattern,
    /// Decimal prefix the junction length must start with (empty = any)
    pub length_prefix: String,
    /// Motif pattern, matched against `junction_aa`
    pub motif: Pattern,
}

impl Query {
    /// One-line provenance description recorded in the summary output.
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "IGHV: {}, IGHD: {}, IGHJ: {}, CDRH3-length: {}, H3-motif: {}",
            self.v.as_str(),
            self.d.as_str(),
            self.j.as_str(),
            self.length_prefix,
            self.motif.as_str()
        )
    }
}
