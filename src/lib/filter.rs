//! The row predicate combining the five query conditions.
//!
//! A record matches when its V, D and J calls contain their respective
//! patterns, its junction length starts with the length prefix, and its
//! junction sequence contains the motif. All five conditions are
//! independent; each matches unconditionally when its query field is empty.

use crate::query::Query;
use crate::shard::Record;

/// Pure predicate: does `record` satisfy every condition of `query`?
#[must_use]
pub fn matches(record: &Record, query: &Query) -> bool {
    query.v.is_match(&record.v_call)
        && query.d.is_match(&record.d_call)
        && query.j.is_match(&record.j_call)
        && record.junction_length.starts_with(&query.length_prefix)
        && query.motif.is_match(&record.junction_aa)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryParams;
    use rstest::rstest;

    fn record(v: &str, d: &str, j: &str, length: &str, junction: &str) -> Record {
        Record {
            v_call: v.to_string(),
            d_call: d.to_string(),
            j_call: j.to_string(),
            junction_length: length.to_string(),
            junction_aa: junction.to_string(),
        }
    }

    fn query(ighv: &str, ighd: &str, ighj: &str, length: Option<u32>, motif: &str) -> Query {
        QueryParams {
            ighv: ighv.to_string(),
            ighd: ighd.to_string(),
            ighj: ighj.to_string(),
            cdrh3_length: length,
            h3_motif: motif.to_string(),
        }
        .normalize()
    }

    fn typical_record() -> Record {
        record("IGHV3-20*01", "IGHD3-10*01", "IGHJ4*02", "14", "CARYYADSSGWFDPW")
    }

    #[test]
    fn test_all_empty_query_matches_any_record() {
        let q = query("", "", "", None, "");
        assert!(matches(&typical_record(), &q));
        assert!(matches(&record("", "", "", "", ""), &q));
    }

    #[test]
    fn test_all_five_conditions_are_required() {
        let q = query("3-20", "3-10", "4", Some(14), "YY");
        assert!(matches(&typical_record(), &q));

        // Break each condition in turn
        let mut r = typical_record();
        r.v_call = "IGHV4-34*02".to_string();
        assert!(!matches(&r, &q));

        let mut r = typical_record();
        r.d_call = "IGHD2-2*01".to_string();
        assert!(!matches(&r, &q));

        let mut r = typical_record();
        r.j_call = "IGHJ5*02".to_string();
        assert!(!matches(&r, &q));

        let mut r = typical_record();
        r.junction_length = "15".to_string();
        assert!(!matches(&r, &q));

        let mut r = typical_record();
        r.junction_aa = "CARWGQGTLVW".to_string();
        assert!(!matches(&r, &q));
    }

    #[rstest]
    #[case("14", true)]
    #[case("140", true)]
    #[case("4", false)]
    #[case("214", false)]
    fn test_length_is_a_prefix_match(#[case] length: &str, #[case] expected: bool) {
        let q = query("", "", "", Some(14), "");
        let r = record("IGHV1-2*01", "IGHD1-1*01", "IGHJ6*01", length, "CARW");
        assert_eq!(matches(&r, &q), expected);
    }

    #[test]
    fn test_gene_family_normalization_bounds_the_match() {
        // "3" normalizes to "3-": IGHV3-20 matches, IGHV13-2 does not
        // match on the family digit alone
        let q = query("3", "", "", None, "");
        assert!(matches(&record("IGHV3-20*01", "", "", "", ""), &q));
        assert!(!matches(&record("IGHV30*01", "", "", "", ""), &q));
    }

    #[test]
    fn test_j_segment_alternatives() {
        let q = query("", "", "4|5", None, "");
        assert!(matches(&record("", "", "IGHJ4*02", "", ""), &q));
        assert!(matches(&record("", "", "IGHJ5*02", "", ""), &q));
        assert!(!matches(&record("", "", "IGHJ6*01", "", ""), &q));
    }

    #[test]
    fn test_motif_wildcards() {
        let q = query("", "", "", None, "YY.D.*G");
        assert!(matches(&record("", "", "", "", "CARYYADSSGWFDPW"), &q));
        assert!(!matches(&record("", "", "", "", "CARYYDGW"), &q));
    }

    #[test]
    fn test_match_has_no_row_order_dependency() {
        let q = query("3-20", "", "", None, "");
        let rows = vec![
            record("IGHV3-20*01", "", "", "", ""),
            record("IGHV4-34*02", "", "", "", ""),
            record("IGHV3-20*03", "", "", "", ""),
        ];

        let forward: Vec<bool> = rows.iter().map(|r| matches(r, &q)).collect();
        let mut reversed: Vec<bool> = rows.iter().rev().map(|r| matches(r, &q)).collect();
        reversed.reverse();
        assert_eq!(forward, reversed);
        assert_eq!(forward.iter().filter(|&&m| m).count(), 2);
    }
}
