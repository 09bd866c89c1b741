//! Wildcard patterns for gene-segment and junction-motif matching.
//!
//! Query fields use a small grammar: `.` matches any single character, `.*`
//! (dot followed by star) matches any run of zero or more characters, and
//! every other character matches itself. A bare `*` is a literal, so allele
//! suffixes such as `3-20*01` match themselves. Alternatives are separated
//! by `|` and a pattern matches a field when any alternative occurs anywhere
//! inside it (unanchored containment). The empty pattern matches every
//! field.
//!
//! Patterns are compiled once into an explicit token list and matched with a
//! small backtracking scanner, so matching behavior is defined by this
//! module rather than by a regex engine.

/// One element of a compiled pattern alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    /// Matches exactly this byte
    Literal(u8),
    /// `.`: matches any single character
    AnyOne,
    /// `.*`: matches any run of zero or more characters
    AnyRun,
}

/// A compiled wildcard pattern for one query field.
#[derive(Debug, Clone)]
pub struct Pattern {
    text: String,
    alternatives: Vec<Vec<Token>>,
}

impl Pattern {
    /// Compile a pattern string into its `|`-separated alternatives.
    #[must_use]
    pub fn compile(text: &str) -> Self {
        let alternatives = text.split('|').map(tokenize).collect();
        Self { text: text.to_string(), alternatives }
    }

    /// The original pattern text this was compiled from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True if any alternative occurs anywhere inside `field`.
    ///
    /// An empty pattern (or an empty alternative) matches every field.
    #[must_use]
    pub fn is_match(&self, field: &str) -> bool {
        self.alternatives.iter().any(|alt| contains(alt, field.as_bytes()))
    }
}

fn tokenize(alternative: &str) -> Vec<Token> {
    let bytes = alternative.as_bytes();
    let mut tokens = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'.' {
            if bytes.get(i + 1) == Some(&b'*') {
                tokens.push(Token::AnyRun);
                i += 2;
            } else {
                tokens.push(Token::AnyOne);
                i += 1;
            }
        } else {
            tokens.push(Token::Literal(bytes[i]));
            i += 1;
        }
    }
    tokens
}

/// Unanchored containment: try to match the token list at every start offset.
fn contains(tokens: &[Token], field: &[u8]) -> bool {
    (0..=field.len()).any(|start| matches_at(tokens, &field[start..]))
}

/// Anchored match of `tokens` against the front of `field`.
fn matches_at(tokens: &[Token], field: &[u8]) -> bool {
    match tokens.split_first() {
        None => true,
        Some((Token::Literal(byte), rest)) => {
            field.first() == Some(byte) && matches_at(rest, &field[1..])
        }
        Some((Token::AnyOne, rest)) => !field.is_empty() && matches_at(rest, &field[1..]),
        Some((Token::AnyRun, rest)) => {
            (0..=field.len()).any(|skip| matches_at(rest, &field[skip..]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_empty_pattern_matches_everything() {
        let pattern = Pattern::compile("");
        assert!(pattern.is_match(""));
        assert!(pattern.is_match("IGHV3-20*01"));
        assert!(pattern.is_match("anything at all"));
    }

    #[test]
    fn test_literal_containment() {
        let pattern = Pattern::compile("3-20");
        assert!(pattern.is_match("IGHV3-20*01"));
        assert!(pattern.is_match("3-20"));
        assert!(!pattern.is_match("IGHV3-2"));
        assert!(!pattern.is_match("IGHV4-34*02"));
    }

    #[test]
    fn test_bare_star_is_literal() {
        let pattern = Pattern::compile("3-20*01");
        assert!(pattern.is_match("IGHV3-20*01"));
        // Not a repeat quantifier: "3-201" must not match
        assert!(!pattern.is_match("IGHV3-201"));
    }

    #[test]
    fn test_any_one_character() {
        let pattern = Pattern::compile("Y.D");
        assert!(pattern.is_match("AYYDG"));
        assert!(pattern.is_match("YXD"));
        assert!(!pattern.is_match("YD"));
    }

    #[test]
    fn test_any_run() {
        let pattern = Pattern::compile("YY.*G");
        assert!(pattern.is_match("YYG")); // zero-length run
        assert!(pattern.is_match("YYAAAG"));
        assert!(pattern.is_match("CARYYSSSGWFDP"));
        assert!(!pattern.is_match("YG"));
    }

    #[test]
    fn test_motif_combined_grammar() {
        let pattern = Pattern::compile("YY.D.*G");
        assert!(pattern.is_match("CYYADSSGW"));
        assert!(pattern.is_match("YYXDG"));
        assert!(!pattern.is_match("YYDG")); // `.` requires one residue
    }

    #[test]
    fn test_alternatives() {
        let pattern = Pattern::compile("3-20|3-22");
        assert!(pattern.is_match("IGHV3-20*01"));
        assert!(pattern.is_match("IGHV3-22*03"));
        assert!(!pattern.is_match("IGHV3-23*01"));
    }

    #[test]
    fn test_empty_alternative_matches_everything() {
        // "3-20|" carries an empty alternative, which matches any field
        let pattern = Pattern::compile("3-20|");
        assert!(pattern.is_match("IGHV4-34*02"));
    }

    #[test]
    fn test_trailing_any_run() {
        let pattern = Pattern::compile("WGQ.*");
        assert!(pattern.is_match("CARWGQ"));
        assert!(pattern.is_match("WGQGTLV"));
        assert!(!pattern.is_match("WG"));
    }

    #[rstest]
    #[case("J4", "IGHJ4*02", true)]
    #[case("J4", "IGHJ5*02", false)]
    #[case("J4|J5", "IGHJ5*02", true)]
    #[case("...", "ab", false)]
    #[case("...", "abc", true)]
    #[case(".*", "", true)]
    fn test_match_cases(#[case] pattern: &str, #[case] field: &str, #[case] expected: bool) {
        assert_eq!(Pattern::compile(pattern).is_match(field), expected);
    }

    #[test]
    fn test_as_str_round_trip() {
        let pattern = Pattern::compile("3-20|3-22");
        assert_eq!(pattern.as_str(), "3-20|3-22");
    }
}
