use crate::error::RowRejection;
use once_cell::sync::Lazy;
use regex::Regex;

static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static pattern compiles"));

/// Stateless rules for a single code cell.
#[derive(Debug, Clone, Copy)]
pub struct CodeValidator {
    max_len: usize,
}

impl CodeValidator {
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    /// Trims the cell and checks emptiness, length, then charset, in that
    /// order. Case is preserved.
    pub fn validate(&self, raw: &str) -> Result<String, RowRejection> {
        let code = raw.trim();
        if code.is_empty() {
            return Err(RowRejection::Empty);
        }
        if code.chars().count() > self.max_len {
            return Err(RowRejection::TooLong { max: self.max_len });
        }
        if !CODE_PATTERN.is_match(code) {
            return Err(RowRejection::InvalidCharacters);
        }
        Ok(code.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ABC123", "ABC123")]
    #[case("  spaced-out_1  ", "spaced-out_1")]
    #[case("lowerUPPER", "lowerUPPER")]
    #[case("\tX\t", "X")]
    fn accepts_and_trims(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(CodeValidator::new(50).validate(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("", RowRejection::Empty)]
    #[case("    ", RowRejection::Empty)]
    #[case("has space", RowRejection::InvalidCharacters)]
    #[case("semi;colon", RowRejection::InvalidCharacters)]
    #[case("café", RowRejection::InvalidCharacters)]
    #[case("\u{FEFF}BOM", RowRejection::InvalidCharacters)]
    fn rejects(#[case] raw: &str, #[case] reason: RowRejection) {
        assert_eq!(CodeValidator::new(50).validate(raw), Err(reason));
    }

    #[test]
    fn length_limit_is_inclusive() {
        let validator = CodeValidator::new(50);
        assert!(validator.validate(&"a".repeat(50)).is_ok());
        assert_eq!(
            validator.validate(&"a".repeat(51)),
            Err(RowRejection::TooLong { max: 50 })
        );
    }

    #[test]
    fn length_is_checked_before_charset() {
        let long_and_bad = "!".repeat(60);
        assert_eq!(
            CodeValidator::new(50).validate(&long_and_bad),
            Err(RowRejection::TooLong { max: 50 })
        );
    }

    #[test]
    fn accepted_codes_match_the_storage_pattern() {
        let full = Regex::new(r"^[A-Za-z0-9_-]{1,50}$").unwrap();
        let validator = CodeValidator::new(50);
        for raw in ["a", " Z-9_ ", "___", "0123456789", &"x".repeat(50), "a b", ""] {
            if let Ok(code) = validator.validate(raw) {
                assert!(full.is_match(&code), "{:?} slipped through", code);
            }
        }
    }
}
