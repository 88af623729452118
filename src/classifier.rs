//! Operation classifier: derives a coarse verb from raw command text.

/// Returns the first whitespace-delimited token of `command`.
///
/// Empty or whitespace-only input yields an empty string. The token is
/// returned exactly as written; no case folding is applied.
///
/// ```rust
/// use dbtel::classify_operation;
///
/// assert_eq!(classify_operation("SELECT * FROM t"), "SELECT");
/// assert_eq!(classify_operation("insert into t values (1)"), "insert");
/// assert_eq!(classify_operation("   "), "");
/// ```
pub fn classify_operation(command: &str) -> String {
    command.split_whitespace().next().unwrap_or_default().to_owned()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("SELECT * FROM t", "SELECT" ; "select")]
    #[test_case("", "" ; "empty")]
    #[test_case("   ", "" ; "spaces only")]
    #[test_case("\t\n", "" ; "other whitespace only")]
    #[test_case("COMMIT", "COMMIT" ; "single token")]
    #[test_case("update t set a = 1", "update" ; "case preserved")]
    #[test_case("  DELETE FROM t", "DELETE" ; "leading whitespace")]
    #[test_case("SELECT\n*\nFROM t", "SELECT" ; "newline delimited")]
    #[test_case("Ünïcode stuff", "Ünïcode" ; "non ascii")]
    fn test_classify_operation(command: &str, expected: &str) {
        assert_eq!(classify_operation(command), expected);
    }
}
