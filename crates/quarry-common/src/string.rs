/// Escape meta characters in a string.
/// This function is used when displaying column names and cell values in a table.
pub fn escape_meta_characters(s: &str) -> String {
    s.replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
        .replace('\x07', "\\a")
        .replace('\x08', "\\b")
        .replace('\x0b', "\\v")
        .replace('\x0c', "\\f")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_meta_characters() {
        assert_eq!(escape_meta_characters("a\tb\nc"), "a\\tb\\nc");
        assert_eq!(escape_meta_characters("plain"), "plain");
    }
}
