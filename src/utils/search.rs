/// Builds an `ILIKE` pattern matching `term` anywhere, with `%`, `_` and `\`
/// in the term matched literally. Pair with `ESCAPE '\'` in the query.
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_term() {
        assert_eq!(contains_pattern("rojas"), "%rojas%");
    }

    #[test]
    fn test_wildcards_are_escaped() {
        assert_eq!(contains_pattern("_"), "%\\_%");
        assert_eq!(contains_pattern("50%"), "%50\\%%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
