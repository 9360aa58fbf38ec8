/// Calculates the 1-based line and column number for a given byte position in the source text.
/// This function is designed to be called only when an error occurs, as it iterates through
/// the source text to determine the position.
pub fn get_line_and_column(source: &str, position: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (i, c) in source.char_indices() {
        if i >= position {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Escapes text for a double-quoted string: backslashes, quotes and control characters.
pub fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escapes only backslashes and quotes, leaving control characters alone. Used for text that
/// is already in its serialized form and gets nested inside another string.
pub fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Reverses [`escape_string`]. Unknown escapes keep their backslash.
pub fn unescape_string(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => result.push('"'),
            Some('\\') => result.push('\\'),
            Some('\'') => result.push('\''),
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_column() {
        let source = "Begin Object\n   NodePosX=1\nEnd Object";
        assert_eq!(get_line_and_column(source, 0), (1, 1));
        assert_eq!(get_line_and_column(source, 16), (2, 4));
        assert_eq!(get_line_and_column(source, source.len()), (3, 11));
    }

    #[test]
    fn test_escape_and_unescape() {
        let raw = "say \"hi\"\\n\nnext";
        let escaped = escape_string(raw);
        assert_eq!(escaped, r#"say \"hi\"\\n\nnext"#);
        assert_eq!(unescape_string(&escaped), raw);
    }

    #[test]
    fn test_unknown_escape_is_kept() {
        assert_eq!(unescape_string(r"a\qb"), r"a\qb");
    }
}
