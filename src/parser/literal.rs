//! Quoted string literals: scanning, escaping and unescaping

/// Byte length of the quoted literal at the start of `input`, if any.
///
/// A backslash escapes whatever character follows it.
pub fn scan(input: &str) -> Option<usize> {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, '"')) => {}
        _ => return None,
    }
    while let Some((i, ch)) = chars.next() {
        match ch {
            '\\' => {
                chars.next()?;
            }
            '"' => return Some(i + 1),
            _ => {}
        }
    }
    None
}

/// Quote and escape a display value for the source form
pub fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Strip the quotes of a source literal and resolve `\"` and `\\`.
///
/// Other escape sequences are kept verbatim.
pub fn decode(raw: &str) -> String {
    let inner = raw.strip_prefix('"').unwrap_or(raw);
    let inner = inner.strip_suffix('"').unwrap_or(inner);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_simple() {
        assert_eq!(scan(r#""abc" + 1"#), Some(5));
        assert_eq!(scan("abc"), None);
    }

    #[test]
    fn test_scan_escaped_quote() {
        let input = r#""a\"b",x"#;
        assert_eq!(scan(input), Some(6));
        assert_eq!(&input[..6], r#""a\"b""#);
    }

    #[test]
    fn test_scan_escaped_backslash_before_quote() {
        let input = r#""a\\"b"#;
        assert_eq!(scan(input), Some(5));
    }

    #[test]
    fn test_scan_unterminated() {
        assert_eq!(scan(r#""never closed"#), None);
        assert_eq!(scan(r#""dangling\"#), None);
    }

    #[test]
    fn test_decode_keeps_unknown_escapes() {
        assert_eq!(decode(r#""line\nnext""#), "line\\nnext");
        assert_eq!(decode(r#""q\"\\""#), "q\"\\");
    }

    #[test]
    fn test_encode_decode_inverse() {
        for value in ["", "plain", "with \"quotes\"", "back\\slash", "ünïcode ¿?"] {
            assert_eq!(decode(&encode(value)), value);
        }
    }
}
