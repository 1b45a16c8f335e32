//! Argument grouping for `concat(...)`

use crate::model::{Part, PartKind, SpecialToken};

pub const CONCAT: &str = "concat";

/// Separator between the argument lists of two rows
pub const ROW_SEPARATOR: &str = r#","\n","#;

/// Arguments of the first `concat(` call, split at commas outside brackets.
///
/// `(`, `[` and `{` share one depth counter. An argument that starts with
/// `{` runs to its matching `}` whatever else it contains. A missing final
/// `)` is tolerated.
pub fn concat_arguments(parts: &[Part]) -> Option<Vec<&[Part]>> {
    let start = parts
        .iter()
        .position(|p| p.function().is_some_and(|f| f.name == CONCAT))?;
    if !parts.get(start + 1)?.is_special_token(SpecialToken::OpenParen) {
        return None;
    }

    let mut arguments = Vec::new();
    let mut argument_start = start + 2;
    let mut depth = 0usize;
    let mut braces: Option<usize> = None;

    for (i, part) in parts.iter().enumerate().skip(argument_start) {
        let token = match part.kind {
            PartKind::Special(token) => Some(token),
            _ => None,
        };

        if let Some(open) = braces.as_mut() {
            match token {
                Some(SpecialToken::OpenBrace) => *open += 1,
                Some(SpecialToken::CloseBrace) => *open -= 1,
                _ => {}
            }
            if *open == 0 {
                braces = None;
            }
            continue;
        }

        match token {
            Some(SpecialToken::OpenBrace) if depth == 0 && i == argument_start => braces = Some(1),
            Some(SpecialToken::OpenParen | SpecialToken::OpenBracket | SpecialToken::OpenBrace) => {
                depth += 1
            }
            Some(SpecialToken::CloseParen) if depth == 0 => {
                if !(arguments.is_empty() && i == argument_start) {
                    arguments.push(&parts[argument_start..i]);
                }
                return Some(arguments);
            }
            Some(SpecialToken::CloseParen | SpecialToken::CloseBracket | SpecialToken::CloseBrace) => {
                depth = depth.saturating_sub(1)
            }
            Some(SpecialToken::Comma) if depth == 0 => {
                arguments.push(&parts[argument_start..i]);
                argument_start = i + 1;
            }
            _ => {}
        }
    }

    if argument_start < parts.len() || !arguments.is_empty() {
        arguments.push(&parts[argument_start.min(parts.len())..]);
    }
    Some(arguments)
}

/// Whether the parts contain a comma outside any bracket
pub fn has_top_level_comma(parts: &[Part]) -> bool {
    let mut depth = 0usize;
    for part in parts {
        match part.kind {
            PartKind::Special(
                SpecialToken::OpenParen | SpecialToken::OpenBracket | SpecialToken::OpenBrace,
            ) => depth += 1,
            PartKind::Special(
                SpecialToken::CloseParen | SpecialToken::CloseBracket | SpecialToken::CloseBrace,
            ) => depth = depth.saturating_sub(1),
            PartKind::Special(SpecialToken::Comma) if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

/// Text of a quoted literal part with the template escapes resolved
pub fn literal_text(part: &Part) -> String {
    let raw = part.text();
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);
    super::text::unescape(inner)
}
