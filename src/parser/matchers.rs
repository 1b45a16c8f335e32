//! Greedy per-kind matchers
//!
//! Each matcher looks at the start of the remaining expression and either
//! returns the recognised part together with the unconsumed rest, or `None`.

use super::literal;
use crate::model::{NewPart, Operator, Part, SpecialToken, Value};

/// What a matcher may consult besides the text itself
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub variables: &'a [Value],
    pub predecessor: Option<&'a Part>,
}

impl<'a> MatchContext<'a> {
    pub fn new(variables: &'a [Value]) -> Self {
        Self {
            variables,
            predecessor: None,
        }
    }
}

pub type Matched<'s> = (NewPart, &'s str);

/// Length of an identifier at the start of `input`.
/// `lead` decides which characters may start it.
fn identifier_len(input: &str, lead: impl Fn(char) -> bool) -> usize {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, ch)) if lead(ch) => {}
        _ => return 0,
    }
    chars
        .find(|&(_, ch)| !(ch.is_ascii_alphanumeric() || ch == '_'))
        .map(|(i, _)| i)
        .unwrap_or(input.len())
}

/// `%<digits>%`
pub fn variable<'s>(rest: &'s str, ctx: &MatchContext<'_>) -> Option<Matched<'s>> {
    let body = rest.strip_prefix('%')?;
    let digits = body.find(|c: char| !c.is_ascii_digit()).unwrap_or(body.len());
    if digits == 0 || !body[digits..].starts_with('%') {
        return None;
    }
    let token_len = digits + 2;
    let token = &rest[..token_len];

    let mut new = match body[..digits].parse::<usize>() {
        Ok(index) => {
            let value = ctx
                .variables
                .get(index)
                .cloned()
                .unwrap_or_else(|| Value::placeholder(token));
            NewPart::variable(index, value)
        }
        Err(_) => NewPart::variable(usize::MAX, Value::placeholder(token)),
    };
    new.text = token.to_string();
    Some((new, &rest[token_len..]))
}

/// `.name` (member variable) or `.name(` (member function, `(` left unconsumed)
pub fn member<'s>(rest: &'s str, _ctx: &MatchContext<'_>) -> Option<Matched<'s>> {
    let body = rest.strip_prefix('.')?;
    let len = identifier_len(body, |c| c.is_ascii_alphabetic() || c == '_');
    if len == 0 {
        return None;
    }
    let name = &body[..len];
    let after = &body[len..];
    let call = after.starts_with('(');
    Some((NewPart::member(name, call), after))
}

/// `name(` with the `(` left for the next token. A string literal directly
/// inside the bracket is captured as the function parameter.
pub fn function<'s>(rest: &'s str, _ctx: &MatchContext<'_>) -> Option<Matched<'s>> {
    let len = identifier_len(rest, |c| c.is_ascii_alphabetic() || c == '_' || c == '#');
    if len == 0 {
        return None;
    }
    let after = &rest[len..];
    let args = after.strip_prefix('(')?;
    let parameter = literal::scan(args).map(|end| literal::decode(&args[..end]));
    Some((NewPart::function(&rest[..len], parameter), after))
}

/// Longest operator spelling
pub fn operation<'s>(rest: &'s str, _ctx: &MatchContext<'_>) -> Option<Matched<'s>> {
    Operator::ALL
        .into_iter()
        .find(|op| rest.starts_with(op.as_str()))
        .map(|op| (NewPart::operation(op), &rest[op.as_str().len()..]))
}

/// Punctuation and `null`
pub fn special<'s>(rest: &'s str, _ctx: &MatchContext<'_>) -> Option<Matched<'s>> {
    SpecialToken::ALL
        .into_iter()
        .find(|token| rest.starts_with(token.as_str()))
        .map(|token| (NewPart::special(token), &rest[token.as_str().len()..]))
}

/// Double-quoted string with `\"` / `\\` escapes
pub fn literal<'s>(rest: &'s str, _ctx: &MatchContext<'_>) -> Option<Matched<'s>> {
    let end = literal::scan(rest)?;
    let raw = &rest[..end];
    let mut new = NewPart::literal(literal::decode(raw));
    // Keep the source spelling; re-encoding could normalise unknown escapes
    new.text = raw.to_string();
    Some((new, &rest[end..]))
}
