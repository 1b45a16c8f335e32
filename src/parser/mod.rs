//! XFL tokenizer
//!
//! Turns expression text into [`NewPart`]s one token at a time. Matchers are
//! tried in a fixed priority order and the first match wins; there is no
//! backtracking across kinds.
//!
//! ```text
//! "%0%.items[0]>=\"x\""
//!   Variable  %0%
//!   Member    .items
//!   Special   [
//!   (0 is skipped with a warning)
//!   Special   ]
//!   Operation >=
//!   Literal   "x"
//! ```

pub mod literal;
mod matchers;

pub use matchers::MatchContext;

use crate::model::{NewPart, PartKind};

/// Default bound on tokenizer iterations for a single expression
pub const DEFAULT_ITERATION_LIMIT: usize = 10_000;

type Matcher = for<'s> fn(&'s str, &MatchContext<'_>) -> Option<matchers::Matched<'s>>;

/// Matchers in priority order
const MATCHERS: [(&str, Matcher); 6] = [
    ("variable", matchers::variable),
    ("member", matchers::member),
    ("function", matchers::function),
    ("operation", matchers::operation),
    ("special", matchers::special),
    ("literal", matchers::literal),
];

/// Recognise the token at the start of `rest`
pub fn next_part<'s>(rest: &'s str, ctx: &MatchContext<'_>) -> Option<(NewPart, &'s str)> {
    MATCHERS.iter().find_map(|(_, matcher)| matcher(rest, ctx))
}

/// Name of the matcher that would accept `rest`, for diagnostics
pub fn matching_kind(rest: &str, ctx: &MatchContext<'_>) -> Option<&'static str> {
    MATCHERS
        .iter()
        .find(|(_, matcher)| matcher(rest, ctx).is_some())
        .map(|(name, _)| *name)
}

/// Tokenize `text` as exactly one part of the same kind as `kind`.
///
/// The whole text has to be consumed. Function heads are spelled without
/// their `(`, which is supplied for matching.
pub fn single_part(text: &str, kind: &PartKind) -> Option<NewPart> {
    let ctx = MatchContext::new(&[]);
    let (matched, rest) = match kind {
        PartKind::Variable { .. } => matchers::variable(text, &ctx)?,
        PartKind::Member(_) => matchers::member(text, &ctx)?,
        PartKind::Function(_) => {
            let head = format!("{}(", text);
            let (new, rest) = matchers::function(&head, &ctx)?;
            return (rest == "(").then_some(new);
        }
        PartKind::Operation(_) => matchers::operation(text, &ctx)?,
        PartKind::Special(_) => matchers::special(text, &ctx)?,
        PartKind::Literal { .. } => matchers::literal(text, &ctx)?,
    };
    rest.is_empty().then_some(matched)
}

/// Summary of one tokenizer run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Loop iterations used (tokens plus skipped characters)
    pub iterations: usize,
    /// Non-whitespace characters dropped because nothing matched
    pub skipped: Vec<char>,
    /// Text left over when the iteration limit was hit
    pub residual: Option<String>,
}

impl ParseOutcome {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.residual.is_none()
    }
}

/// Drop the first character of `rest`, returning it with the remainder
pub(crate) fn skip_char(rest: &str) -> Option<(char, &str)> {
    let mut chars = rest.chars();
    let ch = chars.next()?;
    Some((ch, chars.as_str()))
}
