//! Expression parts (tokens)
//!
//! A formula is stored as a flat sequence of [`Part`]s. Each part remembers the
//! id of its predecessor so the prefix of the expression up to any part can be
//! walked backwards without holding references into the owning arena.

use std::borrow::Cow;
use std::fmt;

use super::functions::{self, FunctionScope};
use super::value::Value;
use crate::parser::{self, literal};

/// Stable identifier of a part within its formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(pub u64);

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Infix operators, longest spellings first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    Like,
    LessOrEqual,
    GreaterOrEqual,
    And,
    Or,
    Assign,
    Plus,
    Minus,
    Multiply,
    Divide,
    Less,
    Greater,
    Not,
}

impl Operator {
    /// Match order for the tokenizer: multi-character spellings before their prefixes
    pub const ALL: [Operator; 15] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::Like,
        Operator::LessOrEqual,
        Operator::GreaterOrEqual,
        Operator::And,
        Operator::Or,
        Operator::Assign,
        Operator::Plus,
        Operator::Minus,
        Operator::Multiply,
        Operator::Divide,
        Operator::Less,
        Operator::Greater,
        Operator::Not,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Like => "~=",
            Operator::LessOrEqual => "<=",
            Operator::GreaterOrEqual => ">=",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Assign => "=",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::Not => "!",
        }
    }

    pub fn from_text(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == text)
    }

    /// Compound operator formed by typing `=` after this one
    fn with_equals(self) -> Option<Self> {
        match self {
            Operator::Less => Some(Operator::LessOrEqual),
            Operator::Greater => Some(Operator::GreaterOrEqual),
            Operator::Not => Some(Operator::NotEqual),
            Operator::Assign => Some(Operator::Equal),
            _ => None,
        }
    }
}

/// Structural punctuation and the `null` keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialToken {
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    Dot,
    Comma,
    /// `¿`, opens an explicit visible window
    VisibleStart,
    /// `?`, closes the visible window or marks the hidden suffix
    VisibleEnd,
    Null,
}

impl SpecialToken {
    pub const ALL: [SpecialToken; 11] = [
        SpecialToken::OpenParen,
        SpecialToken::CloseParen,
        SpecialToken::OpenBracket,
        SpecialToken::CloseBracket,
        SpecialToken::OpenBrace,
        SpecialToken::CloseBrace,
        SpecialToken::Dot,
        SpecialToken::Comma,
        SpecialToken::VisibleStart,
        SpecialToken::VisibleEnd,
        SpecialToken::Null,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SpecialToken::OpenParen => "(",
            SpecialToken::CloseParen => ")",
            SpecialToken::OpenBracket => "[",
            SpecialToken::CloseBracket => "]",
            SpecialToken::OpenBrace => "{",
            SpecialToken::CloseBrace => "}",
            SpecialToken::Dot => ".",
            SpecialToken::Comma => ",",
            SpecialToken::VisibleStart => "¿",
            SpecialToken::VisibleEnd => "?",
            SpecialToken::Null => "null",
        }
    }

    pub fn from_text(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == text)
    }

    pub fn from_char(ch: char) -> Option<Self> {
        let mut buf = [0u8; 4];
        Self::from_text(ch.encode_utf8(&mut buf))
    }
}

/// How a member access resolved against its owner's structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberClass {
    #[default]
    Undetermined,
    Variable,
    Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberPart {
    /// Name without the leading `.` and trailing `()`
    pub name: String,
    /// Source spelled the member as a call (`.name(`)
    pub call: bool,
    pub class: MemberClass,
    /// Placeholder until the structure lookup settles, then the member's type
    pub value: Value,
    /// Bumped on rename so late lookup results can be recognised as stale
    pub generation: u64,
}

impl MemberPart {
    pub fn new(name: impl Into<String>, call: bool) -> Self {
        let name = name.into();
        Self {
            value: Value::placeholder(name.clone()),
            name,
            call,
            class: MemberClass::Undetermined,
            generation: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionPart {
    pub name: String,
    pub scope: FunctionScope,
    pub returns_variable: bool,
    /// Unescaped first string-literal argument (the type of `#cast`/`new`)
    pub parameter: Option<String>,
}

impl FunctionPart {
    pub fn new(name: impl Into<String>, parameter: Option<String>) -> Self {
        let name = name.into();
        let info = functions::lookup(&name);
        Self {
            scope: info.map(|f| f.scope).unwrap_or(FunctionScope::None),
            returns_variable: info.map(|f| f.returns_variable).unwrap_or(false),
            name,
            parameter,
        }
    }
}

/// Closed set of part kinds
#[derive(Debug, Clone, PartialEq)]
pub enum PartKind {
    Variable { index: usize, value: Value },
    Member(MemberPart),
    Function(FunctionPart),
    Operation(Operator),
    Special(SpecialToken),
    /// Decoded string constant; the part text holds the quoted, escaped form
    Literal { value: String },
}

/// A part that has not been placed in a formula yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewPart {
    pub kind: PartKind,
    pub text: String,
}

impl NewPart {
    pub fn variable(index: usize, value: Value) -> Self {
        Self {
            kind: PartKind::Variable { index, value },
            text: format!("%{}%", index),
        }
    }

    pub fn member(name: impl Into<String>, call: bool) -> Self {
        let member = MemberPart::new(name, call);
        Self {
            text: format!(".{}", member.name),
            kind: PartKind::Member(member),
        }
    }

    pub fn function(name: impl Into<String>, parameter: Option<String>) -> Self {
        let function = FunctionPart::new(name, parameter);
        Self {
            text: function.name.clone(),
            kind: PartKind::Function(function),
        }
    }

    pub fn operation(op: Operator) -> Self {
        Self {
            kind: PartKind::Operation(op),
            text: op.as_str().to_string(),
        }
    }

    pub fn special(token: SpecialToken) -> Self {
        Self {
            kind: PartKind::Special(token),
            text: token.as_str().to_string(),
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            text: literal::encode(&value),
            kind: PartKind::Literal { value },
        }
    }

    pub fn is_special(&self, token: SpecialToken) -> bool {
        matches!(self.kind, PartKind::Special(t) if t == token)
    }
}

/// One token of a parsed expression
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub id: PartId,
    text: String,
    pub predecessor: Option<PartId>,
    pub kind: PartKind,
}

impl Part {
    pub(crate) fn place(id: PartId, new: NewPart, predecessor: Option<PartId>) -> Self {
        Self {
            id,
            text: new.text,
            predecessor,
            kind: new.kind,
        }
    }

    /// Raw source fragment
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text as rendered in the editor; braces are invisible and member
    /// functions show their call brackets
    pub fn display_text(&self) -> Cow<'_, str> {
        match &self.kind {
            PartKind::Special(SpecialToken::OpenBrace | SpecialToken::CloseBrace) => Cow::Borrowed(""),
            PartKind::Member(m) if m.class == MemberClass::Function => {
                Cow::Owned(format!(".{}()", m.name))
            }
            _ => Cow::Borrowed(&self.text),
        }
    }

    /// Replace the raw text, keeping kind-specific fields in sync.
    ///
    /// The text must tokenize as a single part of the current kind, so the
    /// expression keeps parsing back to the same parts. Returns `true` only
    /// when something actually changed.
    pub fn set_text(&mut self, text: &str) -> bool {
        if self.text == text {
            return false;
        }
        let Some(parsed) = parser::single_part(text, &self.kind) else {
            tracing::debug!(part = %self.id, text, "Rejecting text that is not a single part of this kind");
            return false;
        };
        match (&mut self.kind, parsed.kind) {
            (
                PartKind::Variable { index, value },
                PartKind::Variable {
                    index: new_index,
                    value: new_value,
                },
            ) => {
                *index = new_index;
                *value = new_value;
            }
            (PartKind::Member(member), PartKind::Member(new_member)) => {
                member.value = Value::placeholder(new_member.name.clone());
                member.name = new_member.name;
                member.class = MemberClass::Undetermined;
                member.generation += 1;
            }
            (PartKind::Function(function), PartKind::Function(new_function)) => {
                let parameter = function.parameter.take();
                *function = FunctionPart::new(new_function.name, parameter);
            }
            (PartKind::Operation(op), PartKind::Operation(new_op)) => *op = new_op,
            (PartKind::Special(token), PartKind::Special(new_token)) => *token = new_token,
            (PartKind::Literal { value }, PartKind::Literal { value: new_value }) => *value = new_value,
            _ => return false,
        }
        self.text = text.to_string();
        true
    }

    /// Decoded value of a literal part
    pub fn literal_value(&self) -> Option<&str> {
        match &self.kind {
            PartKind::Literal { value } => Some(value),
            _ => None,
        }
    }

    /// Replace a literal's decoded value, re-encoding the source text
    pub fn set_literal_value(&mut self, new_value: &str) -> bool {
        match &mut self.kind {
            PartKind::Literal { value } if value != new_value => {
                *value = new_value.to_string();
                self.text = literal::encode(new_value);
                true
            }
            _ => false,
        }
    }

    /// Fuse a successor into this part. Only operators merge:
    /// `<`, `>`, `!`, `=` followed by `=` or `==` become a compound comparison.
    pub fn merge(&mut self, successor: &NewPart) -> bool {
        let PartKind::Operation(op) = &mut self.kind else {
            return false;
        };
        if !matches!(
            successor.kind,
            PartKind::Operation(Operator::Assign | Operator::Equal)
        ) {
            return false;
        }
        let Some(merged) = op.with_equals() else {
            return false;
        };
        *op = merged;
        self.text = merged.as_str().to_string();
        true
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind, PartKind::Variable { .. })
    }

    pub fn is_member(&self) -> bool {
        matches!(self.kind, PartKind::Member(_))
    }

    pub fn is_member_variable(&self) -> bool {
        matches!(&self.kind, PartKind::Member(m) if m.class == MemberClass::Variable)
    }

    pub fn is_member_function(&self) -> bool {
        matches!(&self.kind, PartKind::Member(m) if m.class == MemberClass::Function)
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, PartKind::Function(_))
    }

    pub fn is_function_returning_variable(&self) -> bool {
        matches!(&self.kind, PartKind::Function(f) if f.returns_variable)
    }

    pub fn is_operation(&self) -> bool {
        matches!(self.kind, PartKind::Operation(_))
    }

    pub fn is_special(&self) -> bool {
        matches!(self.kind, PartKind::Special(_))
    }

    pub fn is_special_token(&self, token: SpecialToken) -> bool {
        matches!(self.kind, PartKind::Special(t) if t == token)
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, PartKind::Literal { .. })
    }

    /// Parts that can own a navigable structure
    pub fn is_structure_candidate(&self) -> bool {
        self.is_variable()
            || self.is_member_variable()
            || self.is_member_function()
            || self.is_function_returning_variable()
    }

    pub fn member(&self) -> Option<&MemberPart> {
        match &self.kind {
            PartKind::Member(m) => Some(m),
            _ => None,
        }
    }

    pub fn function(&self) -> Option<&FunctionPart> {
        match &self.kind {
            PartKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn variable_value(&self) -> Option<&Value> {
        match &self.kind {
            PartKind::Variable { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Short kind label used in logs and CLI output
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            PartKind::Variable { .. } => "variable",
            PartKind::Member(m) => match m.class {
                MemberClass::Undetermined => "member",
                MemberClass::Variable => "member-variable",
                MemberClass::Function => "member-function",
            },
            PartKind::Function(_) => "function",
            PartKind::Operation(_) => "operation",
            PartKind::Special(_) => "special",
            PartKind::Literal { .. } => "literal",
        }
    }
}
