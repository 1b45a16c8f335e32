//! Expression tree
//!
//! A read-only tree view over a formula's parts, built in one pass whenever a
//! caller needs nesting information the flat part list does not give: the
//! arguments of a call, the owner of a member access, the target of `#cast`.
//! There is no operator precedence; operators and operands between
//! separators are kept as a flat [`Term`] sequence.
//!
//! The tree tolerates unterminated brackets at the end of the input so that
//! half-typed expressions still yield a tree.

use std::fmt;

use crate::model::{Formula, Operator, Part, PartKind, SpecialToken, Value};
use crate::parser::literal;
use crate::structure::{StructureChild, StructureLookup, TypeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Paren,
    Brace,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpression {
    pub name: String,
    pub arguments: Vec<Expression>,
}

/// `#cast(...)` or `new(...)`
#[derive(Debug, Clone, PartialEq)]
pub struct CastExpression {
    pub name: String,
    /// Target type from the leading string literal, if any
    pub type_name: Option<String>,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Operand(Expression),
    Operator(Operator),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Variable {
        index: usize,
        value: Value,
    },
    Literal(String),
    Null,
    Member {
        owner: Box<Expression>,
        name: String,
        /// `Some` for `.name(...)`
        arguments: Option<Vec<Expression>>,
    },
    Function(FunctionExpression),
    Cast(CastExpression),
    Index {
        target: Box<Expression>,
        index: Box<Expression>,
    },
    Group {
        kind: GroupKind,
        inner: Box<Expression>,
    },
    /// Operands and operators in source order; empty for an empty argument
    Sequence(Vec<Term>),
}

impl Expression {
    /// Tree of the whole formula, `None` when stray closers or separators
    /// are left over
    pub fn build(formula: &Formula) -> Option<Expression> {
        let mut parser = TreeParser::new(formula.parts());
        let expression = parser.sequence()?;
        parser.at_end().then_some(expression)
    }

    /// Tree of the operand starting at part `index` (a variable, literal,
    /// call or group), without trailing member accesses
    pub fn parse_at(formula: &Formula, index: usize) -> Option<Expression> {
        let parts = formula.parts();
        if is_sentinel(parts.get(index)?) {
            return None;
        }
        let mut parser = TreeParser::new(parts);
        parser.pos = parts[..index].iter().filter(|p| !is_sentinel(p)).count();
        parser.primary()
    }

    /// Type of the value this expression produces, as far as variable
    /// declarations, cast targets and known structures tell
    pub fn resolved_type(
        &self,
        formula: &Formula,
        structures: &dyn StructureLookup,
    ) -> Option<TypeRef> {
        match self {
            Expression::Variable { index, value } => {
                let value = formula.variables().get(*index).unwrap_or(value);
                let fqn = value.effective_fqn();
                (!fqn.is_empty()).then(|| TypeRef {
                    fqn: fqn.to_string(),
                    is_list: value.is_list,
                })
            }
            Expression::Cast(cast) => match &cast.type_name {
                Some(type_name) => Some(TypeRef::new(type_name.clone())),
                // A cast without target keeps the type of what it wraps
                None => cast.arguments.last()?.resolved_type(formula, structures),
            },
            Expression::Member { owner, name, .. } => {
                let owner = owner.resolved_type(formula, structures)?;
                match structures.lookup(&owner.fqn)?.child(name)? {
                    StructureChild::Field { type_ref, .. } => Some(type_ref.clone()),
                    StructureChild::Method { returns, .. } => returns.first().cloned(),
                }
            }
            Expression::Index { target, .. } => target
                .resolved_type(formula, structures)
                .map(|t| TypeRef::new(t.fqn)),
            Expression::Group { inner, .. } => inner.resolved_type(formula, structures),
            Expression::Literal(_)
            | Expression::Null
            | Expression::Function(_)
            | Expression::Sequence(_) => None,
        }
    }
}

fn write_arguments(f: &mut fmt::Formatter<'_>, arguments: &[Expression]) -> fmt::Result {
    write!(f, "(")?;
    for (i, argument) in arguments.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{}", argument)?;
    }
    write!(f, ")")
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Variable { index, .. } => write!(f, "%{}%", index),
            Expression::Literal(value) => write!(f, "{}", literal::encode(value)),
            Expression::Null => write!(f, "null"),
            Expression::Member {
                owner,
                name,
                arguments,
            } => {
                write!(f, "{}.{}", owner, name)?;
                match arguments {
                    Some(arguments) => write_arguments(f, arguments),
                    None => Ok(()),
                }
            }
            Expression::Function(function) => {
                write!(f, "{}", function.name)?;
                write_arguments(f, &function.arguments)
            }
            Expression::Cast(cast) => {
                write!(f, "{}", cast.name)?;
                write_arguments(f, &cast.arguments)
            }
            Expression::Index { target, index } => write!(f, "{}[{}]", target, index),
            Expression::Group {
                kind: GroupKind::Paren,
                inner,
            } => write!(f, "({})", inner),
            Expression::Group {
                kind: GroupKind::Brace,
                inner,
            } => write!(f, "{{{}}}", inner),
            Expression::Sequence(terms) => {
                for term in terms {
                    match term {
                        Term::Operand(operand) => write!(f, "{}", operand)?,
                        Term::Operator(op) => write!(f, "{}", op.as_str())?,
                    }
                }
                Ok(())
            }
        }
    }
}

fn is_sentinel(part: &Part) -> bool {
    part.is_special_token(SpecialToken::VisibleStart)
        || part.is_special_token(SpecialToken::VisibleEnd)
}

/// Recursive descent over parts, ignoring visible-window sentinels
struct TreeParser<'a> {
    parts: Vec<&'a Part>,
    pos: usize,
}

impl<'a> TreeParser<'a> {
    fn new(parts: &'a [Part]) -> Self {
        Self {
            parts: parts.iter().filter(|p| !is_sentinel(p)).collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&'a Part> {
        self.parts.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.parts.len()
    }

    fn at(&self, token: SpecialToken) -> bool {
        self.peek().is_some_and(|p| p.is_special_token(token))
    }

    fn eat(&mut self, token: SpecialToken) -> bool {
        let found = self.at(token);
        if found {
            self.pos += 1;
        }
        found
    }

    /// Consume `token`, or accept running out of input
    fn close(&mut self, token: SpecialToken) -> Option<()> {
        (self.eat(token) || self.at_end()).then_some(())
    }

    fn sequence(&mut self) -> Option<Expression> {
        let mut terms = Vec::new();
        while let Some(part) = self.peek() {
            match &part.kind {
                PartKind::Special(
                    SpecialToken::CloseParen
                    | SpecialToken::CloseBracket
                    | SpecialToken::CloseBrace
                    | SpecialToken::Comma,
                ) => break,
                PartKind::Operation(op) => {
                    self.pos += 1;
                    terms.push(Term::Operator(*op));
                }
                _ => terms.push(Term::Operand(self.postfix()?)),
            }
        }

        if let [Term::Operand(_)] = terms.as_slice() {
            if let Some(Term::Operand(only)) = terms.pop() {
                return Some(only);
            }
        }
        Some(Expression::Sequence(terms))
    }

    fn postfix(&mut self) -> Option<Expression> {
        let mut expression = self.primary()?;
        while let Some(part) = self.peek() {
            match &part.kind {
                PartKind::Member(member) => {
                    self.pos += 1;
                    let arguments = if self.eat(SpecialToken::OpenParen) {
                        Some(self.arguments()?)
                    } else {
                        None
                    };
                    expression = Expression::Member {
                        owner: Box::new(expression),
                        name: member.name.clone(),
                        arguments,
                    };
                }
                PartKind::Special(SpecialToken::OpenBracket) => {
                    self.pos += 1;
                    let index = self.sequence()?;
                    self.close(SpecialToken::CloseBracket)?;
                    expression = Expression::Index {
                        target: Box::new(expression),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }
        Some(expression)
    }

    /// Comma-separated arguments after an already consumed `(`
    fn arguments(&mut self) -> Option<Vec<Expression>> {
        let mut arguments = Vec::new();
        if self.eat(SpecialToken::CloseParen) {
            return Some(arguments);
        }
        loop {
            arguments.push(self.sequence()?);
            if self.eat(SpecialToken::Comma) {
                continue;
            }
            self.close(SpecialToken::CloseParen)?;
            return Some(arguments);
        }
    }

    fn group(&mut self, kind: GroupKind, closer: SpecialToken) -> Option<Expression> {
        let inner = self.sequence()?;
        self.close(closer)?;
        Some(Expression::Group {
            kind,
            inner: Box::new(inner),
        })
    }

    fn primary(&mut self) -> Option<Expression> {
        let part = self.peek()?;
        self.pos += 1;
        match &part.kind {
            PartKind::Variable { index, value } => Some(Expression::Variable {
                index: *index,
                value: value.clone(),
            }),
            PartKind::Literal { value } => Some(Expression::Literal(value.clone())),
            PartKind::Special(SpecialToken::Null) => Some(Expression::Null),
            PartKind::Special(SpecialToken::OpenParen) => {
                self.group(GroupKind::Paren, SpecialToken::CloseParen)
            }
            PartKind::Special(SpecialToken::OpenBrace) => {
                self.group(GroupKind::Brace, SpecialToken::CloseBrace)
            }
            PartKind::Function(function) => {
                let arguments = if self.eat(SpecialToken::OpenParen) {
                    self.arguments()?
                } else {
                    Vec::new()
                };
                if function.returns_variable {
                    let type_name = function.parameter.clone().or_else(|| {
                        match arguments.first() {
                            Some(Expression::Literal(value)) => Some(value.clone()),
                            _ => None,
                        }
                    });
                    Some(Expression::Cast(CastExpression {
                        name: function.name.clone(),
                        type_name,
                        arguments,
                    }))
                } else {
                    Some(Expression::Function(FunctionExpression {
                        name: function.name.clone(),
                        arguments,
                    }))
                }
            }
            _ => None,
        }
    }
}
