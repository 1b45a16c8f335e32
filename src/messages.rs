//! Message types for the Elm-style architecture
//!
//! All state changes flow through these messages.

use crate::model::{FormulaId, NewPart, PartId, Value};
use crate::structure::{RuntimeContext, Structure, StructureKey};

/// Formula editing messages
#[derive(Debug, Clone)]
pub enum FormulaMsg {
    /// Replace all parts by parsing a new expression
    Parse(String),
    /// Replace the input/output declarations
    SetVariables {
        input: Vec<Value>,
        output: Vec<Value>,
    },
    /// Insert a part before `before`, at the end of the visible window, or at the end
    AddPart {
        part: NewPart,
        before: Option<PartId>,
        respect_visible_area: bool,
    },
    /// Insert a tokenized fragment (drag-and-drop payload)
    InsertSnippet {
        snippet: String,
        before: Option<PartId>,
        respect_visible_area: bool,
    },
    /// Insert the part a typed character stands for
    InsertKeystroke {
        ch: char,
        before: Option<PartId>,
        respect_visible_area: bool,
    },
    RemovePart(PartId),
    SetPartText { part: PartId, text: String },
    SetLiteralValue { part: PartId, value: String },
    /// Start structure lookups for undetermined members
    ResolveMembers,
    Close,
}

/// Template row editing messages
#[derive(Debug, Clone)]
pub enum TemplateMsg {
    SetText {
        row: usize,
        item: usize,
        text: String,
    },
    SetFormula {
        row: usize,
        item: usize,
        expression: String,
    },
    InsertText {
        row: usize,
        index: usize,
        text: String,
    },
    InsertFormula {
        row: usize,
        index: usize,
        expression: String,
    },
    RemoveItem { row: usize, index: usize },
    InsertRow(usize),
    RemoveRow(usize),
    /// Start structure lookups for undetermined members of embedded formulas
    ResolveMembers,
    Close,
}

/// Structure lookup messages
#[derive(Debug, Clone)]
pub enum StructureMsg {
    /// A resolve finished on a worker thread
    Resolved {
        key: StructureKey,
        result: Result<Structure, String>,
    },
    /// Switch the workspace lookups run against
    SetContext(RuntimeContext),
}

/// Top-level message type
#[derive(Debug, Clone)]
pub enum Msg {
    Formula(FormulaId, FormulaMsg),
    Template(FormulaId, TemplateMsg),
    Structure(StructureMsg),
}

// Convenience constructors for common messages
impl Msg {
    pub fn keystroke(formula: FormulaId, ch: char) -> Self {
        Msg::Formula(
            formula,
            FormulaMsg::InsertKeystroke {
                ch,
                before: None,
                respect_visible_area: true,
            },
        )
    }

    pub fn parse(formula: FormulaId, expression: impl Into<String>) -> Self {
        Msg::Formula(formula, FormulaMsg::Parse(expression.into()))
    }

    pub fn resolve_members(formula: FormulaId) -> Self {
        Msg::Formula(formula, FormulaMsg::ResolveMembers)
    }

    pub fn resolve_template_members(template: FormulaId) -> Self {
        Msg::Template(template, TemplateMsg::ResolveMembers)
    }
}
