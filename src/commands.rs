//! Command types for the Elm-style architecture
//!
//! Commands represent side effects that should be performed after an update.

use crate::model::FormulaId;
use crate::structure::StructureKey;

/// Commands returned by update functions
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cmd {
    /// No command - do nothing
    #[default]
    None,
    /// Resolve a structure on a worker thread.
    /// Sends `Msg::Structure(Resolved)` when done.
    ResolveStructure { key: StructureKey },
    /// Hand a changed expression to the host for persisting
    PublishExpression { target: FormulaId, expression: String },
    /// Execute multiple commands
    Batch(Vec<Cmd>),
}

impl Cmd {
    /// Create a batch of commands
    pub fn batch(cmds: Vec<Cmd>) -> Self {
        Cmd::Batch(cmds)
    }

    /// Collapse a list of commands; `None` when there is nothing to do
    pub fn collect(mut cmds: Vec<Cmd>) -> Option<Cmd> {
        cmds.retain(|cmd| !matches!(cmd, Cmd::None));
        match cmds.len() {
            0 => None,
            1 => cmds.pop(),
            _ => Some(Cmd::Batch(cmds)),
        }
    }

    /// Check if this command starts background work
    pub fn spawns_work(&self) -> bool {
        match self {
            Cmd::None => false,
            Cmd::ResolveStructure { .. } => true,
            Cmd::PublishExpression { .. } => false,
            Cmd::Batch(cmds) => cmds.iter().any(|c| c.spawns_work()),
        }
    }

    /// Structure keys this command resolves
    pub fn structure_keys(&self) -> Vec<&StructureKey> {
        match self {
            Cmd::ResolveStructure { key } => vec![key],
            Cmd::Batch(cmds) => cmds.iter().flat_map(|c| c.structure_keys()).collect(),
            _ => Vec::new(),
        }
    }

    /// Expressions this command publishes
    pub fn published(&self) -> Vec<(FormulaId, &str)> {
        match self {
            Cmd::PublishExpression { target, expression } => vec![(*target, expression.as_str())],
            Cmd::Batch(cmds) => cmds.iter().flat_map(|c| c.published()).collect(),
            _ => Vec::new(),
        }
    }
}
