//! XFL formula editor model
//!
//! Parses XFL expressions into an ordered, editable list of typed parts,
//! keeps the expression text in sync with every edit, resolves member types
//! against externally described structures, and edits `concat(...)` text
//! templates as rows of text and formula items. State changes follow the
//! Elm Architecture: messages go through `update`, side effects come back as
//! commands for the runtime to perform.

pub mod autocomplete;
pub mod cli;
pub mod commands;
pub mod config;
pub mod config_paths;
pub mod expression;
pub mod messages;
pub mod model;
pub mod parser;
pub mod runtime;
pub mod structure;
pub mod template;
pub mod tracing;
pub mod update;

// Re-export commonly used types
pub use commands::Cmd;
pub use config::EditorConfig;
pub use expression::Expression;
pub use messages::Msg;
pub use model::{EditorModel, Formula, FormulaId, Part, PartId, Value};
pub use runtime::Runtime;
pub use structure::{Structure, StructureResolver};
pub use template::Template;
