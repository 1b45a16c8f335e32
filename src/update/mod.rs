//! Update functions for the Elm-style architecture
//!
//! All state transformations flow through these functions.

mod formula;
mod structure;
mod template;

use crate::commands::Cmd;
use crate::messages::Msg;
use crate::model::EditorModel;

#[cfg(debug_assertions)]
use tracing::{debug, span, Level};

pub use formula::{schedule_member_lookups, update_formula};
pub use structure::update_structure;
pub use template::{schedule_template_lookups, update_template};

/// Main update function - dispatches to sub-handlers
///
/// In debug builds, this wraps with tracing instrumentation.
/// In release builds, it's a direct dispatch with zero overhead.
#[inline]
pub fn update(model: &mut EditorModel, msg: Msg) -> Option<Cmd> {
    #[cfg(debug_assertions)]
    {
        update_traced(model, msg)
    }
    #[cfg(not(debug_assertions))]
    {
        update_inner(model, msg)
    }
}

/// Inner update logic (no tracing)
fn update_inner(model: &mut EditorModel, msg: Msg) -> Option<Cmd> {
    match msg {
        Msg::Formula(id, m) => formula::update_formula(model, id, m),
        Msg::Template(id, m) => template::update_template(model, id, m),
        Msg::Structure(m) => structure::update_structure(model, m),
    }
}

/// Traced update wrapper (debug builds only)
#[cfg(debug_assertions)]
fn update_traced(model: &mut EditorModel, msg: Msg) -> Option<Cmd> {
    let msg_name = msg_type_name(&msg);
    let _span = span!(Level::DEBUG, "update", msg = %msg_name).entered();
    debug!(target: "message", msg = %msg_name, "processing");

    let result = update_inner(model, msg);

    if let Some(ref cmd) = result {
        debug!(target: "message", ?cmd, "produced command");
    }
    result
}

/// Get a display name for a message type
///
/// Example outputs:
/// - `Formula(formula-1)::InsertKeystroke { ch: '>', .. }`
/// - `Structure::Resolved { .. }`
#[cfg(debug_assertions)]
fn msg_type_name(msg: &Msg) -> String {
    match msg {
        Msg::Formula(id, m) => format!("Formula({})::{:?}", id, m),
        Msg::Template(id, m) => format!("Template({})::{:?}", id, m),
        Msg::Structure(m) => format!("Structure::{:?}", m),
    }
}
