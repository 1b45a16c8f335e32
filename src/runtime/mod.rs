//! Runtime - drives the update loop and performs commands
//!
//! Structure resolves run on worker threads and report back over a channel,
//! so a slow backend never blocks editing. Hosts call
//! [`Runtime::process_async_messages`] whenever they get the chance, or
//! [`Runtime::run_until_idle`] when they want lookups settled before reading
//! the model.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::autocomplete::{self, CompletionRequest, Suggestions};
use crate::commands::Cmd;
use crate::messages::{Msg, StructureMsg};
use crate::model::{EditorModel, FormulaId, Value};
use crate::structure::{RuntimeContext, StructureResolver};
use crate::update::update;

pub struct Runtime {
    model: EditorModel,
    resolver: Arc<dyn StructureResolver>,
    msg_tx: Sender<Msg>,
    msg_rx: Receiver<Msg>,
    published: Vec<(FormulaId, String)>,
    /// Resolves spawned but not yet handled
    outstanding: usize,
}

impl Runtime {
    pub fn new(model: EditorModel, resolver: Arc<dyn StructureResolver>) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel();
        Self {
            model,
            resolver,
            msg_tx,
            msg_rx,
            published: Vec::new(),
            outstanding: 0,
        }
    }

    pub fn model(&self) -> &EditorModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut EditorModel {
        &mut self.model
    }

    /// Resolves still running on worker threads
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Open a formula and start resolving its members
    pub fn open_formula(&mut self, expression: &str, input: Vec<Value>, output: Vec<Value>) -> FormulaId {
        let id = self.model.open_formula(expression, input, output);
        self.dispatch(Msg::resolve_members(id));
        id
    }

    /// Open a template and start resolving the members of its formulas
    pub fn open_template(&mut self, expression: &str, input: Vec<Value>, output: Vec<Value>) -> FormulaId {
        let id = self.model.open_template(expression, input, output);
        self.dispatch(Msg::resolve_template_members(id));
        id
    }

    pub fn set_context(&mut self, context: impl Into<RuntimeContext>) {
        self.dispatch(Msg::Structure(StructureMsg::SetContext(context.into())));
    }

    /// Run one message through `update` and perform what it asks for
    pub fn dispatch(&mut self, msg: Msg) {
        if let Some(cmd) = update(&mut self.model, msg) {
            self.process_cmd(cmd);
        }
    }

    /// Completions at a point of a formula. A missing owner structure is
    /// requested in the background; ask again once it arrived.
    pub fn suggest(&mut self, request: &CompletionRequest) -> Suggestions {
        match autocomplete::suggest(&mut self.model, request) {
            Suggestions::Pending(Some(cmd)) => {
                self.process_cmd(cmd);
                Suggestions::Pending(None)
            }
            other => other,
        }
    }

    /// Expressions published since the last call, oldest first
    pub fn take_published(&mut self) -> Vec<(FormulaId, String)> {
        std::mem::take(&mut self.published)
    }

    fn process_cmd(&mut self, cmd: Cmd) {
        match cmd {
            Cmd::None => {}
            Cmd::ResolveStructure { key } => {
                self.outstanding += 1;
                let tx = self.msg_tx.clone();
                let resolver = Arc::clone(&self.resolver);
                std::thread::spawn(move || {
                    let result = resolver.resolve(&key).map_err(|e| e.to_string());
                    let _ = tx.send(Msg::Structure(StructureMsg::Resolved { key, result }));
                });
            }
            Cmd::PublishExpression { target, expression } => {
                tracing::debug!(%target, %expression, "Publishing expression");
                self.published.push((target, expression));
            }
            Cmd::Batch(cmds) => {
                for cmd in cmds {
                    self.process_cmd(cmd);
                }
            }
        }
    }

    fn handle_async(&mut self, msg: Msg) {
        if matches!(msg, Msg::Structure(StructureMsg::Resolved { .. })) {
            self.outstanding = self.outstanding.saturating_sub(1);
        }
        self.dispatch(msg);
    }

    /// Handle every message that has already arrived. Returns how many.
    pub fn process_async_messages(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.handle_async(msg);
            handled += 1;
        }
        handled
    }

    /// Block until no resolve is outstanding. Returns `false` if `timeout`
    /// passed first.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.process_async_messages();

        while self.outstanding > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.msg_rx.recv_timeout(remaining) {
                Ok(msg) => self.handle_async(msg),
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(
                        outstanding = self.outstanding,
                        "Structure resolves still running after {:?}",
                        timeout
                    );
                    return false;
                }
                // Unreachable while we hold a sender
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
        true
    }
}
