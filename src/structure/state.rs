//! In-flight structure requests and the parts waiting on them

use std::collections::HashMap;

use super::{RuntimeContext, Structure, StructureCache, StructureKey, StructureLookup};
use crate::model::{FormulaId, PartId};

/// Where the formula holding a member lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTarget {
    Formula(FormulaId),
    /// An embedded formula of a template, valid only while the backing
    /// formula is still at `revision`
    TemplateItem {
        template: FormulaId,
        row: usize,
        item: usize,
        revision: u64,
    },
}

/// A member part that wants its owner's structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waiter {
    pub target: LookupTarget,
    pub part: PartId,
    pub generation: u64,
}

/// What `StructureState::request` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Already known; the caller can classify right away
    Cached,
    /// First request for this key; the caller must start a resolve
    Started(StructureKey),
    /// A resolve for this key is already running
    Joined,
}

#[derive(Debug)]
pub struct StructureState {
    cache: StructureCache,
    context: RuntimeContext,
    /// Keys with a resolve in progress, each with its waiters
    in_flight: HashMap<StructureKey, Vec<Waiter>>,
}

impl Default for StructureState {
    fn default() -> Self {
        Self::new(StructureCache::default(), RuntimeContext::default())
    }
}

impl StructureState {
    pub fn new(cache: StructureCache, context: RuntimeContext) -> Self {
        Self {
            cache,
            context,
            in_flight: HashMap::new(),
        }
    }

    pub fn cache(&self) -> &StructureCache {
        &self.cache
    }

    pub fn context(&self) -> &RuntimeContext {
        &self.context
    }

    /// Switch the workspace. Cached entries stay, keyed by their own context.
    pub fn set_context(&mut self, context: RuntimeContext) {
        self.context = context;
    }

    pub fn key(&self, fqn: &str) -> StructureKey {
        StructureKey::new(fqn, self.context.clone())
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Ask for the structure of `fqn`, registering `waiter` when it has to be
    /// fetched. An empty name resolves to an empty structure without a fetch.
    pub fn request(&mut self, fqn: &str, waiter: Option<Waiter>) -> RequestOutcome {
        let key = self.key(fqn);

        if fqn.is_empty() && !self.cache.contains(&key) {
            tracing::warn!("Structure requested for a value without type name");
            self.cache.insert(key.clone(), Structure::empty(""));
        }

        if self.cache.get(&key).is_some() {
            return RequestOutcome::Cached;
        }

        match self.in_flight.get_mut(&key) {
            Some(waiters) => {
                if let Some(waiter) = waiter.filter(|w| !waiters.contains(w)) {
                    waiters.push(waiter);
                }
                RequestOutcome::Joined
            }
            None => {
                tracing::debug!(fqn, context = %self.context.0, "Starting structure resolve");
                self.in_flight.insert(key.clone(), waiter.into_iter().collect());
                RequestOutcome::Started(key)
            }
        }
    }

    /// Record a finished resolve and hand back its waiters.
    ///
    /// A failed resolve is cached as an empty structure so members settle by
    /// their spelling instead of being retried on every edit.
    pub fn complete(&mut self, key: StructureKey, result: Result<Structure, String>) -> Vec<Waiter> {
        let structure = match result {
            Ok(structure) => structure,
            Err(error) => {
                tracing::warn!(fqn = %key.fqn, "Structure resolve failed: {}", error);
                Structure::empty(key.fqn.clone())
            }
        };
        let waiters = self.in_flight.remove(&key).unwrap_or_default();
        self.cache.insert(key, structure);
        waiters
    }

    pub fn structure(&self, fqn: &str) -> Option<&Structure> {
        self.cache.peek(&self.key(fqn))
    }
}

impl StructureLookup for StructureState {
    fn lookup(&self, fqn: &str) -> Option<&Structure> {
        self.structure(fqn)
    }
}
