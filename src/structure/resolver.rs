//! Structure sources
//!
//! Resolvers are blocking and run on worker threads spawned by the runtime,
//! never inside `update`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;

use super::{Structure, StructureError, StructureKey};

/// Backend that describes a type by name
pub trait StructureResolver: Send + Sync {
    fn resolve(&self, key: &StructureKey) -> Result<Structure, StructureError>;
}

/// In-memory resolver keyed by type name only. Counts calls so callers can
/// check that lookups are deduplicated.
#[derive(Debug, Default)]
pub struct StaticResolver {
    structures: HashMap<String, Structure>,
    calls: AtomicUsize,
}

impl StaticResolver {
    pub fn new(structures: impl IntoIterator<Item = Structure>) -> Self {
        Self {
            structures: structures.into_iter().map(|s| (s.fqn.clone(), s)).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StructureResolver for StaticResolver {
    fn resolve(&self, key: &StructureKey) -> Result<Structure, StructureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.structures
            .get(&key.fqn)
            .cloned()
            .ok_or_else(|| StructureError::UnknownType(key.fqn.clone()))
    }
}

/// On-disk catalog file
#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    structures: Vec<Structure>,
    /// Per-context overrides, consulted before the shared list
    #[serde(default)]
    contexts: HashMap<String, Vec<Structure>>,
}

/// Structures loaded from a YAML or JSON catalog file
#[derive(Debug, Default)]
pub struct CatalogResolver {
    shared: HashMap<String, Structure>,
    by_context: HashMap<String, HashMap<String, Structure>>,
}

impl CatalogResolver {
    /// Load a catalog. Files ending in `.json` are read as JSON, everything
    /// else as YAML.
    pub fn load(path: &Path) -> Result<Self, StructureError> {
        let location = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| StructureError::Io {
            path: location.clone(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let file: CatalogFile = if is_json {
            serde_json::from_str(&content).map_err(|e| StructureError::Parse {
                path: location.clone(),
                message: e.to_string(),
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|e| StructureError::Parse {
                path: location.clone(),
                message: e.to_string(),
            })?
        };

        let resolver = Self::from_file(file);
        tracing::info!(
            "Loaded {} structures ({} contexts) from {}",
            resolver.shared.len(),
            resolver.by_context.len(),
            location
        );
        Ok(resolver)
    }

    fn from_file(file: CatalogFile) -> Self {
        let index = |list: Vec<Structure>| -> HashMap<String, Structure> {
            list.into_iter().map(|s| (s.fqn.clone(), s)).collect()
        };
        Self {
            shared: index(file.structures),
            by_context: file
                .contexts
                .into_iter()
                .map(|(context, list)| (context, index(list)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.is_empty() && self.by_context.is_empty()
    }
}

impl StructureResolver for CatalogResolver {
    fn resolve(&self, key: &StructureKey) -> Result<Structure, StructureError> {
        self.by_context
            .get(&key.context.0)
            .and_then(|structures| structures.get(&key.fqn))
            .or_else(|| self.shared.get(&key.fqn))
            .cloned()
            .ok_or_else(|| StructureError::UnknownType(key.fqn.clone()))
    }
}
