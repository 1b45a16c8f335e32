//! Type structures used for member classification and autocompletion
//!
//! ## Architecture
//!
//! ```text
//! Formula edit → pending member lookups → StructureState::request
//!              ├─ cache hit       → classify immediately
//!              └─ cache miss      → Cmd::ResolveStructure (one per key)
//!                                   → worker thread → StructureResolver
//!                                   → Msg::Structure(Resolved) → classify waiters
//! ```

mod cache;
mod resolver;
mod state;

pub use cache::{CacheStats, StructureCache, DEFAULT_CACHE_CAPACITY};
pub use resolver::{CatalogResolver, StaticResolver, StructureResolver};
pub use state::{LookupTarget, RequestOutcome, StructureState, Waiter};

use serde::{Deserialize, Serialize};

use crate::model::{MemberClass, MemberPart, Value};

/// Opaque identifier selecting the versioned workspace a lookup runs against
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeContext(pub String);

impl Default for RuntimeContext {
    fn default() -> Self {
        RuntimeContext("default".to_string())
    }
}

impl From<&str> for RuntimeContext {
    fn from(value: &str) -> Self {
        RuntimeContext(value.to_string())
    }
}

/// Cache key: one backend call per distinct pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructureKey {
    pub fqn: String,
    pub context: RuntimeContext,
}

impl StructureKey {
    pub fn new(fqn: impl Into<String>, context: RuntimeContext) -> Self {
        Self {
            fqn: fqn.into(),
            context,
        }
    }
}

/// Reference to a type, as found on fields and method results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    #[serde(rename = "$fqn")]
    pub fqn: String,
    #[serde(default)]
    pub is_list: bool,
}

impl TypeRef {
    pub fn new(fqn: impl Into<String>) -> Self {
        Self {
            fqn: fqn.into(),
            is_list: false,
        }
    }

    fn to_value(&self, label: &str) -> Value {
        Value {
            label: label.to_string(),
            fqn: self.fqn.clone(),
            is_list: self.is_list,
            is_abstract: false,
            cast_to_fqn: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructureChild {
    Field {
        name: String,
        #[serde(rename = "type")]
        type_ref: TypeRef,
    },
    Method {
        name: String,
        #[serde(default)]
        returns: Vec<TypeRef>,
    },
}

impl StructureChild {
    pub fn name(&self) -> &str {
        match self {
            StructureChild::Field { name, .. } | StructureChild::Method { name, .. } => name,
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self, StructureChild::Method { .. })
    }
}

/// Named children of a type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Structure {
    #[serde(rename = "$fqn")]
    pub fqn: String,
    #[serde(default)]
    pub children: Vec<StructureChild>,
}

impl Structure {
    pub fn empty(fqn: impl Into<String>) -> Self {
        Self {
            fqn: fqn.into(),
            children: Vec::new(),
        }
    }

    pub fn child(&self, name: &str) -> Option<&StructureChild> {
        self.children.iter().find(|c| c.name() == name)
    }

    /// Settle a member against this structure.
    ///
    /// Fields make member variables, methods make member functions typed by
    /// their first result. Unknown names fall back to how the source spelled
    /// the member.
    pub fn classify(&self, member: &MemberPart) -> (MemberClass, Value) {
        match self.child(&member.name) {
            Some(StructureChild::Field { type_ref, .. }) => {
                (MemberClass::Variable, type_ref.to_value(&member.name))
            }
            Some(StructureChild::Method { returns, .. }) => {
                let value = returns
                    .first()
                    .map(|r| r.to_value(&member.name))
                    .unwrap_or_else(|| Value::placeholder(member.name.clone()));
                (MemberClass::Function, value)
            }
            None if member.call => (MemberClass::Function, Value::placeholder(member.name.clone())),
            None => (MemberClass::Variable, Value::placeholder(member.name.clone())),
        }
    }
}

/// Read access to already-known structures
pub trait StructureLookup {
    fn lookup(&self, fqn: &str) -> Option<&Structure>;
}

/// Lookup that knows nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStructures;

impl StructureLookup for NoStructures {
    fn lookup(&self, _fqn: &str) -> Option<&Structure> {
        None
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    #[error("unknown type {0}")]
    UnknownType(String),
    #[error("failed to read structure catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse structure catalog {path}: {message}")]
    Parse { path: String, message: String },
}
