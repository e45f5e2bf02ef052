//! Cog and kind registries.

use crate::cog::Cog;
use crate::kind::CogKind;
use cogflow_core::error::{EngineError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// The cogs of one scope, in declaration order, indexed by name.
///
/// Built once at prepare time and frozen behind an `Arc` for the accessor.
#[derive(Debug, Default)]
pub struct CogRegistry {
    by_name: HashMap<String, Arc<Cog>>,
    order: Vec<Arc<Cog>>,
}

impl CogRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cog. Names must be unique within the scope.
    pub fn insert(&mut self, cog: Arc<Cog>) -> Result<()> {
        if self.by_name.contains_key(cog.name()) {
            return Err(EngineError::DuplicateCog {
                name: cog.name().to_string(),
            });
        }
        self.by_name.insert(cog.name().to_string(), Arc::clone(&cog));
        self.order.push(cog);
        Ok(())
    }

    /// Look a cog up by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Cog>> {
        self.by_name.get(name)
    }

    /// The last declared cog; its output is the scope's default final
    /// output.
    pub fn last(&self) -> Option<&Arc<Cog>> {
        self.order.last()
    }

    /// Iterate cogs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Cog>> {
        self.order.iter()
    }

    /// Number of cogs.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the scope declares no cogs.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Lookup table of available cog kinds, keyed by kind id.
#[derive(Default)]
pub struct KindRegistry {
    kinds: HashMap<String, Arc<dyn CogKind>>,
}

impl KindRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind under its own id. A later registration with the same
    /// id replaces the earlier one.
    pub fn register(&mut self, kind: Arc<dyn CogKind>) {
        self.kinds.insert(kind.id().to_string(), kind);
    }

    /// Look a kind up by id.
    pub fn get(&self, id: &str) -> Result<Arc<dyn CogKind>> {
        self.kinds
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownKind {
                kind: id.to_string(),
            })
    }

    /// Ids of every registered kind, in no particular order.
    pub fn ids(&self) -> Vec<&str> {
        self.kinds.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KindRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}
