//! External service providers.
//!
//! Providers are long-lived clients (model backends, storage handles) shared
//! by every cog in a workflow. The registry is assembled once before
//! execution and handed out read-only; only provider-backed cog kinds see it,
//! injected through their resolved config.

use std::collections::HashMap;
use std::sync::Arc;

/// A shared external service a cog kind can draw on.
///
/// Implementations carry their own connection state and must be safe to use
/// from concurrently running cogs.
pub trait Provider: Send + Sync {
    /// Stable identifier used to look the provider up.
    fn id(&self) -> &str;
}

/// Immutable lookup table of providers, keyed by id.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own id. A later registration with the
    /// same id replaces the earlier one.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers.insert(provider.id().to_string(), provider);
    }

    /// Look up a provider by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(id).cloned()
    }

    /// Ids of every registered provider, in no particular order.
    pub fn ids(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedProvider(&'static str);

    impl Provider for NamedProvider {
        fn id(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(NamedProvider("models")));
        registry.register(Arc::new(NamedProvider("storage")));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("models").unwrap().id(), "models");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn reregistration_replaces() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(NamedProvider("models")));
        registry.register(Arc::new(NamedProvider("models")));
        assert_eq!(registry.len(), 1);
    }
}
