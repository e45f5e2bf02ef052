//! Validated cog settings.

use crate::error::{EngineError, Result};
use crate::providers::ProviderRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

/// Settings controlling how the scheduler runs one cog.
///
/// Produced by [`ConfigResolver::resolve`](super::ConfigResolver::resolve)
/// from the merged configuration layers. Fields the engine does not know
/// about are kept in `params` for the cog kind to interpret.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CogSettings {
    /// Serialize the scope on this cog: the scheduler waits for it before
    /// starting the next declared cog. Off by default — cogs run
    /// concurrently unless marked synchronous.
    pub synchronous: bool,

    /// Re-raise a Fail signal out of the cog instead of absorbing it.
    pub abort_on_failure: bool,

    /// Execution timeout in seconds. Elapse fails the cog with a plain
    /// error. Zero is invalid.
    pub timeout: Option<u64>,

    /// Kind-specific settings the engine passes through untouched.
    #[serde(flatten)]
    pub params: serde_json::Map<String, JsonValue>,
}

impl Default for CogSettings {
    fn default() -> Self {
        Self {
            synchronous: false,
            abort_on_failure: false,
            timeout: None,
            params: serde_json::Map::new(),
        }
    }
}

impl CogSettings {
    /// Check invariants the type system cannot express.
    pub fn validate(&self, kind: &str) -> Result<()> {
        if self.timeout == Some(0) {
            return Err(EngineError::ConfigValidation {
                kind: kind.to_string(),
                cause: "timeout must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    /// Get the timeout as a Duration.
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    /// Get a kind-specific parameter.
    pub fn param(&self, key: &str) -> Option<&JsonValue> {
        self.params.get(key)
    }
}

/// One cog's fully merged, validated configuration.
///
/// Deep-copied before being attached to a running cog, so later mutation of
/// the shared layers never affects an in-flight execution.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    /// The merged, validated settings.
    pub settings: CogSettings,
    /// Provider lookup table, injected only for provider-backed kinds.
    pub providers: Option<Arc<ProviderRegistry>>,
}

impl ResolvedConfig {
    /// Wrap plain settings with no provider table.
    pub fn new(settings: CogSettings) -> Self {
        Self {
            settings,
            providers: None,
        }
    }
}
