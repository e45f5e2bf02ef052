//! The four-layer configuration resolver.

use crate::config::settings::{CogSettings, ResolvedConfig};
use crate::error::{EngineError, Result};
use crate::providers::ProviderRegistry;
use crate::value::Value;
use regex::Regex;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;

/// Where a registered config layer applies within one cog kind.
#[derive(Debug, Clone)]
pub enum ConfigScope {
    /// Every cog of the kind.
    General,
    /// Cogs whose name matches the pattern. Layers for the same kind are
    /// applied in registration order.
    Matching(String),
    /// Exactly one named cog. Wins over every other layer.
    Named(String),
}

impl ConfigScope {
    /// Parse the textual selector form used by workflow loaders.
    ///
    /// Absent (or null) selects the general layer, `/pattern/` a
    /// pattern-scoped layer, and any other string an exact cog name. Every
    /// other selector shape is a caller error, raised here rather than
    /// deferred to resolution time.
    pub fn parse(selector: Option<&JsonValue>) -> Result<Self> {
        match selector {
            None | Some(JsonValue::Null) => Ok(Self::General),
            Some(JsonValue::String(s)) => {
                match s.strip_prefix('/').and_then(|s| s.strip_suffix('/')) {
                    Some(pattern) if !pattern.is_empty() => Ok(Self::Matching(pattern.to_string())),
                    _ => Ok(Self::Named(s.clone())),
                }
            }
            Some(other) => Err(EngineError::InvalidSelector {
                selector: other.to_string(),
            }),
        }
    }
}

/// A pattern-scoped layer, compiled at registration.
#[derive(Debug)]
struct PatternLayer {
    pattern: Regex,
    values: JsonMap<String, JsonValue>,
}

/// Workflow-wide configuration resolution.
///
/// Populated once before any scope runs, read-only afterwards. `resolve`
/// merges the layers for one cog — later layers override earlier on
/// conflicting fields — and validates the result:
///
/// 1. the global layer (every kind),
/// 2. the kind's general layer,
/// 3. every pattern layer matching the cog's name, in registration order,
/// 4. the exact-name layer for (kind, name).
#[derive(Debug, Default)]
pub struct ConfigResolver {
    global: JsonMap<String, JsonValue>,
    general: HashMap<String, JsonMap<String, JsonValue>>,
    matching: HashMap<String, Vec<PatternLayer>>,
    named: HashMap<String, HashMap<String, JsonMap<String, JsonValue>>>,
    providers: Option<Arc<ProviderRegistry>>,
}

impl ConfigResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the provider lookup table injected into provider-backed
    /// configs at resolution time.
    pub fn with_providers(mut self, providers: Arc<ProviderRegistry>) -> Self {
        self.providers = Some(providers);
        self
    }

    /// Set the global layer, applied to every cog of every kind.
    pub fn set_global(&mut self, values: Value) -> Result<()> {
        self.global = into_object("global", values)?;
        Ok(())
    }

    /// Register a config layer for one cog kind.
    ///
    /// Pattern layers compile their regex here; an invalid pattern is an
    /// immediate error.
    pub fn register(&mut self, kind: &str, scope: ConfigScope, values: Value) -> Result<()> {
        let values = into_object(kind, values)?;
        match scope {
            ConfigScope::General => {
                deep_merge(self.general.entry(kind.to_string()).or_default(), &values);
            }
            ConfigScope::Matching(pattern) => {
                let compiled =
                    Regex::new(&pattern).map_err(|e| EngineError::InvalidPattern {
                        pattern: pattern.clone(),
                        cause: e.to_string(),
                    })?;
                self.matching
                    .entry(kind.to_string())
                    .or_default()
                    .push(PatternLayer {
                        pattern: compiled,
                        values,
                    });
            }
            ConfigScope::Named(name) => {
                deep_merge(
                    self.named
                        .entry(kind.to_string())
                        .or_default()
                        .entry(name)
                        .or_default(),
                    &values,
                );
            }
        }
        Ok(())
    }

    /// Compute one cog's effective configuration.
    ///
    /// `provider_backed` kinds additionally receive the provider lookup
    /// table; no other kind does.
    pub fn resolve(
        &self,
        kind: &str,
        name: Option<&str>,
        provider_backed: bool,
    ) -> Result<ResolvedConfig> {
        let mut merged = self.global.clone();

        if let Some(general) = self.general.get(kind) {
            deep_merge(&mut merged, general);
        }

        if let Some(name) = name {
            if let Some(layers) = self.matching.get(kind) {
                for layer in layers {
                    if layer.pattern.is_match(name) {
                        deep_merge(&mut merged, &layer.values);
                    }
                }
            }
            if let Some(values) = self.named.get(kind).and_then(|m| m.get(name)) {
                deep_merge(&mut merged, values);
            }
        }

        let settings: CogSettings = serde_json::from_value(JsonValue::Object(merged))
            .map_err(|e| EngineError::ConfigValidation {
                kind: kind.to_string(),
                cause: e.to_string(),
            })?;
        settings.validate(kind)?;

        tracing::debug!(
            kind = %kind,
            cog = name.unwrap_or("-"),
            synchronous = settings.synchronous,
            timeout = ?settings.timeout,
            "Resolved cog config"
        );

        Ok(ResolvedConfig {
            settings,
            providers: if provider_backed {
                self.providers.clone()
            } else {
                None
            },
        })
    }
}

fn into_object(kind: &str, values: Value) -> Result<JsonMap<String, JsonValue>> {
    match values.into_inner() {
        JsonValue::Object(map) => Ok(map),
        other => Err(EngineError::ConfigValidation {
            kind: kind.to_string(),
            cause: format!("config layer must be an object, got {}", other),
        }),
    }
}

/// Merge `overlay` into `base`: nested objects merge recursively, every
/// other value replaces wholesale.
fn deep_merge(base: &mut JsonMap<String, JsonValue>, overlay: &JsonMap<String, JsonValue>) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(JsonValue::Object(existing)), JsonValue::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}
