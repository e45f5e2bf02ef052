//! Blocking access to cog outputs.
//!
//! The accessor is the only way cog logic reads sibling outputs or the
//! ambient workflow context. `get` blocks until the requested cog reaches a
//! terminal state, so data dependencies between concurrently running cogs
//! resolve themselves without explicit ordering.

use crate::cog::CogStatus;
use crate::registry::CogRegistry;
use cogflow_core::context::WorkflowContext;
use cogflow_core::error::{EngineError, Result};
use cogflow_core::value::Value;
use std::path::Path;
use std::sync::Arc;

/// Handle onto one scope's cogs and the workflow context.
///
/// Cheap to clone; every cog's unit of work gets its own copy.
#[derive(Debug, Clone)]
pub struct OutputAccessor {
    registry: Arc<CogRegistry>,
    context: Arc<WorkflowContext>,
}

impl OutputAccessor {
    pub(crate) fn new(registry: Arc<CogRegistry>, context: Arc<WorkflowContext>) -> Self {
        Self { registry, context }
    }

    /// Get a cog's output, waiting for it to finish first.
    ///
    /// A cog that was never started errors immediately instead of blocking
    /// forever. A cog that finished without an output maps to a typed
    /// error describing how it ended.
    pub async fn get(&self, name: &str) -> Result<Value> {
        let cog = self
            .registry
            .get(name)
            .ok_or_else(|| EngineError::UnknownCog {
                name: name.to_string(),
            })?;

        if cog.status() == CogStatus::NotStarted {
            return Err(EngineError::CogNotYetRun {
                name: name.to_string(),
            });
        }

        cog.wait().await;
        match cog.status() {
            CogStatus::Succeeded => Ok(cog.output().unwrap_or_else(Value::null)),
            CogStatus::Skipped => Err(EngineError::CogSkipped {
                name: name.to_string(),
            }),
            CogStatus::Failed => Err(EngineError::CogFailed {
                name: name.to_string(),
            }),
            // Anything non-terminal after wait() means the status channel
            // closed mid-flight; treat it as stopped.
            CogStatus::Stopped | CogStatus::NotStarted | CogStatus::Running => {
                Err(EngineError::CogStopped {
                    name: name.to_string(),
                })
            }
        }
    }

    /// Like [`get`](Self::get), but a cog that exists and produced no
    /// output yields an empty value instead of an error. Asking for a cog
    /// that does not exist is still an error.
    pub async fn get_or_nil(&self, name: &str) -> Result<Value> {
        match self.get(name).await {
            Ok(value) => Ok(value),
            Err(err @ EngineError::UnknownCog { .. }) => Err(err),
            Err(_) => Ok(Value::null()),
        }
    }

    /// Whether `name` names a cog that succeeded with a non-empty output.
    ///
    /// The boolean form of [`get_or_nil`](Self::get_or_nil): waits the same
    /// way, and an unknown cog is simply `false`.
    pub async fn exists(&self, name: &str) -> bool {
        matches!(self.get_or_nil(name).await, Ok(value) if !value.is_null())
    }

    /// The first invocation target, if any.
    pub fn target(&self) -> Option<&str> {
        self.context.target()
    }

    /// All invocation targets.
    pub fn targets(&self) -> &[String] {
        self.context.targets()
    }

    /// Positional invocation argument by index.
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.context.arg(index)
    }

    /// Keyword invocation argument by name.
    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.context.kwarg(name)
    }

    /// The workflow scratch directory.
    pub fn scratch_dir(&self) -> &Path {
        self.context.scratch_dir()
    }

    /// Render a template against a scope value via the context's template
    /// engine.
    pub fn render(&self, template: &str, scope: &Value) -> Result<String> {
        self.context.render(template, scope)
    }
}
