//! The cog kind trait.
//!
//! A kind is the reusable behavior behind a step: "run a shell command",
//! "call a model", "write a file". The scheduler owns lifecycle, config
//! resolution and output storage; a kind only turns a prepared input into an
//! output value (or raises a signal).

use crate::outputs::OutputAccessor;
use cogflow_core::config::ResolvedConfig;
use cogflow_core::error::Result;
use cogflow_core::value::Value;
use std::future::Future;
use std::pin::Pin;

/// Future type returned by cog execution.
pub type CogFuture<'a> = Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>>;

/// The working input a kind executes against.
///
/// Created fresh by the kind for every execution, then filled in by the
/// cog's input closure before validation.
#[derive(Debug, Clone, Default)]
pub struct CogInput {
    /// The input payload.
    pub value: Value,
}

impl CogInput {
    /// Create an input holding `value`.
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

/// A reusable step behavior.
///
/// Implementations must be stateless across executions: the same kind
/// instance is shared by every cog of that kind, possibly running
/// concurrently.
pub trait CogKind: Send + Sync {
    /// Stable identifier, also used to auto-name cogs.
    fn id(&self) -> &str;

    /// Create a fresh, empty input for one execution.
    fn new_input(&self) -> CogInput {
        CogInput::default()
    }

    /// Check that an input is acceptable before execution.
    fn validate_input(&self, _input: &CogInput) -> Result<()> {
        Ok(())
    }

    /// Fold a raw value returned by the cog's input closure into the input.
    fn coerce_input(&self, input: &mut CogInput, value: Value) -> Result<()> {
        input.value = value;
        Ok(())
    }

    /// Whether this kind draws on external providers. Only provider-backed
    /// kinds receive the provider table in their resolved config.
    fn needs_providers(&self) -> bool {
        false
    }

    /// Execute one step.
    ///
    /// Returning `Ok` succeeds the cog with that output; returning a
    /// [`FlowSignal`](cogflow_core::signal::FlowSignal) wrapped in
    /// [`EngineError::Signal`](cogflow_core::error::EngineError::Signal)
    /// ends the cog early; any other error fails it.
    fn execute<'a>(
        &'a self,
        input: CogInput,
        config: &'a ResolvedConfig,
        outputs: &'a OutputAccessor,
    ) -> CogFuture<'a>;
}
