//! Scope plans.
//!
//! A plan is the declarative description of one scope: the ordered cog
//! declarations plus at most one outputs block. Plans are inert data; the
//! [`ExecutionManager`](crate::manager::ExecutionManager) turns them into
//! live cogs at prepare time.

use crate::kind::{CogFuture, CogInput};
use crate::outputs::OutputAccessor;
use cogflow_core::error::Result;
use cogflow_core::value::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future type returned by a cog's input closure.
pub type InputFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<Value>>> + Send + 'a>>;

/// Per-cog input closure.
///
/// Runs inside the cog's unit of work, after the kind creates a fresh
/// input and before validation. It receives the output accessor (so it can
/// block on upstream cogs), the mutable input, and a deep copy of the scope
/// value with the scope index. Returning `Some(value)` coerces the input
/// from that value afterwards.
pub type InputFn = Arc<
    dyn for<'a> Fn(&'a OutputAccessor, &'a mut CogInput, Value, usize) -> InputFuture<'a>
        + Send
        + Sync,
>;

/// Outputs-block closure: computes the scope's final output from the
/// accessor, the scope value and the scope index.
pub type OutputsFn =
    Arc<dyn for<'a> Fn(&'a OutputAccessor, Value, usize) -> CogFuture<'a> + Send + Sync>;

/// Wrap a closure as an [`InputFn`]. Exists to pin down the higher-ranked
/// signature so closure inference works at call sites.
pub fn input_fn<F>(f: F) -> InputFn
where
    F: for<'a> Fn(&'a OutputAccessor, &'a mut CogInput, Value, usize) -> InputFuture<'a>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// An [`InputFn`] that leaves the kind's fresh input untouched.
pub fn no_input() -> InputFn {
    Arc::new(|_, _, _, _| Box::pin(async { Ok(None) }))
}

/// An [`InputFn`] that always supplies a fixed value.
pub fn value_input(value: Value) -> InputFn {
    Arc::new(move |_, _, _, _| {
        let value = value.clone();
        Box::pin(async move { Ok(Some(value)) })
    })
}

/// Wrap a closure as an [`OutputsFn`].
pub fn outputs_fn<F>(f: F) -> OutputsFn
where
    F: for<'a> Fn(&'a OutputAccessor, Value, usize) -> CogFuture<'a> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// How an outputs block treats access errors for steps that never succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputsMode {
    /// Skipped, never-run, or stopped steps (and Skip/Next signals raised
    /// inside the block) collapse the final output to empty.
    Lenient,
    /// Every error propagates.
    Strict,
}

/// One declared cog: which kind, an optional explicit name, and the input
/// closure.
pub struct CogDeclaration {
    /// Kind id, resolved against the kind registry at prepare time.
    pub kind: String,
    /// Explicit name; unnamed cogs get `{kind}_{position}`.
    pub name: Option<String>,
    /// The input closure.
    pub input: InputFn,
}

/// Declarative description of one scope.
#[derive(Default)]
pub struct ScopePlan {
    cogs: Vec<CogDeclaration>,
    outputs: Vec<(OutputsMode, OutputsFn)>,
}

impl ScopePlan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an unnamed cog.
    pub fn cog(mut self, kind: impl Into<String>, input: InputFn) -> Self {
        self.cogs.push(CogDeclaration {
            kind: kind.into(),
            name: None,
            input,
        });
        self
    }

    /// Declare a named cog.
    pub fn named_cog(
        mut self,
        kind: impl Into<String>,
        name: impl Into<String>,
        input: InputFn,
    ) -> Self {
        self.cogs.push(CogDeclaration {
            kind: kind.into(),
            name: Some(name.into()),
            input,
        });
        self
    }

    /// Declare a lenient outputs block.
    pub fn outputs(mut self, f: OutputsFn) -> Self {
        self.outputs.push((OutputsMode::Lenient, f));
        self
    }

    /// Declare a strict outputs block.
    pub fn outputs_strict(mut self, f: OutputsFn) -> Self {
        self.outputs.push((OutputsMode::Strict, f));
        self
    }

    /// Number of declared cogs.
    pub fn len(&self) -> usize {
        self.cogs.len()
    }

    /// Whether the plan declares no cogs.
    pub fn is_empty(&self) -> bool {
        self.cogs.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<CogDeclaration>, Vec<(OutputsMode, OutputsFn)>) {
        (self.cogs, self.outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_collects_declarations_in_order() {
        let plan = ScopePlan::new()
            .cog("shell", no_input())
            .named_cog("shell", "deploy", no_input())
            .outputs(outputs_fn(|_, _, _| Box::pin(async { Ok(Value::null()) })));

        assert_eq!(plan.len(), 2);
        let (cogs, outputs) = plan.into_parts();
        assert_eq!(cogs[0].kind, "shell");
        assert_eq!(cogs[0].name, None);
        assert_eq!(cogs[1].name.as_deref(), Some("deploy"));
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].0, OutputsMode::Lenient);
    }
}
