//! Scope execution.
//!
//! The manager walks one scope through its lifecycle: prepare a plan into
//! live cogs, run them under the barrier, then settle the final output
//! exactly once. Cogs start in declaration order and run concurrently
//! unless their config marks them synchronous; a scope-level signal or a
//! plain error stops the barrier and cancels everything still in flight.

use crate::barrier::{Barrier, BarrierEvent};
use crate::cog::Cog;
use crate::outputs::OutputAccessor;
use crate::plan::{OutputsFn, OutputsMode, ScopePlan};
use crate::registry::{CogRegistry, KindRegistry};
use cogflow_core::config::ConfigResolver;
use cogflow_core::context::WorkflowContext;
use cogflow_core::error::{EngineError, Result};
use cogflow_core::signal::SignalKind;
use cogflow_core::value::Value;
use std::sync::Arc;
use tokio::sync::watch;

/// Lifecycle states of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    /// No plan has been prepared.
    NotPrepared,
    /// A plan is being turned into live cogs.
    Preparing,
    /// Ready to run.
    Prepared,
    /// Cogs are executing.
    Running,
    /// The scope ran and its final output is settled.
    Completed,
}

/// Cancels a running scope from outside.
///
/// Cheap to clone and safe to trigger from any task; stopping is
/// idempotent. Cogs still in flight end up `Stopped`.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request cancellation.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    /// Whether cancellation has been requested.
    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    pub(crate) async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

/// Runs one scope to completion.
pub struct ExecutionManager {
    state: ScopeState,
    kinds: Arc<KindRegistry>,
    resolver: Arc<ConfigResolver>,
    context: Arc<WorkflowContext>,
    scope_value: Value,
    scope_index: usize,
    registry: Arc<CogRegistry>,
    accessor: Option<OutputAccessor>,
    barrier: Barrier,
    outputs_block: Option<(OutputsMode, OutputsFn)>,
    final_output: Option<Value>,
    final_computed: bool,
    stop: StopHandle,
}

impl ExecutionManager {
    /// Create a manager for one scope.
    pub fn new(
        kinds: Arc<KindRegistry>,
        resolver: Arc<ConfigResolver>,
        context: Arc<WorkflowContext>,
    ) -> Self {
        Self {
            state: ScopeState::NotPrepared,
            kinds,
            resolver,
            context,
            scope_value: Value::null(),
            scope_index: 0,
            registry: Arc::new(CogRegistry::new()),
            accessor: None,
            barrier: Barrier::new(),
            outputs_block: None,
            final_output: None,
            final_computed: false,
            stop: StopHandle::new(),
        }
    }

    /// Set the scope value, deep-copied into every cog at start.
    pub fn with_scope_value(mut self, value: Value) -> Self {
        self.scope_value = value;
        self
    }

    /// Set the scope index (the iteration counter inside a loop).
    pub fn with_scope_index(mut self, index: usize) -> Self {
        self.scope_index = index;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ScopeState {
        self.state
    }

    /// A handle that cancels this scope from outside.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// The memoized final output, once the scope has completed.
    pub fn final_output(&self) -> Option<&Value> {
        self.final_output.as_ref()
    }

    /// The accessor over this scope's cogs. Available once prepared.
    pub fn output_accessor(&self) -> Option<&OutputAccessor> {
        self.accessor.as_ref()
    }

    /// Turn a plan into live cogs. Callable exactly once per scope.
    pub fn prepare(&mut self, plan: ScopePlan) -> Result<()> {
        match self.state {
            ScopeState::NotPrepared => {}
            ScopeState::Preparing | ScopeState::Prepared => {
                return Err(EngineError::ScopeAlreadyPrepared)
            }
            ScopeState::Running | ScopeState::Completed => {
                return Err(EngineError::ScopeAlreadyRan)
            }
        }
        self.state = ScopeState::Preparing;
        match self.build(plan) {
            Ok(()) => {
                self.state = ScopeState::Prepared;
                tracing::debug!(cogs = self.registry.len(), "Scope prepared");
                Ok(())
            }
            Err(err) => {
                self.state = ScopeState::NotPrepared;
                Err(err)
            }
        }
    }

    fn build(&mut self, plan: ScopePlan) -> Result<()> {
        let (declarations, outputs) = plan.into_parts();

        let mut outputs = outputs.into_iter();
        let outputs_block = outputs.next();
        if outputs.next().is_some() {
            return Err(EngineError::DuplicateOutputs);
        }

        let mut registry = CogRegistry::new();
        for (position, decl) in declarations.into_iter().enumerate() {
            let kind = self.kinds.get(&decl.kind)?;
            // Unnamed cogs get a name from their kind and 1-based position.
            let name = decl
                .name
                .unwrap_or_else(|| format!("{}_{}", decl.kind, position + 1));
            registry.insert(Arc::new(Cog::new(name, kind, decl.input)))?;
        }

        let registry = Arc::new(registry);
        self.accessor = Some(OutputAccessor::new(
            Arc::clone(&registry),
            Arc::clone(&self.context),
        ));
        self.registry = registry;
        self.outputs_block = outputs_block;
        Ok(())
    }

    /// Run the prepared scope. Callable exactly once.
    ///
    /// Returns the scope's final output, or the first error (a re-raised
    /// signal counts). The final output is settled on every exit path,
    /// including Break, and is readable afterwards via
    /// [`final_output`](Self::final_output).
    #[tracing::instrument(skip(self), fields(scope_index = self.scope_index))]
    pub async fn run(&mut self) -> Result<Value> {
        match self.state {
            ScopeState::Prepared => {}
            ScopeState::NotPrepared | ScopeState::Preparing => {
                return Err(EngineError::ScopeNotPrepared)
            }
            ScopeState::Running | ScopeState::Completed => {
                return Err(EngineError::ScopeAlreadyRan)
            }
        }
        self.state = ScopeState::Running;
        tracing::info!(
            cogs = self.registry.len(),
            scope_index = self.scope_index,
            "Scope running"
        );

        let mut outcome = self.run_cogs().await;

        if !self.final_computed {
            self.final_computed = true;
            match self.compute_final_output().await {
                Ok(value) => self.final_output = Some(value),
                Err(err) => {
                    if outcome.is_ok() {
                        outcome = Err(err);
                    }
                }
            }
        }

        self.state = ScopeState::Completed;
        match outcome {
            Ok(()) => Ok(self.final_output.clone().unwrap_or_else(Value::null)),
            Err(err) => {
                tracing::info!(code = err.code(), "Scope ended early");
                Err(err)
            }
        }
    }

    async fn run_cogs(&mut self) -> Result<()> {
        let mut outcome: Result<()> = Ok(());
        let accessor = match self.accessor.clone() {
            Some(accessor) => accessor,
            None => return Err(EngineError::ScopeNotPrepared),
        };
        let order: Vec<Arc<Cog>> = self.registry.iter().cloned().collect();

        'start: for cog in order {
            if self.barrier.is_stopped() || self.stop.is_stopped() {
                break;
            }

            let config = match self.resolver.resolve(
                cog.kind_id(),
                Some(cog.name()),
                cog.needs_providers(),
            ) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(cog = cog.name(), error = %err, "Config resolution failed");
                    outcome = Err(err);
                    // A scope that can no longer succeed must not wait on
                    // in-flight siblings.
                    self.barrier.stop();
                    break;
                }
            };
            let synchronous = config.settings.synchronous;

            if let Err(err) = cog.start(
                &mut self.barrier,
                config,
                accessor.clone(),
                self.scope_value.clone(),
                self.scope_index,
            ) {
                outcome = Err(err);
                self.barrier.stop();
                break;
            }

            if synchronous {
                // Hold the start loop until this cog settles. Completions
                // of earlier concurrent cogs may arrive first.
                while !cog.status().is_terminal() {
                    let Some(event) = self.next_event().await else {
                        break;
                    };
                    if self.interpret(event, &mut outcome) {
                        break 'start;
                    }
                }
            }
        }

        // Drain every remaining completion so each cog's status is final
        // before the final output is computed.
        while let Some(event) = self.next_event().await {
            let _ = self.interpret(event, &mut outcome);
        }
        self.barrier.stop();
        outcome
    }

    /// Next barrier completion, honoring the stop handle while waiting.
    async fn next_event(&mut self) -> Option<BarrierEvent> {
        loop {
            if self.barrier.is_empty() {
                return None;
            }
            if self.stop.is_stopped() {
                self.barrier.stop();
            }
            if self.barrier.is_stopped() {
                return self.barrier.join_next().await;
            }
            let stop = self.stop.clone();
            tokio::select! {
                event = self.barrier.join_next() => return event,
                _ = stop.stopped() => {
                    tracing::info!("Scope stop requested");
                    self.barrier.stop();
                }
            }
        }
    }

    /// Fold one completion into the scope outcome. Returns true when the
    /// start loop must not start further cogs.
    fn interpret(&mut self, event: BarrierEvent, outcome: &mut Result<()>) -> bool {
        match event {
            BarrierEvent::Finished {
                cog,
                outcome: Ok(()),
            } => {
                tracing::debug!(cog = %cog, "Cog settled");
                false
            }
            BarrierEvent::Finished {
                cog,
                outcome: Err(err),
            } => {
                self.barrier.stop();
                match err.as_signal().map(|sig| sig.kind) {
                    Some(SignalKind::Next) => {
                        // Quiet exit: in-flight cogs are cancelled and the
                        // scope outcome stays Ok.
                        tracing::debug!(cog = %cog, "Scope ended by next signal");
                    }
                    Some(SignalKind::Break) => {
                        tracing::debug!(cog = %cog, "Scope ended by break signal");
                        if outcome.is_ok() {
                            *outcome = Err(err);
                        }
                    }
                    _ => {
                        tracing::warn!(cog = %cog, error = %err, "Cog stopped the scope");
                        if outcome.is_ok() {
                            *outcome = Err(err);
                        }
                    }
                }
                true
            }
            BarrierEvent::Cancelled { cog } => {
                if let Some(cog) = self.registry.get(&cog) {
                    cog.mark_stopped();
                }
                tracing::debug!(cog = %cog, "Cog cancelled");
                false
            }
            BarrierEvent::Panicked { cog } => {
                if let Some(handle) = self.registry.get(&cog) {
                    handle.mark_stopped();
                }
                self.barrier.stop();
                tracing::error!(cog = %cog, "Cog task panicked");
                if outcome.is_ok() {
                    *outcome = Err(EngineError::CogPanic { cog });
                }
                true
            }
        }
    }

    /// Settle the final output.
    ///
    /// With an outputs block the block's value wins; a lenient block
    /// collapses never-succeeded access errors (and Skip/Next raised inside
    /// the block) to empty, while Fail and plain errors always propagate.
    /// Without a block the last declared cog's output is used, empty if it
    /// never succeeded.
    async fn compute_final_output(&self) -> Result<Value> {
        let accessor = match self.accessor.as_ref() {
            Some(accessor) => accessor,
            None => return Err(EngineError::ScopeNotPrepared),
        };
        match &self.outputs_block {
            Some((mode, block)) => {
                let result = block(accessor, self.scope_value.clone(), self.scope_index).await;
                match (mode, result) {
                    (_, Ok(value)) => Ok(value),
                    (OutputsMode::Strict, Err(err)) => Err(err),
                    (OutputsMode::Lenient, Err(err)) => {
                        let absorb = err.is_never_succeeded()
                            || matches!(
                                err.as_signal().map(|sig| sig.kind),
                                Some(SignalKind::Skip) | Some(SignalKind::Next)
                            );
                        if absorb {
                            tracing::debug!(error = %err, "Lenient outputs collapsed to empty");
                            Ok(Value::null())
                        } else {
                            Err(err)
                        }
                    }
                }
            }
            None => {
                let last = self.registry.last().ok_or(EngineError::EmptyScope)?;
                if last.succeeded() {
                    Ok(last.output().unwrap_or_else(Value::null))
                } else {
                    Ok(Value::null())
                }
            }
        }
    }
}

impl std::fmt::Debug for ExecutionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionManager")
            .field("state", &self.state)
            .field("cogs", &self.registry.len())
            .field("scope_index", &self.scope_index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ExecutionManager {
        ExecutionManager::new(
            Arc::new(KindRegistry::new()),
            Arc::new(ConfigResolver::new()),
            Arc::new(WorkflowContext::new()),
        )
    }

    #[tokio::test]
    async fn run_requires_prepare() {
        let mut mgr = manager();
        assert_eq!(mgr.state(), ScopeState::NotPrepared);
        let err = mgr.run().await.unwrap_err();
        assert_eq!(err.code(), "E003");
    }

    #[test]
    fn prepare_is_once_only() {
        let mut mgr = manager();
        mgr.prepare(ScopePlan::new()).unwrap();
        assert_eq!(mgr.state(), ScopeState::Prepared);
        let err = mgr.prepare(ScopePlan::new()).unwrap_err();
        assert_eq!(err.code(), "E002");
    }

    #[tokio::test]
    async fn run_is_once_only() {
        let mut mgr = manager();
        mgr.prepare(ScopePlan::new()).unwrap();
        // Empty scope with no outputs block has no final output.
        let err = mgr.run().await.unwrap_err();
        assert_eq!(err.code(), "E105");
        assert_eq!(mgr.state(), ScopeState::Completed);

        let err = mgr.run().await.unwrap_err();
        assert_eq!(err.code(), "E004");
    }

    #[test]
    fn duplicate_outputs_blocks_are_rejected() {
        use crate::plan::outputs_fn;
        let mut mgr = manager();
        let plan = ScopePlan::new()
            .outputs(outputs_fn(|_, _, _| {
                Box::pin(async { Ok(Value::null()) })
            }))
            .outputs_strict(outputs_fn(|_, _, _| {
                Box::pin(async { Ok(Value::null()) })
            }));
        let err = mgr.prepare(plan).unwrap_err();
        assert_eq!(err.code(), "E104");
        // A failed prepare leaves the scope preparable.
        assert_eq!(mgr.state(), ScopeState::NotPrepared);
    }

    #[test]
    fn unknown_kind_fails_prepare() {
        use crate::plan::no_input;
        let mut mgr = manager();
        let err = mgr
            .prepare(ScopePlan::new().cog("missing", no_input()))
            .unwrap_err();
        assert_eq!(err.code(), "E107");
    }
}
