//! A single scheduled step and its lifecycle.
//!
//! A [`Cog`] pairs a kind with a name, an input closure, and the shared
//! state other parties observe: the status channel and the output slot.
//! The unit of work runs as one task under the scope's barrier; the cog
//! handle stays behind so the accessor can block on it and the scheduler
//! can inspect it.

use crate::barrier::Barrier;
use crate::kind::CogKind;
use crate::outputs::OutputAccessor;
use crate::plan::InputFn;
use cogflow_core::config::ResolvedConfig;
use cogflow_core::error::{EngineError, Result};
use cogflow_core::signal::SignalKind;
use cogflow_core::value::Value;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

/// Lifecycle states of a cog.
///
/// `NotStarted` and `Running` are transient; the other four are terminal
/// and never change once reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CogStatus {
    /// Declared but the unit of work has not been spawned.
    NotStarted,
    /// The unit of work is in flight.
    Running,
    /// Ended by a Skip signal (or by raising Next/Break), no output.
    Skipped,
    /// Ended by a Fail signal or a plain error, no output.
    Failed,
    /// Cancelled externally before finishing, no output.
    Stopped,
    /// Ran to completion; the output slot is populated.
    Succeeded,
}

impl CogStatus {
    /// Whether this status can still change.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::NotStarted | Self::Running)
    }

    /// Short lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Running => "running",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
            Self::Succeeded => "succeeded",
        }
    }
}

impl std::fmt::Display for CogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State shared between the cog handle and its spawned unit of work.
#[derive(Debug)]
struct CogState {
    status: watch::Sender<CogStatus>,
    output: RwLock<Option<Value>>,
    config: RwLock<Option<ResolvedConfig>>,
    started: AtomicBool,
}

impl CogState {
    fn set_status(&self, status: CogStatus) {
        self.status.send_replace(status);
    }
}

/// One scheduled step.
pub struct Cog {
    name: String,
    kind: Arc<dyn CogKind>,
    input: InputFn,
    state: Arc<CogState>,
}

impl Cog {
    /// Create a cog in the `NotStarted` state.
    pub fn new(name: impl Into<String>, kind: Arc<dyn CogKind>, input: InputFn) -> Self {
        let (status, _) = watch::channel(CogStatus::NotStarted);
        Self {
            name: name.into(),
            kind,
            input,
            state: Arc::new(CogState {
                status,
                output: RwLock::new(None),
                config: RwLock::new(None),
                started: AtomicBool::new(false),
            }),
        }
    }

    /// The cog's unique name within its scope.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the kind behind this cog.
    pub fn kind_id(&self) -> &str {
        self.kind.id()
    }

    /// Whether the kind behind this cog is provider-backed.
    pub fn needs_providers(&self) -> bool {
        self.kind.needs_providers()
    }

    /// Current lifecycle status.
    pub fn status(&self) -> CogStatus {
        *self.state.status.borrow()
    }

    /// The config the unit of work adopted at start, if it has started.
    pub fn resolved_config(&self) -> Option<ResolvedConfig> {
        self.state.config.read().clone()
    }

    /// A deep copy of the output, if the cog succeeded.
    pub fn output(&self) -> Option<Value> {
        self.state.output.read().clone()
    }

    /// Whether the cog finished and produced an output.
    pub fn succeeded(&self) -> bool {
        self.status() == CogStatus::Succeeded && self.state.output.read().is_some()
    }

    /// Whether the cog was cancelled before finishing.
    pub fn stopped(&self) -> bool {
        self.status() == CogStatus::Stopped
    }

    /// Wait until the cog reaches a terminal state. Never errors; callers
    /// inspect the status afterwards.
    pub async fn wait(&self) {
        let mut rx = self.state.status.subscribe();
        let _ = rx.wait_for(|status| status.is_terminal()).await;
    }

    /// Spawn the unit of work under `barrier`.
    ///
    /// Each cog starts at most once; a second start is an error. The cog
    /// adopts deep copies of the config and scope value so nothing it sees
    /// is shared with the scheduler or with sibling cogs.
    pub fn start(
        &self,
        barrier: &mut Barrier,
        config: ResolvedConfig,
        outputs: OutputAccessor,
        scope_value: Value,
        scope_index: usize,
    ) -> Result<()> {
        if self.state.started.swap(true, Ordering::SeqCst) {
            return Err(EngineError::CogAlreadyStarted {
                cog: self.name.clone(),
            });
        }
        // Running must be observable the moment start() returns; the
        // accessor treats NotStarted as a cog that will never run.
        self.state.set_status(CogStatus::Running);

        let state = Arc::clone(&self.state);
        let kind = Arc::clone(&self.kind);
        let input_fn = Arc::clone(&self.input);
        let name = self.name.clone();
        let span = tracing::info_span!("cog", name = %self.name, kind = %self.kind.id());

        barrier.spawn(
            &self.name,
            async move {
                let abort_on_failure = config.settings.abort_on_failure;
                *state.config.write() = Some(config.clone());
                tracing::debug!("Cog started");

                let result =
                    run_unit(&name, kind, input_fn, config, outputs, scope_value, scope_index)
                        .await;
                settle(&state, result, abort_on_failure)
            }
            .instrument(span),
        );
        Ok(())
    }

    /// Record external cancellation. Terminal states are never overwritten.
    pub(crate) fn mark_stopped(&self) {
        self.state.status.send_if_modified(|status| {
            if status.is_terminal() {
                false
            } else {
                *status = CogStatus::Stopped;
                true
            }
        });
    }
}

impl std::fmt::Debug for Cog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cog")
            .field("name", &self.name)
            .field("kind", &self.kind.id())
            .field("status", &self.status())
            .finish()
    }
}

/// Run one execution: build the input, validate it, execute under the
/// configured timeout.
async fn run_unit(
    name: &str,
    kind: Arc<dyn CogKind>,
    input_fn: InputFn,
    config: ResolvedConfig,
    outputs: OutputAccessor,
    scope_value: Value,
    scope_index: usize,
) -> Result<Value> {
    let mut input = kind.new_input();
    // A value returned by the input closure is coerced in first, so the
    // validation pass always sees the final input.
    if let Some(raw) = (input_fn)(&outputs, &mut input, scope_value, scope_index).await? {
        kind.coerce_input(&mut input, raw)?;
    }
    kind.validate_input(&input)?;

    let fut = kind.execute(input, &config, &outputs);
    match config.settings.timeout_duration() {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| EngineError::CogTimeout {
                cog: name.to_string(),
                timeout_s: config.settings.timeout.unwrap_or_default(),
            })?,
        None => fut.await,
    }
}

/// Map an execution result onto the cog's terminal state and decide what
/// the unit re-raises to the scheduler.
///
/// Skip is absorbed here. Fail is absorbed unless the cog's config enables
/// abort-on-failure. Next and Break always travel up: they are addressed
/// to the scope, not to this cog. Plain errors always travel up.
fn settle(state: &CogState, result: Result<Value>, abort_on_failure: bool) -> Result<()> {
    match result {
        Ok(value) => {
            *state.output.write() = Some(value);
            state.set_status(CogStatus::Succeeded);
            tracing::debug!("Cog succeeded");
            Ok(())
        }
        Err(EngineError::Signal(sig)) => match sig.kind {
            SignalKind::Skip => {
                state.set_status(CogStatus::Skipped);
                tracing::debug!(signal = %sig, "Cog skipped itself");
                Ok(())
            }
            SignalKind::Fail => {
                state.set_status(CogStatus::Failed);
                tracing::warn!(signal = %sig, "Cog failed by signal");
                if abort_on_failure {
                    Err(EngineError::Signal(sig))
                } else {
                    Ok(())
                }
            }
            SignalKind::Next | SignalKind::Break => {
                state.set_status(CogStatus::Skipped);
                tracing::debug!(signal = %sig, "Cog raised a scope signal");
                Err(EngineError::Signal(sig))
            }
        },
        Err(err) => {
            state.set_status(CogStatus::Failed);
            tracing::warn!(error = %err, "Cog failed");
            Err(err)
        }
    }
}
