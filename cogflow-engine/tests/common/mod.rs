//! Shared test fixtures: cog kinds with observable behavior and helpers
//! for assembling a runnable scope.

#![allow(dead_code)]

use cogflow_core::config::{ConfigResolver, ResolvedConfig};
use cogflow_core::context::WorkflowContext;
use cogflow_core::error::{EngineError, Result};
use cogflow_core::signal::{FlowSignal, SignalKind};
use cogflow_core::value::Value;
use cogflow_engine::kind::{CogFuture, CogInput, CogKind};
use cogflow_engine::manager::ExecutionManager;
use cogflow_engine::outputs::OutputAccessor;
use cogflow_engine::registry::KindRegistry;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Install a test subscriber so tracing output shows up with `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Echoes its input value as its output.
pub struct EchoKind;

impl CogKind for EchoKind {
    fn id(&self) -> &str {
        "echo"
    }

    fn execute<'a>(
        &'a self,
        input: CogInput,
        _config: &'a ResolvedConfig,
        _outputs: &'a OutputAccessor,
    ) -> CogFuture<'a> {
        Box::pin(async move { Ok(input.value) })
    }
}

/// Sleeps for `sleep_ms` before echoing its input.
pub struct SlowKind {
    pub sleep_ms: u64,
}

impl CogKind for SlowKind {
    fn id(&self) -> &str {
        "slow"
    }

    fn execute<'a>(
        &'a self,
        input: CogInput,
        _config: &'a ResolvedConfig,
        _outputs: &'a OutputAccessor,
    ) -> CogFuture<'a> {
        let sleep_ms = self.sleep_ms;
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
            Ok(input.value)
        })
    }
}

/// Raises a fixed control-flow signal, optionally after a delay.
pub struct RaisingKind {
    pub id: &'static str,
    pub signal: SignalKind,
    pub delay_ms: u64,
}

impl RaisingKind {
    pub fn new(id: &'static str, signal: SignalKind) -> Self {
        Self {
            id,
            signal,
            delay_ms: 0,
        }
    }

    pub fn delayed(id: &'static str, signal: SignalKind, delay_ms: u64) -> Self {
        Self {
            id,
            signal,
            delay_ms,
        }
    }
}

impl CogKind for RaisingKind {
    fn id(&self) -> &str {
        self.id
    }

    fn execute<'a>(
        &'a self,
        _input: CogInput,
        _config: &'a ResolvedConfig,
        _outputs: &'a OutputAccessor,
    ) -> CogFuture<'a> {
        let signal = self.signal;
        let delay_ms = self.delay_ms;
        Box::pin(async move {
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            Err(FlowSignal::new(signal).into())
        })
    }
}

/// Fails with a plain execution error.
pub struct FailingKind {
    pub message: String,
}

impl CogKind for FailingKind {
    fn id(&self) -> &str {
        "failing"
    }

    fn execute<'a>(
        &'a self,
        _input: CogInput,
        _config: &'a ResolvedConfig,
        _outputs: &'a OutputAccessor,
    ) -> CogFuture<'a> {
        let message = self.message.clone();
        Box::pin(async move {
            Err(EngineError::CogExecution {
                cog: "failing".to_string(),
                cause: message,
            })
        })
    }
}

/// Panics inside its task.
pub struct PanickingKind;

impl CogKind for PanickingKind {
    fn id(&self) -> &str {
        "panicking"
    }

    fn execute<'a>(
        &'a self,
        _input: CogInput,
        _config: &'a ResolvedConfig,
        _outputs: &'a OutputAccessor,
    ) -> CogFuture<'a> {
        Box::pin(async { panic!("deliberate test panic") })
    }
}

/// Records its input string into a shared log when it starts executing,
/// then echoes the input. Lets tests assert start and finish ordering.
pub struct RecordingKind {
    pub log: Arc<Mutex<Vec<String>>>,
}

impl CogKind for RecordingKind {
    fn id(&self) -> &str {
        "recording"
    }

    fn execute<'a>(
        &'a self,
        input: CogInput,
        config: &'a ResolvedConfig,
        _outputs: &'a OutputAccessor,
    ) -> CogFuture<'a> {
        let log = Arc::clone(&self.log);
        let hold_ms = config
            .settings
            .param("hold_ms")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        Box::pin(async move {
            let label = input.value.as_str().unwrap_or("?").to_string();
            log.lock().push(label);
            if hold_ms > 0 {
                tokio::time::sleep(Duration::from_millis(hold_ms)).await;
            }
            Ok(input.value)
        })
    }
}

/// Provider-backed kind: outputs the sorted ids of the injected providers.
pub struct ProviderProbeKind;

impl CogKind for ProviderProbeKind {
    fn id(&self) -> &str {
        "provider_probe"
    }

    fn needs_providers(&self) -> bool {
        true
    }

    fn execute<'a>(
        &'a self,
        _input: CogInput,
        config: &'a ResolvedConfig,
        _outputs: &'a OutputAccessor,
    ) -> CogFuture<'a> {
        Box::pin(async move {
            let mut ids: Vec<String> = config
                .providers
                .as_ref()
                .map(|registry| registry.ids().iter().map(|id| id.to_string()).collect())
                .unwrap_or_default();
            ids.sort();
            Ok(Value(serde_json::json!(ids)))
        })
    }
}

/// Outputs the `greeting` parameter from its resolved config.
pub struct ParamKind;

impl CogKind for ParamKind {
    fn id(&self) -> &str {
        "param"
    }

    fn execute<'a>(
        &'a self,
        _input: CogInput,
        config: &'a ResolvedConfig,
        _outputs: &'a OutputAccessor,
    ) -> CogFuture<'a> {
        let greeting = config
            .settings
            .param("greeting")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        Box::pin(async move { Ok(Value(greeting)) })
    }
}

/// Registry with every fixture kind, plus a recording log shared by all
/// `recording` cogs.
pub fn fixture_kinds() -> (Arc<KindRegistry>, Arc<Mutex<Vec<String>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut kinds = KindRegistry::new();
    kinds.register(Arc::new(EchoKind));
    kinds.register(Arc::new(SlowKind { sleep_ms: 50 }));
    kinds.register(Arc::new(RecordingKind {
        log: Arc::clone(&log),
    }));
    kinds.register(Arc::new(ProviderProbeKind));
    kinds.register(Arc::new(ParamKind));
    kinds.register(Arc::new(PanickingKind));
    kinds.register(Arc::new(FailingKind {
        message: "collaborator unavailable".to_string(),
    }));
    kinds.register(Arc::new(RaisingKind::new("skipper", SignalKind::Skip)));
    kinds.register(Arc::new(RaisingKind::new("failer", SignalKind::Fail)));
    kinds.register(Arc::new(RaisingKind::new("nexter", SignalKind::Next)));
    kinds.register(Arc::new(RaisingKind::new("breaker", SignalKind::Break)));
    (Arc::new(kinds), log)
}

/// Manager over the fixture kinds with an empty resolver and context.
pub fn fixture_manager(kinds: Arc<KindRegistry>) -> ExecutionManager {
    ExecutionManager::new(
        kinds,
        Arc::new(ConfigResolver::new()),
        Arc::new(WorkflowContext::new()),
    )
}

/// Manager with a caller-provided resolver.
pub fn fixture_manager_with_resolver(
    kinds: Arc<KindRegistry>,
    resolver: Arc<ConfigResolver>,
) -> ExecutionManager {
    ExecutionManager::new(kinds, resolver, Arc::new(WorkflowContext::new()))
}

/// Convenience: run `result` through `Result` and return the error code.
pub fn error_code(result: Result<Value>) -> &'static str {
    result.unwrap_err().code()
}
