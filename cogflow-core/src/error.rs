//! Error types for cogflow.
//!
//! This module provides strongly-typed errors with actionable context.
//! All errors carry the identifiers a caller needs (cog name, kind id,
//! selector text) and a stable `E`-prefixed code for log correlation.
//!
//! Control-flow signals ride along as [`EngineError::Signal`] so that `?`
//! propagates them through the scheduler; they are expected outcomes, not
//! failures, and each layer absorbs or re-raises them per its own rules.

use crate::signal::FlowSignal;
use thiserror::Error;

/// The main error type for cogflow operations.
#[derive(Error, Debug)]
pub enum EngineError {
    // =========================================================================
    // Lifecycle Errors (E001-E099)
    // =========================================================================
    /// A cog's unit of work was started a second time.
    #[error("E001: Cog '{cog}' was already started")]
    CogAlreadyStarted {
        /// The cog that was started twice.
        cog: String,
    },

    /// `prepare()` was called on a scope that is already prepared.
    #[error("E002: Scope is already prepared")]
    ScopeAlreadyPrepared,

    /// `run()` was called on a scope that was never prepared.
    #[error("E003: Scope has not been prepared")]
    ScopeNotPrepared,

    /// `run()` was called a second time on the same scope.
    #[error("E004: Scope has already run")]
    ScopeAlreadyRan,

    // =========================================================================
    // Configuration Errors (E100-E199)
    // =========================================================================
    /// A config registration used a selector that is neither absent, a
    /// pattern, nor an exact name.
    #[error("E101: Invalid config selector '{selector}': expected nothing, /pattern/, or a cog name")]
    InvalidSelector {
        /// The selector text that was rejected.
        selector: String,
    },

    /// A pattern-scoped config layer carried an invalid regex.
    #[error("E102: Invalid config pattern '{pattern}': {cause}")]
    InvalidPattern {
        /// The pattern that failed to compile.
        pattern: String,
        /// Reason the pattern is invalid.
        cause: String,
    },

    /// The merged configuration for a cog failed validation.
    #[error("E103: Invalid configuration for kind '{kind}': {cause}")]
    ConfigValidation {
        /// The cog kind whose config is invalid.
        kind: String,
        /// Description of the validation failure.
        cause: String,
    },

    /// A scope declared more than one outputs block.
    #[error("E104: Scope declares more than one outputs block")]
    DuplicateOutputs,

    /// A scope with no cogs and no outputs block has no final output.
    #[error("E105: Scope declares no cogs and no outputs block")]
    EmptyScope,

    /// Two cogs in the same scope share a name.
    #[error("E106: Duplicate cog name '{name}' in scope")]
    DuplicateCog {
        /// The name that is already taken.
        name: String,
    },

    /// A cog kind was requested that is not in the kind registry.
    #[error("E107: Unknown cog kind '{kind}'")]
    UnknownKind {
        /// The kind id that was not found.
        kind: String,
    },

    // =========================================================================
    // Output Access Errors (E200-E299)
    // =========================================================================
    /// An output was requested for a cog that does not exist in the scope.
    /// Never absorbed by any layer.
    #[error("E201: Cog '{name}' does not exist in this scope")]
    UnknownCog {
        /// The name that was requested.
        name: String,
    },

    /// An output was requested for a cog whose unit of work never started.
    #[error("E202: Cog '{name}' has not run yet")]
    CogNotYetRun {
        /// The cog that never started.
        name: String,
    },

    /// An output was requested for a cog that skipped itself.
    #[error("E203: Cog '{name}' was skipped and produced no output")]
    CogSkipped {
        /// The cog that skipped.
        name: String,
    },

    /// An output was requested for a cog that failed.
    #[error("E204: Cog '{name}' failed and produced no output")]
    CogFailed {
        /// The cog that failed.
        name: String,
    },

    /// An output was requested for a cog that was cancelled externally.
    #[error("E205: Cog '{name}' was stopped before finishing")]
    CogStopped {
        /// The cog that was stopped.
        name: String,
    },

    // =========================================================================
    // Execution Errors (E300-E399)
    // =========================================================================
    /// A cog's execution logic failed with an opaque collaborator error.
    #[error("E301: Cog '{cog}' execution failed: {cause}")]
    CogExecution {
        /// The cog that failed.
        cog: String,
        /// Reason for the failure.
        cause: String,
    },

    /// A cog's execution exceeded its configured timeout.
    #[error("E302: Cog '{cog}' timed out after {timeout_s}s")]
    CogTimeout {
        /// The cog that timed out.
        cog: String,
        /// Timeout in seconds.
        timeout_s: u64,
    },

    /// A cog's unit of work panicked.
    #[error("E303: Cog '{cog}' panicked")]
    CogPanic {
        /// The cog whose task panicked.
        cog: String,
    },

    /// Template rendering failed.
    #[error("E304: Template rendering failed: {cause}")]
    Template {
        /// Reason rendering failed.
        cause: String,
    },

    // =========================================================================
    // Control-Flow Signals (E400)
    // =========================================================================
    /// A control-flow signal surfacing through the control path.
    #[error("E400: signal {0}")]
    Signal(FlowSignal),
}

impl EngineError {
    /// Get the error code (e.g., "E001").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::CogAlreadyStarted { .. } => "E001",
            Self::ScopeAlreadyPrepared => "E002",
            Self::ScopeNotPrepared => "E003",
            Self::ScopeAlreadyRan => "E004",
            Self::InvalidSelector { .. } => "E101",
            Self::InvalidPattern { .. } => "E102",
            Self::ConfigValidation { .. } => "E103",
            Self::DuplicateOutputs => "E104",
            Self::EmptyScope => "E105",
            Self::DuplicateCog { .. } => "E106",
            Self::UnknownKind { .. } => "E107",
            Self::UnknownCog { .. } => "E201",
            Self::CogNotYetRun { .. } => "E202",
            Self::CogSkipped { .. } => "E203",
            Self::CogFailed { .. } => "E204",
            Self::CogStopped { .. } => "E205",
            Self::CogExecution { .. } => "E301",
            Self::CogTimeout { .. } => "E302",
            Self::CogPanic { .. } => "E303",
            Self::Template { .. } => "E304",
            Self::Signal(_) => "E400",
        }
    }

    /// Check if this error is a configuration/validation error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSelector { .. }
                | Self::InvalidPattern { .. }
                | Self::ConfigValidation { .. }
                | Self::DuplicateOutputs
                | Self::EmptyScope
                | Self::DuplicateCog { .. }
                | Self::UnknownKind { .. }
        )
    }

    /// Check if this is one of the three "step never succeeded" access
    /// errors a lenient outputs block converts into an empty result.
    #[must_use]
    pub fn is_never_succeeded(&self) -> bool {
        matches!(
            self,
            Self::CogNotYetRun { .. } | Self::CogSkipped { .. } | Self::CogStopped { .. }
        )
    }

    /// View this error as a control-flow signal, if it is one.
    #[must_use]
    pub fn as_signal(&self) -> Option<&FlowSignal> {
        match self {
            Self::Signal(sig) => Some(sig),
            _ => None,
        }
    }
}

impl From<FlowSignal> for EngineError {
    fn from(sig: FlowSignal) -> Self {
        Self::Signal(sig)
    }
}

/// Result type alias using `EngineError`.
pub type Result<T> = std::result::Result<T, EngineError>;
