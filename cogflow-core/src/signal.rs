//! Control-flow signals.
//!
//! Cog logic ends a step (or an enclosing loop scope) early by raising a
//! signal instead of returning an output. Signals travel as
//! [`EngineError::Signal`](crate::error::EngineError::Signal) so that `?`
//! carries them through ordinary control paths; each layer of the engine
//! absorbs or re-raises them by matching on [`SignalKind`], never on a
//! concrete exception type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four control-flow signal kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// End this cog without an output; the scope continues.
    Skip,
    /// Mark this cog failed; the scope continues unless the cog's config
    /// enables abort-on-failure.
    Fail,
    /// End the scope quietly; an enclosing loop begins its next iteration.
    Next,
    /// End the scope and propagate to the nearest enclosing loop-like
    /// construct; the scope's final output is still computed.
    Break,
}

impl SignalKind {
    /// Short lowercase name of the signal.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Fail => "fail",
            Self::Next => "next",
            Self::Break => "break",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raised control-flow signal with an optional human-readable message.
///
/// Not tied to any cog or scope; whichever layer currently owns control
/// decides whether to absorb or re-raise it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSignal {
    /// Which signal was raised.
    pub kind: SignalKind,
    /// Optional message explaining why.
    pub message: Option<String>,
}

impl FlowSignal {
    /// Create a signal with no message.
    pub fn new(kind: SignalKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Create a Skip signal.
    pub fn skip() -> Self {
        Self::new(SignalKind::Skip)
    }

    /// Create a Fail signal.
    pub fn fail() -> Self {
        Self::new(SignalKind::Fail)
    }

    /// Create a Next signal.
    pub fn next() -> Self {
        Self::new(SignalKind::Next)
    }

    /// Create a Break signal.
    pub fn brk() -> Self {
        Self::new(SignalKind::Break)
    }

    /// Attach a message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Check the signal kind.
    pub fn is(&self, kind: SignalKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for FlowSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {}", self.kind, msg),
            None => write!(f, "{}", self.kind),
        }
    }
}
