//! Prelude for convenient imports.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! # Example
//!
//! ```ignore
//! use cogflow_core::prelude::*;
//! ```

// Error handling
pub use crate::error::{EngineError, Result};

// Control-flow signals
pub use crate::signal::{FlowSignal, SignalKind};

// Values
pub use crate::value::Value;

// Configuration
pub use crate::config::{CogSettings, ConfigResolver, ConfigScope, ResolvedConfig};

// Collaborator seams
pub use crate::context::{TemplateEngine, WorkflowContext};
pub use crate::providers::{Provider, ProviderRegistry};
