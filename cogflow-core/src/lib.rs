//! Cogflow Core Library
//!
//! This crate provides the foundational types for the cogflow workflow
//! engine: error and signal types, the dynamic [`Value`] used for cog
//! outputs and scope state, and the layered configuration resolver.
//!
//! # Overview
//!
//! A cogflow workflow is a sequence of named steps ("cogs") executed under a
//! cancellable task group. This crate contains everything the scheduler in
//! `cogflow-engine` builds on:
//!
//! - **Errors**: strongly-typed [`EngineError`] with stable error codes
//! - **Signals**: [`FlowSignal`] — the Skip/Fail/Next/Break non-local exits
//! - **Values**: dynamic [`Value`] with typed field access
//! - **Config**: [`ConfigResolver`] — global, per-kind, pattern-scoped and
//!   name-scoped layers merged into one validated [`CogSettings`]
//! - **Collaborator seams**: [`ProviderRegistry`] and [`WorkflowContext`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod error;
pub mod prelude;
pub mod providers;
pub mod signal;
pub mod value;

// Re-export key types at crate root for convenience
pub use config::{CogSettings, ConfigResolver, ConfigScope, ResolvedConfig};
pub use context::{TemplateEngine, WorkflowContext};
pub use error::{EngineError, Result};
pub use providers::{Provider, ProviderRegistry};
pub use signal::{FlowSignal, SignalKind};
pub use value::Value;
