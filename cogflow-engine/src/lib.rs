//! Cogflow Scheduler
//!
//! This crate runs one scope of a cogflow workflow: an ordered list of
//! declared steps ("cogs") executed concurrently under a cancellable task
//! group, with blocking access to each other's outputs.
//!
//! # Architecture
//!
//! - [`kind::CogKind`] — the reusable behavior behind a step
//! - [`cog::Cog`] — one scheduled step with its status channel and output
//! - [`barrier::Barrier`] — cancellation group over the scope's tasks
//! - [`outputs::OutputAccessor`] — blocking output access for cog logic
//! - [`plan::ScopePlan`] — declarative description of a scope
//! - [`manager::ExecutionManager`] — the prepare/run lifecycle
//!
//! # Example
//!
//! ```ignore
//! let mut manager = ExecutionManager::new(kinds, resolver, context);
//! manager.prepare(
//!     ScopePlan::new()
//!         .named_cog("shell", "fetch", no_input())
//!         .named_cog("shell", "report", input_fn(|outputs, input, _, _| {
//!             Box::pin(async move {
//!                 Ok(Some(outputs.get("fetch").await?))
//!             })
//!         })),
//! )?;
//! let final_output = manager.run().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod barrier;
pub mod cog;
pub mod kind;
pub mod manager;
pub mod outputs;
pub mod plan;
pub mod prelude;
pub mod registry;

// Re-export key types at crate root for convenience
pub use barrier::{Barrier, BarrierEvent};
pub use cog::{Cog, CogStatus};
pub use kind::{CogFuture, CogInput, CogKind};
pub use manager::{ExecutionManager, ScopeState, StopHandle};
pub use outputs::OutputAccessor;
pub use plan::{input_fn, no_input, outputs_fn, value_input, InputFn, OutputsFn, ScopePlan};
pub use registry::{CogRegistry, KindRegistry};
