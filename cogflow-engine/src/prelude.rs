//! Prelude for convenient imports.
//!
//! This module re-exports the most commonly used types and traits from
//! both the scheduler and `cogflow-core`.
//!
//! # Example
//!
//! ```ignore
//! use cogflow_engine::prelude::*;
//! ```

// Scheduler
pub use crate::barrier::{Barrier, BarrierEvent};
pub use crate::cog::{Cog, CogStatus};
pub use crate::kind::{CogFuture, CogInput, CogKind};
pub use crate::manager::{ExecutionManager, ScopeState, StopHandle};
pub use crate::outputs::OutputAccessor;
pub use crate::plan::{
    input_fn, no_input, outputs_fn, value_input, InputFn, InputFuture, OutputsFn, OutputsMode,
    ScopePlan,
};
pub use crate::registry::{CogRegistry, KindRegistry};

// Core types
pub use cogflow_core::prelude::*;
