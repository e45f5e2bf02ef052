//! Layered cog configuration.
//!
//! Effective settings for a cog come from four layers merged in a fixed
//! order: a workflow-global layer, a per-kind general layer, per-kind
//! pattern-scoped layers, and a per-kind exact-name layer. Later layers win
//! on conflicting fields; the merged result is validated before use.

mod resolver;
mod settings;

pub use resolver::{ConfigResolver, ConfigScope};
pub use settings::{CogSettings, ResolvedConfig};
