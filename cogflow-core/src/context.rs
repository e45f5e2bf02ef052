//! Ambient workflow context.
//!
//! Invocation-level state that cogs read but never own: the target list,
//! positional and keyword arguments, the scratch directory, and an optional
//! template renderer. Built once per run with the `with_*` methods and
//! shared behind an `Arc` from then on.

use crate::error::Result;
use crate::value::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Renders a template string against a dynamic scope.
///
/// The engine treats rendering as opaque; a workflow host plugs in whatever
/// template language it speaks.
pub trait TemplateEngine: Send + Sync {
    /// Render `template` with `scope` as the variable root.
    fn render(&self, template: &str, scope: &Value) -> Result<String>;
}

/// Read-only invocation state shared across a workflow run.
#[derive(Clone, Default)]
pub struct WorkflowContext {
    targets: Vec<String>,
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    scratch_dir: PathBuf,
    templates: Option<Arc<dyn TemplateEngine>>,
}

impl WorkflowContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the targets the workflow was invoked against.
    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    /// Set the positional invocation arguments.
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Set the keyword invocation arguments.
    pub fn with_kwargs(mut self, kwargs: HashMap<String, Value>) -> Self {
        self.kwargs = kwargs;
        self
    }

    /// Set the scratch directory for intermediate files.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Attach a template renderer.
    pub fn with_templates(mut self, templates: Arc<dyn TemplateEngine>) -> Self {
        self.templates = Some(templates);
        self
    }

    /// The first target, if any.
    pub fn target(&self) -> Option<&str> {
        self.targets.first().map(String::as_str)
    }

    /// All targets.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Positional argument by index.
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Keyword argument by name.
    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.kwargs.get(name)
    }

    /// The scratch directory.
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Render a template against a scope value.
    ///
    /// Without an attached renderer the template comes back verbatim.
    pub fn render(&self, template: &str, scope: &Value) -> Result<String> {
        match &self.templates {
            Some(engine) => engine.render(template, scope),
            None => Ok(template.to_string()),
        }
    }
}

impl std::fmt::Debug for WorkflowContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowContext")
            .field("targets", &self.targets)
            .field("args", &self.args.len())
            .field("kwargs", &self.kwargs.keys().collect::<Vec<_>>())
            .field("scratch_dir", &self.scratch_dir)
            .field("templates", &self.templates.is_some())
            .finish()
    }
}
