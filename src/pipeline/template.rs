// src/pipeline/template.rs

use handlebars::{handlebars_helper, Handlebars};
use serde::Serialize;
use tracing::debug;

use crate::errors::{BuildError, Result};

handlebars_helper!(capitals: |s: str| s.to_uppercase());

/// Handlebars registry with the site's helper set.
///
/// Helpers: `capitals` (uppercase its argument).
pub struct TemplateRenderer {
    registry: Handlebars<'static>,
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer").finish_non_exhaustive()
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_helper("capitals", Box::new(capitals));
        Self { registry }
    }

    pub fn register_partial(&mut self, name: &str, source: &str) -> Result<()> {
        debug!(partial = %name, "registering partial");
        self.registry
            .register_partial(name, source)
            .map_err(|e| BuildError::Template(format!("partial '{name}': {e}")))
    }

    /// Compile `source` under `name` and render it with `context`.
    pub fn render<T: Serialize>(&mut self, name: &str, source: &str, context: &T) -> Result<String> {
        self.registry
            .register_template_string(name, source)
            .map_err(|e| BuildError::Template(format!("{name}: {e}")))?;
        self.registry
            .render(name, context)
            .map_err(|e| BuildError::Template(format!("{name}: {e}")))
    }
}
