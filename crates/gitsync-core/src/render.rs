//! Template rendering

use std::collections::BTreeMap;
use std::path::Path;

use minijinja::{AutoEscape, Environment, UndefinedBehavior};

use crate::{Error, Result};

/// Turns a template file and a set of variables into file content.
pub trait TemplateRenderer {
    fn render(&self, template: &Path, variables: &BTreeMap<String, String>) -> Result<Vec<u8>>;
}

/// Renders Jinja templates.
///
/// Variables are strings. Any use of a variable that was not supplied fails
/// the render, including one behind a filter or in a condition. Block tags
/// swallow the newline that follows them and a trailing newline is kept.
/// Output is never escaped, whatever the template's file name.
pub struct JinjaRenderer {
    env: Environment<'static>,
}

impl Default for JinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl JinjaRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_trim_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_debug(true);
        Self { env }
    }

    /// Render template text held in memory. `name` only appears in errors.
    pub fn render_str(
        &self,
        name: &str,
        template: &str,
        variables: &BTreeMap<String, String>,
    ) -> std::result::Result<String, String> {
        // Alternate formatting appends the offending source line.
        self.env
            .render_named_str(name, template, variables)
            .map_err(|e| format!("{e:#}"))
    }
}

impl TemplateRenderer for JinjaRenderer {
    fn render(&self, template: &Path, variables: &BTreeMap<String, String>) -> Result<Vec<u8>> {
        let failure = |message: String| Error::RenderFailure {
            template: template.to_path_buf(),
            message,
        };

        let content = gitsync_fs::io::read_bytes(template)?;
        let text = String::from_utf8(content).map_err(|_| failure("template is not valid UTF-8".into()))?;
        let name = template
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let rendered = self.render_str(&name, &text, variables).map_err(failure)?;

        Ok(rendered.into_bytes())
    }
}
