//! Pages: template files with optional YAML front matter.
//!
//! ```text
//! ---
//! title: Home
//! ---
//! {% include header.html title=page.title %}
//! ```
//!
//! The front matter is exposed to the page body as `page.*`, together with
//! `page.path`. The site configuration is exposed as `site.*`.

use gray_matter::Matter;
use gray_matter::engine::YAML;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

use crate::core::{PartialsError, Result};
use crate::loader::{ReadOptions, SourceLoader};
use crate::site::Site;
use crate::templating::{deep_merge_json, Engine, RenderContext};

/// A page split into front matter and template body.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    path: String,
    front_matter: Map<String, Value>,
    content: String,
}

impl Page {
    /// Splits `source` into front matter and body.
    ///
    /// `path` names the page in variables and error messages.
    ///
    /// # Errors
    ///
    /// [`PartialsError::Syntax`] when the front matter is not valid YAML.
    pub fn parse(path: impl Into<String>, source: &str) -> Result<Self> {
        let path = path.into();
        let matter = Matter::<YAML>::new();
        let parsed = matter.parse::<Value>(source).map_err(|e| PartialsError::Syntax {
            message: format!("Invalid front matter in '{path}': {e}"),
        })?;

        let front_matter = match parsed.data {
            Some(Value::Object(map)) => map,
            Some(Value::Null) | None => Map::new(),
            Some(other) => {
                tracing::warn!("Ignoring front matter of '{}': expected a mapping, found {}", path, other);
                Map::new()
            }
        };

        Ok(Self {
            path,
            front_matter,
            content: parsed.content,
        })
    }

    /// Reads and parses a page through `loader`.
    pub fn read(path: &Path, display_path: &str, loader: &dyn SourceLoader, options: &ReadOptions) -> Result<Self> {
        let source = options.decode(loader.read(path, options)?)?;
        Self::parse(display_path, &source)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn front_matter(&self) -> &Map<String, Value> {
        &self.front_matter
    }

    /// Template body without the front matter.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Variables exposed as `page`.
    pub fn payload(&self) -> Value {
        let mut page = self.front_matter.clone();
        page.insert("path".to_string(), Value::String(self.path.clone()));
        Value::Object(page)
    }

    /// Builds the root variables for rendering this page.
    ///
    /// `overrides` (from `--data` files and `--var` flags) are merged last and
    /// win over `site` and `page`.
    pub fn variables(&self, site: &Site, overrides: &Map<String, Value>) -> Map<String, Value> {
        let mut root = Map::new();
        root.insert("site".to_string(), site.payload());
        root.insert("page".to_string(), self.payload());

        match deep_merge_json(Value::Object(root), &Value::Object(overrides.clone())) {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// Renders the page body with the given engine.
    pub fn render(&self, engine: &Engine, site: Arc<Site>, overrides: &Map<String, Value>) -> Result<String> {
        let variables = self.variables(&site, overrides);
        let mut context = RenderContext::with_variables(site, variables);
        engine.parse_named(&self.path, &self.content)?.render(&mut context, engine)
    }
}
