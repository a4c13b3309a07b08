//! Host template engine with an explicit tag registry.
//!
//! Tera has no hook for custom block tags, so registered tags are handled
//! around it: [`Engine::parse`] pulls every `{% name markup %}` directive whose
//! `name` is registered out of the source, builds it through the tag's factory
//! and leaves an opaque marker in its place inside a `{% raw %}` block. Tera
//! then compiles the remaining source as usual. At render time the markers tera
//! emits are replaced by the output of their directive (see
//! [`Template::render`]). A directive inside a `{% filter %}` block is a
//! syntax error, since the filter would rewrite its marker.
//!
//! Registration happens once at startup:
//!
//! ```rust,no_run
//! use partials::templating::Engine;
//!
//! let mut engine = Engine::new();
//! partials::include::register(&mut engine);
//! assert!(engine.has_tag("include"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tera::Tera;
use uuid::Uuid;

use super::context::RenderContext;
use super::error::{syntax_error, FRAGMENT_NAME};
use super::renderer::{Directive, Template, CAPTURE_SEPARATOR, UNDEFINED};
use super::scanner::{scan, Segment};
use crate::core::{PartialsError, Result};

/// A parsed custom directive.
///
/// Instances are created once per occurrence when the enclosing template is
/// parsed and rendered any number of times afterwards, possibly from several
/// threads at once. Implementations must not keep render-time state.
pub trait Tag: Send + Sync + fmt::Debug {
    /// Renders the directive at its call site.
    fn render(&self, context: &mut RenderContext, engine: &Engine) -> Result<String>;

    /// Variables the directive reads when rendering.
    ///
    /// Their values are captured where the directive appears, so tera loop
    /// and `set` variables are visible to [`render`](Self::render) in a
    /// call-site scope. A dotted path such as `loop.index` is captured as is
    /// and bound as a nested object. Paths that are not made of tera
    /// identifiers are read from the render context only.
    fn variables(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Builds a [`Tag`] from its tag name and raw markup; errors abort parsing.
pub type TagFactory = dyn Fn(&str, &str) -> Result<Box<dyn Tag>> + Send + Sync;

/// Registered tag names and their factories.
#[derive(Clone, Default)]
pub struct TagRegistry {
    factories: BTreeMap<String, Arc<TagFactory>>,
}

impl TagRegistry {
    /// Registers `factory` under `name`, replacing any previous registration.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&str, &str) -> Result<Box<dyn Tag>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TagFactory>> {
        self.factories.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Parses templates and owns the tag registry used while rendering them.
///
/// An engine is immutable once built and is shared (typically behind an
/// `Arc`) by every render.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    tags: TagRegistry,
}

impl Engine {
    /// Creates an engine with no tags registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a custom tag.
    pub fn register_tag<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&str, &str) -> Result<Box<dyn Tag>> + Send + Sync + 'static,
    {
        let name = name.into();
        tracing::debug!("Registering tag '{}'", name);
        self.tags.register(name, factory);
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains(name)
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.names().collect()
    }

    /// Parses an anonymous template.
    ///
    /// # Errors
    ///
    /// [`PartialsError::Syntax`](crate::core::PartialsError::Syntax) when a
    /// directive rejects its markup or tera rejects the remaining source.
    pub fn parse(&self, source: &str) -> Result<Template> {
        self.parse_named("template", source)
    }

    /// Parses a template; `name` is used in error messages only.
    pub fn parse_named(&self, name: &str, source: &str) -> Result<Template> {
        let marker_prefix = format!("\u{1}partials:{}:", Uuid::new_v4().simple());
        let mut transformed = String::with_capacity(source.len());
        let mut tags: Vec<Directive> = Vec::new();

        for segment in scan(source, |tag| self.tags.contains(tag)) {
            match segment {
                Segment::Text(text) => transformed.push_str(text),
                Segment::Directive(directive) => {
                    let Some(factory) = self.tags.get(directive.name) else {
                        continue;
                    };
                    if directive.in_filter {
                        return Err(PartialsError::Syntax {
                            message: format!(
                                "Tag '{}' cannot be used inside a filter block in '{}'",
                                directive.name, name
                            ),
                        });
                    }
                    let tag = factory(directive.name, directive.markup)?;
                    let mut captures = tag.variables();
                    captures.retain(|path| path.split('.').all(is_tera_identifier));
                    captures.sort_unstable();
                    captures.dedup();

                    transformed.push_str(if directive.trim_left { "{%- raw %}" } else { "{% raw %}" });
                    transformed.push_str(&marker_prefix);
                    transformed.push_str(&tags.len().to_string());
                    transformed.push_str("{% endraw %}");
                    for name in &captures {
                        transformed.push(CAPTURE_SEPARATOR);
                        transformed.push_str(&format!(
                            "{{{{ {name} | default(value=\"{UNDEFINED}\") | json_encode() }}}}"
                        ));
                    }
                    transformed.push_str(if directive.trim_right { "{% raw %}\u{1}{% endraw -%}" } else { "\u{1}" });

                    tags.push(Directive { tag, captures });
                }
            }
        }

        let mut tera = Tera::default();
        tera.add_raw_template(FRAGMENT_NAME, &transformed)
            .map_err(|e| syntax_error(&e, name))?;

        tracing::debug!("Parsed template '{}' with {} directive(s)", name, tags.len());
        Ok(Template::new(tera, name.to_string(), marker_prefix, tags))
    }

    /// Parses and renders `source` in one step.
    pub fn render_str(&self, source: &str, context: &mut RenderContext) -> Result<String> {
        self.parse(source)?.render(context, self)
    }
}

/// Keywords that cannot be used as tera variable names.
const TERA_KEYWORDS: &[&str] = &["and", "or", "not", "in", "is", "as", "true", "false", "True", "False"];

fn is_tera_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !TERA_KEYWORDS.contains(&name)
}
