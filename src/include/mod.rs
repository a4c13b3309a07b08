//! The `{% include %}` directive.
//!
//! ```text
//! {% include header.html title="Home" subtitle='It\'s here' author=page.author %}
//! {% include {{page.sidebar}} %}
//! ```
//!
//! The directive renders a fragment from the site's `_includes` directory
//! with the caller's variables in scope. Parameters are bound as `include.*`
//! inside the fragment only.
//!
//! # Lifecycle
//!
//! [`IncludeTag::parse`] runs once, when the enclosing template is parsed: it
//! splits the markup into file token and parameter string and validates the
//! parameter grammar. [`Tag::render`] runs on every render:
//!
//! 1. resolve the file token (a `{{variable}}` reference is looked up)
//! 2. filter the reference and check containment (see [`path`])
//! 3. read the file through the injected [`SourceLoader`], decode and parse it
//! 4. push a scope, bind `include`, render the fragment; the scope is popped
//!    on every exit path
//!
//! Any render-time failure is surfaced as a single
//! [`IncludeError`](crate::core::IncludeError) naming `_includes/<file token>`.
//!
//! # Registration
//!
//! ```rust,no_run
//! use partials::include;
//! use partials::templating::Engine;
//!
//! let mut engine = Engine::new();
//! include::register(&mut engine);
//! ```

pub mod params;
pub mod path;

use std::fmt;
use std::sync::Arc;

use crate::constants::{INCLUDES_DIR, INCLUDE_TAG, INCLUDE_VARIABLE, SYNTAX_EXAMPLE};
use crate::core::{IncludeError, PartialsError, Result};
use crate::loader::{FsLoader, SourceLoader};
use crate::templating::{Engine, RenderContext, Tag};

pub use params::{parse_params, validate_params};
pub use path::{include_root, join_include, resolve_file_reference, validate_file_name, validate_path};

/// A parsed include directive.
///
/// Immutable after [`parse`](Self::parse); holds no render-time state, so one
/// instance can render concurrently from many threads.
pub struct IncludeTag {
    file: String,
    params: Option<String>,
    loader: Arc<dyn SourceLoader>,
}

impl IncludeTag {
    /// Parses directive markup, reading fragments from the filesystem.
    ///
    /// # Errors
    ///
    /// [`PartialsError::Syntax`] for empty markup or a parameter string that
    /// does not match the grammar.
    pub fn parse(markup: &str) -> Result<Self> {
        Self::parse_with_loader(markup, Arc::new(FsLoader))
    }

    /// Parses directive markup, reading fragments through `loader`.
    pub fn parse_with_loader(markup: &str, loader: Arc<dyn SourceLoader>) -> Result<Self> {
        let markup = markup.trim();
        if markup.is_empty() {
            return Err(PartialsError::Syntax {
                message: format!("Missing file name in include tag. Valid syntax:\n\n\t{SYNTAX_EXAMPLE}\n"),
            });
        }

        let (file, params) = match markup.split_once(char::is_whitespace) {
            Some((file, rest)) => {
                let rest = rest.trim_start();
                (file, (!rest.is_empty()).then_some(rest))
            }
            None => (markup, None),
        };

        if let Some(params) = params {
            validate_params(params)?;
        }

        Ok(Self {
            file: file.to_string(),
            params: params.map(str::to_string),
            loader,
        })
    }

    /// The file token as written, possibly a `{{variable}}` reference.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// The raw parameter string, if any.
    pub fn params(&self) -> Option<&str> {
        self.params.as_deref()
    }

    /// Logical path reported in errors: `_includes/<file token>`.
    pub fn logical_path(&self) -> String {
        format!("{INCLUDES_DIR}/{}", self.file)
    }

    fn render_include(&self, context: &mut RenderContext, engine: &Engine) -> Result<String> {
        let site = context.site_handle();

        tracing::trace!("include {}: resolving file", self.file);
        let base_dir = include_root(site.source())?;
        let file = resolve_file_reference(&self.file, context)?;
        validate_file_name(&file, &self.file)?;

        tracing::trace!("include {}: validating path", self.file);
        let path = join_include(&base_dir, &file);
        validate_path(&path, &base_dir, site.safe())?;

        tracing::trace!("include {}: loading {}", self.file, file);
        let options = site.file_read_opts();
        let source = options.decode(self.loader.read(&path, &options)?)?;
        let partial = engine.parse_named(&format!("{INCLUDES_DIR}/{file}"), &source)?;

        let limit = site.max_include_depth();
        if context.nesting() >= limit {
            return Err(PartialsError::DepthExceeded { limit });
        }

        tracing::trace!("include {}: rendering at depth {}", self.file, context.nesting() + 1);
        let mut scope = context.stack();
        if let Some(params) = &self.params {
            let params = parse_params(params, &scope)?;
            scope.insert(INCLUDE_VARIABLE, serde_json::Value::Object(params));
        }
        let output = partial.render(&mut scope, engine)?;

        tracing::trace!("include {}: done", self.file);
        Ok(output)
    }
}

impl Tag for IncludeTag {
    fn render(&self, context: &mut RenderContext, engine: &Engine) -> Result<String> {
        tracing::debug!("Including {}", self.logical_path());
        self.render_include(context, engine).map_err(|error| {
            tracing::trace!("include {}: failed: {}", self.file, error.kind());
            PartialsError::Include(IncludeError::new(error, self.logical_path()))
        })
    }

    fn variables(&self) -> Vec<String> {
        let params = self.params.as_deref().map(params::referenced_variables).unwrap_or_default();
        path::variable_name(&self.file)
            .into_iter()
            .chain(params)
            .map(|name| capture_path(name).to_string())
            .collect()
    }
}

/// The part of a variable path captured at the call site.
///
/// Tera only resolves `loop` through its fields, so `loop.index` is kept
/// whole; any other path is captured by its top-level name.
fn capture_path(name: &str) -> &str {
    let mut segments = name.splitn(3, '.');
    let head = segments.next().unwrap_or(name);
    match (head, segments.next()) {
        ("loop", Some(field)) => &name[..head.len() + 1 + field.len()],
        _ => head,
    }
}

impl fmt::Debug for IncludeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncludeTag")
            .field("file", &self.file)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Registers the include directive, reading fragments from the filesystem.
pub fn register(engine: &mut Engine) {
    register_with_loader(engine, Arc::new(FsLoader));
}

/// Registers the include directive with an alternate loading strategy.
pub fn register_with_loader(engine: &mut Engine, loader: Arc<dyn SourceLoader>) {
    engine.register_tag(INCLUDE_TAG, move |_name: &str, markup: &str| -> Result<Box<dyn Tag>> {
        Ok(Box::new(IncludeTag::parse_with_loader(markup, Arc::clone(&loader))?))
    });
}
