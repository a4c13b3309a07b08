//! partials - include directive for tera-based site templates
//!
//! Pages and fragments are tera templates extended with one directive:
//!
//! ```text
//! {% include header.html title="Home" subtitle=page.subtitle %}
//! ```
//!
//! The directive loads `header.html` from the site's `_includes` directory,
//! binds its parameters as `include.*` and renders it with the caller's
//! variables in scope.
//!
//! ## Key Features
//!
//! - **Parameters**: quoted strings with escaping, literals, or variable lookups
//! - **Variable file references**: `{% include {{page.sidebar}} %}`
//! - **Containment**: references are filtered for traversal and hidden segments;
//!   restricted mode also rejects symlinks that leave `_includes`
//! - **Pluggable loading**: fragments are read through a [`loader::SourceLoader`]
//! - **Reentrant**: parsed templates render concurrently, each render with its
//!   own [`templating::RenderContext`]
//!
//! # Core Modules
//!
//! - [`include`] - The include directive: markup parsing, parameter grammar,
//!   path validation and render orchestration
//! - [`templating`] - Host engine: tag registry, template parsing and rendering
//! - [`loader`] - Source loading strategy and decoding
//! - [`site`] - Site side channel shared by every render
//! - [`page`] - Pages with YAML front matter
//! - [`config`] - Site configuration files
//! - [`core`] - Error types and user-facing error display
//! - [`cli`] - The `partials` command line
//!
//! # Example
//!
//! ```rust,no_run
//! use partials::config::SiteConfig;
//! use partials::site::Site;
//! use partials::templating::{Engine, RenderContext};
//! use std::sync::Arc;
//!
//! # fn main() -> partials::core::Result<()> {
//! let mut engine = Engine::new();
//! partials::include::register(&mut engine);
//!
//! let site = Arc::new(Site::new(SiteConfig::load_or_default("site".as_ref())?));
//! let mut ctx = RenderContext::new(site);
//! let html = engine.render_str("{% include nav.html active='home' %}", &mut ctx)?;
//! println!("{html}");
//! # Ok(())
//! # }
//! ```

// Directive
pub mod include;

// Host engine
pub mod loader;
pub mod page;
pub mod site;
pub mod templating;

// Supporting modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
