//! Tera-based host engine for directive-extended templates.
//!
//! This module provides the pieces the include directive renders through:
//!
//! - [`Engine`]: tag registry plus template parsing
//! - [`Template`]: a compiled template; renders tera output and splices directives
//! - [`RenderContext`]: scoped variables and the site side channel
//! - [`Tag`]: the trait every custom directive implements
//!
//! # Supported Features
//!
//! Everything tera provides is available unchanged:
//!
//! - Variable substitution: `{{ page.title }}`
//! - Conditional logic: `{% if include.subtitle %}...{% endif %}`
//! - Loops: `{% for post in posts %}...{% endfor %}`
//! - Standard tera filters
//!
//! Registered directives (such as `{% include nav.html %}`) may appear anywhere
//! a tera block tag may, including inside loops and conditionals. Inside
//! `{% raw %}` blocks they are left literal.
//!
//! Output is never HTML-escaped; templates produce text verbatim.
//!
//! # Examples
//!
//! ```rust,no_run
//! use partials::site::Site;
//! use partials::templating::{Engine, RenderContext};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let engine = Engine::new();
//! let mut ctx = RenderContext::new(Arc::new(Site::default()));
//! ctx.insert("name", json!("world"));
//!
//! let output = engine.render_str("Hello {{ name }}", &mut ctx).unwrap();
//! assert_eq!(output, "Hello world");
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod renderer;
mod scanner;

pub use context::{RenderContext, ScopeGuard};
pub use engine::{Engine, Tag, TagFactory, TagRegistry};
pub use error::format_tera_error;
pub use renderer::Template;

use serde_json::Value;

/// Deep merge two JSON values, with `overrides` taking precedence.
///
/// Objects merge recursively; any other value in `overrides` replaces the one
/// in `base`. Used to layer `--data` files and `--var` flags over page
/// variables.
///
/// ```rust,no_run
/// use serde_json::json;
/// use partials::templating::deep_merge_json;
///
/// let base = json!({ "site": { "title": "Blog", "lang": "en" } });
/// let overrides = json!({ "site": { "lang": "fr" } });
///
/// let result = deep_merge_json(base, &overrides);
/// assert_eq!(result, json!({ "site": { "title": "Blog", "lang": "fr" } }));
/// ```
pub fn deep_merge_json(mut base: Value, overrides: &Value) -> Value {
    match (base.as_object_mut(), overrides.as_object()) {
        (Some(base_obj), Some(override_obj)) => {
            for (key, override_value) in override_obj {
                match base_obj.get_mut(key) {
                    Some(base_value) if base_value.is_object() && override_value.is_object() => {
                        let merged = deep_merge_json(base_value.take(), override_value);
                        *base_value = merged;
                    }
                    _ => {
                        base_obj.insert(key.clone(), override_value.clone());
                    }
                }
            }
            base
        }
        _ => overrides.clone(),
    }
}
