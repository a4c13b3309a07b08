//! Compiled templates and directive splicing.
//!
//! Tera emits one marker per directive occurrence in its output:
//!
//! ```text
//! \x01partials:<nonce>:<index> [\x02<json>]* \x01
//! ```
//!
//! Each `\x02<json>` is the value, at the call site, of one variable the
//! directive captures. Control characters inside JSON strings are always
//! escaped, so the separators cannot appear in captured values. A captured
//! dotted path (`loop.index`) is bound as a nested object (`loop`).

use serde_json::{Map, Value};
use std::fmt;

use super::context::RenderContext;
use super::engine::{Engine, Tag};
use super::error::{render_error, FRAGMENT_NAME};
use crate::core::{PartialsError, Result};

/// Separates captured values inside a marker.
pub(crate) const CAPTURE_SEPARATOR: char = '\u{2}';

/// Default substituted by tera for an undefined or null captured variable.
pub(crate) const UNDEFINED: &str = "\u{3}";

/// A directive extracted from template source.
#[derive(Debug)]
pub(crate) struct Directive {
    pub tag: Box<dyn Tag>,
    /// Variables whose call-site values are embedded in the marker.
    pub captures: Vec<String>,
}

/// A template compiled by [`Engine::parse`].
///
/// Holds the compiled tera template plus the directives extracted from the
/// source, indexed by the number in their marker.
pub struct Template {
    tera: tera::Tera,
    name: String,
    marker_prefix: String,
    directives: Vec<Directive>,
}

impl Template {
    pub(crate) fn new(tera: tera::Tera, name: String, marker_prefix: String, directives: Vec<Directive>) -> Self {
        Self {
            tera,
            name,
            marker_prefix,
            directives,
        }
    }

    /// Name given when the template was parsed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renders the template against `context`.
    ///
    /// Tera renders first; each directive marker in its output is then
    /// replaced by that directive's output, in output order. A directive
    /// inside a loop therefore renders once per iteration and one inside a
    /// false conditional not at all.
    ///
    /// # Errors
    ///
    /// [`PartialsError::Template`] for a tera failure or a marker tera
    /// rewrote, or whatever a directive returns.
    pub fn render(&self, context: &mut RenderContext, engine: &Engine) -> Result<String> {
        let rendered = self
            .tera
            .render(FRAGMENT_NAME, &context.to_tera_context())
            .map_err(|e| render_error(&e, &self.name))?;

        if self.directives.is_empty() {
            return Ok(rendered);
        }
        let output = self.splice(&rendered, context, engine)?;

        // A marker that survived splicing in any letter case was altered by tera.
        if output.to_ascii_lowercase().contains(&self.marker_prefix) {
            return Err(PartialsError::Template {
                message: format!("A directive in '{}' was altered by an enclosing filter and was not rendered", self.name),
            });
        }
        Ok(output)
    }

    fn splice(&self, rendered: &str, context: &mut RenderContext, engine: &Engine) -> Result<String> {
        let mut output = String::with_capacity(rendered.len());
        let mut rest = rendered;

        while let Some(start) = rest.find(&self.marker_prefix) {
            let body_start = start + self.marker_prefix.len();
            let Some(body_len) = rest[body_start..].find('\u{1}') else {
                break;
            };
            let body = &rest[body_start..body_start + body_len];

            output.push_str(&rest[..start]);
            match self.parse_marker(body) {
                Some((directive, locals)) => output.push_str(&render_directive(directive, locals, context, engine)?),
                // The nonce is unguessable, so this only happens if tera altered a marker.
                None => output.push_str(&rest[start..body_start + body_len + 1]),
            }
            rest = &rest[body_start + body_len + 1..];
        }

        output.push_str(rest);
        Ok(output)
    }

    fn parse_marker(&self, body: &str) -> Option<(&Directive, Map<String, Value>)> {
        let mut parts = body.split(CAPTURE_SEPARATOR);
        let directive = self.directives.get(parts.next()?.parse::<usize>().ok()?)?;

        let mut locals = Map::new();
        for (name, raw) in directive.captures.iter().zip(parts) {
            match serde_json::from_str::<Value>(raw) {
                Ok(Value::String(s)) if s == UNDEFINED => {}
                Ok(value) => bind_path(&mut locals, name, value),
                Err(e) => tracing::warn!("Ignoring unreadable value captured for '{}': {}", name, e),
            }
        }
        Some((directive, locals))
    }
}

/// Binds `value` at a dotted `path`, creating or extending nested objects.
fn bind_path(locals: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            locals.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = locals.entry(head.to_string()).or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(inner) = entry {
                bind_path(inner, rest, value);
            }
        }
    }
}

fn render_directive(
    directive: &Directive,
    locals: Map<String, Value>,
    context: &mut RenderContext,
    engine: &Engine,
) -> Result<String> {
    if locals.is_empty() {
        return directive.tag.render(context, engine);
    }

    let mut scope = context.stack_locals();
    for (name, value) in locals {
        scope.insert(name, value);
    }
    directive.tag.render(&mut scope, engine)
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("directives", &self.directives)
            .finish_non_exhaustive()
    }
}
