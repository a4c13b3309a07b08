//! Render context: a stack of variable scopes plus the site side channel.
//!
//! Lookups read through the stack, nearest scope first. Scopes are pushed with
//! [`RenderContext::stack`], which returns a [`ScopeGuard`]; the scope is popped
//! when the guard is dropped, on every exit path.
//!
//! ```rust
//! use partials::site::Site;
//! use partials::templating::RenderContext;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let mut ctx = RenderContext::new(Arc::new(Site::default()));
//! ctx.insert("title", json!("outer"));
//! {
//!     let mut scope = ctx.stack();
//!     scope.insert("title", json!("inner"));
//!     assert_eq!(scope.get("title"), Some(&json!("inner")));
//! }
//! assert_eq!(ctx.get("title"), Some(&json!("outer")));
//! ```

use serde_json::{Map, Value};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tera::Context as TeraContext;

use crate::site::Site;

/// Variable scopes and host objects for one render call.
///
/// A context is owned by a single render; concurrent renders each build their
/// own and share only the `Arc<Site>`.
#[derive(Debug, Clone)]
pub struct RenderContext {
    scopes: Vec<Map<String, Value>>,
    /// How many of the pushed scopes hold call-site locals.
    locals: usize,
    site: Arc<Site>,
}

impl RenderContext {
    /// Creates a context with one empty root scope.
    pub fn new(site: Arc<Site>) -> Self {
        Self {
            scopes: vec![Map::new()],
            locals: 0,
            site,
        }
    }

    /// Creates a context whose root scope holds `variables`.
    pub fn with_variables(site: Arc<Site>, variables: Map<String, Value>) -> Self {
        Self {
            scopes: vec![variables],
            locals: 0,
            site,
        }
    }

    /// The site side channel.
    pub fn site(&self) -> &Site {
        &self.site
    }

    /// A shared handle to the site side channel.
    pub fn site_handle(&self) -> Arc<Site> {
        Arc::clone(&self.site)
    }

    /// Binds `key` in the innermost scope.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(key.into(), value);
        }
    }

    /// Looks up a possibly dotted variable name.
    ///
    /// The first segment is resolved nearest scope first; further segments
    /// descend into objects by key and arrays by index. Returns `None` when any
    /// segment is missing.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let mut segments = name.split('.');
        let head = segments.next()?;
        let mut value = self.scopes.iter().rev().find_map(|scope| scope.get(head))?;

        for segment in segments {
            value = match value {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(value)
    }

    /// Pushes a new scope; it is popped when the returned guard drops.
    pub fn stack(&mut self) -> ScopeGuard<'_> {
        self.scopes.push(Map::new());
        ScopeGuard {
            context: self,
            local: false,
        }
    }

    /// Pushes a scope for variables captured where a directive appears (tera
    /// loop and `set` variables). It is not counted by [`nesting`](Self::nesting).
    pub fn stack_locals(&mut self) -> ScopeGuard<'_> {
        self.scopes.push(Map::new());
        self.locals += 1;
        ScopeGuard {
            context: self,
            local: true,
        }
    }

    /// Number of scopes pushed on top of the root scope, not counting
    /// call-site locals.
    pub fn nesting(&self) -> usize {
        self.scopes.len() - 1 - self.locals
    }

    /// Flattens the scopes, nearest binding winning, into a tera context.
    pub fn to_tera_context(&self) -> TeraContext {
        let mut flattened = Map::new();
        for scope in &self.scopes {
            for (key, value) in scope {
                flattened.insert(key.clone(), value.clone());
            }
        }

        let mut context = TeraContext::new();
        for (key, value) in flattened {
            context.insert(key, &value);
        }
        context
    }
}

/// A pushed scope; dereferences to the context and pops the scope on drop.
#[derive(Debug)]
pub struct ScopeGuard<'a> {
    context: &'a mut RenderContext,
    local: bool,
}

impl Deref for ScopeGuard<'_> {
    type Target = RenderContext;

    fn deref(&self) -> &RenderContext {
        self.context
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut RenderContext {
        self.context
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        // The guard always pushed exactly one scope above the root.
        if self.context.scopes.len() > 1 {
            self.context.scopes.pop();
            if self.local {
                self.context.locals -= 1;
            }
        }
    }
}
