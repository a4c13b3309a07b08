//! The site side channel available to every render.
//!
//! A [`Site`] is built once from a [`SiteConfig`] and shared (behind an `Arc`)
//! by every [`RenderContext`](crate::templating::RenderContext). It answers the
//! questions the include directive asks at render time: where the source root
//! is, whether restricted mode is on, and which read options to hand the loader.

use serde_json::{Map, Value};
use std::path::Path;

use crate::config::SiteConfig;
use crate::constants::BOM_PREFIX;
use crate::loader::ReadOptions;

/// Host objects shared read-only across renders.
#[derive(Debug, Clone)]
pub struct Site {
    config: SiteConfig,
}

impl Site {
    /// Wraps a configuration whose `source` is already resolved.
    pub fn new(config: SiteConfig) -> Self {
        Self { config }
    }

    /// The configuration this site was built from.
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Site source root path.
    pub fn source(&self) -> &Path {
        &self.config.source
    }

    /// Whether restricted (safe) mode is on.
    pub fn safe(&self) -> bool {
        self.config.safe
    }

    /// Maximum nesting of include directives.
    pub fn max_include_depth(&self) -> usize {
        self.config.max_include_depth
    }

    /// Read options for included files.
    ///
    /// A configured encoding is read BOM-tolerant (`bom|<encoding>`).
    pub fn file_read_opts(&self) -> ReadOptions {
        ReadOptions {
            encoding: self.config.encoding.as_ref().map(|encoding| {
                if encoding.starts_with(BOM_PREFIX) {
                    encoding.clone()
                } else {
                    format!("{BOM_PREFIX}{encoding}")
                }
            }),
            max_size: self.config.max_include_size,
        }
    }

    /// Template variables exposed as `site`.
    pub fn payload(&self) -> Value {
        let mut site = Map::new();
        for (key, value) in &self.config.extra {
            site.insert(key.clone(), value.clone());
        }
        site.insert("source".to_string(), Value::String(self.config.source.display().to_string()));
        site.insert("safe".to_string(), Value::Bool(self.config.safe));
        if let Some(encoding) = &self.config.encoding {
            site.insert("encoding".to_string(), Value::String(encoding.clone()));
        }
        Value::Object(site)
    }
}

impl Default for Site {
    fn default() -> Self {
        Self::new(SiteConfig::default())
    }
}
