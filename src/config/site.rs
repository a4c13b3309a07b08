//! Site configuration.
//!
//! A site is configured by an optional `_config.yml` (or `_config.yaml`,
//! `_config.toml`) in its source directory. Every field has a default, so an
//! empty or missing file yields a usable configuration. Keys this crate does not
//! interpret are kept and exposed to templates as `site.<key>`.
//!
//! ```yaml
//! title: My Blog
//! safe: true
//! encoding: utf-8
//! max_include_depth: 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{CONFIG_FILE_NAMES, DEFAULT_MAX_INCLUDE_DEPTH};
use crate::core::{PartialsError, Result};

use super::parser::parse_config;

/// Settings that control how a site's templates are rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site source root. Relative paths are resolved against the directory of
    /// the configuration file; `~` is expanded.
    pub source: PathBuf,

    /// Restricted mode: includes must resolve, through symlinks, to files
    /// inside the include root.
    pub safe: bool,

    /// Encoding used to read included files and pages, e.g. `utf-8`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    /// Maximum size in bytes of an included file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_include_size: Option<u64>,

    /// Maximum nesting of include directives.
    pub max_include_depth: usize,

    /// Every other key, exposed to templates under `site`.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("."),
            safe: false,
            encoding: None,
            max_include_size: None,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            extra: serde_json::Map::new(),
        }
    }
}

impl SiteConfig {
    /// Loads a configuration file, resolving `source` relative to the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config: SiteConfig = parse_config(path).map_err(|e| PartialsError::Config {
            path: path.to_path_buf(),
            message: format!("{e:#}"),
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.source = resolve_path(&config.source, base);
        config.validate(path)?;

        tracing::debug!(
            config = %path.display(),
            source = %config.source.display(),
            safe = config.safe,
            "Loaded site configuration"
        );
        Ok(config)
    }

    /// Finds the first configuration file present in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES.iter().map(|name| dir.join(name)).find(|candidate| candidate.is_file())
    }

    /// Loads the configuration discovered in `dir`, or the defaults with
    /// `source` set to `dir` when there is none.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        match Self::discover(dir) {
            Some(path) => Self::load(&path),
            None => {
                tracing::debug!(dir = %dir.display(), "No site configuration found, using defaults");
                Ok(Self {
                    source: dir.to_path_buf(),
                    ..Self::default()
                })
            }
        }
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.max_include_depth == 0 {
            return Err(PartialsError::Config {
                path: path.to_path_buf(),
                message: "max_include_depth must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Expands `~` and resolves a relative path against `base`.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = PathBuf::from(shellexpand::tilde(raw.as_ref()).into_owned());
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}
