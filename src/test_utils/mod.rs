//! Test utilities for partials
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration test suite.
//!
//! - [`init_test_logging`] - one-time tracing setup honoring `RUST_LOG`
//! - [`TestSite`] - a temporary site source with an `_includes` directory

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::SiteConfig;
use crate::constants::INCLUDES_DIR;
use crate::core::Result;
use crate::include;
use crate::site::Site;
use crate::templating::{Engine, RenderContext};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` if given, else `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=partials=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer() // Important: uses test-compatible writer
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// A temporary site source directory.
///
/// ```rust,no_run
/// use partials::test_utils::TestSite;
///
/// let site = TestSite::new().include("nav.html", "<nav>{{ include.active }}</nav>");
/// let output = site.render("{% include nav.html active='home' %}").unwrap();
/// assert_eq!(output, "<nav>home</nav>");
/// ```
pub struct TestSite {
    temp: TempDir,
    config: SiteConfig,
}

impl TestSite {
    /// Creates an empty site with an `_includes` directory.
    ///
    /// # Panics
    ///
    /// If the temporary directory cannot be created.
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap_or_else(|e| panic!("Failed to create temp dir: {e}"));
        fs::create_dir(temp.path().join(INCLUDES_DIR))
            .unwrap_or_else(|e| panic!("Failed to create {INCLUDES_DIR}: {e}"));
        let config = SiteConfig {
            source: temp.path().to_path_buf(),
            ..SiteConfig::default()
        };
        Self { temp, config }
    }

    /// Site source root.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// The include root, `<source>/_includes`.
    pub fn includes_dir(&self) -> PathBuf {
        self.temp.path().join(INCLUDES_DIR)
    }

    /// Writes a file in `_includes`, creating parent directories.
    #[must_use]
    pub fn include(self, name: &str, content: &str) -> Self {
        let path = self.includes_dir().join(name);
        self.write_file(&path, content);
        self
    }

    /// Writes a file relative to the site source.
    #[must_use]
    pub fn file(self, name: &str, content: &str) -> Self {
        let path = self.path().join(name);
        self.write_file(&path, content);
        self
    }

    /// Enables or disables restricted mode.
    #[must_use]
    pub fn safe(mut self, safe: bool) -> Self {
        self.config.safe = safe;
        self
    }

    /// Replaces the configuration; `source` is kept pointing at this site.
    #[must_use]
    pub fn with_config(mut self, config: SiteConfig) -> Self {
        self.config = SiteConfig {
            source: self.temp.path().to_path_buf(),
            ..config
        };
        self
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn site(&self) -> Arc<Site> {
        Arc::new(Site::new(self.config.clone()))
    }

    /// An engine with the include directive registered.
    pub fn engine(&self) -> Engine {
        let mut engine = Engine::new();
        include::register(&mut engine);
        engine
    }

    /// A fresh render context for this site.
    pub fn context(&self) -> RenderContext {
        RenderContext::new(self.site())
    }

    /// A render context whose root scope holds `variables`.
    pub fn context_with(&self, variables: Value) -> RenderContext {
        let variables = match variables {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        RenderContext::with_variables(self.site(), variables)
    }

    /// Parses and renders `source` with a fresh context.
    pub fn render(&self, source: &str) -> Result<String> {
        self.engine().render_str(source, &mut self.context())
    }

    fn write_file(&self, path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| panic!("Failed to create {}: {e}", parent.display()));
        }
        fs::write(path, content).unwrap_or_else(|e| panic!("Failed to write {}: {e}", path.display()));
    }
}

impl Default for TestSite {
    fn default() -> Self {
        Self::new()
    }
}
