//! Render pages of a site.
//!
//! Pages render concurrently on the blocking thread pool. They share one
//! engine and one site; each gets its own render context. A failing page is
//! reported and does not stop the others; the command fails if any page did.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use futures::future::join_all;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{parse_config, resolve_path, SiteConfig};
use crate::core::{user_friendly_error, PartialsError};
use crate::include;
use crate::loader::{FsLoader, ReadOptions};
use crate::page::Page;
use crate::site::Site;
use crate::templating::{deep_merge_json, Engine};

/// Render one or more pages.
///
/// # Examples
///
/// ```bash
/// partials render index.html
/// partials render --source site --safe site/index.html
/// partials render --dest _site --var env=prod site/index.html site/about.html
/// ```
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Pages to render.
    #[arg(required = true, value_name = "PAGE")]
    pages: Vec<PathBuf>,

    /// Site source directory containing `_includes` (default: current directory).
    #[arg(long, env = "PARTIALS_SOURCE", value_name = "DIR")]
    source: Option<PathBuf>,

    /// Restricted mode: reject includes that resolve outside `_includes`.
    #[arg(long)]
    safe: bool,

    /// Top-level string variable, e.g. `--var env=prod`. Repeatable.
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    vars: Vec<(String, String)>,

    /// YAML, TOML or JSON file whose top-level keys become variables. Repeatable.
    #[arg(long, value_name = "FILE")]
    data: Vec<PathBuf>,

    /// Write each page under this directory instead of printing it.
    #[arg(long, value_name = "DIR")]
    dest: Option<PathBuf>,
}

fn parse_key_value(input: &str) -> std::result::Result<(String, String), String> {
    match input.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{input}'")),
    }
}

impl RenderCommand {
    /// Renders every page, printing or writing the results.
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let cwd = std::env::current_dir().context("Failed to determine current directory")?;
        let config = self.site_config(config_path.as_deref(), &cwd)?;
        tracing::debug!(source = %config.source.display(), safe = config.safe, "Rendering {} page(s)", self.pages.len());

        let overrides = self.overrides()?;
        let site = Arc::new(Site::new(config));
        let mut engine = Engine::new();
        include::register(&mut engine);
        let engine = Arc::new(engine);
        let overrides = Arc::new(overrides);

        let tasks = self.pages.iter().map(|page| {
            let path = resolve_path(page, &cwd);
            let display = display_path(&path, site.source());
            let site = Arc::clone(&site);
            let engine = Arc::clone(&engine);
            let overrides = Arc::clone(&overrides);
            tokio::task::spawn_blocking(move || {
                let result = render_page(&path, &display, &engine, site, &overrides);
                (display, result)
            })
        });

        let mut failures = 0;
        let total = self.pages.len();
        for joined in join_all(tasks).await {
            let (display, result) = joined.context("Render task panicked")?;
            match result {
                Ok(output) => self.emit(&display, &output).await?,
                Err(error) => {
                    failures += 1;
                    let error = anyhow::Error::from(error).context(format!("Failed to render {display}"));
                    user_friendly_error(error).display();
                }
            }
        }

        if failures > 0 {
            bail!("{failures} of {total} page(s) failed to render");
        }
        if let Some(dest) = &self.dest {
            eprintln!("{} {} page(s) into {}", "Rendered".green().bold(), total, dest.display());
        }
        Ok(())
    }

    /// Loads the site configuration and applies flag overrides.
    fn site_config(&self, config_path: Option<&Path>, cwd: &Path) -> Result<SiteConfig> {
        let source = self.source.as_deref().map(|source| resolve_path(source, cwd));

        let mut config = match (config_path, &source) {
            (Some(path), _) => SiteConfig::load(&resolve_path(path, cwd))?,
            (None, Some(source)) => SiteConfig::load_or_default(source)?,
            (None, None) => SiteConfig::load_or_default(cwd)?,
        };

        if let Some(source) = source {
            config.source = source;
        }
        if self.safe {
            config.safe = true;
        }
        Ok(config)
    }

    /// Variables from `--data` files, then `--var` flags.
    fn overrides(&self) -> Result<Map<String, Value>> {
        let mut merged = Value::Object(Map::new());

        for path in &self.data {
            let data: Value = parse_config(path)?;
            if !data.is_object() {
                bail!("Data file {} must contain a mapping at the top level", path.display());
            }
            merged = deep_merge_json(merged, &data);
        }

        let Value::Object(mut merged) = merged else {
            bail!("Data files must contain mappings");
        };
        for (key, value) in &self.vars {
            merged.insert(key.clone(), Value::String(value.clone()));
        }
        Ok(merged)
    }

    async fn emit(&self, display: &str, output: &str) -> Result<()> {
        match &self.dest {
            Some(dest) => {
                let target = dest.join(display);
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
                }
                tokio::fs::write(&target, output)
                    .await
                    .with_context(|| format!("Failed to write {}", target.display()))?;
                tracing::debug!("Wrote {}", target.display());
            }
            None => print!("{output}"),
        }
        Ok(())
    }
}

fn render_page(
    path: &Path,
    display: &str,
    engine: &Engine,
    site: Arc<Site>,
    overrides: &Map<String, Value>,
) -> std::result::Result<String, PartialsError> {
    let options = ReadOptions {
        encoding: site.file_read_opts().encoding,
        max_size: None,
    };
    let page = Page::read(path, display, &FsLoader, &options)?;
    page.render(engine, site, overrides)
}

/// Page path relative to the site source when inside it, else as given.
fn display_path(path: &Path, source: &Path) -> String {
    let relative = match (path.canonicalize(), source.canonicalize()) {
        (Ok(path), Ok(source)) => path.strip_prefix(&source).map(Path::to_path_buf).ok(),
        _ => None,
    };
    let shown = relative.unwrap_or_else(|| path.file_name().map_or_else(|| path.to_path_buf(), PathBuf::from));
    shown.to_string_lossy().replace('\\', "/")
}
