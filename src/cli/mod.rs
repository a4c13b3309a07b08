//! Command-line interface for partials.
//!
//! # Available Commands
//!
//! - `render` - Render pages of a site, resolving `{% include %}` directives
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - Debug logging
//! - `--quiet` / `-q` - Errors only
//! - `--config` / `-c` - Site configuration file to use instead of discovery
//!
//! `RUST_LOG`, when set, takes precedence over both verbosity flags.
//!
//! # Usage Examples
//!
//! ```bash
//! # Render a page to stdout
//! partials render --source site site/index.html
//!
//! # Render several pages into an output directory, in restricted mode
//! partials render --safe --dest _site site/index.html site/about.html
//!
//! # Provide extra variables
//! partials render --var title=Home --data data.yml site/index.html
//! ```

mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub use render::RenderCommand;

/// Runtime configuration derived from global CLI flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Explicit site configuration file.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Installs the global tracing subscriber, writing to stderr.
    ///
    /// Does nothing if a subscriber is already installed.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "partials",
    about = "Render site templates with {% include %} directives",
    version,
    long_about = "partials renders tera templates extended with an include directive that \
                  loads fragments from the site's _includes directory, with path \
                  traversal and symlink checks."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Site configuration file (default: `_config.yml`, `_config.yaml` or
    /// `_config.toml` in the site source).
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render pages of a site.
    ///
    /// See [`RenderCommand`] for options.
    Render(RenderCommand),
}

impl Cli {
    /// Builds the configuration from the flags and runs the command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translates global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: log_level.to_string(),
            config_path: self.config.clone(),
        }
    }

    /// Runs the command with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Render(cmd) => cmd.execute(config.config_path).await,
        }
    }
}
