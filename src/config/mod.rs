//! Configuration for partials.
//!
//! - [`SiteConfig`]: per-site settings read from `_config.yml`, `_config.yaml`
//!   or `_config.toml` in the site source
//! - [`parse_config`]: generic YAML/TOML/JSON loader, also used for `--data` files
//!
//! Command-line flags override values from the file; see [`crate::cli`].

mod parser;
mod site;

pub use parser::{parse_config, parse_config_str, ConfigFormat};
pub use site::{resolve_path, SiteConfig};
