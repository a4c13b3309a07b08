//! Generic configuration parsing utilities.
//!
//! [`parse_config`] reads a configuration or data file and deserializes it into
//! any `DeserializeOwned` type. The format is picked from the file extension:
//!
//! | Extension | Parser |
//! |-----------|--------|
//! | `.yml`, `.yaml` | `serde_yaml` |
//! | `.toml` | `toml` |
//! | `.json` | `serde_json` |
//!
//! Error messages carry the file path and whether reading or parsing failed:
//!
//! ```text
//! Failed to parse config file: /site/_config.yml
//! Caused by:
//!     safe: invalid type: string "yes", expected a boolean at line 2 column 7
//! ```

use anyhow::{bail, Context, Result};
use std::path::Path;

/// File formats understood by [`parse_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    /// Detects the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yml" | "yaml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse a configuration file into the specified type.
///
/// # Errors
///
/// - the extension is not one of `yml`, `yaml`, `toml`, `json`
/// - the file cannot be read
/// - the content is not valid for the format or does not match `T`
///
/// # Examples
///
/// ```rust,no_run
/// use partials::config::parse_config;
/// use serde::Deserialize;
/// use std::path::Path;
///
/// #[derive(Deserialize)]
/// struct Data { title: String }
///
/// # fn example() -> anyhow::Result<()> {
/// let data: Data = parse_config(Path::new("_data/site.yml"))?;
/// println!("{}", data.title);
/// # Ok(())
/// # }
/// ```
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let Some(format) = ConfigFormat::from_path(path) else {
        bail!(
            "Unsupported config file format: {}. Expected a .yml, .yaml, .toml or .json file",
            path.display()
        );
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config_str(&content, format)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse configuration text in a known format.
pub fn parse_config_str<T>(content: &str, format: ConfigFormat) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let config = match format {
        ConfigFormat::Yaml => {
            // An empty YAML document deserializes as null; treat it as an empty mapping.
            if content.trim().is_empty() {
                serde_yaml::from_str("{}")?
            } else {
                serde_yaml::from_str(content)?
            }
        }
        ConfigFormat::Toml => toml::from_str(content)?,
        ConfigFormat::Json => serde_json::from_str(content)?,
    };
    Ok(config)
}
