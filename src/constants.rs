//! Constants shared across the include directive, the host engine and the CLI.
//!
//! Keeping the include-root name and the canonical syntax example in one place
//! keeps error messages and path handling consistent between modules.

/// Name the include directive is registered under.
pub const INCLUDE_TAG: &str = "include";

/// Directory, relative to the site source, that all includes resolve against.
pub const INCLUDES_DIR: &str = "_includes";

/// Variable bound in the fragment scope to the parsed directive parameters.
pub const INCLUDE_VARIABLE: &str = "include";

/// Canonical directive syntax quoted by syntax and argument errors.
pub const SYNTAX_EXAMPLE: &str = "{% include file.ext param='value' param2='value' %}";

/// Default maximum nesting of include directives.
///
/// A fragment that includes itself, directly or through a chain, stops here
/// instead of exhausting the stack.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 10;

/// Configuration file names probed in the site source, in priority order.
pub const CONFIG_FILE_NAMES: &[&str] = &["_config.yml", "_config.yaml", "_config.toml"];

/// Prefix of an encoding name that asks the reader to strip a UTF-8 byte order mark.
pub const BOM_PREFIX: &str = "bom|";
