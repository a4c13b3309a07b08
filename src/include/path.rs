//! File reference resolution and include-root containment.
//!
//! Every included file must resolve to a path under `<source>/_includes`.
//! Containment is enforced in two layers:
//!
//! 1. [`validate_file_name`] filters the reference itself before any path is
//!    built: only `[A-Za-z0-9_/.-]` is allowed, and no `./` or `/.` sequence,
//!    which rules out parent segments and hidden files in every mode.
//! 2. [`validate_path`] checks the joined path on disk. In restricted mode the
//!    canonical path must lie strictly inside the include root, which rejects
//!    symlinks pointing anywhere else.
//!
//! Error messages name the logical path (`_includes/<file>`), never the
//! absolute host path.

use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::constants::{INCLUDES_DIR, SYNTAX_EXAMPLE};
use crate::core::{PartialsError, Result};
use crate::templating::RenderContext;

fn variable_reference() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{([\w\-\.]+)\}\}").unwrap_or_else(|e| panic!("invalid variable reference pattern: {e}"))
    })
}

/// Name of the `{{variable}}` referenced by a file token, if any.
pub fn variable_name(token: &str) -> Option<&str> {
    variable_reference().captures(token).and_then(|captures| captures.get(1)).map(|m| m.as_str())
}

/// Resolves a file token that may hold a `{{variable}}` reference.
///
/// Without a reference the token is returned unchanged. With one, the whole
/// token is replaced by the variable's value: strings verbatim, numbers and
/// booleans in their textual form.
///
/// # Errors
///
/// [`PartialsError::Argument`] when the variable is unbound or null, or holds
/// an array or object.
pub fn resolve_file_reference(token: &str, context: &RenderContext) -> Result<String> {
    let Some(name) = variable_name(token) else {
        return Ok(token.to_string());
    };

    match context.get(name) {
        None | Some(Value::Null) => Err(PartialsError::Argument {
            message: format!("No variable {name} was found in include tag"),
        }),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(value @ (Value::Number(_) | Value::Bool(_))) => Ok(value.to_string()),
        Some(_) => Err(PartialsError::Argument {
            message: format!("Variable {name} in include tag must be a string, number or boolean"),
        }),
    }
}

/// Rejects file references with characters or sequences outside the allowed set.
///
/// `raw_token` is the token as written in the directive and is what the error
/// quotes.
pub fn validate_file_name(file: &str, raw_token: &str) -> Result<()> {
    let valid_chars = !file.is_empty()
        && file.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'/' | b'.' | b'-'));

    if !valid_chars || file.contains("./") || file.contains("/.") {
        return Err(PartialsError::Argument {
            message: format!(
                "Invalid syntax for include tag. File contains invalid characters or sequences:\n\n\t{raw_token}\n\nValid syntax:\n\n\t{SYNTAX_EXAMPLE}\n"
            ),
        });
    }
    Ok(())
}

/// The include root for a site source: `canonical(source)/_includes`.
pub fn include_root(source: &Path) -> Result<PathBuf> {
    let source = source.canonicalize().map_err(|_| PartialsError::NotFound {
        message: format!("Site source directory '{}' not found", source.display()),
    })?;
    Ok(source.join(INCLUDES_DIR))
}

/// Joins a validated file reference onto the include root.
///
/// Leading slashes are stripped so the reference cannot replace the root.
pub fn join_include(base_dir: &Path, file: &str) -> PathBuf {
    base_dir.join(file.trim_start_matches('/'))
}

/// Checks that `path` is readable from `base_dir`.
///
/// With `restricted` set, the canonical form of `path` must exist and lie
/// strictly inside `base_dir`, compared component by component. `base_dir` is
/// taken as given, so a symlinked include root is rejected too. Otherwise
/// `path` only has to exist.
///
/// # Errors
///
/// [`PartialsError::SecurityViolation`] for a containment failure in
/// restricted mode; [`PartialsError::NotFound`] for a missing file when not
/// restricted.
pub fn validate_path(path: &Path, base_dir: &Path, restricted: bool) -> Result<()> {
    if restricted {
        let contained = path
            .canonicalize()
            .is_ok_and(|real| real != base_dir && real.starts_with(base_dir));
        if !contained {
            tracing::debug!("Rejected include outside of {}: {}", base_dir.display(), path.display());
            return Err(PartialsError::SecurityViolation {
                message: format!(
                    "The included file '{}' should exist and should not be a symlink",
                    logical_path(path, base_dir)
                ),
            });
        }
    }

    if !path.exists() {
        return Err(PartialsError::NotFound {
            message: format!("Included file '{}' not found", logical_path(path, base_dir)),
        });
    }
    Ok(())
}

/// `path` relative to the parent of `base_dir`, e.g. `_includes/nav.html`.
fn logical_path(path: &Path, base_dir: &Path) -> String {
    let logical = base_dir
        .parent()
        .and_then(|parent| path.strip_prefix(parent).ok())
        .map_or_else(|| Path::new(INCLUDES_DIR).to_path_buf(), Path::to_path_buf);
    logical.to_string_lossy().replace('\\', "/")
}
