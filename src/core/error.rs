//! Error handling for partials
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** so callers can tell a security violation from a
//!    missing file without parsing messages
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`PartialsError`] - every failure the engine and the include directive produce
//! - [`IncludeError`] - the single error surfaced by a failed include, carrying the
//!   original message and the logical include path
//! - [`ErrorContext`] - wrapper that adds details and a suggestion for display
//!
//! # Error Categories
//!
//! - **Parse time**: [`PartialsError::Syntax`] aborts compiling a template
//! - **Render time**: [`PartialsError::Argument`], [`PartialsError::SecurityViolation`],
//!   [`PartialsError::NotFound`], [`PartialsError::Encoding`], [`PartialsError::Template`],
//!   [`PartialsError::DepthExceeded`], [`PartialsError::Io`]
//! - **Startup**: [`PartialsError::Config`]
//!
//! Render-time failures inside an include are always surfaced as
//! [`PartialsError::Include`]; [`IncludeError::root_cause`] recovers the original kind.
//!
//! # Examples
//!
//! ```rust,no_run
//! use partials::core::{user_friendly_error, PartialsError};
//!
//! let error = PartialsError::NotFound {
//!     message: "Included file '_includes/nav.html' not found".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // colored error, details and suggestion on stderr
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library.
pub type Result<T, E = PartialsError> = std::result::Result<T, E>;

/// The main error type for partials operations.
///
/// Message-carrying variants display their message verbatim so the text can be
/// propagated unchanged through [`IncludeError`] wrapping.
#[derive(Error, Debug)]
pub enum PartialsError {
    /// Malformed directive markup, parameter grammar or template syntax.
    #[error("{message}")]
    Syntax {
        /// Human readable description, including the offending markup
        message: String,
    },

    /// Invalid file reference, or a variable file reference that resolves to nothing.
    #[error("{message}")]
    Argument {
        /// Human readable description
        message: String,
    },

    /// Restricted-mode containment check failed.
    #[error("{message}")]
    SecurityViolation {
        /// Human readable description, naming the logical include path
        message: String,
    },

    /// A file or directory that must exist does not.
    #[error("{message}")]
    NotFound {
        /// Human readable description
        message: String,
    },

    /// File content could not be decoded with the configured encoding.
    #[error("{message}")]
    Encoding {
        /// Human readable description
        message: String,
    },

    /// The host template engine failed while rendering.
    #[error("{message}")]
    Template {
        /// Cleaned-up tera error chain
        message: String,
    },

    /// Includes nested deeper than the configured limit.
    #[error("Maximum include depth of {limit} exceeded. Check for an include that includes itself.")]
    DepthExceeded {
        /// The configured limit
        limit: usize,
    },

    /// Filesystem failure other than a missing file.
    #[error("Failed to {operation}: {source}")]
    Io {
        /// What was being attempted, e.g. "read '_includes/nav.html'"
        operation: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Site configuration could not be loaded.
    #[error("Invalid configuration in {}: {message}", path.display())]
    Config {
        /// Configuration file
        path: PathBuf,
        /// Parse or validation failure
        message: String,
    },

    /// A failed include directive.
    #[error(transparent)]
    Include(#[from] IncludeError),
}

impl PartialsError {
    /// The message text to carry when this error is wrapped by an include.
    ///
    /// For a nested include this is the innermost original message, not the
    /// wrapped display text.
    pub fn message(&self) -> String {
        match self {
            PartialsError::Include(inner) => inner.message.clone(),
            other => other.to_string(),
        }
    }

    /// Short category name used in logs and CLI output.
    pub const fn kind(&self) -> &'static str {
        match self {
            PartialsError::Syntax { .. } => "syntax error",
            PartialsError::Argument { .. } => "argument error",
            PartialsError::SecurityViolation { .. } => "security violation",
            PartialsError::NotFound { .. } => "not found",
            PartialsError::Encoding { .. } => "encoding error",
            PartialsError::Template { .. } => "template error",
            PartialsError::DepthExceeded { .. } => "include depth exceeded",
            PartialsError::Io { .. } => "I/O error",
            PartialsError::Config { .. } => "configuration error",
            PartialsError::Include(_) => "include error",
        }
    }
}

/// The error surfaced to the caller when an include directive fails.
///
/// `message` is the original failure's text and `path` is the logical include
/// path (`_includes/<raw file token>`), never an absolute host path.
#[derive(Error, Debug)]
#[error("{message}\n  in {path}")]
pub struct IncludeError {
    message: String,
    path: String,
    #[source]
    source: Box<PartialsError>,
}

impl IncludeError {
    /// Wraps `source` as the failure of the include at logical `path`.
    pub fn new(source: PartialsError, path: impl Into<String>) -> Self {
        Self {
            message: source.message(),
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// The original failure's message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Logical path of the include that failed.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The error this include wrapped, which may itself be an include failure.
    pub fn cause(&self) -> &PartialsError {
        &self.source
    }

    /// The innermost non-include error.
    pub fn root_cause(&self) -> &PartialsError {
        let mut current = self.source.as_ref();
        while let PartialsError::Include(inner) = current {
            current = inner.source.as_ref();
        }
        current
    }

    /// Logical include paths from the outermost include to the failing one.
    pub fn include_chain(&self) -> Vec<&str> {
        let mut chain = vec![self.path.as_str()];
        let mut current = self.source.as_ref();
        while let PartialsError::Include(inner) = current {
            chain.push(inner.path.as_str());
            current = inner.source.as_ref();
        }
        chain
    }
}

/// Error context wrapper that adds details and an actionable suggestion.
#[derive(Debug)]
pub struct ErrorContext {
    /// Headline error message
    pub error: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with only the headline message.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion for CLI display.
///
/// [`PartialsError`] values anywhere in the anyhow chain get tailored advice;
/// other errors are shown with their full chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(err) = error.chain().find_map(|e| e.downcast_ref::<PartialsError>()) {
        let outermost = error.chain().next().is_some_and(|e| e.is::<PartialsError>());
        let headline = if outermost {
            err.to_string()
        } else {
            format!("{error}: {err}")
        };
        return create_error_context(err, headline);
    }

    if let Some(err) = error.chain().find_map(|e| e.downcast_ref::<IncludeError>()) {
        return create_include_context(err, format!("{error:#}"));
    }

    let mut ctx = ErrorContext::new(format!("{error}"));
    let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    if !causes.is_empty() {
        ctx = ctx.with_details(causes.join("\n  caused by: "));
    }
    ctx
}

fn create_error_context(error: &PartialsError, headline: String) -> ErrorContext {
    match error {
        PartialsError::Include(include) => create_include_context(include, headline),
        PartialsError::Config { .. } => ErrorContext::new(headline)
            .with_suggestion("Check the YAML or TOML syntax of the configuration file"),
        other => {
            let ctx = ErrorContext::new(headline);
            match suggestion_for(other) {
                Some(suggestion) => ctx.with_suggestion(suggestion),
                None => ctx,
            }
        }
    }
}

fn create_include_context(error: &IncludeError, headline: String) -> ErrorContext {
    let root = error.root_cause();
    let mut ctx = ErrorContext::new(headline)
        .with_details(format!("{} while including {}", root.kind(), error.include_chain().join(" -> ")));
    if let Some(suggestion) = suggestion_for(root) {
        ctx = ctx.with_suggestion(suggestion);
    }
    ctx
}

fn suggestion_for(error: &PartialsError) -> Option<&'static str> {
    match error {
        PartialsError::Syntax { .. } => {
            Some("Use the form {% include file.ext param='value' %} and quote values containing spaces")
        }
        PartialsError::Argument { .. } => Some(
            "File references may only use letters, digits, '_', '-', '.' and '/' and must not contain './' or '/.'",
        ),
        PartialsError::SecurityViolation { .. } => Some(
            "In safe mode included files must be regular files inside _includes; replace symlinks pointing outside it",
        ),
        PartialsError::NotFound { .. } => {
            Some("Create the file under the _includes directory of the site source")
        }
        PartialsError::Encoding { .. } => {
            Some("Save the file as UTF-8 or set 'encoding: utf-8' in the site configuration")
        }
        PartialsError::DepthExceeded { .. } => {
            Some("Break the include cycle or raise 'max_include_depth' in the site configuration")
        }
        _ => None,
    }
}
