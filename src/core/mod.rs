//! Core types shared by every partials module.
//!
//! Currently this is the error system: the [`PartialsError`] taxonomy, the
//! [`IncludeError`] surfaced by failed includes and the CLI-facing
//! [`ErrorContext`].

pub mod error;

pub use error::{user_friendly_error, ErrorContext, IncludeError, PartialsError, Result};
