//! Conversion of tera errors into [`PartialsError`].
//!
//! Tera reports errors as a chain ("Failed to render 'x'" → "Variable `y` not
//! found ..."). The chain is flattened into one message and the internal
//! template name is replaced by the name the caller gave the template.

use crate::core::PartialsError;

/// Name every compiled fragment is registered under inside its own tera instance.
///
/// It carries no extension so tera never enables HTML autoescaping.
pub(crate) const FRAGMENT_NAME: &str = "__partials_fragment";

/// Flatten a tera error chain into a readable message.
pub fn format_tera_error(error: &tera::Error, template_name: &str) -> String {
    use std::error::Error;

    let mut all_messages = vec![error.to_string()];
    let mut current_error: Option<&dyn Error> = error.source();
    while let Some(err) = current_error {
        all_messages.push(err.to_string());
        current_error = err.source();
    }

    let quoted_internal = format!("'{FRAGMENT_NAME}'");
    let quoted_name = format!("'{template_name}'");

    let mut messages = Vec::new();
    for msg in all_messages {
        let cleaned = msg
            .replace(&format!("Failed to render {quoted_internal}"), "Template rendering failed")
            .replace(
                &format!("Failed to parse {quoted_internal}"),
                &format!("Template syntax error in {quoted_name}"),
            )
            .replace(&quoted_internal, &quoted_name)
            .replace(FRAGMENT_NAME, template_name)
            .trim()
            .to_string();

        if !cleaned.is_empty() && cleaned != "Template rendering failed" && !messages.contains(&cleaned) {
            messages.push(cleaned);
        }
    }

    if messages.is_empty() {
        format!("Template error in {quoted_name}")
    } else {
        messages.join("\n  → ")
    }
}

/// Tera compile failure: always a syntax error.
pub(crate) fn syntax_error(error: &tera::Error, template_name: &str) -> PartialsError {
    PartialsError::Syntax {
        message: format_tera_error(error, template_name),
    }
}

/// Tera render failure.
pub(crate) fn render_error(error: &tera::Error, template_name: &str) -> PartialsError {
    PartialsError::Template {
        message: format_tera_error(error, template_name),
    }
}
