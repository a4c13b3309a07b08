//! Path traversal, hidden segments and symlink containment.

use partials::core::PartialsError;
use partials::include::{include_root, join_include, validate_file_name, validate_path};
use partials::test_utils::TestSite;
use serde_json::json;

use crate::common::include_error;

#[test]
fn test_file_name_filter() {
    assert!(validate_file_name("a/b-c_2.txt", "a/b-c_2.txt").is_ok());
    for rejected in ["../secret", "a/../b", "/.hidden", "a?b"] {
        let err = validate_file_name(rejected, rejected).unwrap_err();
        assert!(matches!(err, PartialsError::Argument { .. }), "{rejected}");
    }
}

#[test]
fn test_traversal_rejected_before_path_checks() {
    // `../outside.html` exists, so only the name filter can stop it.
    let site = TestSite::new().file("outside.html", "outside").safe(false);
    let err = include_error(site.render("{% include ../outside.html %}").unwrap_err());
    assert!(matches!(err.root_cause(), PartialsError::Argument { .. }));
    assert!(err.message().contains("../outside.html"));
}

#[test]
fn test_variable_reference_is_filtered_too() {
    let site = TestSite::new().file("secret.txt", "secret");
    let engine = site.engine();
    let mut ctx = site.context_with(json!({"target": "../secret.txt"}));

    let err = include_error(engine.render_str("{% include {{target}} %}", &mut ctx).unwrap_err());
    assert!(matches!(err.root_cause(), PartialsError::Argument { .. }));
    assert!(err.message().contains("{{target}}"), "raw token should be quoted: {}", err.message());
}

#[test]
fn test_hidden_files_are_rejected() {
    let site = TestSite::new().include(".secret", "hidden").include("dir/.env", "hidden");
    for markup in ["{% include /.secret %}", "{% include dir/.env %}"] {
        let err = include_error(site.render(markup).unwrap_err());
        assert!(matches!(err.root_cause(), PartialsError::Argument { .. }), "{markup}");
    }
}

#[test]
fn test_error_messages_hide_host_paths() {
    let site = TestSite::new().safe(true);
    let host = site.path().display().to_string();

    let err = site.render("{% include absent.html %}").unwrap_err();
    let shown = err.to_string();
    assert!(!shown.contains(&host), "host path leaked: {shown}");
    assert!(shown.contains("_includes/absent.html"));
}

#[test]
fn test_security_violation_is_not_downgraded() {
    let site = TestSite::new().safe(true);
    let err = include_error(site.render("{% include absent.html %}").unwrap_err());
    assert!(matches!(err.root_cause(), PartialsError::SecurityViolation { .. }));
}

#[cfg(unix)]
mod symlinks {
    use super::*;
    use std::os::unix::fs::symlink;

    #[test]
    fn test_symlink_escaping_root_rejected_in_safe_mode() {
        let site = TestSite::new().file("secret.txt", "top secret").safe(true);
        symlink(site.path().join("secret.txt"), site.includes_dir().join("leak.html")).unwrap();

        // The literal path lies inside the include root; its target does not.
        let base = include_root(site.path()).unwrap();
        let path = join_include(&base, "leak.html");
        assert!(path.starts_with(&base));
        assert!(matches!(
            validate_path(&path, &base, true).unwrap_err(),
            PartialsError::SecurityViolation { .. }
        ));

        let err = include_error(site.render("{% include leak.html %}").unwrap_err());
        assert!(matches!(err.root_cause(), PartialsError::SecurityViolation { .. }));
        assert_eq!(
            err.message(),
            "The included file '_includes/leak.html' should exist and should not be a symlink"
        );
    }

    #[test]
    fn test_symlink_followed_when_not_restricted() {
        let site = TestSite::new().file("shared.html", "shared");
        symlink(site.path().join("shared.html"), site.includes_dir().join("shared.html")).unwrap();
        assert_eq!(site.render("{% include shared.html %}").unwrap(), "shared");
    }

    #[test]
    fn test_symlinked_directory_escape() {
        let site = TestSite::new().file("private/keys.html", "keys").safe(true);
        symlink(site.path().join("private"), site.includes_dir().join("linked")).unwrap();

        let err = include_error(site.render("{% include linked/keys.html %}").unwrap_err());
        assert!(matches!(err.root_cause(), PartialsError::SecurityViolation { .. }));
    }

    #[test]
    fn test_symlink_within_root_allowed_in_safe_mode() {
        let site = TestSite::new().include("real.html", "real").safe(true);
        symlink(site.includes_dir().join("real.html"), site.includes_dir().join("alias.html")).unwrap();
        assert_eq!(site.render("{% include alias.html %}").unwrap(), "real");
    }
}
