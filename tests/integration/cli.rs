//! End-to-end tests of the `partials render` command.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

use crate::common::run_partials;

fn site() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("_includes")).unwrap();
    fs::write(temp.path().join("_includes/header.html"), "<h1>{{ include.title }}</h1>").unwrap();
    temp
}

fn partials(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("partials").unwrap();
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("PARTIALS_SOURCE");
    cmd
}

#[test]
fn test_render_to_stdout() {
    let temp = site();
    fs::write(
        temp.path().join("index.html"),
        "---\ntitle: Home\n---\n{% include header.html title=page.title %}\n",
    )
    .unwrap();

    partials(&temp)
        .args(["render", "index.html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<h1>Home</h1>"));
}

#[test]
fn test_render_to_dest() {
    let temp = site();
    fs::create_dir(temp.path().join("blog")).unwrap();
    fs::write(temp.path().join("index.html"), "{% include header.html title=\"Index\" %}").unwrap();
    fs::write(temp.path().join("blog/post.html"), "{% include header.html title='Post' %}").unwrap();

    partials(&temp)
        .args(["render", "--dest", "_site", "index.html", "blog/post.html"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Rendered 2 page(s)"));

    assert_eq!(fs::read_to_string(temp.path().join("_site/index.html")).unwrap(), "<h1>Index</h1>");
    assert_eq!(fs::read_to_string(temp.path().join("_site/blog/post.html")).unwrap(), "<h1>Post</h1>");
}

#[test]
fn test_failed_include_exits_non_zero() {
    let temp = site();
    fs::write(temp.path().join("ok.html"), "fine").unwrap();
    fs::write(temp.path().join("broken.html"), "{% include missing.html %}").unwrap();

    let output = run_partials(temp.path(), &["render", "ok.html", "broken.html"]).unwrap();
    output
        .assert_failure()
        .assert_stdout_contains("fine")
        .assert_stderr_contains("Failed to render broken.html")
        .assert_stderr_contains("_includes/missing.html")
        .assert_stderr_contains("1 of 2 page(s) failed to render");
    assert!(!output.stderr.contains(&temp.path().display().to_string()));
}

#[test]
fn test_var_flag_sets_variables() {
    let temp = site();
    fs::write(temp.path().join("index.html"), "{% include header.html title=env %}").unwrap();

    partials(&temp)
        .args(["render", "--var", "env=production", "index.html"])
        .assert()
        .success()
        .stdout("<h1>production</h1>");
}

#[test]
fn test_invalid_var_is_a_usage_error() {
    let temp = site();
    partials(&temp)
        .args(["render", "--var", "oops", "index.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected KEY=VALUE"));
}

#[test]
fn test_data_file_variables() {
    let temp = site();
    fs::write(temp.path().join("data.yml"), "nav:\n  title: Menu\n").unwrap();
    fs::write(temp.path().join("index.html"), "{% include header.html title=nav.title %}").unwrap();

    partials(&temp)
        .args(["render", "--data", "data.yml", "index.html"])
        .assert()
        .success()
        .stdout("<h1>Menu</h1>");
}

#[test]
fn test_safe_flag_rejects_missing_include() {
    let temp = site();
    fs::write(temp.path().join("index.html"), "{% include absent.html %}").unwrap();

    partials(&temp)
        .args(["render", "--safe", "index.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "The included file '_includes/absent.html' should exist and should not be a symlink",
        ));
}

#[test]
fn test_config_file_sets_source_and_site_variables() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("site/_includes")).unwrap();
    fs::write(temp.path().join("site/_includes/title.html"), "{{ site.title }}").unwrap();
    fs::write(temp.path().join("site/index.html"), "{% include title.html %}").unwrap();
    fs::write(temp.path().join("partials.yml"), "source: site\ntitle: My Blog\n").unwrap();

    partials(&temp)
        .args(["--config", "partials.yml", "render", "site/index.html"])
        .assert()
        .success()
        .stdout("My Blog");
}

#[test]
fn test_config_depth_limit_applies() {
    let temp = site();
    fs::write(temp.path().join("_config.yml"), "max_include_depth: 1\n").unwrap();
    fs::write(temp.path().join("_includes/outer.html"), "{% include inner.html %}").unwrap();
    fs::write(temp.path().join("_includes/inner.html"), "inner").unwrap();
    fs::write(temp.path().join("index.html"), "{% include outer.html %}").unwrap();

    partials(&temp)
        .args(["render", "index.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("_includes/inner.html"));
}

#[test]
fn test_missing_page_is_reported() {
    let temp = site();
    let output = run_partials(temp.path(), &["render", "nope.html"]).unwrap();
    output.assert_failure().assert_stderr_contains("nope.html");
}

#[test]
fn test_help_lists_render() {
    let temp = site();
    partials(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("render"));
}
