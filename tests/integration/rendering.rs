//! Include rendering through the host engine.

use anyhow::Result;
use partials::config::SiteConfig;
use partials::core::PartialsError;
use partials::include::{parse_params, IncludeTag};
use partials::test_utils::{init_test_logging, TestSite};
use serde_json::json;

use crate::common::include_error;

const HEADER: &str =
    "<h1>{{ include.title }}</h1>{% if include.subtitle %}<h2>{{ include.subtitle }}</h2>{% endif %}";

#[test]
fn test_header_with_title_and_subtitle() -> Result<()> {
    init_test_logging(None);
    let site = TestSite::new().include("header.html", HEADER);
    let engine = site.engine();
    let mut ctx = site.context_with(json!({"pageTitle": "World"}));

    let output = engine.render_str(r#"{% include header.html title="Hello" subtitle=pageTitle %}"#, &mut ctx)?;
    assert_eq!(output, "<h1>Hello</h1><h2>World</h2>");
    Ok(())
}

#[test]
fn test_header_parameter_mapping() -> Result<()> {
    let site = TestSite::new();
    let ctx = site.context_with(json!({"pageTitle": "World"}));

    let tag = IncludeTag::parse(r#"header.html title="Hello" subtitle=pageTitle"#)?;
    let params = parse_params(tag.params().unwrap_or_default(), &ctx)?;
    assert_eq!(serde_json::Value::Object(params), json!({"title": "Hello", "subtitle": "World"}));
    Ok(())
}

#[test]
fn test_no_params_means_no_include_binding() -> Result<()> {
    let site = TestSite::new().include("probe.html", "{% if include %}bound{% else %}unbound{% endif %}");
    assert_eq!(site.render("{% include probe.html %}")?, "unbound");
    assert_eq!(site.render("{% include probe.html a='1' %}")?, "bound");
    Ok(())
}

#[test]
fn test_round_trip_matches_direct_render() -> Result<()> {
    let fragment = "{% for item in items %}<li>{{ item | upper }}</li>{% endfor %} by {{ author.name }}";
    let site = TestSite::new().include("list.html", fragment);
    let engine = site.engine();
    let variables = json!({"items": ["a", "b"], "author": {"name": "Ada"}});

    let included = engine.render_str("{% include list.html %}", &mut site.context_with(variables.clone()))?;
    let direct = engine.render_str(fragment, &mut site.context_with(variables))?;
    assert_eq!(included, direct);
    assert_eq!(included, "<li>A</li><li>B</li> by Ada");
    Ok(())
}

#[test]
fn test_include_inside_loop_and_conditional() -> Result<()> {
    let site = TestSite::new().include("item.html", "[{{ include.n }}]");
    let engine = site.engine();
    let mut ctx = site.context_with(json!({"nums": [1, 2, 3], "show": false}));

    let output = engine.render_str(
        "{% for n in nums %}{% include item.html n=n %}{% endfor %}{% if show %}{% include missing.html %}{% endif %}",
        &mut ctx,
    )?;
    assert_eq!(output, "[1][2][3]");
    Ok(())
}

#[test]
fn test_include_in_raw_block_is_literal() -> Result<()> {
    let site = TestSite::new();
    let output = site.render("{% raw %}{% include nav.html %}{% endraw %}")?;
    assert_eq!(output, "{% include nav.html %}");
    Ok(())
}

#[test]
fn test_nested_includes_see_their_own_params() -> Result<()> {
    let site = TestSite::new()
        .include("outer.html", "<{{ include.name }}>{% include inner.html name='inner' %}</{{ include.name }}>")
        .include("inner.html", "({{ include.name }})");
    assert_eq!(site.render("{% include outer.html name='outer' %}")?, "<outer>(inner)</outer>");
    Ok(())
}

#[test]
fn test_subdirectory_include() -> Result<()> {
    let site = TestSite::new().include("partials/footer.html", "footer");
    assert_eq!(site.render("{% include partials/footer.html %}")?, "footer");
    Ok(())
}

#[test]
fn test_leading_slash_stays_under_include_root() -> Result<()> {
    let site = TestSite::new().include("nav.html", "nav");
    assert_eq!(site.render("{% include /nav.html %}")?, "nav");
    Ok(())
}

#[test]
fn test_missing_variable_file_reference() {
    let site = TestSite::new();
    let err = include_error(site.render("{% include {{page}} %}").unwrap_err());
    assert!(matches!(err.root_cause(), PartialsError::Argument { .. }));
    assert!(err.message().contains("page"));
}

#[test]
fn test_nested_failure_message_and_chain() {
    let site = TestSite::new()
        .include("a.html", "{% include b.html %}")
        .include("b.html", "{{ nope.deeper }}");

    let err = include_error(site.render("{% include a.html %}").unwrap_err());
    assert_eq!(err.path(), "_includes/a.html");
    assert_eq!(err.include_chain(), vec!["_includes/a.html", "_includes/b.html"]);
    assert!(matches!(err.root_cause(), PartialsError::Template { .. }));
    assert_eq!(err.message(), err.root_cause().to_string());
}

#[test]
fn test_scopes_released_after_failure() {
    let site = TestSite::new().include("bad.html", "{% include ../up.html %}");
    let engine = site.engine();
    let mut ctx = site.context();

    assert!(engine.render_str("{% include bad.html %}", &mut ctx).is_err());
    assert_eq!(ctx.nesting(), 0);
}

#[test]
fn test_depth_limit_from_config() {
    let config = SiteConfig {
        max_include_depth: 2,
        ..SiteConfig::default()
    };
    let site = TestSite::new()
        .with_config(config)
        .include("a.html", "a{% include b.html %}")
        .include("b.html", "b{% include c.html %}")
        .include("c.html", "c");

    let err = include_error(site.render("{% include a.html %}").unwrap_err());
    assert!(matches!(err.root_cause(), PartialsError::DepthExceeded { limit: 2 }));

    let site = TestSite::new()
        .with_config(SiteConfig {
            max_include_depth: 3,
            ..SiteConfig::default()
        })
        .include("a.html", "a{% include b.html %}")
        .include("b.html", "b{% include c.html %}")
        .include("c.html", "c");
    assert_eq!(site.render("{% include a.html %}").unwrap(), "abc");
}

#[test]
fn test_max_include_size() {
    let site = TestSite::new()
        .with_config(SiteConfig {
            max_include_size: Some(4),
            ..SiteConfig::default()
        })
        .include("small.html", "tiny")
        .include("large.html", "far too large");

    assert_eq!(site.render("{% include small.html %}").unwrap(), "tiny");
    let err = include_error(site.render("{% include large.html %}").unwrap_err());
    assert!(err.message().contains("too large"));
}

#[test]
fn test_configured_encoding_strips_bom() {
    let site = TestSite::new().with_config(SiteConfig {
        encoding: Some("utf-8".to_string()),
        ..SiteConfig::default()
    });
    std::fs::write(site.includes_dir().join("bom.html"), b"\xEF\xBB\xBFbody").unwrap();
    assert_eq!(site.render("{% include bom.html %}").unwrap(), "body");
}

#[test]
fn test_invalid_utf8_is_encoding_error() {
    let site = TestSite::new();
    std::fs::write(site.includes_dir().join("bin.html"), [b'a', 0xFF, b'b']).unwrap();
    let err = include_error(site.render("{% include bin.html %}").unwrap_err());
    assert!(matches!(err.root_cause(), PartialsError::Encoding { .. }));
}

#[test]
fn test_parse_time_syntax_error_aborts_template() {
    let site = TestSite::new().include("nav.html", "nav");
    let err = site.engine().parse("before {% include nav.html title=\"unterminated %} after").unwrap_err();
    assert!(matches!(err, PartialsError::Syntax { .. }));
    assert!(err.to_string().contains("{% include file.ext param='value' param2='value' %}"));
}
