mod common;
use crate::common::{init_tracing, with_timeout, SiteFixture};

use std::sync::Arc;

use sitedag::dag::TaskRegistry;
use sitedag::engine::{Executor, TaskContext};
use sitedag::errors::BuildError;
use sitedag::tasks::compile::compile;
use sitedag::tasks::copy::{copy_assets, copy_fonts};
use sitedag::tasks::lint::{lint, LintKind};
use sitedag::tasks::register_builtin_tasks;
use sitedag::tasks::scripts::build_scripts;
use sitedag::tasks::styles::build_styles;
use sitedag::types::Environment;

#[tokio::test]
async fn styles_flatten_nesting_and_keep_input_order() {
    init_tracing();
    let site = SiteFixture::standard();
    site.write("src/styles/b.css", ".z { appearance: none }\n");
    let cfg = site.config_with(Environment::Production, |raw| raw.styles.source_maps = false);

    build_styles(&cfg).await.unwrap();

    let css = site.read("static/index.min.css");
    assert!(css.contains(".x .y{color:red}"), "{css}");
    assert!(css.find(".x .y").unwrap() < css.find(".z").unwrap());
    assert!(css.contains("-webkit-appearance:none"));
    assert!(!site.exists("static/index.min.css.map"));
}

#[tokio::test]
async fn styles_emit_source_map_sidecar() {
    init_tracing();
    let site = SiteFixture::standard();
    let cfg = site.config(Environment::Development);

    build_styles(&cfg).await.unwrap();

    let css = site.read("static/index.min.css");
    assert!(css.contains("sourceMappingURL=index.min.css.map"));
    let map: serde_json::Value = serde_json::from_str(&site.read("static/index.min.css.map")).unwrap();
    assert_eq!(map["version"], 3);
    assert_eq!(map["sources"][0], "src/styles/a.css");
}

#[tokio::test]
async fn production_scripts_are_not_larger() {
    init_tracing();
    let site = SiteFixture::standard();
    site.write(
        "src/scripts/util.js",
        "/* helpers */\nconst greet = (name) => {\n    return `hi ${ name }`;\n};\n",
    );

    let dev = site.config_with(Environment::Development, |raw| raw.scripts.source_maps = false);
    build_scripts(&dev).await.unwrap();
    let dev_out = site.read("static/index.min.js");

    let prod = site.config_with(Environment::Production, |raw| raw.scripts.source_maps = false);
    build_scripts(&prod).await.unwrap();
    let prod_out = site.read("static/index.min.js");

    assert!(prod_out.len() <= dev_out.len());
    assert!(prod_out.contains("function add(a,b){"));
    assert!(prod_out.contains("`hi ${name}`"));
    assert!(!prod_out.contains("helpers"));
}

#[tokio::test]
async fn compile_renders_helpers_and_partials() {
    init_tracing();
    let site = SiteFixture::standard();
    let cfg = site.config(Environment::Production);

    assert!(compile(&cfg).await.unwrap());

    let html = site.read("static/index.html");
    assert!(html.contains("<h1>HI</h1>"), "{html}");
    assert!(html.contains("<footer>2024</footer>"));

    // Unchanged output is not rewritten.
    assert!(!compile(&cfg).await.unwrap());
}

#[tokio::test]
async fn compile_reports_missing_partial_and_bad_context() {
    init_tracing();
    let site = SiteFixture::standard();
    site.write("src/templates/index.hbs", "{{> nope}}");
    let cfg = site.config(Environment::Production);
    assert!(matches!(compile(&cfg).await, Err(BuildError::Template(_))));

    let site = SiteFixture::standard();
    site.write("src/templates/test.json", "{ not json");
    let cfg = site.config(Environment::Production);
    assert!(matches!(compile(&cfg).await, Err(BuildError::Json(_))));
    assert!(!site.exists("static/index.html"));
}

#[tokio::test]
async fn fonts_copy_only_allowed_extensions() {
    init_tracing();
    let site = SiteFixture::standard();
    site.write("src/fonts/sub/b.WOFF", "font");
    let cfg = site.config(Environment::Production);

    assert_eq!(copy_fonts(&cfg).await.unwrap(), 2);

    assert!(site.exists("static/fonts/a.woff2"));
    assert!(site.exists("static/fonts/sub/b.WOFF"));
    assert!(!site.exists("static/fonts/notes.txt"));
}

#[tokio::test]
async fn assets_keep_paths_below_the_pattern_base() {
    init_tracing();
    let site = SiteFixture::standard();
    site.write("src/images/logo.png", "png");
    let cfg = site.config(Environment::Production);

    assert_eq!(copy_assets(&cfg).await.unwrap(), 1);
    assert!(site.exists("static/assets/images/logo.png"));
}

#[tokio::test]
async fn missing_source_directory_is_source_not_found() {
    init_tracing();
    let site = SiteFixture::empty();
    let cfg = site.config(Environment::Production);

    let err = build_styles(&cfg).await.unwrap_err();
    assert!(matches!(err, BuildError::SourceNotFound { .. }), "{err}");
    assert!(!site.exists("static"));
}

#[tokio::test]
async fn empty_match_writes_nothing() {
    init_tracing();
    let site = SiteFixture::empty();
    std::fs::create_dir_all(site.path("src/styles")).unwrap();
    let cfg = site.config(Environment::Production);

    assert!(build_styles(&cfg).await.unwrap().is_empty());
    assert!(!site.exists("static/index.min.css"));
}

#[tokio::test]
async fn production_default_builds_every_output() {
    init_tracing();
    let site = SiteFixture::standard();
    let cfg = Arc::new(site.config(Environment::Production));
    let mut registry = TaskRegistry::new();
    register_builtin_tasks(&mut registry, cfg);
    registry.validate().unwrap();
    let exec = Executor::new(Arc::new(registry), TaskContext::default());

    let summary = with_timeout(exec.run("default")).await.unwrap();

    assert_eq!(summary.succeeded.last().map(String::as_str), Some("default"));
    for out in [
        "static/index.min.css",
        "static/index.min.js",
        "static/index.html",
        "static/fonts/a.woff2",
    ] {
        assert!(site.exists(out), "{out} missing");
    }
}

#[tokio::test]
async fn builtin_lint_reports_and_blocks_when_configured() {
    init_tracing();
    let site = SiteFixture::standard();
    site.write("src/styles/broken.css", "a { color: red\n");
    site.write("src/scripts/broken.js", "function f() {\n  return (1;\n}\n");

    let cfg = site.config(Environment::Production);
    let styles = lint(&cfg, LintKind::Styles).await.unwrap();
    assert_eq!(styles.len(), 1);
    assert_eq!(styles[0].file, "src/styles/broken.css");
    let scripts = lint(&cfg, LintKind::Scripts).await.unwrap();
    assert!(scripts.iter().all(|f| f.file == "src/scripts/broken.js"));
    assert!(!scripts.is_empty());

    // Non-blocking: findings are only logged.
    let mut registry = TaskRegistry::new();
    register_builtin_tasks(&mut registry, Arc::new(cfg));
    let exec = Executor::new(Arc::new(registry), TaskContext::default());
    assert!(exec.run("lint").await.is_ok());

    let blocking = site.config_with(Environment::Production, |raw| raw.lint.blocking = true);
    let mut registry = TaskRegistry::new();
    register_builtin_tasks(&mut registry, Arc::new(blocking));
    let exec = Executor::new(Arc::new(registry), TaskContext::default());
    let err = exec.run("stylelint").await.unwrap_err();
    assert!(matches!(err.root_cause(), BuildError::LintFailed { findings: 1, .. }));
}
