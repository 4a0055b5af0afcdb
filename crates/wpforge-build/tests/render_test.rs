use std::path::{Path, PathBuf};

use tempfile::TempDir;
use wpforge_build::render::{RenderError, RenderOptions, TemplateJob, TemplateRenderer, render_jobs};
use wpforge_core::{FailureKind, RenderConfig, VariableContext};

/// Templates shipped at the workspace root.
fn shipped_templates() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates")
}

fn renderer(tmp: &TempDir) -> TemplateRenderer {
    let config = RenderConfig {
        templates_dir: shipped_templates(),
        ..Default::default()
    };
    TemplateRenderer::new(&config, tmp.path())
}

fn render_all(options: RenderOptions) -> (TempDir, Vec<PathBuf>) {
    let tmp = TempDir::new().unwrap();
    let jobs = render_jobs(&options, Path::new("wordpress"));
    let written = renderer(&tmp)
        .render(&jobs, &VariableContext::with_defaults(), &options)
        .unwrap();
    (tmp, written)
}

fn read_all(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| std::fs::read_to_string(p).unwrap())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Multisite flags ──

#[test]
fn single_site_output_has_no_multisite() {
    let (_tmp, written) = render_all(RenderOptions::default());

    assert_eq!(written.len(), 2);
    assert!(!read_all(&written).contains("MULTISITE"));
}

#[test]
fn subdomain_without_multisite_changes_nothing() {
    let (_tmp, plain) = render_all(RenderOptions::default());
    let (_tmp2, sub) = render_all(RenderOptions {
        multisite: false,
        subdomain: true,
    });

    assert_eq!(read_all(&plain), read_all(&sub));
}

#[test]
fn multisite_output_declares_multisite() {
    let (tmp, written) = render_all(RenderOptions {
        multisite: true,
        subdomain: false,
    });

    assert_eq!(written.len(), 3);
    let config = std::fs::read_to_string(tmp.path().join("wordpress/wp-config.php")).unwrap();
    assert!(config.contains("define( 'MULTISITE', true );"));
    assert!(config.contains("define( 'SUBDOMAIN_INSTALL', false );"));

    let htaccess = std::fs::read_to_string(tmp.path().join("wordpress/.htaccess")).unwrap();
    assert!(htaccess.contains("RewriteRule ^([_0-9a-zA-Z-]+/)?wp-admin$"));
}

#[test]
fn subdomain_marks_subdomain_install() {
    let (tmp, _) = render_all(RenderOptions {
        multisite: true,
        subdomain: true,
    });

    let config = std::fs::read_to_string(tmp.path().join("wordpress/wp-config.php")).unwrap();
    assert!(config.contains("define( 'SUBDOMAIN_INSTALL', true );"));
    assert!(!config.contains("define( 'SUBDOMAIN_INSTALL', false );"));

    let htaccess = std::fs::read_to_string(tmp.path().join("wordpress/.htaccess")).unwrap();
    assert!(htaccess.contains("RewriteRule ^wp-admin$ wp-admin/ [R=301,L]"));
}

// ── Context substitution ──

#[test]
fn variables_are_substituted() {
    let tmp = TempDir::new().unwrap();
    let mut vars = VariableContext::with_defaults();
    vars.insert("wordpress_database_user", "bn_wordpress");
    vars.insert("wordpress_blog_name", "Louis's Blog");

    let jobs = render_jobs(&RenderOptions::default(), Path::new("wordpress"));
    renderer(&tmp)
        .render(&jobs, &vars, &RenderOptions::default())
        .unwrap();

    let config = std::fs::read_to_string(tmp.path().join("wordpress/wp-config.php")).unwrap();
    assert!(config.contains("define( 'DB_USER', 'bn_wordpress' );"));
    assert!(config.contains("define( 'DB_HOST', 'mariadb:3306' );"));

    let script = std::fs::read_to_string(tmp.path().join("wp_automate.php")).unwrap();
    assert!(script.contains("stripslashes(\"Louis's Blog\")"));
    assert!(!script.contains("{{"));
}

// ── Failures ──

#[test]
fn missing_template_aborts_remaining_jobs() {
    let tmp = TempDir::new().unwrap();
    let templates = tmp.path().join("templates");
    std::fs::create_dir_all(&templates).unwrap();
    std::fs::write(templates.join("first.j2"), "one {{ mariadb_user }}").unwrap();
    std::fs::write(templates.join("third.j2"), "three").unwrap();

    let renderer = TemplateRenderer::new(&RenderConfig::default(), tmp.path());
    let jobs = vec![
        TemplateJob::new("first", "out/first.txt"),
        TemplateJob::new("second", "out/second.txt"),
        TemplateJob::new("third", "out/third.txt"),
    ];
    let err = renderer
        .render(
            &jobs,
            &VariableContext::with_defaults(),
            &RenderOptions::default(),
        )
        .unwrap_err();

    assert!(matches!(err, RenderError::TemplateMissing { ref name, .. } if name == "second"));
    assert_eq!(err.kind(), FailureKind::TemplateMissing);
    // Output written before the failure stays; later jobs never run.
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("out/first.txt")).unwrap(),
        "one wordpress"
    );
    assert!(!tmp.path().join("out/third.txt").exists());
}

#[test]
fn undefined_variable_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let templates = tmp.path().join("templates");
    std::fs::create_dir_all(&templates).unwrap();
    std::fs::write(templates.join("bad.j2"), "{{ not_a_known_key }}").unwrap();

    let renderer = TemplateRenderer::new(&RenderConfig::default(), tmp.path());
    let err = renderer
        .render(
            &[TemplateJob::new("bad", "bad.txt")],
            &VariableContext::with_defaults(),
            &RenderOptions::default(),
        )
        .unwrap_err();

    assert!(matches!(err, RenderError::Render { .. }));
    assert_eq!(err.kind(), FailureKind::Configuration);
    assert!(!tmp.path().join("bad.txt").exists());
}
