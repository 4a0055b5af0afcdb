//! Variable resolution from the deployment descriptor.
//!
//! The descriptor (a `docker-compose.yml`) is not parsed as YAML. It is
//! scanned for `MARIADB_*=...` and `WORDPRESS_*=...` assignments, which is
//! enough to pick up the `environment:` entries of both services regardless
//! of how the rest of the file is laid out.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

/// Prefixes of the descriptor keys that feed the variable context.
pub const RECOGNIZED_PREFIXES: [&str; 2] = ["MARIADB_", "WORDPRESS_"];

/// One assignment per line, optionally indented and behind a YAML `- ` marker.
static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    let prefixes = RECOGNIZED_PREFIXES.join("|");
    Regex::new(&format!(
        r"(?m)^[ \t]*(?:-[ \t]*)?((?:{prefixes})[A-Za-z0-9_]*=[^\r\n]*)"
    ))
    .expect("assignment pattern is valid")
});

const DEFAULTS: &[(&str, &str)] = &[
    ("mariadb_host", "mariadb"),
    ("mariadb_port_number", "3306"),
    ("mariadb_user", "wordpress"),
    ("mariadb_password", "my-password"),
    ("mariadb_database", "wordpress"),
    ("wordpress_database_name", "wordpress"),
    ("wordpress_database_user", "wordpress"),
    ("wordpress_database_password", "my-password"),
    ("wordpress_table_prefix", "wp_"),
    ("wordpress_username", "user"),
    ("wordpress_password", "bitnami"),
    ("wordpress_email", "user@example.com"),
    ("wordpress_blog_name", "My Bitnami Project"),
    ("wordpress_url", "http://localhost"),
];

/// Resolved key/value mapping used to fill in template placeholders.
///
/// Keys are always lower-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableContext {
    vars: BTreeMap<String, String>,
}

impl Default for VariableContext {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl VariableContext {
    /// The hard-coded default credentials and identifiers.
    pub fn with_defaults() -> Self {
        let vars = DEFAULTS
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Insert a value, lower-casing the key. Returns the previous value.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) -> Option<String> {
        self.vars.insert(key.to_lowercase(), value.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Access details shown to the operator once provisioning is done.
    pub fn credentials(&self) -> Credentials {
        let lookup = |key: &str| match self.get(key) {
            Some(value) => value.to_owned(),
            None => String::new(),
        };
        Credentials {
            site_url: lookup("wordpress_url"),
            admin_user: lookup("wordpress_username"),
            admin_password: lookup("wordpress_password"),
            admin_email: lookup("wordpress_email"),
            database_user: lookup("mariadb_user"),
            database_password: lookup("mariadb_password"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub site_url: String,
    pub admin_user: String,
    pub admin_password: String,
    pub admin_email: String,
    pub database_user: String,
    pub database_password: String,
}

impl std::fmt::Display for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Site:     {}", self.site_url)?;
        writeln!(f, "Admin:    {} / {}", self.admin_user, self.admin_password)?;
        writeln!(f, "Email:    {}", self.admin_email)?;
        write!(
            f,
            "Database: {} / {}",
            self.database_user, self.database_password
        )
    }
}

/// Extract `(lower-cased key, value)` pairs from descriptor text, in file order.
///
/// Each match is split on its first `=`; the value is taken verbatim.
pub fn parse_descriptor(text: &str) -> Vec<(String, String)> {
    ASSIGNMENT
        .captures_iter(text)
        .filter_map(|caps| {
            let assignment = caps.get(1)?.as_str();
            let (key, value) = assignment.split_once('=')?;
            Some((key.to_lowercase(), value.to_owned()))
        })
        .collect()
}

/// Build the variable context: defaults overridden by descriptor assignments.
pub fn resolve_context(descriptor_path: &Path) -> Result<VariableContext, ContextError> {
    let text = std::fs::read_to_string(descriptor_path).map_err(|e| ContextError::Read {
        path: descriptor_path.to_path_buf(),
        source: e,
    })?;

    let mut context = VariableContext::with_defaults();
    let assignments = parse_descriptor(&text);
    tracing::debug!(
        path = %descriptor_path.display(),
        matches = assignments.len(),
        "scanned deployment descriptor"
    );
    for (key, value) in assignments {
        context.insert(&key, value);
    }

    Ok(context)
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("failed to read deployment descriptor {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ContextError {
    pub fn kind(&self) -> crate::FailureKind {
        crate::FailureKind::Configuration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPOSE: &str = r#"version: '2'
services:
  mariadb:
    image: 'bitnami/mariadb:10.1'
    environment:
      - MARIADB_USER=bn_wordpress
      - MARIADB_DATABASE=bitnami_wordpress
      - ALLOW_EMPTY_PASSWORD=yes
  wordpress:
    image: 'bitnami/wordpress:5-custom'
    environment:
      - WORDPRESS_DATABASE_USER=bn_wordpress
      - WORDPRESS_DATABASE_NAME=bitnami_wordpress
      - WORDPRESS_BLOG_NAME=Louis's blog = fun
"#;

    #[test]
    fn parse_picks_only_recognized_prefixes() {
        let pairs = parse_descriptor(COMPOSE);
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "mariadb_user",
                "mariadb_database",
                "wordpress_database_user",
                "wordpress_database_name",
                "wordpress_blog_name",
            ]
        );
    }

    #[test]
    fn parse_splits_on_first_equals_only() {
        let pairs = parse_descriptor(COMPOSE);
        let blog = pairs
            .iter()
            .find(|(k, _)| k == "wordpress_blog_name")
            .unwrap();
        assert_eq!(blog.1, "Louis's blog = fun");
    }

    #[test]
    fn parse_accepts_bare_assignments() {
        let pairs = parse_descriptor("MARIADB_PASSWORD=s3cret\r\nWORDPRESS_URL=http://x\n");
        assert_eq!(
            pairs,
            vec![
                ("mariadb_password".to_owned(), "s3cret".to_owned()),
                ("wordpress_url".to_owned(), "http://x".to_owned()),
            ]
        );
    }

    #[test]
    fn parse_ignores_keys_not_at_line_start() {
        let pairs = parse_descriptor("  command: echo MARIADB_USER=nope\n");
        assert!(pairs.is_empty(), "got: {pairs:?}");
    }

    #[test]
    fn defaults_contain_database_user() {
        let ctx = VariableContext::with_defaults();
        assert_eq!(ctx.get("mariadb_user"), Some("wordpress"));
        assert_eq!(ctx.get("wordpress_url"), Some("http://localhost"));
    }

    #[test]
    fn insert_lowercases_key() {
        let mut ctx = VariableContext::with_defaults();
        let previous = ctx.insert("MARIADB_USER", "custom");
        assert_eq!(previous.as_deref(), Some("wordpress"));
        assert_eq!(ctx.get("mariadb_user"), Some("custom"));
        assert_eq!(ctx.get("MARIADB_USER"), None);
    }

    #[test]
    fn credentials_reflect_context() {
        let mut ctx = VariableContext::with_defaults();
        ctx.insert("wordpress_password", "hunter2");
        let creds = ctx.credentials();
        assert_eq!(creds.admin_user, "user");
        assert_eq!(creds.admin_password, "hunter2");
        assert!(creds.to_string().contains("user / hunter2"));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parsed_keys_are_lowercase(text in "\\PC{0,200}") {
                for (key, _) in parse_descriptor(&text) {
                    prop_assert_eq!(key.clone(), key.to_lowercase());
                }
            }

            #[test]
            fn resolution_is_idempotent(
                lines in proptest::collection::vec(
                    ("(MARIADB|WORDPRESS|OTHER)_[A-Z_]{1,10}", "[a-z0-9 =]{0,12}"),
                    0..8,
                ),
            ) {
                let text: String = lines
                    .iter()
                    .map(|(key, value)| format!("      - {key}={value}\n"))
                    .collect();

                let pairs = parse_descriptor(&text);
                prop_assert_eq!(&pairs, &parse_descriptor(&text));

                let mut once = VariableContext::with_defaults();
                for (key, value) in &pairs {
                    once.insert(key, value.clone());
                }
                let mut twice = once.clone();
                for (key, value) in &pairs {
                    twice.insert(key, value.clone());
                }
                prop_assert_eq!(once, twice);
            }

            #[test]
            fn recognized_assignment_always_found(
                suffix in "[A-Z][A-Z_]{0,12}",
                value in "[a-zA-Z0-9 =.:/-]{0,20}",
            ) {
                let line = format!("      - MARIADB_{suffix}={value}\n");
                let pairs = parse_descriptor(&line);
                prop_assert_eq!(pairs.len(), 1);
                prop_assert_eq!(&pairs[0].0, &format!("mariadb_{}", suffix.to_lowercase()));
                prop_assert_eq!(&pairs[0].1, &value);
            }
        }
    }
}
