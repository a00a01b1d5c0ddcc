//! Plugin options
//!
//! Options are usually embedded in a build manifest under `[options]`, but can
//! also be read from a standalone TOML file.

use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::Deserialize;

/// Marker prefix on remote references that point back into the current build
const INTERNAL_REFERENCE_PREFIX: &str = "internal ";

/// Options of the delegate modules plugin.
///
/// Unknown keys are rejected rather than ignored, so a wider federation config
/// (exposes, shared, filename, ...) must be narrowed to these fields before it
/// is handed over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DelegateOptions {
    /// Log every attach/detach decision
    pub debug: bool,
    /// Name of the chunk that must carry the runtime bootstrap
    pub runtime: Option<String>,
    /// Name of an additional chunk that receives delegate closures
    pub container: Option<String>,
    /// Remote name to reference string, e.g. `"internal ./src/shared.js"`
    pub remotes: IndexMap<String, String>,
}

impl DelegateOptions {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).context("Failed to parse delegate options")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file {}", path.display()))?;
        Self::from_toml_str(&source)
            .with_context(|| format!("Invalid options file {}", path.display()))
    }

    /// Module identities that count as delegates for this build
    pub fn known_delegates(&self) -> FxHashSet<String> {
        self.remotes
            .values()
            .map(|remote| normalize_remote(remote).to_owned())
            .collect()
    }
}

/// Strip the internal-reference marker from a remote reference
pub fn normalize_remote(remote: &str) -> &str {
    remote
        .strip_prefix(INTERNAL_REFERENCE_PREFIX)
        .unwrap_or(remote)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_defaults() {
        let options = DelegateOptions::from_toml_str("").expect("empty options should parse");
        assert_eq!(options, DelegateOptions::default());
        assert!(!options.debug);
        assert!(options.known_delegates().is_empty());
    }

    #[test]
    fn test_known_delegates_strip_internal_marker() {
        let options = DelegateOptions::from_toml_str(
            r#"
            runtime = "webpack-runtime"
            container = "remoteEntry"

            [remotes]
            shop = "internal ./src/shop-delegate.js"
            cart = "./src/cart-delegate.js"
            "#,
        )
        .expect("options should parse");

        let mut known: Vec<_> = options.known_delegates().into_iter().collect();
        known.sort();
        assert_eq!(
            known,
            vec![
                "./src/cart-delegate.js".to_owned(),
                "./src/shop-delegate.js".to_owned()
            ]
        );
        assert_eq!(options.runtime.as_deref(), Some("webpack-runtime"));
        assert_eq!(options.container.as_deref(), Some("remoteEntry"));
    }

    #[test]
    fn test_normalize_only_strips_leading_marker() {
        assert_eq!(normalize_remote("internal a.js"), "a.js");
        assert_eq!(normalize_remote("lib/internal a.js"), "lib/internal a.js");
        assert_eq!(normalize_remote("internal internal a.js"), "internal a.js");
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let err = DelegateOptions::from_toml_str("runtim = \"main\"")
            .expect_err("typo in option name should be rejected");
        assert!(format!("{err:#}").contains("unknown field"));
    }

    #[test]
    fn test_load_reports_path() {
        let err = DelegateOptions::load(Path::new("/nonexistent/delegates.toml"))
            .expect_err("missing file should fail");
        assert!(err.to_string().contains("/nonexistent/delegates.toml"));
    }
}
