//! Configuration file loading for specprune.
//!
//! Discovers and loads `specprune.toml` from the working directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use specprune_core::InsertionPoint;
use specprune_core::settings::{
    DEFAULT_EXTRA_INSTALL_KEYWORDS, DEFAULT_PACKAGES, DEFAULT_SECTION_KINDS,
};
use std::collections::BTreeMap;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "specprune.toml";

/// Top-level configuration from specprune.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecpruneConfig {
    /// What to strip from the primary spec.
    pub prune: PruneConfig,

    /// Where fragments are spliced in.
    pub merge: MergeConfig,

    /// Macro bindings seeded before parsing (override the bootstrap values).
    pub macros: BTreeMap<String, String>,
}

/// Prune section of the config. Lists replace the built-in defaults when present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PruneConfig {
    pub packages: Option<Vec<String>>,
    pub section_kinds: Option<Vec<String>>,
    pub extra_install_keywords: Option<Vec<String>>,
}

/// Merge section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    /// Insert before the last section of this kind.
    pub insert_before_kind: Option<String>,

    /// Insert this many sections before the end.
    pub insert_offset_from_end: Option<usize>,
}

impl MergeConfig {
    fn insertion_point(&self) -> anyhow::Result<Option<InsertionPoint>> {
        match (&self.insert_before_kind, self.insert_offset_from_end) {
            (Some(_), Some(_)) => anyhow::bail!(
                "[merge] insert_before_kind and insert_offset_from_end are mutually exclusive"
            ),
            (Some(kind), None) => Ok(Some(InsertionPoint::BeforeLast(kind.clone()))),
            (None, Some(n)) => Ok(Some(InsertionPoint::FromEnd(n))),
            (None, None) => Ok(None),
        }
    }
}

/// Discover the specprune.toml config file.
///
/// Searches for `specprune.toml` in `dir`.
/// Returns `None` if no config file is found.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a specprune.toml config file.
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<SpecpruneConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<SpecpruneConfig> {
    let config: SpecpruneConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from `dir`, or return default if not found.
pub fn load_or_default(dir: &Utf8Path) -> anyhow::Result<SpecpruneConfig> {
    match discover_config(dir) {
        Some(path) => load_config(&path),
        None => Ok(SpecpruneConfig::default()),
    }
}

/// Merged configuration combining defaults, config file and CLI arguments.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub packages: Vec<String>,
    pub section_kinds: Vec<String>,
    pub extra_install_keywords: Vec<String>,
    pub macros: BTreeMap<String, String>,
    pub insertion: InsertionPoint,
}

/// CLI values layered over the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub packages: Vec<String>,
    pub section_kinds: Vec<String>,
    pub keywords: Vec<String>,
    pub defines: BTreeMap<String, String>,
    pub insertion: Option<InsertionPoint>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: SpecpruneConfig,
}

impl ConfigMerger {
    /// Create a new merger from a loaded config.
    pub fn new(config: SpecpruneConfig) -> Self {
        Self { config }
    }

    /// Merge with CLI arguments.
    ///
    /// CLI lists extend the config (or default) lists, skipping duplicates.
    /// CLI defines and insertion point override the config file.
    pub fn merge_cli(self, cli: &CliOverrides) -> anyhow::Result<MergedConfig> {
        let prune = self.config.prune;
        let packages = extend(prune.packages, DEFAULT_PACKAGES, &cli.packages);
        let section_kinds = extend(prune.section_kinds, DEFAULT_SECTION_KINDS, &cli.section_kinds);
        let extra_install_keywords = extend(
            prune.extra_install_keywords,
            DEFAULT_EXTRA_INSTALL_KEYWORDS,
            &cli.keywords,
        );

        let mut macros = self.config.macros;
        for (k, v) in &cli.defines {
            macros.insert(k.clone(), v.clone());
        }

        let insertion = match &cli.insertion {
            Some(point) => point.clone(),
            None => self.config.merge.insertion_point()?.unwrap_or_default(),
        };

        Ok(MergedConfig {
            packages,
            section_kinds,
            extra_install_keywords,
            macros,
            insertion,
        })
    }
}

fn extend(configured: Option<Vec<String>>, defaults: &[&str], cli: &[String]) -> Vec<String> {
    let mut out =
        configured.unwrap_or_else(|| defaults.iter().map(|s| s.to_string()).collect());
    for item in cli {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

/// Parse `--define` values from NAME=VALUE strings.
pub fn parse_defines(defines: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for entry in defines {
        let mut parts = entry.splitn(2, '=');
        let name = parts
            .next()
            .map(|s| s.trim().trim_start_matches('%'))
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("invalid define '{}': missing name", entry))?;
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            anyhow::bail!("invalid define '{}': bad macro name", entry);
        }
        let value = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("invalid define '{}': missing value", entry))?;
        out.insert(name.to_string(), value.to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_parse_example_config() {
        let contents = r#"
[prune]
packages = ["multus", "sriov"]
section_kinds = ["package", "files"]
extra_install_keywords = ["lib/tuned"]

[merge]
insert_before_kind = "changelog"

[macros]
version = "4.19.0"
"#;

        let config = parse_config(contents).unwrap();
        assert_eq!(
            config.prune.packages,
            Some(vec!["multus".to_string(), "sriov".to_string()])
        );
        assert_eq!(config.merge.insert_before_kind.as_deref(), Some("changelog"));
        assert_eq!(config.macros.get("version").map(String::as_str), Some("4.19.0"));
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        let merged = ConfigMerger::new(config)
            .merge_cli(&CliOverrides::default())
            .unwrap();
        assert_eq!(merged.packages.len(), DEFAULT_PACKAGES.len());
        assert_eq!(merged.section_kinds.len(), DEFAULT_SECTION_KINDS.len());
        assert_eq!(merged.insertion, InsertionPoint::FromEnd(3));
        assert!(merged.macros.is_empty());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = parse_config("[prune]\npackage = [\"x\"]\n").unwrap_err();
        assert!(format!("{err:#}").contains("invalid TOML"));
    }

    #[test]
    fn test_config_lists_replace_defaults_and_cli_extends() {
        let config = parse_config("[prune]\npackages = [\"multus\"]\n").unwrap();
        let cli = CliOverrides {
            packages: vec!["sriov".to_string(), "multus".to_string()],
            ..Default::default()
        };
        let merged = ConfigMerger::new(config).merge_cli(&cli).unwrap();
        assert_eq!(merged.packages, vec!["multus", "sriov"]);
    }

    #[test]
    fn test_cli_overrides_insertion_and_macros() {
        let config = parse_config(
            "[merge]\ninsert_offset_from_end = 1\n[macros]\nversion = \"1.0\"\ncommit = \"abc\"\n",
        )
        .unwrap();
        let cli = CliOverrides {
            defines: parse_defines(&["version=2.0".to_string()]).unwrap(),
            insertion: Some(InsertionPoint::BeforeLast("changelog".to_string())),
            ..Default::default()
        };
        let merged = ConfigMerger::new(config).merge_cli(&cli).unwrap();
        assert_eq!(merged.macros.get("version").map(String::as_str), Some("2.0"));
        assert_eq!(merged.macros.get("commit").map(String::as_str), Some("abc"));
        assert_eq!(
            merged.insertion,
            InsertionPoint::BeforeLast("changelog".to_string())
        );
    }

    #[test]
    fn test_config_insertion_offset() {
        let config = parse_config("[merge]\ninsert_offset_from_end = 1\n").unwrap();
        let merged = ConfigMerger::new(config)
            .merge_cli(&CliOverrides::default())
            .unwrap();
        assert_eq!(merged.insertion, InsertionPoint::FromEnd(1));
    }

    #[test]
    fn test_conflicting_insertion_keys() {
        let config = parse_config(
            "[merge]\ninsert_before_kind = \"changelog\"\ninsert_offset_from_end = 2\n",
        )
        .unwrap();
        let err = ConfigMerger::new(config)
            .merge_cli(&CliOverrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_parse_defines() {
        let parsed =
            parse_defines(&["release=2".to_string(), "%commit = abc".to_string()]).unwrap();
        assert_eq!(parsed.get("release").map(String::as_str), Some("2"));
        assert_eq!(parsed.get("commit").map(String::as_str), Some("abc"));

        let err = parse_defines(&["=1".to_string()]).unwrap_err();
        assert!(err.to_string().contains("missing name"));
        let err = parse_defines(&["release=".to_string()]).unwrap_err();
        assert!(err.to_string().contains("missing value"));
        let err = parse_defines(&["bad name=1".to_string()]).unwrap_err();
        assert!(err.to_string().contains("bad macro name"));
    }

    #[test]
    fn test_discover_config_some_and_none() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        assert!(discover_config(&root).is_none());

        std::fs::write(root.join(CONFIG_FILE_NAME), "").expect("write config");
        assert!(discover_config(&root).is_some());
        assert!(load_or_default(&root).is_ok());
    }
}
