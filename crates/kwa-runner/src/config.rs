use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "kwa.toml";
pub const DEFAULT_EXTENSIONS: [&str; 4] = ["html", "tmpl", "js", "ssjs"];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub audit: AuditConfig,
}

/// `[audit]` table. Relative paths resolve against the directory holding `kwa.toml`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditConfig {
    pub codebase: String,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Rule document path; the embedded default rule set when absent.
    #[serde(default)]
    pub rules: Option<String>,
    #[serde(default = "default_reports_dir")]
    pub reports_dir: String,
    /// Offline JSON citation index.
    #[serde(default)]
    pub citations: Option<String>,
    #[serde(default)]
    pub rules_only: bool,
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_reports_dir() -> String {
    "reports".to_string()
}

impl Config {
    pub fn default_for(codebase: &str) -> Self {
        Self {
            audit: AuditConfig {
                codebase: codebase.to_string(),
                extensions: default_extensions(),
                rules: Some("rules.yaml".to_string()),
                reports_dir: default_reports_dir(),
                citations: None,
                rules_only: true,
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn config_path(root: &Path) -> PathBuf {
        root.join(CONFIG_FILE)
    }

    pub fn codebase_root(&self, base: &Path) -> PathBuf {
        resolve(base, &self.audit.codebase)
    }

    pub fn rules_path(&self, base: &Path) -> Option<PathBuf> {
        self.audit.rules.as_deref().map(|p| resolve(base, p))
    }

    pub fn reports_root(&self, base: &Path) -> PathBuf {
        resolve(base, &self.audit.reports_dir)
    }

    pub fn citations_path(&self, base: &Path) -> Option<PathBuf> {
        self.audit.citations.as_deref().map(|p| resolve(base, p))
    }
}

/// Tilde-expand, then anchor relative paths at `base`.
pub fn resolve(base: &Path, raw: &str) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(raw).to_string());
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn config_roundtrip() {
        let dir = tempdir().unwrap();
        let path = Config::config_path(dir.path());
        let cfg = Config::default_for("site");
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn minimal_file_gets_defaults() {
        let cfg: Config = toml::from_str("[audit]\ncodebase = \"src\"\n").unwrap();
        assert_eq!(cfg.audit.extensions, vec!["html", "tmpl", "js", "ssjs"]);
        assert_eq!(cfg.audit.reports_dir, "reports");
        assert!(cfg.audit.rules.is_none());
        assert!(!cfg.audit.rules_only);
    }

    #[test]
    fn paths_resolve_against_base() {
        let cfg = Config::default_for("site");
        let base = Path::new("/work/project");
        assert_eq!(cfg.codebase_root(base), base.join("site"));
        assert_eq!(cfg.rules_path(base), Some(base.join("rules.yaml")));
        assert_eq!(resolve(base, "/abs/x"), PathBuf::from("/abs/x"));
        assert!(cfg.citations_path(base).is_none());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("kwa.toml")).unwrap_err();
        assert!(err.to_string().starts_with("read "));
    }
}
