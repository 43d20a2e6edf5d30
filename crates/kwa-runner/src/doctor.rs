use anyhow::{anyhow, Result};
use kwa_citations::JsonCitationIndex;
use kwa_rules::Rules;
use std::path::{Path, PathBuf};

use crate::discover::discover;
use crate::Config;

#[derive(Clone, Debug)]
pub struct DoctorReport {
    pub rules_fingerprint: String,
    pub codebase: PathBuf,
    pub template_files: usize,
    /// Keys in the citation index, when one is configured and the run is not rules-only.
    pub citation_keys: Option<usize>,
}

/// Rules are already compiled by the time this runs; check the rest of the setup.
pub fn doctor(base: &Path, cfg: &Config, rules: &Rules) -> Result<DoctorReport> {
    let codebase = cfg.codebase_root(base);
    if !codebase.is_dir() {
        return Err(anyhow!("codebase root {} does not exist", codebase.display()));
    }
    if cfg.audit.extensions.is_empty() {
        return Err(anyhow!("no template extensions configured"));
    }
    let template_files = discover(&codebase, &cfg.audit.extensions)?.len();

    let citation_keys = match cfg.citations_path(base) {
        Some(path) if !cfg.audit.rules_only => Some(JsonCitationIndex::load(&path)?.len()),
        _ => None,
    };

    Ok(DoctorReport {
        rules_fingerprint: rules.fingerprint().to_string(),
        codebase,
        template_files,
        citation_keys,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reports_fingerprint_and_file_count() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("site")).unwrap();
        std::fs::write(dir.path().join("site/a.html"), "x").unwrap();
        let mut cfg = Config::default_for("site");
        cfg.audit.rules = None;
        let rules = kwa_rules::default_rules().unwrap();
        let report = doctor(dir.path(), &cfg, &rules).unwrap();
        assert_eq!(report.template_files, 1);
        assert_eq!(report.rules_fingerprint.len(), 64);
        assert!(report.citation_keys.is_none());
    }

    #[test]
    fn missing_codebase_fails() {
        let dir = tempdir().unwrap();
        let rules = kwa_rules::default_rules().unwrap();
        let err = doctor(dir.path(), &Config::default_for("nope"), &rules).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn broken_citation_index_fails_when_enrichment_is_on() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("site")).unwrap();
        std::fs::write(dir.path().join("cites.json"), "not json").unwrap();
        let mut cfg = Config::default_for("site");
        cfg.audit.citations = Some("cites.json".into());
        let rules = kwa_rules::default_rules().unwrap();
        assert!(doctor(dir.path(), &cfg, &rules).is_ok());
        cfg.audit.rules_only = false;
        assert!(doctor(dir.path(), &cfg, &rules).is_err());
    }
}
