use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use kwa_core::Citation;
use serde::{Deserialize, Serialize};

use crate::CitationSource;

/// File-backed citation index: a JSON object mapping lookup keys
/// (`%asset_name%`, `%globals_asset_file_contents:<id>%`) to excerpts.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonCitationIndex {
    pub entries: BTreeMap<String, Vec<Citation>>,
}

impl JsonCitationIndex {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("read citation index {}", path.display()))?;
        let idx: Self =
            serde_json::from_slice(&bytes).with_context(|| format!("parse citation index {}", path.display()))?;
        Ok(idx)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn insert(&mut self, key: impl Into<String>, citation: Citation) {
        self.entries.entry(key.into()).or_default().push(citation);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CitationSource for JsonCitationIndex {
    fn lookup(&self, key: &str) -> Result<Vec<Citation>> {
        Ok(self.entries.get(key).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{enrich, NoCitations};
    use kwa_core::{FileAuditRecord, FileId, Finding, FindingCode, KeywordToken, Location, Rollup, TokenVerdict};
    use tempfile::tempdir;

    fn cite(title: &str) -> Citation {
        Citation {
            title: title.into(),
            source: "matrix-docs/keywords.md".into(),
            excerpt: "Prints the asset name.".into(),
        }
    }

    fn token(raw: &str, key: &str, line: usize, verdict: TokenVerdict) -> KeywordToken {
        KeywordToken {
            raw: raw.into(),
            offset: line * 100,
            line,
            normalized: raw.into(),
            lookup_key: key.into(),
            modifiers: vec![],
            verdict,
            citations: vec![],
        }
    }

    fn record() -> FileAuditRecord {
        let unknown = token("%asset_nam%", "%asset_nam%", 4, TokenVerdict::Unknown);
        FileAuditRecord {
            file: FileId::from_str("a.html"),
            structure: Default::default(),
            findings: vec![
                Finding::new(FindingCode::MissingIife),
                Finding::new(FindingCode::UnknownKeyword).at(unknown.location()),
            ],
            keywords: vec![token("%asset_name%", "%asset_name%", 2, TokenVerdict::Valid), unknown],
            rollup: Rollup::Error,
        }
    }

    struct Failing;

    impl CitationSource for Failing {
        fn lookup(&self, key: &str) -> Result<Vec<Citation>> {
            anyhow::bail!("index offline for {key}")
        }
    }

    #[test]
    fn index_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cites").join("index.json");
        let mut idx = JsonCitationIndex::default();
        idx.insert("%asset_name%", cite("asset_name"));
        idx.save(&path).unwrap();
        let idx2 = JsonCitationIndex::load(&path).unwrap();
        assert_eq!(idx2.len(), 1);
        assert_eq!(idx2.lookup("%asset_name%").unwrap(), vec![cite("asset_name")]);
        assert!(idx2.lookup("%missing%").unwrap().is_empty());
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempdir().unwrap();
        let err = JsonCitationIndex::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(format!("{err:#}").contains("read citation index"));
    }

    #[test]
    fn enrich_attaches_to_tokens_and_unknown_findings() {
        let mut idx = JsonCitationIndex::default();
        idx.insert("%asset_name%", cite("asset_name"));
        idx.insert("%asset_nam%", cite("did you mean asset_name"));

        let mut rec = record();
        let before = rec.clone();
        enrich(&mut rec, &idx);

        assert_eq!(rec.keywords[0].citations, vec![cite("asset_name")]);
        assert_eq!(rec.keywords[1].citations, vec![cite("did you mean asset_name")]);
        assert!(rec.findings[0].citations.is_empty());
        assert_eq!(rec.findings[1].citations, vec![cite("did you mean asset_name")]);
        assert_eq!(rec.rollup, before.rollup);
        assert_eq!(rec.keywords[1].verdict, TokenVerdict::Unknown);
        assert_eq!(rec.findings[1].severity, before.findings[1].severity);
    }

    #[test]
    fn enrich_ignores_unrelated_locations() {
        let mut idx = JsonCitationIndex::default();
        idx.insert("%asset_nam%", cite("x"));
        let mut rec = record();
        rec.findings[1].location = Some(Location { line: 99, offset: 0 });
        enrich(&mut rec, &idx);
        assert!(rec.findings[1].citations.is_empty());
        assert_eq!(rec.keywords[1].citations, vec![cite("x")]);
    }

    #[test]
    fn failing_or_empty_sources_leave_the_record_unchanged() {
        let mut rec = record();
        enrich(&mut rec, &Failing);
        assert_eq!(rec, record());
        enrich(&mut rec, &NoCitations);
        assert_eq!(rec, record());
    }
}
