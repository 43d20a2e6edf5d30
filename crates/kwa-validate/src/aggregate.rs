use std::collections::HashSet;

use kwa_core::{FileAuditRecord, FileId, Finding, KeywordToken, Rollup, StructureRecord};

/// Merge structure and keyword results into one record. Structure findings come
/// first; a later finding with the same code at the same location is dropped.
pub fn aggregate(
    file: FileId,
    structure: StructureRecord,
    structure_findings: Vec<Finding>,
    keywords: Vec<KeywordToken>,
    keyword_findings: Vec<Finding>,
) -> FileAuditRecord {
    let findings = dedupe(structure_findings.into_iter().chain(keyword_findings));
    let rollup = rollup(&findings);
    FileAuditRecord {
        file,
        structure,
        keywords,
        findings,
        rollup,
    }
}

pub fn dedupe(findings: impl IntoIterator<Item = Finding>) -> Vec<Finding> {
    let mut seen = HashSet::new();
    findings
        .into_iter()
        .filter(|f| seen.insert((f.code, f.location)))
        .collect()
}

pub fn rollup(findings: &[Finding]) -> Rollup {
    findings
        .iter()
        .map(|f| f.severity)
        .max()
        .map(Rollup::from_severity)
        .unwrap_or(Rollup::Clean)
}
