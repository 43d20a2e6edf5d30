use kwa_core::{FileAuditRecord, Rollup, RunId};
use serde::{Deserialize, Serialize};

pub const FINDINGS_FILE: &str = "findings.jsonl";
pub const SUMMARY_FILE: &str = "summary.md";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Names the run and the exact rule set that produced a report directory.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunManifest {
    pub run_id: RunId,
    pub rules_fingerprint: String,
    pub file_count: usize,
    pub worst_rollup: Rollup,
    pub rules_only: bool,
    pub codebase: String,
}

impl RunManifest {
    pub fn for_run(
        run_id: RunId,
        rules_fingerprint: impl Into<String>,
        codebase: impl Into<String>,
        records: &[FileAuditRecord],
        rules_only: bool,
    ) -> Self {
        Self {
            run_id,
            rules_fingerprint: rules_fingerprint.into(),
            file_count: records.len(),
            worst_rollup: kwa_core::worst_rollup(records),
            rules_only,
            codebase: codebase.into(),
        }
    }
}
