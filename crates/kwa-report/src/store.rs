use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kwa_core::{FileAuditRecord, RunId};
use tracing::info;

use crate::manifest::{RunManifest, FINDINGS_FILE, MANIFEST_FILE, SUMMARY_FILE};
use crate::summary::render_summary;

pub trait ReportStore: Send + Sync {
    fn create_run_dir(&self, run_id: &RunId) -> Result<PathBuf>;
    fn write_findings(&self, run_dir: &Path, records: &[FileAuditRecord]) -> Result<PathBuf>;
    fn write_summary(&self, run_dir: &Path, markdown: &str) -> Result<PathBuf>;
    fn write_manifest(&self, run_dir: &Path, manifest: &RunManifest) -> Result<PathBuf>;
}

/// Writes one directory per run under `root`.
#[derive(Clone)]
pub struct FsReportStore {
    pub root: PathBuf,
}

impl FsReportStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Findings, summary and manifest for one run. Returns the run directory.
    pub fn write_run(&self, manifest: &RunManifest, records: &[FileAuditRecord]) -> Result<PathBuf> {
        let run_dir = self.create_run_dir(&manifest.run_id)?;
        self.write_findings(&run_dir, records)?;
        self.write_summary(&run_dir, &render_summary(records))?;
        self.write_manifest(&run_dir, manifest)?;
        info!(run_dir = %run_dir.display(), files = records.len(), "wrote reports");
        Ok(run_dir)
    }
}

impl ReportStore for FsReportStore {
    fn create_run_dir(&self, run_id: &RunId) -> Result<PathBuf> {
        let dir = self.root.join(run_id.as_str());
        std::fs::create_dir_all(&dir).with_context(|| format!("create report dir {}", dir.display()))?;
        Ok(dir)
    }

    fn write_findings(&self, run_dir: &Path, records: &[FileAuditRecord]) -> Result<PathBuf> {
        let path = run_dir.join(FINDINGS_FILE);
        let f = std::fs::File::create(&path).with_context(|| format!("create {}", path.display()))?;
        let mut w = std::io::BufWriter::new(f);
        for rec in records {
            serde_json::to_writer(&mut w, rec)?;
            w.write_all(b"\n")?;
        }
        w.flush().with_context(|| format!("write findings {}", path.display()))?;
        Ok(path)
    }

    fn write_summary(&self, run_dir: &Path, markdown: &str) -> Result<PathBuf> {
        let path = run_dir.join(SUMMARY_FILE);
        std::fs::write(&path, markdown).with_context(|| format!("write summary {}", path.display()))?;
        Ok(path)
    }

    fn write_manifest(&self, run_dir: &Path, manifest: &RunManifest) -> Result<PathBuf> {
        let path = run_dir.join(MANIFEST_FILE);
        let bytes = serde_json::to_vec_pretty(manifest)?;
        std::fs::write(&path, bytes).with_context(|| format!("write manifest {}", path.display()))?;
        Ok(path)
    }
}
