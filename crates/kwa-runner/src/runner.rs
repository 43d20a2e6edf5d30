use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use kwa_citations::{enrich, CitationSource, JsonCitationIndex, NoCitations};
use kwa_core::{FileAuditRecord, Rollup, RunId};
use kwa_report::{FsReportStore, RunManifest};
use kwa_rules::{default_rules, Rules, DEFAULT_RULES_YAML};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::discover::{discover, read_input, Input};
use crate::doctor::{doctor, DoctorReport};
use crate::Config;

pub const EXIT_OK: u8 = 0;
pub const EXIT_FINDINGS: u8 = 1;
pub const EXIT_FATAL: u8 = 2;

pub struct Runner {
    /// Directory that relative config paths resolve against.
    pub base: PathBuf,
    pub cfg: Config,
    pub rules: Arc<Rules>,
    pub citations: Box<dyn CitationSource>,
    pub reports: FsReportStore,
}

/// Result of one audit run.
#[derive(Debug)]
pub struct AuditOutcome {
    pub manifest: RunManifest,
    pub records: Vec<FileAuditRecord>,
    pub report_dir: Option<PathBuf>,
}

impl AuditOutcome {
    pub fn worst(&self) -> Rollup {
        self.manifest.worst_rollup
    }

    pub fn exit_code(&self) -> u8 {
        exit_code(self.worst())
    }
}

pub fn exit_code(worst: Rollup) -> u8 {
    if worst.is_error() {
        EXIT_FINDINGS
    } else {
        EXIT_OK
    }
}

/// Compile the rule document at `path`, or the embedded defaults.
pub fn load_rules(path: Option<&Path>) -> Result<Rules> {
    match path {
        Some(p) => {
            let rules = Rules::load(p).with_context(|| format!("load rules {}", p.display()))?;
            info!(path = %p.display(), fingerprint = rules.fingerprint(), "loaded rules");
            Ok(rules)
        }
        None => default_rules().context("compile default rules"),
    }
}

impl Runner {
    /// Open the project rooted at `base`, which must hold a `kwa.toml`.
    pub fn open(base: PathBuf) -> Result<Self> {
        let cfg_path = Config::config_path(&base);
        if !cfg_path.exists() {
            return Err(anyhow!("{} not found; run `kwa init` first", cfg_path.display()));
        }
        let cfg = Config::load_from(&cfg_path)?;
        Self::from_config(base, cfg)
    }

    pub fn from_config(base: PathBuf, cfg: Config) -> Result<Self> {
        let rules = load_rules(cfg.rules_path(&base).as_deref())?;
        let citations: Box<dyn CitationSource> = match cfg.citations_path(&base) {
            Some(path) if !cfg.audit.rules_only => {
                let idx = JsonCitationIndex::load(&path)?;
                info!(path = %path.display(), keys = idx.len(), "loaded citation index");
                Box::new(idx)
            }
            Some(_) => {
                debug!("rules-only run, citation index not loaded");
                Box::new(NoCitations)
            }
            None => Box::new(NoCitations),
        };
        let reports = FsReportStore::new(cfg.reports_root(&base));
        Ok(Self {
            base,
            cfg,
            rules: Arc::new(rules),
            citations,
            reports,
        })
    }

    /// Write a default `kwa.toml` and `rules.yaml` into `base` unless present.
    /// Returns the files that were created.
    pub fn init(base: &Path, codebase: &str) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(base).with_context(|| format!("create {}", base.display()))?;
        let mut created = Vec::new();
        let cfg_path = Config::config_path(base);
        if !cfg_path.exists() {
            Config::default_for(codebase).save_to(&cfg_path)?;
            created.push(cfg_path);
        }
        let rules_path = base.join("rules.yaml");
        if !rules_path.exists() {
            std::fs::write(&rules_path, DEFAULT_RULES_YAML)
                .with_context(|| format!("write {}", rules_path.display()))?;
            created.push(rules_path);
        }
        Ok(created)
    }

    pub fn doctor(&self) -> Result<DoctorReport> {
        doctor(&self.base, &self.cfg, &self.rules)
    }

    pub fn rules_only(&self) -> bool {
        self.cfg.audit.rules_only
    }

    pub fn codebase_root(&self) -> PathBuf {
        self.cfg.codebase_root(&self.base)
    }

    /// Validate one decoded or undecodable input. Never fails.
    pub fn audit_input(&self, input: Input) -> FileAuditRecord {
        let mut record = match input {
            Input::Source(source) => kwa_validate::audit_source(&source, &self.rules),
            Input::Unreadable { file, reason } => {
                warn!(file = %file, reason = %reason, "unreadable file");
                kwa_validate::unreadable(file, reason)
            }
        };
        if !self.rules_only() {
            enrich(&mut record, self.citations.as_ref());
        }
        debug!(file = %record.file, findings = record.findings.len(), rollup = record.rollup.as_str(), "audited");
        record
    }

    /// One record per path, in input order.
    pub fn audit_files(&self, root: &Path, files: &[PathBuf]) -> Vec<FileAuditRecord> {
        files
            .par_iter()
            .map(|path| self.audit_input(read_input(root, path)))
            .collect()
    }

    /// Discover and validate the configured codebase without writing reports.
    pub fn scan(&self) -> Result<Vec<FileAuditRecord>> {
        let root = self.codebase_root();
        let files = discover(&root, &self.cfg.audit.extensions)?;
        info!(root = %root.display(), files = files.len(), "discovered templates");
        Ok(self.audit_files(&root, &files))
    }

    /// Validate individual files given on the command line. Identifiers are the paths as given.
    pub fn check(&self, paths: &[PathBuf]) -> Vec<FileAuditRecord> {
        self.audit_files(Path::new(""), paths)
    }

    /// Full run: scan, then write findings, summary and manifest.
    pub fn audit(&self) -> Result<AuditOutcome> {
        let run_id = RunId::new();
        let records = self.scan()?;
        let manifest = RunManifest::for_run(
            run_id,
            self.rules.fingerprint(),
            self.codebase_root().display().to_string(),
            &records,
            self.rules_only(),
        );
        let report_dir = self.reports.write_run(&manifest, &records)?;
        info!(
            run_id = %manifest.run_id,
            files = manifest.file_count,
            worst = manifest.worst_rollup.as_str(),
            "audit complete"
        );
        Ok(AuditOutcome {
            manifest,
            records,
            report_dir: Some(report_dir),
        })
    }
}
