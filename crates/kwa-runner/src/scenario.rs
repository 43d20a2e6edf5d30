use std::path::Path;

use anyhow::{Context, Result};
use kwa_core::{worst_rollup, FileAuditRecord, FindingCode, Rollup};
use serde::Deserialize;

use crate::runner::{exit_code, Runner};
use crate::Config;

#[derive(Debug, Deserialize)]
pub struct ScenarioExpected {
    pub scenario_id: String,
    #[serde(default)]
    pub rules_only: bool,
    pub worst_rollup: Rollup,
    pub exit_code: u8,
    pub files: Vec<ScenarioExpectedFile>,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioExpectedFile {
    pub file: String,
    pub rollup: Rollup,
    pub codes: Vec<FindingCode>,
}

#[derive(Debug)]
pub struct ScenarioResult {
    pub records: Vec<FileAuditRecord>,
    pub worst_rollup: Rollup,
    pub exit_code: u8,
}

impl ScenarioResult {
    pub fn codes(&self, file: &str) -> Option<Vec<FindingCode>> {
        self.records
            .iter()
            .find(|r| r.file.as_str() == file)
            .map(|r| r.findings.iter().map(|f| f.code).collect())
    }
}

pub fn load_expected(dir: &Path) -> Result<ScenarioExpected> {
    let p = dir.join("expected.yaml");
    let s = std::fs::read_to_string(&p).with_context(|| format!("read expected.yaml: {}", p.display()))?;
    let exp: ScenarioExpected = serde_yaml::from_str(&s).with_context(|| "parse expected.yaml")?;
    Ok(exp)
}

/// Run the default rule set over `<dir>/codebase` without writing reports.
pub fn run_scenario(dir: &Path, rules_only: bool) -> Result<ScenarioResult> {
    let mut cfg = Config::default_for("codebase");
    cfg.audit.rules = None;
    cfg.audit.rules_only = rules_only;
    let runner = Runner::from_config(dir.to_path_buf(), cfg)?;
    let records = runner.scan()?;
    let worst = worst_rollup(&records);
    Ok(ScenarioResult {
        records,
        worst_rollup: worst,
        exit_code: exit_code(worst),
    })
}
