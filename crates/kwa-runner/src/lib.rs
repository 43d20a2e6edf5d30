pub mod config;
pub mod discover;
pub mod doctor;
pub mod runner;
pub mod scenario;

pub use config::*;
pub use discover::*;
pub use doctor::*;
pub use runner::*;

#[cfg(test)]
mod scenario_tests {
    use super::scenario::*;
    use kwa_core::{FindingCode, Rollup};
    use std::path::{Path, PathBuf};

    fn dir(id: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/scenarios").join(id)
    }

    fn run(id: &str) -> ScenarioResult {
        let p = dir(id);
        let exp = load_expected(&p).unwrap();
        assert_eq!(exp.scenario_id, id);
        let res = run_scenario(&p, exp.rules_only).unwrap();

        assert_eq!(res.records.len(), exp.files.len(), "{id}: one record per file");
        for (rec, want) in res.records.iter().zip(&exp.files) {
            assert_eq!(rec.file.as_str(), want.file, "{id}: discovery order");
            assert_eq!(rec.rollup, want.rollup, "{id}: {}", want.file);
            let codes: Vec<_> = rec.findings.iter().map(|f| f.code).collect();
            assert_eq!(codes, want.codes, "{id}: {}", want.file);
        }
        assert_eq!(res.worst_rollup, exp.worst_rollup);
        assert_eq!(res.exit_code, exp.exit_code);
        res
    }

    #[test]
    fn scenario_sc01_clean_template_has_no_findings() {
        let res = run("SC-01-clean");
        assert_eq!(res.worst_rollup, Rollup::Clean);
        assert_eq!(res.records[0].keywords.len(), 3);
    }

    #[test]
    fn scenario_sc02_missing_bottom_marker() {
        let res = run("SC-02-missing-bottom-marker");
        let rec = &res.records[0];
        assert!(!rec.structure.has_bottom_marker);
        assert!(rec.structure.has_top_markers);
        assert_eq!(rec.structure.has_iife, Some(true));
    }

    #[test]
    fn scenario_sc05_client_dom_uncommented() {
        let res = run("SC-05-client-dom-uncommented");
        assert_eq!(res.codes("events.html"), Some(vec![FindingCode::ClientDomUncommented]));
        assert!(res.records[0].structure.forbidden_global_usage.is_empty());
    }

    #[test]
    fn scenario_sc06_rules_only_directory_yields_one_record_per_file() {
        let res = run("SC-06-rules-only-directory");
        assert_eq!(res.records.len(), 4);
        assert!(res
            .records
            .iter()
            .flat_map(|r| r.keywords.iter())
            .all(|k| k.citations.is_empty()));
        assert!(res.records.iter().flat_map(|r| r.findings.iter()).all(|f| f.citations.is_empty()));
    }

    #[test]
    fn scenario_sc07_unreadable_input_does_not_stop_the_run() {
        let res = run("SC-07-unreadable-input");
        let bad = &res.records[1];
        assert!(bad.keywords.is_empty());
        assert_eq!(bad.findings.len(), 1);
        assert_eq!(res.records[0].rollup, Rollup::Clean);
    }
}
