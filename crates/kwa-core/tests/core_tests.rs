use kwa_core::{
    worst_rollup, FileAuditRecord, FileId, Finding, FindingCategory, FindingCode, Location, Rollup, RunId, Severity,
    StructureRecord, TemplateSource,
};

fn record(file: &str, rollup: Rollup) -> FileAuditRecord {
    FileAuditRecord {
        file: FileId::from_str(file),
        structure: StructureRecord::default(),
        keywords: vec![],
        findings: vec![],
        rollup,
    }
}

#[test]
fn test_finding_takes_severity_from_code() {
    let f = Finding::new(FindingCode::InvalidModifierSyntax);
    assert_eq!(f.severity, Severity::Warning);
    let f = Finding::new(FindingCode::UnknownKeyword);
    assert_eq!(f.severity, Severity::Error);
}

#[test]
fn test_finding_detail_keeps_template_prefix() {
    let f = Finding::new(FindingCode::UnknownKeyword).with_detail("%foo_bar%");
    assert_eq!(f.message, "Unknown keyword token: %foo_bar%");
    assert_eq!(f.fix, FindingCode::UnknownKeyword.fix());
}

#[test]
fn test_finding_location() {
    let f = Finding::new(FindingCode::ForbiddenGlobalUsage).at(Location { line: 4, offset: 40 });
    assert_eq!(f.location.unwrap().line, 4);
}

#[test]
fn test_finding_serializes_wire_code() {
    let f = Finding::new(FindingCode::MissingBottomComment);
    let v = serde_json::to_value(&f).unwrap();
    assert_eq!(v["code"], "MISSING_BOTTOM_COMMENT");
    assert_eq!(v["severity"], "error");
    assert!(v.get("location").is_none());
}

#[test]
fn test_code_categories() {
    assert_eq!(FindingCode::MissingIife.category(), FindingCategory::Structure);
    assert_eq!(FindingCode::DuplicateModifier.category(), FindingCategory::Keyword);
    assert_eq!(FindingCode::UnreadableFile.category(), FindingCategory::Input);
}

#[test]
fn test_worst_rollup() {
    assert_eq!(worst_rollup(Vec::<FileAuditRecord>::new().iter()), Rollup::Clean);
    let records = vec![record("a.html", Rollup::Warning), record("b.html", Rollup::Clean)];
    assert_eq!(worst_rollup(&records), Rollup::Warning);
    let records = vec![record("a.html", Rollup::Warning), record("b.html", Rollup::Error)];
    assert!(worst_rollup(&records).is_error());
}

#[test]
fn test_run_id_new() {
    assert_ne!(RunId::new(), RunId::new());
}

#[test]
fn test_template_source_new() {
    let src = TemplateSource::new("dir/a.html", "<p>");
    assert_eq!(src.id.as_str(), "dir/a.html");
    assert_eq!(src.text, "<p>");
}
