pub mod aggregate;
pub mod keywords;
pub mod matcher;
pub mod rule;
pub mod structure;

pub use aggregate::*;
pub use keywords::{validate_keywords, ModifierChain};
pub use rule::*;
pub use structure::*;

use kwa_core::{FileAuditRecord, FileId, Finding, FindingCode, Rollup, StructureRecord, TemplateSource};
use kwa_rules::Rules;

/// Run both validators over one source and merge the results.
pub fn audit_source(source: &TemplateSource, rules: &Rules) -> FileAuditRecord {
    let (structure, structure_findings) = validate_structure(&source.text, rules);
    let (keyword_findings, keywords) = validate_keywords(&source.text, rules);
    aggregate(source.id.clone(), structure, structure_findings, keywords, keyword_findings)
}

/// Record for a file whose text could not be obtained. No other checks run.
pub fn unreadable(file: FileId, reason: impl AsRef<str>) -> FileAuditRecord {
    FileAuditRecord {
        file,
        structure: StructureRecord::default(),
        keywords: vec![],
        findings: vec![Finding::new(FindingCode::UnreadableFile).with_detail(reason)],
        rollup: Rollup::Error,
    }
}
