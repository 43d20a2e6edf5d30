use std::collections::BTreeMap;
use std::fmt::Write as _;

use kwa_core::{FileAuditRecord, FindingCategory, FindingCode, Severity};

/// Counts behind the rules-only summary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SummaryStats {
    pub files_scanned: usize,
    pub files_with_findings: usize,
    pub files_with_errors: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    /// Occurrences per code, across all files.
    pub occurrences: BTreeMap<FindingCode, usize>,
    /// Number of distinct files each code appears in.
    pub files_affected: BTreeMap<FindingCode, usize>,
}

impl SummaryStats {
    pub fn compute(records: &[FileAuditRecord]) -> Self {
        let mut s = Self {
            files_scanned: records.len(),
            ..Default::default()
        };
        for rec in records {
            if !rec.findings.is_empty() {
                s.files_with_findings += 1;
            }
            if rec.rollup.is_error() {
                s.files_with_errors += 1;
            }
            s.errors += rec.count(Severity::Error);
            s.warnings += rec.count(Severity::Warning);
            s.infos += rec.count(Severity::Info);
            for f in &rec.findings {
                *s.occurrences.entry(f.code).or_default() += 1;
            }
            for code in FindingCode::ALL.iter().filter(|c| rec.has_code(**c)) {
                *s.files_affected.entry(*code).or_default() += 1;
            }
        }
        s
    }

    pub fn by_category(&self, category: FindingCategory) -> Vec<(FindingCode, usize)> {
        self.occurrences
            .iter()
            .filter(|(code, _)| code.category() == category)
            .map(|(code, n)| (*code, *n))
            .collect()
    }

    /// Most widespread codes first; ties keep code order.
    pub fn top_codes(&self, limit: usize) -> Vec<(FindingCode, usize)> {
        let mut v: Vec<_> = self.files_affected.iter().map(|(c, n)| (*c, *n)).collect();
        v.sort_by(|a, b| b.1.cmp(&a.1));
        v.truncate(limit);
        v
    }
}

pub fn render_summary(records: &[FileAuditRecord]) -> String {
    let stats = SummaryStats::compute(records);
    let mut out = String::new();
    let _ = writeln!(out, "# Keyword Audit Report\n");
    let _ = writeln!(out, "## Summary");
    let _ = writeln!(out, "- **Files Scanned**: {}", stats.files_scanned);
    let _ = writeln!(out, "- **Files with Findings**: {}", stats.files_with_findings);
    let _ = writeln!(out, "- **Files with Errors**: {}", stats.files_with_errors);
    let _ = writeln!(out, "- **Total Errors**: {}", stats.errors);
    let _ = writeln!(out, "- **Total Warnings**: {}", stats.warnings);
    let _ = writeln!(out, "- **Total Info**: {}", stats.infos);

    let _ = writeln!(out, "\n## Issue Breakdown");
    for (title, category) in [
        ("Structure Issues", FindingCategory::Structure),
        ("Keyword Issues", FindingCategory::Keyword),
        ("Input Issues", FindingCategory::Input),
    ] {
        let rows = stats.by_category(category);
        let _ = writeln!(out, "\n### {title}");
        if rows.is_empty() {
            let _ = writeln!(out, "- none");
        }
        for (code, n) in rows {
            let _ = writeln!(out, "- `{code}`: {n} occurrences");
        }
    }

    let _ = writeln!(out, "\n## Top Issues\n");
    let top = stats.top_codes(5);
    if top.is_empty() {
        let _ = writeln!(out, "No issues found.");
    }
    for (i, (code, n)) in top.iter().enumerate() {
        let _ = writeln!(out, "{}. **{code}**: {n} files affected", i + 1);
    }

    let _ = writeln!(out, "\n## Files\n");
    let _ = writeln!(out, "| File | Rollup | Errors | Warnings |");
    let _ = writeln!(out, "|------|--------|--------|----------|");
    for rec in records {
        let _ = writeln!(
            out,
            "| `{}` | {} | {} | {} |",
            rec.file,
            rec.rollup.as_str(),
            rec.count(Severity::Error),
            rec.count(Severity::Warning)
        );
    }
    out
}
