use serde::{Deserialize, Serialize};

use crate::{ids::*, model::*};

/// A template file as handed to the engine: identifier plus full text.
#[derive(Clone, Debug)]
pub struct TemplateSource {
    pub id: FileId,
    pub text: String,
}

impl TemplateSource {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: FileId::from_str(id),
            text: text.into(),
        }
    }
}

/// 1-based line and byte offset into the source text.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    pub line: usize,
    pub offset: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Citation {
    pub title: String,
    pub source: String,
    pub excerpt: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub code: FindingCode,
    pub severity: Severity,
    pub message: String,
    pub fix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
}

impl Finding {
    pub fn new(code: FindingCode) -> Self {
        Self {
            code,
            severity: code.severity(),
            message: code.template().to_string(),
            fix: code.fix().to_string(),
            location: None,
            citations: vec![],
        }
    }

    pub fn with_detail(mut self, detail: impl AsRef<str>) -> Self {
        self.message = format!("{}: {}", self.code.template(), detail.as_ref());
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForbiddenGlobalHit {
    pub pattern: String,
    pub line: usize,
    pub offset: usize,
}

impl ForbiddenGlobalHit {
    pub fn location(&self) -> Location {
        Location {
            line: self.line,
            offset: self.offset,
        }
    }
}

/// Derived compliance snapshot of one file's boilerplate and script shape.
///
/// `None` on an optional check means it was not evaluated, either because the
/// rule set disables it or because the script open tag was absent.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructureRecord {
    pub has_top_markers: bool,
    pub has_bottom_marker: bool,
    pub has_server_script_tag: Option<bool>,
    pub has_iife: Option<bool>,
    pub detected_class_name: Option<String>,
    pub has_constructor_assets_pattern: Option<bool>,
    pub has_build_method: Option<bool>,
    pub prints_result: Option<bool>,
    pub client_dom_line_present: bool,
    pub client_dom_line_commented: bool,
    pub client_dom_line: Option<usize>,
    pub forbidden_global_usage: Vec<ForbiddenGlobalHit>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeywordToken {
    pub raw: String,
    pub offset: usize,
    pub line: usize,
    /// Raw form with numeric parameter components replaced by `<id>`.
    pub normalized: String,
    /// Normalized form without modifiers; the key handed to citation lookup.
    pub lookup_key: String,
    pub modifiers: Vec<String>,
    pub verdict: TokenVerdict,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
}

impl KeywordToken {
    pub fn location(&self) -> Location {
        Location {
            line: self.line,
            offset: self.offset,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileAuditRecord {
    pub file: FileId,
    pub structure: StructureRecord,
    pub keywords: Vec<KeywordToken>,
    pub findings: Vec<Finding>,
    pub rollup: Rollup,
}

impl FileAuditRecord {
    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    pub fn has_code(&self, code: FindingCode) -> bool {
        self.findings.iter().any(|f| f.code == code)
    }
}

/// Worst rollup across a run; `Clean` for an empty run.
pub fn worst_rollup<'a>(records: impl IntoIterator<Item = &'a FileAuditRecord>) -> Rollup {
    records.into_iter().map(|r| r.rollup).max().unwrap_or(Rollup::Clean)
}
