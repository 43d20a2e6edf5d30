use serde::{Deserialize, Serialize};

/// Ordered so that `max()` over a set of findings yields the worst one.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Per-file verdict. `Clean` means no findings at all, which is distinct from `Info`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Rollup {
    #[default]
    Clean,
    Info,
    Warning,
    Error,
}

impl Rollup {
    pub fn from_severity(severity: Severity) -> Self {
        match severity {
            Severity::Info => Rollup::Info,
            Severity::Warning => Rollup::Warning,
            Severity::Error => Rollup::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rollup::Clean => "clean",
            Rollup::Info => "info",
            Rollup::Warning => "warning",
            Rollup::Error => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Rollup::Error)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FindingCategory {
    Structure,
    Keyword,
    Input,
}

/// Stable finding identifiers. Each code owns exactly one severity and one message template.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    MissingTopComment,
    MissingBottomComment,
    MissingScriptTag,
    MissingIife,
    MissingClass,
    MissingConstructorAssets,
    MissingBuildMethod,
    MissingPrintCall,
    ClientDomUncommented,
    ForbiddenGlobalUsage,
    UnknownKeyword,
    InvalidModifierSyntax,
    DuplicateModifier,
    UnreadableFile,
}

impl FindingCode {
    pub const ALL: [FindingCode; 14] = [
        FindingCode::MissingTopComment,
        FindingCode::MissingBottomComment,
        FindingCode::MissingScriptTag,
        FindingCode::MissingIife,
        FindingCode::MissingClass,
        FindingCode::MissingConstructorAssets,
        FindingCode::MissingBuildMethod,
        FindingCode::MissingPrintCall,
        FindingCode::ClientDomUncommented,
        FindingCode::ForbiddenGlobalUsage,
        FindingCode::UnknownKeyword,
        FindingCode::InvalidModifierSyntax,
        FindingCode::DuplicateModifier,
        FindingCode::UnreadableFile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FindingCode::MissingTopComment => "MISSING_TOP_COMMENT",
            FindingCode::MissingBottomComment => "MISSING_BOTTOM_COMMENT",
            FindingCode::MissingScriptTag => "MISSING_SCRIPT_TAG",
            FindingCode::MissingIife => "MISSING_IIFE",
            FindingCode::MissingClass => "MISSING_CLASS",
            FindingCode::MissingConstructorAssets => "MISSING_CONSTRUCTOR_ASSETS",
            FindingCode::MissingBuildMethod => "MISSING_BUILD_METHOD",
            FindingCode::MissingPrintCall => "MISSING_PRINT_CALL",
            FindingCode::ClientDomUncommented => "CLIENT_DOM_UNCOMMENTED",
            FindingCode::ForbiddenGlobalUsage => "FORBIDDEN_GLOBAL_USAGE",
            FindingCode::UnknownKeyword => "UNKNOWN_KEYWORD",
            FindingCode::InvalidModifierSyntax => "INVALID_MODIFIER_SYNTAX",
            FindingCode::DuplicateModifier => "DUPLICATE_MODIFIER",
            FindingCode::UnreadableFile => "UNREADABLE_FILE",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            FindingCode::InvalidModifierSyntax | FindingCode::DuplicateModifier => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn category(&self) -> FindingCategory {
        match self {
            FindingCode::UnknownKeyword | FindingCode::InvalidModifierSyntax | FindingCode::DuplicateModifier => {
                FindingCategory::Keyword
            }
            FindingCode::UnreadableFile => FindingCategory::Input,
            _ => FindingCategory::Structure,
        }
    }

    /// Message template. Findings append their detail after a colon.
    pub fn template(&self) -> &'static str {
        match self {
            FindingCode::MissingTopComment => "Missing required top comment markers",
            FindingCode::MissingBottomComment => "Missing required bottom comment marker",
            FindingCode::MissingScriptTag => "Missing server-side script open tag",
            FindingCode::MissingIife => "Missing immediately-invoked function wrapper",
            FindingCode::MissingClass => "Missing required class declaration",
            FindingCode::MissingConstructorAssets => "Constructor does not initialise assets with the required pattern",
            FindingCode::MissingBuildMethod => "Missing required build method",
            FindingCode::MissingPrintCall => "Missing required print call",
            FindingCode::ClientDomUncommented => "Client-side DOM line is not commented out",
            FindingCode::ForbiddenGlobalUsage => "Server-side script references a forbidden global",
            FindingCode::UnknownKeyword => "Unknown keyword token",
            FindingCode::InvalidModifierSyntax => "Invalid modifier syntax",
            FindingCode::DuplicateModifier => "Duplicate modifier in chain",
            FindingCode::UnreadableFile => "File could not be read as UTF-8 text",
        }
    }

    pub fn fix(&self) -> &'static str {
        match self {
            FindingCode::MissingTopComment => "Add the required opening comment block at the top of the file",
            FindingCode::MissingBottomComment => "Add the closing marker after the script block",
            FindingCode::MissingScriptTag => "Open the script block with the configured server-side tag",
            FindingCode::MissingIife => "Wrap the script body in (function() { ... })()",
            FindingCode::MissingClass => "Declare the configured builder class inside the wrapper",
            FindingCode::MissingConstructorAssets => "Initialise this.assets in the constructor with the configured asset keyword",
            FindingCode::MissingBuildMethod => "Add the build method that returns the HTML string",
            FindingCode::MissingPrintCall => "Print the result of the build method",
            FindingCode::ClientDomUncommented => "Prefix the client-side DOM line with //",
            FindingCode::ForbiddenGlobalUsage => "Remove the client global from server-side code or comment the line out",
            FindingCode::UnknownKeyword => "Check the keyword against the documented keyword set",
            FindingCode::InvalidModifierSyntax => "Use ^name modifiers with bare identifiers, in the documented order",
            FindingCode::DuplicateModifier => "Remove the repeated modifier",
            FindingCode::UnreadableFile => "Re-save the file as UTF-8",
        }
    }
}

impl std::fmt::Display for FindingCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TokenVerdict {
    Valid,
    Unknown,
    MalformedModifier,
}
