use std::collections::BTreeSet;
use std::path::Path;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::config::*;

/// A user-supplied pattern and its compiled form.
#[derive(Clone, Debug)]
pub struct NamedPattern {
    pub source: String,
    pub regex: Regex,
}

#[derive(Clone, Debug)]
pub struct ScriptShape {
    pub open_tag: Option<String>,
    pub close_tag: Option<String>,
    pub requires_iife: bool,
    pub class_name: Option<String>,
    pub class_decl: Option<Regex>,
    pub constructor_assets: Option<String>,
    pub build_method: Option<String>,
    pub build_method_decl: Option<Regex>,
    pub print_call: Option<String>,
    pub client_dom_line: Option<NamedPattern>,
    pub client_dom_must_be_commented: bool,
    pub forbid_globals: Vec<NamedPattern>,
}

#[derive(Clone, Debug)]
pub struct KeywordShape {
    pub sigil: char,
    pub modifier_prefix: char,
    pub match_mode: MatchMode,
    /// Prefixes always carry the leading sigil.
    pub valid_prefixes: Option<Vec<String>>,
    pub known_patterns: Option<BTreeSet<String>>,
    pub modifier_order: Vec<OrderRule>,
}

/// Compiled, read-only rule set for one run.
#[derive(Clone, Debug)]
pub struct Rules {
    pub markers: RequiredMarkers,
    pub script: ScriptShape,
    pub keywords: KeywordShape,
    pub examples: Vec<String>,
    fingerprint: String,
}

impl Rules {
    pub fn from_document(doc: &Value) -> Result<Self, ConfigError> {
        let cfg = RuleConfig::from_value(doc)?;
        let rules = Self::compile(cfg, fingerprint(doc))?;
        debug!(fingerprint = %rules.fingerprint, "compiled rule configuration");
        Ok(rules)
    }

    pub fn from_text(text: &str, format: DocumentFormat) -> Result<Self, ConfigError> {
        Self::from_document(&parse_document(text, format)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_document(&read_document(path)?)
    }

    pub fn compile(cfg: RuleConfig, fingerprint: String) -> Result<Self, ConfigError> {
        let s = cfg.script;
        let class_decl = s
            .requires_class_name
            .as_deref()
            .map(|name| derived(&format!(r"\bclass\s+{}\b[^{{]*\{{", regex::escape(name)), "script.requires_class_name"))
            .transpose()?;
        let build_method_decl = s
            .requires_build_method
            .as_deref()
            .map(|name| {
                derived(
                    &format!(r"(?m)^\s*(?:async\s+)?{}\s*\([^)]*\)\s*\{{", regex::escape(name)),
                    "script.requires_build_method",
                )
            })
            .transpose()?;
        let client_dom_line = s
            .client_dom_line_pattern
            .map(|p| named(p, "script.client_dom_line_pattern"))
            .transpose()?;
        let forbid_globals = s
            .forbid_globals
            .into_iter()
            .map(|p| named(p, "script.forbid_globals"))
            .collect::<Result<Vec<_>, _>>()?;

        let script = ScriptShape {
            open_tag: s.open_tag.filter(|t| !t.is_empty()),
            close_tag: s.close_tag.filter(|t| !t.is_empty()),
            requires_iife: s.requires_iife,
            class_name: s.requires_class_name,
            class_decl,
            constructor_assets: s.requires_constructor_assets_pattern,
            build_method: s.requires_build_method,
            build_method_decl,
            print_call: s.requires_print,
            client_dom_line,
            client_dom_must_be_commented: s.client_dom_line_must_be_commented,
            forbid_globals,
        };

        let k = cfg.keywords;
        let sigil = k.sigil;
        let valid_prefixes = k.valid_prefixes.map(|prefixes| {
            prefixes
                .into_iter()
                .filter(|p| !p.is_empty())
                .map(|p| if p.starts_with(sigil) { p } else { format!("{sigil}{p}") })
                .collect()
        });
        let keywords = KeywordShape {
            sigil,
            modifier_prefix: k.modifier_prefix,
            match_mode: k.match_mode,
            valid_prefixes,
            known_patterns: k.known_patterns.map(|v| v.into_iter().collect()),
            modifier_order: k.modifier_order,
        };

        Ok(Self {
            markers: cfg.required_markers,
            script,
            keywords,
            examples: k.examples,
            fingerprint,
        })
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn named(source: String, field: &str) -> Result<NamedPattern, ConfigError> {
    let regex = Regex::new(&source).map_err(|e| ConfigError::InvalidPattern {
        field: field.to_string(),
        pattern: source.clone(),
        source: e,
    })?;
    Ok(NamedPattern { source, regex })
}

fn derived(pattern: &str, field: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        field: field.to_string(),
        pattern: pattern.to_string(),
        source: e,
    })
}
