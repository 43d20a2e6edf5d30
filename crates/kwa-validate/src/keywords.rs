//! Keyword token extraction. A token is `<sigil>name[:param][<prefix>modifier...]<sigil>`,
//! read by one left-to-right scanner that never looks further than
//! [`MAX_TOKEN_LEN`] bytes past an opening sigil.

use std::collections::HashSet;

use kwa_core::{Finding, FindingCode, KeywordToken, TokenVerdict};
use kwa_rules::{KeywordShape, MatchMode, Rules};

use crate::matcher::{is_identifier, LineIndex};

pub const MAX_TOKEN_LEN: usize = 256;

pub const ID_PLACEHOLDER: &str = "<id>";

/// Borrowed pieces of one token as it appears in the text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawToken<'a> {
    pub start: usize,
    pub end: usize,
    pub name: &'a str,
    pub param: Option<&'a str>,
    /// Everything after the first modifier prefix, up to the closing sigil.
    pub chain: Option<&'a str>,
}

impl<'a> RawToken<'a> {
    pub fn text(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

pub fn validate_keywords(text: &str, rules: &Rules) -> (Vec<Finding>, Vec<KeywordToken>) {
    let shape = &rules.keywords;
    let index = LineIndex::new(text);
    let mut findings = Vec::new();
    let mut tokens = Vec::new();

    for raw in scan_tokens(text, shape.sigil, shape.modifier_prefix) {
        let (token, mut token_findings) = analyze(text, &raw, shape, &index);
        findings.append(&mut token_findings);
        tokens.push(token);
    }
    (findings, tokens)
}

pub fn scan_tokens(text: &str, sigil: char, modifier_prefix: char) -> Vec<RawToken<'_>> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(rel) = text[pos..].find(sigil) {
        let start = pos + rel;
        match read_token(text, start, sigil, modifier_prefix) {
            Some(token) => {
                pos = token.end;
                out.push(token);
            }
            None => pos = start + sigil.len_utf8(),
        }
    }
    out
}

enum State {
    Name,
    Param,
    Chain,
}

fn read_token(text: &str, start: usize, sigil: char, modifier_prefix: char) -> Option<RawToken<'_>> {
    let body_start = start + sigil.len_utf8();
    let limit = text.len().min(body_start + MAX_TOKEN_LEN);
    let mut state = State::Name;
    let mut name_end = body_start;
    let mut param: Option<(usize, usize)> = None;
    let mut chain_start = None;

    for (rel, c) in text[body_start..].char_indices() {
        let i = body_start + rel;
        if i >= limit || c == '\n' {
            return None;
        }
        match state {
            State::Name => {
                let valid = if i == body_start {
                    c.is_ascii_alphabetic() || c == '_'
                } else {
                    c.is_ascii_alphanumeric() || c == '_'
                };
                if valid {
                    name_end = i + c.len_utf8();
                } else if i == body_start {
                    return None;
                } else if c == sigil {
                    return Some(finish(text, start, i, name_end, param, chain_start, sigil));
                } else if c == ':' {
                    state = State::Param;
                    param = Some((i + 1, i + 1));
                } else if c == modifier_prefix {
                    state = State::Chain;
                    chain_start = Some(i + c.len_utf8());
                } else {
                    return None;
                }
            }
            State::Param => {
                let (p_start, _) = param?;
                if c == sigil || c == modifier_prefix {
                    if i == p_start {
                        return None;
                    }
                    param = Some((p_start, i));
                    if c == sigil {
                        return Some(finish(text, start, i, name_end, param, chain_start, sigil));
                    }
                    state = State::Chain;
                    chain_start = Some(i + c.len_utf8());
                } else if c.is_whitespace() || ends_candidate(c) {
                    return None;
                }
            }
            State::Chain => {
                if c == sigil {
                    return Some(finish(text, start, i, name_end, param, chain_start, sigil));
                }
                if ends_candidate(c) {
                    return None;
                }
            }
        }
    }
    None
}

/// Characters that cannot occur in a parameter or modifier chain. Hitting one means
/// the opening sigil was not a token, so the scan resumes just after it.
fn ends_candidate(c: char) -> bool {
    matches!(
        c,
        '\'' | '"' | '`' | '+' | '<' | '>' | ';' | '(' | ')' | '{' | '}' | '[' | ']' | '=' | '\\'
    )
}

fn finish(
    text: &str,
    start: usize,
    close: usize,
    name_end: usize,
    param: Option<(usize, usize)>,
    chain_start: Option<usize>,
    sigil: char,
) -> RawToken<'_> {
    let body_start = start + sigil.len_utf8();
    RawToken {
        start,
        end: close + sigil.len_utf8(),
        name: &text[body_start..name_end],
        param: param.map(|(s, e)| &text[s..e]),
        chain: chain_start.map(|s| &text[s..close]),
    }
}

/// Numeric `:`-separated parameter components become `<id>`.
pub fn normalize_param(param: &str) -> String {
    param
        .split(':')
        .map(|part| {
            if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
                ID_PLACEHOLDER
            } else {
                part
            }
        })
        .collect::<Vec<_>>()
        .join(":")
}

/// Modifier chain as written, with any syntax problems found along the way.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ModifierChain {
    pub names: Vec<String>,
    pub problems: Vec<String>,
}

pub fn parse_chain(chain: &str, modifier_prefix: char) -> ModifierChain {
    let mut out = ModifierChain::default();
    for segment in chain.split(modifier_prefix) {
        if segment.is_empty() {
            out.problems.push("empty modifier segment".to_string());
            continue;
        }
        let name = segment.split(':').next().unwrap_or(segment);
        if segment.chars().any(char::is_whitespace) {
            out.problems.push(format!("whitespace in modifier `{segment}`"));
        } else if !is_identifier(name) {
            out.problems.push(format!("`{name}` is not an identifier"));
        }
        if !name.is_empty() {
            out.names.push(name.to_string());
        }
    }
    out
}

fn analyze(text: &str, raw: &RawToken<'_>, shape: &KeywordShape, index: &LineIndex) -> (KeywordToken, Vec<Finding>) {
    let sigil = shape.sigil;
    let prefix = shape.modifier_prefix;
    let raw_text = raw.text(text);
    let base = match raw.param {
        Some(p) => format!("{sigil}{}:{}{sigil}", raw.name, normalize_param(p)),
        None => format!("{sigil}{}{sigil}", raw.name),
    };
    let normalized = match raw.chain {
        Some(chain) => format!("{}{prefix}{chain}{sigil}", &base[..base.len() - sigil.len_utf8()]),
        None => base.clone(),
    };
    let chain = raw.chain.map(|c| parse_chain(c, prefix)).unwrap_or_default();

    let known = is_known(&base, shape);
    let verdict = if !known {
        TokenVerdict::Unknown
    } else if !chain.problems.is_empty() {
        TokenVerdict::MalformedModifier
    } else {
        TokenVerdict::Valid
    };

    let token = KeywordToken {
        raw: raw_text.to_string(),
        offset: raw.start,
        line: index.line_of(raw.start),
        normalized,
        lookup_key: base,
        modifiers: chain.names.clone(),
        verdict,
        citations: vec![],
    };
    let at = token.location();

    let mut findings = Vec::new();
    if !known {
        findings.push(
            Finding::new(FindingCode::UnknownKeyword)
                .with_detail(format!("{} (normalized {})", token.raw, token.normalized))
                .at(at),
        );
    }
    // Malformed segments and order violations share one finding per token.
    let mut problems = chain.problems.clone();
    for rule in &shape.modifier_order {
        let before = chain.names.iter().position(|n| *n == rule.before);
        let after = chain.names.iter().position(|n| *n == rule.after);
        if let (Some(b), Some(a)) = (before, after) {
            if a < b {
                problems.push(format!("`{}` must precede `{}`", rule.before, rule.after));
            }
        }
    }
    if !problems.is_empty() {
        findings.push(
            Finding::new(FindingCode::InvalidModifierSyntax)
                .with_detail(format!("{}: {}", token.raw, problems.join("; ")))
                .at(at),
        );
    }
    let mut seen = HashSet::new();
    let duplicates: Vec<&str> = chain
        .names
        .iter()
        .filter(|n| !seen.insert(n.as_str()))
        .map(String::as_str)
        .collect();
    if !duplicates.is_empty() {
        findings.push(
            Finding::new(FindingCode::DuplicateModifier)
                .with_detail(format!("{}: {}", token.raw, duplicates.join(", ")))
                .at(at),
        );
    }

    (token, findings)
}

fn is_known(base: &str, shape: &KeywordShape) -> bool {
    let prefix_ok = shape
        .valid_prefixes
        .as_ref()
        .map_or(true, |prefixes| prefixes.iter().any(|p| base.starts_with(p.as_str())));
    if !prefix_ok {
        return false;
    }
    match (shape.match_mode, &shape.known_patterns) {
        (MatchMode::Exact, Some(known)) => known.contains(base),
        _ => true,
    }
}
