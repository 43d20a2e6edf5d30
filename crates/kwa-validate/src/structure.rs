use std::ops::Range;

use kwa_core::{Finding, ForbiddenGlobalHit, StructureRecord};
use kwa_rules::Rules;

use crate::matcher::{block_body, is_commented_at, lines, missing_literals, CONSTRUCTOR_OPEN, IIFE_OPEN};
use crate::rule::STRUCTURE_CHECKS;

/// Derive the structure record for `text` and the findings it implies, in the
/// fixed evaluation order of [`STRUCTURE_CHECKS`].
pub fn validate_structure(text: &str, rules: &Rules) -> (StructureRecord, Vec<Finding>) {
    let record = extract_structure(text, rules);
    let findings = STRUCTURE_CHECKS
        .iter()
        .flat_map(|check| check.eval(&record, rules))
        .collect();
    (record, findings)
}

pub fn extract_structure(text: &str, rules: &Rules) -> StructureRecord {
    let shape = &rules.script;
    let mut record = StructureRecord {
        has_top_markers: missing_literals(text, &rules.markers.top).is_empty(),
        has_bottom_marker: missing_literals(text, &rules.markers.bottom).is_empty(),
        ..StructureRecord::default()
    };

    let region = match shape.open_tag.as_deref() {
        Some(tag) => {
            let region = script_region(text, tag, shape.close_tag.as_deref());
            record.has_server_script_tag = Some(region.is_some());
            region
        }
        None => Some(text),
    };

    if let Some(body) = region {
        record.has_iife = shape.requires_iife.then(|| IIFE_OPEN.is_match(body));
        record.detected_class_name = match (&shape.class_decl, &shape.class_name) {
            (Some(decl), Some(name)) if decl.find_iter(body).any(|m| !is_commented_at(body, m.start())) => {
                Some(name.clone())
            }
            _ => None,
        };
        record.has_constructor_assets_pattern = shape
            .constructor_assets
            .as_deref()
            .map(|pattern| constructor_contains(body, pattern));
        record.has_build_method = shape.build_method_decl.as_ref().map(|decl| decl.is_match(body));
        record.prints_result = shape.print_call.as_deref().map(|call| body.contains(call));
    }

    if let Some(dom) = &shape.client_dom_line {
        let mut first_uncommented = None;
        let mut first_seen = None;
        for line in lines(text).filter(|l| dom.regex.is_match(l.text)) {
            first_seen.get_or_insert(line.number);
            if !line.is_comment() && first_uncommented.is_none() {
                first_uncommented = Some(line.number);
            }
        }
        record.client_dom_line_present = first_seen.is_some();
        record.client_dom_line_commented = first_seen.is_some() && first_uncommented.is_none();
        record.client_dom_line = first_uncommented.or(first_seen);
    }

    record.forbidden_global_usage = forbidden_globals(text, rules);
    record
}

/// Text after the open tag, up to the close tag when one follows.
fn script_region<'a>(text: &'a str, open_tag: &str, close_tag: Option<&str>) -> Option<&'a str> {
    let start = text.find(open_tag)? + open_tag.len();
    let rest = &text[start..];
    let end = close_tag.and_then(|tag| rest.find(tag)).unwrap_or(rest.len());
    Some(&rest[..end])
}

fn constructor_contains(body: &str, pattern: &str) -> bool {
    CONSTRUCTOR_OPEN
        .find_iter(body)
        .any(|m| block_body(body, m.end() - 1).contains(pattern))
}

/// Matches of the forbidden-global patterns, in text order. Commented lines are
/// exempt. On other lines the span matched by the client-DOM pattern is left to
/// its own check; anything else on that line is still reported.
fn forbidden_globals(text: &str, rules: &Rules) -> Vec<ForbiddenGlobalHit> {
    let shape = &rules.script;
    if shape.forbid_globals.is_empty() {
        return vec![];
    }
    let mut hits = Vec::new();
    for line in lines(text) {
        if line.is_comment() {
            continue;
        }
        let dom_spans: Vec<Range<usize>> = match &shape.client_dom_line {
            Some(dom) => dom.regex.find_iter(line.text).map(|m| m.range()).collect(),
            None => vec![],
        };
        for pattern in &shape.forbid_globals {
            let hit = pattern
                .regex
                .find_iter(line.text)
                .find(|m| !dom_spans.iter().any(|d| m.start() < d.end && d.start < m.end()));
            if let Some(m) = hit {
                hits.push(ForbiddenGlobalHit {
                    pattern: pattern.source.clone(),
                    line: line.number,
                    offset: line.offset + m.start(),
                });
            }
        }
    }
    hits
}
