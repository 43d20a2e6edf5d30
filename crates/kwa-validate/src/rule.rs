use kwa_core::{Finding, FindingCode, StructureRecord};
use kwa_rules::Rules;

/// One structure rule: turns a field of the record into zero or more findings.
pub struct StructureCheck {
    pub code: FindingCode,
    run: fn(&StructureRecord, &Rules) -> Vec<Finding>,
}

impl StructureCheck {
    pub fn eval(&self, record: &StructureRecord, rules: &Rules) -> Vec<Finding> {
        (self.run)(record, rules)
    }
}

/// Evaluation order is part of the output contract.
pub static STRUCTURE_CHECKS: [StructureCheck; 10] = [
    StructureCheck {
        code: FindingCode::MissingTopComment,
        run: top_markers,
    },
    StructureCheck {
        code: FindingCode::MissingBottomComment,
        run: bottom_marker,
    },
    StructureCheck {
        code: FindingCode::MissingScriptTag,
        run: script_tag,
    },
    StructureCheck {
        code: FindingCode::MissingIife,
        run: iife,
    },
    StructureCheck {
        code: FindingCode::MissingClass,
        run: class_decl,
    },
    StructureCheck {
        code: FindingCode::MissingConstructorAssets,
        run: constructor_assets,
    },
    StructureCheck {
        code: FindingCode::MissingBuildMethod,
        run: build_method,
    },
    StructureCheck {
        code: FindingCode::MissingPrintCall,
        run: print_call,
    },
    StructureCheck {
        code: FindingCode::ClientDomUncommented,
        run: client_dom,
    },
    StructureCheck {
        code: FindingCode::ForbiddenGlobalUsage,
        run: forbidden_globals,
    },
];

fn failed(code: FindingCode, detail: impl AsRef<str>) -> Vec<Finding> {
    vec![Finding::new(code).with_detail(detail)]
}

fn top_markers(r: &StructureRecord, rules: &Rules) -> Vec<Finding> {
    if r.has_top_markers {
        return vec![];
    }
    failed(FindingCode::MissingTopComment, rules.markers.top.join(", "))
}

fn bottom_marker(r: &StructureRecord, rules: &Rules) -> Vec<Finding> {
    if r.has_bottom_marker {
        return vec![];
    }
    failed(FindingCode::MissingBottomComment, rules.markers.bottom.join(", "))
}

fn script_tag(r: &StructureRecord, rules: &Rules) -> Vec<Finding> {
    match (r.has_server_script_tag, rules.script.open_tag.as_deref()) {
        (Some(false), Some(tag)) => failed(FindingCode::MissingScriptTag, tag),
        _ => vec![],
    }
}

fn iife(r: &StructureRecord, _rules: &Rules) -> Vec<Finding> {
    if r.has_iife == Some(false) {
        return vec![Finding::new(FindingCode::MissingIife)];
    }
    vec![]
}

fn class_decl(r: &StructureRecord, rules: &Rules) -> Vec<Finding> {
    // Without the open tag the shape was never inspected.
    if r.has_server_script_tag == Some(false) || r.detected_class_name.is_some() {
        return vec![];
    }
    match rules.script.class_name.as_deref() {
        Some(name) => failed(FindingCode::MissingClass, format!("class {name}")),
        None => vec![],
    }
}

fn constructor_assets(r: &StructureRecord, rules: &Rules) -> Vec<Finding> {
    match (r.has_constructor_assets_pattern, rules.script.constructor_assets.as_deref()) {
        (Some(false), Some(pattern)) => failed(FindingCode::MissingConstructorAssets, pattern),
        _ => vec![],
    }
}

fn build_method(r: &StructureRecord, rules: &Rules) -> Vec<Finding> {
    match (r.has_build_method, rules.script.build_method.as_deref()) {
        (Some(false), Some(name)) => failed(FindingCode::MissingBuildMethod, format!("{name}()")),
        _ => vec![],
    }
}

fn print_call(r: &StructureRecord, rules: &Rules) -> Vec<Finding> {
    match (r.prints_result, rules.script.print_call.as_deref()) {
        (Some(false), Some(call)) => failed(FindingCode::MissingPrintCall, call),
        _ => vec![],
    }
}

fn client_dom(r: &StructureRecord, rules: &Rules) -> Vec<Finding> {
    if !rules.script.client_dom_must_be_commented || !r.client_dom_line_present || r.client_dom_line_commented {
        return vec![];
    }
    let line = r.client_dom_line.unwrap_or_default();
    failed(FindingCode::ClientDomUncommented, format!("line {line}"))
}

fn forbidden_globals(r: &StructureRecord, _rules: &Rules) -> Vec<Finding> {
    r.forbidden_global_usage
        .iter()
        .map(|hit| {
            Finding::new(FindingCode::ForbiddenGlobalUsage)
                .with_detail(format!("`{}` on line {}", hit.pattern, hit.line))
                .at(hit.location())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kwa_core::ForbiddenGlobalHit;

    fn rules() -> Rules {
        kwa_rules::default_rules().unwrap()
    }

    fn passing() -> StructureRecord {
        StructureRecord {
            has_top_markers: true,
            has_bottom_marker: true,
            has_server_script_tag: Some(true),
            has_iife: Some(true),
            detected_class_name: Some("TemplateBuilder".into()),
            has_constructor_assets_pattern: Some(true),
            has_build_method: Some(true),
            prints_result: Some(true),
            client_dom_line_present: true,
            client_dom_line_commented: true,
            client_dom_line: Some(12),
            forbidden_global_usage: vec![],
        }
    }

    fn eval_all(record: &StructureRecord) -> Vec<FindingCode> {
        let rules = rules();
        STRUCTURE_CHECKS
            .iter()
            .flat_map(|c| c.eval(record, &rules))
            .map(|f| f.code)
            .collect()
    }

    #[test]
    fn passing_record_has_no_findings() {
        assert!(eval_all(&passing()).is_empty());
    }

    #[test]
    fn checks_are_listed_in_evaluation_order() {
        let codes: Vec<_> = STRUCTURE_CHECKS.iter().map(|c| c.code).collect();
        assert_eq!(codes.first(), Some(&FindingCode::MissingTopComment));
        assert_eq!(codes.last(), Some(&FindingCode::ForbiddenGlobalUsage));
        assert_eq!(codes.len(), 10);
    }

    #[test]
    fn every_failed_field_yields_its_code_in_order() {
        let record = StructureRecord {
            has_top_markers: false,
            has_bottom_marker: false,
            has_server_script_tag: Some(true),
            has_iife: Some(false),
            detected_class_name: None,
            has_constructor_assets_pattern: Some(false),
            has_build_method: Some(false),
            prints_result: Some(false),
            client_dom_line_present: true,
            client_dom_line_commented: false,
            client_dom_line: Some(3),
            forbidden_global_usage: vec![ForbiddenGlobalHit {
                pattern: r"\bwindow\.".into(),
                line: 9,
                offset: 120,
            }],
        };
        assert_eq!(
            eval_all(&record),
            vec![
                FindingCode::MissingTopComment,
                FindingCode::MissingBottomComment,
                FindingCode::MissingIife,
                FindingCode::MissingClass,
                FindingCode::MissingConstructorAssets,
                FindingCode::MissingBuildMethod,
                FindingCode::MissingPrintCall,
                FindingCode::ClientDomUncommented,
                FindingCode::ForbiddenGlobalUsage,
            ]
        );
    }

    #[test]
    fn missing_script_tag_does_not_cascade() {
        let record = StructureRecord {
            has_server_script_tag: Some(false),
            has_iife: None,
            detected_class_name: None,
            has_constructor_assets_pattern: None,
            has_build_method: None,
            prints_result: None,
            ..passing()
        };
        assert_eq!(eval_all(&record), vec![FindingCode::MissingScriptTag]);
    }

    #[test]
    fn client_dom_finding_names_the_line() {
        let record = StructureRecord {
            client_dom_line_commented: false,
            client_dom_line: Some(7),
            ..passing()
        };
        let rules = rules();
        let findings = client_dom(&record, &rules);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.ends_with("line 7"));
    }
}
