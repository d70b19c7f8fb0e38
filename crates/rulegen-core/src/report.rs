//! Human-readable summaries for CLI output.

use crate::consistency::ValidationReport;
use crate::generate::GeneratedPack;
use std::fmt::Write as _;

/// One-screen summary of a generation run: totals, per-tier counts and
/// anything the generator had to skip or fold away.
#[must_use]
pub fn generation_summary(generated: &GeneratedPack) -> String {
    let mut out = String::new();
    let pack = &generated.pack;
    let stats = &generated.stats;

    let _ = writeln!(
        out,
        "Generated {} rules from {} assertions (provider: {}, coverage: {})",
        pack.rule_count,
        stats.assertions_total,
        pack.provider,
        pack.coverage.as_str()
    );
    for (tier, count) in &stats.rules_by_tier {
        let _ = writeln!(out, "  {:<12} {count}", tier.as_str());
    }
    if stats.deduped > 0 {
        let _ = writeln!(
            out,
            "  deduplicated {} mapping(s) already covered at a lower tier",
            stats.deduped
        );
    }
    if !stats.skipped_families.is_empty() {
        let _ = writeln!(
            out,
            "  skipped {} family(ies) with no matrix entry: {}",
            stats.skipped_families.len(),
            stats.skipped_families.join(", ")
        );
    }
    for warning in &stats.warnings {
        let _ = writeln!(out, "  warning: {warning}");
    }
    out
}

/// Validation verdict with every finding listed, errors before warnings.
#[must_use]
pub fn validation_summary(report: &ValidationReport) -> String {
    let mut out = String::new();

    let verdict = if report.is_valid() { "PASS" } else { "FAIL" };
    let _ = writeln!(
        out,
        "{verdict}: {} rules, {} error(s), {} warning(s)",
        report.total_rules,
        report.errors.len(),
        report.warnings.len()
    );

    for finding in &report.errors {
        match &finding.rule_id {
            Some(id) => {
                let _ = writeln!(out, "  error [{}] {}: {}", finding.code, id, finding.message);
            }
            None => {
                let _ = writeln!(out, "  error [{}] {}", finding.code, finding.message);
            }
        }
    }
    for finding in &report.warnings {
        match &finding.rule_id {
            Some(id) => {
                let _ = writeln!(out, "  warning [{}] {}: {}", finding.code, id, finding.message);
            }
            None => {
                let _ = writeln!(out, "  warning [{}] {}", finding.code, finding.message);
            }
        }
    }

    if report.is_valid() {
        let _ = writeln!(
            out,
            "  coverage: {} service(s), {} resource type(s) in use",
            report.coverage.services_used.len(),
            report.coverage.resource_types_used.len()
        );
        for (tier, count) in &report.coverage.rules_by_tier {
            let _ = writeln!(out, "    {tier:<12} {count}");
        }
        for (severity, count) in &report.coverage.rules_by_severity {
            let _ = writeln!(out, "    {severity:<12} {count}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::{codes, CoverageStats, Finding, ValidationReport};

    fn report(errors: Vec<Finding>, warnings: Vec<Finding>) -> ValidationReport {
        ValidationReport {
            generated_at: "2026-01-01T00:00:00Z".to_string(),
            total_rules: 3,
            errors,
            warnings,
            coverage: CoverageStats::default(),
        }
    }

    #[test]
    fn test_pass_verdict_line() {
        let text = validation_summary(&report(vec![], vec![]));
        assert!(text.starts_with("PASS: 3 rules, 0 error(s), 0 warning(s)"));
    }

    #[test]
    fn test_fail_lists_every_finding() {
        let errors = vec![
            Finding {
                code: codes::E_DUP_RULE_ID,
                rule_id: Some("aws.s3.enabled".to_string()),
                message: "duplicate rule_id".to_string(),
            },
            Finding {
                code: codes::E_RULE_COUNT,
                rule_id: None,
                message: "rule_count is 9 but the pack holds 3 rules".to_string(),
            },
        ];
        let warnings = vec![Finding {
            code: codes::W_UNRESOLVED,
            rule_id: Some("aws.kms.rotation".to_string()),
            message: "pass_condition is the TBD-by-adapter sentinel".to_string(),
        }];
        let text = validation_summary(&report(errors, warnings));
        assert!(text.starts_with("FAIL"));
        assert!(text.contains("error [E_DUP_RULE_ID] aws.s3.enabled"));
        assert!(text.contains("error [E_RULE_COUNT] rule_count is 9"));
        assert!(text.contains("warning [W_UNRESOLVED] aws.kms.rotation"));
    }
}
