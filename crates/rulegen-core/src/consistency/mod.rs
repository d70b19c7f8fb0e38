//! Post-generation consistency checks.
//!
//! The validator never throws and never short-circuits: every rule is
//! checked against every constraint and the full list of findings comes
//! back in one structured verdict, so a single invocation surfaces every
//! defect at once.

use crate::ident;
use crate::model::{AssertionsPack, RulesPack};
use crate::resolve::{is_generic_condition, UNRESOLVED_CONDITION};
use crate::schema;
use crate::tables::CatalogTables;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Finding codes, stable across releases.
pub mod codes {
    pub const E_SCHEMA: &str = "E_SCHEMA";
    pub const E_DUP_RULE_ID: &str = "E_DUP_RULE_ID";
    pub const E_ID_FORMAT: &str = "E_ID_FORMAT";
    pub const E_RESOURCE_TYPE: &str = "E_RESOURCE_TYPE";
    pub const E_SERVICE_NAME: &str = "E_SERVICE_NAME";
    pub const E_ASSERTION_REF: &str = "E_ASSERTION_REF";
    pub const E_RULE_COUNT: &str = "E_RULE_COUNT";
    pub const E_UNRESOLVED: &str = "E_UNRESOLVED";
    pub const W_UNRESOLVED: &str = "W_UNRESOLVED";
    pub const W_GENERIC_CONDITION: &str = "W_GENERIC_CONDITION";
    pub const W_SPEC_FIELDS: &str = "W_SPEC_FIELDS";
    pub const W_TIER_ABOVE_COVERAGE: &str = "W_TIER_ABOVE_COVERAGE";
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    /// Release policy: escalate unresolved sentinel conditions from
    /// warnings to errors.
    pub strict_unresolved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub message: String,
}

impl Finding {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Finding {
            code,
            rule_id: None,
            message: message.into(),
        }
    }

    fn for_rule(code: &'static str, rule_id: &str, message: impl Into<String>) -> Self {
        Finding {
            code,
            rule_id: Some(rule_id.to_string()),
            message: message.into(),
        }
    }
}

/// Aggregate coverage numbers, for reporting rather than correctness.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoverageStats {
    pub services_used: Vec<String>,
    pub resource_types_used: Vec<String>,
    /// Allowlisted resource types no rule exercises.
    pub resource_types_unused: Vec<String>,
    pub rules_by_tier: BTreeMap<String, usize>,
    pub rules_by_severity: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub generated_at: String,
    pub total_rules: usize,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub coverage: CoverageStats,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn now(total_rules: usize) -> Self {
        ValidationReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            total_rules,
            errors: Vec::new(),
            warnings: Vec::new(),
            coverage: CoverageStats::default(),
        }
    }
}

/// Validate a raw parsed rules-pack document. Structural validity is
/// delegated to the schema layer; when that fails, its violations are
/// the report and no deeper checks run.
#[must_use]
pub fn validate_value(
    raw: &Value,
    assertions: &AssertionsPack,
    tables: &CatalogTables,
    opts: &ValidateOptions,
) -> ValidationReport {
    match schema::rules_pack(raw) {
        Ok(pack) => validate_pack(&pack, assertions, tables, opts),
        Err(err) => {
            let mut report = ValidationReport::now(0);
            for violation in err.violations {
                report
                    .errors
                    .push(Finding::new(codes::E_SCHEMA, violation.to_string()));
            }
            report
        }
    }
}

/// Validate an already-typed rules pack (e.g. fresh generator output).
#[must_use]
pub fn validate_pack(
    pack: &RulesPack,
    assertions: &AssertionsPack,
    tables: &CatalogTables,
    opts: &ValidateOptions,
) -> ValidationReport {
    let mut report = ValidationReport::now(pack.rules.len());

    let id_pattern = ident::rule_id_pattern(&pack.provider);
    let service_pattern = ident::service_name_pattern();
    let field_token = Regex::new(r"resource\.([A-Za-z0-9_]+)")
        .expect("field token pattern is a valid regex");

    let known_assertions: BTreeSet<&str> = assertions
        .assertions
        .iter()
        .map(|a| a.assertion_id.as_str())
        .collect();
    let allowlisted: BTreeSet<&str> =
        tables.resource_types.iter().map(String::as_str).collect();

    if pack.rule_count != pack.rules.len() {
        report.errors.push(Finding::new(
            codes::E_RULE_COUNT,
            format!(
                "rule_count is {} but the pack holds {} rules",
                pack.rule_count,
                pack.rules.len()
            ),
        ));
    }

    let mut seen_ids: BTreeSet<&str> = BTreeSet::new();
    for rule in &pack.rules {
        let rule_id = rule.rule_id.as_str();

        if !seen_ids.insert(rule_id) {
            report.errors.push(Finding::for_rule(
                codes::E_DUP_RULE_ID,
                rule_id,
                "duplicate rule_id",
            ));
        }

        if !id_pattern.is_match(rule_id) {
            report.errors.push(Finding::for_rule(
                codes::E_ID_FORMAT,
                rule_id,
                format!("rule_id does not match {}", id_pattern.as_str()),
            ));
        }

        if !allowlisted.contains(rule.resource_type.as_str()) {
            report.errors.push(Finding::for_rule(
                codes::E_RESOURCE_TYPE,
                rule_id,
                format!("resource_type `{}` is not in the allowlist", rule.resource_type),
            ));
        }

        if !service_pattern.is_match(&rule.service) {
            report.errors.push(Finding::for_rule(
                codes::E_SERVICE_NAME,
                rule_id,
                format!("service `{}` must match [a-z0-9_-]+", rule.service),
            ));
        }

        if !known_assertions.contains(rule.assertion_id.as_str()) {
            report.errors.push(Finding::for_rule(
                codes::E_ASSERTION_REF,
                rule_id,
                format!(
                    "assertion_id `{}` not found in assertions pack",
                    rule.assertion_id
                ),
            ));
        }

        if rule.coverage_tier > pack.coverage {
            report.warnings.push(Finding::for_rule(
                codes::W_TIER_ABOVE_COVERAGE,
                rule_id,
                format!(
                    "rule is tagged `{}` but the pack declares coverage `{}`",
                    rule.coverage_tier.as_str(),
                    pack.coverage.as_str()
                ),
            ));
        }

        check_pass_condition(&mut report, rule, &field_token, opts);
    }

    report.coverage = coverage_stats(pack, tables);
    report
}

fn check_pass_condition(
    report: &mut ValidationReport,
    rule: &crate::model::Rule,
    field_token: &Regex,
    opts: &ValidateOptions,
) {
    let rule_id = rule.rule_id.as_str();

    if rule.pass_condition == UNRESOLVED_CONDITION {
        let finding = Finding::for_rule(
            if opts.strict_unresolved {
                codes::E_UNRESOLVED
            } else {
                codes::W_UNRESOLVED
            },
            rule_id,
            "pass_condition is the TBD-by-adapter sentinel",
        );
        if opts.strict_unresolved {
            report.errors.push(finding);
        } else {
            report.warnings.push(finding);
        }
        return;
    }

    // Keyword fallbacks never carry an adapter spec; curated templates
    // whose condition happens to share the generic shape are not flagged.
    if rule.adapter_spec.is_none() && is_generic_condition(&rule.pass_condition) {
        report.warnings.push(Finding::for_rule(
            codes::W_GENERIC_CONDITION,
            rule_id,
            format!(
                "generic fallback condition `{}`; consider a curated template",
                rule.pass_condition
            ),
        ));
    }

    // Every resource.<field> token should be documented by the adapter
    // spec when one exists. A leading path segment match is enough:
    // conditions may reach nested paths not enumerated at the top level.
    if let Some(spec) = &rule.adapter_spec {
        let documented: Vec<&str> = spec.returns.keys().map(String::as_str).collect();
        let mut undocumented: Vec<&str> = Vec::new();
        for capture in field_token.captures_iter(&rule.pass_condition) {
            let field = capture.get(1).map_or("", |m| m.as_str());
            let covered = documented.iter().any(|key| {
                *key == field || key.starts_with(&format!("{field}."))
            });
            if !covered && !undocumented.contains(&field) {
                undocumented.push(field);
            }
        }
        if !undocumented.is_empty() {
            report.warnings.push(Finding::for_rule(
                codes::W_SPEC_FIELDS,
                rule_id,
                format!(
                    "pass_condition references fields not in adapter_spec.returns: {}",
                    undocumented.join(", ")
                ),
            ));
        }
    }
}

fn coverage_stats(pack: &RulesPack, tables: &CatalogTables) -> CoverageStats {
    let mut stats = CoverageStats::default();

    let mut services: BTreeSet<&str> = BTreeSet::new();
    let mut resource_types: BTreeSet<&str> = BTreeSet::new();
    for rule in &pack.rules {
        services.insert(&rule.service);
        resource_types.insert(&rule.resource_type);
        *stats
            .rules_by_tier
            .entry(rule.coverage_tier.as_str().to_string())
            .or_insert(0) += 1;
        *stats
            .rules_by_severity
            .entry(rule.severity.as_str().to_string())
            .or_insert(0) += 1;
    }

    stats.services_used = services.iter().map(|s| (*s).to_string()).collect();
    stats.resource_types_used = resource_types.iter().map(|s| (*s).to_string()).collect();
    stats.resource_types_unused = tables
        .resource_types
        .iter()
        .filter(|t| !resource_types.contains(t.as_str()))
        .cloned()
        .collect();
    stats
}
