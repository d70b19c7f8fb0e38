//! Structural validation of the four document kinds.
//!
//! Each entry point takes a raw parsed [`serde_json::Value`] and returns
//! either the typed document or a [`SchemaError`] enumerating *every*
//! violated constraint, not just the first. Raw JSON never crosses this
//! boundary: downstream code only sees the typed model.

use crate::ident;
use crate::model::{
    AssertionsPack, CoverageTier, EvidenceKind, EvidenceSource, GenerationProfile,
    GenerationProfileDoc, Matrix, RulesPack, Severity,
};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// One violated constraint: where, what was expected, what was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, found {}",
            self.path, self.expected, self.actual
        )
    }
}

#[derive(Debug, Clone, Error)]
#[error("schema validation failed with {} violation(s)", violations.len())]
pub struct SchemaError {
    pub violations: Vec<SchemaViolation>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Checker plumbing
// ─────────────────────────────────────────────────────────────────────────────

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{s}\""),
        other => kind_of(other).to_string(),
    }
}

#[derive(Default)]
struct Checker {
    violations: Vec<SchemaViolation>,
}

impl Checker {
    fn violation(&mut self, path: &str, expected: &str, actual: &Value) {
        self.violations.push(SchemaViolation {
            path: path.to_string(),
            expected: expected.to_string(),
            actual: describe(actual),
        });
    }

    fn missing(&mut self, path: &str, expected: &str) {
        self.violations.push(SchemaViolation {
            path: path.to_string(),
            expected: expected.to_string(),
            actual: "nothing".to_string(),
        });
    }

    fn object<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
        match value.as_object() {
            Some(obj) => Some(obj),
            None => {
                self.violation(path, "object", value);
                None
            }
        }
    }

    fn required<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        path: &str,
        key: &str,
        expected: &str,
    ) -> Option<&'a Value> {
        match obj.get(key) {
            Some(v) => Some(v),
            None => {
                self.missing(&format!("{path}.{key}"), expected);
                None
            }
        }
    }

    fn required_str<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        path: &str,
        key: &str,
    ) -> Option<&'a str> {
        let value = self.required(obj, path, key, "string")?;
        match value.as_str() {
            Some(s) => Some(s),
            None => {
                self.violation(&format!("{path}.{key}"), "string", value);
                None
            }
        }
    }

    /// Absent and `null` are both treated as "not provided".
    fn optional_str<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        path: &str,
        key: &str,
    ) -> Option<&'a str> {
        let value = obj.get(key)?;
        if value.is_null() {
            return None;
        }
        match value.as_str() {
            Some(s) => Some(s),
            None => {
                self.violation(&format!("{path}.{key}"), "string or null", value);
                None
            }
        }
    }

    fn optional_str_array(&mut self, obj: &Map<String, Value>, path: &str, key: &str) {
        let Some(value) = obj.get(key) else { return };
        if value.is_null() {
            return;
        }
        let field_path = format!("{path}.{key}");
        match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        self.violation(&format!("{field_path}[{i}]"), "string", item);
                    }
                }
            }
            None => self.violation(&field_path, "array of strings", value),
        }
    }

    /// Check a value parses as enum `T`; records a violation otherwise.
    fn check_enum<T: serde::de::DeserializeOwned>(
        &mut self,
        value: &Value,
        path: &str,
        expected: &str,
    ) {
        if serde_json::from_value::<T>(value.clone()).is_err() {
            self.violation(path, expected, value);
        }
    }

    fn finish<T: serde::de::DeserializeOwned>(self, value: &Value) -> Result<T, SchemaError> {
        if !self.violations.is_empty() {
            return Err(SchemaError {
                violations: self.violations,
            });
        }
        // All structural constraints hold, so this cannot fail for
        // reasons the checker covers; surface anything else verbatim.
        serde_json::from_value(value.clone()).map_err(|e| SchemaError {
            violations: vec![SchemaViolation {
                path: "$".to_string(),
                expected: "well-formed document".to_string(),
                actual: e.to_string(),
            }],
        })
    }
}

const EVIDENCE_SOURCE_VALUES: &str = "one of config_read|log_query|runtime_observe";
const EVIDENCE_KIND_VALUES: &str = "one of config_read|event_log|runtime_check";
const SEVERITY_VALUES: &str = "one of low|medium|high|critical";
const COVERAGE_VALUES: &str = "one of core|extended|exhaustive";
const KNOWN_PROVIDERS: &[&str] = &["aws"];

// ─────────────────────────────────────────────────────────────────────────────
// Assertions Pack
// ─────────────────────────────────────────────────────────────────────────────

pub fn assertions_pack(value: &Value) -> Result<AssertionsPack, SchemaError> {
    let mut c = Checker::default();

    if let Some(root) = c.object(value, "$") {
        c.required_str(root, "$", "version");

        if let Some(mode) = c.required_str(root, "$", "mode") {
            if mode != "assertions" {
                c.violation("$.mode", "\"assertions\"", &Value::String(mode.to_string()));
            }
        }

        c.optional_str_array(root, "$", "scope_allowlist");
        c.optional_str_array(root, "$", "input_subcategories");

        if let Some(assertions) = c.required(root, "$", "assertions", "array") {
            match assertions.as_array() {
                Some(items) => {
                    let mut seen_ids = BTreeSet::new();
                    for (i, item) in items.iter().enumerate() {
                        check_assertion(&mut c, item, &format!("$.assertions[{i}]"), &mut seen_ids);
                    }
                }
                None => c.violation("$.assertions", "array", assertions),
            }
        }
    }

    c.finish(value)
}

fn check_assertion(
    c: &mut Checker,
    value: &Value,
    path: &str,
    seen_ids: &mut BTreeSet<String>,
) {
    let Some(obj) = c.object(value, path) else {
        return;
    };

    if let Some(id) = c.required_str(obj, path, "assertion_id") {
        let segments: Vec<&str> = id.split('.').collect();
        if segments.len() < 3 || segments.iter().any(|s| s.is_empty()) {
            c.violation(
                &format!("{path}.assertion_id"),
                "dotted path <domain>.<subcategory>.<check>",
                &Value::String(id.to_string()),
            );
        }
        if !seen_ids.insert(id.to_string()) {
            c.violation(
                &format!("{path}.assertion_id"),
                "unique assertion_id within pack",
                &Value::String(id.to_string()),
            );
        }
    }

    c.required_str(obj, path, "title");
    c.optional_str(obj, path, "scope");

    if let Some(params) = obj.get("params") {
        if !params.is_null() && !params.is_object() {
            c.violation(&format!("{path}.params"), "object or null", params);
        }
    }

    if let Some(evidence) = c.required(obj, path, "evidence_type", EVIDENCE_SOURCE_VALUES) {
        c.check_enum::<EvidenceSource>(
            evidence,
            &format!("{path}.evidence_type"),
            EVIDENCE_SOURCE_VALUES,
        );
    }

    if let Some(severity) = obj.get("severity") {
        if !severity.is_null() {
            c.check_enum::<Severity>(severity, &format!("{path}.severity"), SEVERITY_VALUES);
        }
    }

    c.optional_str(obj, path, "rationale");
    c.optional_str(obj, path, "notes");
}

// ─────────────────────────────────────────────────────────────────────────────
// Matrix
// ─────────────────────────────────────────────────────────────────────────────

pub fn matrix(value: &Value) -> Result<Matrix, SchemaError> {
    let mut c = Checker::default();

    if let Some(root) = c.object(value, "$") {
        for (family, entry) in root {
            check_matrix_family(&mut c, entry, &format!("$.{family}"));
        }
    }

    c.finish(value)
}

const TIER_KEYS: &[&str] = &["core", "extended", "exhaustive"];

fn check_matrix_family(c: &mut Checker, value: &Value, path: &str) {
    let Some(obj) = c.object(value, path) else {
        return;
    };

    // Exactly the three tier keys, no more, no fewer.
    for key in obj.keys() {
        if !TIER_KEYS.contains(&key.as_str()) {
            c.violation(
                &format!("{path}.{key}"),
                "one of the tier keys core|extended|exhaustive",
                &Value::String(key.clone()),
            );
        }
    }

    for tier in TIER_KEYS {
        let tier_path = format!("{path}.{tier}");
        let Some(list) = c.required(obj, path, tier, "array of service mappings") else {
            continue;
        };
        let Some(items) = list.as_array() else {
            c.violation(&tier_path, "array of service mappings", list);
            continue;
        };

        let mut seen_pairs = BTreeSet::new();
        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{tier_path}[{i}]");
            let Some(mapping) = c.object(item, &item_path) else {
                continue;
            };

            let service = c.required_str(mapping, &item_path, "service");
            let adapter = c.required_str(mapping, &item_path, "adapter");

            // A (service, adapter) pair may appear once per tier list;
            // repeats are a data-quality defect made loud here.
            if let (Some(service), Some(adapter)) = (service, adapter) {
                if !seen_pairs.insert((service.to_string(), adapter.to_string())) {
                    c.violation(
                        &item_path,
                        "unique (service, adapter) pair within tier",
                        item,
                    );
                }
            }

            match (mapping.get("resource"), mapping.get("resource_type")) {
                (None, None) => c.missing(&format!("{item_path}.resource"), "string"),
                (Some(a), Some(_)) => c.violation(
                    &item_path,
                    "exactly one of resource|resource_type",
                    a,
                ),
                (Some(v), None) | (None, Some(v)) => {
                    if !v.is_string() {
                        c.violation(&format!("{item_path}.resource"), "string", v);
                    }
                }
            }

            c.optional_str(mapping, &item_path, "not_applicable_when");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Generation Profile
// ─────────────────────────────────────────────────────────────────────────────

pub fn generation_profile(value: &Value) -> Result<GenerationProfile, SchemaError> {
    let mut c = Checker::default();

    if let Some(root) = c.object(value, "$") {
        if let Some(inner) = c.required(root, "$", "generation_profile", "object") {
            if let Some(profile) = c.object(inner, "$.generation_profile") {
                let path = "$.generation_profile";

                if let Some(provider) = c.required_str(profile, path, "provider") {
                    if !KNOWN_PROVIDERS.contains(&provider) {
                        c.violation(
                            &format!("{path}.provider"),
                            "one of aws",
                            &Value::String(provider.to_string()),
                        );
                    }
                }

                if let Some(coverage) = c.required(profile, path, "coverage", COVERAGE_VALUES) {
                    c.check_enum::<CoverageTier>(
                        coverage,
                        &format!("{path}.coverage"),
                        COVERAGE_VALUES,
                    );
                }

                c.optional_str_array(profile, path, "include_services");
                c.optional_str_array(profile, path, "exclude_services");
            }
        }
    }

    let doc: GenerationProfileDoc = c.finish(value)?;
    Ok(doc.generation_profile)
}

// ─────────────────────────────────────────────────────────────────────────────
// Rules Pack
// ─────────────────────────────────────────────────────────────────────────────

pub fn rules_pack(value: &Value) -> Result<RulesPack, SchemaError> {
    let mut c = Checker::default();

    if let Some(root) = c.object(value, "$") {
        c.required_str(root, "$", "version");
        let provider = c.required_str(root, "$", "provider").map(str::to_string);

        if let Some(coverage) = c.required(root, "$", "coverage", COVERAGE_VALUES) {
            c.check_enum::<CoverageTier>(coverage, "$.coverage", COVERAGE_VALUES);
        }

        let declared_count = match c.required(root, "$", "rule_count", "number") {
            Some(v) => match v.as_u64() {
                Some(n) => Some(n),
                None => {
                    c.violation("$.rule_count", "non-negative integer", v);
                    None
                }
            },
            None => None,
        };

        if let Some(rules) = c.required(root, "$", "rules", "array") {
            match rules.as_array() {
                Some(items) => {
                    if let Some(declared) = declared_count {
                        if declared != items.len() as u64 {
                            c.violation(
                                "$.rule_count",
                                &format!("{} (len(rules))", items.len()),
                                &Value::from(declared),
                            );
                        }
                    }
                    let id_pattern = provider.as_deref().map(ident::rule_id_pattern);
                    for (i, item) in items.iter().enumerate() {
                        check_rule(&mut c, item, &format!("$.rules[{i}]"), id_pattern.as_ref());
                    }
                }
                None => c.violation("$.rules", "array", rules),
            }
        }
    }

    c.finish(value)
}

fn check_rule(c: &mut Checker, value: &Value, path: &str, id_pattern: Option<&regex::Regex>) {
    let Some(obj) = c.object(value, path) else {
        return;
    };

    if let Some(rule_id) = c.required_str(obj, path, "rule_id") {
        if let Some(pattern) = id_pattern {
            if !pattern.is_match(rule_id) {
                c.violation(
                    &format!("{path}.rule_id"),
                    &format!("match for {}", pattern.as_str()),
                    &Value::String(rule_id.to_string()),
                );
            }
        }
    }

    for key in [
        "assertion_id",
        "provider",
        "service",
        "resource_type",
        "adapter",
        "pass_condition",
    ] {
        c.required_str(obj, path, key);
    }

    if let Some(severity) = c.required(obj, path, "severity", SEVERITY_VALUES) {
        c.check_enum::<Severity>(severity, &format!("{path}.severity"), SEVERITY_VALUES);
    }
    if let Some(tier) = c.required(obj, path, "coverage_tier", COVERAGE_VALUES) {
        c.check_enum::<CoverageTier>(tier, &format!("{path}.coverage_tier"), COVERAGE_VALUES);
    }
    if let Some(evidence) = c.required(obj, path, "evidence_type", EVIDENCE_KIND_VALUES) {
        c.check_enum::<EvidenceKind>(
            evidence,
            &format!("{path}.evidence_type"),
            EVIDENCE_KIND_VALUES,
        );
    }

    if let Some(params) = obj.get("params") {
        if !params.is_null() && !params.is_object() {
            c.violation(&format!("{path}.params"), "object or null", params);
        }
    }

    c.optional_str(obj, path, "not_applicable_when");
    c.optional_str(obj, path, "rationale");
    c.optional_str(obj, path, "notes");

    if let Some(spec) = obj.get("adapter_spec") {
        if !spec.is_null() {
            let spec_path = format!("{path}.adapter_spec");
            match spec.as_object().and_then(|o| o.get("returns")) {
                Some(returns) => match returns.as_object() {
                    Some(fields) => {
                        for (field, desc) in fields {
                            if !desc.is_string() {
                                c.violation(
                                    &format!("{spec_path}.returns.{field}"),
                                    "string",
                                    desc,
                                );
                            }
                        }
                    }
                    None => c.violation(&format!("{spec_path}.returns"), "object", returns),
                },
                None => c.missing(&format!("{spec_path}.returns"), "object"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_assertions() -> Value {
        json!({
            "version": "1.0",
            "mode": "assertions",
            "assertions": [
                {
                    "assertion_id": "crypto_data_protection.encryption_at_rest.enabled",
                    "title": "Encryption at rest enabled",
                    "evidence_type": "config_read"
                }
            ]
        })
    }

    #[test]
    fn test_assertions_pack_ok() {
        let pack = assertions_pack(&minimal_assertions()).unwrap();
        assert_eq!(pack.assertions.len(), 1);
        assert_eq!(pack.mode, "assertions");
    }

    #[test]
    fn test_assertions_pack_collects_all_violations() {
        let doc = json!({
            "version": "1.0",
            "mode": "rules",
            "assertions": [
                { "assertion_id": "short.id", "title": 7, "evidence_type": "telepathy" }
            ]
        });
        let err = assertions_pack(&doc).unwrap_err();
        let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();
        assert!(paths.contains(&"$.mode"));
        assert!(paths.contains(&"$.assertions[0].assertion_id"));
        assert!(paths.contains(&"$.assertions[0].title"));
        assert!(paths.contains(&"$.assertions[0].evidence_type"));
        assert_eq!(err.violations.len(), 4);
    }

    #[test]
    fn test_assertions_pack_rejects_duplicate_ids() {
        let doc = json!({
            "version": "1.0",
            "mode": "assertions",
            "assertions": [
                { "assertion_id": "a.b.c", "title": "x", "evidence_type": "config_read" },
                { "assertion_id": "a.b.c", "title": "y", "evidence_type": "config_read" }
            ]
        });
        let err = assertions_pack(&doc).unwrap_err();
        assert!(err
            .violations
            .iter()
            .any(|v| v.expected.contains("unique assertion_id")));
    }

    #[test]
    fn test_matrix_ok() {
        let doc = json!({
            "crypto_data_protection.encryption_at_rest": {
                "core": [
                    { "service": "s3", "resource": "storage.bucket", "adapter": "aws.s3.default_encryption" }
                ],
                "extended": [],
                "exhaustive": []
            }
        });
        let matrix = matrix(&doc).unwrap();
        assert_eq!(matrix.families.len(), 1);
    }

    #[test]
    fn test_matrix_requires_all_three_tiers() {
        let doc = json!({
            "a.b": { "core": [] }
        });
        let err = matrix(&doc).unwrap_err();
        let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();
        assert!(paths.contains(&"$.a.b.extended"));
        assert!(paths.contains(&"$.a.b.exhaustive"));
    }

    #[test]
    fn test_matrix_rejects_unknown_tier_key() {
        let doc = json!({
            "a.b": { "core": [], "extended": [], "exhaustive": [], "bonus": [] }
        });
        let err = matrix(&doc).unwrap_err();
        assert!(err.violations.iter().any(|v| v.path == "$.a.b.bonus"));
    }

    #[test]
    fn test_matrix_rejects_duplicate_pair_within_tier() {
        let doc = json!({
            "a.b": {
                "core": [
                    { "service": "s3", "resource": "storage.bucket", "adapter": "aws.s3.x" },
                    { "service": "s3", "resource": "storage.bucket", "adapter": "aws.s3.x" }
                ],
                "extended": [],
                "exhaustive": []
            }
        });
        let err = matrix(&doc).unwrap_err();
        assert!(err
            .violations
            .iter()
            .any(|v| v.expected.contains("unique (service, adapter)")));
    }

    #[test]
    fn test_matrix_allows_same_service_distinct_adapters() {
        let doc = json!({
            "a.b": {
                "core": [
                    { "service": "s3", "resource": "storage.bucket", "adapter": "aws.s3.x" },
                    { "service": "s3", "resource": "storage.bucket", "adapter": "aws.s3.y" }
                ],
                "extended": [],
                "exhaustive": []
            }
        });
        assert!(matrix(&doc).is_ok());
    }

    #[test]
    fn test_profile_ok() {
        let doc = json!({
            "generation_profile": {
                "provider": "aws",
                "coverage": "extended",
                "exclude_services": ["lightsail"]
            }
        });
        let profile = generation_profile(&doc).unwrap();
        assert_eq!(profile.coverage, CoverageTier::Extended);
        assert_eq!(profile.exclude_services, vec!["lightsail".to_string()]);
    }

    #[test]
    fn test_profile_rejects_unknown_provider_and_coverage() {
        let doc = json!({
            "generation_profile": { "provider": "azure", "coverage": "total" }
        });
        let err = generation_profile(&doc).unwrap_err();
        assert_eq!(err.violations.len(), 2);
    }

    fn minimal_rule() -> Value {
        json!({
            "rule_id": "aws.s3.enabled",
            "assertion_id": "crypto_data_protection.encryption_at_rest.enabled",
            "provider": "aws",
            "service": "s3",
            "resource_type": "storage.bucket",
            "adapter": "aws.s3.default_encryption",
            "pass_condition": "resource.bucket_encryption.enabled == true",
            "severity": "high",
            "coverage_tier": "core",
            "evidence_type": "config_read"
        })
    }

    #[test]
    fn test_rules_pack_ok() {
        let doc = json!({
            "version": "1.0",
            "provider": "aws",
            "coverage": "core",
            "rule_count": 1,
            "rules": [minimal_rule()]
        });
        let pack = rules_pack(&doc).unwrap();
        assert_eq!(pack.rule_count, 1);
        assert_eq!(pack.rules[0].severity, Severity::High);
    }

    #[test]
    fn test_rules_pack_rule_count_mismatch() {
        let doc = json!({
            "version": "1.0",
            "provider": "aws",
            "coverage": "core",
            "rule_count": 5,
            "rules": [minimal_rule()]
        });
        let err = rules_pack(&doc).unwrap_err();
        assert!(err.violations.iter().any(|v| v.path == "$.rule_count"));
    }

    #[test]
    fn test_rules_pack_id_pattern_checked_against_pack_provider() {
        let mut rule = minimal_rule();
        rule["rule_id"] = json!("gcp.s3.enabled");
        let doc = json!({
            "version": "1.0",
            "provider": "aws",
            "coverage": "core",
            "rule_count": 1,
            "rules": [rule]
        });
        let err = rules_pack(&doc).unwrap_err();
        assert!(err.violations.iter().any(|v| v.path == "$.rules[0].rule_id"));
    }

    #[test]
    fn test_rules_pack_enum_violations_are_all_reported() {
        let mut rule = minimal_rule();
        rule["severity"] = json!("urgent");
        rule["coverage_tier"] = json!("full");
        rule["evidence_type"] = json!("vibes");
        let doc = json!({
            "version": "1.0",
            "provider": "aws",
            "coverage": "core",
            "rule_count": 1,
            "rules": [rule]
        });
        let err = rules_pack(&doc).unwrap_err();
        assert_eq!(err.violations.len(), 3);
    }
}
