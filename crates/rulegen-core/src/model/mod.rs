//! Typed document model for the four document kinds.
//!
//! Values of these types are only produced by the [`crate::schema`]
//! validators; raw parsed JSON never crosses that boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─────────────────────────────────────────────────────────────────────────────
// Enums
// ─────────────────────────────────────────────────────────────────────────────

/// Coverage fidelity tier. Ordered: `exhaustive` includes `extended`
/// includes `core`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CoverageTier {
    Core,
    Extended,
    Exhaustive,
}

impl CoverageTier {
    /// Tiers in cumulative order.
    pub const ALL: [CoverageTier; 3] = [
        CoverageTier::Core,
        CoverageTier::Extended,
        CoverageTier::Exhaustive,
    ];

    /// Whether a profile selecting `self` includes mappings from `tier`.
    #[must_use]
    pub fn includes(self, tier: CoverageTier) -> bool {
        tier <= self
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CoverageTier::Core => "core",
            CoverageTier::Extended => "extended",
            CoverageTier::Exhaustive => "exhaustive",
        }
    }
}

/// How evidence for an assertion is gathered (assertion-side vocabulary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    ConfigRead,
    LogQuery,
    RuntimeObserve,
}

impl EvidenceSource {
    /// Map the assertion vocabulary onto the rule vocabulary. Total and
    /// stable: `log_query` → `event_log`, `runtime_observe` →
    /// `runtime_check`, everything else → `config_read`.
    #[must_use]
    pub fn to_rule_evidence(self) -> EvidenceKind {
        match self {
            EvidenceSource::LogQuery => EvidenceKind::EventLog,
            EvidenceSource::RuntimeObserve => EvidenceKind::RuntimeCheck,
            EvidenceSource::ConfigRead => EvidenceKind::ConfigRead,
        }
    }
}

/// Evidence vocabulary carried by generated rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    ConfigRead,
    EventLog,
    RuntimeCheck,
}

impl EvidenceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EvidenceKind::ConfigRead => "config_read",
            EvidenceKind::EventLog => "event_log",
            EvidenceKind::RuntimeCheck => "runtime_check",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Assertions Pack
// ─────────────────────────────────────────────────────────────────────────────

/// An abstract, provider-agnostic compliance requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assertion {
    /// Dotted path `<domain>.<subcategory>.<check>`; the first two
    /// segments form the assertion family.
    pub assertion_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, serde_json::Value>>,
    pub evidence_type: EvidenceSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Assertion {
    /// First two dot-segments of the assertion id, or `None` when the id
    /// is too short to carry a family.
    #[must_use]
    pub fn family(&self) -> Option<String> {
        let mut segments = self.assertion_id.split('.');
        let domain = segments.next()?;
        let subcategory = segments.next()?;
        segments.next()?;
        Some(format!("{domain}.{subcategory}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionsPack {
    pub version: String,
    pub mode: String,
    #[serde(default)]
    pub scope_allowlist: Vec<String>,
    #[serde(default)]
    pub input_subcategories: Vec<String>,
    pub assertions: Vec<Assertion>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Matrix
// ─────────────────────────────────────────────────────────────────────────────

/// One concrete service binding inside a matrix tier list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceMapping {
    pub service: String,
    #[serde(rename = "resource", alias = "resource_type")]
    pub resource_type: String,
    pub adapter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_applicable_when: Option<String>,
}

/// Per-family coverage: the three tier lists, always all present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatrixFamily {
    pub core: Vec<ServiceMapping>,
    pub extended: Vec<ServiceMapping>,
    pub exhaustive: Vec<ServiceMapping>,
}

impl MatrixFamily {
    #[must_use]
    pub fn tier(&self, tier: CoverageTier) -> &[ServiceMapping] {
        match tier {
            CoverageTier::Core => &self.core,
            CoverageTier::Extended => &self.extended,
            CoverageTier::Exhaustive => &self.exhaustive,
        }
    }
}

/// The coverage matrix: assertion family → tier lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Matrix {
    pub families: BTreeMap<String, MatrixFamily>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Generation Profile
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationProfile {
    pub provider: String,
    pub coverage: CoverageTier,
    #[serde(default)]
    pub include_services: Vec<String>,
    #[serde(default)]
    pub exclude_services: Vec<String>,
}

impl GenerationProfile {
    /// Include/exclude semantics: a non-empty `include_services` is an
    /// allowlist; otherwise `exclude_services` is a denylist.
    #[must_use]
    pub fn allows_service(&self, service: &str) -> bool {
        if !self.include_services.is_empty() {
            return self.include_services.iter().any(|s| s == service);
        }
        !self.exclude_services.iter().any(|s| s == service)
    }
}

/// On-disk wrapper: `{"generation_profile": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationProfileDoc {
    pub generation_profile: GenerationProfile,
}

// ─────────────────────────────────────────────────────────────────────────────
// Rules Pack
// ─────────────────────────────────────────────────────────────────────────────

/// Field documentation for the adapter backing a curated pass condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterSpec {
    /// Field name → human description of what the adapter returns.
    pub returns: BTreeMap<String, String>,
}

/// The generated unit: one assertion bound to one service/adapter pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub rule_id: String,
    pub assertion_id: String,
    pub provider: String,
    pub service: String,
    pub resource_type: String,
    pub adapter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, serde_json::Value>>,
    pub pass_condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_applicable_when: Option<String>,
    pub severity: Severity,
    /// Tier at which the source mapping appeared, not the profile's
    /// selected tier.
    pub coverage_tier: CoverageTier,
    pub evidence_type: EvidenceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter_spec: Option<AdapterSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesPack {
    pub version: String,
    pub provider: String,
    pub coverage: CoverageTier,
    /// Must equal `rules.len()`.
    pub rule_count: usize,
    pub rules: Vec<Rule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assertion(id: &str) -> Assertion {
        Assertion {
            assertion_id: id.to_string(),
            title: "t".to_string(),
            scope: None,
            params: None,
            evidence_type: EvidenceSource::ConfigRead,
            severity: None,
            rationale: None,
            notes: None,
        }
    }

    #[test]
    fn test_family_extraction() {
        assert_eq!(
            assertion("crypto_data_protection.encryption_at_rest.enabled").family(),
            Some("crypto_data_protection.encryption_at_rest".to_string())
        );
        assert_eq!(assertion("too.short").family(), None);
        assert_eq!(assertion("single").family(), None);
    }

    #[test]
    fn test_tier_inclusion_is_cumulative() {
        assert!(CoverageTier::Exhaustive.includes(CoverageTier::Core));
        assert!(CoverageTier::Exhaustive.includes(CoverageTier::Extended));
        assert!(CoverageTier::Extended.includes(CoverageTier::Core));
        assert!(!CoverageTier::Core.includes(CoverageTier::Extended));
        assert!(!CoverageTier::Extended.includes(CoverageTier::Exhaustive));
    }

    #[test]
    fn test_evidence_mapping_is_total() {
        assert_eq!(
            EvidenceSource::LogQuery.to_rule_evidence(),
            EvidenceKind::EventLog
        );
        assert_eq!(
            EvidenceSource::RuntimeObserve.to_rule_evidence(),
            EvidenceKind::RuntimeCheck
        );
        assert_eq!(
            EvidenceSource::ConfigRead.to_rule_evidence(),
            EvidenceKind::ConfigRead
        );
    }

    #[test]
    fn test_profile_include_overrides_exclude() {
        let profile = GenerationProfile {
            provider: "aws".to_string(),
            coverage: CoverageTier::Core,
            include_services: vec!["s3".to_string()],
            exclude_services: vec!["s3".to_string()],
        };
        // Non-empty include list wins; exclude list is ignored.
        assert!(profile.allows_service("s3"));
        assert!(!profile.allows_service("rds"));
    }

    #[test]
    fn test_profile_exclude_denylist() {
        let profile = GenerationProfile {
            provider: "aws".to_string(),
            coverage: CoverageTier::Core,
            include_services: vec![],
            exclude_services: vec!["ec2".to_string()],
        };
        assert!(profile.allows_service("s3"));
        assert!(!profile.allows_service("ec2"));
    }

    #[test]
    fn test_service_mapping_accepts_resource_alias() {
        let m: ServiceMapping = serde_json::from_value(serde_json::json!({
            "service": "s3",
            "resource_type": "storage.bucket",
            "adapter": "aws.s3.default_encryption"
        }))
        .unwrap();
        assert_eq!(m.resource_type, "storage.bucket");

        let m: ServiceMapping = serde_json::from_value(serde_json::json!({
            "service": "s3",
            "resource": "storage.bucket",
            "adapter": "aws.s3.default_encryption"
        }))
        .unwrap();
        assert_eq!(m.resource_type, "storage.bucket");
    }
}
