//! Severity classification for generated rules.
//!
//! Two policies exist and the caller must pick one explicitly:
//!
//! - [`SeverityPolicy::KeywordScan`] tests assertion title and id against
//!   the ordered keyword sets, critical → high → medium → low.
//! - [`SeverityPolicy::PresetFirst`] direct-maps an editorial severity
//!   carried by the assertion (critical/high → high, medium → medium,
//!   low → low) and skips keyword scanning; assertions without a preset
//!   fall back to the keyword scan.
//!
//! Both default to `medium` when nothing matches.

use crate::model::{Assertion, Severity};
use crate::tables::SeverityKeywords;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeverityPolicy {
    #[default]
    KeywordScan,
    PresetFirst,
}

pub struct SeverityClassifier<'t> {
    policy: SeverityPolicy,
    keywords: &'t SeverityKeywords,
}

impl<'t> SeverityClassifier<'t> {
    #[must_use]
    pub fn new(policy: SeverityPolicy, keywords: &'t SeverityKeywords) -> Self {
        Self { policy, keywords }
    }

    #[must_use]
    pub fn classify(&self, assertion: &Assertion) -> Severity {
        if self.policy == SeverityPolicy::PresetFirst {
            if let Some(preset) = assertion.severity {
                return match preset {
                    Severity::Critical | Severity::High => Severity::High,
                    Severity::Medium => Severity::Medium,
                    Severity::Low => Severity::Low,
                };
            }
        }

        let title = assertion.title.to_lowercase();
        let id = assertion.assertion_id.to_lowercase();
        let matches = |words: &[String]| {
            words
                .iter()
                .any(|w| title.contains(w.as_str()) || id.contains(w.as_str()))
        };

        if matches(&self.keywords.critical) {
            Severity::Critical
        } else if matches(&self.keywords.high) {
            Severity::High
        } else if matches(&self.keywords.medium) {
            Severity::Medium
        } else if matches(&self.keywords.low) {
            Severity::Low
        } else {
            Severity::Medium
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EvidenceSource;
    use crate::tables::CatalogTables;

    fn assertion(id: &str, title: &str, preset: Option<Severity>) -> Assertion {
        Assertion {
            assertion_id: id.to_string(),
            title: title.to_string(),
            scope: None,
            params: None,
            evidence_type: EvidenceSource::ConfigRead,
            severity: preset,
            rationale: None,
            notes: None,
        }
    }

    #[test]
    fn test_keyword_scan_order() {
        let tables = CatalogTables::builtin();
        let c = SeverityClassifier::new(SeverityPolicy::KeywordScan, &tables.severity_keywords);

        // "root" (critical) beats "mfa" (high) even though both match.
        let a = assertion("identity_access.mfa.root_mfa_enabled", "Root account MFA", None);
        assert_eq!(c.classify(&a), Severity::Critical);

        let a = assertion("identity_access.mfa.user_mfa", "User MFA enforced", None);
        assert_eq!(c.classify(&a), Severity::High);

        let a = assertion("ops.observability.log_collection", "Logging enabled", None);
        assert_eq!(c.classify(&a), Severity::Medium);

        let a = assertion("governance.hygiene.resource_tagging", "Resource tagging", None);
        assert_eq!(c.classify(&a), Severity::Low);
    }

    #[test]
    fn test_keyword_scan_default_is_medium() {
        let tables = CatalogTables::builtin();
        let c = SeverityClassifier::new(SeverityPolicy::KeywordScan, &tables.severity_keywords);
        let a = assertion("ops.capacity.quota_headroom", "Quota headroom", None);
        assert_eq!(c.classify(&a), Severity::Medium);
    }

    #[test]
    fn test_keyword_scan_ignores_preset() {
        let tables = CatalogTables::builtin();
        let c = SeverityClassifier::new(SeverityPolicy::KeywordScan, &tables.severity_keywords);
        let a = assertion(
            "ops.capacity.quota_headroom",
            "Quota headroom",
            Some(Severity::Critical),
        );
        assert_eq!(c.classify(&a), Severity::Medium);
    }

    #[test]
    fn test_preset_first_direct_maps() {
        let tables = CatalogTables::builtin();
        let c = SeverityClassifier::new(SeverityPolicy::PresetFirst, &tables.severity_keywords);

        let a = assertion("x.y.z", "anything", Some(Severity::Critical));
        assert_eq!(c.classify(&a), Severity::High);
        let a = assertion("x.y.z", "anything", Some(Severity::High));
        assert_eq!(c.classify(&a), Severity::High);
        let a = assertion("x.y.z", "anything", Some(Severity::Medium));
        assert_eq!(c.classify(&a), Severity::Medium);
        let a = assertion("x.y.z", "anything", Some(Severity::Low));
        assert_eq!(c.classify(&a), Severity::Low);
    }

    #[test]
    fn test_preset_first_falls_back_to_scan() {
        let tables = CatalogTables::builtin();
        let c = SeverityClassifier::new(SeverityPolicy::PresetFirst, &tables.severity_keywords);
        let a = assertion("identity_access.mfa.root_mfa_enabled", "Root account MFA", None);
        assert_eq!(c.classify(&a), Severity::Critical);
    }
}
