//! Rule identity derivation and the identifier patterns shared by the
//! generator and the consistency validator.

use crate::model::CoverageTier;
use regex::Regex;

/// Derive the rule id for a (service, assertion id, tier) binding.
///
/// The leading two assertion-id segments (domain, subcategory) are
/// dropped; the remaining tail is joined with `_`; a `_<tier>` suffix is
/// appended only for non-core tiers. Injectivity over the generated
/// domain is enforced by the generator, which aborts on collision.
#[must_use]
pub fn build_rule_id(
    provider: &str,
    service: &str,
    assertion_id: &str,
    tier: CoverageTier,
) -> String {
    let tail = assertion_id
        .split('.')
        .skip(2)
        .collect::<Vec<_>>()
        .join("_");
    let mut rule_id = format!("{provider}.{service}.{tail}");
    if tier != CoverageTier::Core {
        rule_id.push('_');
        rule_id.push_str(tier.as_str());
    }
    rule_id
}

/// Pattern every rule id in a pack must match:
/// `^<provider>\.[a-z0-9-]+\.[a-z0-9_.-]+$`.
#[must_use]
pub fn rule_id_pattern(provider: &str) -> Regex {
    Regex::new(&format!(
        r"^{}\.[a-z0-9-]+\.[a-z0-9_.-]+$",
        regex::escape(provider)
    ))
    .expect("rule id pattern is a valid regex")
}

/// Pattern for service names: `[a-z0-9_-]+`.
#[must_use]
pub fn service_name_pattern() -> Regex {
    Regex::new(r"^[a-z0-9_-]+$").expect("service name pattern is a valid regex")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_tier_has_no_suffix() {
        assert_eq!(
            build_rule_id(
                "aws",
                "s3",
                "crypto_data_protection.encryption_at_rest.enabled",
                CoverageTier::Core
            ),
            "aws.s3.enabled"
        );
    }

    #[test]
    fn test_non_core_tiers_are_suffixed() {
        assert_eq!(
            build_rule_id(
                "aws",
                "rds",
                "crypto_data_protection.encryption_at_rest.database_encryption_enabled",
                CoverageTier::Extended
            ),
            "aws.rds.database_encryption_enabled_extended"
        );
        assert_eq!(
            build_rule_id("aws", "rds", "a.b.c", CoverageTier::Exhaustive),
            "aws.rds.c_exhaustive"
        );
    }

    #[test]
    fn test_multi_segment_tail_joined_with_underscore() {
        assert_eq!(
            build_rule_id("aws", "iam", "identity_access.mfa.root.mfa_enabled", CoverageTier::Core),
            "aws.iam.root_mfa_enabled"
        );
    }

    #[test]
    fn test_pattern_accepts_generated_ids() {
        let pattern = rule_id_pattern("aws");
        assert!(pattern.is_match("aws.s3.enabled"));
        assert!(pattern.is_match("aws.rds.database_encryption_enabled_extended"));
        assert!(!pattern.is_match("gcp.s3.enabled"));
        assert!(!pattern.is_match("aws.S3.enabled"));
        assert!(!pattern.is_match("aws.s3."));
    }

    #[test]
    fn test_service_name_pattern() {
        let pattern = service_name_pattern();
        assert!(pattern.is_match("identity-center"));
        assert!(pattern.is_match("security_hub"));
        assert!(!pattern.is_match("Security Hub"));
        assert!(!pattern.is_match(""));
    }
}

#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Any id the generator can build from well-formed inputs matches
        // the pack pattern.
        #[test]
        fn generated_ids_match_pattern(
            service in "[a-z0-9-]{1,12}",
            domain in "[a-z0-9_]{1,8}",
            subcat in "[a-z0-9_]{1,8}",
            check in "[a-z0-9_]{1,12}",
            tier_idx in 0usize..3,
        ) {
            let tier = CoverageTier::ALL[tier_idx];
            let assertion_id = format!("{domain}.{subcat}.{check}");
            let rule_id = build_rule_id("aws", &service, &assertion_id, tier);
            prop_assert!(rule_id_pattern("aws").is_match(&rule_id), "{rule_id}");
        }
    }
}
