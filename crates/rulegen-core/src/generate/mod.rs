//! The rule generator: joins assertions × matrix tiers into a rules pack.
//!
//! Pure function of its inputs with deterministic output ordering:
//! assertion iteration order, then tier order core → extended →
//! exhaustive, then matrix list order. Coverage gaps (a family absent
//! from the matrix) are warnings, not errors; a rule-id collision aborts
//! the whole run so no partial output exists to be trusted.

use crate::ident;
use crate::model::{
    Assertion, AssertionsPack, CoverageTier, GenerationProfile, Matrix, Rule, RulesPack,
};
use crate::resolve::PassConditionResolver;
use crate::severity::{SeverityClassifier, SeverityPolicy};
use crate::tables::CatalogTables;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::warn;

/// Version stamped on generated packs.
pub const RULES_PACK_VERSION: &str = "1.0";

#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    /// The id builder must be injective over the generated domain; a
    /// collision means two (service, assertion, tier) bindings mapped to
    /// one id and the pack cannot be trusted.
    #[error("rule id collision: `{rule_id}` produced by both `{first_assertion}` and `{second_assertion}` (service `{service}`)")]
    RuleIdCollision {
        rule_id: String,
        service: String,
        first_assertion: String,
        second_assertion: String,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    pub severity_policy: SeverityPolicy,
}

/// What happened during a generation pass.
#[derive(Debug, Clone, Default)]
pub struct GenerationStats {
    pub assertions_total: usize,
    pub rules_by_tier: BTreeMap<CoverageTier, usize>,
    /// Families that had no matrix entry, in first-seen order.
    pub skipped_families: Vec<String>,
    /// Mappings dropped because their service already produced a rule
    /// for the same assertion at a lower tier.
    pub deduped: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GeneratedPack {
    pub pack: RulesPack,
    pub stats: GenerationStats,
}

pub fn generate(
    assertions: &AssertionsPack,
    matrix: &Matrix,
    profile: &GenerationProfile,
    tables: &CatalogTables,
    opts: &GenerateOptions,
) -> Result<GeneratedPack, GenerateError> {
    let resolver = PassConditionResolver::new(tables);
    let classifier = SeverityClassifier::new(opts.severity_policy, &tables.severity_keywords);

    let mut rules: Vec<Rule> = Vec::new();
    let mut stats = GenerationStats {
        assertions_total: assertions.assertions.len(),
        ..GenerationStats::default()
    };
    // rule_id → assertion_id that produced it, for collision reporting.
    let mut seen_ids: BTreeMap<String, String> = BTreeMap::new();
    let mut skipped: BTreeSet<String> = BTreeSet::new();

    for assertion in &assertions.assertions {
        let Some(family) = assertion.family() else {
            let msg = format!(
                "assertion id `{}` is too short to carry a family; skipped",
                assertion.assertion_id
            );
            warn!("{msg}");
            stats.warnings.push(msg);
            continue;
        };

        let Some(entry) = matrix.families.get(&family) else {
            if skipped.insert(family.clone()) {
                let msg = format!("no matrix entry for assertion family `{family}`");
                warn!("{msg}");
                stats.warnings.push(msg);
                stats.skipped_families.push(family);
            }
            continue;
        };

        let pins = tables.service_pins.get(&assertion.assertion_id);
        let mut seen_services: BTreeSet<&str> = BTreeSet::new();

        for tier in CoverageTier::ALL {
            if !profile.coverage.includes(tier) {
                continue;
            }
            for mapping in entry.tier(tier) {
                if !profile.allows_service(&mapping.service) {
                    continue;
                }
                if let Some(pins) = pins {
                    if !pins.iter().any(|s| s == &mapping.service) {
                        continue;
                    }
                }
                // One rule per (assertion, service); lowest tier wins.
                if !seen_services.insert(mapping.service.as_str()) {
                    stats.deduped += 1;
                    continue;
                }

                let rule_id = ident::build_rule_id(
                    &profile.provider,
                    &mapping.service,
                    &assertion.assertion_id,
                    tier,
                );
                if let Some(first) =
                    seen_ids.insert(rule_id.clone(), assertion.assertion_id.clone())
                {
                    return Err(GenerateError::RuleIdCollision {
                        rule_id,
                        service: mapping.service.clone(),
                        first_assertion: first,
                        second_assertion: assertion.assertion_id.clone(),
                    });
                }

                rules.push(build_rule(
                    assertion, mapping, tier, profile, &resolver, &classifier, rule_id,
                ));
                *stats.rules_by_tier.entry(tier).or_insert(0) += 1;
            }
        }
    }

    let pack = RulesPack {
        version: RULES_PACK_VERSION.to_string(),
        provider: profile.provider.clone(),
        coverage: profile.coverage,
        rule_count: rules.len(),
        rules,
    };

    Ok(GeneratedPack { pack, stats })
}

fn build_rule(
    assertion: &Assertion,
    mapping: &crate::model::ServiceMapping,
    tier: CoverageTier,
    profile: &GenerationProfile,
    resolver: &PassConditionResolver<'_>,
    classifier: &SeverityClassifier<'_>,
    rule_id: String,
) -> Rule {
    let resolved = resolver.resolve(&mapping.adapter);
    let rationale = assertion
        .rationale
        .clone()
        .or_else(|| Some(format!("Ensures {}", assertion.title.to_lowercase())));

    Rule {
        rule_id,
        assertion_id: assertion.assertion_id.clone(),
        provider: profile.provider.clone(),
        service: mapping.service.clone(),
        resource_type: mapping.resource_type.clone(),
        adapter: mapping.adapter.clone(),
        params: assertion.params.clone(),
        pass_condition: resolved.condition,
        not_applicable_when: mapping.not_applicable_when.clone(),
        severity: classifier.classify(assertion),
        // The tier the mapping was found at, not the profile's tier.
        coverage_tier: tier,
        evidence_type: assertion.evidence_type.to_rule_evidence(),
        rationale,
        adapter_spec: resolved.adapter_spec,
        notes: assertion.notes.clone(),
    }
}
