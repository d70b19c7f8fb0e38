//! Pass-condition resolution: adapter id → boolean expression.
//!
//! Three-step strategy, in strict precedence order:
//!
//! 1. exact-match curated template (condition + adapter spec verbatim),
//! 2. keyword fallback (`resource.<keyword>.enabled == true`),
//! 3. the `TBD-by-adapter` sentinel.
//!
//! Keyword matching is longest-match-first with table order breaking
//! ties, so a broad fragment ("recovery") can never shadow a more
//! specific one ("disaster_recovery") that also matches.

use crate::model::AdapterSpec;
use crate::tables::CatalogTables;

/// Sentinel condition marking a rule whose adapter has no known
/// expression. The consistency validator detects these by exact string
/// comparison; they must never reach production silently.
pub const UNRESOLVED_CONDITION: &str = "TBD-by-adapter";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCondition {
    pub condition: String,
    pub adapter_spec: Option<AdapterSpec>,
}

pub struct PassConditionResolver<'t> {
    tables: &'t CatalogTables,
}

impl<'t> PassConditionResolver<'t> {
    #[must_use]
    pub fn new(tables: &'t CatalogTables) -> Self {
        Self { tables }
    }

    #[must_use]
    pub fn resolve(&self, adapter: &str) -> ResolvedCondition {
        if let Some(template) = self.tables.templates.get(adapter) {
            return ResolvedCondition {
                condition: template.condition.clone(),
                adapter_spec: template.adapter_spec.clone(),
            };
        }

        // Longest matching keyword wins; first table entry wins ties.
        let best = self
            .tables
            .keywords
            .iter()
            .enumerate()
            .filter(|(_, kw)| adapter.contains(kw.as_str()))
            .max_by(|(ia, a), (ib, b)| a.len().cmp(&b.len()).then(ib.cmp(ia)));

        if let Some((_, keyword)) = best {
            return ResolvedCondition {
                condition: generic_condition(keyword),
                adapter_spec: None,
            };
        }

        ResolvedCondition {
            condition: UNRESOLVED_CONDITION.to_string(),
            adapter_spec: None,
        }
    }
}

/// The generic fallback shape for a keyword match.
#[must_use]
pub fn generic_condition(keyword: &str) -> String {
    format!("resource.{keyword}.enabled == true")
}

/// Whether a condition has the generic fallback shape. The validator
/// flags these as candidates for tightening.
#[must_use]
pub fn is_generic_condition(condition: &str) -> bool {
    let Some(rest) = condition.strip_prefix("resource.") else {
        return false;
    };
    let Some(keyword) = rest.strip_suffix(".enabled == true") else {
        return false;
    };
    !keyword.is_empty()
        && keyword
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
