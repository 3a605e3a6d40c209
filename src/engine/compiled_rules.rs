//! Rule compilation and indexing.
//!
//! This module holds the *static* side of resolution: structures derived once
//! from the rule list and the part index, so the fixpoint loop only walks
//! rules that can actually fire.
//!
//! Compilation sorts rules into:
//!
//! - **live**: active and targeting a known part. Only these are evaluated.
//! - **inactive**: switched off; never fire.
//! - **dangling**: target id matches no part. Expected while catalogs and
//!   rule sheets are edited independently, so they are skipped silently.
//!
//! and records a [`RuleShape`] per rule. A live rule with an empty shape has
//! no constraints and fires on the first pass of every resolution.
//!
//! ## Invariants
//!
//! - `RuleId` is an index into `CompiledRules::rules` and
//!   `CompiledRules::metas`. Those vectors stay aligned.
//! - `RuleIndex::live` preserves rule-list order; exclusivity tie-breaks
//!   depend on it.

use crate::expr::{ExpressionIssue, parse_with_issues};
use crate::index::PartIndex;
use crate::{FunctionalCode, Rule};
use tracing::trace;

/// Rule identifier (index into the rules vector).
pub(crate) type RuleId = usize;

bitflags::bitflags! {
    /// Which constraint kinds a rule's logic carries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RuleShape: u8 {
        const HAS_INCLUDES  = 1 << 0;
        const HAS_EXCLUDES  = 1 << 1;
        const HAS_OR_GROUPS = 1 << 2;
    }
}

impl RuleShape {
    pub fn of(rule: &Rule) -> Self {
        let mut shape = RuleShape::empty();
        if !rule.logic.include_terms.is_empty() {
            shape |= RuleShape::HAS_INCLUDES;
        }
        if !rule.logic.exclude_terms.is_empty() {
            shape |= RuleShape::HAS_EXCLUDES;
        }
        if !rule.logic.or_groups.is_empty() {
            shape |= RuleShape::HAS_OR_GROUPS;
        }
        shape
    }
}

/// Metadata attached to a rule at compile time.
#[derive(Clone, Debug)]
pub struct RuleMeta {
    pub shape: RuleShape,
    /// Functional code of the target, `None` for dangling rules.
    pub target_code: Option<FunctionalCode>,
}

#[derive(Default, Debug)]
pub struct RuleIndex {
    pub live: Vec<RuleId>,
    pub inactive: Vec<RuleId>,
    pub dangling: Vec<RuleId>,
}

/// Pre-compiled rule set with metadata and indexes.
#[derive(Debug)]
pub struct CompiledRules<'a> {
    pub rules: Vec<&'a Rule>,
    pub metas: Vec<RuleMeta>,
    pub index: RuleIndex,
}

impl<'a> CompiledRules<'a> {
    /// Compile `rules` against the parts known to `parts`.
    pub fn new(rules: &'a [Rule], parts: &PartIndex<'_>) -> Self {
        let rule_refs: Vec<&Rule> = rules.iter().collect();

        let metas: Vec<RuleMeta> = rule_refs
            .iter()
            .map(|r| RuleMeta {
                shape: RuleShape::of(r),
                target_code: parts.get(&r.target_part_id).map(|entry| entry.part.functional_code),
            })
            .collect();

        let mut index = RuleIndex::default();
        for (id, (rule, meta)) in rule_refs.iter().zip(&metas).enumerate() {
            if !rule.is_active {
                index.inactive.push(id);
            } else if meta.target_code.is_none() {
                trace!(rule = %rule.id, target = %rule.target_part_id, "dangling rule skipped");
                index.dangling.push(id);
            } else {
                index.live.push(id);
            }
        }

        CompiledRules { rules: rule_refs, metas, index }
    }

    /// Live rules in list order.
    pub fn live(&self) -> impl Iterator<Item = (&'a Rule, &RuleMeta)> + '_ {
        self.index.live.iter().map(|&id| (self.rules[id], &self.metas[id]))
    }

    /// Configuration findings for upstream review.
    pub fn diagnostics(&self) -> RuleDiagnostics {
        let ids = |list: &[RuleId]| list.iter().map(|&id| self.rules[id].id.clone()).collect::<Vec<_>>();

        let always_fires = self
            .index
            .live
            .iter()
            .filter(|&&id| self.metas[id].shape.is_empty())
            .map(|&id| self.rules[id].id.clone())
            .collect();

        let expression_issues = self
            .rules
            .iter()
            .flat_map(|rule| {
                parse_with_issues(&rule.logic.raw_expression).issues.into_iter().map(move |issue| (rule.id.clone(), issue))
            })
            .collect();

        RuleDiagnostics {
            always_fires,
            dangling: ids(&self.index.dangling),
            inactive: ids(&self.index.inactive),
            expression_issues,
        }
    }
}

/// Rule-set findings worth flagging to whoever maintains the rule sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleDiagnostics {
    /// Live rules with an empty expression.
    pub always_fires: Vec<String>,
    /// Rules whose target part does not exist.
    pub dangling: Vec<String>,
    pub inactive: Vec<String>,
    /// Malformed-bracket findings, by rule id.
    pub expression_issues: Vec<(String, ExpressionIssue)>,
}

impl RuleDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.always_fires.is_empty() && self.dangling.is_empty() && self.expression_issues.is_empty()
    }
}
