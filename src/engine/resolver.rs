//! Bounded fixpoint resolver.
//!
//! ## Pass structure
//!
//! ```text
//! base tokens (Baseline parts)            computed once
//!      │
//!      ▼
//! pass n:  context = base ∪ tokens(confirmed ∪ implied)
//!          for each live rule, in list order:
//!            target confirmed / implied      -> skip
//!            target's Mandatory group taken  -> skip
//!            logic holds in context          -> imply target
//!      │
//!      ├── nothing fired     -> converged
//!      └── pass == max_passes -> stop; converged only if no live rule
//!                                could still fire
//! ```
//!
//! The context is fixed for the duration of a pass: a part implied mid-pass
//! contributes its tokens from the next pass on. Group exclusivity, however,
//! sees it immediately, so two rules for the same Mandatory group can never
//! both fire in one pass.

use super::compiled_rules::CompiledRules;
use super::metrics::{PassMetrics, Resolution, ResolveMetrics};
use crate::index::PartIndex;
use crate::{FunctionalCode, Rule};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, trace};

/// Options that bound resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolveOptions {
    /// Maximum number of passes before giving up on a fixpoint.
    pub max_passes: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        ResolveOptions { max_passes: 10 }
    }
}

/// Resolver over one catalog snapshot and rule set.
///
/// Usage: build once with `Resolver::new(&index, &rules)`, then call
/// [`Resolver::resolve`] or [`Resolver::run`] for each confirmed set. The
/// resolver holds no per-run state, so it can be shared across threads.
#[derive(Debug)]
pub struct Resolver<'a> {
    index: &'a PartIndex<'a>,
    compiled: CompiledRules<'a>,
    base_tokens: HashSet<String>,
    options: ResolveOptions,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a PartIndex<'a>, rules: &'a [Rule]) -> Self {
        Self::with_options(index, rules, ResolveOptions::default())
    }

    pub fn with_options(index: &'a PartIndex<'a>, rules: &'a [Rule], options: ResolveOptions) -> Self {
        let compiled = CompiledRules::new(rules, index);
        let base_tokens = index
            .entries()
            .iter()
            .filter(|entry| entry.part.functional_code == FunctionalCode::Baseline)
            .flat_map(|entry| entry.tokens.iter().cloned())
            .collect();
        Resolver { index, compiled, base_tokens, options }
    }

    pub fn compiled(&self) -> &CompiledRules<'a> {
        &self.compiled
    }

    /// Implied part ids for `confirmed`, in firing order.
    pub fn resolve<I, S>(&self, confirmed: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.run(confirmed).implied
    }

    /// Resolve and return convergence plus per-pass metrics.
    pub fn run<I, S>(&self, confirmed: I) -> Resolution
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let confirmed: HashSet<String> = confirmed.into_iter().map(|id| id.as_ref().to_string()).collect();
        self.saturate(&confirmed)
    }

    fn saturate(&self, confirmed: &HashSet<String>) -> Resolution {
        let start = Instant::now();
        let mut metrics = ResolveMetrics::default();
        let mut implied: Vec<&'a str> = Vec::new();
        let mut implied_set: HashSet<&'a str> = HashSet::new();
        let mut converged = false;

        for pass in 1..=self.options.max_passes {
            let pass_start = Instant::now();
            let context = self.context(confirmed, &implied_set);
            let mut stats = PassMetrics { context_size: context.len(), ..PassMetrics::default() };

            for (rule, meta) in self.compiled.live() {
                let target = rule.target_part_id.as_str();
                if confirmed.contains(target) || implied_set.contains(target) {
                    continue;
                }
                if meta.target_code == Some(FunctionalCode::Mandatory) && self.group_taken(target, confirmed, &implied_set)
                {
                    trace!(rule = %rule.id, target, "group already resolved");
                    stats.rules_group_skipped += 1;
                    continue;
                }

                stats.rules_evaluated += 1;
                if rule.logic.holds(&context) {
                    trace!(rule = %rule.id, target, expression = %rule.logic.raw_expression, "rule fired");
                    implied.push(target);
                    implied_set.insert(target);
                    stats.implied.push(target.to_string());
                }
            }

            stats.duration = pass_start.elapsed();
            let fired = stats.implied.len();
            debug!(pass, fired, evaluated = stats.rules_evaluated, context = stats.context_size, "resolver pass");
            metrics.passes.push(stats);

            if fired == 0 {
                converged = true;
                break;
            }
        }

        // The final pass may have completed the fixpoint; only rules that
        // could still fire make the result truncated.
        if !converged {
            converged = !self.has_pending(confirmed, &implied_set);
        }
        if !converged {
            debug!(max_passes = self.options.max_passes, "pass limit reached before fixpoint");
        }

        metrics.total = start.elapsed();
        Resolution { implied: implied.into_iter().map(str::to_string).collect(), converged, metrics }
    }

    /// True when some live rule would still fire against the current selection.
    fn has_pending(&self, confirmed: &HashSet<String>, implied: &HashSet<&str>) -> bool {
        let context = self.context(confirmed, implied);
        self.compiled.live().any(|(rule, meta)| {
            let target = rule.target_part_id.as_str();
            if confirmed.contains(target) || implied.contains(target) {
                return false;
            }
            if meta.target_code == Some(FunctionalCode::Mandatory) && self.group_taken(target, confirmed, implied) {
                return false;
            }
            rule.logic.holds(&context)
        })
    }

    /// Base tokens plus the tokens of every confirmed or implied part.
    fn context(&self, confirmed: &HashSet<String>, implied: &HashSet<&str>) -> HashSet<String> {
        let mut context = self.base_tokens.clone();
        let selected = confirmed.iter().map(String::as_str).chain(implied.iter().copied());
        for id in selected {
            if let Some(entry) = self.index.get(id) {
                context.extend(entry.tokens.iter().cloned());
            }
        }
        context
    }

    /// True when another member of `target`'s ref-des group is already selected.
    fn group_taken(&self, target: &str, confirmed: &HashSet<String>, implied: &HashSet<&str>) -> bool {
        self.index
            .group_peers(target)
            .any(|peer| confirmed.contains(peer.part.id.as_str()) || implied.contains(peer.part.id.as_str()))
    }
}
