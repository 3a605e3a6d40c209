use crate::engine::{Resolution, ResolveOptions, Resolver};
use crate::expr::{RuleLogic, parse_with_issues};
use crate::index::PartIndex;
use crate::matcher::{ConfidenceMatcher, MatchResult, OptionQuery};
use crate::{Part, Rule};

/// Resolve the parts implied by `confirmed` under `rules`, with the default
/// pass bound.
///
/// Returns implied ids in firing order; confirmed ids are never repeated.
///
/// # Example
/// ```
/// use riglogic::{FunctionalCode, Part, Rule, parse_expression, resolve};
///
/// let mut base = Part::new("base1");
/// base.remarks = "STD CAB".into();
/// let mut opt = Part::new("opt1");
/// opt.functional_code = FunctionalCode::Optional;
/// opt.ref_des = "HYD".into();
///
/// let rules = vec![Rule::new("r1", "opt1", parse_expression("CAB"))];
/// let implied = resolve(&[base, opt], &rules, Vec::<String>::new());
/// assert_eq!(implied, vec!["opt1".to_string()]);
/// ```
pub fn resolve<I, S>(parts: &[Part], rules: &[Rule], confirmed: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let index = PartIndex::new(parts);
    Resolver::new(&index, rules).resolve(confirmed)
}

/// Resolve and also report convergence and per-pass metrics.
pub fn resolve_verbose<I, S>(parts: &[Part], rules: &[Rule], confirmed: I, options: ResolveOptions) -> Resolution
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let index = PartIndex::new(parts);
    Resolver::with_options(&index, rules, options).run(confirmed)
}

/// Score one extracted option against the catalog.
pub fn match_option(parts: &[Part], query: &OptionQuery) -> MatchResult {
    let index = PartIndex::new(parts);
    ConfidenceMatcher::new(&index).match_one(query)
}

/// Score many options, indexing the catalog once.
pub fn match_options(parts: &[Part], queries: &[OptionQuery]) -> Vec<MatchResult> {
    let index = PartIndex::new(parts);
    ConfidenceMatcher::new(&index).match_all(queries)
}

/// Parse a raw rule expression, discarding diagnostics.
///
/// Malformed input never fails; see [`parse_with_issues`] for what was
/// recovered.
pub fn parse_expression(raw: &str) -> RuleLogic {
    parse_with_issues(raw).logic
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::ConfidenceLevel;

    #[test]
    fn parse_expression_splits_groups_exclusions_and_includes() {
        let logic = parse_expression("(CAB/CAN) STD [TT BT]");
        assert_eq!(logic.or_groups, vec![vec!["CAB".to_string(), "CAN".to_string()]]);
        assert_eq!(logic.exclude_terms, vec!["TT".to_string(), "BT".to_string()]);
        assert_eq!(logic.include_terms, vec!["STD".to_string()]);
        assert_eq!(logic.raw_expression, "(CAB/CAN) STD [TT BT]");
    }

    #[test]
    fn resolve_implies_optional_from_baseline_tokens() {
        let parts = vec![
            part! { id: "base1", remarks: "STD CAB" },
            part! { id: "opt1", code: Optional, ref_des: "HYD" },
        ];
        let rules = vec![rule!("r1" => "opt1", "CAB")];
        assert_eq!(resolve(&parts, &rules, Vec::<String>::new()), vec!["opt1".to_string()]);
    }

    #[test]
    fn resolve_picks_one_mandatory_per_group() {
        let parts = vec![
            part! { id: "m1", code: Mandatory, ref_des: "ENG" },
            part! { id: "m2", code: Mandatory, ref_des: "ENG" },
        ];
        let rules = vec![rule!("r1" => "m1", ""), rule!("r2" => "m2", "")];
        let implied = resolve(&parts, &rules, Vec::<String>::new());
        assert_eq!(implied.len(), 1);
        assert!(implied[0] == "m1" || implied[0] == "m2");
    }

    #[test]
    fn resolve_verbose_reports_convergence() {
        let parts = vec![part! { id: "base1", remarks: "STD CAB" }, part! { id: "opt1", code: Optional }];
        let rules = vec![rule!("r1" => "opt1", "CAB")];
        let run = resolve_verbose(&parts, &rules, Vec::<String>::new(), ResolveOptions::default());
        assert!(run.converged);
        assert_eq!(run.implied, vec!["opt1".to_string()]);
        assert_eq!(run.metrics.passes.len(), 2);
    }

    #[test]
    fn match_option_verifies_full_overlap() {
        let parts = vec![part! { id: "eng", number: "X9-350", name: "Turbo Diesel 350HP Engine" }];
        let result = match_option(&parts, &OptionQuery::new("ENGINE", "TURBO DIESEL 350HP"));
        assert_eq!(result.matched_part_id.as_deref(), Some("eng"));
        assert!(result.confidence_score >= 0.9);
        assert_eq!(result.confidence_level, ConfidenceLevel::AutoVerified);
    }

    #[test]
    fn match_option_without_overlap_is_uncertain() {
        let parts = vec![part! { id: "eng", number: "X9-350", name: "Turbo Diesel 350HP Engine" }];
        let result = match_option(&parts, &OptionQuery::new("PAINT", "METALLIC BLUE"));
        assert_eq!(result.confidence_score, 0.0);
        assert_eq!(result.confidence_level, ConfidenceLevel::Uncertain);
        assert!(result.matched_part_id.is_none());
    }

    #[test]
    fn match_options_keeps_query_order() {
        let parts = vec![part! { id: "eng", name: "Turbo Diesel Engine" }, part! { id: "cab", name: "ROPS Cab" }];
        let queries = vec![OptionQuery::new("CAB", "ROPS"), OptionQuery::new("ENGINE", "TURBO DIESEL")];
        let results = match_options(&parts, &queries);
        let ids: Vec<_> = results.iter().map(|r| r.matched_part_id.as_deref()).collect();
        assert_eq!(ids, vec![Some("cab"), Some("eng")]);
    }
}
