//! Confidence matcher - reconciles extracted option text with catalog parts.
//!
//! Scanned orders arrive as loose `(category, selection)` pairs. Each pair is
//! scored against every indexed part and the best candidate is returned with
//! a confidence band:
//!
//! ```text
//! "ENGINE" + "TURBO DIESEL 350HP"
//!       │
//!       ├── part number appears verbatim? ────────► exact      (1.0)
//!       ├── knowledge table confirms this pair? ──► knowledge  (1.0)
//!       └── token overlap |q ∩ c| / |q| ──────────► overlap
//!              + ref-des bonus when the category
//!                names the candidate's ref-des     (capped at 1.0)
//!       │
//!       ▼
//! best score ──► AutoVerified (≥0.9) │ ReviewNeeded (≥0.5) │ Uncertain
//! ```
//!
//! Exact and knowledge hits score above 1.0 internally so they beat a
//! perfect overlap on another part; the reported score is clamped.

use crate::index::{IndexedPart, PartIndex};
use crate::knowledge::KnowledgeView;
use crate::text::{expand, tokenize, words};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Internal score for exact part-number and knowledge hits.
const EXACT_SCORE: f64 = 2.0;

/// One extracted option line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionQuery {
    pub category: String,
    pub selection: String,
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl OptionQuery {
    pub fn new(category: impl Into<String>, selection: impl Into<String>) -> Self {
        OptionQuery { category: category.into(), selection: selection.into(), quantity: None }
    }

    /// `"<CATEGORY> <SELECTION>"`, uppercased.
    fn text(&self) -> String {
        format!("{} {}", self.category, self.selection).to_uppercase()
    }
}

/// Discrete band derived from a match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    AutoVerified,
    ReviewNeeded,
    Uncertain,
}

/// Which signal produced the winning score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchSignal {
    PartNumber,
    Knowledge,
    Overlap,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub category: String,
    pub selection: String,
    pub matched_part_id: Option<String>,
    pub matched_part_number: Option<String>,
    /// Always in `[0, 1]`.
    pub confidence_score: f64,
    pub confidence_level: ConfidenceLevel,
    pub signal: MatchSignal,
}

impl MatchResult {
    /// The matched part id, if the score reaches the caller's auto-select
    /// floor.
    pub fn accepted(&self, floor: f64) -> Option<&str> {
        if self.confidence_score >= floor { self.matched_part_id.as_deref() } else { None }
    }
}

/// Matcher weights and band thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchOptions {
    /// Added to a non-zero overlap when the category names the candidate's ref-des.
    pub ref_des_bonus: f64,
    pub auto_verified: f64,
    pub review_needed: f64,
    /// Expand query text through the index's glossary before tokenizing.
    pub expand_glossary: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions { ref_des_bonus: 0.25, auto_verified: 0.9, review_needed: 0.5, expand_glossary: true }
    }
}

impl MatchOptions {
    pub fn level(&self, score: f64) -> ConfidenceLevel {
        if score >= self.auto_verified {
            ConfidenceLevel::AutoVerified
        } else if score >= self.review_needed {
            ConfidenceLevel::ReviewNeeded
        } else {
            ConfidenceLevel::Uncertain
        }
    }
}

/// Scores option queries against a [`PartIndex`].
#[derive(Debug, Clone)]
pub struct ConfidenceMatcher<'a> {
    index: &'a PartIndex<'a>,
    knowledge: KnowledgeView<'a>,
    options: MatchOptions,
}

impl<'a> ConfidenceMatcher<'a> {
    pub fn new(index: &'a PartIndex<'a>) -> Self {
        ConfidenceMatcher { index, knowledge: KnowledgeView::empty(), options: MatchOptions::default() }
    }

    pub fn with_options(mut self, options: MatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_knowledge(mut self, knowledge: KnowledgeView<'a>) -> Self {
        self.knowledge = knowledge;
        self
    }

    /// Best catalog match for one query.
    pub fn match_one(&self, query: &OptionQuery) -> MatchResult {
        let text = query.text();
        let query_tokens = self.query_tokens(&text);
        let category_words: HashSet<String> = words(&query.category).collect();
        let known_part_number = self.knowledge.part_number_for(&query.category, &query.selection);

        let mut best: Option<(&IndexedPart<'a>, f64, MatchSignal)> = None;
        for candidate in self.index.entries() {
            let (score, signal) =
                self.score(candidate, &text, &query_tokens, &category_words, known_part_number.as_deref());
            if score > best.map_or(0.0, |(_, s, _)| s) {
                best = Some((candidate, score, signal));
            }
        }

        let result = match best {
            Some((candidate, score, signal)) => {
                let score = score.min(1.0);
                MatchResult {
                    category: query.category.clone(),
                    selection: query.selection.clone(),
                    matched_part_id: Some(candidate.part.id.clone()),
                    matched_part_number: Some(candidate.part.part_number.clone()),
                    confidence_score: score,
                    confidence_level: self.options.level(score),
                    signal,
                }
            }
            None => MatchResult {
                category: query.category.clone(),
                selection: query.selection.clone(),
                matched_part_id: None,
                matched_part_number: None,
                confidence_score: 0.0,
                confidence_level: ConfidenceLevel::Uncertain,
                signal: MatchSignal::None,
            },
        };

        debug!(
            category = %query.category,
            selection = %query.selection,
            part = ?result.matched_part_id,
            score = result.confidence_score,
            level = ?result.confidence_level,
            "option matched"
        );
        result
    }

    /// Match every query, preserving input order.
    pub fn match_all(&self, queries: &[OptionQuery]) -> Vec<MatchResult> {
        queries.iter().map(|query| self.match_one(query)).collect()
    }

    fn query_tokens(&self, text: &str) -> HashSet<String> {
        match self.index.glossary() {
            Some(glossary) if self.options.expand_glossary => tokenize(&expand(text, glossary)),
            _ => tokenize(text),
        }
    }

    /// Maximum of the three signals for one candidate.
    fn score(
        &self,
        candidate: &IndexedPart<'_>,
        text: &str,
        query_tokens: &HashSet<String>,
        category_words: &HashSet<String>,
        known_part_number: Option<&str>,
    ) -> (f64, MatchSignal) {
        if let Some(part_number) = candidate.part_number.as_deref() {
            if text.contains(part_number) {
                return (EXACT_SCORE, MatchSignal::PartNumber);
            }
            if known_part_number == Some(part_number) {
                return (EXACT_SCORE, MatchSignal::Knowledge);
            }
        }

        if query_tokens.is_empty() {
            return (0.0, MatchSignal::None);
        }
        let shared = query_tokens.intersection(&candidate.tokens).count();
        if shared == 0 {
            return (0.0, MatchSignal::None);
        }
        let mut score = shared as f64 / query_tokens.len() as f64;
        if candidate.ref_des.as_ref().is_some_and(|ref_des| category_words.contains(ref_des)) {
            score += self.options.ref_des_bonus;
        }
        (score.min(1.0), MatchSignal::Overlap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Glossary, KnowledgeStore, Part};
    use chrono::Utc;

    fn catalog() -> Vec<Part> {
        vec![
            part! { id: "eng", number: "X9-350", name: "Turbo Diesel 350HP Engine", ref_des: "ENG" },
            part! { id: "cab", number: "C-200", name: "ROPS Cab Heater", ref_des: "CAB" },
            part! { id: "trk", number: "T-600", name: "Track Shoe 600mm", ref_des: "UCG" },
        ]
    }

    #[test]
    fn full_overlap_is_auto_verified() {
        let parts = catalog();
        let index = PartIndex::new(&parts);
        let result = ConfidenceMatcher::new(&index).match_one(&OptionQuery::new("ENGINE", "TURBO DIESEL 350HP"));
        assert_eq!(result.matched_part_id.as_deref(), Some("eng"));
        assert!((result.confidence_score - 1.0).abs() < 1e-9);
        assert_eq!(result.confidence_level, ConfidenceLevel::AutoVerified);
        assert_eq!(result.signal, MatchSignal::Overlap);
    }

    #[test]
    fn zero_overlap_is_uncertain_without_match() {
        let parts = catalog();
        let index = PartIndex::new(&parts);
        let result = ConfidenceMatcher::new(&index).match_one(&OptionQuery::new("PAINT", "METALLIC BLUE"));
        assert_eq!(result.matched_part_id, None);
        assert_eq!(result.confidence_score, 0.0);
        assert_eq!(result.confidence_level, ConfidenceLevel::Uncertain);
        assert_eq!(result.signal, MatchSignal::None);
    }

    #[test]
    fn empty_query_scores_zero() {
        let parts = catalog();
        let index = PartIndex::new(&parts);
        let result = ConfidenceMatcher::new(&index).match_one(&OptionQuery::new("", " / "));
        assert_eq!(result.matched_part_id, None);
        assert_eq!(result.confidence_score, 0.0);
    }

    #[test]
    fn part_number_containment_beats_perfect_overlap() {
        let parts = catalog();
        let index = PartIndex::new(&parts);
        let result = ConfidenceMatcher::new(&index).match_one(&OptionQuery::new("ENGINE", "TURBO DIESEL 350HP t-600"));
        assert_eq!(result.matched_part_id.as_deref(), Some("trk"));
        assert_eq!(result.confidence_score, 1.0);
        assert_eq!(result.signal, MatchSignal::PartNumber);
    }

    #[test]
    fn knowledge_hit_counts_as_exact() {
        let parts = catalog();
        let index = PartIndex::new(&parts);
        let mut store = KnowledgeStore::new();
        store.commit("D6", "HEATING", "Winter package", "C-200", Utc::now());

        let matcher = ConfidenceMatcher::new(&index).with_knowledge(store.view("D6"));
        let result = matcher.match_one(&OptionQuery::new("heating", "WINTER PACKAGE"));
        assert_eq!(result.matched_part_id.as_deref(), Some("cab"));
        assert_eq!(result.confidence_level, ConfidenceLevel::AutoVerified);
        assert_eq!(result.signal, MatchSignal::Knowledge);

        let other_model = ConfidenceMatcher::new(&index).with_knowledge(store.view("D8"));
        assert_eq!(other_model.match_one(&OptionQuery::new("heating", "WINTER PACKAGE")).matched_part_id, None);
    }

    #[test]
    fn ref_des_bonus_lifts_partial_overlap() {
        let parts = catalog();
        let index = PartIndex::new(&parts);
        let matcher = ConfidenceMatcher::new(&index);

        // Query tokens: CAB, HEATER, DELUXE, CONTROL -> 2/4 shared with the cab part.
        let with_ref_des = matcher.match_one(&OptionQuery::new("CAB", "heater deluxe control"));
        assert_eq!(with_ref_des.matched_part_id.as_deref(), Some("cab"));
        assert!((with_ref_des.confidence_score - 0.75).abs() < 1e-9);
        assert_eq!(with_ref_des.confidence_level, ConfidenceLevel::ReviewNeeded);

        let without = matcher.match_one(&OptionQuery::new("COMFORT", "cab heater deluxe control"));
        assert!((without.confidence_score - 0.4).abs() < 1e-9);
        assert_eq!(without.confidence_level, ConfidenceLevel::Uncertain);
        assert_eq!(without.accepted(0.4), Some("cab"));
        assert_eq!(without.accepted(0.5), None);
    }

    #[test]
    fn ref_des_bonus_needs_some_overlap() {
        let parts = catalog();
        let index = PartIndex::new(&parts);
        let result = ConfidenceMatcher::new(&index).match_one(&OptionQuery::new("UCG", "METALLIC BLUE"));
        assert_eq!(result.matched_part_id, None);
        assert_eq!(result.confidence_score, 0.0);
        assert_eq!(result.confidence_level, ConfidenceLevel::Uncertain);
    }

    #[test]
    fn overlap_plus_bonus_is_capped_at_one() {
        let parts = catalog();
        let index = PartIndex::new(&parts);

        // 4 of 5 query tokens shared (0.8) plus the 0.25 bonus for ENG.
        let result = ConfidenceMatcher::new(&index).match_one(&OptionQuery::new("ENG", "TURBO DIESEL 350HP ENGINE"));
        assert_eq!(result.matched_part_id.as_deref(), Some("eng"));
        assert_eq!(result.confidence_score, 1.0);
        assert_eq!(result.signal, MatchSignal::Overlap);
        assert_eq!(result.confidence_level, ConfidenceLevel::AutoVerified);
    }

    #[test]
    fn first_seen_wins_exact_ties() {
        let parts = vec![part! { id: "a", name: "WORK LIGHT" }, part! { id: "b", name: "WORK LIGHT" }];
        let index = PartIndex::new(&parts);
        let result = ConfidenceMatcher::new(&index).match_one(&OptionQuery::new("LIGHTS", "WORK LIGHT"));
        assert_eq!(result.matched_part_id.as_deref(), Some("a"));
    }

    #[test]
    fn glossary_expands_abbreviated_queries() {
        let parts = vec![part! { id: "ac", number: "AC-1", name: "Air Conditioner" }];
        let glossary: Glossary = [("A/C", "Air Conditioner")].into_iter().collect();
        let index = PartIndex::with_glossary(&parts, &glossary);

        let expanded = ConfidenceMatcher::new(&index).match_one(&OptionQuery::new("CAB", "A/C"));
        assert_eq!(expanded.matched_part_id.as_deref(), Some("ac"));
        assert!((expanded.confidence_score - 2.0 / 3.0).abs() < 1e-9);

        let plain = ConfidenceMatcher::new(&index)
            .with_options(MatchOptions { expand_glossary: false, ..MatchOptions::default() })
            .match_one(&OptionQuery::new("CAB", "A/C"));
        assert_eq!(plain.matched_part_id, None);
    }

    #[test]
    fn match_all_preserves_order() {
        let parts = catalog();
        let index = PartIndex::new(&parts);
        let queries = vec![OptionQuery::new("PAINT", "BLUE"), OptionQuery::new("ENGINE", "X9-350")];
        let results = ConfidenceMatcher::new(&index).match_all(&queries);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].matched_part_id, None);
        assert_eq!(results[1].matched_part_id.as_deref(), Some("eng"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::Part;
    use proptest::prelude::*;

    proptest! {
        /// Appending a part's own number never lowers that part's score.
        #[test]
        fn appending_part_number_never_lowers_score(
            words in prop::collection::vec("[A-Z]{3,6}", 0..5),
            name in prop::collection::vec("[A-Z]{3,6}", 1..4),
            number in "[A-Z][0-9]-[0-9]{3}",
        ) {
            let mut part = Part::new("p");
            part.part_number = number.clone();
            part.name = name.join(" ");
            let parts = vec![part];
            let index = PartIndex::new(&parts);
            let matcher = ConfidenceMatcher::new(&index);

            let selection = words.join(" ");
            let before = matcher.match_one(&OptionQuery::new("OPT", selection.clone()));
            let after = matcher.match_one(&OptionQuery::new("OPT", format!("{selection} {number}")));
            prop_assert!(after.confidence_score >= before.confidence_score);
            prop_assert_eq!(after.matched_part_id.as_deref(), Some("p"));
        }
    }
}
