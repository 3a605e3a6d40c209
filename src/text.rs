//! Tokenization and glossary expansion.
//!
//! Every comparison in the engine happens on token sets produced here: rule
//! terms are looked up in a context built from part tokens, and the matcher
//! compares query tokens against indexed part tokens. Both sides must
//! therefore go through the same normalization:
//!
//! ```text
//! "Cab w/ A/C, (ROPS)"  ──split──▶ Cab w A C ROPS
//!                       ──upper──▶ CAB W A C ROPS
//!                       ──filter─▶ {CAB, ROPS}        (len > 2, no stop words)
//! ```
//!
//! Glossary expansion runs *before* splitting so multi-character
//! abbreviations containing separators (`A/C`) can still be recognised.

use crate::Glossary;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Words that carry no selection meaning in catalog text.
pub const STOP_WORDS: &[&str] = &["WITH", "AND", "THE", "FOR", "NONE", "UNIT", "OPTIONS"];

static STOP_WORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOP_WORDS.iter().copied().collect());

/// Minimum token length is three characters.
const MIN_TOKEN_CHARS: usize = 3;

/// Tokenize `text` into a normalized set of uppercase tokens.
pub fn tokenize(text: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();
    extend_tokens(&mut tokens, text);
    tokens
}

/// Tokenize `text` after appending the full phrase of every glossary
/// abbreviation that occurs in it.
pub fn tokenize_expanded(text: &str, glossary: &Glossary) -> HashSet<String> {
    tokenize(&expand(text, glossary))
}

/// Uppercased words of `text` with no length or stop-word filtering.
pub(crate) fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    separators().split(text).filter(|w| !w.is_empty()).map(str::to_uppercase)
}

fn separators() -> &'static regex::Regex {
    regex!(r"[\s,./()\[\]]+")
}

pub(crate) fn extend_tokens(tokens: &mut HashSet<String>, text: &str) {
    for raw in separators().split(text) {
        let token = raw.to_uppercase();
        if token.chars().count() < MIN_TOKEN_CHARS || STOP_WORD_SET.contains(token.as_str()) {
            continue;
        }
        tokens.insert(token);
    }
}

/// Append glossary phrases for every abbreviation found (case-insensitively)
/// as a substring of `text`.
///
/// Expansion is single-step: phrases appended here are not themselves
/// scanned for further abbreviations, which keeps the result independent of
/// glossary iteration order.
pub(crate) fn expand(text: &str, glossary: &Glossary) -> String {
    if glossary.is_empty() {
        return text.to_string();
    }
    let upper = text.to_uppercase();
    let mut expanded = text.to_string();
    for (abbreviation, full) in glossary.iter() {
        if upper.contains(abbreviation) {
            expanded.push(' ');
            expanded.push_str(full);
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(tokens: HashSet<String>) -> Vec<String> {
        let mut v: Vec<String> = tokens.into_iter().collect();
        v.sort();
        v
    }

    #[test]
    fn splits_on_separators_and_filters_short_tokens() {
        let tokens = tokenize("Cab w/ A/C, (ROPS) [FOPS].heated");
        assert_eq!(sorted(tokens), vec!["CAB", "FOPS", "HEATED", "ROPS"]);
    }

    #[test]
    fn drops_stop_words() {
        let tokens = tokenize("Unit with the options for none and LIGHTS");
        assert_eq!(sorted(tokens), vec!["LIGHTS"]);
    }

    #[test]
    fn keeps_hyphenated_part_numbers_whole() {
        let tokens = tokenize("X9-350 turbo");
        assert!(tokens.contains("X9-350"));
        assert!(tokens.contains("TURBO"));
    }

    #[test]
    fn tokenize_is_idempotent_and_order_independent() {
        let a = tokenize("heavy duty axle heavy");
        let b = tokenize("axle duty heavy");
        assert_eq!(a, b);
        let rejoined: Vec<String> = sorted(a.clone());
        assert_eq!(tokenize(&rejoined.join(" ")), a);
    }

    #[test]
    fn glossary_appends_full_words() {
        let glossary: Glossary = [("A/C", "Air Conditioner"), ("HYD", "Hydraulic")].into_iter().collect();
        let tokens = tokenize_expanded("cab with a/c", &glossary);
        assert_eq!(sorted(tokens), vec!["AIR", "CAB", "CONDITIONER"]);
    }

    #[test]
    fn glossary_expansion_is_idempotent() {
        let glossary: Glossary = [("HYD", "Hydraulic Pump")].into_iter().collect();
        let once = tokenize_expanded("HYD kit", &glossary);
        let twice = tokenize_expanded(&expand("HYD kit", &glossary), &glossary);
        assert_eq!(once, twice);
    }

    #[test]
    fn words_keep_short_and_stop_words() {
        let w: Vec<String> = words("hy / the,CAB").collect();
        assert_eq!(w, vec!["HY", "THE", "CAB"]);
    }

    #[test]
    fn empty_text_yields_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" , / () [] ").is_empty());
    }
}
