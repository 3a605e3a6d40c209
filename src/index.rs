//! Tokenized lookup over the full catalog.
//!
//! The index is built once per catalog snapshot and borrowed by both the
//! resolver (which unions part tokens into its context) and the matcher
//! (which compares query tokens against them).
//!
//! ## Invariants
//!
//! - `entries` follows catalog order; the matcher's first-seen tie-break
//!   relies on it.
//! - `by_id` maps a part id to the *first* entry carrying it. Duplicate ids
//!   after the first are still indexed for matching but never resolved.

use crate::text::{expand, extend_tokens};
use crate::{Glossary, Part};
use std::collections::{HashMap, HashSet};

/// A catalog part with its precomputed token set.
#[derive(Debug, Clone)]
pub struct IndexedPart<'a> {
    pub part: &'a Part,
    pub tokens: HashSet<String>,
    /// Uppercased ref-des, `None` when blank.
    pub ref_des: Option<String>,
    /// Uppercased part number, `None` when blank.
    pub part_number: Option<String>,
}

/// Token index over a borrowed catalog snapshot.
#[derive(Debug, Clone)]
pub struct PartIndex<'a> {
    entries: Vec<IndexedPart<'a>>,
    by_id: HashMap<&'a str, usize>,
    glossary: Option<&'a Glossary>,
}

impl<'a> PartIndex<'a> {
    /// Index `parts` without glossary expansion.
    pub fn new(parts: &'a [Part]) -> Self {
        Self::build(parts, None)
    }

    /// Index `parts`, expanding each part's text through `glossary` first.
    pub fn with_glossary(parts: &'a [Part], glossary: &'a Glossary) -> Self {
        Self::build(parts, Some(glossary))
    }

    fn build(parts: &'a [Part], glossary: Option<&'a Glossary>) -> Self {
        let mut entries = Vec::with_capacity(parts.len());
        let mut by_id = HashMap::with_capacity(parts.len());

        for part in parts {
            let source = part.token_source();
            let mut tokens = HashSet::new();
            match glossary {
                Some(g) => extend_tokens(&mut tokens, &expand(&source, g)),
                None => extend_tokens(&mut tokens, &source),
            }
            by_id.entry(part.id.as_str()).or_insert(entries.len());
            entries.push(IndexedPart {
                part,
                tokens,
                ref_des: non_blank_upper(&part.ref_des),
                part_number: non_blank_upper(&part.part_number),
            });
        }

        PartIndex { entries, by_id, glossary }
    }

    pub fn get(&self, id: &str) -> Option<&IndexedPart<'a>> {
        self.by_id.get(id).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn entries(&self) -> &[IndexedPart<'a>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Glossary this index was expanded with, if any.
    pub fn glossary(&self) -> Option<&'a Glossary> {
        self.glossary
    }

    /// Parts that share an exclusive (Mandatory) group with `id`, excluding
    /// `id` itself.
    pub fn group_peers(&self, id: &str) -> impl Iterator<Item = &IndexedPart<'a>> {
        let group = self.get(id).and_then(|entry| entry.part.exclusive_group());
        self.entries.iter().filter(move |entry| match group {
            Some(group) => entry.part.id != id && entry.part.ref_des.trim().eq_ignore_ascii_case(group),
            None => false,
        })
    }
}

fn non_blank_upper(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_text_fields_in_catalog_order() {
        let parts = vec![
            part! { id: "p1", number: "X9-350", name: "Turbo Diesel 350HP Engine", ref_des: "eng" },
            part! { id: "p2", remarks: "STD CAB", std_remarks: "rops" },
        ];
        let index = PartIndex::new(&parts);
        assert_eq!(index.len(), 2);
        let p1 = index.get("p1").unwrap();
        assert!(p1.tokens.contains("X9-350"));
        assert!(p1.tokens.contains("DIESEL"));
        assert_eq!(p1.ref_des.as_deref(), Some("ENG"));
        assert_eq!(p1.part_number.as_deref(), Some("X9-350"));
        let p2 = index.get("p2").unwrap();
        assert!(p2.tokens.contains("ROPS"));
        assert_eq!(p2.part_number, None);
        assert_eq!(index.entries()[1].part.id, "p2");
    }

    #[test]
    fn glossary_expansion_widens_part_tokens() {
        let parts = vec![part! { id: "p1", name: "HYD PUMP" }];
        let glossary: Glossary = [("HYD", "Hydraulic")].into_iter().collect();
        let plain = PartIndex::new(&parts);
        let expanded = PartIndex::with_glossary(&parts, &glossary);
        assert!(!plain.get("p1").unwrap().tokens.contains("HYDRAULIC"));
        assert!(expanded.get("p1").unwrap().tokens.contains("HYDRAULIC"));
    }

    #[test]
    fn group_peers_only_for_mandatory_parts() {
        let parts = vec![
            part! { id: "m1", code: Mandatory, ref_des: "ENG" },
            part! { id: "m2", code: Mandatory, ref_des: "ENG" },
            part! { id: "o1", code: Optional, ref_des: "ENG" },
            part! { id: "m3", code: Mandatory, ref_des: "CAB" },
        ];
        let index = PartIndex::new(&parts);
        let peers: Vec<&str> = index.group_peers("m1").map(|e| e.part.id.as_str()).collect();
        assert_eq!(peers, vec!["m2", "o1"]);
        assert_eq!(index.group_peers("o1").count(), 0);
        assert_eq!(index.group_peers("missing").count(), 0);
    }

    #[test]
    fn first_duplicate_id_wins_lookup() {
        let parts = vec![part! { id: "dup", name: "FIRST" }, part! { id: "dup", name: "SECOND" }];
        let index = PartIndex::new(&parts);
        assert!(index.get("dup").unwrap().tokens.contains("FIRST"));
        assert_eq!(index.len(), 2);
    }
}
