//! Final bill of parts for a configured machine.
//!
//! The manifest is every Baseline part plus whatever the user confirmed and
//! the resolver implied, minus Reference parts (they exist only so scanned
//! orders can be matched against them). Parts are grouped by ref-des in
//! catalog order and, within a group, by descending `select_preference`.

use crate::{FunctionalCode, Part};
use std::collections::HashSet;

/// One ref-des group of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestGroup<'a> {
    /// Trimmed ref-des; empty for parts without one.
    pub ref_des: String,
    pub parts: Vec<&'a Part>,
}

/// Assemble the manifest for `confirmed` + `implied` selections.
///
/// Ids that match no part are ignored; a part listed more than once (by
/// duplicate id or by being both confirmed and implied) appears once.
pub fn build_manifest<'a, C, I>(parts: &'a [Part], confirmed: C, implied: I) -> Vec<ManifestGroup<'a>>
where
    C: IntoIterator,
    C::Item: AsRef<str>,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let selected: HashSet<String> = confirmed
        .into_iter()
        .map(|id| id.as_ref().to_string())
        .chain(implied.into_iter().map(|id| id.as_ref().to_string()))
        .collect();

    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut groups: Vec<ManifestGroup<'a>> = Vec::new();

    for part in parts {
        let included = match part.functional_code {
            FunctionalCode::Reference => false,
            FunctionalCode::Baseline => true,
            FunctionalCode::Optional | FunctionalCode::Mandatory => selected.contains(&part.id),
        };
        if !included || !seen_ids.insert(part.id.as_str()) {
            continue;
        }

        let ref_des = part.ref_des.trim();
        let group_idx = match groups.iter().position(|g| g.ref_des.eq_ignore_ascii_case(ref_des)) {
            Some(idx) => idx,
            None => {
                groups.push(ManifestGroup { ref_des: ref_des.to_string(), parts: Vec::new() });
                groups.len() - 1
            }
        };
        groups[group_idx].parts.push(part);
    }

    // Stable sort keeps catalog order among equal preferences.
    for group in &mut groups {
        group.parts.sort_by(|a, b| b.select_preference.cmp(&a.select_preference));
    }

    groups
}
