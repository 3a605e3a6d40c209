//! Confirmed option knowledge.
//!
//! Every time a reviewer accepts a match, the caller may record the
//! `(category, selection) -> part number` association for that machine
//! model. The matcher treats a recorded association as an exact match on
//! later orders.
//!
//! The store is owned by the caller. The engine only ever sees a
//! [`KnowledgeView`], a read-only borrow scoped to one model; writes happen
//! through [`KnowledgeStore::commit`], which nothing inside the engine calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One confirmed association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEntry {
    pub model: String,
    pub category: String,
    pub selection: String,
    pub part_number: String,
    #[serde(default = "one")]
    pub confirmations: u32,
    pub last_confirmed: DateTime<Utc>,
}

fn one() -> u32 {
    1
}

type Key = (String, String);

/// Uppercase and collapse whitespace so scanned text with stray spacing still
/// hits the same key.
fn normalize(text: &str) -> String {
    text.split_whitespace().map(str::to_uppercase).collect::<Vec<_>>().join(" ")
}

fn key(category: &str, selection: &str) -> Key {
    (normalize(category), normalize(selection))
}

/// Knowledge table keyed by machine model name.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeStore {
    models: HashMap<String, BTreeMap<Key, KnowledgeEntry>>,
}

impl KnowledgeStore {
    pub fn new() -> Self {
        KnowledgeStore::default()
    }

    /// Build a store from persisted entries; later duplicates of a key win.
    pub fn from_entries(entries: impl IntoIterator<Item = KnowledgeEntry>) -> Self {
        let mut store = KnowledgeStore::new();
        for entry in entries {
            store
                .models
                .entry(normalize(&entry.model))
                .or_default()
                .insert(key(&entry.category, &entry.selection), entry);
        }
        store
    }

    /// Read-only view for one model. Unknown models give an empty view.
    pub fn view(&self, model: &str) -> KnowledgeView<'_> {
        KnowledgeView { entries: self.models.get(&normalize(model)) }
    }

    /// Record a reviewer-confirmed association.
    ///
    /// Re-confirming the same part number bumps the counter and timestamp; a
    /// different part number replaces the association and restarts the count.
    pub fn commit(
        &mut self,
        model: &str,
        category: &str,
        selection: &str,
        part_number: &str,
        at: DateTime<Utc>,
    ) -> &KnowledgeEntry {
        let table = self.models.entry(normalize(model)).or_default();
        let entry = table.entry(key(category, selection)).or_insert_with(|| KnowledgeEntry {
            model: model.trim().to_string(),
            category: category.trim().to_string(),
            selection: selection.trim().to_string(),
            part_number: part_number.trim().to_string(),
            confirmations: 0,
            last_confirmed: at,
        });
        if entry.part_number.eq_ignore_ascii_case(part_number.trim()) {
            entry.confirmations += 1;
        } else {
            entry.part_number = part_number.trim().to_string();
            entry.confirmations = 1;
        }
        entry.last_confirmed = at;
        entry
    }

    /// All entries, grouped by model then key order.
    pub fn entries(&self) -> impl Iterator<Item = &KnowledgeEntry> {
        let mut models: Vec<_> = self.models.iter().collect();
        models.sort_by(|a, b| a.0.cmp(b.0));
        models.into_iter().flat_map(|(_, table)| table.values())
    }

    pub fn len(&self) -> usize {
        self.models.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Borrowed, model-scoped, read-only access to the knowledge table.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnowledgeView<'a> {
    entries: Option<&'a BTreeMap<Key, KnowledgeEntry>>,
}

impl<'a> KnowledgeView<'a> {
    pub fn empty() -> Self {
        KnowledgeView { entries: None }
    }

    pub fn lookup(&self, category: &str, selection: &str) -> Option<&'a KnowledgeEntry> {
        self.entries?.get(&key(category, selection))
    }

    /// Part number previously confirmed for this pair, uppercased.
    pub fn part_number_for(&self, category: &str, selection: &str) -> Option<String> {
        self.lookup(category, selection).map(|entry| entry.part_number.trim().to_uppercase())
    }
}
