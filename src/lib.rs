//! Rule logic engine for configuring machine assemblies from a parts catalog.
//!
//! The crate has three moving parts, all pure functions over borrowed catalog
//! snapshots:
//!
//! - [`parse_expression`] turns a hand-entered trigger such as
//!   `(CAB/CAN) STD [TT BT]` into [`RuleLogic`].
//! - [`resolve`] saturates confirmed selections through the rule set and
//!   returns the parts they imply.
//! - [`match_option`] reconciles free-text (category, selection) pairs from a
//!   scanned order with catalog part numbers, with a confidence band.
//!
//! Loading catalogs, storing confirmed knowledge and rendering results belong
//! to the caller; [`CatalogDocument`] and [`KnowledgeStore`] are thin helpers
//! for those edges.

#[macro_use]
mod macros;
mod api;
mod engine;
mod expr;
mod import;
mod index;
mod knowledge;
mod manifest;
mod matcher;
mod text;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use api::{match_option, match_options, parse_expression, resolve, resolve_verbose};
pub use engine::{
    CompiledRules, PassMetrics, Resolution, ResolveMetrics, ResolveOptions, Resolver, RuleDiagnostics, RuleShape,
};
pub use expr::{ExpressionIssue, ParsedExpression, RuleLogic, parse_with_issues};
pub use import::{CatalogDocument, Cell, ImportError, PartRow, RuleRow, Settings};
pub use index::{IndexedPart, PartIndex};
pub use knowledge::{KnowledgeEntry, KnowledgeStore, KnowledgeView};
pub use manifest::{ManifestGroup, build_manifest};
pub use matcher::{ConfidenceLevel, ConfidenceMatcher, MatchOptions, MatchResult, MatchSignal, OptionQuery};
pub use text::{STOP_WORDS, tokenize, tokenize_expanded};

// --- Catalog model ------------------------------------------------------------

/// Role of a part inside an assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FunctionalCode {
    /// Always part of the assembly; its tokens seed every resolution.
    #[default]
    Baseline,
    /// Any number may be selected within a ref-des group.
    Optional,
    /// Exactly one may be selected within a ref-des group.
    Mandatory,
    /// Matchable, but never listed in the final manifest.
    Reference,
}

impl FunctionalCode {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(FunctionalCode::Baseline),
            1 => Some(FunctionalCode::Optional),
            2 => Some(FunctionalCode::Mandatory),
            9 => Some(FunctionalCode::Reference),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            FunctionalCode::Baseline => 0,
            FunctionalCode::Optional => 1,
            FunctionalCode::Mandatory => 2,
            FunctionalCode::Reference => 9,
        }
    }
}

impl TryFrom<u8> for FunctionalCode {
    type Error = ImportError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        FunctionalCode::from_code(code).ok_or(ImportError::UnknownFunctionalCode(code.to_string()))
    }
}

impl From<FunctionalCode> for u8 {
    fn from(code: FunctionalCode) -> Self {
        code.code()
    }
}

/// One row of the master parts catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub id: String,
    pub part_number: String,
    pub name: String,
    pub remarks: String,
    pub std_remarks: String,
    /// Reference designator: display group and exclusivity key.
    pub ref_des: String,
    pub functional_code: FunctionalCode,
    pub select_preference: i64,
}

impl Part {
    /// A baseline part with every text field empty.
    pub fn new(id: impl Into<String>) -> Self {
        Part { id: id.into(), ..Part::default() }
    }

    /// Concatenated text the tokenizer reads for this part.
    pub(crate) fn token_source(&self) -> String {
        [self.part_number.as_str(), &self.name, &self.remarks, &self.std_remarks].join(" ")
    }

    /// Mandatory parts with a non-empty ref-des form an exclusive group.
    pub(crate) fn exclusive_group(&self) -> Option<&str> {
        let ref_des = self.ref_des.trim();
        (self.functional_code == FunctionalCode::Mandatory && !ref_des.is_empty()).then_some(ref_des)
    }
}

/// A dependency rule: when `logic` holds in the current context, the part
/// `target_part_id` is implied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub target_part_id: String,
    pub logic: RuleLogic,
    pub is_active: bool,
}

impl Rule {
    pub fn new(id: impl Into<String>, target_part_id: impl Into<String>, logic: RuleLogic) -> Self {
        Rule { id: id.into(), target_part_id: target_part_id.into(), logic, is_active: true }
    }
}

/// Abbreviation -> full phrase mapping used to widen token sets.
///
/// Keys are stored uppercased so lookups are case-insensitive and iteration
/// order is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct Glossary {
    entries: BTreeMap<String, String>,
}

impl Glossary {
    pub fn new() -> Self {
        Glossary::default()
    }

    /// Insert or replace an abbreviation. Blank abbreviations are ignored.
    pub fn insert(&mut self, abbreviation: &str, full_phrase: &str) {
        let key = abbreviation.trim().to_uppercase();
        if !key.is_empty() {
            self.entries.insert(key, full_phrase.trim().to_string());
        }
    }

    pub fn get(&self, abbreviation: &str) -> Option<&str> {
        self.entries.get(&abbreviation.trim().to_uppercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<BTreeMap<String, String>> for Glossary {
    fn from(map: BTreeMap<String, String>) -> Self {
        let mut glossary = Glossary::new();
        for (abbreviation, full) in &map {
            glossary.insert(abbreviation, full);
        }
        glossary
    }
}

impl From<Glossary> for BTreeMap<String, String> {
    fn from(glossary: Glossary) -> Self {
        glossary.entries
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Glossary {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut glossary = Glossary::new();
        for (abbreviation, full) in iter {
            glossary.insert(abbreviation, full);
        }
        glossary
    }
}
