//! Import boundary: loose catalog rows to strict engine records.
//!
//! Catalog and rule sheets come out of spreadsheets, so field names drift
//! between camelCase and snake_case, numbers arrive as strings (`"2"`) or
//! floats (`2.0`), and cells are often blank. Everything is normalized here,
//! before a record reaches the engine:
//!
//! | field               | missing / blank      |
//! |---------------------|----------------------|
//! | `functionalCode`    | `0` (Baseline)       |
//! | `selectPreference`  | `0`                  |
//! | text fields         | empty string         |
//! | rule `isActive`     | `true`               |
//! | rule `id`           | `rule-<row>`         |
//!
//! Rows without a part id (or rules without a target) are rejected; a
//! functional code outside `{0, 1, 2, 9}` is an error rather than a guess.

use crate::engine::ResolveOptions;
use crate::expr::parse_with_issues;
use crate::knowledge::{KnowledgeEntry, KnowledgeStore};
use crate::matcher::MatchOptions;
use crate::{FunctionalCode, Glossary, Part, Rule};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed catalog document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("part row {row} has no id")]
    MissingPartId { row: usize },
    #[error("rule row {row} has no target part id")]
    MissingRuleTarget { row: usize },
    #[error("unknown functional code '{0}'")]
    UnknownFunctionalCode(String),
    #[error("part row {row}: select preference '{value}' is not a whole number")]
    BadPreference { row: usize, value: String },
}

/// A spreadsheet cell: text, number or boolean.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    fn text(&self) -> String {
        match self {
            Cell::Bool(b) => b.to_string(),
            Cell::Int(n) => n.to_string(),
            Cell::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
            Cell::Float(f) => f.to_string(),
            Cell::Text(s) => s.trim().to_string(),
        }
    }

    fn integer(&self) -> Option<i64> {
        match self {
            Cell::Int(n) => Some(*n),
            Cell::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Cell::Text(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            }
            _ => None,
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Cell::Text(s) if s.trim().is_empty())
    }
}

fn text_of(cell: &Option<Cell>) -> String {
    cell.as_ref().map(Cell::text).unwrap_or_default()
}

/// One catalog row as found in an import file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartRow {
    pub id: Option<Cell>,
    #[serde(alias = "part_number", alias = "partNo")]
    pub part_number: Option<Cell>,
    pub name: Option<Cell>,
    pub remarks: Option<Cell>,
    #[serde(alias = "std_remarks")]
    pub std_remarks: Option<Cell>,
    #[serde(alias = "ref_des", alias = "refdes")]
    pub ref_des: Option<Cell>,
    #[serde(alias = "functional_code", alias = "fc")]
    pub functional_code: Option<Cell>,
    #[serde(alias = "select_preference")]
    pub select_preference: Option<Cell>,
}

impl PartRow {
    /// Convert to a strict [`Part`]. `row` is only used in error messages.
    pub fn into_part(self, row: usize) -> Result<Part, ImportError> {
        let id = text_of(&self.id);
        if id.is_empty() {
            return Err(ImportError::MissingPartId { row });
        }

        let functional_code = match &self.functional_code {
            Some(cell) if !cell.is_blank() => cell
                .integer()
                .and_then(|n| u8::try_from(n).ok())
                .and_then(FunctionalCode::from_code)
                .ok_or_else(|| ImportError::UnknownFunctionalCode(cell.text()))?,
            _ => {
                warn!(part = %id, row, "no functional code; defaulting to baseline");
                FunctionalCode::Baseline
            }
        };

        let select_preference = match &self.select_preference {
            None => 0,
            Some(cell) if cell.is_blank() => 0,
            Some(cell) => cell.integer().ok_or_else(|| ImportError::BadPreference { row, value: cell.text() })?,
        };

        Ok(Part {
            id,
            part_number: text_of(&self.part_number),
            name: text_of(&self.name),
            remarks: text_of(&self.remarks),
            std_remarks: text_of(&self.std_remarks),
            ref_des: text_of(&self.ref_des),
            functional_code,
            select_preference,
        })
    }
}

/// One rule row as found in an import file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleRow {
    pub id: Option<Cell>,
    #[serde(alias = "target_part_id", alias = "target")]
    pub target_part_id: Option<Cell>,
    #[serde(alias = "rawExpression", alias = "raw_expression", alias = "logic")]
    pub expression: Option<String>,
    #[serde(alias = "is_active", alias = "active")]
    pub is_active: Option<Cell>,
}

impl RuleRow {
    pub fn into_rule(self, row: usize) -> Result<Rule, ImportError> {
        let target = text_of(&self.target_part_id);
        if target.is_empty() {
            return Err(ImportError::MissingRuleTarget { row });
        }
        let id = match text_of(&self.id) {
            id if id.is_empty() => format!("rule-{row}"),
            id => id,
        };

        let parsed = parse_with_issues(self.expression.as_deref().unwrap_or_default());
        for issue in &parsed.issues {
            warn!(rule = %id, %issue, "malformed rule expression");
        }
        if parsed.logic.is_empty() {
            warn!(rule = %id, "empty rule expression always fires");
        }

        let is_active = match &self.is_active {
            None => true,
            Some(Cell::Bool(b)) => *b,
            Some(cell) if cell.is_blank() => true,
            Some(cell) => !matches!(cell.text().to_uppercase().as_str(), "0" | "N" | "NO" | "FALSE" | "OFF"),
        };

        Ok(Rule { id, target_part_id: target, logic: parsed.logic, is_active })
    }
}

/// Tunables a catalog document may carry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub resolve: ResolveOptions,
    pub matching: MatchOptions,
}

/// A complete catalog file: parts, rules, glossary and prior knowledge for one
/// machine model.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogDocument {
    pub model: String,
    pub parts: Vec<PartRow>,
    pub rules: Vec<RuleRow>,
    pub glossary: Glossary,
    pub knowledge: Vec<KnowledgeEntry>,
    pub settings: Settings,
}

impl CatalogDocument {
    pub fn from_json(json: &str) -> Result<Self, ImportError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Strict parts, in row order.
    pub fn parts(&self) -> Result<Vec<Part>, ImportError> {
        self.parts.iter().cloned().enumerate().map(|(row, r)| r.into_part(row + 1)).collect()
    }

    /// Strict rules, in row order.
    pub fn rules(&self) -> Result<Vec<Rule>, ImportError> {
        self.rules.iter().cloned().enumerate().map(|(row, r)| r.into_rule(row + 1)).collect()
    }

    pub fn knowledge_store(&self) -> KnowledgeStore {
        KnowledgeStore::from_entries(self.knowledge.iter().cloned())
    }
}
