//! Rule expression parsing.
//!
//! Rule triggers are typed by hand into catalog spreadsheets, so the grammar is
//! tiny and the parser never fails:
//!
//! ```text
//! (CAB/CAN) STD [TT BT]
//! └──┬────┘ └┬┘ └──┬──┘
//!    │       │     └─ exclusion terms: none may be present
//!    │       └─────── include terms:   all must be present
//!    └─────────────── OR group:        at least one must be present
//! ```
//!
//! Groups do not nest. An opener that is not closed before the next opener
//! (or the end of input) is dropped and its contents fall through to the
//! include terms; a closer with no opener is read as a separator. Both cases
//! are reported as [`ExpressionIssue`]s so callers can flag the rule.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Structured form of a rule trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleLogic {
    /// Every term must be present (AND).
    pub include_terms: Vec<String>,
    /// No term may be present.
    pub exclude_terms: Vec<String>,
    /// Each group needs at least one present member.
    pub or_groups: Vec<Vec<String>>,
    /// The trigger exactly as entered, kept for display.
    pub raw_expression: String,
}

impl RuleLogic {
    /// True when the expression constrains nothing, so the rule always fires.
    pub fn is_empty(&self) -> bool {
        self.include_terms.is_empty() && self.exclude_terms.is_empty() && self.or_groups.is_empty()
    }

    /// Evaluate the logic against a context token set.
    pub fn holds(&self, context: &HashSet<String>) -> bool {
        self.include_terms.iter().all(|term| context.contains(term))
            && !self.exclude_terms.iter().any(|term| context.contains(term))
            && self.or_groups.iter().all(|group| group.iter().any(|term| context.contains(term)))
    }

    /// Re-serialize the parsed terms in canonical order:
    /// includes, then OR groups, then the exclusion bracket.
    ///
    /// Parsing the result yields the same three term lists, though not
    /// necessarily the original `raw_expression` text.
    pub fn to_expression(&self) -> String {
        let mut parts: Vec<String> = self.include_terms.clone();
        parts.extend(self.or_groups.iter().map(|group| format!("({})", group.join("/"))));
        if !self.exclude_terms.is_empty() {
            parts.push(format!("[{}]", self.exclude_terms.join(" ")));
        }
        parts.join(" ")
    }
}

impl fmt::Display for RuleLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_expression())
    }
}

/// A recoverable problem found while parsing a trigger expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionIssue {
    #[error("unmatched '{bracket}' at byte {position}; its contents were read as include terms")]
    UnmatchedOpen { bracket: char, position: usize },
    #[error("stray '{bracket}' at byte {position} was ignored")]
    StrayClose { bracket: char, position: usize },
    #[error("empty group at byte {position} was ignored")]
    EmptyGroup { position: usize },
}

/// Parser output together with any recovered issues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedExpression {
    pub logic: RuleLogic,
    pub issues: Vec<ExpressionIssue>,
}

/// Parse `raw` and report the issues recovered on the way.
pub fn parse_with_issues(raw: &str) -> ParsedExpression {
    let chars: Vec<(usize, char)> = raw.char_indices().collect();
    let mut logic = RuleLogic { raw_expression: raw.to_string(), ..RuleLogic::default() };
    let mut issues = Vec::new();
    let mut remainder = String::with_capacity(raw.len());

    let mut i = 0;
    while i < chars.len() {
        let (position, c) = chars[i];
        match c {
            '(' | '[' => match find_close(&chars, i) {
                Some(close) => {
                    let body = clean_body(&chars[i + 1..close], &mut issues);
                    let before = (logic.or_groups.len(), logic.exclude_terms.len());
                    if c == '(' {
                        let group: Vec<String> = body
                            .split('/')
                            .map(|entry| entry.trim().to_uppercase())
                            .filter(|entry| !entry.is_empty())
                            .collect();
                        if !group.is_empty() {
                            logic.or_groups.push(group);
                        }
                    } else {
                        logic.exclude_terms.extend(body.split_whitespace().map(str::to_uppercase));
                    }
                    if before == (logic.or_groups.len(), logic.exclude_terms.len()) {
                        issues.push(ExpressionIssue::EmptyGroup { position });
                    }
                    remainder.push(' ');
                    i = close + 1;
                    continue;
                }
                None => {
                    issues.push(ExpressionIssue::UnmatchedOpen { bracket: c, position });
                    remainder.push(' ');
                }
            },
            ')' | ']' => {
                issues.push(ExpressionIssue::StrayClose { bracket: c, position });
                remainder.push(' ');
            }
            _ => remainder.push(c),
        }
        i += 1;
    }

    logic.include_terms = remainder.split_whitespace().map(str::to_uppercase).collect();
    ParsedExpression { logic, issues }
}

/// Index of the closer matching the opener at `open`, provided no other
/// opener intervenes.
fn find_close(chars: &[(usize, char)], open: usize) -> Option<usize> {
    let closer = if chars[open].1 == '(' { ')' } else { ']' };
    for (offset, &(_, c)) in chars[open + 1..].iter().enumerate() {
        if c == closer {
            return Some(open + 1 + offset);
        }
        if c == '(' || c == '[' {
            return None;
        }
    }
    None
}

/// Group body with foreign closers blanked out.
fn clean_body(body: &[(usize, char)], issues: &mut Vec<ExpressionIssue>) -> String {
    body.iter()
        .map(|&(position, c)| match c {
            ')' | ']' => {
                issues.push(ExpressionIssue::StrayClose { bracket: c, position });
                ' '
            }
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> RuleLogic {
        parse_with_issues(raw).logic
    }

    #[test]
    fn parses_or_group_include_and_exclusion() {
        let logic = parse("(CAB/CAN) STD [TT BT]");
        assert_eq!(logic.or_groups, vec![vec!["CAB".to_string(), "CAN".to_string()]]);
        assert_eq!(logic.exclude_terms, vec!["TT", "BT"]);
        assert_eq!(logic.include_terms, vec!["STD"]);
        assert_eq!(logic.raw_expression, "(CAB/CAN) STD [TT BT]");
    }

    #[test]
    fn empty_expression_has_no_terms() {
        let parsed = parse_with_issues("");
        assert!(parsed.logic.is_empty());
        assert!(parsed.issues.is_empty());
        assert!(parse("   ").is_empty());
    }

    #[test]
    fn collects_multiple_groups_and_brackets_in_order() {
        let logic = parse("[x] heavy (a / b /) light (c) [y z]");
        assert_eq!(logic.include_terms, vec!["HEAVY", "LIGHT"]);
        assert_eq!(logic.or_groups, vec![vec!["A".to_string(), "B".to_string()], vec!["C".to_string()]]);
        assert_eq!(logic.exclude_terms, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn adjacent_groups_split_include_terms() {
        let logic = parse("STD(CAB)EXT");
        assert_eq!(logic.include_terms, vec!["STD", "EXT"]);
        assert_eq!(logic.or_groups, vec![vec!["CAB".to_string()]]);
    }

    #[test]
    fn unmatched_open_falls_back_to_includes() {
        let parsed = parse_with_issues("(CAB/CAN STD");
        assert_eq!(parsed.logic.include_terms, vec!["CAB/CAN", "STD"]);
        assert!(parsed.logic.or_groups.is_empty());
        assert_eq!(parsed.issues, vec![ExpressionIssue::UnmatchedOpen { bracket: '(', position: 0 }]);
    }

    #[test]
    fn opener_before_close_is_treated_as_unmatched() {
        let parsed = parse_with_issues("[TT (CAB/CAN)");
        assert_eq!(parsed.logic.include_terms, vec!["TT"]);
        assert_eq!(parsed.logic.or_groups, vec![vec!["CAB".to_string(), "CAN".to_string()]]);
        assert!(parsed.logic.exclude_terms.is_empty());
        assert_eq!(parsed.issues.len(), 1);
    }

    #[test]
    fn stray_closers_become_separators() {
        let parsed = parse_with_issues("STD) CAB]");
        assert_eq!(parsed.logic.include_terms, vec!["STD", "CAB"]);
        assert_eq!(parsed.issues.len(), 2);
    }

    #[test]
    fn empty_groups_are_dropped_and_reported() {
        let parsed = parse_with_issues("() STD [ ]");
        assert!(parsed.logic.or_groups.is_empty());
        assert!(parsed.logic.exclude_terms.is_empty());
        assert_eq!(parsed.logic.include_terms, vec!["STD"]);
        assert_eq!(
            parsed.issues,
            vec![ExpressionIssue::EmptyGroup { position: 0 }, ExpressionIssue::EmptyGroup { position: 7 }]
        );
    }

    #[test]
    fn duplicates_are_kept() {
        let logic = parse("STD std [TT tt]");
        assert_eq!(logic.include_terms, vec!["STD", "STD"]);
        assert_eq!(logic.exclude_terms, vec!["TT", "TT"]);
    }

    #[test]
    fn to_expression_reparses_to_same_terms() {
        let logic = parse("[TT BT]  (cab/can)  std (heavy duty/light)");
        let text = logic.to_expression();
        assert_eq!(text, "STD (CAB/CAN) (HEAVY DUTY/LIGHT) [TT BT]");
        let again = parse(&text);
        assert_eq!(again.include_terms, logic.include_terms);
        assert_eq!(again.exclude_terms, logic.exclude_terms);
        assert_eq!(again.or_groups, logic.or_groups);
    }

    #[test]
    fn holds_requires_all_three_constraints() {
        let logic = parse("(CAB/CAN) STD [ROPS]");
        let ctx = |words: &[&str]| words.iter().map(|w| w.to_string()).collect::<HashSet<String>>();
        assert!(logic.holds(&ctx(&["STD", "CAN"])));
        assert!(!logic.holds(&ctx(&["STD"])));
        assert!(!logic.holds(&ctx(&["CAB"])));
        assert!(!logic.holds(&ctx(&["STD", "CAB", "ROPS"])));
        assert!(RuleLogic::default().holds(&HashSet::new()));
    }
}
