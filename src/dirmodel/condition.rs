//! Three-valued logic for filter evaluation.
//!
//! LDAP filters evaluate to TRUE, FALSE or Undefined (RFC 4511, section
//! 4.5.1.7). Undefined means "the matching rule does not apply here", which is
//! not the same thing as FALSE: `(!(cn~=x))` is Undefined, not TRUE, when `cn`
//! has no approximate matching rule.
//!
//! | `a`       | `b`       | `a.and(b)` | `a.or(b)` |
//! |-----------|-----------|------------|-----------|
//! | True      | Undefined | Undefined  | True      |
//! | False     | Undefined | False      | Undefined |
//! | Undefined | Undefined | Undefined  | Undefined |

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionResult {
    Undefined,
    True,
    False,
}

impl ConditionResult {
    pub fn from_bool(value: bool) -> Self {
        if value {
            ConditionResult::True
        } else {
            ConditionResult::False
        }
    }

    /// Collapses to a boolean for callers that only act on a definite match.
    ///
    /// Only `True` maps to `true`; Undefined maps to `false` here and nowhere
    /// else.
    pub fn to_bool(self) -> bool {
        self == ConditionResult::True
    }

    pub fn is_undefined(self) -> bool {
        self == ConditionResult::Undefined
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        match self {
            ConditionResult::True => ConditionResult::False,
            ConditionResult::False => ConditionResult::True,
            ConditionResult::Undefined => ConditionResult::Undefined,
        }
    }

    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (ConditionResult::False, _) | (_, ConditionResult::False) => ConditionResult::False,
            (ConditionResult::True, ConditionResult::True) => ConditionResult::True,
            _ => ConditionResult::Undefined,
        }
    }

    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (ConditionResult::True, _) | (_, ConditionResult::True) => ConditionResult::True,
            (ConditionResult::False, ConditionResult::False) => ConditionResult::False,
            _ => ConditionResult::Undefined,
        }
    }

    /// AND over any number of results. An empty filter set is TRUE.
    pub fn and_all(results: impl IntoIterator<Item = Self>) -> Self {
        let mut acc = ConditionResult::True;
        for result in results {
            acc = acc.and(result);
            if acc == ConditionResult::False {
                break;
            }
        }
        acc
    }

    /// OR over any number of results. An empty filter set is FALSE.
    pub fn or_all(results: impl IntoIterator<Item = Self>) -> Self {
        let mut acc = ConditionResult::False;
        for result in results {
            acc = acc.or(result);
            if acc == ConditionResult::True {
                break;
            }
        }
        acc
    }
}

impl From<bool> for ConditionResult {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl fmt::Display for ConditionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConditionResult::Undefined => "Undefined",
            ConditionResult::True => "True",
            ConditionResult::False => "False",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConditionResult::{False, True, Undefined};

    #[test]
    fn not_keeps_undefined() {
        assert_eq!(True.not(), False);
        assert_eq!(False.not(), True);
        assert_eq!(Undefined.not(), Undefined);
    }

    #[test]
    fn and_truth_table() {
        assert_eq!(True.and(True), True);
        assert_eq!(True.and(False), False);
        assert_eq!(True.and(Undefined), Undefined);
        assert_eq!(False.and(Undefined), False);
        assert_eq!(Undefined.and(Undefined), Undefined);
    }

    #[test]
    fn or_truth_table() {
        assert_eq!(False.or(False), False);
        assert_eq!(False.or(True), True);
        assert_eq!(False.or(Undefined), Undefined);
        assert_eq!(True.or(Undefined), True);
        assert_eq!(Undefined.or(Undefined), Undefined);
    }

    #[test]
    fn empty_sets_follow_filter_semantics() {
        assert_eq!(ConditionResult::and_all([]), True);
        assert_eq!(ConditionResult::or_all([]), False);
    }

    #[test]
    fn folds_over_many_results() {
        assert_eq!(ConditionResult::and_all([True, Undefined, True]), Undefined);
        assert_eq!(ConditionResult::and_all([True, Undefined, False]), False);
        assert_eq!(ConditionResult::or_all([False, Undefined]), Undefined);
        assert_eq!(ConditionResult::or_all([Undefined, True]), True);
    }

    #[test]
    fn only_true_is_truthy() {
        assert!(True.to_bool());
        assert!(!False.to_bool());
        assert!(!Undefined.to_bool());
    }

    #[test]
    fn serializes_as_variant_name() {
        let json = serde_json::to_string(&Undefined).unwrap();
        assert_eq!(json, "\"Undefined\"");
        let back: ConditionResult = serde_json::from_str("\"True\"").unwrap();
        assert_eq!(back, True);
    }
}
