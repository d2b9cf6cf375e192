//! Review status state machine
//!
//! The status of a review is derived from the two answer sets until the
//! interview is completed. `Completed` is absorbing: once reached, no
//! recomputation can move a review out of it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle status of a review
///
/// Serialized with the labels stored by the review sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ReviewStatus {
    /// Nobody has answered yet
    #[default]
    #[serde(rename = "Non commencé")]
    NotStarted,
    /// Only the employee has answered
    #[serde(rename = "Saisi par salarié")]
    EmployeeFilled,
    /// Only the manager has answered
    #[serde(rename = "Préparé par manager")]
    ManagerPrepared,
    /// Both sides have answered
    #[serde(rename = "Préparé par tout le monde")]
    BothPrepared,
    /// Interview held and signed
    #[serde(rename = "Terminé & Signé")]
    Completed,
}

impl ReviewStatus {
    /// Every status, in lifecycle order
    pub const ALL: [ReviewStatus; 5] = [
        ReviewStatus::NotStarted,
        ReviewStatus::EmployeeFilled,
        ReviewStatus::ManagerPrepared,
        ReviewStatus::BothPrepared,
        ReviewStatus::Completed,
    ];

    /// Label stored in the sheet and shown to users
    pub fn label(&self) -> &'static str {
        match self {
            ReviewStatus::NotStarted => "Non commencé",
            ReviewStatus::EmployeeFilled => "Saisi par salarié",
            ReviewStatus::ManagerPrepared => "Préparé par manager",
            ReviewStatus::BothPrepared => "Préparé par tout le monde",
            ReviewStatus::Completed => "Terminé & Signé",
        }
    }

    /// Check if this is the absorbing state
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReviewStatus::Completed)
    }

    /// Check if moving to `to` is allowed
    ///
    /// Any non-terminal status may move anywhere (answers can be cleared);
    /// `Completed` may only stay `Completed`.
    pub fn can_transition_to(&self, to: &ReviewStatus) -> bool {
        !self.is_terminal() || to.is_terminal()
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// True iff at least one answer contains something other than whitespace
pub fn has_data(answers: &BTreeMap<String, String>) -> bool {
    answers.values().any(|v| !v.trim().is_empty())
}

/// Compute the next status from both answer sets
///
/// Never produces `Completed`; completion is an explicit action.
pub fn resolve_status(
    employee: &BTreeMap<String, String>,
    manager: &BTreeMap<String, String>,
    current: ReviewStatus,
) -> ReviewStatus {
    if current.is_terminal() {
        return current;
    }

    match (has_data(employee), has_data(manager)) {
        (true, true) => ReviewStatus::BothPrepared,
        (true, false) => ReviewStatus::EmployeeFilled,
        (false, true) => ReviewStatus::ManagerPrepared,
        (false, false) => ReviewStatus::NotStarted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_maps_not_started() {
        let empty = BTreeMap::new();
        assert_eq!(
            resolve_status(&empty, &empty, ReviewStatus::NotStarted),
            ReviewStatus::NotStarted
        );
    }

    #[test]
    fn test_single_side() {
        let empty = BTreeMap::new();
        let filled = answers(&[("q1", "x")]);
        assert_eq!(
            resolve_status(&filled, &empty, ReviewStatus::NotStarted),
            ReviewStatus::EmployeeFilled
        );
        assert_eq!(
            resolve_status(&empty, &filled, ReviewStatus::NotStarted),
            ReviewStatus::ManagerPrepared
        );
    }

    #[test]
    fn test_both_sides() {
        let employee = answers(&[("q1", "x")]);
        let manager = answers(&[("q1", "y")]);
        assert_eq!(
            resolve_status(&employee, &manager, ReviewStatus::NotStarted),
            ReviewStatus::BothPrepared
        );
    }

    #[test]
    fn test_whitespace_is_not_data() {
        let blank = answers(&[("q1", "   "), ("q2", "\n\t"), ("q3", "")]);
        assert!(!has_data(&blank));
        assert_eq!(
            resolve_status(&blank, &blank, ReviewStatus::EmployeeFilled),
            ReviewStatus::NotStarted
        );
    }

    #[test]
    fn test_completed_is_absorbing() {
        let empty = BTreeMap::new();
        let filled = answers(&[("q1", "x")]);
        for (e, m) in [(&empty, &empty), (&filled, &empty), (&filled, &filled)] {
            assert_eq!(
                resolve_status(e, m, ReviewStatus::Completed),
                ReviewStatus::Completed
            );
        }
    }

    #[test]
    fn test_idempotent() {
        let maps = [
            BTreeMap::new(),
            answers(&[("q1", "x")]),
            answers(&[("q1", " ")]),
        ];
        for e in &maps {
            for m in &maps {
                for start in ReviewStatus::ALL {
                    let once = resolve_status(e, m, start);
                    assert_eq!(resolve_status(e, m, once), once);
                }
            }
        }
    }

    #[test]
    fn test_transitions() {
        assert!(ReviewStatus::BothPrepared.can_transition_to(&ReviewStatus::NotStarted));
        assert!(ReviewStatus::BothPrepared.can_transition_to(&ReviewStatus::Completed));
        assert!(!ReviewStatus::Completed.can_transition_to(&ReviewStatus::BothPrepared));
        assert!(ReviewStatus::Completed.can_transition_to(&ReviewStatus::Completed));
    }

    #[test]
    fn test_wire_labels() {
        let json = serde_json::to_string(&ReviewStatus::Completed).unwrap();
        assert_eq!(json, "\"Terminé & Signé\"");
        let status: ReviewStatus = serde_json::from_str("\"Saisi par salarié\"").unwrap();
        assert_eq!(status, ReviewStatus::EmployeeFilled);
    }
}
