//! The persisted review record

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::status::{resolve_status, ReviewStatus};

/// Question id → free-text answer
pub type Answers = BTreeMap<String, String>;

/// Which side of the review an answer set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSide {
    /// The reviewed employee
    Employee,
    /// The reviewing manager
    Manager,
}

impl std::fmt::Display for AnswerSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerSide::Employee => write!(f, "employee"),
            AnswerSide::Manager => write!(f, "manager"),
        }
    }
}

/// Fields authored by the manager when the interview is closed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub final_synthesis: String,
    pub objectives_next_year: String,
    pub training_needs: String,
}

/// One employee's annual review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireReview")]
pub struct ReviewRecord {
    /// Opaque identifier, time-based, never reassigned
    pub id: String,
    pub employee_name: String,
    pub employee_role: String,
    /// Interview date (`YYYY-MM-DD`)
    pub date: String,
    /// Date the interview was completed and signed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<String>,
    pub status: ReviewStatus,
    pub employee_answers: Answers,
    pub manager_answers: Answers,
    pub final_synthesis: String,
    pub objectives_next_year: String,
    pub training_needs: String,
}

/// A row as the sheet returns it: blank cells, nulls and numbers included
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReview {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    employee_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    employee_role: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    date: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    validated_at: Option<String>,
    #[serde(default, deserialize_with = "known_status")]
    status: Option<ReviewStatus>,
    #[serde(default, deserialize_with = "lenient_answers")]
    employee_answers: Answers,
    #[serde(default, deserialize_with = "lenient_answers")]
    manager_answers: Answers,
    #[serde(default, deserialize_with = "null_as_empty")]
    final_synthesis: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    objectives_next_year: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    training_needs: String,
}

impl From<WireReview> for ReviewRecord {
    fn from(wire: WireReview) -> Self {
        // Blank or unknown status cells are derived from the answers
        let status = wire.status.unwrap_or_else(|| {
            resolve_status(
                &wire.employee_answers,
                &wire.manager_answers,
                ReviewStatus::NotStarted,
            )
        });

        Self {
            id: wire.id,
            employee_name: wire.employee_name,
            employee_role: wire.employee_role,
            date: wire.date,
            validated_at: wire.validated_at,
            status,
            employee_answers: wire.employee_answers,
            manager_answers: wire.manager_answers,
            final_synthesis: wire.final_synthesis,
            objectives_next_year: wire.objectives_next_year,
            training_needs: wire.training_needs,
        }
    }
}

impl ReviewRecord {
    /// Create a fresh review with no answers
    pub fn new(
        id: impl Into<String>,
        employee_name: impl Into<String>,
        employee_role: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            employee_name: employee_name.into(),
            employee_role: employee_role.into(),
            date: date.format("%Y-%m-%d").to_string(),
            validated_at: None,
            status: ReviewStatus::NotStarted,
            employee_answers: Answers::new(),
            manager_answers: Answers::new(),
            final_synthesis: String::new(),
            objectives_next_year: String::new(),
            training_needs: String::new(),
        }
    }

    /// Answer set for one side
    pub fn answers(&self, side: AnswerSide) -> &Answers {
        match side {
            AnswerSide::Employee => &self.employee_answers,
            AnswerSide::Manager => &self.manager_answers,
        }
    }

    /// Check if the review is signed
    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    /// Replace one side's answers and recompute the status
    pub fn submit_answers(&mut self, side: AnswerSide, answers: Answers) {
        match side {
            AnswerSide::Employee => self.employee_answers = answers,
            AnswerSide::Manager => self.manager_answers = answers,
        }

        let next = resolve_status(&self.employee_answers, &self.manager_answers, self.status);
        self.set_status(next);
    }

    /// Close the interview: write the synthesis fields and freeze the status
    ///
    /// `validated_at` is stamped only the first time.
    pub fn complete(&mut self, completion: Completion, validated_on: NaiveDate) {
        self.final_synthesis = completion.final_synthesis;
        self.objectives_next_year = completion.objectives_next_year;
        self.training_needs = completion.training_needs;

        let signed = self
            .validated_at
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty());
        if !signed {
            self.validated_at = Some(validated_on.format("%Y-%m-%d").to_string());
        }
        self.set_status(ReviewStatus::Completed);
    }

    fn set_status(&mut self, next: ReviewStatus) {
        if next == self.status {
            return;
        }
        debug_assert!(self.status.can_transition_to(&next));

        info!(
            review_id = %self.id,
            from = %self.status,
            to = %next,
            "Review status transition"
        );
        self.status = next;
    }
}

/// Today's date in UTC
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Sheets turn numeric-looking ids into numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("invalid review id: {}", other))),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Empty cells mean "not set"
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

/// `None` for blank, null or unrecognised labels
fn known_status<'de, D>(deserializer: D) -> Result<Option<ReviewStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::String(label)) = raw else {
        return Ok(None);
    };

    let label = label.trim();
    let status = ReviewStatus::ALL.into_iter().find(|s| s.label() == label);
    if status.is_none() && !label.is_empty() {
        warn!(label, "Unknown review status, deriving it from the answers");
    }
    Ok(status)
}

/// Accept null maps, null entries and non-string scalars
fn lenient_answers<'de, D>(deserializer: D) -> Result<Answers, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;

    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| match v {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((k, s)),
            other => Some((k, other.to_string())),
        })
        .collect())
}
