//! Application state and the actions that mutate it

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::review::{AnswerSide, Answers, Completion, ReviewRecord, ReviewStatus};
use crate::{Error, Result};

/// Screen the session is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Dashboard,
    EmployeeForm,
    ManagerForm,
    Interview,
    Print,
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::Dashboard => write!(f, "dashboard"),
            View::EmployeeForm => write!(f, "employee-form"),
            View::ManagerForm => write!(f, "manager-form"),
            View::Interview => write!(f, "interview"),
            View::Print => write!(f, "print"),
        }
    }
}

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Transient message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Counters shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardSummary {
    pub total: usize,
    pub in_progress: usize,
    pub completed: usize,
}

/// Something that happened: a user intent or the outcome of a store call
#[derive(Debug, Clone)]
pub enum Action {
    /// Session launched from an employee link
    SharedLinkOpened(ReviewRecord),
    /// Manager password accepted
    LoggedIn,
    /// Initial bulk load
    Load,
    /// Manual reload, discarding unsynced edits
    Refresh,
    Loaded(Vec<ReviewRecord>),
    LoadFailed(String),
    /// Authoritative copy for a shared session arrived
    SharedRecordFetched(Vec<ReviewRecord>),
    Navigate {
        view: View,
        review_id: Option<String>,
    },
    Created(ReviewRecord),
    AnswersSubmitted {
        review_id: String,
        side: AnswerSide,
        answers: Answers,
    },
    InterviewCompleted {
        review_id: String,
        completion: Completion,
        validated_on: NaiveDate,
    },
    Saved {
        review_id: String,
    },
    SaveFailed {
        review_id: String,
        message: String,
    },
    DeleteRequested(String),
    DeleteCancelled,
    DeleteConfirmed,
    DeleteFinished {
        review_id: String,
        error: Option<String>,
    },
}

/// Store call requested by a state change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    List,
    Put(ReviewRecord),
    Remove(String),
}

/// The whole in-memory state of one session
#[derive(Debug, Clone, Default)]
pub struct AppState {
    reviews: Vec<ReviewRecord>,
    view: View,
    selected: Option<String>,
    shared: bool,
    authenticated: bool,
    loading: bool,
    banner: Option<String>,
    pending_delete: Option<String>,
    delete_in_flight: bool,
    notices: Vec<Notice>,
}

impl AppState {
    /// Fresh manager session, logged out, nothing loaded
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reviews(&self) -> &[ReviewRecord] {
        &self.reviews
    }

    pub fn review(&self, id: &str) -> Option<&ReviewRecord> {
        self.reviews.iter().find(|r| r.id == id)
    }

    /// Record backing the current view, if any
    pub fn current_review(&self) -> Option<&ReviewRecord> {
        self.selected.as_deref().and_then(|id| self.review(id))
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Session entered through an employee link
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Persistent load error shown above the dashboard
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    pub fn is_delete_in_flight(&self) -> bool {
        self.delete_in_flight
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Take the accumulated notices
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn summary(&self) -> DashboardSummary {
        let completed = self
            .reviews
            .iter()
            .filter(|r| r.status == ReviewStatus::Completed)
            .count();
        DashboardSummary {
            total: self.reviews.len(),
            in_progress: self.reviews.len() - completed,
            completed,
        }
    }

    /// Fail unless this is a logged-in manager session
    pub fn require_manager(&self) -> Result<()> {
        if self.shared {
            return Err(Error::AccessDenied(
                "an employee link only opens the employee form".to_string(),
            ));
        }
        if !self.authenticated {
            return Err(Error::AccessDenied("manager login required".to_string()));
        }
        Ok(())
    }

    /// Apply an action and return the store calls it requires
    ///
    /// Local state changes happen before any effect runs; failures reported
    /// later never roll them back.
    pub fn apply(&mut self, action: Action) -> Result<Vec<Effect>> {
        debug!(?action, "Applying session action");

        match action {
            Action::SharedLinkOpened(placeholder) => {
                info!(review_id = %placeholder.id, "Opening shared employee session");
                self.shared = true;
                self.view = View::EmployeeForm;
                self.selected = Some(placeholder.id.clone());
                self.reviews = vec![placeholder];
                Ok(vec![Effect::List])
            }

            Action::LoggedIn => {
                self.authenticated = true;
                Ok(vec![])
            }

            Action::Load => {
                self.loading = true;
                Ok(vec![Effect::List])
            }

            Action::Refresh => {
                self.require_manager()?;
                self.loading = true;
                Ok(vec![Effect::List])
            }

            Action::Loaded(records) => {
                self.loading = false;
                self.banner = None;
                self.reviews = dedupe(records);
                info!(count = self.reviews.len(), "Reviews loaded");
                Ok(vec![])
            }

            Action::LoadFailed(message) => {
                self.loading = false;
                self.banner = Some(message.clone());
                self.notices.push(Notice::new(
                    NoticeLevel::Error,
                    format!("Erreur de connexion : {}", message),
                ));
                Ok(vec![])
            }

            Action::SharedRecordFetched(records) => {
                let Some(id) = self.selected.clone() else {
                    return Ok(vec![]);
                };
                match records.into_iter().find(|r| r.id == id) {
                    Some(found) => {
                        debug!(review_id = %id, "Replacing placeholder with stored review");
                        self.upsert(found);
                    }
                    None => debug!(review_id = %id, "Review not in store, keeping placeholder"),
                }
                Ok(vec![])
            }

            Action::Navigate { view, review_id } => {
                self.navigate(view, review_id)?;
                Ok(vec![])
            }

            Action::Created(review) => {
                self.require_manager()?;
                self.upsert(review.clone());
                Ok(vec![Effect::Put(review)])
            }

            Action::AnswersSubmitted {
                review_id,
                side,
                answers,
            } => {
                self.check_answer_access(&review_id, side)?;
                let review = self.review_mut(&review_id)?;
                review.submit_answers(side, answers);
                Ok(vec![Effect::Put(review.clone())])
            }

            Action::InterviewCompleted {
                review_id,
                completion,
                validated_on,
            } => {
                self.require_manager()?;
                let review = self.review_mut(&review_id)?;
                review.complete(completion, validated_on);
                Ok(vec![Effect::Put(review.clone())])
            }

            Action::Saved { review_id } => {
                self.notices
                    .push(Notice::new(NoticeLevel::Success, "Sauvegarde effectuée !"));
                let completed = self.review(&review_id).is_some_and(|r| r.is_completed());
                if completed && !self.shared {
                    self.view = View::Dashboard;
                }
                Ok(vec![])
            }

            Action::SaveFailed { review_id, message } => {
                self.notices.push(Notice::new(
                    NoticeLevel::Error,
                    format!(
                        "Erreur lors de l'enregistrement de {} : {}",
                        review_id, message
                    ),
                ));
                Ok(vec![])
            }

            Action::DeleteRequested(review_id) => {
                self.require_manager()?;
                if self.delete_in_flight {
                    return Err(Error::DeleteInFlight);
                }
                if self.review(&review_id).is_none() {
                    return Err(Error::NotFound(review_id));
                }
                self.pending_delete = Some(review_id);
                Ok(vec![])
            }

            Action::DeleteCancelled => {
                if self.delete_in_flight {
                    return Err(Error::DeleteInFlight);
                }
                self.pending_delete = None;
                Ok(vec![])
            }

            Action::DeleteConfirmed => {
                self.require_manager()?;
                if self.delete_in_flight {
                    return Err(Error::DeleteInFlight);
                }
                let review_id = self.pending_delete.take().ok_or(Error::NoPendingDelete)?;

                self.delete_in_flight = true;
                self.loading = true;
                self.reviews.retain(|r| r.id != review_id);
                if self.selected.as_deref() == Some(review_id.as_str()) {
                    self.selected = None;
                    self.view = View::Dashboard;
                }
                Ok(vec![Effect::Remove(review_id)])
            }

            Action::DeleteFinished { review_id, error } => {
                self.delete_in_flight = false;
                self.loading = false;
                match error {
                    Some(message) => self.notices.push(Notice::new(
                        NoticeLevel::Error,
                        format!("Erreur lors de la suppression de {} : {}", review_id, message),
                    )),
                    None => self
                        .notices
                        .push(Notice::new(NoticeLevel::Info, "Entretien supprimé.")),
                }
                Ok(vec![])
            }
        }
    }

    fn navigate(&mut self, view: View, review_id: Option<String>) -> Result<()> {
        let target = review_id.or_else(|| self.selected.clone());

        if self.shared {
            if view != View::EmployeeForm || target != self.selected {
                return Err(Error::AccessDenied(
                    "an employee link only opens the employee form".to_string(),
                ));
            }
            return Ok(());
        }
        self.require_manager()?;

        if view != View::Dashboard {
            let id = target.ok_or_else(|| Error::NotFound(String::new()))?;
            if self.review(&id).is_none() {
                return Err(Error::NotFound(id));
            }
            self.selected = Some(id);
        }
        self.view = view;
        Ok(())
    }

    fn check_answer_access(&self, review_id: &str, side: AnswerSide) -> Result<()> {
        if self.shared {
            if side != AnswerSide::Employee || self.selected.as_deref() != Some(review_id) {
                return Err(Error::AccessDenied(
                    "an employee link only allows answering its own review".to_string(),
                ));
            }
            return Ok(());
        }
        self.require_manager()
    }

    fn review_mut(&mut self, id: &str) -> Result<&mut ReviewRecord> {
        self.reviews
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn upsert(&mut self, review: ReviewRecord) {
        match self.reviews.iter_mut().find(|r| r.id == review.id) {
            Some(existing) => *existing = review,
            None => self.reviews.push(review),
        }
    }
}

/// Keep one record per id, the last one listed wins
fn dedupe(records: Vec<ReviewRecord>) -> Vec<ReviewRecord> {
    let mut out: Vec<ReviewRecord> = Vec::with_capacity(records.len());
    for record in records {
        match out.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => out.push(record),
        }
    }
    out
}
