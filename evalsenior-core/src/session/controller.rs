//! Session driver: runs store effects and feeds their outcomes back

use chrono::Utc;
use tracing::{debug, info, warn};

use super::state::{Action, AppState, Effect, View};
use crate::config::{is_http_url, Config};
use crate::link::{SharedLink, SharedLinkParams};
use crate::review::{today, AnswerSide, Answers, Completion, ReviewRecord, ReviewStatus};
use crate::store::RecordStore;
use crate::synthesis::{draft_or_placeholder, SynthesisDraft, SynthesisGenerator};
use crate::{Error, Result};

/// One user session against a record store
pub struct Session<S, G> {
    state: AppState,
    store: S,
    generator: G,
    config: Config,
    /// Effects produced before the session could run them
    pending: Vec<Effect>,
}

impl<S: RecordStore, G: SynthesisGenerator> Session<S, G> {
    /// Open a session without touching the network
    ///
    /// When `launch_url` is an employee link the placeholder record is
    /// installed immediately and the store is rebound to the link's endpoint.
    /// Call [`Session::initialize`] afterwards to load or reconcile.
    pub fn open(store: S, generator: G, config: Config, launch_url: Option<&str>) -> Result<Self> {
        let shared = match launch_url {
            Some(url) => SharedLinkParams::from_url(url)?,
            None => None,
        };

        let mut session = Self {
            state: AppState::new(),
            store,
            generator,
            config,
            pending: Vec::new(),
        };

        if let Some(params) = shared {
            let endpoint = params.resolve_db_url(&session.config.active_db_url());
            if endpoint != session.store.endpoint() {
                session.store = session.store.rebind(&endpoint)?;
            }
            session.pending = session
                .state
                .apply(Action::SharedLinkOpened(params.placeholder(today())))?;
        }

        Ok(session)
    }

    /// Fetch data for a freshly opened session
    ///
    /// Load failures are not fatal: they end up in the banner and notices.
    pub async fn initialize(&mut self) {
        let effects = if self.state.is_shared() {
            std::mem::take(&mut self.pending)
        } else {
            match self.state.apply(Action::Load) {
                Ok(effects) => effects,
                Err(e) => {
                    warn!(error = %e, "Initial load refused");
                    return;
                }
            }
        };

        if let Err(e) = self.run(effects).await {
            debug!(error = %e, "Initial load failed");
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Take the notices accumulated since the last call
    pub fn drain_notices(&mut self) -> Vec<super::Notice> {
        self.state.drain_notices()
    }

    /// Unlock manager features
    ///
    /// Shared sessions never need a login.
    pub fn login(&mut self, password: &str) -> Result<()> {
        if self.state.is_shared() {
            return Ok(());
        }
        if password != self.config.app.manager_password {
            warn!("Rejected manager login");
            return Err(Error::AccessDenied("Mot de passe incorrect.".to_string()));
        }
        self.state.apply(Action::LoggedIn)?;
        info!("Manager logged in");
        Ok(())
    }

    /// Reload the whole collection, discarding unsynced local edits
    pub async fn refresh(&mut self) -> Result<()> {
        let effects = self.state.apply(Action::Refresh)?;
        self.run(effects).await
    }

    /// Switch to the given view
    pub fn open_view(&mut self, view: View, review_id: Option<&str>) -> Result<&ReviewRecord> {
        self.state.apply(Action::Navigate {
            view,
            review_id: review_id.map(str::to_string),
        })?;
        self.state
            .current_review()
            .ok_or_else(|| Error::NotFound(review_id.unwrap_or_default().to_string()))
    }

    /// Create a new review for an employee
    pub async fn create_review(
        &mut self,
        first_name: &str,
        last_name: &str,
        role: &str,
    ) -> Result<ReviewRecord> {
        let (first_name, last_name, role) = (first_name.trim(), last_name.trim(), role.trim());
        if first_name.is_empty() || last_name.is_empty() || role.is_empty() {
            return Err(Error::InvalidInput(
                "first name, last name and role are required".to_string(),
            ));
        }

        let review = ReviewRecord::new(
            self.next_id(),
            format!("{} {}", first_name, last_name),
            role,
            today(),
        );
        info!(review_id = %review.id, employee = %review.employee_name, "Creating review");

        let effects = self.state.apply(Action::Created(review.clone()))?;
        self.run(effects).await?;
        Ok(review)
    }

    /// Replace one side's answers; returns the resulting status
    pub async fn submit_answers(
        &mut self,
        review_id: &str,
        side: AnswerSide,
        answers: Answers,
    ) -> Result<ReviewStatus> {
        let effects = self.state.apply(Action::AnswersSubmitted {
            review_id: review_id.to_string(),
            side,
            answers,
        })?;
        let status = self.status_of(review_id)?;
        self.run(effects).await?;
        Ok(status)
    }

    /// Close the interview with the manager's synthesis
    pub async fn complete_interview(
        &mut self,
        review_id: &str,
        completion: Completion,
    ) -> Result<()> {
        let effects = self.state.apply(Action::InterviewCompleted {
            review_id: review_id.to_string(),
            completion,
            validated_on: today(),
        })?;
        self.run(effects).await
    }

    /// First step of deletion
    pub fn request_delete(&mut self, review_id: &str) -> Result<()> {
        self.state
            .apply(Action::DeleteRequested(review_id.to_string()))
            .map(|_| ())
    }

    pub fn cancel_delete(&mut self) -> Result<()> {
        self.state.apply(Action::DeleteCancelled).map(|_| ())
    }

    /// Second step of deletion: issues the destructive call
    pub async fn confirm_delete(&mut self) -> Result<()> {
        let effects = self.state.apply(Action::DeleteConfirmed)?;
        self.run(effects).await
    }

    /// Ask the text generator for a draft; never fails on generator errors
    pub async fn generate_synthesis(&self, review_id: &str) -> Result<SynthesisDraft> {
        self.state.require_manager()?;
        let review = self
            .state
            .review(review_id)
            .ok_or_else(|| Error::NotFound(review_id.to_string()))?;
        Ok(draft_or_placeholder(&self.generator, review).await)
    }

    /// Employee link for a review, bound to the active store
    pub fn share_link(&self, review_id: &str) -> Result<String> {
        self.state.require_manager()?;
        let review = self
            .state
            .review(review_id)
            .ok_or_else(|| Error::NotFound(review_id.to_string()))?;
        let link = SharedLink::new(&self.config.app.base_url)?;
        Ok(link.for_review(review, Some(self.store.endpoint())))
    }

    /// Point the session at another store and reload
    ///
    /// The new settings are kept even when the reload fails; persisting them
    /// is up to the caller (see [`Config::save`]).
    pub async fn update_settings(&mut self, db_url: &str, sheet_url: Option<&str>) -> Result<()> {
        self.state.require_manager()?;
        let db_url = db_url.trim();
        if !is_http_url(db_url) {
            return Err(Error::Config(format!(
                "Store endpoint must be an http(s) URL, got {:?}",
                db_url
            )));
        }

        self.store = self.store.rebind(db_url)?;
        self.config.store.db_url = Some(db_url.to_string());
        self.config.store.sheet_url = sheet_url
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        info!(db_url, "Store endpoint updated");

        self.refresh().await
    }

    fn status_of(&self, review_id: &str) -> Result<ReviewStatus> {
        self.state
            .review(review_id)
            .map(|r| r.status)
            .ok_or_else(|| Error::NotFound(review_id.to_string()))
    }

    /// Time-based id, bumped until unique in the collection
    fn next_id(&self) -> String {
        let mut candidate = Utc::now().timestamp_millis();
        while self.state.review(&candidate.to_string()).is_some() {
            candidate += 1;
        }
        candidate.to_string()
    }

    /// Execute effects in order; the first failure is returned after every
    /// outcome has been recorded in the state
    async fn run(&mut self, effects: Vec<Effect>) -> Result<()> {
        let mut first_error = None;

        for effect in effects {
            if let Err(e) = self.run_one(effect).await {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn run_one(&mut self, effect: Effect) -> Result<()> {
        match effect {
            Effect::List => match self.store.list().await {
                Ok(records) if self.state.is_shared() => {
                    self.state.apply(Action::SharedRecordFetched(records))?;
                    Ok(())
                }
                Ok(records) => {
                    self.state.apply(Action::Loaded(records))?;
                    Ok(())
                }
                Err(e) if self.state.is_shared() => {
                    warn!(error = %e, "Background fetch failed, keeping placeholder");
                    Ok(())
                }
                Err(e) => {
                    self.state.apply(Action::LoadFailed(e.to_string()))?;
                    Err(e)
                }
            },

            Effect::Put(review) => {
                let review_id = review.id.clone();
                match self.store.put(&review).await {
                    Ok(()) => {
                        self.state.apply(Action::Saved { review_id })?;
                        Ok(())
                    }
                    Err(e) => {
                        warn!(review_id = %review_id, error = %e, "Save failed, keeping local changes");
                        self.state.apply(Action::SaveFailed {
                            review_id,
                            message: e.to_string(),
                        })?;
                        Err(e)
                    }
                }
            }

            Effect::Remove(review_id) => {
                let outcome = self.store.remove(&review_id).await;
                let error = outcome.as_ref().err().map(|e| e.to_string());
                self.state
                    .apply(Action::DeleteFinished { review_id, error })?;
                outcome
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::MemoryStore;
    use crate::synthesis::{Unavailable, MISSING_KEY_MESSAGE};
    use crate::NoticeLevel;
    use chrono::NaiveDate;

    fn record(id: &str, name: &str) -> ReviewRecord {
        ReviewRecord::new(id, name, "Cuisinier", NaiveDate::from_ymd_opt(2025, 1, 6).unwrap())
    }

    fn one(value: &str) -> Answers {
        let mut answers = Answers::new();
        answers.insert("achievements".to_string(), value.to_string());
        answers
    }

    async fn manager(store: MemoryStore) -> Session<MemoryStore, Unavailable> {
        let mut session = Session::open(store, Unavailable, Config::default(), None).unwrap();
        session.initialize().await;
        session.login("admin").unwrap();
        session
    }

    #[tokio::test]
    async fn test_full_scenario() {
        let store = MemoryStore::with_records(vec![]);
        let mut session = manager(store.clone()).await;

        let review = session
            .create_review("Jean", "Dupont", "Cuisinier")
            .await
            .unwrap();
        assert_eq!(review.employee_name, "Jean Dupont");
        assert_eq!(review.status, ReviewStatus::NotStarted);

        let status = session
            .submit_answers(&review.id, AnswerSide::Employee, one("Nouveau menu"))
            .await
            .unwrap();
        assert_eq!(status, ReviewStatus::EmployeeFilled);

        let status = session
            .submit_answers(&review.id, AnswerSide::Manager, one("Très bon travail"))
            .await
            .unwrap();
        assert_eq!(status, ReviewStatus::BothPrepared);

        session
            .complete_interview(
                &review.id,
                Completion {
                    final_synthesis: "Année réussie".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let done = session.state().review(&review.id).unwrap();
        assert_eq!(done.status, ReviewStatus::Completed);
        assert_eq!(
            done.validated_at.as_deref(),
            Some(today().format("%Y-%m-%d").to_string().as_str())
        );

        let status = session
            .submit_answers(&review.id, AnswerSide::Employee, Answers::new())
            .await
            .unwrap();
        assert_eq!(status, ReviewStatus::Completed);

        let inner = store.inner();
        assert_eq!(inner.records.len(), 1);
        assert_eq!(inner.records[0].status, ReviewStatus::Completed);
    }

    #[tokio::test]
    async fn test_load_failure_is_not_fatal() {
        let store = MemoryStore::with_records(vec![record("1", "A")]);
        store.inner().fail_list = true;

        let mut session = Session::open(store, Unavailable, Config::default(), None).unwrap();
        session.initialize().await;

        assert!(session.state().reviews().is_empty());
        assert!(session.state().banner().is_some());
        assert!(!session.state().is_loading());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_optimistic_state() {
        let store = MemoryStore::with_records(vec![record("1", "A")]);
        let mut session = manager(store.clone()).await;
        store.inner().fail_writes = true;

        let result = session
            .submit_answers("1", AnswerSide::Manager, one("Bien"))
            .await;
        assert!(matches!(result, Err(Error::Transport(_))));
        assert_eq!(
            session.state().review("1").unwrap().status,
            ReviewStatus::ManagerPrepared
        );
        assert_eq!(store.inner().records[0].status, ReviewStatus::NotStarted);

        let notices = session.drain_notices();
        assert!(notices.iter().any(|n| n.level == NoticeLevel::Error));
    }

    #[tokio::test]
    async fn test_refresh_discards_unsynced_edits() {
        let store = MemoryStore::with_records(vec![record("1", "A")]);
        let mut session = manager(store.clone()).await;
        store.inner().fail_writes = true;
        let _ = session
            .submit_answers("1", AnswerSide::Manager, one("Bien"))
            .await;
        store.inner().fail_writes = false;

        session.refresh().await.unwrap();
        assert_eq!(
            session.state().review("1").unwrap().status,
            ReviewStatus::NotStarted
        );
        assert_eq!(store.inner().lists, 2);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_collection() {
        let store = MemoryStore::with_records(vec![record("1", "A")]);
        let mut session = manager(store.clone()).await;
        store.inner().fail_list = true;

        assert!(session.refresh().await.is_err());
        assert_eq!(session.state().reviews().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_two_step() {
        let store = MemoryStore::with_records(vec![record("1", "A"), record("2", "B")]);
        let mut session = manager(store.clone()).await;

        assert!(matches!(
            session.confirm_delete().await,
            Err(Error::NoPendingDelete)
        ));
        assert!(store.inner().removes.is_empty());

        session.request_delete("1").unwrap();
        assert_eq!(session.state().reviews().len(), 2);
        session.confirm_delete().await.unwrap();

        assert!(session.state().review("1").is_none());
        assert_eq!(store.inner().removes, vec!["1".to_string()]);
        assert!(!session.state().is_delete_in_flight());
    }

    #[tokio::test]
    async fn test_failed_delete_not_rolled_back() {
        let store = MemoryStore::with_records(vec![record("1", "A")]);
        let mut session = manager(store.clone()).await;
        store.inner().fail_writes = true;

        session.request_delete("1").unwrap();
        assert!(session.confirm_delete().await.is_err());
        assert!(session.state().review("1").is_none());
        assert!(!session.state().is_delete_in_flight());
        assert_eq!(store.inner().records.len(), 1);
    }

    #[tokio::test]
    async fn test_login() {
        let store = MemoryStore::with_records(vec![]);
        let mut session = Session::open(store, Unavailable, Config::default(), None).unwrap();
        assert!(session.login("wrong").is_err());
        assert!(!session.state().is_authenticated());
        assert!(session.create_review("A", "B", "C").await.is_err());
        session.login("admin").unwrap();
        assert!(session.state().is_authenticated());
    }

    #[tokio::test]
    async fn test_create_requires_all_fields() {
        let mut session = manager(MemoryStore::with_records(vec![])).await;
        let result = session.create_review("Jean", "  ", "Cuisinier").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(session.state().reviews().is_empty());
    }

    #[tokio::test]
    async fn test_created_ids_unique() {
        let mut session = manager(MemoryStore::with_records(vec![])).await;
        let a = session.create_review("A", "A", "R").await.unwrap();
        let b = session.create_review("B", "B", "R").await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_shared_session_placeholder_then_hydrate() {
        let mut stored = record("42", "Jean Dupont");
        stored.submit_answers(AnswerSide::Employee, one("déjà saisi"));
        let store = MemoryStore::with_records(vec![record("1", "Autre"), stored.clone()]);

        let link = "https://reviews.example.com/?reviewId=42&mode=employee&name=Jean+Dupont&role=Cuisinier&dbUrl=https%3A%2F%2Fother.example.com%2Fexec";
        let mut session =
            Session::open(store.clone(), Unavailable, Config::default(), Some(link)).unwrap();

        // Renderable before any network call
        assert_eq!(store.inner().lists, 0);
        let placeholder = session.state().current_review().unwrap();
        assert_eq!(placeholder.employee_name, "Jean Dupont");
        assert_eq!(placeholder.status, ReviewStatus::NotStarted);
        assert!(placeholder.employee_answers.is_empty());
        assert_eq!(session.store().endpoint(), "https://other.example.com/exec");

        session.initialize().await;
        assert_eq!(store.inner().lists, 1);
        assert_eq!(session.state().reviews(), &[stored]);
        assert_eq!(session.state().view(), View::EmployeeForm);

        // The reconcile fetch queued at open runs once
        session.initialize().await;
        assert_eq!(store.inner().lists, 1);
    }

    #[tokio::test]
    async fn test_shared_session_fetch_failure_keeps_placeholder() {
        let store = MemoryStore::with_records(vec![]);
        store.inner().fail_list = true;

        let link = "https://reviews.example.com/?reviewId=42&mode=employee&name=Ana&role=Chef";
        let mut session = Session::open(store, Unavailable, Config::default(), Some(link)).unwrap();
        session.initialize().await;

        assert_eq!(session.state().current_review().unwrap().id, "42");
        assert!(session.state().banner().is_none());

        // No login needed, employee answers allowed
        session.login("").unwrap();
        let status = session
            .submit_answers("42", AnswerSide::Employee, one("Réponse"))
            .await
            .unwrap();
        assert_eq!(status, ReviewStatus::EmployeeFilled);
        assert!(session.refresh().await.is_err());
        assert!(session.share_link("42").is_err());
    }

    #[tokio::test]
    async fn test_share_link_round_trip() {
        let mut session = manager(MemoryStore::with_records(vec![record("5", "Léa Martin")])).await;
        let link = session.share_link("5").unwrap();
        let params = SharedLinkParams::from_url(&link).unwrap().unwrap();
        assert_eq!(params.review_id, "5");
        assert_eq!(params.name, "Léa Martin");
        assert_eq!(params.resolve_db_url(""), "https://store.test/exec");

        let review = session.open_view(View::Print, Some("5")).unwrap();
        assert_eq!(review.id, "5");
    }

    #[tokio::test]
    async fn test_generate_synthesis_degrades() {
        let session = manager(MemoryStore::with_records(vec![record("1", "A")])).await;
        let draft = session.generate_synthesis("1").await.unwrap();
        assert_eq!(draft.synthesis, MISSING_KEY_MESSAGE);
        assert!(matches!(
            session.generate_synthesis("404").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_settings() {
        let store = MemoryStore::with_records(vec![record("1", "A")]);
        let mut session = manager(store.clone()).await;

        assert!(session.update_settings("nope", None).await.is_err());

        session
            .update_settings(
                "https://new.example.com/exec",
                Some("https://sheets.example.com/d/1"),
            )
            .await
            .unwrap();
        assert_eq!(session.store().endpoint(), "https://new.example.com/exec");
        assert_eq!(
            session.config().active_db_url(),
            "https://new.example.com/exec"
        );
        assert_eq!(
            session.config().store.sheet_url.as_deref(),
            Some("https://sheets.example.com/d/1")
        );
    }
}
