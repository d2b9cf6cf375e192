//! Review session: owned application state plus the driver that keeps it in
//! sync with the record store
//!
//! All mutation goes through [`AppState::apply`], which performs the
//! optimistic local change and returns the store effects to run. [`Session`]
//! executes those effects and feeds the outcomes back as actions.

mod controller;
mod state;

pub use controller::Session;
pub use state::{Action, AppState, DashboardSummary, Effect, Notice, NoticeLevel, View};
