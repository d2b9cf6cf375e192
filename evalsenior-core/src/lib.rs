//! EvalSenior Core - Core library for annual performance reviews
//!
//! This crate tracks per-employee review records through their lifecycle,
//! resolves review status from the two answer sets, encodes shareable
//! employee links, and drives a review session against a remote record store.

pub mod config;
pub mod error;
pub mod link;
pub mod report;
pub mod review;
pub mod secrets;
pub mod session;
pub mod store;
pub mod synthesis;

pub use config::Config;
pub use error::{Error, Result};
pub use link::{SharedLink, SharedLinkParams};
pub use review::{
    has_data, question, questions, resolve_status, today, AnswerSide, Answers, Completion, Question,
    ReviewRecord, ReviewStatus,
};
pub use secrets::Secrets;
pub use session::{
    Action, AppState, DashboardSummary, Effect, Notice, NoticeLevel, Session, View,
};
pub use store::RecordStore;
pub use synthesis::{SynthesisDraft, SynthesisGenerator, Unavailable};
