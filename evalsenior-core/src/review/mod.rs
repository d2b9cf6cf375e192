//! Review records, the fixed question list and status resolution

mod model;
mod questions;
mod status;

pub use model::{today, Answers, AnswerSide, Completion, ReviewRecord};
pub use questions::{question, questions, Question};
pub use status::{has_data, resolve_status, ReviewStatus};
