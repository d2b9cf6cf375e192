//! EvalSenior Store - HTTP collaborators for EvalSenior
//!
//! This crate talks to the spreadsheet-backed record store and to the
//! text-generation API used to draft interview syntheses.

mod client;
mod error;
mod gemini;

#[cfg(test)]
mod test_server;

pub use client::HttpRecordStore;
pub use error::{Error, Result};
pub use gemini::GeminiClient;
