//! CLI command implementations

pub mod config;
pub mod dashboard;
pub mod open;
pub mod review;

pub use config::ConfigArgs;
pub use dashboard::DashboardArgs;
pub use open::OpenArgs;
pub use review::{
    AnswerArgs, CompleteArgs, CreateArgs, DeleteArgs, LinkArgs, ReportArgs, ShowArgs,
    SynthesizeArgs,
};

use anyhow::Context as _;
use evalsenior_core::{question, Config, NoticeLevel, Secrets, Session};
use evalsenior_store::{GeminiClient, HttpRecordStore};

/// Session type used by every command
pub type AppSession = Session<HttpRecordStore, GeminiClient>;

/// Settings shared by all commands
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub password: Option<String>,
    pub verbose: bool,
}

/// Build the store and generator from configuration
fn collaborators(config: &Config) -> anyhow::Result<(HttpRecordStore, GeminiClient)> {
    let store = HttpRecordStore::from_config(config)?;
    let secrets = Secrets::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring unreadable secrets file");
        Secrets::default()
    });
    let generator = GeminiClient::from_config(config, &secrets)?;
    Ok((store, generator))
}

/// Open a logged-in manager session with the collection loaded
pub async fn manager_session(ctx: &Context) -> anyhow::Result<AppSession> {
    let (store, generator) = collaborators(&ctx.config)?;
    let mut session = Session::open(store, generator, ctx.config.clone(), None)?;

    let password = ctx.password.as_deref().ok_or_else(|| {
        anyhow::anyhow!("Manager password required. Use --password or set EVALSENIOR_PASSWORD")
    })?;
    session.login(password)?;

    session.initialize().await;
    if let Some(banner) = session.state().banner() {
        eprintln!("Warning: {}", banner);
    }
    Ok(session)
}

/// Open a session from an employee link, reconciled with the store
pub async fn shared_session(ctx: &Context, link: &str) -> anyhow::Result<AppSession> {
    let (store, generator) = collaborators(&ctx.config)?;
    let mut session = Session::open(store, generator, ctx.config.clone(), Some(link))?;
    if !session.state().is_shared() {
        anyhow::bail!("Not an employee link: {}", link);
    }
    session.initialize().await;
    Ok(session)
}

/// Print and clear the session's notices
pub fn print_notices(session: &mut AppSession) {
    for notice in session.drain_notices() {
        match notice.level {
            NoticeLevel::Error => eprintln!("Error: {}", notice.message),
            NoticeLevel::Info | NoticeLevel::Success => println!("{}", notice.message),
        }
    }
}

/// Parse a `question_id=answer` pair
pub fn parse_answer(s: &str) -> Result<(String, String), String> {
    let (id, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected QUESTION=ANSWER, got {:?}", s))?;
    let id = id.trim();
    if question(id).is_none() {
        let known: Vec<_> = evalsenior_core::questions().iter().map(|q| q.id).collect();
        return Err(format!(
            "unknown question {:?} (expected one of: {})",
            id,
            known.join(", ")
        ));
    }
    Ok((id.to_string(), value.to_string()))
}

/// Read a yes/no answer from stdin
pub fn confirm(prompt: &str) -> anyhow::Result<bool> {
    use std::io::Write;

    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read confirmation")?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes" | "o" | "oui"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(
            parse_answer("achievements=Nouveau menu = succès").unwrap(),
            (
                "achievements".to_string(),
                "Nouveau menu = succès".to_string()
            )
        );
        assert!(parse_answer("achievements").is_err());
        assert!(parse_answer("salary=more").is_err());
    }
}
