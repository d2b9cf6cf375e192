//! Settings commands

use anyhow::Context as _;
use clap::{Args, Subcommand};
use evalsenior_core::config::is_http_url;
use evalsenior_core::{Config, Secrets};

use super::{manager_session, print_notices, Context};

/// Show or change settings
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the active settings
    Show,

    /// Point at another store and reload the reviews
    Set {
        /// Record store endpoint (web app URL)
        #[arg(long)]
        db_url: String,

        /// Spreadsheet URL shown on the dashboard
        #[arg(long)]
        sheet_url: Option<String>,
    },

    /// Create a secrets file template for the text generator key
    InitSecrets,
}

impl ConfigArgs {
    /// Execute the config command
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        match &self.command {
            ConfigCommand::Show => show(&ctx.config),
            ConfigCommand::Set { db_url, sheet_url } => {
                set(ctx, db_url, sheet_url.as_deref()).await
            }
            ConfigCommand::InitSecrets => {
                let path = Secrets::create_template()?;
                println!("Created secrets template at {}", path.display());
                println!("Add your API key there, or set GEMINI_API_KEY.");
                Ok(())
            }
        }
    }
}

fn show(config: &Config) -> anyhow::Result<()> {
    let path = Config::default_config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(unavailable)".to_string());

    println!("Config file:      {}", path);
    println!("Store endpoint:   {}", config.active_db_url());
    println!(
        "Sheet URL:        {}",
        config.store.sheet_url.as_deref().unwrap_or("-")
    );
    println!("Link base URL:    {}", config.app.base_url);
    println!("Synthesis model:  {}", config.synthesis.model);
    if let Some(timeout) = config.store.request_timeout {
        println!("Request timeout:  {}s", timeout.as_secs());
    }
    Ok(())
}

async fn set(ctx: &Context, db_url: &str, sheet_url: Option<&str>) -> anyhow::Result<()> {
    let db_url = validate_endpoint(db_url)?;

    let mut session = manager_session(ctx).await?;
    let reload = session.update_settings(db_url, sheet_url).await;

    // Persist on top of the file, not the env/flag-overridden runtime config
    let persisted = with_store_settings(Config::load()?, db_url, sheet_url);
    let path = persisted.save().context("Failed to save configuration")?;
    print_notices(&mut session);

    println!("Settings saved to {}", path.display());
    match reload {
        Ok(()) => println!("{} review(s) loaded", session.state().reviews().len()),
        Err(e) => eprintln!("Warning: could not reload reviews: {}", e),
    }
    Ok(())
}

fn validate_endpoint(db_url: &str) -> anyhow::Result<&str> {
    let db_url = db_url.trim();
    if !is_http_url(db_url) {
        anyhow::bail!("Store endpoint must be an http(s) URL, got {:?}", db_url);
    }
    Ok(db_url)
}

/// Replace the store settings, keeping everything else as loaded
fn with_store_settings(mut config: Config, db_url: &str, sheet_url: Option<&str>) -> Config {
    config.store.db_url = Some(db_url.to_string());
    config.store.sheet_url = sheet_url
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    config
}
