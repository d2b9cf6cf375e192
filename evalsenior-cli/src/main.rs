//! EvalSenior CLI - Command line interface for annual reviews
//!
//! Managers create reviews, share employee links, prepare and close
//! interviews and print the signed report; employees answer through a link.

mod commands;

use clap::{Parser, Subcommand};
use evalsenior_core::{questions, Config};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{
    AnswerArgs, CompleteArgs, ConfigArgs, Context, CreateArgs, DashboardArgs, DeleteArgs,
    LinkArgs, OpenArgs, ReportArgs, ShowArgs, SynthesizeArgs,
};

/// EvalSenior: annual performance reviews backed by a shared sheet
#[derive(Parser, Debug)]
#[command(name = "evalsenior")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Record store endpoint (overrides config and env)
    #[arg(long, global = true)]
    db_url: Option<String>,

    /// Manager password
    #[arg(long, global = true, env = "EVALSENIOR_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// List reviews with their status
    #[command(visible_alias = "ls")]
    Dashboard(DashboardArgs),

    /// Create a review for an employee
    Create(CreateArgs),

    /// Show both answer sets of a review side by side
    Show(ShowArgs),

    /// Fill the employee or manager answers of a review
    Answer(AnswerArgs),

    /// Draft a synthesis with the text generator
    Synthesize(SynthesizeArgs),

    /// Close the interview and sign the review
    Complete(CompleteArgs),

    /// Delete a review (asks for confirmation)
    #[command(visible_alias = "rm")]
    Delete(DeleteArgs),

    /// Print the employee link for a review
    Link(LinkArgs),

    /// Open an employee link and answer the questionnaire
    Open(OpenArgs),

    /// Print the signed interview report
    Report(ReportArgs),

    /// List the questionnaire
    Questions,

    /// Show or change settings
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.db_url.clone())?;

    if cli.verbose {
        tracing::info!(
            db_url = %config.active_db_url(),
            base_url = %config.app.base_url,
            model = %config.synthesis.model,
            "Configuration loaded"
        );
    }

    let ctx = Context {
        config,
        password: cli.password.clone(),
        verbose: cli.verbose,
    };

    match cli.command {
        Some(Commands::Version) => {
            println!("evalsenior {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Dashboard(args)) => args.execute(&ctx).await?,
        Some(Commands::Create(args)) => args.execute(&ctx).await?,
        Some(Commands::Show(args)) => args.execute(&ctx).await?,
        Some(Commands::Answer(args)) => args.execute(&ctx).await?,
        Some(Commands::Synthesize(args)) => args.execute(&ctx).await?,
        Some(Commands::Complete(args)) => args.execute(&ctx).await?,
        Some(Commands::Delete(args)) => args.execute(&ctx).await?,
        Some(Commands::Link(args)) => args.execute(&ctx).await?,
        Some(Commands::Open(args)) => args.execute(&ctx).await?,
        Some(Commands::Report(args)) => args.execute(&ctx).await?,
        Some(Commands::Questions) => {
            let mut category = "";
            for q in questions() {
                if q.category != category {
                    category = q.category;
                    println!();
                    println!("{}", category);
                }
                println!("  [{}] {}", q.id, q.label);
                if let Some(description) = q.description {
                    println!("      {}", description);
                }
            }
        }
        Some(Commands::Config(args)) => args.execute(&ctx).await?,
        None => {
            println!("EvalSenior - Annual performance reviews");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
