//! Dashboard command - list reviews with their status

use clap::Args;
use evalsenior_core::ReviewStatus;

use super::{manager_session, print_notices, Context};

/// List reviews and campaign counters
#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Only show reviews with this status
    #[arg(long, value_enum)]
    status: Option<StatusFilter>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StatusFilter {
    NotStarted,
    EmployeeFilled,
    ManagerPrepared,
    BothPrepared,
    Completed,
}

impl From<StatusFilter> for ReviewStatus {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::NotStarted => ReviewStatus::NotStarted,
            StatusFilter::EmployeeFilled => ReviewStatus::EmployeeFilled,
            StatusFilter::ManagerPrepared => ReviewStatus::ManagerPrepared,
            StatusFilter::BothPrepared => ReviewStatus::BothPrepared,
            StatusFilter::Completed => ReviewStatus::Completed,
        }
    }
}

impl DashboardArgs {
    /// Execute the dashboard command
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let mut session = manager_session(ctx).await?;
        print_notices(&mut session);

        let state = session.state();
        let summary = state.summary();

        println!();
        println!(
            "Entretiens: {}   En cours: {}   Terminés: {}",
            summary.total, summary.in_progress, summary.completed
        );
        if let Some(ref sheet_url) = session.config().store.sheet_url {
            println!("Feuille de suivi: {}", sheet_url);
        }
        println!();

        let filter = self.status.map(ReviewStatus::from);
        let rows: Vec<_> = state
            .reviews()
            .iter()
            .filter(|r| filter.map_or(true, |s| r.status == s))
            .collect();

        if rows.is_empty() {
            println!("Aucun entretien.");
            return Ok(());
        }

        println!(
            "{:<15} {:<25} {:<20} {:<12} {}",
            "ID", "Salarié", "Poste", "Date", "Statut"
        );
        for review in rows {
            println!(
                "{:<15} {:<25} {:<20} {:<12} {}",
                review.id,
                truncate(&review.employee_name, 25),
                truncate(&review.employee_role, 20),
                review.date,
                review.status
            );
        }

        if ctx.verbose {
            tracing::info!(db_url = %session.config().active_db_url(), "Dashboard rendered");
        }
        Ok(())
    }
}

/// Shorten to `width` characters, marking the cut
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
