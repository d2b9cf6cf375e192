//! Review commands - create, answer, complete, delete, share and print

use clap::{Args, ValueEnum};
use evalsenior_core::report::render_report;
use evalsenior_core::{
    questions, AnswerSide, Answers, Completion, ReviewRecord, SynthesisDraft, View,
};

use super::{confirm, manager_session, parse_answer, print_notices, Context};

/// Create a review for an employee
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Employee first name
    #[arg(long)]
    pub first_name: String,

    /// Employee last name
    #[arg(long)]
    pub last_name: String,

    /// Job title
    #[arg(long)]
    pub role: String,
}

impl CreateArgs {
    /// Execute the create command
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let mut session = manager_session(ctx).await?;
        let result = session
            .create_review(&self.first_name, &self.last_name, &self.role)
            .await;
        print_notices(&mut session);
        let review = result?;

        println!("Created review {} for {}", review.id, review.employee_name);
        println!();
        println!("Employee link:");
        println!("  {}", session.share_link(&review.id)?);
        Ok(())
    }
}

/// Show a review
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Review id
    pub id: String,
}

impl ShowArgs {
    /// Execute the show command
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let mut session = manager_session(ctx).await?;
        let review = session.open_view(View::Interview, Some(&self.id))?;
        print_comparison(review);
        Ok(())
    }
}

/// Which answer set to fill
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Side {
    Employee,
    Manager,
}

impl From<Side> for AnswerSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Employee => AnswerSide::Employee,
            Side::Manager => AnswerSide::Manager,
        }
    }
}

/// Fill answers on behalf of the manager or the employee
#[derive(Args, Debug)]
pub struct AnswerArgs {
    /// Review id
    pub id: String,

    /// Answer set to edit
    #[arg(long = "as", value_enum, default_value = "manager")]
    pub side: Side,

    /// Answer as QUESTION=TEXT (repeatable); merged into existing answers
    #[arg(short, long = "set", value_parser = parse_answer)]
    pub answers: Vec<(String, String)>,

    /// Clear a question's answer (repeatable)
    #[arg(long)]
    pub clear: Vec<String>,
}

impl AnswerArgs {
    /// Execute the answer command
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let mut session = manager_session(ctx).await?;
        let side = AnswerSide::from(self.side);
        let view = match side {
            AnswerSide::Employee => View::EmployeeForm,
            AnswerSide::Manager => View::ManagerForm,
        };

        let existing = session.open_view(view, Some(&self.id))?.answers(side).clone();
        let answers = merge_answers(existing, &self.answers, &self.clear);

        let result = session.submit_answers(&self.id, side, answers).await;
        print_notices(&mut session);
        let status = result?;

        println!("Review {} is now: {}", self.id, status);
        Ok(())
    }
}

/// Draft a synthesis without saving it
#[derive(Args, Debug)]
pub struct SynthesizeArgs {
    /// Review id
    pub id: String,
}

impl SynthesizeArgs {
    /// Execute the synthesize command
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let session = manager_session(ctx).await?;
        let draft = session.generate_synthesis(&self.id).await?;

        println!("Synthèse de l'entretien");
        println!("  {}", draft.synthesis);
        println!();
        println!("Objectifs N+1");
        println!("  {}", or_dash(&draft.objectives));
        println!();
        println!("Formation / Souhaits");
        println!("  {}", or_dash(&draft.training));
        Ok(())
    }
}

/// Close the interview
#[derive(Args, Debug)]
pub struct CompleteArgs {
    /// Review id
    pub id: String,

    /// Final synthesis text
    #[arg(long)]
    pub synthesis: Option<String>,

    /// Objectives for next year
    #[arg(long)]
    pub objectives: Option<String>,

    /// Training needs
    #[arg(long)]
    pub training: Option<String>,

    /// Fill fields left empty with a generated draft
    #[arg(long)]
    pub generate: bool,
}

impl CompleteArgs {
    /// Execute the complete command
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let mut session = manager_session(ctx).await?;
        let review = session.open_view(View::Interview, Some(&self.id))?;

        // Start from what is already recorded, like the interview screen
        let mut completion = Completion {
            final_synthesis: self
                .synthesis
                .clone()
                .unwrap_or_else(|| review.final_synthesis.clone()),
            objectives_next_year: self
                .objectives
                .clone()
                .unwrap_or_else(|| review.objectives_next_year.clone()),
            training_needs: self
                .training
                .clone()
                .unwrap_or_else(|| review.training_needs.clone()),
        };

        if self.generate {
            let draft = session.generate_synthesis(&self.id).await?;
            apply_draft(&mut completion, draft)?;
        }

        let result = session.complete_interview(&self.id, completion).await;
        print_notices(&mut session);
        result?;

        let review = session
            .state()
            .review(&self.id)
            .ok_or_else(|| anyhow::anyhow!("Review {} disappeared", self.id))?;
        println!(
            "Review {} signed on {}",
            review.id,
            review.validated_at.as_deref().unwrap_or("-")
        );
        println!("Print it with: evalsenior report {}", review.id);
        Ok(())
    }
}

/// Delete a review
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Review id
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl DeleteArgs {
    /// Execute the delete command
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let mut session = manager_session(ctx).await?;
        session.request_delete(&self.id)?;

        let name = session
            .state()
            .review(&self.id)
            .map(|r| r.employee_name.clone())
            .unwrap_or_default();
        let confirmed = self.yes
            || confirm(&format!(
                "Supprimer l'entretien de {} ({}) ? Cette action est irréversible.",
                name, self.id
            ))?;

        if !confirmed {
            session.cancel_delete()?;
            println!("Suppression annulée.");
            return Ok(());
        }

        let result = session.confirm_delete().await;
        print_notices(&mut session);
        result?;
        Ok(())
    }
}

/// Print the employee link
#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Review id
    pub id: String,
}

impl LinkArgs {
    /// Execute the link command
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let session = manager_session(ctx).await?;
        println!("{}", session.share_link(&self.id)?);
        Ok(())
    }
}

/// Print the signed report
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Review id
    pub id: String,
}

impl ReportArgs {
    /// Execute the report command
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let mut session = manager_session(ctx).await?;
        let review = session.open_view(View::Print, Some(&self.id))?;
        print!("{}", render_report(review));
        Ok(())
    }
}

/// Apply `--set` and `--clear` edits on top of the stored answers
fn merge_answers(mut answers: Answers, set: &[(String, String)], clear: &[String]) -> Answers {
    for (id, value) in set {
        answers.insert(id.clone(), value.clone());
    }
    for id in clear {
        answers.remove(id);
    }
    answers
}

/// Fill the blank completion fields from a generated draft
///
/// A fallback draft is refused so its message never gets signed.
fn apply_draft(completion: &mut Completion, draft: SynthesisDraft) -> anyhow::Result<()> {
    if draft.is_placeholder {
        anyhow::bail!(
            "{}\nNothing was signed. Write the fields with --synthesis, --objectives and \
             --training, or retry without --generate.",
            draft.synthesis
        );
    }
    fill_if_empty(&mut completion.final_synthesis, draft.synthesis);
    fill_if_empty(&mut completion.objectives_next_year, draft.objectives);
    fill_if_empty(&mut completion.training_needs, draft.training);
    Ok(())
}

fn fill_if_empty(field: &mut String, draft: String) {
    if field.trim().is_empty() {
        *field = draft;
    }
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() {
        "-"
    } else {
        s
    }
}

/// Employee answer and manager opinion for each question
fn print_comparison(review: &ReviewRecord) {
    println!("{} - {}", review.employee_name, review.employee_role);
    println!("Date: {}   Statut: {}", review.date, review.status);

    for q in questions() {
        println!();
        println!("[{}] {}", q.id, q.label);
        println!(
            "  Salarié : {}",
            review.employee_answers.get(q.id).map_or("-", |a| or_dash(a))
        );
        println!(
            "  Manager : {}",
            review.manager_answers.get(q.id).map_or("-", |a| or_dash(a))
        );
    }
}
