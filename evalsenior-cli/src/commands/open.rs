//! Employee side: open a shared link and answer the questionnaire

use clap::Args;
use evalsenior_core::{questions, AnswerSide, ReviewRecord};

use super::{parse_answer, print_notices, shared_session, Context};

const CLOSED_MESSAGE: &str = "Cet entretien est clôturé, les réponses ne sont plus modifiables.";

/// Open an employee link
#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Link received from the manager
    pub link: String,

    /// Answer as QUESTION=TEXT (repeatable); without it the form is only shown
    #[arg(short, long = "set", value_parser = parse_answer)]
    pub answers: Vec<(String, String)>,
}

impl OpenArgs {
    /// Execute the open command
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let mut session = shared_session(ctx, &self.link).await?;
        print_notices(&mut session);

        let review = session
            .state()
            .current_review()
            .ok_or_else(|| anyhow::anyhow!("The link does not name a review"))?
            .clone();

        println!("Entretien annuel - {}", review.employee_name);
        println!("Poste : {}", review.employee_role);
        println!("Statut : {}", review.status);

        if review.is_completed() {
            println!();
            println!("{}", CLOSED_MESSAGE);
        }

        let mut answers = review.employee_answers.clone();
        if self.answers.is_empty() {
            for q in questions() {
                println!();
                println!("[{}] {}", q.id, q.label);
                println!("  {}", answers.get(q.id).map(String::as_str).unwrap_or("-"));
            }
            if !review.is_completed() {
                println!();
                println!("Répondez avec: evalsenior open '<lien>' --set <question>=<réponse>");
            }
            return Ok(());
        }

        ensure_open(&review)?;
        for (id, value) in &self.answers {
            answers.insert(id.clone(), value.clone());
        }

        let result = session
            .submit_answers(&review.id, AnswerSide::Employee, answers)
            .await;
        print_notices(&mut session);
        let status = result?;

        println!("Réponses envoyées. Statut : {}", status);
        Ok(())
    }
}

/// Signed reviews no longer accept employee answers
fn ensure_open(review: &ReviewRecord) -> anyhow::Result<()> {
    if review.is_completed() {
        anyhow::bail!(CLOSED_MESSAGE);
    }
    Ok(())
}
