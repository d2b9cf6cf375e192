//! Printable interview report
//!
//! Renders the signed "compte rendu" of a review as plain text: both answer
//! sets side by side per question, the manager's synthesis, next year's
//! objectives and training wishes, and the two signature blocks.

use std::fmt::Write;

use crate::review::{questions, ReviewRecord};

const NO_SYNTHESIS: &str = "Aucune synthèse enregistrée.";
const EMPTY_FIELD: &str = "-";
const RULE: &str = "------------------------------------------------------------";

/// Render the report for one review
pub fn render_report(review: &ReviewRecord) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = write_report(&mut out, review);
    out
}

fn write_report(out: &mut String, review: &ReviewRecord) -> std::fmt::Result {
    writeln!(out, "COMPTE RENDU")?;
    writeln!(out, "Entretien Annuel d'Évaluation")?;
    writeln!(out)?;
    writeln!(out, "{}", review.employee_name)?;
    writeln!(out, "{}", review.employee_role)?;
    writeln!(out, "Date: {}", review.date)?;
    if let Some(ref validated_at) = review.validated_at {
        writeln!(out, "Validé le: {}", validated_at)?;
    }
    writeln!(out, "Statut: {}", review.status)?;
    writeln!(out, "{}", RULE)?;

    let mut category = "";
    for q in questions() {
        if q.category != category {
            category = q.category;
            writeln!(out)?;
            writeln!(out, "== {} ==", category)?;
        }
        writeln!(out)?;
        writeln!(out, "{}", q.label)?;
        writeln!(out, "  Salarié :")?;
        write_block(out, review.employee_answers.get(q.id), EMPTY_FIELD)?;
        writeln!(out, "  Manager :")?;
        write_block(out, review.manager_answers.get(q.id), EMPTY_FIELD)?;
    }

    writeln!(out)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Synthèse de l'entretien")?;
    write_block(out, Some(&review.final_synthesis), NO_SYNTHESIS)?;
    writeln!(out)?;
    writeln!(out, "Objectifs N+1")?;
    write_block(out, Some(&review.objectives_next_year), EMPTY_FIELD)?;
    writeln!(out)?;
    writeln!(out, "Formation / Souhaits")?;
    write_block(out, Some(&review.training_needs), EMPTY_FIELD)?;

    writeln!(out)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Signature du Salarié                 Signature du Directeur")?;
    writeln!(out, "Précédé de la mention \"Lu et approuvé\"")?;
    writeln!(out)?;
    writeln!(out)?;
    writeln!(out, "____________________                 ____________________")?;
    Ok(())
}

fn write_block(out: &mut String, text: Option<&String>, fallback: &str) -> std::fmt::Result {
    let text = match text {
        Some(t) if !t.trim().is_empty() => t.as_str(),
        _ => fallback,
    };
    for line in text.lines() {
        writeln!(out, "    {}", line)?;
    }
    Ok(())
}
