//! Interview synthesis drafting
//!
//! A text generator reads both answer sets and proposes a synthesis, one
//! objective and one training suggestion. Generation is an aid only: any
//! failure degrades to a placeholder the manager can overwrite.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::review::{questions, ReviewRecord};
use crate::{Error, Result};

/// Shown when no API key is configured
pub const MISSING_KEY_MESSAGE: &str = "Erreur: Clé API manquante. Veuillez configurer l'API Key.";

/// Shown when the generator fails
pub const FAILURE_MESSAGE: &str = "Une erreur est survenue lors de la génération de la synthèse.";

/// Shown when the generator answers with nothing
pub const EMPTY_MESSAGE: &str = "Impossible de générer la synthèse.";

const UNANSWERED: &str = "Non renseigné";

/// Draft produced for the completion step
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SynthesisDraft {
    #[serde(default)]
    pub synthesis: String,
    #[serde(default, alias = "objective")]
    pub objectives: String,
    #[serde(default)]
    pub training: String,
    /// Set when the text is a fallback message rather than generated content
    #[serde(skip)]
    pub is_placeholder: bool,
}

impl SynthesisDraft {
    /// A draft carrying only a message in the synthesis field
    pub fn placeholder(message: impl Into<String>) -> Self {
        Self {
            synthesis: message.into(),
            is_placeholder: true,
            ..Default::default()
        }
    }
}

/// External text generator
#[async_trait]
pub trait SynthesisGenerator: Send + Sync {
    /// Draft a synthesis for the review
    ///
    /// Returns `Error::Config` when credentials are missing.
    async fn generate(&self, review: &ReviewRecord) -> Result<SynthesisDraft>;
}

/// Generator used when no credentials are available
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

#[async_trait]
impl SynthesisGenerator for Unavailable {
    async fn generate(&self, _review: &ReviewRecord) -> Result<SynthesisDraft> {
        Err(Error::Config("API key missing".to_string()))
    }
}

/// Run the generator, turning every failure into a placeholder draft
pub async fn draft_or_placeholder<G: SynthesisGenerator + ?Sized>(
    generator: &G,
    review: &ReviewRecord,
) -> SynthesisDraft {
    match generator.generate(review).await {
        Ok(draft) if draft.synthesis.trim().is_empty() => SynthesisDraft {
            synthesis: EMPTY_MESSAGE.to_string(),
            is_placeholder: true,
            ..draft
        },
        Ok(draft) => draft,
        Err(Error::Config(reason)) => {
            warn!(review_id = %review.id, %reason, "Synthesis generator not configured");
            SynthesisDraft::placeholder(MISSING_KEY_MESSAGE)
        }
        Err(e) => {
            warn!(review_id = %review.id, error = %e, "Synthesis generation failed");
            SynthesisDraft::placeholder(FAILURE_MESSAGE)
        }
    }
}

/// Build the generation prompt from both answer sets
pub fn build_prompt(review: &ReviewRecord) -> String {
    let mut prompt = format!(
        "Tu es un expert RH assistant un directeur de résidence senior pour des entretiens annuels.\n\
         Ton but est de rédiger une synthèse professionnelle, constructive et bienveillante \
         basée sur les réponses de l'employé et du manager.\n\n\
         Employé: {} ({})\n\n\
         Voici les réponses confrontées :\n",
        review.employee_name, review.employee_role
    );

    for q in questions() {
        prompt.push_str(&format!("\nQuestion: {}\n", q.label));
        prompt.push_str(&format!(
            "- Réponse Employé: {}\n",
            answer_or_unanswered(review.employee_answers.get(q.id))
        ));
        prompt.push_str(&format!(
            "- Avis Manager: {}\n",
            answer_or_unanswered(review.manager_answers.get(q.id))
        ));
    }

    prompt.push_str(
        "\nTâche : Rédige une \"Synthèse de l'entretien\" d'environ 150 mots.\n\
         1. Souligne les points d'accord (réussites).\n\
         2. Mentionne avec tact les points d'amélioration identifiés par le manager s'il y en a.\n\
         3. Adopte un ton encourageant pour l'année à venir.\n\
         Propose aussi un objectif pour l'année à venir et une formation adaptée.\n\
         Réponds uniquement en JSON : {\"synthesis\": \"...\", \"objectives\": \"...\", \"training\": \"...\"}",
    );

    prompt
}

fn answer_or_unanswered(answer: Option<&String>) -> &str {
    match answer {
        Some(a) if !a.trim().is_empty() => a,
        _ => UNANSWERED,
    }
}

/// Interpret the generator's text output
///
/// Accepts bare JSON or JSON inside a code fence; anything else becomes the
/// synthesis text.
pub fn parse_draft(text: &str) -> SynthesisDraft {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    match serde_json::from_str::<SynthesisDraft>(body) {
        Ok(draft) => draft,
        Err(_) => SynthesisDraft {
            synthesis: trimmed.to_string(),
            ..Default::default()
        },
    }
}
