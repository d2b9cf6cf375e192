//! The fixed questionnaire shared by the employee and manager forms

/// A single question of the annual review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    /// Stable key used in the answer maps
    pub id: &'static str,
    /// Section heading
    pub category: &'static str,
    /// Question text
    pub label: &'static str,
    /// Optional hint shown under the label
    pub description: Option<&'static str>,
}

const QUESTIONS: &[Question] = &[
    Question {
        id: "achievements",
        category: "Bilan de l'année écoulée",
        label: "Quelles sont vos principales réussites cette année ?",
        description: Some("Projets aboutis, tâches bien réalisées, moments forts."),
    },
    Question {
        id: "difficulties",
        category: "Bilan de l'année écoulée",
        label: "Quelles difficultés avez-vous rencontrées ?",
        description: Some("Obstacles techniques, relationnels ou organisationnels."),
    },
    Question {
        id: "skills_soft",
        category: "Compétences & Savoir-être",
        label: "Comment évaluez-vous votre relationnel (résidents, équipe) ?",
        description: None,
    },
    Question {
        id: "skills_hard",
        category: "Compétences & Savoir-être",
        label: "Avez-vous le sentiment de maîtriser les aspects techniques de votre poste ?",
        description: None,
    },
    Question {
        id: "atmosphere",
        category: "Vie au travail",
        label: "Comment ressentez-vous l'ambiance générale de la résidence ?",
        description: None,
    },
];

/// All questions, in display order
pub fn questions() -> &'static [Question] {
    QUESTIONS
}

/// Look up a question by id
pub fn question(id: &str) -> Option<&'static Question> {
    QUESTIONS.iter().find(|q| q.id == id)
}
