use thiserror::Error;

use crate::model::{Category, QuestionId};

/// Number of answer options per question.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("option {index} cannot be empty")]
    EmptyOption { index: usize },

    #[error("correct option index {index} out of range 0..{}", OPTION_COUNT)]
    InvalidCorrectOption { index: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One multiple-choice question supplied by the external content service.
///
/// Questions are read-only to this engine; they are sampled into exam
/// sessions and joined against answer history for review selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    id: QuestionId,
    category: Category,
    text: String,
    options: [String; OPTION_COUNT],
    correct_option: usize,
    explanation: Option<String>,
}

impl Question {
    /// Creates a new question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text or any option is empty, or the
    /// correct-option index is out of range.
    pub fn new(
        id: QuestionId,
        category: Category,
        text: impl Into<String>,
        options: [String; OPTION_COUNT],
        correct_option: usize,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        for (index, option) in options.iter().enumerate() {
            if option.trim().is_empty() {
                return Err(QuestionError::EmptyOption { index });
            }
        }
        if correct_option >= OPTION_COUNT {
            return Err(QuestionError::InvalidCorrectOption {
                index: correct_option,
            });
        }

        let explanation = explanation
            .map(|e| e.trim().to_owned())
            .filter(|e| !e.is_empty());

        Ok(Self {
            id,
            category,
            text: text.trim().to_owned(),
            options,
            correct_option,
            explanation,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
