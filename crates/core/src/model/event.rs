use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::question::OPTION_COUNT;
use crate::model::{Category, EventId, QuestionId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerEventError {
    #[error("chosen option index {index} out of range 0..{}", OPTION_COUNT)]
    InvalidChosenOption { index: usize },

    #[error("correct option index {index} out of range 0..{}", OPTION_COUNT)]
    InvalidCorrectOption { index: usize },
}

//
// ─── ANSWER EVENT ──────────────────────────────────────────────────────────────
//

/// Immutable record of one learner answering one question.
///
/// Events are append-only: created once per submitted answer, never mutated
/// or deleted except as part of whole-account deletion. The correctness flag
/// is derived from the option indexes at construction and re-derived on
/// rehydration so a stored flag can never drift from the indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerEvent {
    id: EventId,
    user_id: UserId,
    category: Category,
    question_id: QuestionId,
    chosen_option: usize,
    correct_option: usize,
    is_correct: bool,
    time_spent_secs: u32,
    created_at: DateTime<Utc>,
}

impl AnswerEvent {
    /// Records a new answer event with a freshly generated id.
    ///
    /// `created_at` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `AnswerEventError` if either option index is out of range.
    pub fn record(
        user_id: UserId,
        category: Category,
        question_id: QuestionId,
        chosen_option: usize,
        correct_option: usize,
        time_spent_secs: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, AnswerEventError> {
        Self::from_persisted(
            EventId::generate(),
            user_id,
            category,
            question_id,
            chosen_option,
            correct_option,
            time_spent_secs,
            created_at,
        )
    }

    /// Rehydrates an event from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `AnswerEventError` if either option index is out of range.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: EventId,
        user_id: UserId,
        category: Category,
        question_id: QuestionId,
        chosen_option: usize,
        correct_option: usize,
        time_spent_secs: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, AnswerEventError> {
        if chosen_option >= OPTION_COUNT {
            return Err(AnswerEventError::InvalidChosenOption {
                index: chosen_option,
            });
        }
        if correct_option >= OPTION_COUNT {
            return Err(AnswerEventError::InvalidCorrectOption {
                index: correct_option,
            });
        }

        Ok(Self {
            id,
            user_id,
            category,
            question_id,
            chosen_option,
            correct_option,
            is_correct: chosen_option == correct_option,
            time_spent_secs,
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> EventId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    #[must_use]
    pub fn chosen_option(&self) -> usize {
        self.chosen_option
    }

    #[must_use]
    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u32 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Calendar date (UTC) this answer was submitted on.
    #[must_use]
    pub fn study_date(&self) -> chrono::NaiveDate {
        self.created_at.date_naive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn user() -> UserId {
        UserId::new("u-1").unwrap()
    }

    fn question() -> QuestionId {
        QuestionId::new("q-1").unwrap()
    }

    #[test]
    fn record_derives_correctness() {
        let hit = AnswerEvent::record(
            user(),
            Category::PropertyRights,
            question(),
            2,
            2,
            30,
            fixed_now(),
        )
        .unwrap();
        assert!(hit.is_correct());

        let miss = AnswerEvent::record(
            user(),
            Category::PropertyRights,
            question(),
            1,
            2,
            30,
            fixed_now(),
        )
        .unwrap();
        assert!(!miss.is_correct());
    }

    #[test]
    fn record_rejects_out_of_range_options() {
        let err = AnswerEvent::record(
            user(),
            Category::BusinessLaw,
            question(),
            4,
            0,
            10,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, AnswerEventError::InvalidChosenOption { index: 4 });

        let err = AnswerEvent::record(
            user(),
            Category::BusinessLaw,
            question(),
            0,
            9,
            10,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, AnswerEventError::InvalidCorrectOption { index: 9 });
    }

    #[test]
    fn rehydration_rederives_correctness_from_indexes() {
        let event = AnswerEvent::from_persisted(
            EventId::generate(),
            user(),
            Category::Miscellaneous,
            question(),
            3,
            3,
            5,
            fixed_now(),
        )
        .unwrap();
        assert!(event.is_correct());
        assert_eq!(event.study_date(), fixed_now().date_naive());
    }
}
