use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{Category, CategoryTally};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamConfigError {
    #[error("question count must be > 0")]
    InvalidQuestionCount,

    #[error("time limit must be > 0 seconds")]
    InvalidTimeLimit,

    #[error("pass cutoff {cutoff} exceeds question count {question_count}")]
    InvalidPassCutoff { cutoff: u32, question_count: u32 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamResultError {
    #[error("score ({score}) exceeds total questions ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("total questions ({total}) does not match category totals ({sum})")]
    CountMismatch { total: u32, sum: u32 },

    #[error("score ({score}) does not match category corrects ({sum})")]
    ScoreMismatch { score: u32, sum: u32 },
}

//
// ─── EXAM CONFIG ───────────────────────────────────────────────────────────────
//

/// Injected constants for a timed mock exam.
///
/// The pass cutoff mirrors the real exam's scoring and is configuration,
/// never a literal inside the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamConfig {
    question_count: u32,
    time_limit_secs: u32,
    pass_cutoff: u32,
}

impl ExamConfig {
    /// Full-length mock exam: 50 questions, 120 minutes, pass at 35.
    #[must_use]
    pub fn default_mock_exam() -> Self {
        Self {
            question_count: 50,
            time_limit_secs: 7_200,
            pass_cutoff: 35,
        }
    }

    /// Creates a custom exam configuration.
    ///
    /// # Errors
    ///
    /// Returns `ExamConfigError` if any bound is zero or the cutoff exceeds
    /// the question count.
    pub fn new(
        question_count: u32,
        time_limit_secs: u32,
        pass_cutoff: u32,
    ) -> Result<Self, ExamConfigError> {
        if question_count == 0 {
            return Err(ExamConfigError::InvalidQuestionCount);
        }
        if time_limit_secs == 0 {
            return Err(ExamConfigError::InvalidTimeLimit);
        }
        if pass_cutoff > question_count {
            return Err(ExamConfigError::InvalidPassCutoff {
                cutoff: pass_cutoff,
                question_count,
            });
        }

        Ok(Self {
            question_count,
            time_limit_secs,
            pass_cutoff,
        })
    }

    // Accessors
    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn pass_cutoff(&self) -> u32 {
        self.pass_cutoff
    }
}

//
// ─── EXAM RESULT ───────────────────────────────────────────────────────────────
//

/// Scored outcome of one finished assessment session.
///
/// Written exactly once when a session transitions to Finished.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamResult {
    score: u32,
    total_questions: u32,
    is_passed: bool,
    time_used_secs: u32,
    categories: [CategoryTally; Category::COUNT],
    completed_at: DateTime<Utc>,
}

impl ExamResult {
    /// Builds a result from a finished session's tallies.
    ///
    /// The pass flag is derived from the injected `pass_cutoff`.
    ///
    /// # Errors
    ///
    /// Returns `ExamResultError` if the score and category tallies do not
    /// align.
    pub fn new(
        score: u32,
        total_questions: u32,
        pass_cutoff: u32,
        time_used_secs: u32,
        categories: [CategoryTally; Category::COUNT],
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ExamResultError> {
        Self::from_persisted(
            score,
            total_questions,
            score >= pass_cutoff,
            time_used_secs,
            categories,
            completed_at,
        )
    }

    /// Rehydrates a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ExamResultError` if counters do not align.
    pub fn from_persisted(
        score: u32,
        total_questions: u32,
        is_passed: bool,
        time_used_secs: u32,
        categories: [CategoryTally; Category::COUNT],
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ExamResultError> {
        if score > total_questions {
            return Err(ExamResultError::ScoreExceedsTotal {
                score,
                total: total_questions,
            });
        }
        let total_sum: u32 = categories.iter().map(CategoryTally::total).sum();
        if total_sum != total_questions {
            return Err(ExamResultError::CountMismatch {
                total: total_questions,
                sum: total_sum,
            });
        }
        let correct_sum: u32 = categories.iter().map(CategoryTally::correct).sum();
        if correct_sum != score {
            return Err(ExamResultError::ScoreMismatch {
                score,
                sum: correct_sum,
            });
        }

        Ok(Self {
            score,
            total_questions,
            is_passed,
            time_used_secs,
            categories,
            completed_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    /// Score as a percentage of the total, `0.0` for an empty exam.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        f64::from(self.score) / f64::from(self.total_questions) * 100.0
    }

    #[must_use]
    pub fn is_passed(&self) -> bool {
        self.is_passed
    }

    #[must_use]
    pub fn time_used_secs(&self) -> u32 {
        self.time_used_secs
    }

    #[must_use]
    pub fn category(&self, category: Category) -> CategoryTally {
        self.categories[category.index()]
    }

    #[must_use]
    pub fn categories(&self) -> &[CategoryTally; Category::COUNT] {
        &self.categories
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
