use rand::rng;
use rand::seq::SliceRandom;

use prep_core::model::Question;

use crate::error::ExamError;

/// Selection result for an exam build: the sampled question sheet in
/// presentation order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamPlan {
    pub questions: Vec<Question>,
}

impl ExamPlan {
    /// Number of questions on the sheet.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Samples `size` distinct questions from the pool, uniformly and without
/// replacement. A pool smaller than `size` yields the whole pool shuffled.
///
/// # Errors
///
/// Returns `ExamError::EmptyPool` when there is nothing to sample from.
pub fn sample_questions(pool: Vec<Question>, size: u32) -> Result<ExamPlan, ExamError> {
    if pool.is_empty() {
        return Err(ExamError::EmptyPool);
    }

    let mut questions = pool;
    let mut rng = rng();
    questions.as_mut_slice().shuffle(&mut rng);
    questions.truncate(usize::try_from(size).unwrap_or(usize::MAX));

    Ok(ExamPlan { questions })
}
