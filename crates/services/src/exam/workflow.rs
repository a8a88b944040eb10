use std::sync::Arc;

use prep_core::model::{ExamConfig, ExamResult, UserId};
use storage::repository::ExamResultRepository;

use crate::error::ExamError;
use crate::exam::plan::sample_questions;
use crate::exam::session::ExamSession;
use crate::question_source::QuestionSource;
use crate::review::ReviewService;
use crate::Clock;

/// Persisted outcome of a finished exam.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamOutcome {
    pub result: ExamResult,
    pub result_id: i64,
}

/// Orchestrates exam start and persisted scoring.
#[derive(Clone)]
pub struct ExamLoopService {
    clock: Clock,
    results: Arc<dyn ExamResultRepository>,
}

impl ExamLoopService {
    #[must_use]
    pub fn new(clock: Clock, results: Arc<dyn ExamResultRepository>) -> Self {
        Self { clock, results }
    }

    /// Samples a fresh mock exam from the question pool and starts the
    /// countdown.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::EmptyPool` when the provider has no questions, or
    /// `ExamError::Questions` when the provider cannot be reached.
    pub async fn start_exam(
        &self,
        user_id: UserId,
        source: &dyn QuestionSource,
        config: ExamConfig,
    ) -> Result<ExamSession, ExamError> {
        let pool = source.fetch_pool().await?;
        let plan = sample_questions(pool, config.question_count())?;
        let mut session = ExamSession::new(user_id, config, plan)?;
        session.begin(self.clock.now())?;
        Ok(session)
    }

    /// Starts an exam over the user's review queue: the most recent distinct
    /// mistakes, capped at `max_events` history entries.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::EmptyPool` when the user has no mistakes to
    /// revisit.
    pub async fn start_review_exam(
        &self,
        user_id: UserId,
        review: &ReviewService,
        source: &dyn QuestionSource,
        config: ExamConfig,
        max_events: u32,
    ) -> Result<ExamSession, ExamError> {
        let queue = review.due_for_review(&user_id, max_events).await?;
        if queue.is_empty() {
            return Err(ExamError::EmptyPool);
        }

        let pool = source.fetch_by_ids(&queue.question_ids()).await?;
        let plan = sample_questions(pool, config.question_count())?;
        let mut session = ExamSession::new(user_id, config, plan)?;
        session.begin(self.clock.now())?;
        Ok(session)
    }

    /// Finishes the session, scores it, and persists the result.
    ///
    /// The persistence write is retried once before the failure is surfaced;
    /// scoring itself is idempotent, so the retry never double-scores.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotStarted` for a session that never began, or
    /// `ExamError::Storage` when both append attempts fail.
    pub async fn finish_exam(&self, session: &mut ExamSession) -> Result<ExamOutcome, ExamError> {
        let result = session.finish(self.clock.now())?;
        let result_id = self.finalize_result(session).await?;
        Ok(ExamOutcome { result, result_id })
    }

    /// Persists a finished session's result, returning the existing row id if
    /// it was already stored.
    ///
    /// This is also the retry path when the final append failed on a
    /// transient storage error.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotFinished` if the session has no result yet, or
    /// `ExamError::Storage` if persistence fails.
    pub async fn finalize_result(&self, session: &mut ExamSession) -> Result<i64, ExamError> {
        if let Some(id) = session.result_id() {
            return Ok(id);
        }

        let Some(result) = session.result().cloned() else {
            return Err(ExamError::NotFinished);
        };

        let user_id = session.user_id().clone();
        let id = match self.results.append_result(&user_id, &result).await {
            Ok(id) => id,
            Err(first) => {
                log::warn!("result append failed for {user_id}, retrying once: {first}");
                self.results.append_result(&user_id, &result).await?
            }
        };
        session.set_result_id(id);
        Ok(id)
    }

    /// Lists a user's past results, most recently completed first.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Storage` on read failure.
    pub async fn list_results(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<storage::repository::ExamResultRow>, ExamError> {
        Ok(self.results.list_results(user_id, limit).await?)
    }
}
