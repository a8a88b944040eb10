use std::sync::Arc;

use prep_core::model::UserId;
use storage::repository::{AnswerEventRepository, ExamResultRepository, StatisticsRepository};

use crate::error::AccountError;

/// Account-level operations spanning every store.
#[derive(Clone)]
pub struct AccountService {
    events: Arc<dyn AnswerEventRepository>,
    statistics: Arc<dyn StatisticsRepository>,
    results: Arc<dyn ExamResultRepository>,
}

impl AccountService {
    #[must_use]
    pub fn new(
        events: Arc<dyn AnswerEventRepository>,
        statistics: Arc<dyn StatisticsRepository>,
        results: Arc<dyn ExamResultRepository>,
    ) -> Self {
        Self {
            events,
            statistics,
            results,
        }
    }

    /// Removes every trace of a user: answer history, statistics, results.
    ///
    /// Deleting an unknown user is a no-op, so callers may retry after a
    /// partial failure.
    ///
    /// # Errors
    ///
    /// Returns `AccountError` on storage failure; stores already cleared
    /// stay cleared.
    pub async fn delete_user_data(&self, user_id: &UserId) -> Result<(), AccountError> {
        self.events.delete_for_user(user_id).await?;
        self.statistics.delete_for_user(user_id).await?;
        self.results.delete_for_user(user_id).await?;
        log::info!("deleted all data for {user_id}");
        Ok(())
    }
}
