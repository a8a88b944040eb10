use std::sync::Arc;

use prep_core::model::{UserId, UserStatistics};
use storage::repository::StatisticsRepository;

use crate::error::StatisticsReadError;

/// Read-side access to the per-user aggregate for dashboards.
#[derive(Clone)]
pub struct StatisticsService {
    statistics: Arc<dyn StatisticsRepository>,
}

impl StatisticsService {
    #[must_use]
    pub fn new(statistics: Arc<dyn StatisticsRepository>) -> Self {
        Self { statistics }
    }

    /// Fetch a user's statistics.
    ///
    /// A user with no recorded answers reads as the zero aggregate, so
    /// callers never need to handle absence.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsReadError` on storage failure.
    pub async fn get_statistics(
        &self,
        user_id: &UserId,
    ) -> Result<UserStatistics, StatisticsReadError> {
        let stats = self.statistics.get_statistics(user_id).await?;
        Ok(stats.unwrap_or_else(|| UserStatistics::empty(user_id.clone())))
    }
}
