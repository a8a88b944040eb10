use std::sync::Arc;

use prep_core::Clock;
use prep_core::model::{AnswerEvent, Category, EventId, QuestionId, UserId, UserStatistics};
use storage::repository::{AnswerEventRepository, StatisticsRepository};

use crate::error::RecorderError;

/// Raw answer submission as it arrives from the UI boundary.
///
/// Strings and signed integers are validated here, before anything touches
/// the domain model: unknown categories, empty ids, and negative durations
/// are rejected instead of being coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitAnswer {
    pub user_id: String,
    pub category: String,
    pub question_id: String,
    pub chosen_option: usize,
    pub correct_option: usize,
    pub time_spent_secs: i64,
}

/// Records answer events and folds them into the user's statistics.
#[derive(Clone)]
pub struct AnswerRecorder {
    clock: Clock,
    events: Arc<dyn AnswerEventRepository>,
    statistics: Arc<dyn StatisticsRepository>,
}

impl AnswerRecorder {
    #[must_use]
    pub fn new(
        clock: Clock,
        events: Arc<dyn AnswerEventRepository>,
        statistics: Arc<dyn StatisticsRepository>,
    ) -> Self {
        Self {
            clock,
            events,
            statistics,
        }
    }

    /// Validates and records one answer, then updates the aggregate.
    ///
    /// The event append and the statistics update are two writes without a
    /// surrounding transaction; events are the source of truth, so a failed
    /// statistics write leaves the log intact. The statistics write is
    /// retried once before the failure is surfaced.
    ///
    /// # Errors
    ///
    /// Returns `RecorderError` for invalid input or on storage failure.
    pub async fn submit_answer(
        &self,
        submission: SubmitAnswer,
    ) -> Result<EventId, RecorderError> {
        let user_id = UserId::new(submission.user_id)?;
        let category: Category = submission.category.parse()?;
        let question_id = QuestionId::new(submission.question_id)?;
        let time_spent_secs = u32::try_from(submission.time_spent_secs)
            .map_err(|_| RecorderError::TimeSpentOutOfRange(submission.time_spent_secs))?;

        let event = AnswerEvent::record(
            user_id,
            category,
            question_id,
            submission.chosen_option,
            submission.correct_option,
            time_spent_secs,
            self.clock.now(),
        )?;

        self.events.append_event(&event).await?;

        let prior = self.statistics.get_statistics(event.user_id()).await?;
        let updated = UserStatistics::apply(prior.as_ref(), &event);

        if let Err(first) = self.statistics.apply_event(&event, &updated).await {
            log::warn!(
                "statistics update failed for {}, retrying once: {first}",
                event.user_id()
            );
            self.statistics.apply_event(&event, &updated).await?;
        }

        Ok(event.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use prep_core::model::{CategoryError, IdError};
    use prep_core::time::fixed_clock;
    use std::sync::atomic::{AtomicU32, Ordering};
    use storage::repository::{InMemoryRepository, StorageError};

    /// Statistics store that rejects the next `failures_left` writes.
    struct FlakyStatistics {
        inner: InMemoryRepository,
        failures_left: AtomicU32,
    }

    impl FlakyStatistics {
        fn new(inner: InMemoryRepository, failures: u32) -> Self {
            Self {
                inner,
                failures_left: AtomicU32::new(failures),
            }
        }
    }

    #[async_trait]
    impl StatisticsRepository for FlakyStatistics {
        async fn get_statistics(
            &self,
            user_id: &UserId,
        ) -> Result<Option<UserStatistics>, StorageError> {
            self.inner.get_statistics(user_id).await
        }

        async fn apply_event(
            &self,
            event: &AnswerEvent,
            updated: &UserStatistics,
        ) -> Result<(), StorageError> {
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(StorageError::Connection("transient write failure".into()));
            }
            self.inner.apply_event(event, updated).await
        }

        async fn delete_for_user(&self, user_id: &UserId) -> Result<(), StorageError> {
            StatisticsRepository::delete_for_user(&self.inner, user_id).await
        }
    }

    fn recorder(repo: &InMemoryRepository) -> AnswerRecorder {
        AnswerRecorder::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    fn submission() -> SubmitAnswer {
        SubmitAnswer {
            user_id: "u-1".into(),
            category: "business-law".into(),
            question_id: "q-1".into(),
            chosen_option: 1,
            correct_option: 1,
            time_spent_secs: 42,
        }
    }

    #[tokio::test]
    async fn submit_answer_records_event_and_updates_statistics() {
        let repo = InMemoryRepository::new();
        let recorder = recorder(&repo);

        recorder.submit_answer(submission()).await.unwrap();

        let user = UserId::new("u-1").unwrap();
        assert_eq!(repo.count_events(&user).await.unwrap(), 1);
        let stats = repo.get_statistics(&user).await.unwrap().unwrap();
        assert_eq!(stats.total_questions(), 1);
        assert_eq!(stats.correct_answers(), 1);
        assert_eq!(stats.total_study_secs(), 42);
        assert_eq!(stats.current_streak(), 1);
    }

    #[tokio::test]
    async fn submit_answer_rejects_unknown_category() {
        let repo = InMemoryRepository::new();
        let recorder = recorder(&repo);

        let mut bad = submission();
        bad.category = "alchemy".into();
        let err = recorder.submit_answer(bad).await.unwrap_err();
        assert!(matches!(
            err,
            RecorderError::Category(CategoryError::Unknown(_))
        ));

        // The rejected submission must leave no trace.
        let user = UserId::new("u-1").unwrap();
        assert_eq!(repo.count_events(&user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn submit_answer_rejects_empty_question_id() {
        let repo = InMemoryRepository::new();
        let recorder = recorder(&repo);

        let mut bad = submission();
        bad.question_id = "   ".into();
        let err = recorder.submit_answer(bad).await.unwrap_err();
        assert!(matches!(err, RecorderError::Id(IdError::Empty(_))));
    }

    #[tokio::test]
    async fn submit_answer_rejects_negative_time() {
        let repo = InMemoryRepository::new();
        let recorder = recorder(&repo);

        let mut bad = submission();
        bad.time_spent_secs = -5;
        let err = recorder.submit_answer(bad).await.unwrap_err();
        assert!(matches!(err, RecorderError::TimeSpentOutOfRange(-5)));
    }

    #[tokio::test]
    async fn statistics_write_recovers_after_one_transient_failure() {
        let repo = InMemoryRepository::new();
        let flaky = Arc::new(FlakyStatistics::new(repo.clone(), 1));
        let recorder = AnswerRecorder::new(fixed_clock(), Arc::new(repo.clone()), flaky);

        recorder.submit_answer(submission()).await.unwrap();

        let user = UserId::new("u-1").unwrap();
        let stats = repo.get_statistics(&user).await.unwrap().unwrap();
        assert_eq!(stats.total_questions(), 1);
    }

    #[tokio::test]
    async fn statistics_failure_surfaces_when_the_retry_also_fails() {
        let repo = InMemoryRepository::new();
        let flaky = Arc::new(FlakyStatistics::new(repo.clone(), 2));
        let recorder = AnswerRecorder::new(fixed_clock(), Arc::new(repo.clone()), flaky);

        let err = recorder.submit_answer(submission()).await.unwrap_err();
        assert!(matches!(err, RecorderError::Storage(_)));

        // Events are the source of truth; the appended event survives.
        let user = UserId::new("u-1").unwrap();
        assert_eq!(repo.count_events(&user).await.unwrap(), 1);
        assert!(repo.get_statistics(&user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn events_fold_in_submission_order() {
        let repo = InMemoryRepository::new();
        let recorder = recorder(&repo);

        for i in 0..3 {
            let mut s = submission();
            s.question_id = format!("q-{i}");
            s.chosen_option = if i == 2 { 0 } else { 1 };
            recorder.submit_answer(s).await.unwrap();
        }

        let user = UserId::new("u-1").unwrap();
        let stats = repo.get_statistics(&user).await.unwrap().unwrap();
        assert_eq!(stats.total_questions(), 3);
        assert_eq!(stats.correct_answers(), 2);
        let tally = stats.category(Category::BusinessLaw);
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.correct(), 2);
    }
}
