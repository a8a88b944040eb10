use async_trait::async_trait;
use prep_core::model::{AnswerEvent, ExamResult, UserId, UserStatistics};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A persisted exam result together with its storage row id.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamResultRow {
    pub id: i64,
    pub result: ExamResult,
}

impl ExamResultRow {
    #[must_use]
    pub fn new(id: i64, result: ExamResult) -> Self {
        Self { id, result }
    }
}

/// Repository contract for the append-only answer event log.
#[async_trait]
pub trait AnswerEventRepository: Send + Sync {
    /// Append one immutable answer event.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the event cannot be stored.
    async fn append_event(&self, event: &AnswerEvent) -> Result<(), StorageError>;

    /// Fetch the most recent incorrectly-answered events for a user,
    /// newest first, limited to `limit` rows.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failure.
    async fn recent_incorrect_events(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<AnswerEvent>, StorageError>;

    /// Count all events recorded for a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failure.
    async fn count_events(&self, user_id: &UserId) -> Result<u64, StorageError>;

    /// Delete every event belonging to the user (account deletion).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on write failure.
    async fn delete_for_user(&self, user_id: &UserId) -> Result<(), StorageError>;
}

/// Repository contract for the per-user statistics aggregate.
#[async_trait]
pub trait StatisticsRepository: Send + Sync {
    /// Fetch the aggregate for a user; `None` when nothing was recorded yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failure.
    async fn get_statistics(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserStatistics>, StorageError>;

    /// Persist the effect of one answer event.
    ///
    /// Backends with concurrent writers must apply the counter fields as
    /// atomic increments derived from `event`; the streak fields
    /// (`current_streak`, `study_days`, `last_study_date`) are taken from
    /// `updated` and written last-write-wins.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on write failure.
    async fn apply_event(
        &self,
        event: &AnswerEvent,
        updated: &UserStatistics,
    ) -> Result<(), StorageError>;

    /// Delete the aggregate for the user (account deletion).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on write failure.
    async fn delete_for_user(&self, user_id: &UserId) -> Result<(), StorageError>;
}

/// Repository contract for finished exam results.
#[async_trait]
pub trait ExamResultRepository: Send + Sync {
    /// Append one result and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(
        &self,
        user_id: &UserId,
        result: &ExamResult,
    ) -> Result<i64, StorageError>;

    /// Fetch a result by row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: i64) -> Result<ExamResult, StorageError>;

    /// List a user's results, most recently completed first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failure.
    async fn list_results(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<ExamResultRow>, StorageError>;

    /// Delete every result belonging to the user (account deletion).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on write failure.
    async fn delete_for_user(&self, user_id: &UserId) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    events: Arc<Mutex<Vec<AnswerEvent>>>,
    statistics: Arc<Mutex<HashMap<UserId, UserStatistics>>>,
    results: Arc<Mutex<Vec<(UserId, ExamResultRow)>>>,
    next_result_id: Arc<AtomicI64>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnswerEventRepository for InMemoryRepository {
    async fn append_event(&self, event: &AnswerEvent) -> Result<(), StorageError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(event.clone());
        Ok(())
    }

    async fn recent_incorrect_events(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<AnswerEvent>, StorageError> {
        let guard = self
            .events
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut matching: Vec<AnswerEvent> = guard
            .iter()
            .filter(|e| e.user_id() == user_id && !e.is_correct())
            .cloned()
            .collect();
        // Insertion order breaks timestamp ties, so reversing the stable
        // sort-by-time yields newest first.
        matching.sort_by_key(AnswerEvent::created_at);
        matching.reverse();
        matching.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(matching)
    }

    async fn count_events(&self, user_id: &UserId) -> Result<u64, StorageError> {
        let guard = self
            .events
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.iter().filter(|e| e.user_id() == user_id).count() as u64)
    }

    async fn delete_for_user(&self, user_id: &UserId) -> Result<(), StorageError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.retain(|e| e.user_id() != user_id);
        Ok(())
    }
}

#[async_trait]
impl StatisticsRepository for InMemoryRepository {
    async fn get_statistics(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserStatistics>, StorageError> {
        let guard = self
            .statistics
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(user_id).cloned())
    }

    async fn apply_event(
        &self,
        _event: &AnswerEvent,
        updated: &UserStatistics,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .statistics
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(updated.user_id().clone(), updated.clone());
        Ok(())
    }

    async fn delete_for_user(&self, user_id: &UserId) -> Result<(), StorageError> {
        let mut guard = self
            .statistics
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(user_id);
        Ok(())
    }
}

#[async_trait]
impl ExamResultRepository for InMemoryRepository {
    async fn append_result(
        &self,
        user_id: &UserId,
        result: &ExamResult,
    ) -> Result<i64, StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        // Monotonic counter: ids must stay unique even after rows for a
        // deleted user are gone.
        let id = self.next_result_id.fetch_add(1, Ordering::Relaxed) + 1;
        guard.push((user_id.clone(), ExamResultRow::new(id, result.clone())));
        Ok(id)
    }

    async fn get_result(&self, id: i64) -> Result<ExamResult, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|(_, row)| row.id == id)
            .map(|(_, row)| row.result.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_results(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<ExamResultRow>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<ExamResultRow> = guard
            .iter()
            .filter(|(owner, _)| owner == user_id)
            .map(|(_, row)| row.clone())
            .collect();
        rows.sort_by_key(|row| (row.result.completed_at(), row.id));
        rows.reverse();
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn delete_for_user(&self, user_id: &UserId) -> Result<(), StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.retain(|(owner, _)| owner != user_id);
        Ok(())
    }
}

/// Aggregates the engine's repositories behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub events: Arc<dyn AnswerEventRepository>,
    pub statistics: Arc<dyn StatisticsRepository>,
    pub results: Arc<dyn ExamResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let events: Arc<dyn AnswerEventRepository> = Arc::new(repo.clone());
        let statistics: Arc<dyn StatisticsRepository> = Arc::new(repo.clone());
        let results: Arc<dyn ExamResultRepository> = Arc::new(repo);
        Self {
            events,
            statistics,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use prep_core::model::{AnswerEvent, Category, CategoryTally, QuestionId, UserId};
    use prep_core::time::fixed_now;

    fn user() -> UserId {
        UserId::new("u-1").unwrap()
    }

    fn passed_result() -> ExamResult {
        let mut categories = [CategoryTally::default(); Category::COUNT];
        categories[Category::Miscellaneous.index()] = CategoryTally::from_persisted(1, 1).unwrap();
        ExamResult::new(1, 1, 1, 10, categories, fixed_now()).unwrap()
    }

    fn miss(question: &str, minutes_ago: i64) -> AnswerEvent {
        AnswerEvent::record(
            user(),
            Category::BusinessLaw,
            QuestionId::new(question).unwrap(),
            0,
            1,
            30,
            fixed_now() - Duration::minutes(minutes_ago),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn recent_incorrect_events_are_newest_first() {
        let repo = InMemoryRepository::new();
        repo.append_event(&miss("q-old", 30)).await.unwrap();
        repo.append_event(&miss("q-new", 1)).await.unwrap();

        let hit = AnswerEvent::record(
            user(),
            Category::BusinessLaw,
            QuestionId::new("q-hit").unwrap(),
            1,
            1,
            30,
            fixed_now(),
        )
        .unwrap();
        repo.append_event(&hit).await.unwrap();

        let events = repo.recent_incorrect_events(&user(), 10).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].question_id().as_str(), "q-new");
        assert_eq!(events[1].question_id().as_str(), "q-old");
    }

    #[tokio::test]
    async fn statistics_roundtrip_and_delete() {
        let repo = InMemoryRepository::new();
        let event = miss("q-1", 0);
        let updated = prep_core::model::UserStatistics::apply(None, &event);

        assert!(repo.get_statistics(&user()).await.unwrap().is_none());
        repo.apply_event(&event, &updated).await.unwrap();
        let fetched = repo.get_statistics(&user()).await.unwrap().unwrap();
        assert_eq!(fetched.total_questions(), 1);

        StatisticsRepository::delete_for_user(&repo, &user())
            .await
            .unwrap();
        assert!(repo.get_statistics(&user()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn result_ids_stay_unique_after_account_deletion() {
        let repo = InMemoryRepository::new();
        let first_owner = UserId::new("u-a").unwrap();
        let second_owner = UserId::new("u-b").unwrap();
        let late_owner = UserId::new("u-c").unwrap();

        repo.append_result(&first_owner, &passed_result())
            .await
            .unwrap();
        let kept = repo.append_result(&second_owner, &passed_result())
            .await
            .unwrap();

        ExamResultRepository::delete_for_user(&repo, &first_owner)
            .await
            .unwrap();

        let fresh = repo.append_result(&late_owner, &passed_result())
            .await
            .unwrap();
        assert_ne!(fresh, kept);

        let rows = repo.list_results(&late_owner, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, fresh);
    }
}
