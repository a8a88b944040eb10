use prep_core::model::{AnswerEvent, UserId};
use sqlx::Row;

use super::{SqliteRepository, mapping::map_event_row, mapping::ser};
use crate::repository::{AnswerEventRepository, StorageError};

#[async_trait::async_trait]
impl AnswerEventRepository for SqliteRepository {
    async fn append_event(&self, event: &AnswerEvent) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO answer_events (
                    id, user_id, category, question_id,
                    chosen_option, correct_option, is_correct,
                    time_spent_secs, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(event.id().to_string())
        .bind(event.user_id().as_str())
        .bind(event.category().as_str())
        .bind(event.question_id().as_str())
        .bind(event.chosen_option() as i64)
        .bind(event.correct_option() as i64)
        .bind(i64::from(event.is_correct()))
        .bind(i64::from(event.time_spent_secs()))
        .bind(event.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn recent_incorrect_events(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<AnswerEvent>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, user_id, category, question_id,
                    chosen_option, correct_option, time_spent_secs, created_at
                FROM answer_events
                WHERE user_id = ?1 AND is_correct = 0
                ORDER BY created_at DESC, rowid DESC
                LIMIT ?2
            ",
        )
        .bind(user_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_event_row(&row)?);
        }
        Ok(out)
    }

    async fn count_events(&self, user_id: &UserId) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM answer_events WHERE user_id = ?1")
            .bind(user_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let n: i64 = row.try_get("n").map_err(ser)?;
        super::mapping::u64_from_i64("event count", n)
    }

    async fn delete_for_user(&self, user_id: &UserId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM answer_events WHERE user_id = ?1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
