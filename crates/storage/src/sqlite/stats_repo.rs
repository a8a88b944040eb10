use chrono::NaiveDate;
use prep_core::model::{AnswerEvent, UserId, UserStatistics};
use sqlx::Row;

use super::{SqliteRepository, mapping};
use crate::repository::{StatisticsRepository, StorageError};

#[async_trait::async_trait]
impl StatisticsRepository for SqliteRepository {
    async fn get_statistics(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserStatistics>, StorageError> {
        let Some(row) = sqlx::query(
            r"
                SELECT
                    total_questions, correct_answers, total_study_secs,
                    study_days, current_streak, last_study_date
                FROM user_statistics
                WHERE user_id = ?1
            ",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        else {
            return Ok(None);
        };

        let total_questions = mapping::u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(mapping::ser)?,
        )?;
        let correct_answers = mapping::u32_from_i64(
            "correct_answers",
            row.try_get::<i64, _>("correct_answers").map_err(mapping::ser)?,
        )?;
        let total_study_secs = mapping::u64_from_i64(
            "total_study_secs",
            row.try_get::<i64, _>("total_study_secs").map_err(mapping::ser)?,
        )?;
        let study_days = mapping::u32_from_i64(
            "study_days",
            row.try_get::<i64, _>("study_days").map_err(mapping::ser)?,
        )?;
        let current_streak = mapping::u32_from_i64(
            "current_streak",
            row.try_get::<i64, _>("current_streak").map_err(mapping::ser)?,
        )?;
        let last_study_date: Option<NaiveDate> =
            row.try_get("last_study_date").map_err(mapping::ser)?;

        let category_rows = sqlx::query(
            r"
                SELECT category, total, correct
                FROM user_category_stats
                WHERE user_id = ?1
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut raw = Vec::with_capacity(category_rows.len());
        for row in category_rows {
            let name: String = row.try_get("category").map_err(mapping::ser)?;
            let total: i64 = row.try_get("total").map_err(mapping::ser)?;
            let correct: i64 = row.try_get("correct").map_err(mapping::ser)?;
            raw.push((name, total, correct));
        }
        let categories = mapping::tallies_from_rows(&raw)?;

        UserStatistics::from_persisted(
            user_id.clone(),
            total_questions,
            correct_answers,
            total_study_secs,
            study_days,
            current_streak,
            last_study_date,
            categories,
        )
        .map(Some)
        .map_err(mapping::ser)
    }

    async fn apply_event(
        &self,
        event: &AnswerEvent,
        updated: &UserStatistics,
    ) -> Result<(), StorageError> {
        if event.user_id() != updated.user_id() {
            return Err(StorageError::Conflict);
        }

        let correct_delta = i64::from(event.is_correct());
        let secs_delta = i64::from(event.time_spent_secs());

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Counters accumulate with atomic increments so concurrent writers
        // from other devices cannot lose answered/correct counts. The streak
        // columns depend on date arithmetic and stay last-write-wins.
        sqlx::query(
            r"
                INSERT INTO user_statistics (
                    user_id, total_questions, correct_answers, total_study_secs,
                    study_days, current_streak, last_study_date
                )
                VALUES (?1, 1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(user_id) DO UPDATE SET
                    total_questions = total_questions + 1,
                    correct_answers = correct_answers + excluded.correct_answers,
                    total_study_secs = total_study_secs + excluded.total_study_secs,
                    study_days = excluded.study_days,
                    current_streak = excluded.current_streak,
                    last_study_date = excluded.last_study_date
            ",
        )
        .bind(updated.user_id().as_str())
        .bind(correct_delta)
        .bind(secs_delta)
        .bind(i64::from(updated.study_days()))
        .bind(i64::from(updated.current_streak()))
        .bind(updated.last_study_date())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
                INSERT INTO user_category_stats (user_id, category, total, correct)
                VALUES (?1, ?2, 1, ?3)
                ON CONFLICT(user_id, category) DO UPDATE SET
                    total = total + 1,
                    correct = correct + excluded.correct
            ",
        )
        .bind(updated.user_id().as_str())
        .bind(event.category().as_str())
        .bind(correct_delta)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn delete_for_user(&self, user_id: &UserId) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("DELETE FROM user_statistics WHERE user_id = ?1")
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("DELETE FROM user_category_stats WHERE user_id = ?1")
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
