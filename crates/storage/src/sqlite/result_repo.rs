use prep_core::model::{Category, ExamResult, UserId};
use sqlx::Row;

use super::{SqliteRepository, mapping};
use crate::repository::{ExamResultRepository, ExamResultRow, StorageError};

async fn load_result_categories(
    pool: &sqlx::SqlitePool,
    result_id: i64,
) -> Result<[prep_core::model::CategoryTally; Category::COUNT], StorageError> {
    let rows = sqlx::query(
        r"
            SELECT category, total, correct
            FROM exam_result_categories
            WHERE result_id = ?1
        ",
    )
    .bind(result_id)
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Connection(e.to_string()))?;

    let mut raw = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.try_get("category").map_err(mapping::ser)?;
        let total: i64 = row.try_get("total").map_err(mapping::ser)?;
        let correct: i64 = row.try_get("correct").map_err(mapping::ser)?;
        raw.push((name, total, correct));
    }
    mapping::tallies_from_rows(&raw)
}

fn map_result_row(
    row: &sqlx::sqlite::SqliteRow,
    categories: [prep_core::model::CategoryTally; Category::COUNT],
) -> Result<ExamResult, StorageError> {
    let score = mapping::u32_from_i64("score", row.try_get::<i64, _>("score").map_err(mapping::ser)?)?;
    let total_questions = mapping::u32_from_i64(
        "total_questions",
        row.try_get::<i64, _>("total_questions").map_err(mapping::ser)?,
    )?;
    let is_passed: i64 = row.try_get("is_passed").map_err(mapping::ser)?;
    let time_used_secs = mapping::u32_from_i64(
        "time_used_secs",
        row.try_get::<i64, _>("time_used_secs").map_err(mapping::ser)?,
    )?;
    let completed_at = row.try_get("completed_at").map_err(mapping::ser)?;

    ExamResult::from_persisted(
        score,
        total_questions,
        is_passed != 0,
        time_used_secs,
        categories,
        completed_at,
    )
    .map_err(mapping::ser)
}

#[async_trait::async_trait]
impl ExamResultRepository for SqliteRepository {
    async fn append_result(
        &self,
        user_id: &UserId,
        result: &ExamResult,
    ) -> Result<i64, StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let res = sqlx::query(
            r"
                INSERT INTO exam_results (
                    user_id, score, total_questions, is_passed,
                    time_used_secs, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(user_id.as_str())
        .bind(i64::from(result.score()))
        .bind(i64::from(result.total_questions()))
        .bind(i64::from(result.is_passed()))
        .bind(i64::from(result.time_used_secs()))
        .bind(result.completed_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let result_id = res.last_insert_rowid();

        for category in Category::ALL {
            let tally = result.category(category);
            sqlx::query(
                r"
                    INSERT INTO exam_result_categories (result_id, category, total, correct)
                    VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(result_id)
            .bind(category.as_str())
            .bind(i64::from(tally.total()))
            .bind(i64::from(tally.correct()))
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(result_id)
    }

    async fn get_result(&self, id: i64) -> Result<ExamResult, StorageError> {
        let row = sqlx::query(
            r"
                SELECT score, total_questions, is_passed, time_used_secs, completed_at
                FROM exam_results
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        let categories = load_result_categories(&self.pool, id).await?;
        map_result_row(&row, categories)
    }

    async fn list_results(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<ExamResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, score, total_questions, is_passed, time_used_secs, completed_at
                FROM exam_results
                WHERE user_id = ?1
                ORDER BY completed_at DESC, id DESC
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
            let id: i64 = row.try_get("id").map_err(mapping::ser)?;
            let categories = load_result_categories(&self.pool, id).await?;
            out.push(ExamResultRow::new(id, map_result_row(&row, categories)?));
        }
        Ok(out)
    }

    async fn delete_for_user(&self, user_id: &UserId) -> Result<(), StorageError> {
        // exam_result_categories rows go with them via ON DELETE CASCADE.
        sqlx::query("DELETE FROM exam_results WHERE user_id = ?1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
