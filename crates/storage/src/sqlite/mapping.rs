use prep_core::model::{
    AnswerEvent, Category, CategoryTally, EventId, QuestionId, UserId,
};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn u64_from_i64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn usize_from_i64(field: &'static str, v: i64) -> Result<usize, StorageError> {
    usize::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn category_from_str(s: &str) -> Result<Category, StorageError> {
    s.parse().map_err(ser)
}

/// Builds the fixed per-category tally array from `(category, total, correct)`
/// rows, defaulting untouched buckets to zero.
pub(crate) fn tallies_from_rows(
    rows: &[(String, i64, i64)],
) -> Result<[CategoryTally; Category::COUNT], StorageError> {
    let mut tallies = [CategoryTally::default(); Category::COUNT];
    for (name, total, correct) in rows {
        let category = category_from_str(name)?;
        let total = u32_from_i64("category total", *total)?;
        let correct = u32_from_i64("category correct", *correct)?;
        tallies[category.index()] = CategoryTally::from_persisted(total, correct).map_err(ser)?;
    }
    Ok(tallies)
}

pub(crate) fn map_event_row(row: &sqlx::sqlite::SqliteRow) -> Result<AnswerEvent, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let id: EventId = id.parse().map_err(ser)?;
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    let user_id = UserId::new(user_id).map_err(ser)?;
    let category: String = row.try_get("category").map_err(ser)?;
    let category = category_from_str(&category)?;
    let question_id: String = row.try_get("question_id").map_err(ser)?;
    let question_id = QuestionId::new(question_id).map_err(ser)?;
    let chosen_option =
        usize_from_i64("chosen_option", row.try_get::<i64, _>("chosen_option").map_err(ser)?)?;
    let correct_option =
        usize_from_i64("correct_option", row.try_get::<i64, _>("correct_option").map_err(ser)?)?;
    let time_spent_secs = u32_from_i64(
        "time_spent_secs",
        row.try_get::<i64, _>("time_spent_secs").map_err(ser)?,
    )?;
    let created_at = row.try_get("created_at").map_err(ser)?;

    AnswerEvent::from_persisted(
        id,
        user_id,
        category,
        question_id,
        chosen_option,
        correct_option,
        time_spent_secs,
        created_at,
    )
    .map_err(ser)
}
