use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use prep_core::model::{Question, QuestionId};

/// Errors surfaced by question pool providers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionSourceError {
    #[error("question not found: {0}")]
    NotFound(QuestionId),

    #[error("content service unavailable: {0}")]
    Unavailable(String),
}

/// External content service supplying the question pool.
///
/// The engine never authors or stores questions; it only samples them into
/// sessions and joins them against answer history.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch the full question pool.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSourceError::Unavailable` if the provider cannot be
    /// reached.
    async fn fetch_pool(&self) -> Result<Vec<Question>, QuestionSourceError>;

    /// Fetch specific questions by id, preserving no particular order.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSourceError::NotFound` for the first id absent from
    /// the provider.
    async fn fetch_by_ids(&self, ids: &[QuestionId]) -> Result<Vec<Question>, QuestionSourceError>;
}

/// In-memory question source for tests and offline bundles.
#[derive(Clone, Default)]
pub struct InMemoryQuestionSource {
    questions: Vec<Question>,
    by_id: HashMap<QuestionId, usize>,
}

impl InMemoryQuestionSource {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        let by_id = questions
            .iter()
            .enumerate()
            .map(|(index, q)| (q.id().clone(), index))
            .collect();
        Self { questions, by_id }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[async_trait]
impl QuestionSource for InMemoryQuestionSource {
    async fn fetch_pool(&self) -> Result<Vec<Question>, QuestionSourceError> {
        Ok(self.questions.clone())
    }

    async fn fetch_by_ids(&self, ids: &[QuestionId]) -> Result<Vec<Question>, QuestionSourceError> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let index = self
                .by_id
                .get(id)
                .ok_or_else(|| QuestionSourceError::NotFound(id.clone()))?;
            out.push(self.questions[*index].clone());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::Category;

    fn question(id: &str) -> Question {
        Question::new(
            QuestionId::new(id).unwrap(),
            Category::Miscellaneous,
            "Q",
            ["a".into(), "b".into(), "c".into(), "d".into()],
            0,
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_by_ids_reports_missing_question() {
        let source = InMemoryQuestionSource::new(vec![question("q-1")]);
        let missing = QuestionId::new("q-2").unwrap();

        let err = source
            .fetch_by_ids(&[QuestionId::new("q-1").unwrap(), missing.clone()])
            .await
            .unwrap_err();
        assert!(matches!(err, QuestionSourceError::NotFound(id) if id == missing));
    }
}
