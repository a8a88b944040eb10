use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

use prep_core::model::{Category, QuestionId, UserId};
use storage::repository::AnswerEventRepository;

use crate::error::ReviewError;

/// One previously-missed question eligible for re-presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCandidate {
    pub question_id: QuestionId,
    pub category: Category,
    pub last_missed_at: DateTime<Utc>,
}

/// Deduplicated "questions to revisit" set, newest mistakes first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewQueue {
    entries: Vec<ReviewCandidate>,
    category_counts: [u32; Category::COUNT],
}

impl ReviewQueue {
    #[must_use]
    pub fn entries(&self) -> &[ReviewCandidate] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn category_count(&self, category: Category) -> u32 {
        self.category_counts[category.index()]
    }

    /// Question ids in queue order; the pool for a review exam session.
    #[must_use]
    pub fn question_ids(&self) -> Vec<QuestionId> {
        self.entries
            .iter()
            .map(|entry| entry.question_id.clone())
            .collect()
    }
}

/// Derives review candidates from incorrect-answer history.
///
/// This is deliberately "most recent distinct mistakes": no retention
/// intervals and no difficulty weighting.
#[derive(Clone)]
pub struct ReviewService {
    events: Arc<dyn AnswerEventRepository>,
}

impl ReviewService {
    #[must_use]
    pub fn new(events: Arc<dyn AnswerEventRepository>) -> Self {
        Self { events }
    }

    /// Builds the review queue from the most recent `max_events` incorrect
    /// answers, keeping only the newest occurrence of each question.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError` on storage failure.
    pub async fn due_for_review(
        &self,
        user_id: &UserId,
        max_events: u32,
    ) -> Result<ReviewQueue, ReviewError> {
        let events = self
            .events
            .recent_incorrect_events(user_id, max_events)
            .await?;

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        let mut category_counts = [0_u32; Category::COUNT];
        for event in events {
            // Events arrive newest first, so the first occurrence wins.
            if !seen.insert(event.question_id().clone()) {
                continue;
            }
            category_counts[event.category().index()] += 1;
            entries.push(ReviewCandidate {
                question_id: event.question_id().clone(),
                category: event.category(),
                last_missed_at: event.created_at(),
            });
        }

        Ok(ReviewQueue {
            entries,
            category_counts,
        })
    }
}
