use chrono::NaiveDate;
use thiserror::Error;

use crate::model::{AnswerEvent, Category, UserId};
use crate::streak;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StatisticsError {
    #[error("correct count ({correct}) exceeds total ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("total questions ({total}) does not match category totals ({sum})")]
    CountMismatch { total: u32, sum: u32 },

    #[error("correct answers ({correct}) do not match category corrects ({sum})")]
    CorrectMismatch { correct: u32, sum: u32 },
}

//
// ─── CATEGORY TALLY ────────────────────────────────────────────────────────────
//

/// Total/correct counters for one category bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryTally {
    total: u32,
    correct: u32,
}

impl CategoryTally {
    /// Rehydrates a tally from persisted counters.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsError::CorrectExceedsTotal` if counters are
    /// inconsistent.
    pub fn from_persisted(total: u32, correct: u32) -> Result<Self, StatisticsError> {
        if correct > total {
            return Err(StatisticsError::CorrectExceedsTotal { correct, total });
        }
        Ok(Self { total, correct })
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub(crate) fn record(&mut self, is_correct: bool) {
        self.total = self.total.saturating_add(1);
        if is_correct {
            self.correct = self.correct.saturating_add(1);
        }
    }
}

//
// ─── USER STATISTICS ───────────────────────────────────────────────────────────
//

/// Cumulative study statistics for one learner.
///
/// One aggregate per user, created lazily on the first answer: a missing row
/// and a zero row are equivalent, so read sites never special-case absence.
/// Mutation happens only through the pure reducer [`UserStatistics::apply`];
/// persistence is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStatistics {
    user_id: UserId,
    total_questions: u32,
    correct_answers: u32,
    total_study_secs: u64,
    study_days: u32,
    current_streak: u32,
    last_study_date: Option<NaiveDate>,
    categories: [CategoryTally; Category::COUNT],
}

impl UserStatistics {
    /// The zero aggregate for a user with no recorded answers.
    #[must_use]
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            total_questions: 0,
            correct_answers: 0,
            total_study_secs: 0,
            study_days: 0,
            current_streak: 0,
            last_study_date: None,
            categories: [CategoryTally::default(); Category::COUNT],
        }
    }

    /// Rehydrates statistics from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsError` if the top-level counters do not match the
    /// per-category sums.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        user_id: UserId,
        total_questions: u32,
        correct_answers: u32,
        total_study_secs: u64,
        study_days: u32,
        current_streak: u32,
        last_study_date: Option<NaiveDate>,
        categories: [CategoryTally; Category::COUNT],
    ) -> Result<Self, StatisticsError> {
        if correct_answers > total_questions {
            return Err(StatisticsError::CorrectExceedsTotal {
                correct: correct_answers,
                total: total_questions,
            });
        }
        let total_sum: u32 = categories.iter().map(CategoryTally::total).sum();
        if total_sum != total_questions {
            return Err(StatisticsError::CountMismatch {
                total: total_questions,
                sum: total_sum,
            });
        }
        let correct_sum: u32 = categories.iter().map(CategoryTally::correct).sum();
        if correct_sum != correct_answers {
            return Err(StatisticsError::CorrectMismatch {
                correct: correct_answers,
                sum: correct_sum,
            });
        }

        Ok(Self {
            user_id,
            total_questions,
            correct_answers,
            total_study_secs,
            study_days,
            current_streak,
            last_study_date,
            categories,
        })
    }

    /// Pure reducer: folds one answer event into the aggregate.
    ///
    /// A missing prior aggregate is treated as the zero row, so this is the
    /// single place "default to zero" lives. The study day comes from the
    /// event's own timestamp, which keeps replay deterministic.
    #[must_use]
    pub fn apply(prior: Option<&Self>, event: &AnswerEvent) -> Self {
        let mut next = match prior {
            Some(stats) => stats.clone(),
            None => Self::empty(event.user_id().clone()),
        };

        next.total_questions = next.total_questions.saturating_add(1);
        if event.is_correct() {
            next.correct_answers = next.correct_answers.saturating_add(1);
        }
        next.total_study_secs = next
            .total_study_secs
            .saturating_add(u64::from(event.time_spent_secs()));
        next.categories[event.category().index()].record(event.is_correct());

        let today = event.study_date();
        let update = streak::advance(
            next.current_streak,
            next.study_days,
            next.last_study_date,
            today,
        );
        next.current_streak = update.current_streak;
        next.study_days = update.study_days;
        next.last_study_date = Some(today);

        next
    }

    // Accessors
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn total_study_secs(&self) -> u64 {
        self.total_study_secs
    }

    #[must_use]
    pub fn study_days(&self) -> u32 {
        self.study_days
    }

    #[must_use]
    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    #[must_use]
    pub fn last_study_date(&self) -> Option<NaiveDate> {
        self.last_study_date
    }

    #[must_use]
    pub fn category(&self, category: Category) -> CategoryTally {
        self.categories[category.index()]
    }

    #[must_use]
    pub fn categories(&self) -> &[CategoryTally; Category::COUNT] {
        &self.categories
    }

    /// Fraction of answers that were correct, in `[0, 1]`.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        f64::from(self.correct_answers) / f64::from(self.total_questions)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionId;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn user() -> UserId {
        UserId::new("u-1").unwrap()
    }

    fn event_at(correct: bool, category: Category, at: chrono::DateTime<chrono::Utc>) -> AnswerEvent {
        let chosen = if correct { 1 } else { 0 };
        AnswerEvent::record(
            user(),
            category,
            QuestionId::new("q-1").unwrap(),
            chosen,
            1,
            60,
            at,
        )
        .unwrap()
    }

    #[test]
    fn first_event_initializes_from_zero_row() {
        let event = event_at(true, Category::PropertyRights, fixed_now());
        let stats = UserStatistics::apply(None, &event);

        assert_eq!(stats.total_questions(), 1);
        assert_eq!(stats.correct_answers(), 1);
        assert_eq!(stats.total_study_secs(), 60);
        assert_eq!(stats.study_days(), 1);
        assert_eq!(stats.current_streak(), 1);
        assert_eq!(stats.last_study_date(), Some(fixed_now().date_naive()));
        assert_eq!(stats.category(Category::PropertyRights).total(), 1);
    }

    #[test]
    fn totals_track_event_count_and_correct_count() {
        let mut stats: Option<UserStatistics> = None;
        for i in 0..5 {
            let event = event_at(i < 3, Category::BusinessLaw, fixed_now());
            stats = Some(UserStatistics::apply(stats.as_ref(), &event));
        }
        let stats = stats.unwrap();

        assert_eq!(stats.total_questions(), 5);
        assert_eq!(stats.correct_answers(), 3);
        let tally = stats.category(Category::BusinessLaw);
        assert_eq!(tally.total(), 5);
        assert_eq!(tally.correct(), 3);
        assert!((stats.accuracy() - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn streak_follows_event_dates() {
        let day0 = fixed_now();
        let e1 = event_at(true, Category::Miscellaneous, day0);
        let stats = UserStatistics::apply(None, &e1);
        assert_eq!(stats.current_streak(), 1);

        // Same day: unchanged.
        let e2 = event_at(false, Category::Miscellaneous, day0);
        let stats = UserStatistics::apply(Some(&stats), &e2);
        assert_eq!(stats.current_streak(), 1);
        assert_eq!(stats.study_days(), 1);

        // Next day: extended.
        let e3 = event_at(true, Category::Miscellaneous, day0 + Duration::days(1));
        let stats = UserStatistics::apply(Some(&stats), &e3);
        assert_eq!(stats.current_streak(), 2);
        assert_eq!(stats.study_days(), 2);

        // Three-day gap: reset.
        let e4 = event_at(true, Category::Miscellaneous, day0 + Duration::days(4));
        let stats = UserStatistics::apply(Some(&stats), &e4);
        assert_eq!(stats.current_streak(), 1);
        assert_eq!(stats.study_days(), 3);
    }

    #[test]
    fn reducer_is_deterministic_under_replay() {
        let events: Vec<_> = (0..4)
            .map(|i| {
                event_at(
                    i % 2 == 0,
                    Category::ALL[i % Category::COUNT],
                    fixed_now() + Duration::days(i as i64),
                )
            })
            .collect();

        let fold = |events: &[AnswerEvent]| {
            events.iter().fold(None::<UserStatistics>, |acc, e| {
                Some(UserStatistics::apply(acc.as_ref(), e))
            })
        };

        assert_eq!(fold(&events), fold(&events));
    }

    #[test]
    fn from_persisted_rejects_mismatched_totals() {
        let mut categories = [CategoryTally::default(); Category::COUNT];
        categories[0] = CategoryTally::from_persisted(3, 2).unwrap();

        let err = UserStatistics::from_persisted(user(), 5, 2, 0, 1, 1, None, categories)
            .unwrap_err();
        assert_eq!(err, StatisticsError::CountMismatch { total: 5, sum: 3 });
    }

    #[test]
    fn tally_rejects_correct_above_total() {
        let err = CategoryTally::from_persisted(1, 2).unwrap_err();
        assert_eq!(
            err,
            StatisticsError::CorrectExceedsTotal {
                correct: 2,
                total: 1
            }
        );
    }
}
