use chrono::NaiveDate;

/// Result of advancing the study streak by one event day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub current_streak: u32,
    pub study_days: u32,
}

/// Advances the day streak for an answer submitted on `today`.
///
/// Compares calendar dates only, never time of day:
/// - `last_study_date == today` leaves both counters unchanged, so repeat
///   answers on the same day are not double-counted;
/// - `last_study_date == today - 1` extends the streak by one day;
/// - any larger gap, a future `last_study_date`, or no prior date resets the
///   streak to 1.
///
/// This is the only place day-continuity logic lives.
#[must_use]
pub fn advance(
    prior_streak: u32,
    prior_study_days: u32,
    last_study_date: Option<NaiveDate>,
    today: NaiveDate,
) -> StreakUpdate {
    match last_study_date {
        Some(last) if last == today => StreakUpdate {
            current_streak: prior_streak,
            study_days: prior_study_days,
        },
        Some(last) if last.succ_opt() == Some(today) => StreakUpdate {
            current_streak: prior_streak.saturating_add(1),
            study_days: prior_study_days.saturating_add(1),
        },
        _ => StreakUpdate {
            current_streak: 1,
            study_days: prior_study_days.saturating_add(1),
        },
    }
}
