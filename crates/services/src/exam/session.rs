use chrono::{DateTime, Utc};

use prep_core::model::{
    Category, CategoryTally, ExamConfig, ExamResult, Question, UserId, OPTION_COUNT,
};

use crate::error::ExamError;
use crate::exam::plan::ExamPlan;
use crate::exam::view::ExamView;

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Lifecycle of an assessment session.
///
/// Transitions are one-way: `NotStarted → InProgress → Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamStatus {
    NotStarted,
    InProgress,
    Finished,
}

/// Cursor movement over the question sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Back,
    Forward,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One timed assessment attempt: a fixed question sheet, an answer sheet,
/// a countdown, and a result written exactly once.
///
/// The session is a pure state machine; wall-clock time only enters through
/// the timestamps its callers pass in, so a replayed sequence of calls
/// produces the identical result.
#[derive(Debug, Clone)]
pub struct ExamSession {
    user_id: UserId,
    config: ExamConfig,
    questions: Vec<Question>,
    answers: Vec<Option<usize>>,
    cursor: usize,
    started_at: Option<DateTime<Utc>>,
    remaining_secs: u32,
    status: ExamStatus,
    result: Option<ExamResult>,
    result_id: Option<i64>,
}

impl ExamSession {
    /// Creates a session over a sampled question sheet.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::EmptyPool` if the plan holds no questions.
    pub fn new(user_id: UserId, config: ExamConfig, plan: ExamPlan) -> Result<Self, ExamError> {
        if plan.is_empty() {
            return Err(ExamError::EmptyPool);
        }

        let answers = vec![None; plan.questions.len()];
        Ok(Self {
            user_id,
            config,
            questions: plan.questions,
            answers,
            cursor: 0,
            started_at: None,
            remaining_secs: config.time_limit_secs(),
            status: ExamStatus::NotStarted,
            result: None,
            result_id: None,
        })
    }

    /// Starts the countdown.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::AlreadyStarted` or `ExamError::AlreadyFinished`
    /// when called out of order.
    pub fn begin(&mut self, now: DateTime<Utc>) -> Result<(), ExamError> {
        match self.status {
            ExamStatus::NotStarted => {
                self.started_at = Some(now);
                self.status = ExamStatus::InProgress;
                Ok(())
            }
            ExamStatus::InProgress => Err(ExamError::AlreadyStarted),
            ExamStatus::Finished => Err(ExamError::AlreadyFinished),
        }
    }

    /// Records (or overwrites) the answer at `position` and moves the cursor
    /// there. Answers may be changed freely until the session finishes.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotStarted` or `ExamError::AlreadyFinished` outside
    /// `InProgress`, `ExamError::PositionOutOfRange` or
    /// `ExamError::InvalidOption` for bad indexes.
    pub fn select_answer(&mut self, position: usize, option: usize) -> Result<(), ExamError> {
        match self.status {
            ExamStatus::NotStarted => return Err(ExamError::NotStarted),
            ExamStatus::Finished => return Err(ExamError::AlreadyFinished),
            ExamStatus::InProgress => {}
        }
        if position >= self.questions.len() {
            return Err(ExamError::PositionOutOfRange {
                position,
                total: self.questions.len(),
            });
        }
        if option >= OPTION_COUNT {
            return Err(ExamError::InvalidOption { index: option });
        }

        self.answers[position] = Some(option);
        self.cursor = position;
        Ok(())
    }

    /// Moves the cursor one question back or forward, clamped at the sheet
    /// edges.
    pub fn navigate(&mut self, direction: NavDirection) {
        match direction {
            NavDirection::Back => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            NavDirection::Forward => {
                if self.cursor + 1 < self.questions.len() {
                    self.cursor += 1;
                }
            }
        }
    }

    /// Advances the countdown by `elapsed_secs`.
    ///
    /// When the countdown reaches zero the session finishes immediately with
    /// the answer sheet as it stands; the forced finish happens exactly once.
    /// Ticks outside `InProgress` are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ExamError` only if the forced finish fails to score.
    pub fn tick(
        &mut self,
        elapsed_secs: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<ExamResult>, ExamError> {
        if self.status != ExamStatus::InProgress {
            return Ok(None);
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(elapsed_secs);
        if self.remaining_secs == 0 {
            return self.finish(now).map(Some);
        }
        Ok(None)
    }

    /// Finishes the session and scores the answer sheet.
    ///
    /// Unanswered questions count as incorrect. Finishing is idempotent:
    /// calling it on a finished session returns the stored result unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotStarted` if the session never began.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<ExamResult, ExamError> {
        match self.status {
            ExamStatus::NotStarted => return Err(ExamError::NotStarted),
            ExamStatus::Finished => {
                if let Some(result) = &self.result {
                    return Ok(result.clone());
                }
                return Err(ExamError::NotFinished);
            }
            ExamStatus::InProgress => {}
        }

        let mut totals = [0_u32; Category::COUNT];
        let mut corrects = [0_u32; Category::COUNT];
        let mut score = 0_u32;
        for (question, answer) in self.questions.iter().zip(&self.answers) {
            let bucket = question.category().index();
            totals[bucket] += 1;
            if *answer == Some(question.correct_option()) {
                corrects[bucket] += 1;
                score += 1;
            }
        }

        let mut categories = [CategoryTally::default(); Category::COUNT];
        for index in 0..Category::COUNT {
            categories[index] = CategoryTally::from_persisted(totals[index], corrects[index])?;
        }

        // Derived from the countdown, not wall clock, so a forced finish and
        // an explicit finish at the same tick score identically.
        let time_used_secs = self
            .config
            .time_limit_secs()
            .saturating_sub(self.remaining_secs);

        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        let result = ExamResult::new(
            score,
            total,
            self.config.pass_cutoff(),
            time_used_secs,
            categories,
            now,
        )?;

        self.status = ExamStatus::Finished;
        self.result = Some(result.clone());
        Ok(result)
    }

    /// Snapshot for rendering: position, progress, countdown, status.
    #[must_use]
    pub fn view(&self) -> ExamView {
        ExamView {
            current_position: self.cursor,
            total_questions: self.questions.len(),
            answered_count: self.answers.iter().filter(|a| a.is_some()).count(),
            remaining_secs: self.remaining_secs,
            status: self.status,
        }
    }

    // Accessors
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn config(&self) -> ExamConfig {
        self.config
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.cursor]
    }

    #[must_use]
    pub fn answer(&self, position: usize) -> Option<usize> {
        self.answers.get(position).copied().flatten()
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn status(&self) -> ExamStatus {
        self.status
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status == ExamStatus::Finished
    }

    #[must_use]
    pub fn result(&self) -> Option<&ExamResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn result_id(&self) -> Option<i64> {
        self.result_id
    }

    pub fn set_result_id(&mut self, id: i64) {
        self.result_id = Some(id);
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
