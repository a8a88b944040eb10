use crate::exam::session::ExamStatus;

/// Presentation-agnostic snapshot of a running session.
///
/// This is intentionally **not** a UI view-model: no pre-formatted strings
/// and no localization assumptions. The UI formats the countdown and the
/// progress indicator as needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamView {
    pub current_position: usize,
    pub total_questions: usize,
    pub answered_count: usize,
    pub remaining_secs: u32,
    pub status: ExamStatus,
}

impl ExamView {
    /// Questions still unanswered.
    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.total_questions.saturating_sub(self.answered_count)
    }
}
