//! Timed mock-exam sessions: sampling, state machine, countdown, workflow.

pub mod plan;
pub mod session;
pub mod ticker;
pub mod view;
pub mod workflow;

pub use plan::{sample_questions, ExamPlan};
pub use session::{ExamSession, ExamStatus, NavDirection};
pub use ticker::ExamTicker;
pub use view::ExamView;
pub use workflow::{ExamLoopService, ExamOutcome};
