#![forbid(unsafe_code)]

pub mod account;
pub mod advisor;
pub mod error;
pub mod exam;
pub mod question_source;
pub mod recorder;
pub mod review;
pub mod statistics;

pub use prep_core::Clock;

pub use error::{
    AccountError, AdvisorError, ExamError, RecorderError, ReviewError, StatisticsReadError,
};

pub use account::AccountService;
pub use advisor::{AdvisorConfig, AdvisorService};
pub use exam::{
    ExamLoopService, ExamOutcome, ExamPlan, ExamSession, ExamStatus, ExamTicker, ExamView,
    NavDirection,
};
pub use question_source::{InMemoryQuestionSource, QuestionSource, QuestionSourceError};
pub use recorder::{AnswerRecorder, SubmitAnswer};
pub use review::{ReviewCandidate, ReviewQueue, ReviewService};
pub use statistics::StatisticsService;
