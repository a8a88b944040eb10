mod category;
mod event;
mod exam;
mod ids;
mod question;
mod stats;

pub use category::{Category, CategoryError};
pub use event::{AnswerEvent, AnswerEventError};
pub use exam::{ExamConfig, ExamConfigError, ExamResult, ExamResultError};
pub use ids::{EventId, IdError, QuestionId, UserId};
pub use question::{OPTION_COUNT, Question, QuestionError};
pub use stats::{CategoryTally, StatisticsError, UserStatistics};
