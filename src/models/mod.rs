pub mod answer;
pub mod exam;
pub mod repo;

pub use answer::{AnswerValue, UserAnswer};
pub use exam::{CorrectAnswer, Exam, Question, QuestionType};
pub use repo::{parse_repo_url, Document, RepoFileRef, RepoRef};
