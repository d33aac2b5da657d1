pub mod document_service;
pub mod exam_service;
pub mod grading_service;

pub use document_service::DocumentService;
pub use exam_service::ExamService;
pub use grading_service::{GradingService, ScoreReport};
