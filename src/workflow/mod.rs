pub mod phase;
pub mod session;

pub use phase::{ExamFlow, Phase, PhaseKind};
pub use session::ExamSession;
