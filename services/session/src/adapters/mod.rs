pub mod assistant;
pub mod clock;

pub use assistant::CannedAssistant;
pub use clock::TokioScheduler;
