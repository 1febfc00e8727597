pub mod collaborators;
pub mod evaluator;
pub mod game_events;
pub mod records;
pub mod session;
pub mod target;

// Re-export main components
pub use collaborators::*;
pub use evaluator::*;
pub use game_events::*;
pub use records::*;
pub use session::*;
pub use target::*;
