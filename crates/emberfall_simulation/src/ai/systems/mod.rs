//! AI systems (decision layer logic)

pub mod fsm;
pub mod movement;
pub mod targeting;

// Re-export all systems
pub use fsm::*;
pub use movement::*;
pub use targeting::*;
