//! Combat components

pub mod death;
pub mod knockback;
pub mod melee;
pub mod ranged;


// Re-export all components
pub use death::*;
pub use knockback::*;
pub use melee::*;
pub use ranged::*;
