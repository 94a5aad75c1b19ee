//! Core types for keepsake.

mod fact;
mod mood;
mod turn;

pub use fact::*;
pub use mood::*;
pub use turn::*;
