//! Collaborator contracts consumed by the conversation core.

mod classifier;
mod filter;
mod persistence;
mod renderer;
mod suggestion;

pub use classifier::*;
pub use filter::*;
pub use persistence::*;
pub use renderer::*;
pub use suggestion::*;
