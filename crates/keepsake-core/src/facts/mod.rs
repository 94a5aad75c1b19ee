//! Fact storage.
//!
//! [`FactStore`] keeps the fact collection in memory and writes it through a
//! [`FactPersistence`](crate::traits::FactPersistence) on every append.

mod json_file;
mod store;

pub use json_file::{JsonFilePersistence, NullPersistence};
pub use store::{FactSource, FactStore};

#[cfg(test)]
pub use store::MockFactSource;
