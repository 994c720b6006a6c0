//! Core data models.

mod ids;
mod item;
mod stats;
mod validation;

pub use ids::*;
pub use item::*;
pub use stats::*;
pub use validation::*;
