//! Sequence operations: strand arithmetic and the edit engine.

pub mod edit;
pub mod strand;

pub use edit::{complement, delete, embed, insert, reverse, rotate};
