//! High-level operations.
//!
//! This module contains the implementation of wheelgen commands.

pub mod generate;
pub mod prune;

pub use generate::{generate, Collaborators, GenerateOptions, GenerateReport};
pub use prune::prune_unused_wheels;
