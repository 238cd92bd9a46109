//! Core data structures for the symbiolab simulation.

pub mod organism;
pub mod program;
pub mod stats;
