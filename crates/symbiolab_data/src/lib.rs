//! Plain data shared across the symbiolab workspace.
//!
//! Nothing in here executes programs or owns simulation state; these are the
//! records the engine passes around.

pub mod data;

pub use data::organism::{OrgKind, WorldPosition};
pub use data::program::{
    Instruction, OpCode, Program, Tag, NUM_REGISTERS, PROGRAM_LENGTH, START_TAG,
};
pub use data::stats::Checkpoint;
