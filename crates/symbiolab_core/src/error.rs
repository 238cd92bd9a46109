//! Error types for recoverable construction failures.
//!
//! Broken invariants inside a tick are assertions, and running out of
//! points or dependency credits is an ordinary outcome enum. What lands here
//! is the set of mistakes a caller can make when assembling a world.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SimError {
    /// A task definition names a function that is not in the library
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// Two task definitions share a name
    #[error("Duplicate task: {0}")]
    DuplicateTask(String),

    /// A dependency names a task that is not defined
    #[error("Task {task} depends on undefined task {dependency}")]
    UnknownDependency { task: String, dependency: String },

    /// The dependency graph loops back on itself
    #[error("Task dependencies form a cycle through {0}")]
    DependencyCycle(String),

    /// More tasks than a task bitset can hold
    #[error("Too many tasks: {count} (max {max})")]
    TooManyTasks { count: usize, max: usize },

    /// Population slot outside the world
    #[error("Slot {slot} outside population of {size}")]
    SlotOutOfRange { slot: usize, size: usize },

    /// Symbiont cannot be placed in the requested host
    #[error("Cannot add symbiont at slot {0}: {1}")]
    SymbiontRejected(usize, String),
}

/// Result type alias for symbiolab_core operations.
pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    #[must_use]
    pub fn unknown_task<S: Into<String>>(name: S) -> Self {
        Self::UnknownTask(name.into())
    }

    #[must_use]
    pub fn symbiont_rejected<S: Into<String>>(slot: usize, reason: S) -> Self {
        Self::SymbiontRejected(slot, reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::UnknownDependency {
            task: "XOR".into(),
            dependency: "MUL".into(),
        };
        assert_eq!(err.to_string(), "Task XOR depends on undefined task MUL");
        assert_eq!(
            SimError::unknown_task("FOO").to_string(),
            "Unknown task: FOO"
        );
    }

    #[test]
    fn test_converts_into_anyhow() {
        fn build() -> anyhow::Result<()> {
            Err(SimError::DependencyCycle("AND".into()))?;
            Ok(())
        }
        let err = build().unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }
}
