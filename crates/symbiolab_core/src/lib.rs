//! # Symbiolab Core
//!
//! The simulation engine for coevolving hosts and symbionts, each running an
//! evolvable program on a small virtual CPU.
//!
//! This crate contains:
//! - The instruction set, the per-organism CPU and point mutation
//! - Task matching and scoring under configurable credit policies
//! - The reproduction queue and the batch scheduler for the CPU phase
//! - The population arena and the per-tick world update loop
//! - Metrics collection and structured logging
//!
//! ## Example
//!
//! ```
//! use symbiolab_core::config::AppConfig;
//! use symbiolab_core::world::World;
//!
//! let mut config = AppConfig::default();
//! config.world.seed = Some(42);
//! config.hardware.thread_count = 1;
//!
//! let mut world = World::new(config).unwrap();
//! world.populate().unwrap();
//! world.run(10);
//! assert_eq!(world.tick(), 10);
//! ```

/// Configuration management for simulation parameters
pub mod config;
/// Virtual CPU, instruction library, tag-based jumps and mutation
pub mod cpu;
/// Error types for recoverable construction failures
pub mod error;
/// Performance metrics, per-tick counters and structured logging
pub mod metrics;
/// Host and symbiont records and the CPU peripheral wiring them to the world
pub mod organism;
/// Task sets measured by running genomes in isolation
pub mod phenotype;
/// Slot-addressed population over an entity arena
pub mod population;
/// Deferred reproduction requests
pub mod repro_queue;
/// Shared resource pool hosts draw rewards from
pub mod resources;
/// Batch scheduler over a persistent worker pool
pub mod scheduler;
/// Task definitions, matching and credit
pub mod tasks;
/// Per-tick world orchestration
pub mod world;

pub use config::AppConfig;
pub use cpu::{Cpu, CpuState, Peripheral};
pub use error::SimError;
pub use metrics::{init_logging, Metrics};
pub use organism::Organism;
pub use repro_queue::{ReproEvent, ReproductionQueue};
pub use scheduler::Scheduler;
pub use tasks::{TaskBits, TaskOutcome, TaskSet};
pub use world::World;
