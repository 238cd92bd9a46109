//! Configuration management for simulation parameters.
//!
//! Strongly-typed sections that map onto a `config.toml`. Every section has a
//! `Default` carrying values that produce a working run, and missing keys in
//! a file fall back to those defaults.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [world]
//! width = 30
//! height = 30
//! initial_hosts = 200
//! seed = 7
//!
//! [hardware]
//! cycles_per_update = 8
//! thread_count = 4
//!
//! [tasks]
//! host_only_first_task_credit = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::tasks::TaskSet;

/// Population geometry, seeding and the shared resource pool.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct WorldConfig {
    pub width: usize,
    pub height: usize,
    /// Offspring go to a neighbouring cell instead of anywhere.
    pub grid: bool,
    pub initial_hosts: usize,
    pub initial_symbionts: usize,
    pub sym_limit: usize,
    pub seed: Option<u64>,
    /// Size of the pool hosts draw task rewards from. `None` is unlimited.
    pub limited_resources: Option<f64>,
    pub resource_inflow: f64,
    pub log_interval: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            grid: false,
            initial_hosts: 100,
            initial_symbionts: 50,
            sym_limit: 1,
            seed: None,
            limited_resources: None,
            resource_inflow: 0.0,
            log_interval: 1000,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AncestorKind {
    #[default]
    Not,
    Nand,
    AllLogic,
}

/// Virtual CPU execution and the worker pool.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct HardwareConfig {
    pub cycles_per_update: usize,
    /// Threads taking part in the CPU phase, counting the caller.
    pub thread_count: usize,
    pub batch_size: usize,
    pub random_io_input: bool,
    pub random_ancestor: bool,
    pub host_ancestor: AncestorKind,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            cycles_per_update: 4,
            thread_count: 4,
            batch_size: 64,
            random_io_input: true,
            random_ancestor: false,
            host_ancestor: AncestorKind::Not,
        }
    }
}

/// Reproduction costs, mutation and lineage bookkeeping.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ReproductionConfig {
    pub host_repro_res: f64,
    pub sym_horiz_trans_res: f64,
    pub sym_vert_trans_res: f64,
    pub vertical_transmission: f64,
    pub host_min_cycles_before_repro: u64,
    pub sym_min_cycles_before_repro: u64,
    pub host_mutation_rate: f64,
    pub sym_mutation_rate: f64,
    pub host_lifespan: Option<u32>,
    pub sym_lifespan: Option<u32>,
    pub track_parent_tasks: bool,
    /// Vertical transmission only when symbiont and host share a task.
    pub vt_task_match: bool,
}

impl Default for ReproductionConfig {
    fn default() -> Self {
        Self {
            host_repro_res: 15.0,
            sym_horiz_trans_res: 10.0,
            sym_vert_trans_res: 0.0,
            vertical_transmission: 0.5,
            host_min_cycles_before_repro: 0,
            sym_min_cycles_before_repro: 0,
            host_mutation_rate: 0.0002,
            sym_mutation_rate: 0.0002,
            host_lifespan: None,
            sym_lifespan: None,
            track_parent_tasks: false,
            vt_task_match: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrganismType {
    #[default]
    Default,
    /// Hosts with symbionts only get half of their CPU turns.
    Health,
    /// Hosts face periodic extinction events.
    Stress,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SymbiontType {
    Mutualist,
    Parasite,
    #[default]
    Neutral,
}

/// Host/symbiont interaction.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SymbiosisConfig {
    pub organism_type: OrganismType,
    pub symbiont_type: SymbiontType,
    pub donation_steal_inst: bool,
    /// Donate or Steal instructions seeded into symbiont ancestors.
    pub transfer_instructions: usize,
    pub donate_penalty: f64,
    pub steal_penalty: f64,
}

impl Default for SymbiosisConfig {
    fn default() -> Self {
        Self {
            organism_type: OrganismType::Default,
            symbiont_type: SymbiontType::Neutral,
            donation_steal_inst: true,
            transfer_instructions: 94,
            donate_penalty: 0.10,
            steal_penalty: 0.10,
        }
    }
}

/// One configured task, referring to a predefined task function by name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskDefinition {
    pub name: String,
    pub reward: f64,
    #[serde(default)]
    pub unlimited: bool,
    /// Names of tasks that must have been completed first.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TaskConfig {
    pub host_only_first_task_credit: bool,
    pub sym_only_first_task_credit: bool,
    /// Ticks between clearing the used-task sets. Zero never clears them.
    pub limited_task_reset_interval: u64,
    /// Empty means the nine logic tasks with their standard rewards.
    pub definitions: Vec<TaskDefinition>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            host_only_first_task_credit: false,
            sym_only_first_task_credit: false,
            limited_task_reset_interval: 8,
            definitions: Vec::new(),
        }
    }
}

/// Extinction events for stress hosts.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StressConfig {
    /// What symbionts do to a host's survival odds.
    pub stress_type: SymbiontType,
    pub extinction_frequency: u64,
    pub base_death_chance: f64,
    pub mutualist_death_chance: f64,
    pub parasite_death_chance: f64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            stress_type: SymbiontType::Mutualist,
            extinction_frequency: 2000,
            base_death_chance: 0.25,
            mutualist_death_chance: 0.125,
            parasite_death_chance: 0.5,
        }
    }
}

impl StressConfig {
    pub fn death_chance(&self, has_symbiont: bool) -> f64 {
        if !has_symbiont {
            return self.base_death_chance;
        }
        match self.stress_type {
            SymbiontType::Mutualist => self.mutualist_death_chance,
            SymbiontType::Parasite => self.parasite_death_chance,
            SymbiontType::Neutral => self.base_death_chance,
        }
    }
}

/// Top-level configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub world: WorldConfig,
    pub hardware: HardwareConfig,
    pub reproduction: ReproductionConfig,
    pub symbiosis: SymbiosisConfig,
    pub tasks: TaskConfig,
    pub stress: StressConfig,
}

fn is_probability(p: f64) -> bool {
    (0.0..=1.0).contains(&p)
}

impl AppConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns the first failure found, including problems in the task
    /// definitions (unknown names, dependency cycles).
    pub fn validate(&self) -> anyhow::Result<()> {
        // World validation
        anyhow::ensure!(self.world.width > 0, "World width must be positive");
        anyhow::ensure!(self.world.height > 0, "World height must be positive");
        let slots = self.world.width * self.world.height;
        anyhow::ensure!(
            self.world.initial_hosts <= slots,
            "Initial hosts ({}) exceed population size ({slots})",
            self.world.initial_hosts
        );
        anyhow::ensure!(
            self.world.initial_symbionts <= self.world.initial_hosts * self.world.sym_limit,
            "Initial symbionts do not fit in the initial hosts"
        );
        if let Some(pool) = self.world.limited_resources {
            anyhow::ensure!(pool >= 0.0, "Limited resources must be non-negative");
        }
        anyhow::ensure!(
            self.world.resource_inflow >= 0.0,
            "Resource inflow must be non-negative"
        );

        // Hardware validation
        anyhow::ensure!(
            self.hardware.cycles_per_update > 0,
            "Cycles per update must be positive"
        );
        anyhow::ensure!(
            self.hardware.thread_count > 0,
            "Thread count must be at least 1"
        );
        anyhow::ensure!(self.hardware.batch_size > 0, "Batch size must be positive");

        // Reproduction validation
        let r = &self.reproduction;
        anyhow::ensure!(
            r.host_repro_res >= 0.0 && r.sym_horiz_trans_res >= 0.0 && r.sym_vert_trans_res >= 0.0,
            "Reproduction costs must be non-negative"
        );
        anyhow::ensure!(
            is_probability(r.vertical_transmission),
            "Vertical transmission must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            is_probability(r.host_mutation_rate) && is_probability(r.sym_mutation_rate),
            "Per-bit mutation rates must be in [0.0, 1.0]"
        );

        // Symbiosis validation
        anyhow::ensure!(
            is_probability(self.symbiosis.donate_penalty),
            "Donate penalty must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            is_probability(self.symbiosis.steal_penalty),
            "Steal penalty must be in [0.0, 1.0]"
        );

        // Stress validation
        let s = &self.stress;
        anyhow::ensure!(
            s.extinction_frequency > 0,
            "Extinction frequency must be positive"
        );
        anyhow::ensure!(
            is_probability(s.base_death_chance)
                && is_probability(s.mutualist_death_chance)
                && is_probability(s.parasite_death_chance),
            "Death chances must be in [0.0, 1.0]"
        );

        // Tasks
        TaskSet::from_definitions(&self.tasks.definitions)?;

        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn population_size(&self) -> usize {
        self.world.width * self.world.height
    }

    /// Hash of every section that changes simulation outcomes.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.world).as_bytes());
        hasher.update(format!("{:?}", self.hardware.cycles_per_update).as_bytes());
        hasher.update(format!("{:?}", self.hardware.random_io_input).as_bytes());
        hasher.update(format!("{:?}", self.hardware.host_ancestor).as_bytes());
        hasher.update(format!("{:?}", self.reproduction).as_bytes());
        hasher.update(format!("{:?}", self.symbiosis).as_bytes());
        hasher.update(format!("{:?}", self.tasks).as_bytes());
        hasher.update(format!("{:?}", self.stress).as_bytes());
        hex::encode(hasher.finalize())
    }
}
