//! The world: population, task environment and per-tick orchestration.
//!
//! `World` owns every piece of run state. Nothing here is process-global, so
//! several worlds can run side by side in one process.

mod lifecycle;
mod update;

use hecs::{Entity, Ref};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use symbiolab_data::{Checkpoint, Program, PROGRAM_LENGTH};

use crate::config::AppConfig;
use crate::cpu::builder::{host_ancestor, random_program, symbiont_ancestor};
use crate::error::{Result, SimError};
use crate::metrics::{Metrics, SeriesRecorder, TickCounters};
use crate::organism::Organism;
use crate::phenotype::{tasks_performable, DEFAULT_PROBE_CYCLES};
use crate::population::Population;
use crate::repro_queue::ReproductionQueue;
use crate::resources::ResourcePool;
use crate::scheduler::Scheduler;
use crate::tasks::{TaskBits, TaskIoBank, TaskSet, DEFAULT_INPUTS};

pub use lifecycle::{neighbour_slot, random_other_slot};

pub struct World {
    config: AppConfig,
    tasks: TaskSet,
    population: Population,
    queue: ReproductionQueue,
    scheduler: Scheduler,
    counters: TickCounters,
    pool: ResourcePool,
    series: SeriesRecorder,
    pub metrics: Metrics,
    rng: ChaCha8Rng,
    seed: u64,
    tick: u64,
}

impl World {
    /// An empty world. Fails on invalid configuration or when the worker
    /// pool cannot be started.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let tasks = TaskSet::from_definitions(&config.tasks.definitions)?;
        let scheduler = Scheduler::new(config.hardware.thread_count, config.hardware.batch_size)?;
        let seed = config.world.seed.unwrap_or_else(rand::random);
        tracing::info!(
            seed,
            fingerprint = %config.fingerprint(),
            tasks = tasks.len(),
            "world created"
        );
        Ok(Self {
            population: Population::new(config.population_size()),
            queue: ReproductionQueue::new(),
            counters: TickCounters::new(tasks.len()),
            pool: ResourcePool::from_config(config.world.limited_resources),
            series: SeriesRecorder::default(),
            metrics: Metrics::new(config.world.log_interval),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            tick: 0,
            scheduler,
            tasks,
            config,
        })
    }

    /// Places the configured ancestors: hosts in random slots, symbionts
    /// spread round-robin over them.
    pub fn populate(&mut self) -> Result<()> {
        let hw = &self.config.hardware;
        let (random_ancestor, ancestor) = (hw.random_ancestor, hw.host_ancestor);
        let mut slots: Vec<usize> = (0..self.population.size()).collect();
        slots.shuffle(&mut self.rng);
        slots.truncate(self.config.world.initial_hosts);

        for &slot in &slots {
            let program = if random_ancestor {
                random_program(PROGRAM_LENGTH, &mut self.rng)
            } else {
                host_ancestor(ancestor, PROGRAM_LENGTH)
            };
            self.add_host(slot, program)?;
        }

        if slots.is_empty() {
            return Ok(());
        }
        let sym = &self.config.symbiosis;
        let program = symbiont_ancestor(
            sym.symbiont_type,
            sym.donation_steal_inst,
            sym.transfer_instructions,
            PROGRAM_LENGTH,
        );
        for i in 0..self.config.world.initial_symbionts {
            self.add_symbiont(slots[i % slots.len()], program.clone())?;
        }
        tracing::info!(
            hosts = self.population.num_hosts(),
            symbionts = self.population.num_symbionts(),
            "population seeded"
        );
        Ok(())
    }

    /// Puts a new host running `program` at `slot`, killing any occupant.
    pub fn add_host(&mut self, slot: usize, program: Program) -> Result<Entity> {
        if slot >= self.population.size() {
            return Err(SimError::SlotOutOfRange {
                slot,
                size: self.population.size(),
            });
        }
        let organism = Organism::host(program, self.tasks.len(), self.rng.gen());
        let entity = self.population.spawn(organism);
        if let Some(previous) = self.population.place(slot, entity)? {
            self.population.kill(previous, &self.queue);
        }
        Ok(entity)
    }

    /// Adds a symbiont running `program` to the host at `slot`.
    pub fn add_symbiont(&mut self, slot: usize, program: Program) -> Result<Entity> {
        let limit = self.config.world.sym_limit;
        let host = self
            .population
            .at(slot)
            .ok_or_else(|| SimError::symbiont_rejected(slot, "no host"))?;
        let has_room = self
            .population
            .get(host)
            .is_some_and(|h| h.is_alive() && h.symbionts.len() < limit);
        if !has_room {
            return Err(SimError::symbiont_rejected(slot, "host is full"));
        }
        let organism = Organism::symbiont(program, self.tasks.len(), self.rng.gen());
        let entity = self.population.spawn(organism);
        self.population.attach_symbiont(host, entity, limit);
        Ok(entity)
    }

    /// Destroys an organism outside the normal death sweep. Its pending
    /// reproduction, and that of any symbiont it carries, is invalidated.
    pub fn kill(&mut self, entity: Entity) -> bool {
        self.population.kill(entity, &self.queue)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn tasks(&self) -> &TaskSet {
        &self.tasks
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn organism(&self, entity: Entity) -> Option<Ref<'_, Organism>> {
        self.population.get(entity)
    }

    /// Runs `f` on one organism record, e.g. to seed its balance.
    pub fn with_organism_mut<R>(
        &mut self,
        entity: Entity,
        f: impl FnOnce(&mut Organism) -> R,
    ) -> Option<R> {
        self.population.with_mut(entity, f)
    }

    pub fn host_at(&self, slot: usize) -> Option<Entity> {
        self.population.at(slot)
    }

    pub fn repro_queue(&self) -> &ReproductionQueue {
        &self.queue
    }

    pub fn counters(&self) -> &TickCounters {
        &self.counters
    }

    pub fn resources(&self) -> &ResourcePool {
        &self.pool
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Series recorded since the previous checkpoint.
    pub fn checkpoint(&mut self) -> Checkpoint {
        self.series.checkpoint()
    }

    /// How many hosts can perform each task set, judged by running every
    /// host genome against one synthetic environment.
    pub fn host_phenotypes(&self) -> BTreeMap<TaskBits, usize> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ self.tick);
        let bank = TaskIoBank::generate(&self.tasks, 1, true, DEFAULT_INPUTS, &mut rng);
        let mut tally = BTreeMap::new();
        let Some(io) = bank.get(0) else {
            return tally;
        };
        for (_, entity) in self.population.occupied() {
            if let Some(host) = self.population.get(entity) {
                let performed =
                    tasks_performable(host.cpu.program(), &self.tasks, io, DEFAULT_PROBE_CYCLES);
                *tally.entry(performed).or_insert(0) += 1;
            }
        }
        tally
    }
}
