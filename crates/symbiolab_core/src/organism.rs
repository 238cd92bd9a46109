//! Organism records and the peripheral that wires a CPU into the world.

use hecs::Entity;
use rand::Rng;
use symbiolab_data::{OrgKind, Program};

use crate::config::AppConfig;
use crate::cpu::{Cpu, CpuState, Niche, Peripheral};
use crate::metrics::TickCounters;
use crate::repro_queue::ReproductionQueue;
use crate::resources::ResourcePool;
use crate::tasks::{CreditContext, TaskSet};

/// Share of a pair's combined points one donate or steal can move.
pub const TRANSFER_FRACTION: f64 = 0.2;

/// A host or symbiont.
///
/// The population arena owns every record. Hosts refer to their symbionts
/// and symbionts to their host by entity id only.
#[derive(Clone, Debug)]
pub struct Organism {
    pub kind: OrgKind,
    pub cpu: Cpu,
    pub points: f64,
    pub age: u32,
    pub dead: bool,
    /// The host a symbiont lives in.
    pub host: Option<Entity>,
    pub symbionts: Vec<Entity>,
}

impl Organism {
    /// A living, unplaced organism with no points and no partners.
    pub fn new(kind: OrgKind, cpu: Cpu) -> Self {
        Self {
            kind,
            cpu,
            points: 0.0,
            age: 0,
            dead: false,
            host: None,
            symbionts: Vec::new(),
        }
    }

    /// A host running `program` on a fresh CPU.
    pub fn host(program: Program, num_tasks: usize, seed: u64) -> Self {
        Self::new(OrgKind::Host, Cpu::new(program, num_tasks, seed))
    }

    /// A free symbiont running `program` on a fresh CPU.
    pub fn symbiont(program: Program, num_tasks: usize, seed: u64) -> Self {
        Self::new(OrgKind::Symbiont, Cpu::new(program, num_tasks, seed))
    }

    pub fn is_host(&self) -> bool {
        self.kind.is_host()
    }

    /// False once killed, even before the sweep removes it.
    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Ages by one tick and dies past `lifespan`.
    pub fn grow_older(&mut self, lifespan: Option<u32>) {
        self.age += 1;
        if lifespan.is_some_and(|limit| self.age > limit) {
            self.dead = true;
        }
    }
}

/// Read-only world state every CPU in a tick can see.
#[derive(Clone, Copy)]
pub struct TickContext<'a> {
    pub config: &'a AppConfig,
    pub tasks: &'a TaskSet,
    pub queue: &'a ReproductionQueue,
    pub counters: &'a TickCounters,
    pub pool: &'a ResourcePool,
}

impl TickContext<'_> {
    fn only_first_task(&self, kind: OrgKind) -> bool {
        match kind {
            OrgKind::Host => self.config.tasks.host_only_first_task_credit,
            OrgKind::Symbiont => self.config.tasks.sym_only_first_task_credit,
        }
    }

    fn reproduction_threshold(&self, kind: OrgKind) -> (f64, u64) {
        let r = &self.config.reproduction;
        match kind {
            OrgKind::Host => (r.host_repro_res, r.host_min_cycles_before_repro),
            OrgKind::Symbiont => (r.sym_horiz_trans_res, r.sym_min_cycles_before_repro),
        }
    }
}

/// The host side of a running symbiont.
pub struct Partner<'a> {
    pub points: &'a mut f64,
    pub niche: &'a mut Niche,
}

/// Peripheral handed to an organism's CPU for one run.
///
/// Holds exclusive borrows of the organism's balance and, for a symbiont,
/// of its host's balance and niche. Both belong to the same population slot,
/// which only one worker processes.
pub struct WorldPort<'a> {
    pub ctx: &'a TickContext<'a>,
    pub entity: Entity,
    pub kind: OrgKind,
    pub points: &'a mut f64,
    pub partner: Option<Partner<'a>>,
    /// Whether the organism currently has a partner.
    pub paired: bool,
}

impl Peripheral for WorldPort<'_> {
    fn output(&mut self, state: &mut CpuState, value: u32) {
        let ctx = CreditContext {
            kind: self.kind,
            only_first_task: self.ctx.only_first_task(self.kind),
            shared_niche: self.partner.as_mut().map(|p| &mut *p.niche),
            paired: self.paired,
            pool: Some(self.ctx.pool),
            counters: Some(self.ctx.counters),
        };
        let reward = self.ctx.tasks.process_output(state, value, ctx).reward();
        if reward > 0.0 {
            *self.points += reward;
            if self.kind == OrgKind::Symbiont {
                self.ctx.counters.symbiont_earned.record(reward);
            }
        }
    }

    fn input(&mut self, state: &mut CpuState) -> u32 {
        if self.ctx.config.hardware.random_io_input {
            state.rng().gen()
        } else {
            1
        }
    }

    fn reproduce(&mut self, state: &mut CpuState) {
        let (cost, min_cycles) = self.ctx.reproduction_threshold(self.kind);
        if *self.points <= cost || state.cycles_since_repro < min_cycles {
            return;
        }
        let Some(position) = state.location() else {
            return;
        };
        *self.points -= cost;
        let index = self.ctx.queue.enqueue(self.entity, position);
        state.set_repro_slot(index);
        state.cycles_since_repro = 0;
    }

    fn donate(&mut self, _state: &mut CpuState) {
        if !self.ctx.config.symbiosis.donation_steal_inst {
            return;
        }
        let Some(host) = self.partner.as_mut() else {
            return;
        };
        let amount = self.points.min((*self.points + *host.points) * TRANSFER_FRACTION);
        if amount <= 0.0 {
            return;
        }
        *self.points -= amount;
        *host.points += amount * (1.0 - self.ctx.config.symbiosis.donate_penalty);
        self.ctx.counters.donated.record(amount);
    }

    fn steal(&mut self, _state: &mut CpuState) {
        if !self.ctx.config.symbiosis.donation_steal_inst {
            return;
        }
        let Some(host) = self.partner.as_mut() else {
            return;
        };
        let amount = host.points.min((*self.points + *host.points) * TRANSFER_FRACTION);
        if amount <= 0.0 {
            return;
        }
        *host.points -= amount;
        *self.points += amount * (1.0 - self.ctx.config.symbiosis.steal_penalty);
        self.ctx.counters.stolen.record(amount);
    }
}
