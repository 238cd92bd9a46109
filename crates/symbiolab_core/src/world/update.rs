use hecs::Entity;
use rand::Rng;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use symbiolab_data::{OrgKind, WorldPosition};

use super::lifecycle::Lifecycle;
use super::World;
use crate::config::OrganismType;
use crate::organism::{Organism, Partner, TickContext, WorldPort};
use crate::population::SlotWork;

impl World {
    /// Advances the simulation by one tick.
    ///
    /// Phases, in order:
    /// - resource inflow and the periodic used-task reset
    /// - the parallel CPU phase
    /// - symbiont lifecycle (dead symbionts leave their hosts)
    /// - reproduction drain
    /// - extinction events for stress hosts
    /// - death sweep and bookkeeping
    pub fn update(&mut self) {
        let started = Instant::now();
        self.tick += 1;

        self.pool.inflow(self.config.world.resource_inflow);
        self.reset_used_tasks();
        self.run_cpu_phase();
        self.population.prune_symbionts();
        self.drain_reproduction();
        self.apply_extinction();
        let removed = self.population.sweep_dead();
        self.counters.deaths.fetch_add(removed as u64, Ordering::Relaxed);
        self.record_tick(started.elapsed());
    }

    /// Runs `updates` ticks.
    pub fn run(&mut self, updates: u64) {
        for _ in 0..updates {
            self.update();
        }
    }

    /// Clears every used-task set on ticks that are a multiple of the reset
    /// interval.
    pub fn reset_used_tasks(&mut self) {
        let interval = self.config.tasks.limited_task_reset_interval;
        if interval == 0 || self.tick % interval != 0 {
            return;
        }
        for (_, organism) in self.population.organisms_mut() {
            organism.cpu.state.niche.used.clear();
        }
    }

    /// Gives every occupied slot one CPU turn across the worker pool.
    ///
    /// The population is borrowed as disjoint per-slot work for the whole
    /// phase, so nothing can be born, die structurally or move until every
    /// worker is done.
    pub fn run_cpu_phase(&mut self) {
        let ctx = TickContext {
            config: &self.config,
            tasks: &self.tasks,
            queue: &self.queue,
            counters: &self.counters,
            pool: &self.pool,
        };
        let mut work = self.population.slot_work();
        self.scheduler.run(&mut work, |slot| process_slot(&ctx, slot));
    }

    /// Realizes every valid birth queued during the CPU phase.
    pub fn drain_reproduction(&mut self) -> usize {
        let mut lifecycle = Lifecycle {
            population: &mut self.population,
            queue: &self.queue,
            config: &self.config,
            counters: &self.counters,
            rng: &mut self.rng,
        };
        self.queue.process(&mut lifecycle)
    }

    /// Every `extinction_frequency` ticks, each stress host dies with a
    /// chance depending on whether it carries a symbiont.
    pub fn apply_extinction(&mut self) -> usize {
        let stress = &self.config.stress;
        if self.config.symbiosis.organism_type != OrganismType::Stress
            || self.tick % stress.extinction_frequency != 0
        {
            return 0;
        }
        let hosts: Vec<(Entity, bool)> = self
            .population
            .occupied()
            .filter_map(|(_, e)| {
                let host = self.population.get(e)?;
                host.is_alive().then(|| (e, !host.symbionts.is_empty()))
            })
            .collect();

        let mut killed = 0;
        for (host, has_symbiont) in hosts {
            if self.rng.gen_bool(stress.death_chance(has_symbiont)) {
                self.population.kill(host, &self.queue);
                killed += 1;
            }
        }
        tracing::info!(tick = self.tick, killed, "extinction event");
        killed
    }

    fn record_tick(&mut self, duration: Duration) {
        let tick = self.tick;
        let hosts = self.population.num_hosts();
        let symbionts = self.population.num_symbionts();
        let counters = &self.counters;
        let series = &mut self.series;

        series.append(tick, "hosts", hosts as f64);
        series.append(tick, "symbionts", symbionts as f64);
        for (id, task) in self.tasks.iter().enumerate() {
            let host_done = counters.task_successes(OrgKind::Host, id);
            let sym_done = counters.task_successes(OrgKind::Symbiont, id);
            series.append(tick, &format!("host_task_{}", task.name), host_done as f64);
            series.append(tick, &format!("sym_task_{}", task.name), sym_done as f64);
        }

        let donated = counters.donated.take();
        let stolen = counters.stolen.take();
        let earned = counters.symbiont_earned.take();
        series.append(tick, "donated", donated.total);
        series.append(tick, "donations", donated.count as f64);
        series.append(tick, "stolen", stolen.total);
        series.append(tick, "steals", stolen.count as f64);
        series.append(tick, "symbiont_earned", earned.total);

        for (name, counter) in [
            ("vertical_attempts", &counters.vertical_attempts),
            ("vertical_successes", &counters.vertical_successes),
            ("horizontal_attempts", &counters.horizontal_attempts),
            ("horizontal_successes", &counters.horizontal_successes),
            ("births", &counters.births),
            ("deaths", &counters.deaths),
        ] {
            let value = counter.load(Ordering::Relaxed);
            series.append(tick, name, value as f64);
            self.metrics.add_to_counter(name, value);
        }
        if self.pool.is_limited() {
            series.append(tick, "resources", self.pool.available());
        }

        self.metrics.record_tick(duration, hosts, symbionts);
        counters.reset();
    }
}

/// One slot's CPU turn: the host and its symbionts in an order decided by
/// the host's own random stream, then ageing.
fn process_slot(ctx: &TickContext<'_>, work: &mut SlotWork<'_>) {
    let SlotWork {
        slot,
        entity,
        host,
        symbionts,
    } = work;
    let has_symbionts = !symbionts.is_empty();
    let coin = host.cpu.state.rng().gen_bool(0.5);
    let (host_first, run_host, run_symbionts) = match ctx.config.symbiosis.organism_type {
        OrganismType::Health if has_symbionts => (true, coin, !coin),
        _ => (coin, true, true),
    };

    if host_first {
        host_turn(ctx, *slot, *entity, host, has_symbionts, run_host);
        symbiont_turns(ctx, *slot, host, symbionts, run_symbionts);
    } else {
        symbiont_turns(ctx, *slot, host, symbionts, run_symbionts);
        host_turn(ctx, *slot, *entity, host, has_symbionts, run_host);
    }
    if host.dead {
        bury_with_host(ctx, host, symbionts);
    }
}

/// Clears pending births of a host that died during its turn and takes its
/// symbionts down with it.
fn bury_with_host(
    ctx: &TickContext<'_>,
    host: &mut Organism,
    symbionts: &mut [(Entity, &mut Organism)],
) {
    if let Some(index) = host.cpu.state.take_repro_slot() {
        ctx.queue.invalidate(index);
    }
    for (_, symbiont) in symbionts.iter_mut() {
        symbiont.dead = true;
        if let Some(index) = symbiont.cpu.state.take_repro_slot() {
            ctx.queue.invalidate(index);
        }
    }
}

fn host_turn(
    ctx: &TickContext<'_>,
    slot: usize,
    entity: Entity,
    host: &mut Organism,
    paired: bool,
    run: bool,
) {
    if host.dead {
        return;
    }
    if run {
        let Organism { cpu, points, .. } = &mut *host;
        let mut port = WorldPort {
            ctx,
            entity,
            kind: OrgKind::Host,
            points,
            partner: None,
            paired,
        };
        cpu.run_step(
            Some(WorldPosition::host(slot)),
            ctx.config.hardware.cycles_per_update,
            &mut port,
        );
    }
    host.grow_older(ctx.config.reproduction.host_lifespan);
}

/// Stops early once the host is dead.
fn symbiont_turns(
    ctx: &TickContext<'_>,
    slot: usize,
    host: &mut Organism,
    symbionts: &mut [(Entity, &mut Organism)],
    run: bool,
) {
    for (index, (entity, symbiont)) in symbionts.iter_mut().enumerate() {
        if host.dead {
            break;
        }
        if symbiont.dead {
            continue;
        }
        if run {
            let Organism {
                cpu: host_cpu,
                points: host_points,
                ..
            } = &mut *host;
            let Organism { cpu, points, .. } = &mut **symbiont;
            let mut port = WorldPort {
                ctx,
                entity: *entity,
                kind: OrgKind::Symbiont,
                points,
                partner: Some(Partner {
                    points: host_points,
                    niche: &mut host_cpu.state.niche,
                }),
                paired: true,
            };
            cpu.run_step(
                Some(WorldPosition::symbiont(slot, index)),
                ctx.config.hardware.cycles_per_update,
                &mut port,
            );
        }
        symbiont.grow_older(ctx.config.reproduction.sym_lifespan);
    }
}
