//! Births realized while draining the reproduction queue.

use hecs::Entity;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::Ordering;
use symbiolab_data::OrgKind;

use crate::config::AppConfig;
use crate::cpu::Cpu;
use crate::metrics::TickCounters;
use crate::organism::Organism;
use crate::population::Population;
use crate::repro_queue::{ReproEvent, ReproductionHandler, ReproductionQueue};

const NEIGHBOUR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// A uniformly chosen slot other than `slot`, or `slot` itself in a
/// population of one.
pub fn random_other_slot<R: Rng + ?Sized>(slot: usize, size: usize, rng: &mut R) -> usize {
    if size <= 1 {
        return slot;
    }
    let pick = rng.gen_range(0..size - 1);
    if pick >= slot {
        pick + 1
    } else {
        pick
    }
}

/// One of the eight cells around `slot` on a toroidal `width` x `height`
/// grid.
pub fn neighbour_slot<R: Rng + ?Sized>(
    slot: usize,
    width: usize,
    height: usize,
    rng: &mut R,
) -> usize {
    let (x, y) = ((slot % width) as isize, (slot / width) as isize);
    let (dx, dy) = NEIGHBOUR_OFFSETS[rng.gen_range(0..NEIGHBOUR_OFFSETS.len())];
    let nx = (x + dx).rem_euclid(width as isize) as usize;
    let ny = (y + dy).rem_euclid(height as isize) as usize;
    ny * width + nx
}

/// Disjoint borrows of the world needed to realize births.
pub(crate) struct Lifecycle<'a> {
    pub population: &'a mut Population,
    pub queue: &'a ReproductionQueue,
    pub config: &'a AppConfig,
    pub counters: &'a TickCounters,
    pub rng: &'a mut ChaCha8Rng,
}

impl Lifecycle<'_> {
    fn offspring_slot(&mut self, slot: usize) -> usize {
        let world = &self.config.world;
        if world.grid {
            neighbour_slot(slot, world.width, world.height, &mut *self.rng)
        } else {
            random_other_slot(slot, self.population.size(), &mut *self.rng)
        }
    }

    /// A mutated copy of `parent`'s CPU. With parent task tracking on, the
    /// copy also inherits the parent's task set and lineage counters.
    fn offspring_cpu(
        &mut self,
        parent: Entity,
        partner: Option<Entity>,
        mutation_rate: f64,
    ) -> Option<Cpu> {
        let seed = self.rng.gen();
        let mut cpu = self.population.get(parent)?.cpu.offspring(seed);
        if self.config.reproduction.track_parent_tasks {
            let partner_tasks = partner
                .and_then(|p| self.population.get(p).map(|o| o.cpu.state.parent_tasks_performed));
            let (tasks, lineage) = self
                .population
                .get(parent)?
                .cpu
                .state
                .offspring_lineage(partner_tasks);
            cpu.state.parent_tasks_performed = tasks;
            cpu.state.lineage = lineage;
        }
        cpu.mutate(mutation_rate, &mut *self.rng);
        Some(cpu)
    }

    fn host_birth(&mut self, event: &ReproEvent) {
        let parent = event.organism;
        let Some(symbionts) = self.population.get(parent).map(|p| p.symbionts.clone()) else {
            return;
        };
        let rate = self.config.reproduction.host_mutation_rate;
        let Some(cpu) = self.offspring_cpu(parent, symbionts.first().copied(), rate) else {
            return;
        };
        self.population
            .with_mut(parent, |p| p.cpu.state.take_repro_slot());

        let child = self.population.spawn(Organism::new(OrgKind::Host, cpu));
        for symbiont in symbionts {
            self.vertical_transmission(parent, symbiont, child);
        }

        let slot = self.offspring_slot(event.position.slot);
        if let Ok(Some(previous)) = self.population.place(slot, child) {
            self.population.kill(previous, self.queue);
        }
        self.counters.births.fetch_add(1, Ordering::Relaxed);
    }

    /// Gives `child` a copy of one of its parent's symbionts, if chance,
    /// the symbiont's points and the child's capacity allow it.
    fn vertical_transmission(&mut self, parent: Entity, symbiont: Entity, child: Entity) {
        let r = &self.config.reproduction;
        let (chance, cost, task_match) =
            (r.vertical_transmission, r.sym_vert_trans_res, r.vt_task_match);
        let (rate, limit) = (r.sym_mutation_rate, self.config.world.sym_limit);

        self.counters.vertical_attempts.fetch_add(1, Ordering::Relaxed);
        if !self.rng.gen_bool(chance) {
            return;
        }
        let full = self
            .population
            .get(child)
            .map_or(true, |c| c.symbionts.len() >= limit);
        if full {
            return;
        }
        let host_tasks = self
            .population
            .get(parent)
            .map(|p| p.cpu.state.tasks_performed)
            .unwrap_or_default();
        let paid = self
            .population
            .with_mut(symbiont, |s| {
                if s.dead || s.points < cost {
                    return false;
                }
                if task_match && !s.cpu.state.tasks_performed.overlaps(host_tasks) {
                    return false;
                }
                s.points -= cost;
                true
            })
            .unwrap_or(false);
        if !paid {
            return;
        }
        let Some(cpu) = self.offspring_cpu(symbiont, Some(parent), rate) else {
            return;
        };
        let offspring = self.population.spawn(Organism::new(OrgKind::Symbiont, cpu));
        if self.population.attach_symbiont(child, offspring, limit) {
            self.counters.vertical_successes.fetch_add(1, Ordering::Relaxed);
            self.counters.births.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Horizontal transmission: the offspring looks for a host with room
    /// and is lost if the target has none.
    fn symbiont_birth(&mut self, event: &ReproEvent) {
        let parent = event.organism;
        let host = self.population.get(parent).and_then(|p| p.host);
        let rate = self.config.reproduction.sym_mutation_rate;
        let Some(cpu) = self.offspring_cpu(parent, host, rate) else {
            return;
        };
        self.population
            .with_mut(parent, |p| p.cpu.state.take_repro_slot());
        self.counters.horizontal_attempts.fetch_add(1, Ordering::Relaxed);

        let world = &self.config.world;
        let target_slot = if world.grid {
            neighbour_slot(event.position.slot, world.width, world.height, &mut *self.rng)
        } else {
            self.rng.gen_range(0..self.population.size())
        };
        let limit = world.sym_limit;
        let Some(target) = self.population.at(target_slot) else {
            return;
        };
        let has_room = self
            .population
            .get(target)
            .is_some_and(|h| h.is_alive() && h.symbionts.len() < limit);
        if !has_room {
            return;
        }
        let offspring = self.population.spawn(Organism::new(OrgKind::Symbiont, cpu));
        if self.population.attach_symbiont(target, offspring, limit) {
            self.counters.horizontal_successes.fetch_add(1, Ordering::Relaxed);
            self.counters.births.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl ReproductionHandler for Lifecycle<'_> {
    fn is_alive(&self, organism: Entity) -> bool {
        self.population.is_alive(organism)
    }

    fn reproduce(&mut self, event: &ReproEvent) {
        let kind = self.population.get(event.organism).map(|o| o.kind);
        match kind {
            Some(OrgKind::Host) => self.host_birth(event),
            Some(OrgKind::Symbiont) => self.symbiont_birth(event),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_random_other_slot_never_picks_self() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..500 {
            let slot = rng.gen_range(0..10);
            let other = random_other_slot(slot, 10, &mut rng);
            assert_ne!(other, slot);
            assert!(other < 10);
        }
        assert_eq!(random_other_slot(0, 1, &mut rng), 0);
    }

    #[test]
    fn test_neighbours_wrap_around() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        // corner of a 5x4 grid
        let allowed = [1, 5, 6, 4, 9, 15, 16, 19];
        for _ in 0..200 {
            let n = neighbour_slot(0, 5, 4, &mut rng);
            assert!(allowed.contains(&n), "{n}");
        }
    }
}
