//! The population container.
//!
//! Organism records live in a `hecs` arena keyed by [`Entity`]; the
//! population itself is a fixed array of slots, each empty or holding one
//! host. Symbionts are arena records referenced from their host's list.

use hecs::{Entity, Ref};
use std::collections::{HashMap, HashSet};

use crate::error::{Result, SimError};
use crate::organism::Organism;
use crate::repro_queue::ReproductionQueue;

/// One occupied slot's share of the CPU phase: the host and every
/// symbiont in it, borrowed exclusively.
pub struct SlotWork<'a> {
    pub slot: usize,
    pub entity: Entity,
    pub host: &'a mut Organism,
    pub symbionts: Vec<(Entity, &'a mut Organism)>,
}

pub struct Population {
    arena: hecs::World,
    slots: Vec<Option<Entity>>,
}

impl Population {
    pub fn new(size: usize) -> Self {
        Self {
            arena: hecs::World::new(),
            slots: vec![None; size],
        }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    fn check_slot(&self, slot: usize) -> Result<()> {
        if slot >= self.slots.len() {
            return Err(SimError::SlotOutOfRange {
                slot,
                size: self.slots.len(),
            });
        }
        Ok(())
    }

    pub fn is_occupied(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(Option::is_some)
    }

    /// The host at `slot`.
    pub fn at(&self, slot: usize) -> Option<Entity> {
        self.slots.get(slot).copied().flatten()
    }

    /// Occupied slots in index order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, Entity)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, e)| e.map(|e| (slot, e)))
    }

    pub fn num_hosts(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn num_symbionts(&self) -> usize {
        self.occupied()
            .filter_map(|(_, host)| self.get(host).map(|h| h.symbionts.len()))
            .sum()
    }

    /// Adds a record to the arena without placing it in a slot.
    pub fn spawn(&mut self, organism: Organism) -> Entity {
        self.arena.spawn((organism,))
    }

    /// Puts `entity` at `slot` and returns the previous occupant, which is
    /// left in the arena for the caller to kill.
    pub fn place(&mut self, slot: usize, entity: Entity) -> Result<Option<Entity>> {
        self.check_slot(slot)?;
        Ok(self.slots[slot].replace(entity))
    }

    pub fn vacate(&mut self, slot: usize) -> Option<Entity> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.arena.contains(entity)
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.get(entity).is_some_and(|org| org.is_alive())
    }

    pub fn get(&self, entity: Entity) -> Option<Ref<'_, Organism>> {
        self.arena.get::<&Organism>(entity).ok()
    }

    /// Runs `f` on one record. Only one record is borrowed at a time.
    pub fn with_mut<R>(&mut self, entity: Entity, f: impl FnOnce(&mut Organism) -> R) -> Option<R> {
        self.arena
            .get::<&mut Organism>(entity)
            .ok()
            .map(|mut org| f(&mut *org))
    }

    /// Attaches an already spawned symbiont to `host` if there is room.
    pub fn attach_symbiont(&mut self, host: Entity, symbiont: Entity, limit: usize) -> bool {
        let attached = self
            .with_mut(host, |h| {
                if h.dead || h.symbionts.len() >= limit {
                    return false;
                }
                h.symbionts.push(symbiont);
                true
            })
            .unwrap_or(false);
        if attached {
            self.with_mut(symbiont, |s| s.host = Some(host));
        }
        attached
    }

    /// Marks an organism dead and invalidates its pending reproduction.
    /// Killing a host kills everything living in it.
    pub fn kill(&mut self, entity: Entity, queue: &ReproductionQueue) -> bool {
        let symbionts = self.with_mut(entity, |org| {
            if org.dead {
                return None;
            }
            org.dead = true;
            if let Some(index) = org.cpu.state.take_repro_slot() {
                queue.invalidate(index);
            }
            Some(org.symbionts.clone())
        });
        let Some(Some(symbionts)) = symbionts else {
            return false;
        };
        for symbiont in symbionts {
            self.kill(symbiont, queue);
        }
        true
    }

    /// Drops dead symbionts from every host's list.
    pub fn prune_symbionts(&mut self) {
        let alive: HashMap<Entity, bool> = self
            .arena
            .query_mut::<&Organism>()
            .into_iter()
            .map(|(e, org)| (e, org.is_alive()))
            .collect();
        for (_, org) in self.arena.query_mut::<&mut Organism>() {
            if org.is_host() {
                org.symbionts
                    .retain(|s| alive.get(s).copied().unwrap_or(false));
            }
        }
    }

    /// Empties slots whose host died, despawns every dead record and
    /// returns how many were removed.
    pub fn sweep_dead(&mut self) -> usize {
        self.prune_symbionts();
        let dead: HashSet<Entity> = self
            .arena
            .query_mut::<&Organism>()
            .into_iter()
            .filter(|(_, org)| org.dead)
            .map(|(e, _)| e)
            .collect();
        for slot in self.slots.iter_mut() {
            if slot.is_some_and(|e| dead.contains(&e)) {
                *slot = None;
            }
        }
        for &entity in &dead {
            // Entities come straight from the arena query above.
            let _ = self.arena.despawn(entity);
        }
        dead.len()
    }

    /// Splits the population into disjoint per-slot borrows for the CPU
    /// phase, in slot order. No record can be added or removed while the
    /// returned work is alive.
    pub fn slot_work(&mut self) -> Vec<SlotWork<'_>> {
        let mut records: HashMap<Entity, &mut Organism> =
            self.arena.query_mut::<&mut Organism>().into_iter().collect();
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, entity)| {
                let entity = (*entity)?;
                let host = records.remove(&entity)?;
                let symbionts = host
                    .symbionts
                    .iter()
                    .filter_map(|&s| records.remove(&s).map(|org| (s, org)))
                    .collect();
                Some(SlotWork {
                    slot,
                    entity,
                    host,
                    symbionts,
                })
            })
            .collect()
    }

    /// Mutable access to every record, in arena order.
    pub fn organisms_mut(&mut self) -> impl Iterator<Item = (Entity, &mut Organism)> + '_ {
        self.arena.query_mut::<&mut Organism>().into_iter()
    }
}
