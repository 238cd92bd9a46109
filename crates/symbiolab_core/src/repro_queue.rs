//! Deferred reproduction requests.
//!
//! Workers enqueue births while the CPU phase runs and the world realizes
//! them afterwards, single-threaded. Indices handed out by
//! [`ReproductionQueue::enqueue`] stay meaningful until the next
//! [`ReproductionQueue::process`]; the queue is never compacted in between.

use hecs::Entity;
use std::sync::Mutex;
use symbiolab_data::WorldPosition;

/// One pending birth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReproEvent {
    pub organism: Entity,
    pub position: WorldPosition,
    /// Cleared when the organism is destroyed before the drain.
    pub valid: bool,
}

/// What the drain consults and drives.
pub trait ReproductionHandler {
    fn is_alive(&self, organism: Entity) -> bool;

    /// Realizes one birth. May kill organisms, which invalidates their own
    /// pending events further down the queue.
    fn reproduce(&mut self, event: &ReproEvent);
}

#[derive(Debug, Default)]
pub struct ReproductionQueue {
    events: Mutex<Vec<ReproEvent>>,
}

impl ReproductionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ReproEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Appends an event and returns its index.
    pub fn enqueue(&self, organism: Entity, position: WorldPosition) -> usize {
        let mut events = self.lock();
        events.push(ReproEvent {
            organism,
            position,
            valid: true,
        });
        events.len() - 1
    }

    pub fn invalidate(&self, index: usize) {
        let mut events = self.lock();
        let len = events.len();
        let event = events
            .get_mut(index)
            .unwrap_or_else(|| panic!("reproduction slot {index} out of range ({len} queued)"));
        event.valid = false;
    }

    pub fn get(&self, index: usize) -> Option<ReproEvent> {
        self.lock().get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&mut self) {
        self.events
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Walks the queue once in enqueue order, hands every event that is
    /// still valid and whose organism is alive to `handler`, then empties
    /// the queue. Returns how many births were realized.
    ///
    /// The lock is released around each callback so the handler can
    /// invalidate later events.
    pub fn process<H: ReproductionHandler + ?Sized>(&self, handler: &mut H) -> usize {
        let queued = self.len();
        let mut realized = 0;
        for index in 0..queued {
            let Some(event) = self.get(index) else {
                break;
            };
            if !event.valid || !handler.is_alive(event.organism) {
                continue;
            }
            handler.reproduce(&event);
            realized += 1;
        }

        let mut events = self.lock();
        assert_eq!(
            events.len(),
            queued,
            "reproduction requested while the queue was draining"
        );
        events.clear();
        realized
    }
}
