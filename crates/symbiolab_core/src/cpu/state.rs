//! Organism-level execution context.
//!
//! Registers and the program counter belong to the core in [`super::Cpu`];
//! this holds everything an instruction can touch beyond them.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use symbiolab_data::WorldPosition;

use crate::tasks::TaskBits;

/// Inputs remembered for task matching.
pub const INPUT_BUFFER_LEN: usize = 4;

/// Deepest a single stack may grow; further pushes are dropped.
pub const STACK_LIMIT: usize = 16;

/// Fixed-size ring of the most recent values pushed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IoRingBuffer<const N: usize> {
    values: [u32; N],
    next: usize,
}

impl<const N: usize> Default for IoRingBuffer<N> {
    fn default() -> Self {
        Self {
            values: [0; N],
            next: 0,
        }
    }
}

impl<const N: usize> IoRingBuffer<N> {
    /// Overwrites the oldest value once full.
    pub fn push(&mut self, value: u32) {
        self.values[self.next] = value;
        self.next = (self.next + 1) % N;
    }

    /// Value at storage position `index`, wrapping around the end.
    #[inline]
    pub fn get(&self, index: usize) -> u32 {
        self.values[index % N]
    }

    /// Values pushed so far, capped at `N`.
    pub fn len(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        N == 0
    }

    /// Raw storage in slot order, not push order.
    pub fn values(&self) -> &[u32; N] {
        &self.values
    }

    pub fn clear(&mut self) {
        self.values = [0; N];
        self.next = 0;
    }
}

/// Two operand stacks, one of them active.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stacks {
    stacks: [Vec<u32>; 2],
    active: usize,
}

impl Stacks {
    /// Returns false when the active stack is full and the value was dropped.
    pub fn push(&mut self, value: u32) -> bool {
        let stack = &mut self.stacks[self.active];
        if stack.len() >= STACK_LIMIT {
            return false;
        }
        stack.push(value);
        true
    }

    /// Pops from the active stack.
    pub fn pop(&mut self) -> Option<u32> {
        self.stacks[self.active].pop()
    }

    /// Switches which stack `push` and `pop` use.
    pub fn swap_active(&mut self) {
        self.active ^= 1;
    }

    /// Active stack contents, bottom first.
    pub fn active(&self) -> &[u32] {
        &self.stacks[self.active]
    }

    pub fn clear(&mut self) {
        self.stacks.iter_mut().for_each(Vec::clear);
        self.active = 0;
    }
}

/// Task bookkeeping a host shares with the symbionts living in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Niche {
    /// Tasks already credited since the last reset.
    pub used: TaskBits,
    /// Dependency credits earned by either partner.
    pub shared_dependencies: Vec<u32>,
}

impl Niche {
    /// Empty niche sized for `num_tasks` tasks.
    pub fn new(num_tasks: usize) -> Self {
        Self {
            used: TaskBits::default(),
            shared_dependencies: vec![0; num_tasks],
        }
    }
}

/// Per-task counters following task gains and losses down a lineage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskLineage {
    pub gained: Vec<u32>,
    pub lost: Vec<u32>,
    pub toward_partner: Vec<u32>,
    pub from_partner: Vec<u32>,
}

impl TaskLineage {
    pub fn new(num_tasks: usize) -> Self {
        Self {
            gained: vec![0; num_tasks],
            lost: vec![0; num_tasks],
            toward_partner: vec![0; num_tasks],
            from_partner: vec![0; num_tasks],
        }
    }
}

/// Everything a CPU carries besides its program and registers.
#[derive(Clone, Debug)]
pub struct CpuState {
    pub stacks: Stacks,
    pub inputs: IoRingBuffer<INPUT_BUFFER_LEN>,
    pub tasks_performed: TaskBits,
    pub parent_tasks_performed: TaskBits,
    pub lineage: TaskLineage,
    pub available_dependencies: Vec<u32>,
    /// Own niche. Symbionts use their host's instead while hosted.
    pub niche: Niche,
    pub cycles_since_repro: u64,
    repro_slot: Option<usize>,
    location: Option<WorldPosition>,
    rng: ChaCha8Rng,
}

impl CpuState {
    /// Fresh state with its own random stream seeded from `seed`.
    pub fn new(num_tasks: usize, seed: u64) -> Self {
        Self {
            stacks: Stacks::default(),
            inputs: IoRingBuffer::default(),
            tasks_performed: TaskBits::default(),
            parent_tasks_performed: TaskBits::default(),
            lineage: TaskLineage::new(num_tasks),
            available_dependencies: vec![0; num_tasks],
            niche: Niche::new(num_tasks),
            cycles_since_repro: 0,
            repro_slot: None,
            location: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn num_tasks(&self) -> usize {
        self.available_dependencies.len()
    }

    /// Index of this organism's pending event in the reproduction queue.
    pub fn repro_slot(&self) -> Option<usize> {
        self.repro_slot
    }

    /// Remembers the queue index of a pending birth.
    ///
    /// # Panics
    ///
    /// Panics if a birth is already pending.
    pub fn set_repro_slot(&mut self, index: usize) {
        assert!(
            self.repro_slot.is_none(),
            "organism already queued for reproduction at {:?}",
            self.repro_slot
        );
        self.repro_slot = Some(index);
    }

    /// Clears and returns the pending queue index.
    pub fn take_repro_slot(&mut self) -> Option<usize> {
        self.repro_slot.take()
    }

    /// `None` means the organism is not placed and cannot reproduce.
    pub fn location(&self) -> Option<WorldPosition> {
        self.location
    }

    pub fn set_location(&mut self, location: Option<WorldPosition>) {
        self.location = location;
    }

    /// The organism's own random stream.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Parent task set and lineage counters for an offspring of this state.
    ///
    /// `partner_parent_tasks` is the parent-task set of this organism's
    /// current partner, if it has one.
    pub fn offspring_lineage(
        &self,
        partner_parent_tasks: Option<TaskBits>,
    ) -> (TaskBits, TaskLineage) {
        let mut lineage = self.lineage.clone();
        let own = self.tasks_performed;
        let parent = self.parent_tasks_performed;
        for task in 0..self.num_tasks() {
            match (own.get(task), parent.get(task)) {
                (true, false) => lineage.gained[task] += 1,
                (false, true) => lineage.lost[task] += 1,
                _ => {}
            }
            if let Some(partner) = partner_parent_tasks {
                let partner_has = partner.get(task);
                if parent.get(task) != partner_has && own.get(task) == partner_has {
                    lineage.toward_partner[task] += 1;
                } else if parent.get(task) == partner_has && own.get(task) != partner_has {
                    lineage.from_partner[task] += 1;
                }
            }
        }
        (own, lineage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_wraps() {
        let mut buf = IoRingBuffer::<4>::default();
        for v in 1..=5 {
            buf.push(v);
        }
        assert_eq!(buf.values(), &[5, 2, 3, 4]);
        assert_eq!(buf.get(3), 4);
        assert_eq!(buf.get(4), 5);
    }

    #[test]
    fn test_stack_limit_and_empty_pop() {
        let mut stacks = Stacks::default();
        for v in 0..STACK_LIMIT as u32 {
            assert!(stacks.push(v));
        }
        assert!(!stacks.push(99));
        assert_eq!(stacks.active().len(), STACK_LIMIT);
        stacks.swap_active();
        assert_eq!(stacks.pop(), None);
        stacks.swap_active();
        assert_eq!(stacks.pop(), Some(STACK_LIMIT as u32 - 1));
    }

    #[test]
    fn test_repro_slot_lifecycle() {
        let mut state = CpuState::new(9, 1);
        assert_eq!(state.repro_slot(), None);
        state.set_repro_slot(3);
        assert_eq!(state.take_repro_slot(), Some(3));
        assert_eq!(state.repro_slot(), None);
    }

    #[test]
    #[should_panic(expected = "already queued")]
    fn test_double_queue_is_a_bug() {
        let mut state = CpuState::new(9, 1);
        state.set_repro_slot(0);
        state.set_repro_slot(1);
    }

    #[test]
    fn test_offspring_lineage_counts_changes() {
        let mut state = CpuState::new(3, 1);
        state.parent_tasks_performed.set(0);
        state.parent_tasks_performed.set(1);
        state.tasks_performed.set(1);
        state.tasks_performed.set(2);

        let mut partner = TaskBits::default();
        partner.set(2);

        let (parent_tasks, lineage) = state.offspring_lineage(Some(partner));
        assert_eq!(parent_tasks, state.tasks_performed);
        assert_eq!(lineage.gained, vec![0, 0, 1]);
        assert_eq!(lineage.lost, vec![1, 0, 0]);
        assert_eq!(lineage.toward_partner, vec![1, 0, 1]);
        assert_eq!(lineage.from_partner, vec![0, 0, 0]);
    }
}
