use serde::{Deserialize, Serialize};
use std::fmt;

use super::TaskId;

/// Widest task set a [`TaskBits`] can describe.
pub const MAX_TASKS: usize = 64;

/// Fixed-width set of task ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskBits(u64);

impl TaskBits {
    pub const EMPTY: TaskBits = TaskBits(0);

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn get(self, task: TaskId) -> bool {
        assert!(task < MAX_TASKS, "task id {task} out of range");
        self.0 & (1 << task) != 0
    }

    #[inline]
    pub fn set(&mut self, task: TaskId) {
        assert!(task < MAX_TASKS, "task id {task} out of range");
        self.0 |= 1 << task;
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Whether both sets contain at least one common task.
    pub fn overlaps(self, other: TaskBits) -> bool {
        self.0 & other.0 != 0
    }

    pub fn iter(self) -> impl Iterator<Item = TaskId> {
        (0..MAX_TASKS).filter(move |&t| self.0 & (1 << t) != 0)
    }
}

impl fmt::Display for TaskBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#b}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_count() {
        let mut bits = TaskBits::default();
        assert!(bits.is_empty());
        bits.set(0);
        bits.set(8);
        bits.set(8);
        assert!(bits.get(0) && bits.get(8) && !bits.get(1));
        assert_eq!(bits.count(), 2);
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![0, 8]);
    }

    #[test]
    fn test_overlap() {
        let mut a = TaskBits::default();
        let mut b = TaskBits::default();
        a.set(2);
        b.set(3);
        assert!(!a.overlaps(b));
        b.set(2);
        assert!(a.overlaps(b));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_task_panics() {
        TaskBits::default().set(MAX_TASKS);
    }
}
