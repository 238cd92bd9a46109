//! Synthetic task environments.
//!
//! A [`TaskIo`] fixes a small set of inputs and precomputes every task's
//! output for each rotation of them, so any output a program produces can
//! be traced back to the task that explains it. Environments are rebuilt
//! until those outputs are pairwise distinct, up to a fixed retry cap.

use rand::Rng;
use std::collections::{HashMap, HashSet};

use super::{TaskFn, TaskId, TaskSet};

/// Attempts at a collision-free environment before settling for the last one.
pub const MAX_ENV_BUILD_TRIES: usize = 10_000;

/// Inputs per environment unless asked otherwise.
pub const DEFAULT_INPUTS: usize = 4;

/// One rotation of the inputs and the output a task gives for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IoSet {
    pub inputs: Vec<u32>,
    pub output: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskIo {
    pub inputs: Vec<u32>,
    pub valid_outputs: HashSet<u32>,
    /// Indexed by task id.
    pub correct_outputs: Vec<Vec<IoSet>>,
    pub lookup: HashMap<u32, Vec<TaskId>>,
    /// Two entries share an output, or an output can never score.
    pub collision: bool,
}

impl TaskIo {
    fn build<R: Rng + ?Sized>(tasks: &TaskSet, num_inputs: usize, rng: &mut R) -> Self {
        let mut io = TaskIo {
            inputs: (0..num_inputs).map(|_| rng.gen()).collect(),
            correct_outputs: vec![Vec::new(); tasks.len()],
            ..Default::default()
        };
        for (id, task) in tasks.iter().enumerate() {
            for shift in 0..num_inputs {
                let rotated: Vec<u32> = (0..num_inputs)
                    .map(|i| io.inputs[(i + shift) % num_inputs])
                    .collect();
                let output = match task.function {
                    TaskFn::Unary(f) => f(rotated[0]),
                    TaskFn::Binary(f) => f(rotated[0], rotated[1 % num_inputs]),
                    TaskFn::Output(_) => continue,
                };
                io.record(id, IoSet { inputs: rotated, output });
            }
        }
        io
    }

    fn record(&mut self, task: TaskId, set: IoSet) {
        let output = set.output;
        if !self.valid_outputs.insert(output) || output <= 1 || self.inputs.contains(&output) {
            self.collision = true;
        }
        self.lookup.entry(output).or_default().push(task);
        self.correct_outputs[task].push(set);
    }

    pub fn is_valid_output(&self, output: u32) -> bool {
        self.valid_outputs.contains(&output)
    }

    /// Tasks whose output for these inputs is `output`.
    pub fn task_ids(&self, output: u32) -> &[TaskId] {
        self.lookup.get(&output).map_or(&[], Vec::as_slice)
    }
}

/// A collection of prebuilt environments.
#[derive(Clone, Debug, Default)]
pub struct TaskIoBank {
    ios: Vec<TaskIo>,
}

impl TaskIoBank {
    /// Builds `count` environments, each with pairwise distinct outputs when
    /// `unique_outputs` is set.
    pub fn generate<R: Rng + ?Sized>(
        tasks: &TaskSet,
        count: usize,
        unique_outputs: bool,
        num_inputs: usize,
        rng: &mut R,
    ) -> Self {
        assert!(num_inputs > 0, "an environment needs at least one input");
        let ios = (0..count)
            .map(|_| Self::build_one(tasks, unique_outputs, num_inputs, rng))
            .collect();
        Self { ios }
    }

    fn build_one<R: Rng + ?Sized>(
        tasks: &TaskSet,
        unique_outputs: bool,
        num_inputs: usize,
        rng: &mut R,
    ) -> TaskIo {
        let mut io = TaskIo::build(tasks, num_inputs, rng);
        let mut tries = 1;
        while unique_outputs && io.collision && tries < MAX_ENV_BUILD_TRIES {
            io = TaskIo::build(tasks, num_inputs, rng);
            tries += 1;
        }
        if unique_outputs && io.collision {
            tracing::warn!(
                tries,
                tasks = tasks.len(),
                "failed to build task environment with unique outputs; keeping last attempt"
            );
        }
        io
    }

    pub fn len(&self) -> usize {
        self.ios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ios.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TaskIo> {
        self.ios.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TaskIo> {
        self.ios.iter()
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&TaskIo> {
        if self.ios.is_empty() {
            return None;
        }
        self.ios.get(rng.gen_range(0..self.ios.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::Task;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_logic_environments_are_collision_free() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let tasks = TaskSet::logic();
        let bank = TaskIoBank::generate(&tasks, 5, true, DEFAULT_INPUTS, &mut rng);
        assert_eq!(bank.len(), 5);
        for io in bank.iter() {
            assert!(!io.collision);
            assert_eq!(io.valid_outputs.len(), 9 * DEFAULT_INPUTS);
            for (id, sets) in io.correct_outputs.iter().enumerate() {
                assert_eq!(sets.len(), DEFAULT_INPUTS);
                for set in sets {
                    assert_eq!(io.task_ids(set.output), &[id]);
                }
            }
        }
    }

    #[test]
    fn test_rotations_cover_every_adjacent_pair() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let tasks = TaskSet::logic();
        let bank = TaskIoBank::generate(&tasks, 1, true, 3, &mut rng);
        let io = bank.get(0).unwrap();
        let and = tasks.id_of("AND").unwrap();
        let (x, y, z) = (io.inputs[0], io.inputs[1], io.inputs[2]);
        let outputs: Vec<u32> = io.correct_outputs[and].iter().map(|s| s.output).collect();
        assert_eq!(outputs, vec![x & y, y & z, z & x]);
    }

    #[test]
    fn test_impossible_uniqueness_gives_up_with_best_effort() {
        let mut tasks = TaskSet::empty();
        tasks.add(Task::new("A", TaskFn::Unary(|_| 7), 1.0)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let bank = TaskIoBank::generate(&tasks, 1, true, 2, &mut rng);
        let io = bank.get(0).unwrap();
        assert!(io.collision);
        assert_eq!(io.correct_outputs[0].len(), 2);
    }

    #[test]
    fn test_output_only_tasks_are_skipped() {
        let mut tasks = TaskSet::empty();
        tasks
            .add(Task::new("SQUARE", TaskFn::Output(|v| v == 4), 1.0))
            .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let bank = TaskIoBank::generate(&tasks, 1, true, 4, &mut rng);
        assert!(bank.get(0).unwrap().valid_outputs.is_empty());
    }
}
