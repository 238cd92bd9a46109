//! Which tasks a genome can perform, measured by running it in isolation.

use symbiolab_data::Program;

use crate::cpu::{Cpu, CpuState, Peripheral};
use crate::tasks::{TaskBits, TaskFn, TaskIo, TaskSet};

/// Instructions a probe run gets unless asked otherwise.
pub const DEFAULT_PROBE_CYCLES: usize = 1_000;

/// Feeds a fixed environment's inputs in rotation and records every task an
/// output solves.
struct Probe<'a> {
    tasks: &'a TaskSet,
    io: &'a TaskIo,
    next_input: usize,
    performed: TaskBits,
}

impl Peripheral for Probe<'_> {
    fn output(&mut self, state: &mut CpuState, value: u32) {
        if value <= 1 {
            return;
        }
        for &id in self.io.task_ids(value) {
            if self.tasks.get(id).is_some_and(|t| t.check(&state.inputs, value)) {
                self.performed.set(id);
            }
        }
        for (id, task) in self.tasks.iter().enumerate() {
            if matches!(task.function, TaskFn::Output(_)) && task.check(&state.inputs, value) {
                self.performed.set(id);
            }
        }
    }

    fn input(&mut self, _state: &mut CpuState) -> u32 {
        if self.io.inputs.is_empty() {
            return 0;
        }
        let value = self.io.inputs[self.next_input % self.io.inputs.len()];
        self.next_input += 1;
        value
    }
}

/// Runs `program` for `cycles` instructions against `io` and reports every
/// task its outputs solved. Credit policies and used sets play no part.
pub fn tasks_performable(
    program: &Program,
    tasks: &TaskSet,
    io: &TaskIo,
    cycles: usize,
) -> TaskBits {
    let mut cpu = Cpu::new(program.clone(), tasks.len(), 0);
    let mut probe = Probe {
        tasks,
        io,
        next_input: 0,
        performed: TaskBits::default(),
    };
    cpu.run_step(None, cycles, &mut probe);
    probe.performed
}
