//! The per-organism virtual CPU.
//!
//! A [`Cpu`] owns one program, one register core and one [`CpuState`]. It is
//! stepped a fixed number of instructions per tick; the program counter wraps
//! at the end of the program so a genome runs as a loop.

pub mod builder;
pub mod instructions;
pub mod jump;
pub mod listing;
pub mod mutation;
pub mod state;

use rand::Rng;
use symbiolab_data::{Program, WorldPosition, NUM_REGISTERS, START_TAG};

pub use instructions::{Detached, Peripheral, Registers};
pub use jump::JumpTable;
pub use listing::Listing;
pub use state::{CpuState, IoRingBuffer, Niche, Stacks, TaskLineage};

#[derive(Clone, Debug)]
pub struct Cpu {
    program: Program,
    registers: Registers,
    pc: usize,
    /// Pre-resolved destination of every jump instruction.
    jump_targets: Vec<Option<usize>>,
    entry: usize,
    launched: bool,
    pub state: CpuState,
}

impl Cpu {
    pub fn new(program: Program, num_tasks: usize, seed: u64) -> Self {
        let mut cpu = Self {
            program,
            registers: [0; NUM_REGISTERS],
            pc: 0,
            jump_targets: Vec::new(),
            entry: 0,
            launched: false,
            state: CpuState::new(num_tasks, seed),
        };
        cpu.resolve_anchors();
        cpu
    }

    fn resolve_anchors(&mut self) {
        let table = JumpTable::build(&self.program);
        self.jump_targets = table.targets(&self.program);
        self.entry = table.resolve(START_TAG).unwrap_or(0);
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Where execution begins on the first step.
    pub fn entry(&self) -> usize {
        self.entry
    }

    /// Executes `budget` instructions and returns how many ran.
    ///
    /// The first call launches the core at the anchor nearest the start tag.
    pub fn run_step<P: Peripheral + ?Sized>(
        &mut self,
        location: Option<WorldPosition>,
        budget: usize,
        port: &mut P,
    ) -> usize {
        let len = self.program.len();
        if len == 0 {
            return 0;
        }
        if !self.launched {
            self.pc = self.entry;
            self.launched = true;
        }
        self.state.set_location(location);

        for _ in 0..budget {
            let pc = self.pc;
            let jumped = instructions::execute(
                &self.program[pc],
                self.jump_targets[pc],
                &mut self.registers,
                &mut self.state,
                port,
            );
            self.state.cycles_since_repro += 1;
            self.pc = jumped.unwrap_or(pc + 1) % len;
        }
        budget
    }

    /// Applies per-bit point mutations and re-resolves every anchor.
    pub fn mutate<R: Rng + ?Sized>(&mut self, per_bit_rate: f64, rng: &mut R) -> usize {
        let flips = mutation::mutate_program(&mut self.program, per_bit_rate, rng);
        if flips > 0 {
            self.resolve_anchors();
        }
        flips
    }

    /// A fresh CPU running a copy of this program.
    pub fn offspring(&self, seed: u64) -> Cpu {
        Cpu::new(self.program.clone(), self.state.num_tasks(), seed)
    }

    pub fn listing(&self) -> Listing<'_> {
        Listing::new(&self.program)
    }
}
