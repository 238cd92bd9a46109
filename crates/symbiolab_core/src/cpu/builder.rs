//! Hand-written ancestor programs.
//!
//! A built program is a start anchor, padding no-ops, the requested task
//! routines and a trailing `Reproduce`, so execution falls from the anchor
//! through the padding into the useful code and wraps back round.

use rand::Rng;
use symbiolab_data::{Instruction, OpCode, Program, NUM_REGISTERS, START_TAG};

use crate::config::{AncestorKind, SymbiontType};

/// Slots a transfer spread is distributed over.
const SPREAD_SPAN: usize = 96;

#[derive(Clone, Debug, Default)]
pub struct ProgramBuilder {
    instructions: Vec<Instruction>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, op: OpCode, a: u8, b: u8, c: u8) -> Self {
        self.instructions.push(Instruction::with_args(op, a, b, c));
        self
    }

    pub fn op(self, op: OpCode) -> Self {
        self.add(op, 0, 0, 0)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    // sharedio r0; nand r0 r0 r0; sharedio r0
    pub fn add_not(self) -> Self {
        self.op(OpCode::SharedIO).op(OpCode::Nand).op(OpCode::SharedIO)
    }

    pub fn add_nand(self) -> Self {
        self.op(OpCode::SharedIO)
            .add(OpCode::SharedIO, 1, 0, 0)
            .add(OpCode::Nand, 0, 1, 0)
            .op(OpCode::SharedIO)
    }

    pub fn add_and(self) -> Self {
        self.op(OpCode::SharedIO)
            .add(OpCode::SharedIO, 1, 0, 0)
            .add(OpCode::Nand, 0, 1, 0)
            .add(OpCode::Nand, 0, 0, 0)
            .op(OpCode::SharedIO)
    }

    pub fn add_orn(self) -> Self {
        self.op(OpCode::SharedIO)
            .add(OpCode::SharedIO, 1, 0, 0)
            .add(OpCode::Nand, 0, 0, 0)
            .add(OpCode::Nand, 0, 1, 0)
            .op(OpCode::SharedIO)
    }

    pub fn add_or(self) -> Self {
        self.op(OpCode::SharedIO)
            .add(OpCode::SharedIO, 1, 0, 0)
            .add(OpCode::Nand, 0, 0, 0)
            .add(OpCode::Nand, 1, 1, 1)
            .add(OpCode::Nand, 0, 0, 1)
            .op(OpCode::SharedIO)
    }

    pub fn add_andn(self) -> Self {
        self.op(OpCode::SharedIO)
            .add(OpCode::SharedIO, 1, 0, 0)
            .add(OpCode::Nand, 1, 1, 1)
            .add(OpCode::Nand, 0, 0, 1)
            .add(OpCode::Nand, 0, 0, 0)
            .op(OpCode::SharedIO)
    }

    pub fn add_nor(self) -> Self {
        self.op(OpCode::SharedIO)
            .add(OpCode::SharedIO, 1, 0, 0)
            .add(OpCode::Nand, 0, 0, 0)
            .add(OpCode::Nand, 1, 1, 1)
            .add(OpCode::Nand, 0, 0, 1)
            .add(OpCode::Nand, 0, 0, 0)
            .op(OpCode::SharedIO)
    }

    pub fn add_xor(self) -> Self {
        self.op(OpCode::SharedIO)
            .add(OpCode::SharedIO, 1, 0, 0)
            .add(OpCode::Nand, 3, 1, 1)
            .add(OpCode::Nand, 3, 3, 0)
            .add(OpCode::Nand, 2, 0, 0)
            .add(OpCode::Nand, 2, 2, 1)
            .add(OpCode::Nand, 0, 2, 3)
            .op(OpCode::SharedIO)
    }

    pub fn add_equ(self) -> Self {
        self.op(OpCode::SharedIO)
            .add(OpCode::SharedIO, 1, 0, 0)
            .add(OpCode::Nand, 3, 1, 1)
            .add(OpCode::Nand, 3, 3, 0)
            .add(OpCode::Nand, 2, 0, 0)
            .add(OpCode::Nand, 2, 2, 1)
            .add(OpCode::Nand, 0, 2, 3)
            .add(OpCode::Nand, 0, 0, 0)
            .op(OpCode::SharedIO)
    }

    /// Routines for all nine logic tasks, in task order.
    pub fn add_all_logic(self) -> Self {
        self.add_not()
            .add_nand()
            .add_and()
            .add_orn()
            .add_or()
            .add_andn()
            .add_nor()
            .add_xor()
            .add_equ()
    }

    /// `count` copies of `op`, evenly spaced with no-ops.
    pub fn add_spread(mut self, op: OpCode, count: usize) -> Self {
        if count == 0 {
            return self;
        }
        let gap = (SPREAD_SPAN / count).saturating_sub(2);
        for _ in 0..count {
            self = self.op(op);
            for _ in 0..gap {
                self = self.op(OpCode::Nop);
            }
        }
        self
    }

    /// Start anchor, padding, the added routines, then `Reproduce`.
    pub fn build(self, length: usize) -> Program {
        self.op(OpCode::Reproduce).build_without_repro(length)
    }

    /// Same layout as [`Self::build`] minus the trailing `Reproduce`.
    pub fn build_without_repro(self, length: usize) -> Program {
        assert!(
            self.instructions.len() < length,
            "{} instructions leave no room for the start anchor in {length}",
            self.instructions.len()
        );
        let mut instructions = vec![Instruction::default(); length - self.instructions.len()];
        instructions[0] = Instruction::anchor(START_TAG);
        instructions.extend(self.instructions);
        Program::new(instructions)
    }
}

pub fn not_program(length: usize) -> Program {
    ProgramBuilder::new().add_not().build(length)
}

pub fn nand_program(length: usize) -> Program {
    ProgramBuilder::new().add_nand().build(length)
}

/// Nand routine behind `count` steals, clamped so the program still fits.
pub fn parasite_nand_program(length: usize, count: usize) -> Program {
    ProgramBuilder::new()
        .add_spread(OpCode::Steal, count.min(length.saturating_sub(6)))
        .add_nand()
        .build(length)
}

/// Nand routine behind `count` donations, clamped so the program still fits.
pub fn mutualist_nand_program(length: usize, count: usize) -> Program {
    ProgramBuilder::new()
        .add_spread(OpCode::Donate, count.min(length.saturating_sub(6)))
        .add_nand()
        .build(length)
}

/// An obligate mutualist: donates, never reproduces on its own.
pub fn obligate_mutualist_program(length: usize) -> Program {
    ProgramBuilder::new()
        .add_spread(OpCode::Donate, 5)
        .build_without_repro(length)
}

pub fn random_program<R: Rng + ?Sized>(length: usize, rng: &mut R) -> Program {
    let instructions = (0..length)
        .map(|_| {
            let op = OpCode::ALL[rng.gen_range(0..OpCode::COUNT)];
            Instruction {
                op,
                args: [(); 3].map(|_| rng.gen_range(0..NUM_REGISTERS as u8)),
                tag: rng.gen(),
            }
        })
        .collect();
    Program::new(instructions)
}

pub fn host_ancestor(kind: AncestorKind, length: usize) -> Program {
    match kind {
        AncestorKind::Not => not_program(length),
        AncestorKind::Nand => nand_program(length),
        AncestorKind::AllLogic => ProgramBuilder::new().add_all_logic().build(length),
    }
}

/// Symbiont ancestor. Transfer instructions are only seeded when the
/// donate/steal instructions are enabled.
pub fn symbiont_ancestor(
    kind: SymbiontType,
    transfers_enabled: bool,
    transfer_count: usize,
    length: usize,
) -> Program {
    match (transfers_enabled, kind) {
        (true, SymbiontType::Parasite) => parasite_nand_program(length, transfer_count),
        (true, SymbiontType::Mutualist) => mutualist_nand_program(length, transfer_count),
        _ => nand_program(length),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symbiolab_data::PROGRAM_LENGTH;

    #[test]
    fn test_build_layout() {
        let program = not_program(PROGRAM_LENGTH);
        assert_eq!(program.len(), PROGRAM_LENGTH);
        assert_eq!(program[0], Instruction::anchor(START_TAG));
        assert_eq!(program[96].op, OpCode::SharedIO);
        assert_eq!(program[97].op, OpCode::Nand);
        assert_eq!(program[98].op, OpCode::SharedIO);
        assert_eq!(program[99].op, OpCode::Reproduce);
        assert_eq!(program.count(OpCode::Nop), 95);
    }

    #[test]
    fn test_all_logic_fits() {
        let builder = ProgramBuilder::new().add_all_logic();
        assert_eq!(builder.len(), 53);
        let program = builder.build(PROGRAM_LENGTH);
        assert_eq!(program.count(OpCode::SharedIO), 26);
    }

    #[test]
    fn test_spread_clamped_to_length() {
        let program = parasite_nand_program(PROGRAM_LENGTH, 500);
        assert_eq!(program.len(), PROGRAM_LENGTH);
        assert_eq!(program.count(OpCode::Steal), 94);
        assert_eq!(program[0].op, OpCode::Anchor);
    }

    #[test]
    fn test_spread_gaps() {
        let program = mutualist_nand_program(PROGRAM_LENGTH, 4);
        assert_eq!(program.count(OpCode::Donate), 4);
        let donates: Vec<usize> = program
            .iter()
            .enumerate()
            .filter(|(_, i)| i.op == OpCode::Donate)
            .map(|(p, _)| p)
            .collect();
        assert!(donates.windows(2).all(|w| w[1] - w[0] == 23));
    }

    #[test]
    fn test_obligate_mutualist_never_reproduces() {
        let program = obligate_mutualist_program(PROGRAM_LENGTH);
        assert_eq!(program.count(OpCode::Reproduce), 0);
        assert_eq!(program.count(OpCode::Donate), 5);
    }

    #[test]
    fn test_symbiont_ancestor_by_type() {
        let parasite = symbiont_ancestor(SymbiontType::Parasite, true, 10, PROGRAM_LENGTH);
        assert_eq!(parasite.count(OpCode::Steal), 10);
        let neutral = symbiont_ancestor(SymbiontType::Parasite, false, 10, PROGRAM_LENGTH);
        assert_eq!(neutral, nand_program(PROGRAM_LENGTH));
    }

    #[test]
    #[should_panic(expected = "no room")]
    fn test_build_rejects_overfull_program() {
        ProgramBuilder::new().add_all_logic().build(40);
    }
}
