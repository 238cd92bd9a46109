use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

/// Tags are compared by Hamming distance when resolving jumps.
pub type Tag = u64;

/// Number of general purpose registers in a core.
pub const NUM_REGISTERS: usize = 8;

/// Length every program is built with.
pub const PROGRAM_LENGTH: usize = 100;

/// Tag the start anchor carries. Execution begins at the anchor closest to it.
pub const START_TAG: Tag = u64::MAX;

/// The closed instruction catalog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OpCode {
    #[default]
    Nop = 0,
    ShiftLeft,
    ShiftRight,
    Increment,
    Decrement,
    Add,
    Subtract,
    Nand,
    Push,
    Pop,
    SwapStack,
    Swap,
    JumpIfNEq,
    JumpIfLess,
    Anchor,
    Reproduce,
    PrivateIO,
    SharedIO,
    Donate,
    Steal,
}

impl OpCode {
    pub const ALL: [OpCode; 20] = [
        OpCode::Nop,
        OpCode::ShiftLeft,
        OpCode::ShiftRight,
        OpCode::Increment,
        OpCode::Decrement,
        OpCode::Add,
        OpCode::Subtract,
        OpCode::Nand,
        OpCode::Push,
        OpCode::Pop,
        OpCode::SwapStack,
        OpCode::Swap,
        OpCode::JumpIfNEq,
        OpCode::JumpIfLess,
        OpCode::Anchor,
        OpCode::Reproduce,
        OpCode::PrivateIO,
        OpCode::SharedIO,
        OpCode::Donate,
        OpCode::Steal,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Bits needed to encode any opcode. Mutation flips within this width.
    pub const BITS: u32 = 5;

    pub fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            OpCode::Nop => "Nop",
            OpCode::ShiftLeft => "ShiftLeft",
            OpCode::ShiftRight => "ShiftRight",
            OpCode::Increment => "Increment",
            OpCode::Decrement => "Decrement",
            OpCode::Add => "Add",
            OpCode::Subtract => "Subtract",
            OpCode::Nand => "Nand",
            OpCode::Push => "Push",
            OpCode::Pop => "Pop",
            OpCode::SwapStack => "SwapStack",
            OpCode::Swap => "Swap",
            OpCode::JumpIfNEq => "JumpIfNEq",
            OpCode::JumpIfLess => "JumpIfLess",
            OpCode::Anchor => "Anchor",
            OpCode::Reproduce => "Reproduce",
            OpCode::PrivateIO => "PrivateIO",
            OpCode::SharedIO => "SharedIO",
            OpCode::Donate => "Donate",
            OpCode::Steal => "Steal",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.name().eq_ignore_ascii_case(name))
    }

    /// How many register operands the instruction reads or writes.
    pub fn arity(self) -> usize {
        match self {
            OpCode::Nop
            | OpCode::SwapStack
            | OpCode::Anchor
            | OpCode::Reproduce
            | OpCode::Donate
            | OpCode::Steal => 0,
            OpCode::ShiftLeft
            | OpCode::ShiftRight
            | OpCode::Increment
            | OpCode::Decrement
            | OpCode::Push
            | OpCode::Pop
            | OpCode::PrivateIO
            | OpCode::SharedIO => 1,
            OpCode::Swap | OpCode::JumpIfNEq | OpCode::JumpIfLess => 2,
            OpCode::Add | OpCode::Subtract | OpCode::Nand => 3,
        }
    }

    pub fn is_jump(self) -> bool {
        matches!(self, OpCode::JumpIfNEq | OpCode::JumpIfLess)
    }

    /// Whether the tag field means anything for this opcode.
    pub fn uses_tag(self) -> bool {
        self.is_jump() || self == OpCode::Anchor
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One (opcode, operand[3], tag) record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    pub op: OpCode,
    pub args: [u8; 3],
    pub tag: Tag,
}

impl Instruction {
    pub fn new(op: OpCode) -> Self {
        Self {
            op,
            args: [0; 3],
            tag: 0,
        }
    }

    /// Panics if any operand does not name a register.
    pub fn with_args(op: OpCode, a: u8, b: u8, c: u8) -> Self {
        for arg in [a, b, c] {
            assert!(
                (arg as usize) < NUM_REGISTERS,
                "register operand {arg} out of range"
            );
        }
        Self {
            op,
            args: [a, b, c],
            tag: 0,
        }
    }

    pub fn anchor(tag: Tag) -> Self {
        Self {
            op: OpCode::Anchor,
            args: [0; 3],
            tag,
        }
    }

    pub fn jump(op: OpCode, a: u8, b: u8, tag: Tag) -> Self {
        assert!(op.is_jump(), "{op} is not a jump");
        Self {
            tag,
            ..Self::with_args(op, a, b, 0)
        }
    }

    #[inline]
    pub fn reg(&self, operand: usize) -> usize {
        self.args[operand] as usize % NUM_REGISTERS
    }
}

/// A fixed-length instruction sequence.
///
/// The length is set at construction; nothing can push or remove
/// instructions afterwards, only rewrite them in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// A program of `len` no-ops.
    pub fn blank(len: usize) -> Self {
        Self {
            instructions: vec![Instruction::default(); len],
        }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    pub fn as_slice(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn as_mut_slice(&mut self) -> &mut [Instruction] {
        &mut self.instructions
    }

    pub fn count(&self, op: OpCode) -> usize {
        self.instructions.iter().filter(|i| i.op == op).count()
    }
}

impl Index<usize> for Program {
    type Output = Instruction;

    fn index(&self, index: usize) -> &Instruction {
        &self.instructions[index]
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}
