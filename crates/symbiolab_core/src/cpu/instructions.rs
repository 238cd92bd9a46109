//! The instruction library.
//!
//! Every opcode is executed by one arm of [`execute`]. Register-only opcodes
//! are pure functions of their operands; the rest reach the outside world
//! through a [`Peripheral`].

use rand::Rng;
use symbiolab_data::{Instruction, OpCode, NUM_REGISTERS};

use super::state::CpuState;

/// What a running program can see beyond its own registers and state.
///
/// The world hands each CPU a peripheral wired to the organism's balance,
/// its partner and the reproduction queue. Analysis code wires it to a
/// recorder instead.
pub trait Peripheral {
    /// Called with the register value a `SharedIO` emits.
    fn output(&mut self, state: &mut CpuState, value: u32);

    /// Next input value delivered to the program.
    fn input(&mut self, state: &mut CpuState) -> u32 {
        state.rng().gen()
    }

    /// Called when `Reproduce` runs on a placed organism that is not already
    /// queued.
    fn reproduce(&mut self, _state: &mut CpuState) {}

    fn donate(&mut self, _state: &mut CpuState) {}

    fn steal(&mut self, _state: &mut CpuState) {}
}

/// Peripheral for a CPU running outside any world: outputs go nowhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct Detached;

impl Peripheral for Detached {
    fn output(&mut self, _state: &mut CpuState, _value: u32) {}
}

pub type Registers = [u32; NUM_REGISTERS];

/// Executes one instruction. Returns the jump destination when control is
/// transferred; the caller advances sequentially otherwise.
///
/// `target` is the pre-resolved anchor position for jump instructions.
pub fn execute<P: Peripheral + ?Sized>(
    inst: &Instruction,
    target: Option<usize>,
    regs: &mut Registers,
    state: &mut CpuState,
    port: &mut P,
) -> Option<usize> {
    let (a, b, c) = (inst.reg(0), inst.reg(1), inst.reg(2));
    match inst.op {
        OpCode::Nop | OpCode::Anchor => {}
        OpCode::ShiftLeft => regs[a] <<= 1,
        OpCode::ShiftRight => regs[a] >>= 1,
        OpCode::Increment => regs[a] = regs[a].wrapping_add(1),
        OpCode::Decrement => regs[a] = regs[a].wrapping_sub(1),
        OpCode::Add => regs[a] = regs[b].wrapping_add(regs[c]),
        OpCode::Subtract => regs[a] = regs[b].wrapping_sub(regs[c]),
        OpCode::Nand => regs[a] = !(regs[b] & regs[c]),
        OpCode::Push => {
            state.stacks.push(regs[a]);
        }
        OpCode::Pop => regs[a] = state.stacks.pop().unwrap_or(0),
        OpCode::SwapStack => state.stacks.swap_active(),
        OpCode::Swap => regs.swap(a, b),
        OpCode::JumpIfNEq => {
            if regs[a] != regs[b] {
                return target;
            }
        }
        OpCode::JumpIfLess => {
            if regs[a] < regs[b] {
                return target;
            }
        }
        OpCode::Reproduce => {
            if state.repro_slot().is_none() && state.location().is_some() {
                port.reproduce(state);
            }
        }
        OpCode::PrivateIO => {
            let input = port.input(state);
            regs[a] = input;
            state.inputs.push(input);
        }
        OpCode::SharedIO => {
            port.output(state, regs[a]);
            let input = port.input(state);
            regs[a] = input;
            state.inputs.push(input);
        }
        OpCode::Donate => port.donate(state),
        OpCode::Steal => port.steal(state),
    }
    None
}
