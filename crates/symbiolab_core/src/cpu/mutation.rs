//! Point mutation of programs.

use rand::Rng;
use symbiolab_data::{OpCode, Program, NUM_REGISTERS};

/// Bits per register operand.
const OPERAND_BITS: u32 = NUM_REGISTERS.trailing_zeros();

/// Flips every encoded bit of `program` independently with probability
/// `per_bit_rate` and returns how many bits changed.
///
/// Opcodes that land outside the catalog become `Nop`. Operands are kept
/// to register width so every instruction stays executable, and the length
/// never changes.
pub fn mutate_program<R: Rng + ?Sized>(
    program: &mut Program,
    per_bit_rate: f64,
    rng: &mut R,
) -> usize {
    if per_bit_rate <= 0.0 {
        return 0;
    }
    let rate = per_bit_rate.min(1.0);
    let mut flips = 0;

    for inst in program.as_mut_slice() {
        let mut op = inst.op as u8;
        for bit in 0..OpCode::BITS {
            if rng.gen_bool(rate) {
                op ^= 1 << bit;
                flips += 1;
            }
        }
        inst.op = OpCode::from_u8(op).unwrap_or(OpCode::Nop);

        for arg in &mut inst.args {
            for bit in 0..OPERAND_BITS {
                if rng.gen_bool(rate) {
                    *arg ^= 1 << bit;
                    flips += 1;
                }
            }
        }

        for bit in 0..u64::BITS {
            if rng.gen_bool(rate) {
                inst.tag ^= 1 << bit;
                flips += 1;
            }
        }
    }
    flips
}
