//! Predefined task functions, looked up by name from configuration.

use super::TaskFn;

/// Reward the logic tasks carry unless configured otherwise.
pub const LOGIC_REWARD: f64 = 5.0;

/// The nine logic tasks in checking order.
pub const LOGIC_TASKS: [&str; 9] = ["NOT", "NAND", "AND", "ORN", "OR", "ANDN", "NOR", "XOR", "EQU"];

fn is_square(output: u32) -> bool {
    let root = (output as f64).sqrt() as u32;
    (root.saturating_sub(1)..=root + 1).any(|r| r >= 2 && r.checked_mul(r) == Some(output))
}

pub fn lookup(name: &str) -> Option<TaskFn> {
    let function = match name.to_ascii_uppercase().as_str() {
        "NOT" => TaskFn::Unary(|a| !a),
        "NAND" => TaskFn::Binary(|a, b| !(a & b)),
        "AND" => TaskFn::Binary(|a, b| a & b),
        "ORN" => TaskFn::Binary(|a, b| a | !b),
        "OR" => TaskFn::Binary(|a, b| a | b),
        "ANDN" => TaskFn::Binary(|a, b| a & !b),
        "NOR" => TaskFn::Binary(|a, b| !(a | b)),
        "XOR" => TaskFn::Binary(|a, b| a ^ b),
        "EQU" => TaskFn::Binary(|a, b| !(a ^ b)),
        "SQUARE" => TaskFn::Output(is_square),
        _ => return None,
    };
    Some(function)
}
