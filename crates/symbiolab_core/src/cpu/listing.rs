use std::fmt;

use symbiolab_data::{OpCode, Program};

use super::jump::JumpTable;

/// Human-readable disassembly of a program.
///
/// Anchors are labelled `A`, `B`, ... `Z`, `AA`, ... in program order and
/// jumps print the label they resolve to.
pub struct Listing<'a> {
    program: &'a Program,
    table: JumpTable,
}

impl<'a> Listing<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self {
            program,
            table: JumpTable::build(program),
        }
    }

    fn label_of(&self, position: usize) -> Option<String> {
        self.table
            .positions()
            .position(|p| p == position)
            .map(anchor_label)
    }
}

fn anchor_label(mut rank: usize) -> String {
    let mut label = Vec::new();
    loop {
        label.push(b'A' + (rank % 26) as u8);
        if rank < 26 {
            break;
        }
        rank = rank / 26 - 1;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pos, inst) in self.program.iter().enumerate() {
            if inst.op == OpCode::Anchor {
                let label = self.label_of(pos).unwrap_or_default();
                writeln!(f, "{label}:")?;
                continue;
            }
            let name = inst.op.name().to_ascii_lowercase();
            let operands: Vec<String> = (0..inst.op.arity())
                .map(|i| format!("r{}", inst.reg(i)))
                .collect();
            let mut line = format!("    {name:<11}{}", operands.join(", "));
            if inst.op.is_jump() {
                let target = self
                    .table
                    .resolve(inst.tag)
                    .and_then(|p| self.label_of(p))
                    .unwrap_or_else(|| "<nowhere>".to_string());
                line.push_str(&format!(" -> {target}"));
            }
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::builder::not_program;
    use symbiolab_data::{Instruction, START_TAG};

    #[test]
    fn test_anchor_labels() {
        assert_eq!(anchor_label(0), "A");
        assert_eq!(anchor_label(25), "Z");
        assert_eq!(anchor_label(26), "AA");
        assert_eq!(anchor_label(27), "AB");
        assert_eq!(anchor_label(52), "BA");
    }

    #[test]
    fn test_not_program_listing() {
        let program = not_program(8);
        let text = Listing::new(&program).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "A:",
                "    nop",
                "    nop",
                "    nop",
                "    sharedio   r0",
                "    nand       r0, r0, r0",
                "    sharedio   r0",
                "    reproduce",
            ]
        );
    }

    #[test]
    fn test_jump_targets_rendered() {
        let mut program = Program::blank(3);
        program.as_mut_slice()[0] = Instruction::anchor(START_TAG);
        program.as_mut_slice()[1] = Instruction::jump(OpCode::JumpIfNEq, 0, 1, START_TAG);
        program.as_mut_slice()[2] = Instruction::jump(OpCode::JumpIfLess, 2, 3, 0);
        let text = Listing::new(&program).to_string();
        assert!(text.contains("jumpifneq  r0, r1 -> A"));
        assert!(text.contains("jumpifless r2, r3 -> <nowhere>"));
    }
}
