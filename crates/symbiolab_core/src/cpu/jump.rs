//! Tag-based control flow.
//!
//! Jumps name a tag, not an address. The target is the anchor whose tag is
//! nearest by Hamming distance, provided it is within a third of the tag
//! width. Anything farther is treated as no match and the jump falls through.

use symbiolab_data::{OpCode, Program, Tag};

/// Largest Hamming distance that still counts as a match.
pub const MATCH_THRESHOLD: u32 = Tag::BITS / 3;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JumpTable {
    anchors: Vec<(usize, Tag)>,
}

impl JumpTable {
    pub fn build(program: &Program) -> Self {
        let anchors = program
            .iter()
            .enumerate()
            .filter(|(_, inst)| inst.op == OpCode::Anchor)
            .map(|(pos, inst)| (pos, inst.tag))
            .collect();
        Self { anchors }
    }

    /// Position of the best-matching anchor. Ties go to the earliest anchor.
    pub fn resolve(&self, tag: Tag) -> Option<usize> {
        self.anchors
            .iter()
            .map(|&(pos, anchor)| ((anchor ^ tag).count_ones(), pos))
            .filter(|&(distance, _)| distance <= MATCH_THRESHOLD)
            .min()
            .map(|(_, pos)| pos)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Anchor positions in program order.
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.anchors.iter().map(|&(pos, _)| pos)
    }

    /// Resolved target for every instruction; `None` for non-jumps and
    /// jumps without a match.
    pub fn targets(&self, program: &Program) -> Vec<Option<usize>> {
        program
            .iter()
            .map(|inst| {
                if inst.op.is_jump() {
                    self.resolve(inst.tag)
                } else {
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symbiolab_data::{Instruction, START_TAG};

    fn program_with_anchors(anchors: &[(usize, Tag)]) -> Program {
        let mut program = Program::blank(16);
        for &(pos, tag) in anchors {
            program.as_mut_slice()[pos] = Instruction::anchor(tag);
        }
        program
    }

    #[test]
    fn test_exact_and_near_match() {
        let table = JumpTable::build(&program_with_anchors(&[(2, 0), (9, START_TAG)]));
        assert_eq!(table.resolve(START_TAG), Some(9));
        assert_eq!(table.resolve(0b111), Some(2));
        assert_eq!(table.resolve(START_TAG ^ 0xFF), Some(9));
    }

    #[test]
    fn test_no_match_beyond_threshold() {
        let table = JumpTable::build(&program_with_anchors(&[(4, 0)]));
        let far = (1u64 << (MATCH_THRESHOLD + 1)) - 1;
        assert_eq!(table.resolve(far), None);
        let edge = (1u64 << MATCH_THRESHOLD) - 1;
        assert_eq!(table.resolve(edge), Some(4));
    }

    #[test]
    fn test_tie_goes_to_earliest_anchor() {
        let table = JumpTable::build(&program_with_anchors(&[(5, 0b01), (11, 0b10)]));
        assert_eq!(table.resolve(0), Some(5));
    }

    #[test]
    fn test_targets_only_for_jumps() {
        let mut program = program_with_anchors(&[(0, START_TAG)]);
        program.as_mut_slice()[3] = Instruction::jump(OpCode::JumpIfNEq, 0, 1, START_TAG);
        program.as_mut_slice()[4] = Instruction::jump(OpCode::JumpIfLess, 0, 1, 0);
        let targets = JumpTable::build(&program).targets(&program);
        assert_eq!(targets[3], Some(0));
        assert_eq!(targets[4], None);
        assert_eq!(targets[0], None);
    }
}
