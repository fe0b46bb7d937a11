//! Skill allocation rule
//!
//! A finished sheet spreads 8 points as one +1, two +2s and one +3.
//! The check is advisory: it drives a banner, never blocks storage.

/// Banner text shown while the allocation is invalid
pub const ALLOCATION_RULE: &str =
    "Allocation Rule: You must have exactly one +1, two +2s, and one +3.";

/// Required point total
pub const ALLOCATION_TOTAL: u8 = 8;

/// The four quadrant skill scores, each in `0..=3`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkillScores {
    pub heart: u8,
    pub soul: u8,
    pub mind: u8,
    pub strength: u8,
}

impl SkillScores {
    pub fn new(heart: u8, soul: u8, mind: u8, strength: u8) -> Self {
        Self {
            heart,
            soul,
            mind,
            strength,
        }
    }

    pub fn as_array(&self) -> [u8; 4] {
        [self.heart, self.soul, self.mind, self.strength]
    }
}

/// Tally of nonzero scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocationSummary {
    pub ones: usize,
    pub twos: usize,
    pub threes: usize,
    pub total: u32,
}

impl AllocationSummary {
    pub fn is_valid(&self) -> bool {
        self.ones == 1
            && self.twos == 2
            && self.threes == 1
            && self.total == u32::from(ALLOCATION_TOTAL)
    }
}

/// Count the nonzero scores by value. Zeros never count toward the rule.
pub fn summarize(scores: &SkillScores) -> AllocationSummary {
    scores
        .as_array()
        .into_iter()
        .filter(|&v| v > 0)
        .fold(AllocationSummary::default(), |mut acc, v| {
            match v {
                1 => acc.ones += 1,
                2 => acc.twos += 1,
                3 => acc.threes += 1,
                _ => {}
            }
            acc.total += u32::from(v);
            acc
        })
}

/// Exactly one 1, two 2s, one 3, summing to 8
pub fn is_valid_allocation(scores: &SkillScores) -> bool {
    summarize(scores).is_valid()
}
