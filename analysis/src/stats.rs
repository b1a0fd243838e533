use std::ops::Index;

use strum::{EnumCount, IntoEnumIterator};

use crate::Op;

/// Per-operation occurrence counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpHistogram {
    counts: [u64; Op::COUNT],
}

impl Default for OpHistogram {
    fn default() -> Self {
        OpHistogram {
            counts: [0; Op::COUNT],
        }
    }
}

impl OpHistogram {
    pub(crate) fn record(&mut self, op: Op) {
        self.counts[op.index()] += 1;
    }

    pub fn count(&self, op: Op) -> u64 {
        self.counts[op.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Nonzero counts in operation-code order.
    pub fn nonzero(&self) -> impl Iterator<Item = (Op, u64)> + '_ {
        Op::iter()
            .map(|op| (op, self.count(op)))
            .filter(|&(_, count)| count != 0)
    }
}

impl Index<Op> for OpHistogram {
    type Output = u64;

    fn index(&self, op: Op) -> &Self::Output {
        &self.counts[op.index()]
    }
}

/// Multiplies a raw count by `factor`, rounding half up.
pub fn scaled(count: u64, factor: f64) -> u64 {
    (count as f64 * factor + 0.5) as u64
}
