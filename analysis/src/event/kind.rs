use ahash::AHashMap;
use once_cell::sync::Lazy;
use strum::IntoEnumIterator;
use strum_macros::{EnumCount, EnumIter};

use crate::Op;

/// Leading token of a trace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumIter)]
pub enum EventKind {
    EngineConstructed,
    EngineDestructed,
    Enter,
    Leave,
    ValueConstructed,
    ValueDestructed,
    Op1,
    Op2,
    Op3,
    Op4,
    Op1Int,
    Op1Float,
    Op2Int,
    Op2Float,
}

impl EventKind {
    /// Spellings accepted for this kind: the engine's own token first.
    pub const fn tokens(self) -> &'static [&'static str] {
        match self {
            EventKind::EngineConstructed => &["cordic_constructed", "EngineConstructed"],
            EventKind::EngineDestructed => &["cordic_destructed", "EngineDestructed"],
            EventKind::Enter => &["enter", "Enter"],
            EventKind::Leave => &["leave", "Leave"],
            EventKind::ValueConstructed => &["constructed", "ValueConstructed"],
            EventKind::ValueDestructed => &["destructed", "ValueDestructed"],
            EventKind::Op1 => &["op1", "Op1"],
            EventKind::Op2 => &["op2", "Op2"],
            EventKind::Op3 => &["op3", "Op3"],
            EventKind::Op4 => &["op4", "Op4"],
            EventKind::Op1Int => &["op1i", "Op1i", "Op1Int"],
            EventKind::Op1Float => &["op1f", "Op1f", "Op1Float"],
            EventKind::Op2Int => &["op2i", "Op2i", "Op2Int"],
            EventKind::Op2Float => &["op2f", "Op2f", "Op2Float"],
        }
    }

    /// Operand count of the plain `opN` kinds.
    pub const fn operand_count(self) -> Option<usize> {
        match self {
            EventKind::Op1 => Some(1),
            EventKind::Op2 => Some(2),
            EventKind::Op3 => Some(3),
            EventKind::Op4 => Some(4),
            _ => None,
        }
    }
}

/// Result of classifying a leading token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    Kind(EventKind),
    /// Not an event this analyzer knows; the line is skipped.
    Unrecognized,
}

/// Token tables for event kinds and operation names.
///
/// Built once and shared read-only by every replay.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    kinds: AHashMap<&'static str, EventKind>,
    ops: AHashMap<&'static str, Op>,
}

static STANDARD: Lazy<Vocabulary> = Lazy::new(Vocabulary::build);

impl Vocabulary {
    /// The vocabulary emitted by the CORDIC engine's logger.
    pub fn standard() -> &'static Vocabulary {
        &STANDARD
    }

    fn build() -> Self {
        let kinds = EventKind::iter()
            .flat_map(|kind| kind.tokens().iter().map(move |&token| (token, kind)))
            .collect();
        let ops = Op::iter().map(|op| (op.name(), op)).collect();
        Self { kinds, ops }
    }

    pub fn classify(&self, token: &str) -> Classified {
        self.kinds
            .get(token)
            .map_or(Classified::Unrecognized, |&kind| Classified::Kind(kind))
    }

    pub fn op(&self, name: &str) -> Option<Op> {
        self.ops.get(name).copied()
    }
}
