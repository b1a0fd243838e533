//! Trace events and the sink interface they are delivered through.
//!
//! A text trace line parses into a [`TraceEvent`], which borrows its names
//! from the line. Events reach the analysis through the [`EventSink`] trait,
//! which an instrumented engine can also call directly while it runs; both
//! paths end in the same invariant checks.

mod kind;

use smallvec::SmallVec;
use tracing::instrument;

pub use self::kind::{Classified, EventKind, Vocabulary};
use crate::{
    memory::{Address, EngineConfig},
    parser::Cursor,
    AnalysisError, Op,
};

/// Receiver of engine events, one method per event kind.
pub trait EventSink {
    fn engine_constructed(
        &mut self,
        engine: Address,
        config: EngineConfig,
    ) -> Result<(), AnalysisError>;

    fn engine_destructed(&mut self, engine: Address) -> Result<(), AnalysisError>;

    fn enter(&mut self, name: &str) -> Result<(), AnalysisError>;

    fn leave(&mut self, name: &str) -> Result<(), AnalysisError>;

    /// `engine` is 0 for a raw value owned by no engine.
    fn value_constructed(&mut self, value: Address, engine: Address) -> Result<(), AnalysisError>;

    fn value_destructed(&mut self, value: Address) -> Result<(), AnalysisError>;

    /// An operation over one to four value operands.
    fn op(&mut self, op: Op, operands: &[Address]) -> Result<(), AnalysisError>;

    fn op1_int(&mut self, op: Op, literal: i64) -> Result<(), AnalysisError>;

    fn op1_float(&mut self, op: Op, literal: f64) -> Result<(), AnalysisError>;

    fn op2_int(&mut self, op: Op, value: Address, literal: i64) -> Result<(), AnalysisError>;

    fn op2_float(&mut self, op: Op, value: Address, literal: f64) -> Result<(), AnalysisError>;
}

/// One parsed trace line.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent<'a> {
    EngineConstructed {
        engine: Address,
        config: EngineConfig,
    },
    EngineDestructed {
        engine: Address,
    },
    Enter {
        name: &'a str,
    },
    Leave {
        name: &'a str,
    },
    ValueConstructed {
        value: Address,
        engine: Address,
    },
    ValueDestructed {
        value: Address,
    },
    Op {
        op: &'a str,
        operands: SmallVec<[Address; 4]>,
    },
    Op1Int {
        op: &'a str,
        literal: i64,
    },
    Op1Float {
        op: &'a str,
        literal: f64,
    },
    Op2Int {
        op: &'a str,
        value: Address,
        literal: i64,
    },
    Op2Float {
        op: &'a str,
        value: Address,
        literal: f64,
    },
}

impl<'a> TraceEvent<'a> {
    /// Parses one line. Returns `None` for lines that carry no known event,
    /// including lines that do not start with a name token at all.
    pub fn parse(
        line: &'a str,
        vocab: &Vocabulary,
        strict_addresses: bool,
    ) -> Result<Option<Self>, AnalysisError> {
        let mut c = Cursor::new(line).strict(strict_addresses);
        let Ok(leading) = c.read_name() else {
            return Ok(None);
        };
        let kind = match vocab.classify(leading) {
            Classified::Kind(kind) => kind,
            Classified::Unrecognized => return Ok(None),
        };

        let event = match kind {
            EventKind::EngineConstructed => TraceEvent::EngineConstructed {
                engine: c.read_address()?,
                config: EngineConfig {
                    int_w: c.read_integer()?,
                    frac_w: c.read_integer()?,
                    guard_w: c.read_integer()?,
                    n: c.read_integer()?,
                },
            },
            EventKind::EngineDestructed => TraceEvent::EngineDestructed {
                engine: c.read_address()?,
            },
            EventKind::Enter => TraceEvent::Enter {
                name: c.read_name()?,
            },
            EventKind::Leave => TraceEvent::Leave {
                name: c.read_name()?,
            },
            EventKind::ValueConstructed => TraceEvent::ValueConstructed {
                value: c.read_address()?,
                engine: c.read_address()?,
            },
            EventKind::ValueDestructed => TraceEvent::ValueDestructed {
                value: c.read_address()?,
            },
            EventKind::Op1 | EventKind::Op2 | EventKind::Op3 | EventKind::Op4 => {
                let op = c.read_name()?;
                let count = kind.operand_count().unwrap_or_default();
                let operands = (0..count)
                    .map(|_| c.read_address())
                    .collect::<Result<_, _>>()?;
                TraceEvent::Op { op, operands }
            }
            EventKind::Op1Int => TraceEvent::Op1Int {
                op: c.read_name()?,
                literal: c.read_integer()?,
            },
            EventKind::Op1Float => TraceEvent::Op1Float {
                op: c.read_name()?,
                literal: c.read_float()?,
            },
            EventKind::Op2Int => TraceEvent::Op2Int {
                op: c.read_name()?,
                value: c.read_address()?,
                literal: c.read_integer()?,
            },
            EventKind::Op2Float => TraceEvent::Op2Float {
                op: c.read_name()?,
                value: c.read_address()?,
                literal: c.read_float()?,
            },
        };
        Ok(Some(event))
    }

    /// Delivers this event to `sink`, resolving operation names on the way.
    #[instrument(level = "trace", skip_all)]
    pub fn dispatch<S: EventSink + ?Sized>(
        &self,
        sink: &mut S,
        vocab: &Vocabulary,
    ) -> Result<(), AnalysisError> {
        let resolve = |name: &str| {
            vocab
                .op(name)
                .ok_or_else(|| AnalysisError::UnknownOperation(name.to_string()))
        };

        match self {
            TraceEvent::EngineConstructed { engine, config } => {
                sink.engine_constructed(*engine, *config)
            }
            TraceEvent::EngineDestructed { engine } => sink.engine_destructed(*engine),
            TraceEvent::Enter { name } => sink.enter(name),
            TraceEvent::Leave { name } => sink.leave(name),
            TraceEvent::ValueConstructed { value, engine } => {
                sink.value_constructed(*value, *engine)
            }
            TraceEvent::ValueDestructed { value } => sink.value_destructed(*value),
            TraceEvent::Op { op, operands } => sink.op(resolve(*op)?, operands),
            TraceEvent::Op1Int { op, literal } => sink.op1_int(resolve(*op)?, *literal),
            TraceEvent::Op1Float { op, literal } => sink.op1_float(resolve(*op)?, *literal),
            TraceEvent::Op2Int { op, value, literal } => {
                sink.op2_int(resolve(*op)?, *value, *literal)
            }
            TraceEvent::Op2Float { op, value, literal } => {
                sink.op2_float(resolve(*op)?, *value, *literal)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;

    fn parse(line: &str) -> Option<TraceEvent<'_>> {
        TraceEvent::parse(line, Vocabulary::standard(), false).unwrap()
    }

    #[test]
    fn test_parse_events() {
        assert_eq!(
            parse("cordic_constructed 0x1 32 32 0 16"),
            Some(TraceEvent::EngineConstructed {
                engine: 1,
                config: EngineConfig {
                    int_w: 32,
                    frac_w: 32,
                    guard_w: 0,
                    n: 16,
                },
            })
        );
        assert_eq!(
            parse("enter Cordic::sin"),
            Some(TraceEvent::Enter { name: "Cordic::sin" })
        );
        assert_eq!(
            parse("constructed 0x7ffd10 0"),
            Some(TraceEvent::ValueConstructed {
                value: 0x7ffd10,
                engine: 0,
            })
        );
        assert_eq!(
            parse("op3 sincos(0x10, 0x20, 0x30)"),
            Some(TraceEvent::Op {
                op: "sincos",
                operands: smallvec![0x10, 0x20, 0x30],
            })
        );
        assert_eq!(
            parse("op2i pop_value 0x20 -1024"),
            Some(TraceEvent::Op2Int {
                op: "pop_value",
                value: 0x20,
                literal: -1024,
            })
        );
        assert_eq!(
            parse("Op2f push_constant 0x10 2.75"),
            Some(TraceEvent::Op2Float {
                op: "push_constant",
                value: 0x10,
                literal: 2.75,
            })
        );
    }

    #[test]
    fn test_skipped_lines() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse("Wrote stats to log.{out,csv}"), None);
        assert_eq!(parse("checkpoint 0x10"), None);
        assert_eq!(parse("#"), None);
        assert_eq!(parse("# enter f"), None);
        assert_eq!(parse("(0x10)"), None);
    }

    #[test]
    fn test_missing_fields() {
        let vocab = Vocabulary::standard();
        for line in ["op2 add 0x10", "enter", "cordic_constructed 0x1 32 32"] {
            assert!(
                matches!(
                    TraceEvent::parse(line, vocab, false),
                    Err(AnalysisError::MalformedTrace(_))
                ),
                "{line} should be malformed"
            );
        }
    }

    #[test]
    fn test_unknown_operation_on_dispatch() {
        struct Refuse;
        impl EventSink for Refuse {
            fn engine_constructed(&mut self, _: Address, _: EngineConfig) -> Result<(), AnalysisError> {
                unreachable!()
            }
            fn engine_destructed(&mut self, _: Address) -> Result<(), AnalysisError> {
                unreachable!()
            }
            fn enter(&mut self, _: &str) -> Result<(), AnalysisError> {
                unreachable!()
            }
            fn leave(&mut self, _: &str) -> Result<(), AnalysisError> {
                unreachable!()
            }
            fn value_constructed(&mut self, _: Address, _: Address) -> Result<(), AnalysisError> {
                unreachable!()
            }
            fn value_destructed(&mut self, _: Address) -> Result<(), AnalysisError> {
                unreachable!()
            }
            fn op(&mut self, _: Op, _: &[Address]) -> Result<(), AnalysisError> {
                unreachable!()
            }
            fn op1_int(&mut self, _: Op, _: i64) -> Result<(), AnalysisError> {
                unreachable!()
            }
            fn op1_float(&mut self, _: Op, _: f64) -> Result<(), AnalysisError> {
                unreachable!()
            }
            fn op2_int(&mut self, _: Op, _: Address, _: i64) -> Result<(), AnalysisError> {
                unreachable!()
            }
            fn op2_float(&mut self, _: Op, _: Address, _: f64) -> Result<(), AnalysisError> {
                unreachable!()
            }
        }

        // Classification succeeds; only resolving the name fails.
        let event = parse("op1 frobnicate 0x10").unwrap();
        assert!(matches!(
            event.dispatch(&mut Refuse, Vocabulary::standard()),
            Err(AnalysisError::UnknownOperation(name)) if name == "frobnicate"
        ));
    }
}
