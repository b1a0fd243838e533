use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use super::stacks::{CallFrame, CallStack, PendingResult, PendingResults};
use crate::{
    config::ReplayConfig,
    event::EventSink,
    memory::{Address, EngineConfig, EntityTables},
    AnalysisError, Op,
};

/// State reconstructed from the events seen so far.
///
/// Every [`EventSink`] method checks the invariants its event depends on and
/// fails on the first violation.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: ReplayConfig,
    tables: EntityTables,
    calls: CallStack,
    pending: PendingResults,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(ReplayConfig::default())
    }
}

impl Analyzer {
    pub fn new(config: ReplayConfig) -> Self {
        Self {
            calls: CallStack::new("call stack", config.max_call_depth),
            pending: PendingResults::new("val_stack", config.pending_capacity),
            tables: EntityTables::default(),
            config,
        }
    }

    pub const fn tables(&self) -> &EntityTables {
        &self.tables
    }

    pub fn call_depth(&self) -> usize {
        self.calls.depth()
    }

    pub fn pending_depth(&self) -> usize {
        self.pending.depth()
    }

    /// Closes the replay and hands over the tables.
    ///
    /// Fails if frames are still open, unless the configuration allows it.
    pub fn finish(self) -> Result<EntityTables, AnalysisError> {
        if !self.calls.is_empty() {
            let open = self
                .calls
                .iter()
                .map(|frame| frame.func_name.as_str())
                .collect::<Vec<_>>()
                .join(" > ");
            if !self.config.allow_unbalanced_calls {
                return Err(AnalysisError::StackDiscipline(format!(
                    "trace ended inside {open}"
                )));
            }
            warn!("trace ended with open frames: {open}");
        }
        if !self.pending.is_empty() {
            warn!(
                "trace ended with {} unbound result(s)",
                self.pending.depth()
            );
        }
        Ok(self.tables)
    }

    /// Charges `op` to the function on top of the call stack.
    fn count(&mut self, op: Op) -> Result<(), AnalysisError> {
        let frame = self.calls.top()?;
        trace!(func = %frame.func_name, op = op.name(), "count");
        self.tables.functions.record(&frame.func_name, op)
    }
}

impl EventSink for Analyzer {
    fn engine_constructed(
        &mut self,
        engine: Address,
        config: EngineConfig,
    ) -> Result<(), AnalysisError> {
        let ordinal = self.tables.engines.construct(engine, config)?;
        debug!(engine = %format!("0x{engine:x}"), ordinal, ?config, "engine constructed");
        Ok(())
    }

    fn engine_destructed(&mut self, engine: Address) -> Result<(), AnalysisError> {
        self.tables.engines.destruct(engine)
    }

    fn enter(&mut self, name: &str) -> Result<(), AnalysisError> {
        self.tables.functions.enter(name);
        self.calls.push(CallFrame {
            func_name: name.to_string(),
        })
    }

    fn leave(&mut self, name: &str) -> Result<(), AnalysisError> {
        if !self.tables.functions.contains(name) {
            return Err(AnalysisError::StackDiscipline(format!(
                "leave should have found function {name}"
            )));
        }
        let frame = self.calls.top()?;
        if frame.func_name != name {
            return Err(AnalysisError::StackDiscipline(format!(
                "trying to leave a routine that's not at the top of the stack: entered {} leaving {name}",
                frame.func_name
            )));
        }
        self.calls.pop()?;
        Ok(())
    }

    fn value_constructed(&mut self, value: Address, engine: Address) -> Result<(), AnalysisError> {
        let owner = match engine {
            0 => None,
            addr => {
                let instance = self.tables.engines.live(addr).ok_or_else(|| {
                    AnalysisError::LifecycleViolation(format!(
                        "value 0x{value:x} constructed using unknown engine 0x{addr:x}"
                    ))
                })?;
                Some(instance.ordinal)
            }
        };
        self.tables.values.construct(
            value,
            owner,
            self.config.allow_value_reconstruction,
        )
    }

    fn value_destructed(&mut self, value: Address) -> Result<(), AnalysisError> {
        self.tables.values.destruct(value)
    }

    fn op(&mut self, op: Op, operands: &[Address]) -> Result<(), AnalysisError> {
        if operands.is_empty() || operands.len() > 4 {
            return Err(AnalysisError::MalformedTrace(format!(
                "{} takes 1 to 4 operands, got {}",
                op.name(),
                operands.len()
            )));
        }

        let mut sources = SmallVec::new();
        for (slot, &addr) in operands.iter().enumerate() {
            if op.is_output_slot(slot) {
                continue;
            }
            let what = format!("{} opnd[{slot}]", op.name());
            let value = self.tables.values.require_assigned(addr, &what)?;
            if op == Op::Assign && slot == 1 {
                let copy = value.clone();
                self.tables.values.overwrite(operands[0], copy);
            }
            sources.push(addr);
        }

        for _ in 0..op.result_count() {
            self.pending.push(PendingResult::computed(sources.clone()))?;
        }
        self.count(op)
    }

    fn op1_int(&mut self, op: Op, _literal: i64) -> Result<(), AnalysisError> {
        Err(AnalysisError::MalformedTrace(format!(
            "should not have gotten op1i {}",
            op.name()
        )))
    }

    fn op1_float(&mut self, op: Op, literal: f64) -> Result<(), AnalysisError> {
        if op != Op::PushConstant {
            return Err(AnalysisError::MalformedTrace(format!(
                "op1f allowed only for push_constant, got {}",
                op.name()
            )));
        }
        self.pending.push(PendingResult::constant(literal))?;
        self.count(op)
    }

    fn op2_int(&mut self, op: Op, value: Address, literal: i64) -> Result<(), AnalysisError> {
        if !matches!(op, Op::Lshift | Op::Rshift | Op::PopValue) {
            return Err(AnalysisError::MalformedTrace(format!(
                "op2i allowed only for lshift/rshift/pop_value, got {}",
                op.name()
            )));
        }
        let what = format!("{} opnd[0]", op.name());
        self.tables.values.require_live(value, &what)?;

        if op == Op::PopValue {
            let result = self.pending.pop()?;
            self.tables.values.bind(value, result, literal)?;
        } else {
            self.pending.push(PendingResult::encoded(literal, value))?;
        }
        self.count(op)
    }

    fn op2_float(&mut self, op: Op, value: Address, literal: f64) -> Result<(), AnalysisError> {
        let what = format!("{} opnd[0]", op.name());
        if op == Op::PushConstant {
            self.tables.values.require_live(value, &what)?;
            self.tables.values.materialize(value, literal)?;
        } else {
            self.tables.values.require_assigned(value, &what)?;
            self.pending
                .push(PendingResult::computed(SmallVec::from_slice(&[value])))?;
        }
        self.count(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CFG: EngineConfig = EngineConfig {
        int_w: 4,
        frac_w: 27,
        guard_w: 0,
        n: 31,
    };

    /// Engine 0x1, one raw value 0x10 bound to a constant, inside `f`.
    fn primed() -> Analyzer {
        let mut a = Analyzer::default();
        a.engine_constructed(0x1, CFG).unwrap();
        a.enter("f").unwrap();
        a.value_constructed(0x10, 0x1).unwrap();
        a.op1_float(Op::PushConstant, 0.5).unwrap();
        a.op2_int(Op::PopValue, 0x10, 0x400_0000).unwrap();
        a
    }

    #[test]
    fn test_constant_binding() {
        let a = primed();
        let value = a.tables().values.live(0x10).unwrap();
        assert!(value.assigned);
        assert_eq!(value.engine, Some(0));
        assert_eq!(value.encoded, Some(0x400_0000));
        assert_eq!(value.constant.unwrap().value, 0.5);
        assert_eq!(a.pending_depth(), 0);
    }

    #[test]
    fn test_assign_copies_source_state() {
        let mut a = primed();
        a.value_constructed(0x20, 0).unwrap();
        a.op(Op::Assign, &[0x20, 0x10]).unwrap();

        let dst = a.tables().values.live(0x20).unwrap();
        assert_eq!(dst, a.tables().values.live(0x10).unwrap());
        assert_eq!(dst.engine, Some(0));
        assert_eq!(a.pending_depth(), 0);
    }

    #[test]
    fn test_sincos_outputs_need_no_assignment() {
        let mut a = primed();
        a.value_constructed(0x20, 0x1).unwrap();
        a.value_constructed(0x30, 0x1).unwrap();
        a.op(Op::Sincos, &[0x10, 0x20, 0x30]).unwrap();
        assert_eq!(a.pending_depth(), 2);

        // A third in-flight result does not fit.
        assert!(matches!(
            a.op(Op::Sqrt, &[0x10]),
            Err(AnalysisError::StackDiscipline(_))
        ));
    }

    #[test]
    fn test_unassigned_operand() {
        let mut a = primed();
        a.value_constructed(0x20, 0x1).unwrap();
        assert!(matches!(
            a.op(Op::Add, &[0x10, 0x20]),
            Err(AnalysisError::UnresolvedOperand(_))
        ));
        assert!(matches!(
            a.op(Op::Add, &[0x10, 0x99]),
            Err(AnalysisError::UnresolvedOperand(_))
        ));
    }

    #[test]
    fn test_shift_pushes_encoded_result() {
        let mut a = primed();
        a.op2_int(Op::Lshift, 0x10, 3).unwrap();
        assert_eq!(a.pending_depth(), 1);
        a.value_constructed(0x20, 0x1).unwrap();
        a.op2_int(Op::PopValue, 0x20, 4).unwrap();

        let value = a.tables().values.live(0x20).unwrap();
        assert_eq!(value.encoded, Some(4));
        assert_eq!(value.sources.as_slice(), &[0x10]);
    }

    #[test]
    fn test_shift_needs_live_value() {
        let mut a = primed();
        assert!(matches!(
            a.op2_int(Op::Lshift, 0x99, 3),
            Err(AnalysisError::UnresolvedOperand(_))
        ));
        a.value_destructed(0x10).unwrap();
        assert!(matches!(
            a.op2_int(Op::Rshift, 0x10, 3),
            Err(AnalysisError::UnresolvedOperand(_))
        ));
        assert_eq!(a.pending_depth(), 0);
    }

    #[test]
    fn test_float_operand_pushes_result() {
        let mut a = primed();
        a.value_constructed(0x20, 0x1).unwrap();
        assert!(matches!(
            a.op2_float(Op::Pow, 0x20, 2.0),
            Err(AnalysisError::UnresolvedOperand(_))
        ));
        assert!(matches!(
            a.op2_float(Op::Pow, 0x99, 2.0),
            Err(AnalysisError::UnresolvedOperand(_))
        ));
        assert_eq!(a.pending_depth(), 0);

        a.op2_float(Op::Pow, 0x10, 2.0).unwrap();
        assert_eq!(a.pending_depth(), 1);
        a.op2_int(Op::PopValue, 0x20, 9).unwrap();

        let value = a.tables().values.live(0x20).unwrap();
        assert!(value.assigned);
        assert_eq!(value.encoded, Some(9));
        assert_eq!(value.sources.as_slice(), &[0x10]);
        assert_eq!(a.tables().functions.get("f").unwrap().ops[Op::Pow], 1);
    }

    #[test]
    fn test_float_operand_on_dead_value() {
        let mut a = primed();
        a.value_destructed(0x10).unwrap();
        assert!(matches!(
            a.op2_float(Op::Pow, 0x10, 2.0),
            Err(AnalysisError::UnresolvedOperand(_))
        ));
        assert!(matches!(
            a.op2_float(Op::PushConstant, 0x10, 1.0),
            Err(AnalysisError::UnresolvedOperand(_))
        ));
        assert_eq!(a.tables().functions.get("f").unwrap().ops[Op::Pow], 0);
    }

    #[test]
    fn test_restricted_literal_ops() {
        let mut a = primed();
        assert!(matches!(
            a.op1_float(Op::Add, 1.0),
            Err(AnalysisError::MalformedTrace(_))
        ));
        assert!(matches!(
            a.op2_int(Op::Add, 0x10, 1),
            Err(AnalysisError::MalformedTrace(_))
        ));
        assert!(matches!(
            a.op1_int(Op::Add, 1),
            Err(AnalysisError::MalformedTrace(_))
        ));
        assert!(matches!(
            a.op2_int(Op::PopValue, 0x10, 0),
            Err(AnalysisError::StackDiscipline(_))
        ));
    }

    #[test]
    fn test_op_outside_any_function() {
        let mut a = Analyzer::default();
        assert!(matches!(
            a.op1_float(Op::PushConstant, 1.0),
            Err(AnalysisError::StackDiscipline(_))
        ));
    }

    #[test]
    fn test_value_needs_live_engine() {
        let mut a = Analyzer::default();
        assert!(matches!(
            a.value_constructed(0x10, 0x1),
            Err(AnalysisError::LifecycleViolation(_))
        ));
        a.engine_constructed(0x1, CFG).unwrap();
        a.engine_destructed(0x1).unwrap();
        assert!(matches!(
            a.value_constructed(0x10, 0x1),
            Err(AnalysisError::LifecycleViolation(_))
        ));
    }

    #[test]
    fn test_finish_with_open_frames() {
        let a = primed();
        assert!(matches!(
            a.finish(),
            Err(AnalysisError::StackDiscipline(_))
        ));

        let mut a = Analyzer::new(ReplayConfig {
            allow_unbalanced_calls: true,
            ..Default::default()
        });
        a.enter("f").unwrap();
        let tables = a.finish().unwrap();
        assert_eq!(tables.functions.get("f").unwrap().calls, 1);
    }

    #[test]
    fn test_call_depth_limit() {
        let mut a = Analyzer::new(ReplayConfig {
            max_call_depth: 2,
            ..Default::default()
        });
        a.enter("f").unwrap();
        a.enter("g").unwrap();
        assert!(matches!(a.enter("h"), Err(AnalysisError::StackDiscipline(_))));
    }
}
