use smallvec::SmallVec;

use super::{Address, Entry, LifecycleTable};
use crate::{execution::PendingResult, AnalysisError};

/// Literal held by a constant value, with the range observed at its address.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant {
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl Constant {
    pub const fn new(value: f64) -> Self {
        Self {
            value,
            min: value,
            max: value,
        }
    }

    /// `value`, keeping the range of a previous constant at the same address.
    fn widened(previous: Option<Constant>, value: f64) -> Self {
        match previous {
            Some(prev) => Self {
                value,
                min: prev.min.min(value),
                max: prev.max.max(value),
            },
            None => Self::new(value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueInstance {
    /// Whether a result has ever been bound to this value.
    pub assigned: bool,
    /// Ordinal of the owning engine, `None` for raw values.
    pub engine: Option<usize>,
    /// Operand addresses the current contents were computed from.
    pub sources: SmallVec<[Address; 3]>,
    /// Raw fixed-point encoding, when the trace carried one.
    pub encoded: Option<i64>,
    pub constant: Option<Constant>,
}

impl ValueInstance {
    pub fn is_constant(&self) -> bool {
        self.constant.is_some()
    }
}

#[derive(Debug, Default, Clone)]
pub struct ValueTable {
    table: LifecycleTable<ValueInstance>,
}

impl ValueTable {
    /// Records a fresh, unassigned value at `addr`.
    ///
    /// Constructing over a live value is rejected unless `allow_overwrite`.
    pub(crate) fn construct(
        &mut self,
        addr: Address,
        engine: Option<usize>,
        allow_overwrite: bool,
    ) -> Result<(), AnalysisError> {
        if !allow_overwrite && self.table.is_live(addr) {
            return Err(AnalysisError::LifecycleViolation(format!(
                "value 0x{addr:x} constructed before previous was destructed"
            )));
        }
        self.table.insert_live(
            addr,
            ValueInstance {
                engine,
                ..Default::default()
            },
        );
        Ok(())
    }

    pub(crate) fn destruct(&mut self, addr: Address) -> Result<(), AnalysisError> {
        if !self.table.kill(addr) {
            return Err(AnalysisError::LifecycleViolation(format!(
                "value 0x{addr:x} destructed before being constructed"
            )));
        }
        Ok(())
    }

    /// The live value at `addr`; `what` names the operand in errors.
    pub fn require_live(&self, addr: Address, what: &str) -> Result<&ValueInstance, AnalysisError> {
        self.table.live(addr).ok_or_else(|| {
            AnalysisError::UnresolvedOperand(format!("{what} (0x{addr:x}) does not exist"))
        })
    }

    /// The live value at `addr`, which must have been assigned.
    pub fn require_assigned(
        &self,
        addr: Address,
        what: &str,
    ) -> Result<&ValueInstance, AnalysisError> {
        let value = self.require_live(addr, what)?;
        if !value.assigned {
            return Err(AnalysisError::UnresolvedOperand(format!(
                "{what} (0x{addr:x}) used when not previously assigned"
            )));
        }
        Ok(value)
    }

    /// Replaces the whole record at `addr`, as an assignment does.
    pub(crate) fn overwrite(&mut self, addr: Address, value: ValueInstance) {
        self.table.insert_live(addr, value);
    }

    /// Binds a pending result to the live value at `addr`.
    pub(crate) fn bind(
        &mut self,
        addr: Address,
        result: PendingResult,
        encoded: i64,
    ) -> Result<(), AnalysisError> {
        let value = self.table.live_mut(addr).ok_or_else(|| {
            AnalysisError::UnresolvedOperand(format!("bind target (0x{addr:x}) does not exist"))
        })?;
        value.assigned = true;
        value.encoded = Some(encoded);
        let previous = value.constant;
        value.constant = result
            .constant
            .map(|literal| Constant::widened(previous, literal));
        value.sources = result.sources;
        Ok(())
    }

    /// Stores a literal directly into the live value at `addr`.
    pub(crate) fn materialize(&mut self, addr: Address, literal: f64) -> Result<(), AnalysisError> {
        let value = self.table.live_mut(addr).ok_or_else(|| {
            AnalysisError::UnresolvedOperand(format!("constant target (0x{addr:x}) does not exist"))
        })?;
        value.assigned = true;
        value.constant = Some(Constant::widened(value.constant, literal));
        value.sources.clear();
        Ok(())
    }

    pub fn live(&self, addr: Address) -> Option<&ValueInstance> {
        self.table.live(addr)
    }

    pub fn get(&self, addr: Address) -> Option<&Entry<ValueInstance>> {
        self.table.get(addr)
    }

    pub fn live_count(&self) -> usize {
        self.table.live_count()
    }
}
