use super::{Address, LifecycleTable};
use crate::AnalysisError;

/// Fixed-point configuration an engine was constructed with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub int_w: u32,
    pub frac_w: u32,
    pub guard_w: u32,
    /// Number of CORDIC iterations.
    pub n: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineInstance {
    /// Position in construction order, across all addresses.
    pub ordinal: usize,
    pub config: EngineConfig,
}

#[derive(Debug, Default, Clone)]
pub struct EngineTable {
    table: LifecycleTable<EngineInstance>,
    constructed: usize,
}

impl EngineTable {
    /// Records a new live engine at `addr` and returns its ordinal.
    pub(crate) fn construct(
        &mut self,
        addr: Address,
        config: EngineConfig,
    ) -> Result<usize, AnalysisError> {
        if self.table.is_live(addr) {
            return Err(AnalysisError::LifecycleViolation(format!(
                "engine 0x{addr:x} reconstructed before previous was destructed"
            )));
        }
        let ordinal = self.constructed;
        self.constructed += 1;
        self.table
            .insert_live(addr, EngineInstance { ordinal, config });
        Ok(ordinal)
    }

    pub(crate) fn destruct(&mut self, addr: Address) -> Result<(), AnalysisError> {
        if !self.table.kill(addr) {
            return Err(AnalysisError::LifecycleViolation(format!(
                "engine 0x{addr:x} destructed before being constructed"
            )));
        }
        Ok(())
    }

    pub fn live(&self, addr: Address) -> Option<&EngineInstance> {
        self.table.live(addr)
    }

    /// Number of constructions seen so far.
    pub fn constructed(&self) -> usize {
        self.constructed
    }

    pub fn live_count(&self) -> usize {
        self.table.live_count()
    }
}
