#![allow(dead_code)]

use std::io::Cursor;

use cordic_analysis::{
    memory::EntityTables, replay, AnalysisError, ReplayConfig, ReplayError, Report, ReportConfig,
};

pub const ENGINE: u64 = 0x1000;

/// Replays `trace` with the default configuration.
pub fn run(trace: &str) -> Result<EntityTables, ReplayError> {
    run_with(trace, &ReplayConfig::default())
}

pub fn run_with(trace: &str, config: &ReplayConfig) -> Result<EntityTables, ReplayError> {
    replay(Cursor::new(trace), config)
}

/// Replays `trace`, which must be rejected, and returns the underlying error.
pub fn reject(trace: &str) -> AnalysisError {
    match run(trace) {
        Ok(_) => panic!("trace should have been rejected:\n{trace}"),
        Err(err) => err.error,
    }
}

pub fn report(trace: &str, config: &ReportConfig) -> Report {
    let tables = run(trace).unwrap_or_else(|err| panic!("replay failed: {err}"));
    Report::generate(&tables.functions, config)
}

/// Builds trace text line by line.
#[derive(Debug, Default, Clone)]
pub struct TraceBuilder {
    lines: Vec<String>,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn engine(self, addr: u64) -> Self {
        self.line(format!("cordic_constructed 0x{addr:x} 4 27 0 31"))
    }

    pub fn enter(self, name: &str) -> Self {
        self.line(format!("enter {name}"))
    }

    pub fn leave(self, name: &str) -> Self {
        self.line(format!("leave {name}"))
    }

    pub fn value(self, addr: u64) -> Self {
        self.line(format!("constructed 0x{addr:x} 0x{ENGINE:x}"))
    }

    /// Constructs `addr` and binds a constant to it.
    pub fn constant(self, addr: u64, literal: f64) -> Self {
        self.value(addr)
            .line(format!("op1f push_constant {literal:?}"))
            .line(format!("op2i pop_value 0x{addr:x} 0"))
    }

    /// `dst = op(a, b)`.
    pub fn binary(self, op: &str, a: u64, b: u64, dst: u64) -> Self {
        self.line(format!("op2 {op}(0x{a:x}, 0x{b:x})"))
            .line(format!("op2i pop_value 0x{dst:x} 1"))
    }

    pub fn build(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}
