//! Offline replay of CORDIC engine traces.
//!
//! A trace is a line-oriented log of engine and value lifecycles, function
//! entries and exits, and arithmetic operations. [`replay`] rebuilds the
//! entity tables from it, checking every lifecycle and stack invariant on
//! the way, and [`Report`] turns the per-function operation counts into a
//! text and a CSV report.

pub mod config;
mod error;
pub mod event;
pub mod execution;
pub mod memory;
mod opcodes;
mod parser;
pub mod report;
mod stats;
mod util;

pub use config::{ReplayConfig, ReportConfig};
pub use error::{AnalysisError, ReplayError, Result};
pub use event::{EventKind, EventSink, TraceEvent, Vocabulary};
pub use execution::{replay, Analyzer, Replayer};
pub use memory::{Address, EngineConfig, EntityTables};
pub use opcodes::Op;
pub use report::Report;
pub use stats::{scaled, OpHistogram};
pub use util::init_logger;
