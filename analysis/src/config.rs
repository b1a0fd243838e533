//! Knobs for replay and reporting.

use std::path::PathBuf;

/// Limits and strictness of a replay.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    /// Deepest call nesting accepted before `StackDiscipline` is raised.
    pub max_call_depth: usize,
    /// Unbound results that may be in flight at once.
    pub pending_capacity: usize,
    /// Reject malformed hexadecimal addresses instead of reading them best
    /// effort.
    pub strict_addresses: bool,
    /// Accept a trace that ends with frames still on the call stack.
    pub allow_unbalanced_calls: bool,
    /// Let a value construction overwrite a live value at the same address.
    pub allow_value_reconstruction: bool,
}

impl ReplayConfig {
    pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;
    pub const DEFAULT_PENDING_CAPACITY: usize = 2;
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_call_depth: Self::DEFAULT_MAX_CALL_DEPTH,
            pending_capacity: Self::DEFAULT_PENDING_CAPACITY,
            strict_addresses: false,
            allow_unbalanced_calls: false,
            allow_value_reconstruction: false,
        }
    }
}

/// What goes into a report and where it is written.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    /// Both output files are derived from this: `<base>.out` and `<base>.csv`.
    pub base_name: PathBuf,
    /// Multiplier applied to every raw count.
    pub scale_factor: f64,
    /// Functions left out of the report entirely.
    pub ignored_functions: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            base_name: PathBuf::from("log"),
            scale_factor: 1.0,
            ignored_functions: Vec::new(),
        }
    }
}

impl ReportConfig {
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored_functions.iter().any(|ignored| ignored == name)
    }
}
