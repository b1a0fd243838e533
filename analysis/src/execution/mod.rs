mod analyzer;
mod replay;
mod stacks;

pub use analyzer::Analyzer;
pub use replay::{replay, Replayer};
pub use stacks::{BoundedStack, CallFrame, CallStack, PendingResult, PendingResults};
