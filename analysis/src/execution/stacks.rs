use smallvec::SmallVec;

use crate::{memory::Address, AnalysisError};

/// Growable stack with a hard depth limit.
///
/// Pushing past the limit or popping an empty stack raises
/// `StackDiscipline`; `label` names the stack in those errors.
#[derive(Debug, Clone)]
pub struct BoundedStack<T> {
    items: Vec<T>,
    capacity: usize,
    label: &'static str,
}

impl<T> BoundedStack<T> {
    pub fn new(label: &'static str, capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
            label,
        }
    }

    pub fn push(&mut self, item: T) -> Result<(), AnalysisError> {
        if self.items.len() >= self.capacity {
            return Err(AnalysisError::StackDiscipline(format!(
                "depth of {} exceeded ({})",
                self.label, self.capacity
            )));
        }
        self.items.push(item);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<T, AnalysisError> {
        self.items.pop().ok_or_else(|| {
            AnalysisError::StackDiscipline(format!("can't pop an empty {}", self.label))
        })
    }

    pub fn top(&self) -> Result<&T, AnalysisError> {
        self.items.last().ok_or_else(|| {
            AnalysisError::StackDiscipline(format!("can't get top of an empty {}", self.label))
        })
    }

    pub fn depth(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

/// One active invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    pub func_name: String,
}

/// A result produced by an operation and not yet bound to an address.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingResult {
    pub constant: Option<f64>,
    pub encoded: Option<i64>,
    pub sources: SmallVec<[Address; 3]>,
}

impl PendingResult {
    pub fn computed(sources: SmallVec<[Address; 3]>) -> Self {
        Self {
            sources,
            ..Default::default()
        }
    }

    pub fn constant(literal: f64) -> Self {
        Self {
            constant: Some(literal),
            ..Default::default()
        }
    }

    pub fn encoded(encoded: i64, source: Address) -> Self {
        Self {
            encoded: Some(encoded),
            sources: SmallVec::from_slice(&[source]),
            ..Default::default()
        }
    }
}

pub type CallStack = BoundedStack<CallFrame>;
pub type PendingResults = BoundedStack<PendingResult>;
