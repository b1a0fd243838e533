use ahash::AHashMap;

use crate::{stats::OpHistogram, AnalysisError, Op};

/// Totals for one function name across all of its invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionAggregate {
    pub calls: u64,
    pub ops: OpHistogram,
}

/// Function aggregates, remembered in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    order: Vec<String>,
    funcs: AHashMap<String, FunctionAggregate>,
}

impl FunctionTable {
    /// Counts one call of `name`, creating its aggregate on first sight.
    pub(crate) fn enter(&mut self, name: &str) {
        match self.funcs.get_mut(name) {
            Some(func) => func.calls += 1,
            None => {
                self.order.push(name.to_string());
                self.funcs.insert(
                    name.to_string(),
                    FunctionAggregate {
                        calls: 1,
                        ..Default::default()
                    },
                );
            }
        }
    }

    /// Attributes one occurrence of `op` to `name`.
    pub(crate) fn record(&mut self, name: &str, op: Op) -> Result<(), AnalysisError> {
        let func = self.funcs.get_mut(name).ok_or_else(|| {
            AnalysisError::StackDiscipline(format!("function {name} was never entered"))
        })?;
        func.ops.record(op);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FunctionAggregate> {
        self.funcs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    /// Aggregates in the order their functions were first entered.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FunctionAggregate)> + '_ {
        self.order
            .iter()
            .map(|name| (name.as_str(), &self.funcs[name]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
