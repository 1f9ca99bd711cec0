//! Task enumeration over the cartesian product of attribute dimensions
//!
//! Tasks are produced lazily in lexicographic order: the first dimension
//! varies slowest and the last varies fastest, so the same dimensions always
//! yield the same sequence of tasks with the same ordinals.

use std::collections::HashSet;
use std::sync::Arc;

use shared::{AttributeDimension, Task};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Deterministic enumerator of every attribute combination
#[derive(Debug, Clone)]
pub struct TaskEnumerator {
    /// Dimension names in fixed order, shared by every produced task
    names: Arc<[String]>,

    /// Values per dimension, same order as `names`
    values: Vec<Vec<String>>,

    /// Product of all cardinalities
    total: usize,
}

impl TaskEnumerator {
    /// Validate dimensions and build the enumerator
    pub fn new(dimensions: Vec<AttributeDimension>) -> OrchestratorResult<Self> {
        if dimensions.is_empty() {
            return Err(OrchestratorError::config("at least one attribute dimension is required"));
        }

        let mut seen_names = HashSet::new();
        let mut total: usize = 1;
        for dimension in &dimensions {
            if !seen_names.insert(dimension.name.as_str()) {
                return Err(OrchestratorError::config(format!(
                    "dimension '{}' is declared more than once",
                    dimension.name
                )));
            }
            if dimension.is_empty() {
                return Err(OrchestratorError::config(format!(
                    "dimension '{}' has no values",
                    dimension.name
                )));
            }

            let mut seen_values = HashSet::new();
            if let Some(duplicate) = dimension.values.iter().find(|v| !seen_values.insert(v.as_str())) {
                return Err(OrchestratorError::config(format!(
                    "dimension '{}' contains duplicate value '{}'",
                    dimension.name, duplicate
                )));
            }

            total = total.checked_mul(dimension.len()).ok_or_else(|| {
                OrchestratorError::config("attribute combinations overflow the task space")
            })?;
        }

        let (names, values): (Vec<String>, Vec<Vec<String>>) = dimensions
            .into_iter()
            .map(|dimension| (dimension.name, dimension.values))
            .unzip();

        Ok(Self {
            names: names.into(),
            values,
            total,
        })
    }

    /// Number of tasks the enumerator yields
    pub fn len(&self) -> usize {
        self.total
    }

    /// Always false once constructed; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Task at a given position in enumeration order
    pub fn task_at(&self, ordinal: usize) -> Option<Task> {
        if ordinal >= self.total {
            return None;
        }

        // Mixed-radix decomposition, last dimension is the least significant digit
        let mut remainder = ordinal;
        let mut picked = vec![String::new(); self.values.len()];
        for (slot, values) in picked.iter_mut().zip(&self.values).rev() {
            let radix = values.len();
            *slot = values[remainder % radix].clone();
            remainder /= radix;
        }

        Some(Task::new(ordinal, Arc::clone(&self.names), picked))
    }

    /// Lazy iterator over all tasks in order
    pub fn iter(&self) -> TaskIter<'_> {
        TaskIter {
            enumerator: self,
            next: 0,
        }
    }
}

impl<'a> IntoIterator for &'a TaskEnumerator {
    type Item = Task;
    type IntoIter = TaskIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`TaskEnumerator::iter`]
pub struct TaskIter<'a> {
    enumerator: &'a TaskEnumerator,
    next: usize,
}

impl Iterator for TaskIter<'_> {
    type Item = Task;

    fn next(&mut self) -> Option<Task> {
        let task = self.enumerator.task_at(self.next)?;
        self.next += 1;
        Some(task)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.enumerator.total.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TaskIter<'_> {}
