//! Execution strategies
//!
//! The caller picks how sibling fields and list elements are resolved:
//! strictly one at a time, or fanned out with a bounded number of in-flight
//! resolutions. Both strategies produce identical data and complexity for the
//! same query; only wall-clock time and the parallelism of resolver side
//! effects differ. Mutations ignore the chosen strategy and always run
//! sequentially in document order.

/// Concurrency policy for sibling-field and list-element resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Resolve one field at a time, in request order.
    Sequential,
    /// Keep up to `max_concurrency` resolutions in flight.
    Parallel { max_concurrency: usize },
}

impl Default for ExecutionStrategy {
    fn default() -> Self {
        ExecutionStrategy::Sequential
    }
}

impl ExecutionStrategy {
    /// The number of in-flight resolutions this strategy allows.
    pub fn concurrency(&self) -> usize {
        match self {
            ExecutionStrategy::Sequential => 1,
            ExecutionStrategy::Parallel { max_concurrency } => (*max_concurrency).max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrency_bounds() {
        assert_eq!(ExecutionStrategy::Sequential.concurrency(), 1);
        assert_eq!(
            ExecutionStrategy::Parallel { max_concurrency: 8 }.concurrency(),
            8
        );
        // a zero bound degenerates to sequential rather than deadlocking
        assert_eq!(
            ExecutionStrategy::Parallel { max_concurrency: 0 }.concurrency(),
            1
        );
    }
}
