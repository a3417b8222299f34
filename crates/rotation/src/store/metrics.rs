//! Per-store call counters
//!
//! Lock-free counters recording every call a store served. Handlers never
//! read them; they exist for observability and for asserting exactly which
//! calls an invocation issued.

use std::sync::atomic::{AtomicU64, Ordering};

use super::StoreOperation;

/// Thread-safe call counters for one store instance
///
/// # Example
///
/// ```rust
/// use stagehand_rotation::store::{StoreMetrics, StoreOperation};
///
/// let metrics = StoreMetrics::new();
/// metrics.record(StoreOperation::DescribeSecret, true);
/// metrics.record(StoreOperation::PutSecretValue, false);
///
/// assert_eq!(metrics.count(StoreOperation::DescribeSecret), 1);
/// assert_eq!(metrics.mutation_count(), 1);
/// assert_eq!(metrics.error_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct StoreMetrics {
    describe_count: AtomicU64,
    get_value_count: AtomicU64,
    put_value_count: AtomicU64,
    update_stage_count: AtomicU64,
    random_password_count: AtomicU64,

    /// Failed calls across all operations
    error_count: AtomicU64,
}

impl StoreMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, operation: StoreOperation) -> &AtomicU64 {
        match operation {
            StoreOperation::DescribeSecret => &self.describe_count,
            StoreOperation::GetSecretValue => &self.get_value_count,
            StoreOperation::PutSecretValue => &self.put_value_count,
            StoreOperation::UpdateVersionStage => &self.update_stage_count,
            StoreOperation::GetRandomPassword => &self.random_password_count,
        }
    }

    /// Record one call and whether it succeeded
    pub fn record(&self, operation: StoreOperation, success: bool) {
        self.counter(operation).fetch_add(1, Ordering::Relaxed);
        if !success {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Calls made to `operation`, successful or not
    pub fn count(&self, operation: StoreOperation) -> u64 {
        self.counter(operation).load(Ordering::Relaxed)
    }

    /// Calls that could have changed stored state
    pub fn mutation_count(&self) -> u64 {
        StoreOperation::ALL
            .into_iter()
            .filter(|op| op.is_mutating())
            .map(|op| self.count(op))
            .sum()
    }

    /// Calls across every operation
    pub fn total_count(&self) -> u64 {
        StoreOperation::ALL
            .into_iter()
            .map(|op| self.count(op))
            .sum()
    }

    /// Failed calls
    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.describe_count.store(0, Ordering::Relaxed);
        self.get_value_count.store(0, Ordering::Relaxed);
        self.put_value_count.store(0, Ordering::Relaxed);
        self.update_stage_count.store(0, Ordering::Relaxed);
        self.random_password_count.store(0, Ordering::Relaxed);
        self.error_count.store(0, Ordering::Relaxed);
    }
}
