use std::sync::Arc;

use crate::shared::data::store::StoreError;

/// Result of a data access or aggregation call that always carries a value.
///
/// When a query fails the value is the default payload (empty list, zero) and
/// `failures` counts the swallowed errors. Callers read `value` and may ignore
/// the rest; the query cache uses `is_degraded` to avoid memoizing defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub failures: usize,
}

impl<T> Outcome<T> {
    pub fn ok(value: T) -> Self {
        Self { value, failures: 0 }
    }

    pub fn degraded(value: T) -> Self {
        Self { value, failures: 1 }
    }

    pub fn is_degraded(&self) -> bool {
        self.failures > 0
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            failures: self.failures,
        }
    }

    /// Take the value of a nested outcome, accumulating its failures.
    pub fn absorb<U>(&mut self, other: Outcome<U>) -> U {
        self.failures += other.failures;
        other.value
    }
}

impl<T: Default> Default for Outcome<T> {
    fn default() -> Self {
        Self::ok(T::default())
    }
}

/// Sink for failures swallowed at the data access boundary.
pub trait Diagnostics: Send + Sync {
    /// A store round trip failed; `operation` names the data access function.
    fn query_failed(&self, operation: &str, error: &StoreError);

    /// Something noteworthy but expected, such as an indicator without data.
    fn note(&self, operation: &str, message: &str);
}

/// Default sink: `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn query_failed(&self, operation: &str, error: &StoreError) {
        tracing::error!(op = operation, "Error fetching {}: {}", operation, error);
    }

    fn note(&self, operation: &str, message: &str) {
        tracing::debug!(op = operation, "{}", message);
    }
}

pub type SharedDiagnostics = Arc<dyn Diagnostics>;
