use thiserror::Error;

/// A single handler that returned an error during dispatch.
#[derive(Error, Debug)]
#[error("handler for [{}] failed: {source}", .keys.join(", "))]
pub struct HandlerFailure {
    /// Key sequence of the failing registration
    pub keys: Vec<String>,
    #[source]
    pub source: anyhow::Error,
}

/// Errors collected while dispatching one combination.
///
/// Every matching handler still runs; failures are gathered and reported
/// together once dispatch has finished.
#[derive(Error, Debug)]
#[error("{} handler(s) failed for combination [{combination}]", .failures.len())]
pub struct DispatchError {
    /// The combination being dispatched, as displayed
    pub combination: String,
    pub failures: Vec<HandlerFailure>,
}
