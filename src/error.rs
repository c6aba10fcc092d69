//! Error types for loaders and the collaborators they wrap.

use thiserror::Error;

/// Error delivered to a caller of `Loader::load`.
///
/// A single error may be handed to every request that was waiting on the same dispatch, so the
/// type is `Clone` and carries rendered messages rather than source errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The document store rejected or failed a query.
    #[error("store error: {0}")]
    Store(String),

    /// A remote service call (token refresh, project fetch) failed.
    #[error("remote service error: {0}")]
    Remote(String),

    /// The batch function broke the one-result-per-key contract.
    #[error("batch function returned {actual} results for {expected} keys")]
    BatchLength { expected: usize, actual: usize },

    /// Data that must exist was not found.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// The loader's worker task has stopped.
    #[error("loader worker is no longer running")]
    WorkerGone,
}

/// Outcome of loading one key: a value, a miss, or a failure for that key only.
pub type KeyResult<V> = std::result::Result<Option<V>, LoadError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("query on table {table} failed: {message}")]
    Query { table: String, message: String },

    #[error("could not decode {table} document: {source}")]
    Decode {
        table: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug, Clone)]
pub enum AtlassianError {
    #[error("token refresh failed: {0}")]
    Refresh(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StoreError> for LoadError {
    fn from(err: StoreError) -> Self {
        LoadError::Store(err.to_string())
    }
}

impl From<AtlassianError> for LoadError {
    fn from(err: AtlassianError) -> Self {
        LoadError::Remote(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = LoadError::BatchLength { expected: 3, actual: 2 };
        assert_eq!(err.to_string(), "batch function returned 2 results for 3 keys");

        let err: LoadError =
            StoreError::Query { table: "Task".to_owned(), message: "timeout".to_owned() }.into();
        assert_eq!(err, LoadError::Store("query on table Task failed: timeout".to_owned()));

        let err: LoadError = AtlassianError::Refresh("revoked".to_owned()).into();
        assert_eq!(err.to_string(), "remote service error: token refresh failed: revoked");
    }
}
