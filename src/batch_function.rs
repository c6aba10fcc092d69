use async_trait::async_trait;

use crate::error::{KeyResult, LoadError};

/// A `BatchFunction` defines the method through which some `Loader` may fetch batched data from
/// some resource. The `BatchFunction` receives a slice of keys that have been requested during the
/// `Loader`'s most recent execution frame, deduplicated by cache key and in first-seen order, and
/// some user defined context struct.
///
/// The returned vector must hold exactly one slot per key, in the same order as `keys`:
///
/// * `Ok(Some(value))` for a key that was found,
/// * `Ok(None)` for a key with no value,
/// * `Err(_)` for a key that failed on its own without affecting its siblings.
///
/// Returning `Err` from the function itself fails every request waiting on this frame. A vector of
/// the wrong length is treated the same way.
///
/// Multiple `BatchFunctions` (and therefore loaders) can share the same context (likely through an
/// `Arc`).
#[async_trait]
pub trait BatchFunction<K, V> {
    type Context;
    async fn load(keys: &[K], context: &Self::Context) -> Result<Vec<KeyResult<V>>, LoadError>;
}
