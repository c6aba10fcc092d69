use std::slice;

use tokio::sync::oneshot;

use crate::error::KeyResult;

/// Set of possible requests that can be sent to the
/// [`LoaderWorker`](crate::loader_worker::LoaderWorker)
///
/// The three categories of commands are Load, Prime, and Clear; each of which has a single and
/// many variant for convenience.
#[derive(Debug)]
pub enum LoaderOp<K, V> {
    /// Fetch data from the resource wrapped by this data loader (or the cache).
    Load(LoadRequest<K, V>),
    /// Add values to the cache that were fetched from elsewhere, replacing existing entries.
    Prime(K, V),
    PrimeMany(Vec<(K, V)>),
    /// Remove values from the cache so that they will be reloaded when they are next requested.
    Clear(K),
    ClearMany(Vec<K>),
    ClearAll,
}

#[derive(Debug)]
pub enum LoadRequest<K, V> {
    One(K, oneshot::Sender<KeyResult<V>>),
    Many(Vec<K>, oneshot::Sender<Vec<KeyResult<V>>>),
}

impl<K, V> LoadRequest<K, V>
where
    V: Send + std::fmt::Debug,
{
    pub fn keys(&self) -> &[K] {
        match self {
            LoadRequest::One(ref key, _) => slice::from_ref(key),
            LoadRequest::Many(ref keys, _) => keys,
        }
    }

    /// Sends one result per requested key, in request order.
    pub fn send_response<I>(self, results: I)
    where
        I: IntoIterator<Item = KeyResult<V>>,
    {
        match self {
            LoadRequest::One(_, response_tx) => {
                let response = results.into_iter().next().unwrap_or(Ok(None));
                if let Err(e) = response_tx.send(response) {
                    tracing::error!(?e, "receiver dropped");
                }
            }
            LoadRequest::Many(_, response_tx) => {
                let response = results.into_iter().collect::<Vec<_>>();
                if let Err(e) = response_tx.send(response) {
                    tracing::error!(?e, "receiver dropped");
                }
            }
        }
    }
}
