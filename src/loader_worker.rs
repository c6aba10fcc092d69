use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::marker::PhantomData;

use futures::future::{self, FutureExt};
use tokio::sync::mpsc;
use tracing::{span, Level, Span};

#[cfg(feature = "stats")]
use crate::worker_stats::WorkerStats;
use crate::{
    batch_function::BatchFunction,
    cache::Cache,
    cache_key::CacheKey,
    error::{KeyResult, LoadError},
    loader_op::{LoadRequest, LoaderOp},
    options::LoaderOptions,
};

/// A load request waiting on the current frame's dispatch, with the slots that were already
/// answered from the cache when the request arrived.
struct PendingLoad<K, V> {
    request: LoadRequest<K, V>,
    hits: Vec<Option<Option<V>>>,
}

/// A `LoaderWorker` is the "single-thread" worker task that actually does the loading work.
///
/// Once started, it runs in a loop until the parent Loader aborts it's `JoinHandle` or drops the
/// request queue tx channel.
///
/// The worker can be in one of three states during its lifetime:
///
/// 1. Waiting for requests
/// 2. Flushing the request queue and staging keys for loading.
/// 3. Executing its load batch function.
///
/// One cycle through this loop may be called an "execution frame".
///
/// In state (1), the worker awaits any messages on the request queue channel, idling until work
/// arrives.
///
/// In state (2), the worker pulls requests from the queue until there are no more pending
/// requests, then waits `batch_delay` and keeps pulling for as long as each wait turns up new
/// requests. On a multi-threaded runtime callers keep enqueueing while the worker runs, so the
/// queue being empty once does not mean the batch is complete. Prime and Clear requests are
/// resolved immediately against the cache. For Load requests, the worker answers what it can from
/// the cache. Requests that are fully cached are responded to at once; the remaining keys are
/// staged for loading, deduplicated by cache key in the order they were first seen.
///
/// In state (3), the loader invokes its `BatchFunction` with the keys staged in (2), split into
/// chunks when a maximum batch size is configured. Loaded values are inserted into the cache
/// unless a prime got there first, and every outstanding Load request is answered. A failed
/// dispatch fails each request's uncached keys with the same error; errors are never cached, so a
/// later request retries the key.
pub struct LoaderWorker<K, V, F, CacheT, ContextT>
where
    K: 'static + Debug + Clone + CacheKey + Send + Sync,
    V: 'static + Send + Sync + Debug + Clone,
    F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    CacheT: Cache,
    ContextT: Send + Sync + 'static,
{
    cache: CacheT,
    request_rx: mpsc::UnboundedReceiver<LoaderOp<K, V>>,
    keys_to_load: Vec<K>,
    staged: HashSet<String>,
    pending_request: Vec<PendingLoad<K, V>>,
    context: ContextT,
    options: LoaderOptions,
    phantom_batch_function: PhantomData<F>,
    debug_name: &'static str,
    #[cfg(feature = "stats")]
    stats: WorkerStats,
}

impl<K, V, F, CacheT, ContextT> LoaderWorker<K, V, F, CacheT, ContextT>
where
    K: 'static + Debug + Clone + CacheKey + Send + Sync,
    V: 'static + Send + Sync + Debug + Clone,
    F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    CacheT: Cache<K = String, V = Option<V>>,
    ContextT: Send + Sync + 'static,
{
    pub fn new(
        cache: CacheT,
        request_rx: mpsc::UnboundedReceiver<LoaderOp<K, V>>,
        context: ContextT,
        options: LoaderOptions,
    ) -> Self {
        let debug_name = std::any::type_name::<(K, V)>();
        Self {
            cache,
            request_rx,
            keys_to_load: Vec::new(),
            staged: HashSet::new(),
            pending_request: Vec::new(),
            context,
            options,
            phantom_batch_function: PhantomData,
            debug_name,
            #[cfg(feature = "stats")]
            stats: WorkerStats::new(debug_name),
        }
    }

    /// Span the worker future should be instrumented with.
    pub fn span(&self) -> Span {
        span!(Level::TRACE, "LoaderWorker", kv = self.debug_name)
    }

    pub async fn start(mut self) {
        loop {
            // Async await until we receive the first op.
            match self.request_rx.recv().await {
                None => {
                    tracing::info!("Tx channel closed. Terminating LoaderWorker.");
                    return;
                }
                Some(op) => self.mux_op(op),
            }
            self.collect_frame().await;
            if !self.pending_request.is_empty() {
                self.execute_load().await;
            }
        }
    }

    /// Flushes the op queue, then keeps waiting and flushing until a wait brings in nothing new.
    /// Returns at once when no load is waiting on a dispatch.
    async fn collect_frame(&mut self) {
        let delay = self.options.batch_delay();
        loop {
            while let Some(Some(op)) = self.request_rx.recv().now_or_never() {
                self.mux_op(op);
            }
            // Everything so far was answered from the cache.
            if self.pending_request.is_empty() {
                return;
            }
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
            match self.request_rx.recv().now_or_never() {
                Some(Some(op)) => self.mux_op(op),
                // Quiet, or the channel closed and the next `recv` reports it.
                _ => return,
            }
        }
    }

    #[tracing::instrument(skip(self))]
    fn mux_op(&mut self, op: LoaderOp<K, V>) {
        match op {
            LoaderOp::Load(request) => {
                let mut hits = Vec::with_capacity(request.keys().len());
                let mut missing = 0usize;
                for key in request.keys() {
                    let cache_key = key.cache_key();
                    match self.cache.get(&cache_key) {
                        Some(value) => hits.push(Some(value.clone())),
                        None => {
                            hits.push(None);
                            missing += 1;
                            if self.staged.insert(cache_key) {
                                self.keys_to_load.push(key.clone());
                            }
                        }
                    }
                }
                tracing::debug!(
                    requested_keys = ?request.keys(),
                    missing,
                    staged = self.keys_to_load.len()
                );
                #[cfg(feature = "stats")]
                {
                    self.stats.record_load_request(request.keys().len() as u32);
                    self.stats.record_cache_hits((request.keys().len() - missing) as u32);
                }
                if missing == 0 {
                    request.send_response(hits.into_iter().map(|hit| Ok(hit.flatten())));
                } else {
                    self.pending_request.push(PendingLoad { request, hits });
                }
            }
            LoaderOp::Prime(key, value) => self.prime(key, value),
            LoaderOp::PrimeMany(key_vals) => {
                for (key, value) in key_vals {
                    self.prime(key, value);
                }
            }
            LoaderOp::Clear(key) => self.cache.remove(&[key.cache_key()]),
            LoaderOp::ClearMany(keys) => {
                self.cache.remove(&keys.iter().map(CacheKey::cache_key).collect::<Vec<_>>())
            }
            LoaderOp::ClearAll => self.cache.flush(),
        }
    }

    fn prime(&mut self, key: K, value: V) {
        if self.options.cache {
            self.cache.replace(key.cache_key(), Some(value));
        }
    }

    #[tracing::instrument(skip(self))]
    async fn execute_load(&mut self) {
        let keys = std::mem::take(&mut self.keys_to_load);
        self.staged.clear();
        let chunk_size = self.options.max_batch_size.unwrap_or(keys.len()).max(1);

        #[cfg(feature = "stats")]
        self.stats.record_load_exec(
            self.pending_request
                .iter()
                .map(|pending| pending.hits.iter().filter(|hit| hit.is_none()).count())
                .sum::<usize>() as u32,
        );

        let context = &self.context;
        let chunk_results = future::join_all(
            keys.chunks(chunk_size).map(|chunk| Self::load_chunk(chunk, context)),
        )
        .await;

        let mut outcomes: HashMap<String, KeyResult<V>> = HashMap::with_capacity(keys.len());
        for (key, result) in keys.iter().zip(chunk_results.into_iter().flatten()) {
            let cache_key = key.cache_key();
            let result = match result {
                Ok(value) if self.options.cache => {
                    Ok(self.cache.get_or_insert(cache_key.clone(), value).clone())
                }
                other => other,
            };
            outcomes.insert(cache_key, result);
        }
        tracing::debug!(loaded = ?outcomes);

        #[cfg(feature = "stats")]
        self.stats.record_load_exec_completed(
            keys.len() as u32,
            outcomes.values().filter(|result| matches!(result, Ok(Some(_)))).count() as u32,
        );

        for PendingLoad { request, hits } in self.pending_request.drain(..) {
            let results = request
                .keys()
                .iter()
                .zip(hits)
                .map(|(key, hit)| match hit {
                    Some(value) => Ok(value),
                    None => outcomes.get(&key.cache_key()).cloned().unwrap_or(Ok(None)),
                })
                .collect::<Vec<_>>();
            request.send_response(results);
        }
    }

    /// Runs the batch function over one chunk, turning a dispatch-level failure into one error slot
    /// per key.
    async fn load_chunk(chunk: &[K], context: &ContextT) -> Vec<KeyResult<V>> {
        let err = match F::load(chunk, context).await {
            Ok(results) if results.len() == chunk.len() => return results,
            Ok(results) => {
                let err = LoadError::BatchLength { expected: chunk.len(), actual: results.len() };
                tracing::error!(%err, keys = ?chunk, "batch function broke its contract");
                err
            }
            Err(err) => {
                tracing::warn!(%err, keys = ?chunk, "batch load failed");
                err
            }
        };
        vec![Err(err); chunk.len()]
    }
}
