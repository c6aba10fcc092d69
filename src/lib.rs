mod batch_function;
mod cache;
mod cache_key;
mod error;
mod loader;
mod loader_op;
mod loader_worker;
mod normalize;
mod options;
#[cfg(feature = "stats")]
mod worker_stats;

pub mod atlassian;
pub mod custom_loaders;
pub mod entity_loaders;
pub mod logging;
pub mod records;
pub mod scope;
pub mod store;

pub use batch_function::BatchFunction;
pub use cache_key::{join_parts, CacheKey};
pub use error::{AtlassianError, KeyResult, LoadError, StoreError};
pub use loader::Loader;
pub use normalize::normalize_results;
pub use options::LoaderOptions;
pub use scope::LoaderScope;
