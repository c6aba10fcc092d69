//! Loaders whose keys are composite records rather than a single id.
//!
//! Each submodule defines its key type, the key's [`CacheKey`](crate::CacheKey), the batch
//! function, and a `loader` constructor taking the scope's [`LoaderContext`].

use std::sync::Arc;

use crate::{
    atlassian::AtlassianService, entity_loaders::EntityLoaders, options::LoaderOptions,
    store::DocumentStore,
};

pub mod access_token;
pub mod jira_project;
pub mod meeting_settings;
pub mod reactables;
pub mod thread_sources;
pub mod user_tasks;

/// What the custom loaders of one request scope share.
pub struct LoaderContext {
    pub store: Arc<dyn DocumentStore>,
    pub entities: Arc<EntityLoaders>,
    pub atlassian: Arc<dyn AtlassianService>,
    pub options: LoaderOptions,
}
