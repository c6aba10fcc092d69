use std::sync::Arc;

use async_trait::async_trait;

use super::LoaderContext;
use crate::{
    batch_function::BatchFunction,
    cache_key::{join_parts, CacheKey},
    error::{KeyResult, LoadError},
    loader::Loader,
    records::{ThreadSource, ThreadSourceType},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadSourceKey {
    pub source_id: String,
    pub source_type: ThreadSourceType,
}

impl ThreadSourceKey {
    pub fn new(source_id: impl Into<String>, source_type: ThreadSourceType) -> Self {
        Self { source_id: source_id.into(), source_type }
    }
}

impl CacheKey for ThreadSourceKey {
    fn cache_key(&self) -> String {
        join_parts([self.source_id.as_str(), self.source_type.as_str()])
    }
}

/// Resolves agenda items and reflection groups that threads are attached to.
pub struct ThreadSources;

#[async_trait]
impl BatchFunction<ThreadSourceKey, ThreadSource> for ThreadSources {
    type Context = Arc<LoaderContext>;

    async fn load(
        keys: &[ThreadSourceKey],
        context: &Arc<LoaderContext>,
    ) -> Result<Vec<KeyResult<ThreadSource>>, LoadError> {
        let ids_of = |source_type: ThreadSourceType| {
            keys.iter()
                .filter(|key| key.source_type == source_type)
                .map(|key| key.source_id.clone())
                .collect::<Vec<_>>()
        };
        let entities = &context.entities;
        let (agenda_items, groups) = futures::join!(
            entities.agenda_items.load_many(ids_of(ThreadSourceType::AgendaItem)),
            entities.retro_reflection_groups.load_many(ids_of(ThreadSourceType::ReflectionGroup)),
        );

        let mut agenda_items = agenda_items.into_iter();
        let mut groups = groups.into_iter();
        Ok(keys
            .iter()
            .map(|key| match key.source_type {
                ThreadSourceType::AgendaItem => {
                    agenda_items.next().unwrap_or(Ok(None)).map(|i| i.map(ThreadSource::AgendaItem))
                }
                ThreadSourceType::ReflectionGroup => {
                    groups.next().unwrap_or(Ok(None)).map(|g| g.map(ThreadSource::ReflectionGroup))
                }
            })
            .collect())
    }
}

pub fn loader(context: &Arc<LoaderContext>) -> Loader<ThreadSourceKey, ThreadSource> {
    Loader::with_options(ThreadSources, context.clone(), context.options.clone())
}
