use std::sync::Arc;

use async_trait::async_trait;

use super::LoaderContext;
use crate::{
    batch_function::BatchFunction,
    cache_key::{join_parts, CacheKey},
    error::{KeyResult, LoadError},
    loader::Loader,
    records::{Reactable, ReactableType},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReactableKey {
    pub id: String,
    pub reactable_type: ReactableType,
}

impl ReactableKey {
    pub fn new(id: impl Into<String>, reactable_type: ReactableType) -> Self {
        Self { id: id.into(), reactable_type }
    }
}

impl CacheKey for ReactableKey {
    fn cache_key(&self) -> String {
        join_parts([self.id.as_str(), self.reactable_type.as_str()])
    }
}

/// Resolves comments and reflections through their entity loaders, one `load_many` per type.
pub struct Reactables;

#[async_trait]
impl BatchFunction<ReactableKey, Reactable> for Reactables {
    type Context = Arc<LoaderContext>;

    async fn load(
        keys: &[ReactableKey],
        context: &Arc<LoaderContext>,
    ) -> Result<Vec<KeyResult<Reactable>>, LoadError> {
        let ids_of = |reactable_type: ReactableType| {
            keys.iter()
                .filter(|key| key.reactable_type == reactable_type)
                .map(|key| key.id.clone())
                .collect::<Vec<_>>()
        };
        let entities = &context.entities;
        let (comments, reflections) = futures::join!(
            entities.comments.load_many(ids_of(ReactableType::Comment)),
            entities.retro_reflections.load_many(ids_of(ReactableType::Reflection)),
        );

        // Each entity result is aligned with the keys of its type, in key order.
        let mut comments = comments.into_iter();
        let mut reflections = reflections.into_iter();
        Ok(keys
            .iter()
            .map(|key| match key.reactable_type {
                ReactableType::Comment => {
                    comments.next().unwrap_or(Ok(None)).map(|c| c.map(Reactable::Comment))
                }
                ReactableType::Reflection => {
                    reflections.next().unwrap_or(Ok(None)).map(|r| r.map(Reactable::Reflection))
                }
            })
            .collect())
    }
}

pub fn loader(context: &Arc<LoaderContext>) -> Loader<ReactableKey, Reactable> {
    Loader::with_options(Reactables, context.clone(), context.options.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_joins_id_and_type() {
        assert_eq!(ReactableKey::new("c1", ReactableType::Comment).cache_key(), "c1:COMMENT");
        assert_ne!(
            ReactableKey::new("x", ReactableType::Comment).cache_key(),
            ReactableKey::new("x", ReactableType::Reflection).cache_key()
        );
    }
}
