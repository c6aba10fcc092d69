//! Loaders that fetch single documents by id, plus the Atlassian auth rows of a user. The custom
//! loaders are built on top of these.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    batch_function::BatchFunction,
    error::{KeyResult, LoadError},
    loader::Loader,
    normalize::normalize_results,
    options::LoaderOptions,
    records::{
        AgendaItem, AtlassianAuth, Comment, Record, RetroReflection, RetroReflectionGroup, Task,
    },
    store::{decode, DocumentStore, Query},
};

/// Batch function loading records of type `T` from their table by primary key.
pub struct RecordsById<T>(PhantomData<fn() -> T>);

impl<T> Default for RecordsById<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

#[async_trait]
impl<T: Record> BatchFunction<String, Arc<T>> for RecordsById<T> {
    type Context = Arc<dyn DocumentStore>;

    async fn load(
        ids: &[String],
        store: &Arc<dyn DocumentStore>,
    ) -> Result<Vec<KeyResult<Arc<T>>>, LoadError> {
        let docs = store.run(&Query::get_all(T::TABLE, "id", ids.iter().cloned())).await?;
        let records = decode::<T>(T::TABLE, docs)?.into_iter().map(Arc::new).collect();
        Ok(normalize_results(ids, records, |r: &Arc<T>| r.id()).into_iter().map(Ok).collect())
    }
}

/// Batch function loading every `AtlassianAuth` row of each requested user. Users without rows get
/// an empty list.
pub struct AtlassianAuthByUserId;

#[async_trait]
impl BatchFunction<String, Arc<Vec<AtlassianAuth>>> for AtlassianAuthByUserId {
    type Context = Arc<dyn DocumentStore>;

    async fn load(
        user_ids: &[String],
        store: &Arc<dyn DocumentStore>,
    ) -> Result<Vec<KeyResult<Arc<Vec<AtlassianAuth>>>>, LoadError> {
        let table = AtlassianAuth::TABLE;
        let docs = store.run(&Query::get_all(table, "userId", user_ids.iter().cloned())).await?;
        let mut by_user: HashMap<String, Vec<AtlassianAuth>> = HashMap::new();
        for auth in decode::<AtlassianAuth>(table, docs)? {
            by_user.entry(auth.user_id.clone()).or_default().push(auth);
        }
        Ok(user_ids
            .iter()
            .map(|user_id| Ok(Some(Arc::new(by_user.remove(user_id).unwrap_or_default()))))
            .collect())
    }
}

/// Per-entity loaders of one request scope.
pub struct EntityLoaders {
    pub comments: Loader<String, Arc<Comment>>,
    pub retro_reflections: Loader<String, Arc<RetroReflection>>,
    pub agenda_items: Loader<String, Arc<AgendaItem>>,
    pub retro_reflection_groups: Loader<String, Arc<RetroReflectionGroup>>,
    pub tasks: Loader<String, Arc<Task>>,
    pub atlassian_auth_by_user_id: Loader<String, Arc<Vec<AtlassianAuth>>>,
}

impl EntityLoaders {
    pub fn new(store: Arc<dyn DocumentStore>, options: &LoaderOptions) -> Self {
        Self {
            comments: by_id(&store, options),
            retro_reflections: by_id(&store, options),
            agenda_items: by_id(&store, options),
            retro_reflection_groups: by_id(&store, options),
            tasks: by_id(&store, options),
            atlassian_auth_by_user_id: Loader::with_options(
                AtlassianAuthByUserId,
                store,
                options.clone(),
            ),
        }
    }
}

fn by_id<T: Record>(
    store: &Arc<dyn DocumentStore>,
    options: &LoaderOptions,
) -> Loader<String, Arc<T>> {
    Loader::with_options(RecordsById::<T>::default(), store.clone(), options.clone())
}
