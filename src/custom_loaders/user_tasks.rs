use std::collections::HashSet;
use std::iter;
use std::sync::Arc;

use async_trait::async_trait;

use super::LoaderContext;
use crate::{
    batch_function::BatchFunction,
    cache_key::{join_parts, CacheKey},
    error::{KeyResult, LoadError},
    loader::Loader,
    records::{Record, Task},
    store::{decode, Filter, Query},
};

const ARCHIVED_TAG: &str = "archived";

/// The unarchived tasks of one user on any of the given teams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTasksKey {
    pub user_id: String,
    pub team_ids: Vec<String>,
}

impl UserTasksKey {
    pub fn new<I, S>(user_id: impl Into<String>, team_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { user_id: user_id.into(), team_ids: team_ids.into_iter().map(Into::into).collect() }
    }
}

impl CacheKey for UserTasksKey {
    /// Team order does not matter.
    fn cache_key(&self) -> String {
        let mut team_ids = self.team_ids.iter().map(String::as_str).collect::<Vec<_>>();
        team_ids.sort_unstable();
        join_parts(iter::once(self.user_id.as_str()).chain(team_ids))
    }
}

/// Fetches the tasks of every requested user in one query, then splits them per key. Fetched tasks
/// are primed into the `tasks` entity loader.
pub struct UserTasks;

#[async_trait]
impl BatchFunction<UserTasksKey, Vec<Arc<Task>>> for UserTasks {
    type Context = Arc<LoaderContext>;

    async fn load(
        keys: &[UserTasksKey],
        context: &Arc<LoaderContext>,
    ) -> Result<Vec<KeyResult<Vec<Arc<Task>>>>, LoadError> {
        let user_ids = unique(keys.iter().map(|key| key.user_id.as_str()));
        let team_ids = unique(keys.iter().flat_map(|key| key.team_ids.iter().map(String::as_str)));

        let query = Query::get_all(Task::TABLE, "userId", user_ids)
            .filter(Filter::is_in("teamId", team_ids))
            .filter(Filter::not_contains("tags", ARCHIVED_TAG));
        let docs = context.store.run(&query).await?;
        let tasks = decode::<Task>(Task::TABLE, docs)?
            .into_iter()
            .map(Arc::new)
            .collect::<Vec<_>>();
        tracing::debug!(keys = keys.len(), tasks = tasks.len(), "loaded user tasks");

        context
            .entities
            .tasks
            .prime_many(tasks.iter().map(|task| (task.id.clone(), task.clone())).collect())
            .await;

        Ok(keys
            .iter()
            .map(|key| {
                let matching = tasks
                    .iter()
                    .filter(|task| {
                        task.user_id == key.user_id && key.team_ids.contains(&task.team_id)
                    })
                    .cloned()
                    .collect::<Vec<_>>();
                Ok(Some(matching))
            })
            .collect())
    }
}

/// Distinct values in first-seen order.
fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values.filter(|value| seen.insert(*value)).map(str::to_owned).collect()
}

pub fn loader(context: &Arc<LoaderContext>) -> Loader<UserTasksKey, Vec<Arc<Task>>> {
    Loader::with_options(UserTasks, context.clone(), context.options.clone())
}
