use std::sync::Arc;

use crate::{
    atlassian::AtlassianService,
    custom_loaders::{
        access_token::{self, AccessTokenKey},
        jira_project::{self, JiraRemoteProjectKey},
        meeting_settings::{self, MeetingSettingsKey},
        reactables::{self, ReactableKey},
        thread_sources::{self, ThreadSourceKey},
        user_tasks::{self, UserTasksKey},
        LoaderContext,
    },
    entity_loaders::EntityLoaders,
    loader::Loader,
    options::LoaderOptions,
    records::{JiraProject, MeetingSettings, Reactable, Task, ThreadSource},
    store::DocumentStore,
};

/// Every loader of one request, created when the request starts and dropped when it ends.
///
/// Nothing is shared between scopes: each owns its caches and worker tasks. Must be created inside
/// a tokio runtime.
pub struct LoaderScope {
    pub entities: Arc<EntityLoaders>,
    pub reactables: Loader<ReactableKey, Reactable>,
    pub thread_sources: Loader<ThreadSourceKey, ThreadSource>,
    pub user_tasks: Loader<UserTasksKey, Vec<Arc<Task>>>,
    pub fresh_atlassian_access_token: Loader<AccessTokenKey, String>,
    pub jira_remote_project: Loader<JiraRemoteProjectKey, JiraProject>,
    pub meeting_settings_by_type: Loader<MeetingSettingsKey, Arc<MeetingSettings>>,
}

impl LoaderScope {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        atlassian: Arc<dyn AtlassianService>,
        options: LoaderOptions,
    ) -> Self {
        let entities = Arc::new(EntityLoaders::new(store.clone(), &options));
        let context =
            Arc::new(LoaderContext { store, entities: entities.clone(), atlassian, options });
        tracing::trace!("created loader scope");
        Self {
            entities,
            reactables: reactables::loader(&context),
            thread_sources: thread_sources::loader(&context),
            user_tasks: user_tasks::loader(&context),
            fresh_atlassian_access_token: access_token::loader(&context),
            jira_remote_project: jira_project::loader(&context),
            meeting_settings_by_type: meeting_settings::loader(&context),
        }
    }
}
