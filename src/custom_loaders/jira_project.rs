use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future;

use super::LoaderContext;
use crate::{
    batch_function::BatchFunction,
    cache_key::{join_parts, CacheKey},
    error::{KeyResult, LoadError},
    loader::Loader,
    records::JiraProject,
};

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct JiraRemoteProjectKey {
    pub access_token: String,
    pub cloud_id: String,
    pub atlassian_project_id: String,
}

impl JiraRemoteProjectKey {
    pub fn new(
        access_token: impl Into<String>,
        cloud_id: impl Into<String>,
        atlassian_project_id: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            cloud_id: cloud_id.into(),
            atlassian_project_id: atlassian_project_id.into(),
        }
    }
}

// Keys end up in trace output; keep the token out of it.
impl fmt::Debug for JiraRemoteProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraRemoteProjectKey")
            .field("access_token", &"<redacted>")
            .field("cloud_id", &self.cloud_id)
            .field("atlassian_project_id", &self.atlassian_project_id)
            .finish()
    }
}

impl CacheKey for JiraRemoteProjectKey {
    /// The access token is not part of the identity: the same project on the same cloud is one
    /// entry no matter which token asked for it. Only the first token seen in a frame is used.
    fn cache_key(&self) -> String {
        join_parts([self.atlassian_project_id.as_str(), self.cloud_id.as_str()])
    }
}

/// Fetches Jira projects, one API call per key, with failures isolated per key.
pub struct JiraRemoteProject;

#[async_trait]
impl BatchFunction<JiraRemoteProjectKey, JiraProject> for JiraRemoteProject {
    type Context = Arc<LoaderContext>;

    async fn load(
        keys: &[JiraRemoteProjectKey],
        context: &Arc<LoaderContext>,
    ) -> Result<Vec<KeyResult<JiraProject>>, LoadError> {
        let fetches = keys.iter().map(|key| async move {
            let client = context.atlassian.client(&key.access_token);
            let result = client.get_project(&key.cloud_id, &key.atlassian_project_id).await;
            if let Err(err) = &result {
                tracing::warn!(?key, %err, "could not fetch Jira project");
            }
            result.map(Some).map_err(LoadError::from)
        });
        Ok(future::join_all(fetches).await)
    }
}

pub fn loader(context: &Arc<LoaderContext>) -> Loader<JiraRemoteProjectKey, JiraProject> {
    Loader::with_options(JiraRemoteProject, context.clone(), context.options.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_ignores_access_token() {
        let a = JiraRemoteProjectKey::new("token-a", "cloud", "10001");
        let b = JiraRemoteProjectKey::new("token-b", "cloud", "10001");
        assert_eq!(a.cache_key(), "10001:cloud");
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn debug_redacts_token() {
        let key = JiraRemoteProjectKey::new("secret", "cloud", "10001");
        assert!(!format!("{key:?}").contains("secret"));
    }
}
