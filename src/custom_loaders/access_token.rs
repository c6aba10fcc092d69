use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::future;
use serde_json::Value;

use super::LoaderContext;
use crate::{
    atlassian::is_token_fresh,
    batch_function::BatchFunction,
    cache_key::{join_parts, CacheKey},
    error::{KeyResult, LoadError},
    loader::Loader,
    records::{AtlassianAuth, Record},
    store::{Document, Filter, Query},
};

/// The Atlassian access token a user holds for a team.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessTokenKey {
    pub user_id: String,
    pub team_id: String,
}

impl AccessTokenKey {
    pub fn new(user_id: impl Into<String>, team_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), team_id: team_id.into() }
    }
}

impl CacheKey for AccessTokenKey {
    fn cache_key(&self) -> String {
        join_parts([self.user_id.as_str(), self.team_id.as_str()])
    }
}

/// Returns a usable access token for each key, refreshing and persisting expired ones. Keys are
/// resolved independently: one key failing leaves the others untouched.
pub struct FreshAtlassianAccessToken;

#[async_trait]
impl BatchFunction<AccessTokenKey, String> for FreshAtlassianAccessToken {
    type Context = Arc<LoaderContext>;

    async fn load(
        keys: &[AccessTokenKey],
        context: &Arc<LoaderContext>,
    ) -> Result<Vec<KeyResult<String>>, LoadError> {
        let results =
            future::join_all(keys.iter().map(|key| fresh_access_token(key, context))).await;
        for (key, result) in keys.iter().zip(&results) {
            if let Err(err) = result {
                tracing::warn!(
                    user_id = %key.user_id,
                    team_id = %key.team_id,
                    %err,
                    "access token unavailable"
                );
            }
        }
        Ok(results)
    }
}

async fn fresh_access_token(key: &AccessTokenKey, context: &LoaderContext) -> KeyResult<String> {
    let auths = context
        .entities
        .atlassian_auth_by_user_id
        .load(key.user_id.clone())
        .await?
        .unwrap_or_default();
    let Some(auth) = auths.iter().find(|auth| auth.team_id == key.team_id) else {
        return Ok(None);
    };
    let Some(refresh_token) = auth.refresh_token.as_deref().filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    let now = Utc::now();
    if let Some(existing) = auth.access_token.as_deref() {
        if is_token_fresh(existing, now.timestamp()) {
            return Ok(Some(existing.to_owned()));
        }
    }

    tracing::debug!(user_id = %key.user_id, team_id = %key.team_id, "refreshing access token");
    let refreshed = context.atlassian.refresh(refresh_token).await?;

    let query = Query::get_all(AtlassianAuth::TABLE, "userId", [key.user_id.as_str()])
        .filter(Filter::eq("teamId", key.team_id.as_str()));
    let mut patch = Document::new();
    patch.insert("accessToken".to_owned(), Value::String(refreshed.access_token.clone()));
    patch.insert("updatedAt".to_owned(), Value::String(now.to_rfc3339()));
    context.store.update(&query, patch).await?;

    Ok(Some(refreshed.access_token))
}

pub fn loader(context: &Arc<LoaderContext>) -> Loader<AccessTokenKey, String> {
    Loader::with_options(FreshAtlassianAccessToken, context.clone(), context.options.clone())
}
