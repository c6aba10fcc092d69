use std::sync::Arc;

use async_trait::async_trait;
use futures::future;

use super::LoaderContext;
use crate::{
    batch_function::BatchFunction,
    cache_key::{join_parts, CacheKey},
    error::{KeyResult, LoadError},
    loader::Loader,
    records::{MeetingSettings, MeetingType, Record},
    store::{decode, Filter, Query},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeetingSettingsKey {
    pub team_id: String,
    pub meeting_type: MeetingType,
}

impl MeetingSettingsKey {
    pub fn new(team_id: impl Into<String>, meeting_type: MeetingType) -> Self {
        Self { team_id: team_id.into(), meeting_type }
    }
}

impl CacheKey for MeetingSettingsKey {
    fn cache_key(&self) -> String {
        join_parts([self.team_id.as_str(), self.meeting_type.as_str()])
    }
}

/// Loads each team's settings for a meeting type, one query per distinct type.
///
/// Every team has settings for every meeting type, so a missing row fails the whole frame.
pub struct MeetingSettingsByType;

#[async_trait]
impl BatchFunction<MeetingSettingsKey, Arc<MeetingSettings>> for MeetingSettingsByType {
    type Context = Arc<LoaderContext>;

    async fn load(
        keys: &[MeetingSettingsKey],
        context: &Arc<LoaderContext>,
    ) -> Result<Vec<KeyResult<Arc<MeetingSettings>>>, LoadError> {
        let mut team_ids_by_type: Vec<(MeetingType, Vec<&str>)> = Vec::new();
        for key in keys {
            match team_ids_by_type.iter().position(|(t, _)| *t == key.meeting_type) {
                Some(i) => team_ids_by_type[i].1.push(key.team_id.as_str()),
                None => team_ids_by_type.push((key.meeting_type, vec![key.team_id.as_str()])),
            }
        }
        tracing::debug!(?team_ids_by_type, "loading meeting settings");

        let queries = team_ids_by_type.iter().map(|(meeting_type, team_ids)| {
            Query::get_all(MeetingSettings::TABLE, "teamId", team_ids.iter().copied())
                .filter(Filter::eq("meetingType", meeting_type.as_str()))
        });
        let docs = future::try_join_all(queries.map(|query| async move {
            context.store.run(&query).await
        }))
        .await?;
        let settings = decode::<MeetingSettings>(
            MeetingSettings::TABLE,
            docs.into_iter().flatten().collect(),
        )?
        .into_iter()
        .map(Arc::new)
        .collect::<Vec<_>>();

        keys.iter()
            .map(|key| {
                settings
                    .iter()
                    .find(|s| s.team_id == key.team_id && s.meeting_type == key.meeting_type)
                    .map(|s| Ok(Some(s.clone())))
                    .ok_or_else(|| {
                        let err = LoadError::Invariant(format!(
                            "team {} has no {} meeting settings",
                            key.team_id,
                            key.meeting_type.as_str()
                        ));
                        tracing::error!(%err);
                        err
                    })
            })
            .collect()
    }
}

pub fn loader(context: &Arc<LoaderContext>) -> Loader<MeetingSettingsKey, Arc<MeetingSettings>> {
    Loader::with_options(MeetingSettingsByType, context.clone(), context.options.clone())
}
