use std::sync::Arc;

use async_trait::async_trait;
use meeting_loaders::{
    atlassian::{AtlassianService, JiraClient, RefreshedToken},
    custom_loaders::{meeting_settings::MeetingSettingsKey, reactables::ReactableKey},
    logging::init_logging,
    records::{JiraProject, MeetingType, ReactableType},
    store::MemoryStore,
    AtlassianError, LoaderOptions, LoaderScope,
};
use serde_json::json;

// This demo never talks to Atlassian.
struct Offline;

#[async_trait]
impl AtlassianService for Offline {
    async fn refresh(&self, _: &str) -> Result<RefreshedToken, AtlassianError> {
        Err(AtlassianError::Request("offline".to_owned()))
    }

    fn client(&self, _: &str) -> Box<dyn JiraClient> {
        Box::new(Offline)
    }
}

#[async_trait]
impl JiraClient for Offline {
    async fn get_project(&self, _: &str, project_id: &str) -> Result<JiraProject, AtlassianError> {
        Err(AtlassianError::NotFound(project_id.to_owned()))
    }
}

#[tokio::main]
async fn main() {
    init_logging();

    let store = MemoryStore::new();
    store.insert(
        "Comment",
        json!({"id": "c1", "threadId": "r1", "createdBy": "u1", "content": "+1"}),
    );
    store.insert(
        "RetroReflection",
        json!({
            "id": "r1",
            "meetingId": "m1",
            "reflectionGroupId": "g1",
            "content": "standups ran long",
        }),
    );
    store.insert(
        "MeetingSettings",
        json!({"id": "s1", "teamId": "team1", "meetingType": "retrospective"}),
    );
    let store = Arc::new(store);

    let options = LoaderOptions::from_environment();
    let scope = LoaderScope::new(store.clone(), Arc::new(Offline), options);

    let (reactables, settings) = futures::join!(
        scope.reactables.load_many(vec![
            ReactableKey::new("c1", ReactableType::Comment),
            ReactableKey::new("r1", ReactableType::Reflection),
            ReactableKey::new("c1", ReactableType::Comment),
        ]),
        scope
            .meeting_settings_by_type
            .load(MeetingSettingsKey::new("team1", MeetingType::Retrospective)),
    );

    for reactable in reactables.into_iter().flatten().flatten() {
        println!("reactable {}", reactable.id());
    }
    if let Ok(Some(settings)) = settings {
        println!("settings {} for {}", settings.id, settings.team_id);
    }
    println!("{} store queries", store.queries().len());
}
