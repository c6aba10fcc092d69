#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use meeting_loaders::{
    atlassian::{AtlassianService, JiraClient, RefreshedToken},
    logging::init_logging,
    records::JiraProject,
    store::MemoryStore,
    AtlassianError, LoaderOptions, LoaderScope,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Atlassian fake that records calls and serves projects keyed by `(cloud_id, project_id)`.
#[derive(Default)]
pub struct FakeAtlassian {
    refreshes: Mutex<Vec<String>>,
    fetches: Arc<Mutex<Vec<FetchCall>>>,
    projects: Arc<HashMap<(String, String), JiraProject>>,
    failing_refresh_tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub access_token: String,
    pub cloud_id: String,
    pub project_id: String,
}

impl FakeAtlassian {
    pub fn with_projects(projects: Vec<(&str, JiraProject)>) -> Self {
        let projects = projects
            .into_iter()
            .map(|(cloud_id, project)| ((cloud_id.to_owned(), project.id.clone()), project))
            .collect();
        Self { projects: Arc::new(projects), ..Self::default() }
    }

    pub fn failing_refresh(tokens: &[&str]) -> Self {
        Self {
            failing_refresh_tokens: tokens.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn refreshes(&self) -> Vec<String> {
        self.refreshes.lock().clone()
    }

    pub fn fetches(&self) -> Vec<FetchCall> {
        self.fetches.lock().clone()
    }
}

#[async_trait]
impl AtlassianService for FakeAtlassian {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, AtlassianError> {
        self.refreshes.lock().push(refresh_token.to_owned());
        if self.failing_refresh_tokens.iter().any(|t| t == refresh_token) {
            return Err(AtlassianError::Refresh("invalid_grant".to_owned()));
        }
        Ok(RefreshedToken { access_token: format!("new-access-for-{refresh_token}") })
    }

    fn client(&self, access_token: &str) -> Box<dyn JiraClient> {
        Box::new(FakeJiraClient {
            access_token: access_token.to_owned(),
            projects: self.projects.clone(),
            fetches: self.fetches.clone(),
        })
    }
}

struct FakeJiraClient {
    access_token: String,
    projects: Arc<HashMap<(String, String), JiraProject>>,
    fetches: Arc<Mutex<Vec<FetchCall>>>,
}

#[async_trait]
impl JiraClient for FakeJiraClient {
    async fn get_project(
        &self,
        cloud_id: &str,
        project_id: &str,
    ) -> Result<JiraProject, AtlassianError> {
        self.fetches.lock().push(FetchCall {
            access_token: self.access_token.clone(),
            cloud_id: cloud_id.to_owned(),
            project_id: project_id.to_owned(),
        });
        self.projects
            .get(&(cloud_id.to_owned(), project_id.to_owned()))
            .cloned()
            .ok_or_else(|| AtlassianError::NotFound(format!("project {project_id}")))
    }
}

pub fn project(id: &str, name: &str) -> JiraProject {
    JiraProject {
        id: id.to_owned(),
        key: name.to_uppercase(),
        name: name.to_owned(),
        avatar_url: None,
    }
}

/// An unsigned JWT carrying only an expiry.
pub fn token_expiring_at(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"user","exp":{exp}}}"#));
    format!("{header}.{claims}.sig")
}

pub fn scope(store: &Arc<MemoryStore>, atlassian: &Arc<FakeAtlassian>) -> LoaderScope {
    init_logging();
    LoaderScope::new(store.clone(), atlassian.clone(), LoaderOptions::default())
}

/// Store seeded with a little of everything.
pub fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    for (id, thread_id) in [("c1", "r1"), ("c2", "r1")] {
        store.insert(
            "Comment",
            json!({
                "id": id,
                "threadId": thread_id,
                "createdBy": "u1",
                "content": "nice",
                "isActive": true,
            }),
        );
    }
    store.insert(
        "RetroReflection",
        json!({"id": "r1", "meetingId": "m1", "reflectionGroupId": "g1", "content": "went well"}),
    );
    store.insert(
        "AgendaItem",
        json!({
            "id": "a1",
            "teamId": "team1",
            "teamMemberId": "u1::team1",
            "content": "hiring",
        }),
    );
    store.insert(
        "RetroReflectionGroup",
        json!({"id": "g1", "meetingId": "m1", "title": "Process"}),
    );

    let tasks: [(&str, &str, &str, Value); 5] = [
        ("t1", "u1", "team1", json!([])),
        ("t2", "u1", "team2", json!([])),
        ("t3", "u1", "team1", json!(["archived"])),
        ("t4", "u2", "team1", json!(["private"])),
        ("t5", "u2", "team3", json!([])),
    ];
    for (id, user_id, team_id, tags) in tasks {
        store.insert(
            "Task",
            json!({"id": id, "userId": user_id, "teamId": team_id, "content": id, "tags": tags}),
        );
    }

    for (team_id, meeting_type) in
        [("team1", "action"), ("team1", "retrospective"), ("team2", "retrospective")]
    {
        store.insert(
            "MeetingSettings",
            json!({
                "id": format!("{team_id}-{meeting_type}"),
                "teamId": team_id,
                "meetingType": meeting_type,
                "phaseTypes": ["checkin"],
            }),
        );
    }
    Arc::new(store)
}
