//! Documents read through the loaders, as stored in the document store.

use std::fmt::Debug;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A document type that lives in its own table and is addressed by an `id` field.
pub trait Record: DeserializeOwned + Debug + Send + Sync + 'static {
    const TABLE: &'static str;

    fn id(&self) -> &str;
}

macro_rules! record {
    ($ty:ty, $table:literal) => {
        impl Record for $ty {
            const TABLE: &'static str = $table;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub thread_id: String,
    pub created_by: String,
    pub content: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetroReflection {
    pub id: String,
    pub meeting_id: String,
    pub reflection_group_id: String,
    pub content: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaItem {
    pub id: String,
    pub team_id: String,
    pub team_member_id: String,
    pub content: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetroReflectionGroup {
    pub id: String,
    pub meeting_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub team_id: String,
    pub content: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtlassianAuth {
    pub id: String,
    pub user_id: String,
    pub team_id: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub cloud_ids: Vec<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSettings {
    pub id: String,
    pub team_id: String,
    pub meeting_type: MeetingType,
    #[serde(default)]
    pub phase_types: Vec<String>,
}

record!(Comment, "Comment");
record!(RetroReflection, "RetroReflection");
record!(AgendaItem, "AgendaItem");
record!(RetroReflectionGroup, "RetroReflectionGroup");
record!(Task, "Task");
record!(AtlassianAuth, "AtlassianAuth");
record!(MeetingSettings, "MeetingSettings");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactableType {
    Comment,
    Reflection,
}

impl ReactableType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReactableType::Comment => "COMMENT",
            ReactableType::Reflection => "REFLECTION",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreadSourceType {
    AgendaItem,
    ReflectionGroup,
}

impl ThreadSourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ThreadSourceType::AgendaItem => "AGENDA_ITEM",
            ThreadSourceType::ReflectionGroup => "REFLECTION_GROUP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingType {
    Action,
    Retrospective,
}

impl MeetingType {
    pub fn as_str(self) -> &'static str {
        match self {
            MeetingType::Action => "action",
            MeetingType::Retrospective => "retrospective",
        }
    }
}

/// Something that can carry reactions.
#[derive(Debug, Clone, PartialEq)]
pub enum Reactable {
    Comment(Arc<Comment>),
    Reflection(Arc<RetroReflection>),
}

impl Reactable {
    pub fn id(&self) -> &str {
        match self {
            Reactable::Comment(comment) => &comment.id,
            Reactable::Reflection(reflection) => &reflection.id,
        }
    }
}

/// Something a discussion thread hangs off.
#[derive(Debug, Clone, PartialEq)]
pub enum ThreadSource {
    AgendaItem(Arc<AgendaItem>),
    ReflectionGroup(Arc<RetroReflectionGroup>),
}

impl ThreadSource {
    pub fn id(&self) -> &str {
        match self {
            ThreadSource::AgendaItem(item) => &item.id,
            ThreadSource::ReflectionGroup(group) => &group.id,
        }
    }
}

/// A Jira project as returned by the Atlassian API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraProject {
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn enums_use_wire_names() {
        assert_eq!(serde_json::to_value(ReactableType::Comment).unwrap(), json!("COMMENT"));
        assert_eq!(
            serde_json::to_value(ThreadSourceType::ReflectionGroup).unwrap(),
            json!(ThreadSourceType::ReflectionGroup.as_str())
        );
        assert_eq!(
            serde_json::to_value(MeetingType::Retrospective).unwrap(),
            json!("retrospective")
        );
    }

    #[test]
    fn task_decodes_camel_case_with_defaults() {
        let task: Task = serde_json::from_value(json!({
            "id": "t1",
            "userId": "u1",
            "teamId": "team1",
            "content": "write the notes",
        }))
        .unwrap();
        assert_eq!(task.user_id, "u1");
        assert!(task.tags.is_empty());
        assert_eq!(Record::id(&task), "t1");
    }
}
