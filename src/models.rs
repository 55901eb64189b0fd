use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub project_group_id: String,
}

// `projects/{id}` returns far more than `projects/all`; the only extra field
// we need is the git URL, which exists only for version-controlled projects.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectDetail {
    pub id: String,
    #[serde(default)]
    pub persistence_settings: Option<PersistenceSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PersistenceSettings {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectGroup {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Environment {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentPage {
    pub items: Vec<Deployment>,
}

// The server returns deployments most-recent-first; the resolver relies on
// that ordering.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Deployment {
    pub id: String,
    pub release_id: String,
    pub task_id: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Release {
    pub version: String,
    #[serde(default)]
    pub release_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskRecord {
    pub state: TaskState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TaskState {
    Success,
    Failed,
    Unknown,
    // Queued, Executing, Canceling, ...
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_page_parses_octopus_payload() {
        let page: DeploymentPage = serde_json::from_str(
            r#"{
                "ItemType": "Deployment",
                "TotalResults": 1,
                "Items": [{
                    "Id": "Deployments-42",
                    "ReleaseId": "Releases-7",
                    "TaskId": "ServerTasks-1234",
                    "Created": "2024-01-01T00:00:00.000+00:00",
                    "ProjectId": "Projects-1"
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].release_id, "Releases-7");
    }

    #[test]
    fn unrecognized_task_state_maps_to_other() {
        let task: TaskRecord = serde_json::from_str(r#"{"State": "Executing"}"#).unwrap();
        assert_eq!(task.state, TaskState::Other);

        let task: TaskRecord = serde_json::from_str(r#"{"State": "Failed"}"#).unwrap();
        assert_eq!(task.state, TaskState::Failed);
    }

    #[test]
    fn project_detail_without_git_url() {
        let detail: ProjectDetail = serde_json::from_str(
            r#"{"Id": "Projects-1", "PersistenceSettings": {"Type": "Database"}}"#,
        )
        .unwrap();
        assert!(detail.persistence_settings.unwrap().url.is_none());
    }
}
