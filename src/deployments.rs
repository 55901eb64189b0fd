//! Per-pair deployment resolution: pagination plus latest/last-successful
//! lookup for one project/environment combination. Resolution is strictly
//! local to its pair; any failure collapses to `None` and never reaches
//! sibling pairs.

use chrono_tz::Tz;

use crate::client::DeployApi;
use crate::models::{Deployment, TaskState};
use crate::report::EnvironmentReport;

/// Fetch the full deployment history for one pair, newest first.
///
/// Pages are accumulated until one comes back short, empty, or failed;
/// whatever was gathered by then is the result. Partial history is fine,
/// it only means the last-successful scan has less to look at.
pub async fn fetch_deployments(
    api: &dyn DeployApi,
    project_id: &str,
    environment_id: &str,
    page_size: usize,
) -> Vec<Deployment> {
    tracing::debug!("Fetching deployments for project {project_id} and environment {environment_id}");
    let mut all = Vec::new();
    let mut skip = 0;

    loop {
        let Some(page) = api
            .deployments_page(project_id, environment_id, skip, page_size)
            .await
        else {
            break;
        };
        let count = page.items.len();
        if count == 0 {
            break;
        }
        all.extend(page.items);
        tracing::debug!("Fetched {count} deployments (total: {})", all.len());
        if count < page_size {
            break;
        }
        skip += page_size;
    }

    tracing::debug!("Finished fetching deployments. Total: {}", all.len());
    all
}

/// Resolve one project/environment pair into a report entry.
///
/// `None` means the pair is unreportable: no deployments at all, or the
/// latest deployment's release or task could not be fetched. The `name`
/// field is left empty; the aggregator fills in the environment's display
/// name.
pub async fn resolve(
    api: &dyn DeployApi,
    project_id: &str,
    environment_id: &str,
    page_size: usize,
    zone: Tz,
) -> Option<EnvironmentReport> {
    tracing::debug!("Processing deployment for project {project_id} and environment {environment_id}");
    let deployments = fetch_deployments(api, project_id, environment_id, page_size).await;
    let Some(latest) = deployments.first() else {
        tracing::debug!("No deployments found for project {project_id} and environment {environment_id}");
        return None;
    };

    tracing::debug!("Fetching release {} for latest deployment", latest.release_id);
    let release = api.release(&latest.release_id).await;
    tracing::debug!("Fetching task {} for latest deployment", latest.task_id);
    let task = api.task(&latest.task_id).await;
    let (Some(release), Some(task)) = (release, task) else {
        tracing::warn!(
            "Failed to fetch release or task for project {project_id} and environment {environment_id}"
        );
        return None;
    };

    let failed = task.state == TaskState::Failed;
    let mut report = EnvironmentReport {
        version: release.version,
        release_notes: release.release_notes,
        deployment_date: crate::report::format_in_zone(latest.created, zone),
        failed: failed.then_some(true),
        last_successful_version: None,
        last_successful_date: None,
        name: String::new(),
    };

    if failed {
        tracing::debug!(
            "Latest deployment failed for project {project_id} and environment {environment_id}. \
             Searching for last successful deployment."
        );
        for deployment in &deployments[1..] {
            let Some(task) = api.task(&deployment.task_id).await else {
                continue;
            };
            if task.state != TaskState::Success {
                continue;
            }
            let Some(success_release) = api.release(&deployment.release_id).await else {
                continue;
            };
            report.last_successful_version = Some(success_release.version);
            report.last_successful_date =
                Some(crate::report::format_in_zone(deployment.created, zone));
            tracing::debug!(
                "Found last successful deployment for project {project_id} and environment {environment_id}"
            );
            break;
        }
    }

    tracing::debug!(
        "Finished processing deployment for project {project_id} and environment {environment_id}"
    );
    Some(report)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::client::testing::FakeApi;
    use chrono_tz::America::Los_Angeles;

    const ZONE: Tz = Los_Angeles;

    #[tokio::test]
    async fn short_final_page_terminates_pagination() {
        // 77 records with a page size of 30: pages of 30, 30 and 17.
        let mut api = FakeApi::new();
        let history: Vec<_> = (0..77).map(|_| ("1.0.0", TaskState::Success)).collect();
        api.seed_history("Projects-1", "Environments-1", &history);

        let all = fetch_deployments(&api, "Projects-1", "Environments-1", 30).await;
        assert_eq!(all.len(), 77);
        assert_eq!(api.page_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exact_multiple_of_page_size_needs_one_empty_page() {
        // 90 records: three full pages, then an empty fourth one.
        let mut api = FakeApi::new();
        let history: Vec<_> = (0..90).map(|_| ("1.0.0", TaskState::Success)).collect();
        api.seed_history("Projects-1", "Environments-1", &history);

        let all = fetch_deployments(&api, "Projects-1", "Environments-1", 30).await;
        assert_eq!(all.len(), 90);
        assert_eq!(api.page_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn failed_page_request_stops_pagination() {
        let mut api = FakeApi::new();
        api.break_pair("Projects-1", "Environments-1");

        let all = fetch_deployments(&api, "Projects-1", "Environments-1", 30).await;
        assert!(all.is_empty());
        assert_eq!(api.page_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_history_yields_no_report() {
        let api = FakeApi::new();
        let report = resolve(&api, "Projects-1", "Environments-1", 30, ZONE).await;
        assert!(report.is_none());
    }

    #[tokio::test]
    async fn successful_latest_deployment_has_no_failure_fields() {
        let mut api = FakeApi::new();
        api.seed_history(
            "Projects-1",
            "Environments-1",
            &[("2.0.0", TaskState::Success), ("1.0.0", TaskState::Success)],
        );

        let report = resolve(&api, "Projects-1", "Environments-1", 30, ZONE)
            .await
            .unwrap();
        assert_eq!(report.version, "2.0.0");
        assert_eq!(report.deployment_date, "2024-06-01 05:00:00 PDT");
        assert!(report.failed.is_none());
        assert!(report.last_successful_version.is_none());
    }

    #[tokio::test]
    async fn failed_latest_finds_nearest_success_not_an_older_one() {
        let mut api = FakeApi::new();
        api.seed_history(
            "Projects-1",
            "Environments-1",
            &[
                ("4.0.0", TaskState::Failed),
                ("3.0.0", TaskState::Failed),
                ("2.0.0", TaskState::Success),
                ("1.0.0", TaskState::Success),
            ],
        );

        let report = resolve(&api, "Projects-1", "Environments-1", 30, ZONE)
            .await
            .unwrap();
        assert_eq!(report.failed, Some(true));
        assert_eq!(report.last_successful_version.as_deref(), Some("2.0.0"));
        assert_eq!(
            report.last_successful_date.as_deref(),
            Some("2024-06-01 03:00:00 PDT")
        );
    }

    #[tokio::test]
    async fn failed_latest_with_no_prior_success_leaves_fields_unset() {
        let mut api = FakeApi::new();
        api.seed_history(
            "Projects-1",
            "Environments-1",
            &[("2.0.0", TaskState::Failed), ("1.0.0", TaskState::Failed)],
        );

        let report = resolve(&api, "Projects-1", "Environments-1", 30, ZONE)
            .await
            .unwrap();
        assert_eq!(report.failed, Some(true));
        assert!(report.last_successful_version.is_none());
        assert!(report.last_successful_date.is_none());
    }

    #[tokio::test]
    async fn unfetchable_task_mid_scan_is_skipped() {
        let mut api = FakeApi::new();
        api.seed_history(
            "Projects-1",
            "Environments-1",
            &[
                ("3.0.0", TaskState::Failed),
                ("2.0.0", TaskState::Success),
                ("1.0.0", TaskState::Success),
            ],
        );
        // Drop the middle record's task; the scan should fall through to 1.0.0.
        api.tasks.remove("ServerTasks-Projects-1-Environments-1-1");

        let report = resolve(&api, "Projects-1", "Environments-1", 30, ZONE)
            .await
            .unwrap();
        assert_eq!(report.last_successful_version.as_deref(), Some("1.0.0"));
    }

    #[tokio::test]
    async fn missing_latest_release_makes_pair_unreportable() {
        let mut api = FakeApi::new();
        api.seed_history(
            "Projects-1",
            "Environments-1",
            &[("1.0.0", TaskState::Success)],
        );
        api.releases.remove("Releases-Projects-1-Environments-1-0");

        let report = resolve(&api, "Projects-1", "Environments-1", 30, ZONE).await;
        assert!(report.is_none());
    }
}
