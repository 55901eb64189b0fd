//! Fan-out/fan-in over the whole space: one resolution task per
//! project/environment pair, bounded by a single semaphore shared across the
//! run, fanned back in to a group → project → environment report tree.

use std::sync::Arc;

use itertools::Itertools;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::client::DeployApi;
use crate::config::Config;
use crate::deployments;
use crate::report::{GroupReport, ProjectReport, Report};

pub async fn build_report(api: Arc<dyn DeployApi>, config: &Config) -> Report {
    tracing::debug!("Starting to fetch all deployment data");
    let projects = api.projects_all().await.unwrap_or_default();
    tracing::debug!("Fetched {} projects", projects.len());
    let groups = api.project_groups_all().await.unwrap_or_default();
    tracing::debug!("Fetched {} project groups", groups.len());
    let environments = api.environments_all().await.unwrap_or_default();
    tracing::debug!("Fetched {} environments", environments.len());

    tracing::debug!("Grouping projects by project group");
    let mut projects_by_group = projects
        .into_iter()
        .into_group_map_by(|project| project.project_group_id.clone());

    // One global bound on in-flight resolutions, not one per project.
    let semaphore = Arc::new(Semaphore::new(config.max_in_flight));
    let mut group_reports = Vec::with_capacity(groups.len());

    for group in groups {
        tracing::debug!("Processing project group: {}", group.name);
        let group_projects = projects_by_group.remove(&group.id).unwrap_or_default();
        let mut project_reports = Vec::with_capacity(group_projects.len());

        for project in group_projects {
            tracing::debug!("Processing project: {}", project.name);
            println!("Processing project: {}", project.name);

            let detail = api.project_detail(&project.id).await;
            let git_url = detail
                .and_then(|detail| detail.persistence_settings)
                .and_then(|settings| settings.url);

            let mut tasks = JoinSet::new();
            for environment in &environments {
                let api = Arc::clone(&api);
                let semaphore = Arc::clone(&semaphore);
                let project_id = project.id.clone();
                let environment_id = environment.id.clone();
                let environment_name = environment.name.clone();
                let page_size = config.page_size;
                let zone = config.display_zone;
                tasks.spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok()?;
                    let mut report =
                        deployments::resolve(&*api, &project_id, &environment_id, page_size, zone)
                            .await?;
                    report.name = environment_name;
                    Some(report)
                });
            }

            let mut environment_reports = Vec::new();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(Some(report)) => {
                        tracing::debug!(
                            "Added environment data for {} to project {}",
                            report.name,
                            project.name
                        );
                        environment_reports.push(report);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::error!(
                            "Resolution task panicked while processing project {}: {err}",
                            project.name
                        );
                    }
                }
            }
            // Completion order is nondeterministic; sort so two runs over the
            // same data produce identical output.
            environment_reports.sort_by(|a, b| a.name.cmp(&b.name));

            project_reports.push(ProjectReport {
                id: project.id,
                name: project.name,
                git_url,
                environments: environment_reports,
            });
        }

        tracing::debug!("Finished processing project group: {}", group.name);
        group_reports.push(GroupReport {
            id: group.id,
            name: group.name,
            projects: project_reports,
        });
    }

    // Whatever is left belongs to a group the server never returned. Dropped
    // from the report, but loudly.
    for (group_id, orphans) in &projects_by_group {
        let names = orphans.iter().map(|project| project.name.as_str()).join(", ");
        tracing::warn!(
            "Dropping {} project(s) referencing unknown project group {group_id}: {names}",
            orphans.len()
        );
    }

    tracing::debug!("Finished fetching all deployment data");
    Report(group_reports)
}
