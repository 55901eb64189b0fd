use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

// The `failed` and last-successful fields only appear in the JSON on the
// failure path, so consumers can treat their presence as the failure signal.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentReport {
    pub version: String,
    pub release_notes: Option<String>,
    pub deployment_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_successful_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_successful_date: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    pub id: String,
    pub name: String,
    pub git_url: Option<String>,
    pub environments: Vec<EnvironmentReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub id: String,
    pub name: String,
    pub projects: Vec<ProjectReport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Report(pub Vec<GroupReport>);

/// Render a UTC timestamp in the display timezone, e.g.
/// `2024-06-01 05:00:00 PDT`.
pub fn format_in_zone(utc: DateTime<Utc>, zone: Tz) -> String {
    utc.with_timezone(&zone)
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string()
}

pub fn to_pretty_json(report: &Report) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    report.serialize(&mut ser)?;
    Ok(String::from_utf8(buf)?)
}

pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    let json = to_pretty_json(report)?;
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("cannot create report file {}", path.display()))?;
    file.write_all(json.as_bytes())?;
    Ok(())
}
