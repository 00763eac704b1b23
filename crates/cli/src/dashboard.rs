//! Read-only cross-project dashboard served over HTTP.
//!
//! `GET /` is a static page that renders `GET /api/dashboard`. The server runs
//! on a current-thread runtime and exposes no write endpoints.

use crate::output::short_date;
use crate::DashboardArgs;
use anyhow::{Context as AnyhowContext, Result};
use axum::{extract::State, response::Html, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use roadmapper_protocol::{Health, RegistryEntry};
use roadmapper_store::{HistoryLog, ProjectRegistry};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

const PATTERN_PROJECTS_SHOWN: usize = 5;
const STALE_PATTERN_MIN: usize = 2;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct ProjectCard {
    pub name: String,
    pub path: String,
    pub health: Health,
    pub total_sessions: usize,
    pub last_session: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub(crate) struct DashboardMetrics {
    pub total_projects: usize,
    pub total_sessions: usize,
    pub sessions_last_7_days: usize,
    pub sessions_last_30_days: usize,
    pub health_counts: BTreeMap<Health, usize>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct Pattern {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: String,
    pub description: &'static str,
    pub projects: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct DashboardData {
    pub projects: Vec<ProjectCard>,
    pub metrics: DashboardMetrics,
    pub patterns: Vec<Pattern>,
}

pub(crate) fn build_dashboard(projects: &[RegistryEntry], now: DateTime<Utc>) -> DashboardData {
    let mut metrics = DashboardMetrics {
        total_projects: projects.len(),
        health_counts: Health::ALL.iter().map(|h| (*h, 0)).collect(),
        ..DashboardMetrics::default()
    };

    let mut cards = Vec::with_capacity(projects.len());
    for project in projects {
        let stats = HistoryLog::for_project(Path::new(&project.path)).stats_at(None, now);
        metrics.total_sessions += stats.total_sessions;
        metrics.sessions_last_7_days += stats.sessions_last_7_days;
        metrics.sessions_last_30_days += stats.sessions_last_30_days;
        *metrics.health_counts.entry(project.health).or_default() += 1;

        cards.push(ProjectCard {
            name: project.name.clone(),
            path: project.path.clone(),
            health: project.health,
            total_sessions: stats.total_sessions,
            last_session: project
                .last_session
                .as_ref()
                .map(|s| short_date(&s.date).to_string()),
        });
    }

    let patterns = detect_patterns(&cards);
    DashboardData {
        projects: cards,
        metrics,
        patterns,
    }
}

fn detect_patterns(cards: &[ProjectCard]) -> Vec<Pattern> {
    let mut patterns = Vec::new();

    let stale: Vec<String> = cards
        .iter()
        .filter(|c| c.health == Health::Stale)
        .map(|c| c.name.clone())
        .collect();
    if stale.len() >= STALE_PATTERN_MIN {
        patterns.push(Pattern {
            kind: "stale_projects",
            title: format!("{} projects haven't been worked on recently", stale.len()),
            description: "Consider reviewing or archiving these projects",
            projects: stale.into_iter().take(PATTERN_PROJECTS_SHOWN).collect(),
        });
    }

    let idle: Vec<String> = cards
        .iter()
        .filter(|c| c.total_sessions == 0)
        .map(|c| c.name.clone())
        .collect();
    if !idle.is_empty() {
        patterns.push(Pattern {
            kind: "no_sessions",
            title: format!("{} projects have no session history", idle.len()),
            description: "These projects may need initialization or are new",
            projects: idle.into_iter().take(PATTERN_PROJECTS_SHOWN).collect(),
        });
    }
    patterns
}

struct DashboardState {
    registry: ProjectRegistry,
}

pub(crate) fn run(args: DashboardArgs) -> Result<()> {
    let registry = ProjectRegistry::from_env()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(serve(&args.bind, registry))
}

fn router(state: Arc<DashboardState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/dashboard", get(api_dashboard))
        .route("/health", get(health))
        .with_state(state)
}

async fn serve(bind: &str, registry: ProjectRegistry) -> Result<()> {
    let app = router(Arc::new(DashboardState { registry }));
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    println!("Serving dashboard on http://{bind}/ (Ctrl+C to stop)");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

async fn api_dashboard(State(state): State<Arc<DashboardState>>) -> Json<DashboardData> {
    Json(build_dashboard(&state.registry.snapshot(), Utc::now()))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Roadmapper Dashboard</title>
<style>
  body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #f5f5f5; color: #333; margin: 0; padding: 20px; }
  .container { max-width: 1200px; margin: 0 auto; }
  .card { background: white; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); margin-bottom: 20px; }
  .grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 20px; margin-bottom: 20px; }
  .metric-value { font-size: 32px; font-weight: bold; color: #3498db; }
  .muted { color: #7f8c8d; font-size: 13px; word-break: break-all; }
  .project { border-left: 4px solid #95a5a6; }
  .project.healthy { border-left-color: #27ae60; }
  .project.inactive { border-left-color: #f39c12; }
  .pattern { border-left: 4px solid #e74c3c; background: #fef5e7; padding: 12px; margin-bottom: 12px; }
</style>
</head>
<body>
<div class="container">
  <div class="card"><h1>🗺️ Roadmapper Dashboard</h1><div class="muted">Cross-project overview and metrics</div></div>
  <div class="grid" id="metrics"></div>
  <div class="grid" id="projects"></div>
  <div class="card" id="patterns"></div>
</div>
<script>
const esc = (s) => String(s ?? "").replace(/[&<>"]/g, (c) => ({"&": "&amp;", "<": "&lt;", ">": "&gt;", '"': "&quot;"}[c]));
fetch("/api/dashboard").then((r) => r.json()).then((data) => {
  const m = data.metrics;
  document.getElementById("metrics").innerHTML = [
    ["Projects", m.total_projects], ["Sessions", m.total_sessions],
    ["Last 7 days", m.sessions_last_7_days], ["Last 30 days", m.sessions_last_30_days],
  ].map(([label, value]) => `<div class="card"><div class="metric-value">${value}</div><div class="muted">${label}</div></div>`).join("");
  document.getElementById("projects").innerHTML = data.projects.map((p) => `
    <div class="card project ${esc(p.health)}">
      <strong>${esc(p.name)}</strong> <span class="muted">${esc(p.health)}</span>
      <div class="muted">${esc(p.path)}</div>
      <div>${p.total_sessions} sessions, last: ${esc(p.last_session || "never")}</div>
    </div>`).join("");
  document.getElementById("patterns").innerHTML = data.patterns.length
    ? "<h2>Patterns</h2>" + data.patterns.map((p) => `<div class="pattern"><strong>${esc(p.title)}</strong><div class="muted">${esc(p.description)}</div><div class="muted">${p.projects.map(esc).join(", ")}</div></div>`).join("")
    : "<h2>Patterns</h2><div class=\"muted\">Nothing to report</div>";
});
</script>
</body>
</html>
"#;
