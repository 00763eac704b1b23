//! History, registry and context views.

use crate::output::{parse_since, print_json, project_root, short_date};
use crate::{ContextCommand, HistoryCommand, ProjectsCommand};
use anyhow::{Context as AnyhowContext, Result};
use roadmapper_store::{
    default_search_paths, discover_projects, ContextStore, HistoryLog, ProjectRegistry,
};
use serde_json::json;
use std::path::PathBuf;

pub(crate) fn run_history(cmd: HistoryCommand, json: bool) -> Result<()> {
    let root = project_root()?;
    let log = HistoryLog::for_project(&root);

    match cmd {
        HistoryCommand::List { limit, since } => {
            let records = log.read(Some(limit), parse_since(since.as_deref())?);
            if json {
                return print_json(&records);
            }
            if records.is_empty() {
                println!("📝 No session history found");
                return Ok(());
            }
            println!("📚 Recent Sessions (showing {}):\n", records.len());
            for record in &records {
                println!(
                    "  {}  {}  (branch: {})",
                    short_date(&record.date),
                    record.file,
                    record.branch.as_deref().unwrap_or("?")
                );
            }
        }
        HistoryCommand::Stats { since } => {
            let stats = log.stats(parse_since(since.as_deref())?);
            if json {
                return print_json(&stats);
            }
            println!("📊 Session Statistics\n");
            println!("  Total sessions: {}", stats.total_sessions);
            println!("  Last 7 days: {}", stats.sessions_last_7_days);
            println!("  Last 30 days: {}", stats.sessions_last_30_days);
            println!("  Avg per week: {}", stats.avg_sessions_per_week);
        }
    }
    Ok(())
}

/// Explicit paths, or the default candidate directories under `$HOME`.
fn search_paths(paths: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    if !paths.is_empty() {
        return Ok(paths);
    }
    let home = dirs::home_dir().context("Cannot determine home directory")?;
    Ok(default_search_paths(&home))
}

pub(crate) fn run_projects(cmd: ProjectsCommand, json: bool) -> Result<()> {
    let registry = ProjectRegistry::from_env()?;

    match cmd {
        ProjectsCommand::Register { path, name } => {
            let entry = registry
                .register(&path, name.as_deref())
                .with_context(|| format!("Failed to register {}", path.display()))?;
            if json {
                return print_json(&entry);
            }
            println!("✅ Registered {} ({})", entry.name, entry.path);
        }
        ProjectsCommand::Unregister { path } => {
            let removed = registry.unregister(&path)?;
            if json {
                return print_json(&json!({ "path": path, "removed": removed }));
            }
            if removed {
                println!("✅ Unregistered {}", path.display());
            } else {
                println!("⚠️  {} was not registered", path.display());
            }
        }
        ProjectsCommand::List => {
            let projects = registry.list_all()?;
            if json {
                return print_json(&projects);
            }
            if projects.is_empty() {
                println!("📝 No registered projects");
                return Ok(());
            }
            println!("📁 Registered Projects ({}):\n", projects.len());
            for project in &projects {
                let last = project
                    .last_session
                    .as_ref()
                    .map_or("never", |s| short_date(&s.date));
                println!(
                    "  {:<24} {:<9} last session: {last}\n    {}",
                    project.name, project.health.as_str(), project.path
                );
            }
        }
        ProjectsCommand::Discover { paths } => {
            let found = discover_projects(&search_paths(paths)?);
            if json {
                return print_json(&found);
            }
            if found.is_empty() {
                println!("🔍 No projects found");
                return Ok(());
            }
            println!("🔍 Found {} project(s):\n", found.len());
            for path in &found {
                println!("  {}", path.display());
            }
        }
        ProjectsCommand::Sync { paths } => {
            let added = registry.sync(&search_paths(paths)?)?;
            if json {
                return print_json(&json!({ "added": added }));
            }
            println!("✅ Registered {added} new project(s)");
        }
    }
    Ok(())
}

pub(crate) fn run_context(cmd: ContextCommand, json: bool) -> Result<()> {
    let store = ContextStore::for_project(&project_root()?);

    match cmd {
        ContextCommand::Show { query } => {
            let sessions = store.get_session_pointers(query.as_deref());
            if json {
                return print_json(&sessions);
            }
            if sessions.is_empty() {
                println!("📝 No closed sessions recorded");
                return Ok(());
            }
            for session in &sessions {
                println!(
                    "{}  ({}, closed {})",
                    session.id,
                    session.file,
                    short_date(&session.archived_at)
                );
                println!("  {}", session.summary);
                for item in &session.accomplishments {
                    println!("  ✅ {item}");
                }
                for item in &session.decisions {
                    println!("  🧭 {item}");
                }
            }
        }
        ContextCommand::Decisions { limit } => {
            let decisions = store.get_recent_decisions(limit);
            if json {
                return print_json(&decisions);
            }
            if decisions.is_empty() {
                println!("📝 No key decisions recorded");
                return Ok(());
            }
            for decision in &decisions {
                println!(
                    "  {}  [{}] {}",
                    short_date(&decision.timestamp),
                    decision.session_id,
                    decision.decision
                );
            }
        }
    }
    Ok(())
}
