//! Per-project session workflow: init, session, status, summarize, close.

use crate::output::{current_dir, print_json, project_root};
use crate::{CloseArgs, InitArgs, SessionArgs, SummarizeArgs};
use anyhow::{Context as AnyhowContext, Result};
use roadmapper_protocol::SessionSummary;
use roadmapper_session::{
    close_session, create_session, init_project, sessions_by_recency, summarize_session,
    CloseOptions, CreateOptions, InitOptions, TemplateVariant,
};
use roadmapper_store::{git, paths, resolve_project_root, ConfigStore, HistoryLog, ProjectRegistry};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};

const TEMPLATE_CONFIG_KEY: &str = "preferences.template_variant";
const RECENT_SESSIONS_SHOWN: usize = 5;

fn parse_variant(raw: &str) -> Result<TemplateVariant> {
    raw.parse::<TemplateVariant>().map_err(anyhow::Error::msg)
}

/// Relative paths are taken from the working directory, not the project root.
fn absolute_from_cwd(file: Option<PathBuf>) -> Result<Option<PathBuf>> {
    match file {
        Some(file) if file.is_relative() => Ok(Some(current_dir()?.join(file))),
        other => Ok(other),
    }
}

pub(crate) fn run_init(args: InitArgs, json: bool) -> Result<()> {
    let root = args
        .path
        .canonicalize()
        .with_context(|| format!("Invalid project path {}", args.path.display()))?;
    let options = InitOptions {
        variant: parse_variant(&args.template)?,
        init_git: !args.no_git,
        project_name: args.name.clone(),
    };
    let report = init_project(&root, &options).context("Failed to initialize project")?;

    let registered = if args.no_register {
        false
    } else {
        match ProjectRegistry::from_env().and_then(|r| r.register(&root, args.name.as_deref())) {
            Ok(_) => true,
            Err(err) => {
                log::warn!("could not register {}: {err}", root.display());
                false
            }
        }
    };

    if json {
        return print_json(&json!({
            "root": root,
            "report": report,
            "registered": registered,
        }));
    }
    for path in &report.created {
        println!("  created {}", path.display());
    }
    for path in &report.skipped {
        println!("  kept existing {}", path.display());
    }
    if report.git_initialized {
        println!("  initialized git repository");
    }
    println!("✅ Project initialized successfully!");
    Ok(())
}

/// `--template`, then the configured variant, then the default.
fn session_variant(explicit: Option<&str>, root: Option<&Path>) -> Result<TemplateVariant> {
    if let Some(raw) = explicit {
        return parse_variant(raw);
    }
    let configured = ConfigStore::from_env()?
        .get(TEMPLATE_CONFIG_KEY, root)
        .and_then(|value| value.as_str().map(str::to_string));
    Ok(match configured.as_deref().map(str::parse::<TemplateVariant>) {
        Some(Ok(variant)) => variant,
        Some(Err(err)) => {
            log::warn!("ignoring {TEMPLATE_CONFIG_KEY}: {err}");
            TemplateVariant::default()
        }
        None => TemplateVariant::default(),
    })
}

pub(crate) fn run_session(args: SessionArgs, json: bool) -> Result<()> {
    let dir = current_dir()?;
    let root = resolve_project_root(Some(&dir));
    let options = CreateOptions {
        name: args.name,
        date: None,
        variant: session_variant(args.template.as_deref(), root.as_deref())?,
    };
    let path = create_session(&dir, &options).context("Error creating session")?;
    if json {
        return print_json(&json!({ "path": path }));
    }
    println!("✅ Created session file: {}", path.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct GitState {
    branch: Option<String>,
    changes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    current_session: Option<String>,
    recent_sessions: Vec<String>,
    sessions_last_7_days: Option<usize>,
    roadmap_found: bool,
    git: Option<GitState>,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn collect_status(dir: &Path) -> StatusReport {
    let sessions: Vec<String> = sessions_by_recency(dir).iter().map(|p| file_name(p)).collect();
    let root = resolve_project_root(Some(dir));
    let sessions_last_7_days = root
        .as_deref()
        .map(|root| HistoryLog::for_project(root).stats(None))
        .filter(|stats| stats.total_sessions > 0)
        .map(|stats| stats.sessions_last_7_days);
    let roadmap_found = paths::roadmap_file(root.as_deref().unwrap_or(dir)).exists();
    let git = git::status_short(dir).map(|changes| GitState {
        branch: git::current_branch(dir),
        changes,
    });

    StatusReport {
        current_session: sessions.first().cloned(),
        recent_sessions: sessions
            .iter()
            .skip(1)
            .take(RECENT_SESSIONS_SHOWN)
            .cloned()
            .collect(),
        sessions_last_7_days,
        roadmap_found,
        git,
    }
}

pub(crate) fn run_status(json: bool) -> Result<()> {
    let status = collect_status(&current_dir()?);
    if json {
        return print_json(&status);
    }

    println!("📊 Roadmapper Status\n");
    match &status.current_session {
        Some(current) => {
            println!("📝 Current Session: {current}");
            if !status.recent_sessions.is_empty() {
                println!("\n📚 Recent Sessions:");
                for name in &status.recent_sessions {
                    println!("   - {name}");
                }
            }
            if let Some(count) = status.sessions_last_7_days {
                println!("\n📈 Activity: {count} sessions in last 7 days");
            }
        }
        None => {
            println!("📝 Current Session: None");
            println!("   💡 Run 'roadmapper session' to create a session");
        }
    }

    if status.roadmap_found {
        println!("\n✅ {} found", paths::ROADMAP_FILE_NAME);
    } else {
        println!("\n⚠️  {} not found", paths::ROADMAP_FILE_NAME);
        println!("   💡 Run 'roadmapper init' to initialize project");
    }

    println!("\n🔧 Git Status:");
    match &status.git {
        Some(git) => {
            if git.changes.is_empty() {
                println!("   ✅ Working tree clean");
            } else {
                println!("   Modified files:");
                for line in &git.changes {
                    println!("   {line}");
                }
            }
            if let Some(branch) = &git.branch {
                println!("   Branch: {branch}");
            }
        }
        None => println!("   ⚠️  Not a git repository"),
    }
    Ok(())
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("\n{title}");
    for item in items {
        println!("  - {item}");
    }
}

fn print_summary(summary: &SessionSummary) {
    println!("📝 {}", summary.summary);
    print_list("✅ Accomplishments:", &summary.accomplishments);
    print_list("🧭 Decisions:", &summary.decisions);
    print_list("💡 Discoveries:", &summary.discoveries);
    if !summary.tasks.is_empty() {
        println!("\n📋 Tasks:");
        for task in &summary.tasks {
            let status = if task.status.is_empty() { "?" } else { task.status.as_str() };
            println!("  - {} [{status}]", task.task);
            if !task.notes.is_empty() {
                println!("      {}", task.notes);
            }
        }
    }
}

pub(crate) fn run_summarize(args: SummarizeArgs, json: bool) -> Result<()> {
    let root = project_root()?;
    let file = absolute_from_cwd(args.file)?;
    let summary =
        summarize_session(&root, file.as_deref()).context("Failed to summarize session")?;
    if json {
        return print_json(&summary);
    }
    print_summary(&summary);
    Ok(())
}

pub(crate) fn run_close(args: CloseArgs, json: bool) -> Result<()> {
    let root = project_root()?;
    let file = absolute_from_cwd(args.file)?;
    let options = CloseOptions {
        archive: !args.no_archive,
        update_roadmap: !args.no_roadmap,
        update_context: !args.no_context,
    };
    let outcome =
        close_session(&root, file.as_deref(), options).context("Failed to close session")?;
    if json {
        return print_json(&outcome);
    }

    println!(
        "✅ Closed session {} ({}, {})\n",
        outcome.session_id, outcome.project, outcome.phase
    );
    print_summary(&outcome.summary);
    println!();
    if outcome.actions.context_updated {
        println!("🧠 Context updated");
    }
    if outcome.actions.roadmap_updated {
        println!("🗺️  Roadmap updated");
    }
    if let Some(path) = &outcome.actions.archive_path {
        println!("📦 Archived to {}", path.display());
    }
    println!("\n📋 Handoff prompt:\n");
    println!("{}", outcome.handoff_prompt);
    Ok(())
}
