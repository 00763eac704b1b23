//! Cross-project search and knowledge base commands.

use crate::output::print_json;
use crate::{KnowledgeCommand, SearchArgs};
use anyhow::{Context as AnyhowContext, Result};
use roadmapper_protocol::{KnowledgeEntry, KnowledgeKind};
use roadmapper_search::{
    search_projects, targets_from_paths, targets_from_registry, KnowledgeBase, ResultCap,
    SearchFileType, SearchOptions,
};
use roadmapper_store::ProjectRegistry;
use serde_json::json;

pub(crate) fn run_search(args: SearchArgs, json: bool) -> Result<()> {
    let file_types = if args.file_types.is_empty() {
        SearchFileType::ALL.to_vec()
    } else {
        args.file_types
            .iter()
            .map(|raw| raw.parse::<SearchFileType>().map_err(anyhow::Error::msg))
            .collect::<Result<Vec<_>>>()?
    };
    let targets = if args.projects.is_empty() {
        targets_from_registry(&ProjectRegistry::from_env()?.list_all()?)
    } else {
        let canonical = args
            .projects
            .iter()
            .map(|p| {
                p.canonicalize()
                    .with_context(|| format!("Invalid project path {}", p.display()))
            })
            .collect::<Result<Vec<_>>>()?;
        targets_from_paths(&canonical)
    };
    let options = SearchOptions {
        file_types,
        case_sensitive: args.case_sensitive,
        max_results: args.max_results,
        cap: if args.round_robin {
            ResultCap::RoundRobin
        } else {
            ResultCap::Global
        },
    };

    let results = search_projects(&args.query, &targets, &options)?;
    if json {
        return print_json(&results);
    }
    if results.is_empty() {
        println!("🔍 No matches for '{}' in {} project(s)", args.query, targets.len());
        return Ok(());
    }
    let total: usize = results.iter().map(|r| r.matches.len()).sum();
    println!("🔍 {total} match(es) in {} file(s)\n", results.len());
    for result in &results {
        println!("📄 {} [{}] {}", result.project, result.file_type, result.file.display());
        for line in result.context(args.context) {
            println!("  {line}");
        }
        println!();
    }
    Ok(())
}

fn print_entries(entries: &[KnowledgeEntry]) {
    for entry in entries {
        println!("  [{}] {}", entry.kind, entry.content);
        println!("      {} / {}", entry.project, entry.session_file);
    }
}

pub(crate) fn run_knowledge(cmd: KnowledgeCommand, json: bool) -> Result<()> {
    let kb = KnowledgeBase::from_env()?;

    match cmd {
        KnowledgeCommand::Index => {
            let registry = ProjectRegistry::from_env()?;
            let added = kb.index_all(&registry)?;
            let total = kb.load().len();
            if json {
                return print_json(&json!({ "added": added, "total": total }));
            }
            let noun = if added == 1 { "entry" } else { "entries" };
            println!("🧠 Indexed {added} new {noun} ({total} total)");
        }
        KnowledgeCommand::Search { query, kind } => {
            let kind = kind
                .as_deref()
                .map(str::parse::<KnowledgeKind>)
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let entries = kb.search(&query, kind);
            if json {
                return print_json(&entries);
            }
            if entries.is_empty() {
                println!("🧠 No knowledge entries match '{query}'");
                return Ok(());
            }
            let noun = if entries.len() == 1 { "entry" } else { "entries" };
            println!("🧠 {} {noun}:\n", entries.len());
            print_entries(&entries);
        }
        KnowledgeCommand::Related { query } => {
            let Some(anchor) = kb.by_topic(&query).into_iter().next() else {
                anyhow::bail!("No knowledge entry matches '{query}'");
            };
            let related = kb.related(&anchor);
            if json {
                return print_json(&json!({ "entry": anchor, "related": related }));
            }
            println!("🧠 {}\n", anchor.content);
            if related.is_empty() {
                println!("No related entries in other projects");
                return Ok(());
            }
            println!("Related ({}):", related.len());
            print_entries(&related);
        }
    }
    Ok(())
}
