use crate::output::{current_dir, print_json};
use crate::ConfigCommand;
use anyhow::{bail, Result};
use roadmapper_store::{resolve_project_root, ConfigScope, ConfigStore};
use std::path::PathBuf;
use toml::{Table, Value};

fn cwd_project_root() -> Result<Option<PathBuf>> {
    Ok(resolve_project_root(Some(&current_dir()?)))
}

pub(crate) fn run(cmd: ConfigCommand, json: bool) -> Result<()> {
    let store = ConfigStore::from_env()?;
    let root = cwd_project_root()?;

    match cmd {
        ConfigCommand::Set { key, value, scope } => {
            let scope: ConfigScope = scope.parse()?;
            store.set(&key, &value, scope, root.as_deref())?;
            if json {
                return print_json(&serde_json::json!({
                    "key": key,
                    "value": value,
                    "scope": scope.as_str(),
                }));
            }
            println!("✅ Set {key} = {value} ({scope})");
        }
        ConfigCommand::Get { key } => {
            let Some(value) = store.get(&key, root.as_deref()) else {
                bail!("Key '{key}' not found");
            };
            if json {
                return print_json(&value);
            }
            match value {
                Value::String(text) => println!("{text}"),
                Value::Table(table) => print_table(&table, &key),
                other => println!("{other}"),
            }
        }
        ConfigCommand::List { scope } => {
            let (title, table) = match scope.trim().to_ascii_lowercase().as_str() {
                "merged" => (
                    "Merged Configuration (project overrides global)",
                    store.load(root.as_deref()),
                ),
                other => {
                    let scope: ConfigScope = other.parse()?;
                    let title = match scope {
                        ConfigScope::Global => "Global Configuration",
                        ConfigScope::Project => "Project Configuration",
                    };
                    (title, store.load_scope(scope, root.as_deref())?)
                }
            };
            if json {
                return print_json(&table);
            }
            println!("📋 {title}:\n");
            print_table(&table, "");
        }
        ConfigCommand::Reset { key, scope } => {
            let scope: ConfigScope = scope.parse()?;
            let removed = store.reset(&key, scope, root.as_deref())?;
            if json {
                return print_json(&serde_json::json!({
                    "key": key,
                    "scope": scope.as_str(),
                    "removed": removed,
                }));
            }
            if removed {
                println!("✅ Reset {key} ({scope})");
            } else {
                println!("⚠️  {key} was not set in {scope} config");
            }
        }
    }
    Ok(())
}

/// `[section]` headers followed by dotted `key = value` lines, sorted.
fn print_table(table: &Table, prefix: &str) {
    let mut keys: Vec<&String> = table.keys().collect();
    keys.sort();
    for key in keys {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match &table[key] {
            Value::Table(inner) => {
                println!("[{name}]");
                print_table(inner, &name);
            }
            value => println!("{name} = {value}"),
        }
    }
}
