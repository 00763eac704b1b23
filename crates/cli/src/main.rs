use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod config_cmd;
mod dashboard;
mod lookup;
mod output;
mod registry_cmd;
mod workflow;

#[derive(Parser)]
#[command(name = "roadmapper")]
#[command(about = "Multi-session development workflow tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Print structured JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the roadmap, templates and directory layout
    Init(InitArgs),

    /// Create a new session file
    Session(SessionArgs),

    /// Show the current session, roadmap and git status
    Status,

    /// Summarize a session file without closing it
    Summarize(SummarizeArgs),

    /// Close a session: update context and roadmap, then archive it
    Close(CloseArgs),

    /// Manage layered configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// View session history and statistics
    #[command(subcommand)]
    History(HistoryCommand),

    /// Manage the global project registry
    #[command(subcommand)]
    Projects(ProjectsCommand),

    /// Search sessions, roadmaps and history across projects
    Search(SearchArgs),

    /// Query the cross-project knowledge base
    #[command(subcommand)]
    Knowledge(KnowledgeCommand),

    /// Inspect the project's accumulated session context
    #[command(subcommand)]
    Context(ContextCommand),

    /// Serve a read-only cross-project dashboard
    Dashboard(DashboardArgs),
}

#[derive(Args)]
struct InitArgs {
    /// Project directory (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Template set: default, minimal or detailed
    #[arg(long, default_value = "default")]
    template: String,

    /// Skip git initialization
    #[arg(long)]
    no_git: bool,

    /// Project name (defaults to the directory name)
    #[arg(long)]
    name: Option<String>,

    /// Do not add the project to the global registry
    #[arg(long)]
    no_register: bool,
}

#[derive(Args)]
struct SessionArgs {
    /// Custom session name (defaults to SESSION_YYYY_MM_DD_X)
    #[arg(long)]
    name: Option<String>,

    /// Built-in template used when the project has none
    #[arg(long)]
    template: Option<String>,
}

#[derive(Args)]
struct SummarizeArgs {
    /// Session file (defaults to the latest in the project root)
    file: Option<PathBuf>,
}

#[derive(Args)]
struct CloseArgs {
    /// Session file (defaults to the latest in the project root)
    file: Option<PathBuf>,

    /// Leave the session file in place
    #[arg(long)]
    no_archive: bool,

    /// Do not touch PROJECT_ROADMAP.md
    #[arg(long)]
    no_roadmap: bool,

    /// Do not record the session in the project context
    #[arg(long)]
    no_context: bool,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Set a value (stored as a string)
    Set {
        key: String,
        value: String,
        #[arg(long, default_value = "project")]
        scope: String,
    },
    /// Print a value from the merged configuration
    Get { key: String },
    /// List configuration: merged, global or project
    List {
        #[arg(long, default_value = "merged")]
        scope: String,
    },
    /// Remove a key from one scope
    Reset {
        key: String,
        #[arg(long, default_value = "project")]
        scope: String,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List recent sessions, newest first
    List {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Only sessions on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
    },
    /// Session counts and weekly average
    Stats {
        /// Only sessions on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProjectsCommand {
    /// Register a project directory
    Register {
        #[arg(default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove a project from the registry
    Unregister {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// List registered projects with health
    List,
    /// Find roadmapper projects under the given (or default) directories
    Discover { paths: Vec<PathBuf> },
    /// Register every discovered project not yet known
    Sync { paths: Vec<PathBuf> },
}

#[derive(Args)]
struct SearchArgs {
    /// Literal text to look for
    query: String,

    /// Project directories to search (defaults to all registered projects)
    #[arg(long = "project", short = 'p')]
    projects: Vec<PathBuf>,

    /// File types: session, roadmap, history (repeatable)
    #[arg(long = "type", short = 't')]
    file_types: Vec<String>,

    /// Match case exactly
    #[arg(long)]
    case_sensitive: bool,

    /// Maximum number of file results
    #[arg(long, short = 'n', default_value_t = 50)]
    max_results: usize,

    /// Share the result cap fairly between projects
    #[arg(long)]
    round_robin: bool,

    /// Context lines around each match
    #[arg(long, short = 'C', default_value_t = 2)]
    context: usize,
}

#[derive(Subcommand)]
enum KnowledgeCommand {
    /// Extract knowledge from every registered project's sessions
    Index,
    /// Find entries containing text
    Search {
        query: String,
        /// discovery, accomplishment or insight
        #[arg(long = "type", short = 't')]
        kind: Option<String>,
    },
    /// Entries from other projects related to the first entry matching text
    Related { query: String },
}

#[derive(Subcommand)]
enum ContextCommand {
    /// Closed sessions, optionally filtered by text
    Show {
        #[arg(long)]
        query: Option<String>,
    },
    /// Most recent key decisions
    Decisions {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Args)]
struct DashboardArgs {
    /// Bind address, e.g. 127.0.0.1:5000
    #[arg(long, default_value = "127.0.0.1:5000")]
    bind: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let json = cli.json;
    match cli.command {
        Commands::Init(args) => workflow::run_init(args, json),
        Commands::Session(args) => workflow::run_session(args, json),
        Commands::Status => workflow::run_status(json),
        Commands::Summarize(args) => workflow::run_summarize(args, json),
        Commands::Close(args) => workflow::run_close(args, json),
        Commands::Config(cmd) => config_cmd::run(cmd, json),
        Commands::History(cmd) => registry_cmd::run_history(cmd, json),
        Commands::Projects(cmd) => registry_cmd::run_projects(cmd, json),
        Commands::Search(args) => lookup::run_search(args, json),
        Commands::Knowledge(cmd) => lookup::run_knowledge(cmd, json),
        Commands::Context(cmd) => registry_cmd::run_context(cmd, json),
        Commands::Dashboard(args) => dashboard::run(args),
    }
}
