//! echo-sleuth - Entry Point

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use echo_sleuth::config::{resolve_config, ResolvedConfig};
use echo_sleuth::{
    detect_schema, extract_messages, extract_tools, files_changed, find_subagent_files,
    session_stats, ListQuery, MessageOptions, ProjectResolver, Resolution, RoleFilter, Scope,
    SessionLister, ThinkingMode, ToolOptions,
};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// echo-sleuth - inspect Claude Code session transcripts
#[derive(Parser, Debug)]
#[command(name = "echo-sleuth")]
#[command(version)]
#[command(about = "Query Claude Code JSONL session logs")]
pub struct Args {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding one log directory per project
    #[arg(long, global = true)]
    pub projects_dir: Option<PathBuf>,

    /// Log file for diagnostics
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Query to run
    #[command(subcommand)]
    pub command: Command,
}

/// Queries.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Structural report of a log file
    Schema {
        /// Log file
        file: PathBuf,
    },
    /// Session statistics of a log file
    Stats {
        /// Log file
        file: PathBuf,
    },
    /// Conversation turns of a log file
    Messages {
        /// Log file
        file: PathBuf,
        /// Side of the conversation to show
        #[arg(long, value_enum, default_value_t = RoleArg::Both)]
        role: RoleArg,
        /// Leave out tool-use summaries
        #[arg(long)]
        no_tools: bool,
        /// Thinking characters to keep (0 = all, negative = hide)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        thinking: i64,
        /// Maximum turns (0 = no cap)
        #[arg(short, long, default_value_t = 0)]
        limit: usize,
    },
    /// Tool calls joined with their results
    Tools {
        /// Log file
        file: PathBuf,
        /// Only calls to this tool
        #[arg(long)]
        name: Option<String>,
        /// Only failed calls
        #[arg(long)]
        errors_only: bool,
        /// Maximum traces (0 = no cap)
        #[arg(short, long, default_value_t = 0)]
        limit: usize,
    },
    /// Files tracked by the last snapshot
    Files {
        /// Log file
        file: PathBuf,
        /// Include backup version counters
        #[arg(long)]
        versions: bool,
    },
    /// List sessions, newest first
    Sessions {
        /// Every project instead of the current one
        #[arg(long, conflicts_with = "path")]
        all: bool,
        /// Project path instead of the working directory
        #[arg(long)]
        path: Option<String>,
        /// Only sessions created on or after this day (YYYY-MM-DD)
        #[arg(long, value_parser = parse_day)]
        since: Option<NaiveDate>,
        /// Case-insensitive substring over summary and first prompt
        #[arg(long)]
        grep: Option<String>,
        /// Maximum sessions (0 = no cap; default from config)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Print JSON instead of TSV
        #[arg(long)]
        json: bool,
    },
    /// Resolve a project path to its log directory
    Project {
        /// Project path
        path: String,
    },
    /// Subagent transcripts of a session
    Subagents {
        /// Session log file
        file: PathBuf,
    },
}

/// Role choice on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// User turns
    User,
    /// Assistant turns
    Assistant,
    /// Both sides
    Both,
}

impl From<RoleArg> for RoleFilter {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::User => RoleFilter::User,
            RoleArg::Assistant => RoleFilter::Assistant,
            RoleArg::Both => RoleFilter::Both,
        }
    }
}

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[derive(Serialize)]
struct ProjectReport {
    path: Option<String>,
    matched_by: &'static str,
}

impl From<Resolution> for ProjectReport {
    fn from(resolution: Resolution) -> Self {
        let matched_by = match &resolution {
            Resolution::Exact(_) => "exact",
            Resolution::Indexed(_) => "index",
            Resolution::Fuzzy(_) => "fuzzy",
            Resolution::Unresolved => "unresolved",
        };
        Self {
            path: resolution.into_path().map(|p| p.display().to_string()),
            matched_by,
        }
    }
}

/// `--name ""` means no name filter.
fn tool_options(name: Option<String>, errors_only: bool, limit: usize) -> ToolOptions {
    ToolOptions {
        name: name.filter(|n| !n.is_empty()),
        errors_only,
        limit,
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn run(command: Command, config: &ResolvedConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Schema { file } => print_json(&detect_schema(&file)),
        Command::Stats { file } => print_json(&session_stats(&file)),
        Command::Messages {
            file,
            role,
            no_tools,
            thinking,
            limit,
        } => {
            let opts = MessageOptions {
                role: role.into(),
                include_tools: !no_tools,
                limit,
                thinking: ThinkingMode::from_limit(thinking),
            };
            let turns: Vec<_> = extract_messages(&file, opts).collect();
            print_json(&turns)
        }
        Command::Tools {
            file,
            name,
            errors_only,
            limit,
        } => {
            print_json(&extract_tools(&file, &tool_options(name, errors_only, limit)))
        }
        Command::Files { file, versions } => {
            print_json(&files_changed(&file, versions, &config.scan_options()))
        }
        Command::Sessions {
            all,
            path,
            since,
            grep,
            limit,
            json,
        } => {
            let scope = match (all, path) {
                (true, _) => Scope::All,
                (false, Some(path)) => Scope::Path(path),
                (false, None) => Scope::Current,
            };
            let query = ListQuery {
                scope,
                since,
                grep,
                limit: limit.unwrap_or(config.list_limit),
            };
            let sessions = SessionLister::new(&config.projects_dir).list(&query);
            if json {
                return print_json(&sessions);
            }
            let mut out = std::io::stdout().lock();
            for meta in &sessions {
                writeln!(out, "{}", meta.to_tsv())?;
            }
            Ok(())
        }
        Command::Project { path } => {
            let resolution = ProjectResolver::new(&config.projects_dir).resolve(&path);
            print_json(&ProjectReport::from(resolution))
        }
        Command::Subagents { file } => {
            let found: Vec<String> = find_subagent_files(&file)
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            print_json(&found)
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Defaults → Config File → Env Vars → CLI Args
    let config = resolve_config(
        args.config.clone(),
        args.projects_dir.clone(),
        args.log_file.clone(),
    )?;

    echo_sleuth::logging::init(&config.log_file_path)?;

    info!(
        config = ?config,
        command = ?args.command,
        "Configuration loaded and resolved"
    );

    run(args.command, &config)
}
