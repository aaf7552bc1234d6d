//! buildgate CLI - duplicate-aware build dispatch and build server queries.

mod commands;

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use buildgate_client::DEFAULT_SERVER_URL;

/// buildgate - dispatch builds without piling up duplicates
#[derive(Parser)]
#[command(name = "buildgate")]
#[command(about = "Duplicate-aware build dispatch for TeamCity-style servers", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Connection and logging options shared by every subcommand.
#[derive(Args)]
struct GlobalArgs {
    /// Build server URL
    #[arg(short, long, global = true, default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Access token (takes precedence over username/password)
    #[arg(short, long, global = true)]
    token: Option<String>,

    /// Username for basic authentication
    #[arg(short, long, global = true)]
    username: Option<String>,

    /// Password for basic authentication
    #[arg(short, long, global = true)]
    password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

/// Paging options for listings.
#[derive(Args)]
struct PageArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Items per page
    #[arg(long, default_value_t = 20)]
    page_size: u32,
}

/// Options for a duplicate-aware dispatch.
#[derive(Args)]
struct DispatchArgs {
    /// Address of the agent requesting the build
    #[arg(long)]
    agent_ip: String,

    /// Name of the requesting build
    #[arg(long)]
    build_name: String,

    /// Source path of the requesting build
    #[arg(long)]
    source_path: String,

    /// Patch or task name
    #[arg(long)]
    patch_name: String,

    /// Path of the requesting build's output
    #[arg(long)]
    build_path: String,

    /// Build parameter that carries the task fingerprint
    #[arg(long)]
    marker_param: String,

    /// Keyword candidate configuration names must contain
    #[arg(long)]
    marker_keyword: String,

    /// Project to search for candidate configurations
    #[arg(long)]
    project: Option<String>,

    /// Branch to build
    #[arg(long)]
    branch: Option<String>,

    /// Comment attached to the triggered build
    #[arg(long)]
    comment: Option<String>,

    /// Comment attached to cancelled duplicates
    #[arg(long)]
    cancel_comment: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Cancel duplicates of a task and trigger it on the least-loaded configuration
    Dispatch(DispatchArgs),

    /// Test the connection to the server
    Test,

    /// List projects
    Projects(PageArgs),

    /// List build configurations
    BuildTypes {
        /// Restrict to one project
        #[arg(long)]
        project: Option<String>,

        #[command(flatten)]
        paging: PageArgs,
    },

    /// Show the build history of a configuration
    History {
        /// Build configuration ID
        #[arg(long)]
        build_type: String,

        #[command(flatten)]
        paging: PageArgs,
    },

    /// List build agents
    Agents(PageArgs),

    /// Trigger a build
    Trigger {
        /// Build configuration ID
        #[arg(long)]
        build_type: String,

        /// Branch name
        #[arg(long)]
        branch: Option<String>,

        /// Build comment
        #[arg(long)]
        comment: Option<String>,

        /// Build parameter as key=value (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// Cancel a queued or running build
    Cancel {
        /// Build ID
        #[arg(long)]
        build_id: i64,

        /// Cancellation comment
        #[arg(long, default_value = "Cancelled via buildgate")]
        comment: String,
    },

    /// Show build details
    GetBuild {
        /// Build ID
        #[arg(long)]
        build_id: i64,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.global.log_level);

    match commands::run(cli.global, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
