//! Subcommand handlers and output formatting.

use thiserror::Error;
use tracing::{error, info};

use buildgate_client::{Client, ClientConfig, ClientError, Credentials};
use buildgate_core::{Build, BuildId, BuildTypeId, PagedResult, ProjectId, TaskIdentity, TriggerRequest};
use buildgate_scheduler::{DispatchOutcome, Scheduler, SchedulerConfig, SchedulerError, EXIT_FAILURE};

use crate::{Commands, DispatchArgs, GlobalArgs, PageArgs};

/// Errors surfaced to the user.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("Cannot connect to {0}")]
    Unreachable(String),

    #[error("Build {0} not found")]
    BuildNotFound(BuildId),

    #[error("Trigger on {0} was accepted without a build in the response")]
    TriggerNotAcknowledged(BuildTypeId),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Scheduler(e) => e.exit_code(),
            _ => EXIT_FAILURE,
        }
    }
}

fn connect(global: &GlobalArgs) -> Result<Client, CliError> {
    let credentials = Credentials::from_options(
        global.token.clone(),
        global.username.clone(),
        global.password.clone(),
    )?;
    let config = ClientConfig::new(global.server.clone(), credentials)
        .with_timeout_secs(global.timeout);
    Ok(Client::new(&config)?)
}

/// Run one subcommand.
pub async fn run(global: GlobalArgs, command: Commands) -> Result<(), CliError> {
    let client = connect(&global)?;

    match command {
        Commands::Dispatch(args) => dispatch(client, args).await,
        Commands::Test => test_connection(&client, &global.server).await,
        Commands::Projects(paging) => list_projects(&client, &paging).await,
        Commands::BuildTypes { project, paging } => {
            list_build_types(&client, project.map(ProjectId::new), &paging).await
        }
        Commands::History { build_type, paging } => {
            build_history(&client, BuildTypeId::new(build_type), &paging).await
        }
        Commands::Agents(paging) => list_agents(&client, &paging).await,
        Commands::Trigger {
            build_type,
            branch,
            comment,
            params,
        } => {
            let mut request = TriggerRequest::new(build_type);
            if let Some(branch) = branch {
                request = request.with_branch(branch);
            }
            if let Some(comment) = comment {
                request = request.with_comment(comment);
            }
            for (name, value) in params {
                request = request.with_parameter(name, value);
            }
            trigger(&client, &request).await
        }
        Commands::Cancel { build_id, comment } => {
            cancel(&client, BuildId::new(build_id), &comment).await
        }
        Commands::GetBuild { build_id } => get_build(&client, BuildId::new(build_id)).await,
    }
}

async fn dispatch(client: Client, args: DispatchArgs) -> Result<(), CliError> {
    let DispatchArgs {
        agent_ip,
        build_name,
        source_path,
        patch_name,
        build_path,
        marker_param,
        marker_keyword,
        project,
        branch,
        comment,
        cancel_comment,
    } = args;

    info!(build_path = %build_path, "Dispatch source output");
    let task = TaskIdentity::new(agent_ip, build_name, source_path, patch_name);

    let mut config = SchedulerConfig::new(marker_param, marker_keyword);
    if let Some(project) = project {
        config = config.with_project(project);
    }
    if let Some(branch) = branch {
        config = config.with_branch(branch);
    }
    if let Some(comment) = comment {
        config = config.with_trigger_comment(comment);
    }
    if let Some(cancel_comment) = cancel_comment {
        config = config.with_cancel_comment(cancel_comment);
    }

    let outcome = Scheduler::new(client, config).dispatch(&task).await?;
    print_outcome(&outcome);
    Ok(())
}

async fn test_connection(client: &Client, server: &str) -> Result<(), CliError> {
    println!("Testing connection to {}...", server);
    if client.test_connection().await {
        println!("Connected");
        Ok(())
    } else {
        error!(server = %server, "Connection test failed");
        Err(CliError::Unreachable(server.to_string()))
    }
}

async fn list_projects(client: &Client, paging: &PageArgs) -> Result<(), CliError> {
    let projects = client.query.projects(paging.page, paging.page_size).await?;

    print_header("Projects", &projects);
    println!("{:<32}  {}", "ID", "NAME");
    println!("{}", "-".repeat(80));
    for project in &projects.items {
        println!("{:<32}  {}", project.id.as_str(), project.name);
        if let Some(description) = project.description.as_deref().filter(|d| !d.is_empty()) {
            println!("{:<32}  {}", "", description);
        }
    }
    print_more_hint(&projects, paging.page);
    Ok(())
}

async fn list_build_types(
    client: &Client,
    project: Option<ProjectId>,
    paging: &PageArgs,
) -> Result<(), CliError> {
    let configs = client
        .query
        .build_configurations(project.as_ref(), paging.page, paging.page_size)
        .await?;

    print_header("Build configurations", &configs);
    println!("{:<40}  {:<24}  {}", "ID", "PROJECT", "NAME");
    println!("{}", "-".repeat(100));
    for config in &configs.items {
        let project = config
            .project_name
            .as_deref()
            .unwrap_or(config.project_id.as_str());
        println!("{:<40}  {:<24}  {}", config.id.as_str(), project, config.name);
    }
    print_more_hint(&configs, paging.page);
    Ok(())
}

async fn build_history(
    client: &Client,
    build_type: BuildTypeId,
    paging: &PageArgs,
) -> Result<(), CliError> {
    let builds = client
        .builds
        .build_history(&build_type, paging.page, paging.page_size)
        .await?;

    print_header(&format!("Builds of {}", build_type), &builds);
    print_build_table(&builds.items);
    print_more_hint(&builds, paging.page);
    Ok(())
}

async fn list_agents(client: &Client, paging: &PageArgs) -> Result<(), CliError> {
    let agents = client.query.agents(paging.page, paging.page_size).await?;

    print_header("Agents", &agents);
    println!("{:<8}  {:<32}  {:<10}  {:<8}  {}", "ID", "NAME", "CONNECTED", "ENABLED", "IP");
    println!("{}", "-".repeat(80));
    for agent in &agents.items {
        println!(
            "{:<8}  {:<32}  {:<10}  {:<8}  {}",
            agent.id,
            agent.name,
            yes_no(agent.connected),
            yes_no(agent.enabled),
            agent.ip.as_deref().unwrap_or("-")
        );
    }
    print_more_hint(&agents, paging.page);
    Ok(())
}

async fn trigger(client: &Client, request: &TriggerRequest) -> Result<(), CliError> {
    let build = client
        .builds
        .trigger_build(request)
        .await?
        .ok_or_else(|| CliError::TriggerNotAcknowledged(request.build_type_id.clone()))?;

    println!("Build triggered:");
    print_build(&build);
    Ok(())
}

async fn cancel(client: &Client, build_id: BuildId, comment: &str) -> Result<(), CliError> {
    client.builds.cancel_build(build_id, comment).await?;
    println!("Build {} cancelled", build_id);
    Ok(())
}

async fn get_build(client: &Client, build_id: BuildId) -> Result<(), CliError> {
    let build = client
        .builds
        .get_build(build_id)
        .await?
        .ok_or(CliError::BuildNotFound(build_id))?;
    print_build(&build);
    Ok(())
}

fn print_header<T>(title: &str, page: &PagedResult<T>) {
    println!("{} ({} returned, {} total):", title, page.returned_count(), page.total_count);
}

fn print_more_hint<T>(page: &PagedResult<T>, current: u32) {
    if page.has_more() {
        println!("\nMore available, use --page {} for the next page", current.max(1) + 1);
    }
}

fn print_build_table(builds: &[Build]) {
    println!("{:<10}  {:<10}  {:<10}  {:<10}  {}", "ID", "NUMBER", "STATE", "STATUS", "BRANCH");
    println!("{}", "-".repeat(80));
    for build in builds {
        println!(
            "{:<10}  {:<10}  {:<10}  {:<10}  {}",
            build.id.get(),
            build.number,
            build.state,
            build.status().to_string(),
            build.branch_name.as_deref().unwrap_or("default")
        );
    }
}

fn print_build(build: &Build) {
    println!("  ID:         {}", build.id);
    println!("  Number:     {}", build.number);
    println!("  BuildType:  {}", build.build_type_id);
    println!("  State:      {}", build.state);
    println!("  Status:     {}", build.status());
    if let Some(text) = &build.status_text {
        println!("  Detail:     {}", text);
    }
    println!("  Branch:     {}", build.branch_name.as_deref().unwrap_or("default"));
    if let Some(agent) = &build.agent {
        println!("  Agent:      {}", agent.name);
    }
    let tags = build.tag_names();
    if !tags.is_empty() {
        println!("  Tags:       {}", tags.join(", "));
    }
    if !build.properties.is_empty() {
        println!("  Parameters:");
        for param in build.properties.iter() {
            println!("    - {} = {}", param.name, param.value);
        }
    }
    if let Some(url) = &build.web_url {
        println!("  URL:        {}", url);
    }
}

fn print_outcome(outcome: &DispatchOutcome) {
    println!("Fingerprint: {}", outcome.fingerprint);

    println!("Candidates ({}):", outcome.candidates.len());
    for candidate in &outcome.candidates {
        let state = if candidate.idle { "idle" } else { "busy" };
        println!(
            "  {:<40}  {:<5}  {} active",
            candidate.id.as_str(),
            state,
            candidate.active_count
        );
    }

    let report = &outcome.cancellations;
    if !report.attempted.is_empty() {
        println!(
            "Duplicates: {} found, {} cancelled",
            report.attempted.len(),
            report.cancelled.len()
        );
        for failure in &report.failed {
            println!(
                "  ! {} on {}: {}",
                failure.build_id, failure.build_type_id, failure.reason
            );
        }
    }

    println!("Triggered on {}:", outcome.selected);
    print_build(&outcome.triggered);
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
