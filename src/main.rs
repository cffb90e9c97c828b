//! Standup - tracks recent commits across GitHub repositories and summarizes them.

mod app;
mod cache;
mod config;
mod error;
mod fetch;
mod github;
mod logging;
mod session;
mod state;
mod summary;
mod ui;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::app::App;
use crate::config::Config;
use crate::error::{Result, StandupError};
use crate::github::{GitHubClient, TrackedRepository};
use crate::session::FileSessionStore;
use crate::state::{LoadPhase, Tracker};
use crate::summary::OpenAiClient;

#[derive(Parser)]
#[command(name = "standup")]
#[command(version)]
#[command(about = "Track recent commits across GitHub repositories and summarize them")]
#[command(after_long_help = r#"EXAMPLES
    Start tracking two repositories:
        $ standup track octo/api octo/web

    Open the dashboard:
        $ standup

    Print a summary without the dashboard:
        $ standup summarize octo/api

ENVIRONMENT VARIABLES
    GITHUB_TOKEN              GitHub token used by `repos` and `track`
    OPENAI_API_KEY            OpenAI API key for summaries
    STANDUP_OPENAI_MODEL      Chat model (default: gpt-4o-mini)
    STANDUP_OPENAI_BASE_URL   OpenAI-compatible API base URL
    STANDUP_GITHUB_API_URL    GitHub API base URL (default: https://api.github.com)
    STANDUP_DATA_DIR          Where the tracking session and logs live
    RUST_LOG                  Log filter (default: standup=info)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive dashboard (default)
    Dashboard,
    /// List repositories the token can see, most recently updated first
    Repos,
    /// Start tracking repositories from now on
    Track {
        /// Repositories as owner/name
        #[arg(required = true)]
        repos: Vec<String>,
    },
    /// Fetch and print commits of the tracked repositories
    Status,
    /// Generate a summary for one tracked repository
    Summarize {
        /// Repository as owner/name
        repo: String,
    },
    /// Stop tracking and delete the session
    Stop,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command.unwrap_or(Commands::Dashboard)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<()> {
    let config = Config::from_env()?;

    let interactive = matches!(command, Commands::Dashboard);
    let _guard = logging::init(&config.logs_dir(), !interactive)
        .map_err(|e| StandupError::Other(e.to_string()))?;

    let github = Arc::new(GitHubClient::with_base_url(&config.github_api_url)?);
    let generator = Arc::new(OpenAiClient::new(
        config.openai_api_key.clone(),
        &config.openai_base_url,
        &config.openai_model,
    ));
    let store = Arc::new(FileSessionStore::new(config.session_path()));
    tracing::debug!(path = %store.path().display(), "Using session file");
    let tracker = Arc::new(Tracker::new(github.clone(), generator, store));

    match command {
        Commands::Dashboard => dashboard(tracker, github),
        Commands::Repos => list_repositories(&config, &github).await,
        Commands::Track { repos } => track(&config, &github, &tracker, &repos).await,
        Commands::Status => status(&tracker).await,
        Commands::Summarize { repo } => summarize(&tracker, &repo).await,
        Commands::Stop => {
            tracker.stop()?;
            println!("Tracking stopped.");
            Ok(())
        }
    }
}

fn dashboard(tracker: Arc<Tracker>, github: Arc<GitHubClient>) -> Result<()> {
    let mut terminal = ratatui::init();
    let mut app = App::new(tracker, github);
    let result = app.run(&mut terminal);
    ratatui::restore();
    result?;

    if app.state.phase == LoadPhase::Stopped {
        println!("Tracking stopped. Run `standup track <owner/name>...` to start again.");
    }
    Ok(())
}

async fn list_repositories(config: &Config, github: &GitHubClient) -> Result<()> {
    let repos = github.get_user_repos(config.github_token()?).await?;
    for repo in &repos {
        println!(
            "{:<40} {:<12} {}",
            repo.full_name,
            repo.language.as_deref().unwrap_or("-"),
            repo.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

async fn track(
    config: &Config,
    github: &GitHubClient,
    tracker: &Tracker,
    names: &[String],
) -> Result<()> {
    let token = config.github_token()?;
    let available = github.get_user_repos(token).await?;

    let mut selected: Vec<TrackedRepository> = Vec::with_capacity(names.len());
    for name in names {
        let repo = available
            .iter()
            .find(|r| r.full_name.eq_ignore_ascii_case(name))
            .ok_or_else(|| StandupError::Other(format!("Repository not found: {}", name)))?;
        if !selected.iter().any(|r| r.id == repo.id) {
            selected.push(repo.clone());
        }
    }

    let session = tracker.start_tracking(selected, token)?;
    println!(
        "Tracking {} repositories since {}.",
        session.repositories.len(),
        session.start_date.format("%Y-%m-%d %H:%M UTC")
    );
    Ok(())
}

async fn status(tracker: &Tracker) -> Result<()> {
    tracker.load().await;
    let state = tracker.snapshot();

    if state.phase == LoadPhase::Failed {
        return Err(StandupError::Other(state.error.unwrap_or_default()));
    }

    let Some(session) = &state.session else {
        return Err(StandupError::NoTrackingData);
    };
    for repo in &session.repositories {
        match state.commits_for(repo.id) {
            Some(commits) => {
                println!("{} ({} commits)", repo.full_name, commits.len());
                for commit in commits {
                    println!(
                        "  {} {}  {}",
                        commit.short_sha(),
                        commit.title(),
                        commit.author_name()
                    );
                }
            }
            None => println!("{} (unavailable)", repo.full_name),
        }
    }

    if let Some(error) = &state.error {
        eprintln!("{}", error);
    }
    if let Some(hint) = state.remediation_hint() {
        eprintln!("{}", hint);
    }
    Ok(())
}

async fn summarize(tracker: &Tracker, name: &str) -> Result<()> {
    tracker.load().await;
    let state = tracker.snapshot();
    if state.phase == LoadPhase::Failed {
        return Err(StandupError::Other(state.error.unwrap_or_default()));
    }

    let repo_id = state
        .session
        .as_ref()
        .and_then(|s| s.repositories.iter().find(|r| r.full_name.eq_ignore_ascii_case(name)))
        .map(|r| r.id)
        .ok_or_else(|| StandupError::Other(format!("Repository is not tracked: {}", name)))?;

    match tracker.summarize_repository(repo_id).await {
        Some(summary) => {
            println!("{}", summary.summary);
            println!();
            println!(
                "{} commits {}",
                summary.metadata.commit_count, summary.metadata.timeframe
            );
            for insight in &summary.insights {
                println!("  {}: {}", insight.short_sha(), insight.insight);
            }
            Ok(())
        }
        None => {
            let state = tracker.snapshot();
            let error = state
                .summary_error
                .unwrap_or_else(|| "No commits to summarize".to_string());
            Err(StandupError::Other(error))
        }
    }
}
