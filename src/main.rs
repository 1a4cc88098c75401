mod cli;
mod clickup;
mod config;
mod digest;
mod discord;
mod error;
mod models;
mod runner;
mod summary;
mod window;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use chrono::Utc;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use config::Config;
use error::AppError;

fn main() -> ExitCode {
    load_env_file(Path::new(".env"));
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("duedigest=info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let AppError::WorkspaceRequired(workspaces) = &e {
                println!("Please set CLICKUP_TEAM_ID to one of the following IDs and rerun:");
                runner::print_workspaces(workspaces);
            } else {
                eprintln!("ERROR: {}", e);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

// Values already in the process environment win over the file
fn load_env_file(path: &Path) {
    match dotenvy::from_path(path) {
        Ok(()) => {}
        Err(e) if e.not_found() => {}
        Err(e) => eprintln!("WARNING: ignoring {}: {}", path.display(), e),
    }
}

fn dispatch(cli: Cli) -> Result<(), AppError> {
    let command = cli.command.unwrap_or(Commands::Run);

    if let Commands::Completions { shell } = &command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "duedigest", &mut std::io::stdout());
        return Ok(());
    }

    let config = Config::from_settings(cli.settings)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let now = Utc::now().with_timezone(&config.timezone);

    rt.block_on(async {
        match command {
            Commands::Workspaces => {
                let client = runner::client_for(&config);
                let workspaces = client.workspaces().await?;
                if workspaces.is_empty() {
                    return Err(AppError::NoWorkspaces);
                }
                runner::print_workspaces(&workspaces);
            }
            Commands::Preview => {
                let prepared = runner::prepare(&config, &now).await?;
                log::info!("Preview only, {} task(s) not sent", prepared.digest.total);
                println!("{}", prepared.text);
            }
            Commands::Run => {
                let report = runner::run(&config, &now).await?;
                log::debug!("digest delivered in {} message(s)", report.chunks_sent);
                println!("Sent {} task(s) to Discord.", report.task_count);
            }
            Commands::Completions { .. } => {}
        }
        Ok::<(), AppError>(())
    })
}
