//! Error taxonomy for a digest run.
//!
//! Every fatal category maps to its own process exit code so a scheduler
//! can tell a bad configuration apart from an upstream outage.

use thiserror::Error;

use crate::models::Workspace;

/// Settings that are missing or unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set (pass the flag or set it in the environment / .env)")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Failures talking to the task tracker.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error from ClickUp: {status} {body}")]
    Http { status: u16, body: String },

    #[error("request to ClickUp failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Failures posting the digest to the webhook.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Discord webhook failed on chunk {chunk}/{total}: {status} {body}")]
    Rejected {
        chunk: usize,
        total: usize,
        status: u16,
        body: String,
    },

    #[error("sending to Discord failed on chunk {chunk}/{total}: {source}")]
    Transport {
        chunk: usize,
        total: usize,
        #[source]
        source: reqwest::Error,
    },
}

/// Summary failures never leave the summary module; they only get logged.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("summary service returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("summary request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("summary response had no content")]
    Empty,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No Workspaces (teams) found for your token.")]
    NoWorkspaces,

    #[error("CLICKUP_TEAM_ID is required ({} workspace(s) available)", .0.len())]
    WorkspaceRequired(Vec<Workspace>),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::NoWorkspaces | AppError::WorkspaceRequired(_) => 1,
            AppError::Config(_) => 2,
            AppError::Fetch(_) => 3,
            AppError::Delivery(_) => 4,
            AppError::Internal(_) => 5,
        }
    }
}
