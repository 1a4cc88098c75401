use chrono::DateTime;
use chrono_tz::Tz;

use crate::clickup::{ClickUpClient, FetchQuery};
use crate::config::Config;
use crate::digest::{compose, Digest};
use crate::discord::{DeliveryReport, DiscordWebhook};
use crate::error::AppError;
use crate::models::{Classified, Workspace};
use crate::summary::Summarizer;
use crate::window::Classifier;

pub struct Prepared {
    pub classified: Classified,
    pub digest: Digest,
    pub text: String,
}

pub fn client_for(config: &Config) -> ClickUpClient {
    ClickUpClient::new(
        config.api_base.clone(),
        config.token.clone(),
        config.task_url_template.clone(),
    )
}

/// Resolves the workspace id, or fails with the list the operator can pick from.
pub async fn resolve_workspace(config: &Config, client: &ClickUpClient) -> Result<String, AppError> {
    if let Some(id) = &config.workspace_id {
        return Ok(id.clone());
    }
    let workspaces = client.workspaces().await?;
    if workspaces.is_empty() {
        return Err(AppError::NoWorkspaces);
    }
    Err(AppError::WorkspaceRequired(workspaces))
}

pub fn print_workspaces(workspaces: &[Workspace]) {
    for w in workspaces {
        println!("  {}  -  {}", w.id, w.name);
    }
}

/// fetch → classify → summarize → compose. Nothing is sent.
pub async fn prepare(config: &Config, now: &DateTime<Tz>) -> Result<Prepared, AppError> {
    let client = client_for(config);
    let workspace_id = resolve_workspace(config, &client).await?;

    let assignee = if config.only_assigned_to_me {
        match client.current_user_id().await {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!(
                    "Couldn't get your user id, continuing without assignee filter. Details: {}",
                    e
                );
                None
            }
        }
    } else {
        None
    };

    let regular = config.regular_window(now);
    let urgent = config.urgent_window(now);
    let query = FetchQuery {
        workspace_id: &workspace_id,
        window: regular.union(&urgent),
        assignee: assignee.as_deref(),
        include_closed: config.include_closed,
    };
    let tasks = client.fetch_due_tasks(&query).await?;

    let classified = Classifier::new(&config.urgent_marker, regular, urgent).classify(tasks);

    let summary = match Summarizer::from_config(config.summary.as_ref()) {
        Some(summarizer) => summarizer.summarize(&classified, now).await,
        None => None,
    };

    let digest = compose(
        &classified,
        now,
        config.regular_days,
        config.urgent_days,
        summary.as_deref(),
    );
    let text = digest.render();

    Ok(Prepared {
        classified,
        digest,
        text,
    })
}

pub async fn run(config: &Config, now: &DateTime<Tz>) -> Result<DeliveryReport, AppError> {
    // fail before any network call other than workspace discovery
    let webhook_url = config.webhook()?.to_string();

    let prepared = prepare(config, now).await?;
    let hook = DiscordWebhook::new(webhook_url, config.max_chunk);
    let report = hook.deliver(&prepared.text, prepared.classified.total()).await?;
    Ok(report)
}
