use chrono_tz::Tz;
use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::clickup::DEFAULT_API_BASE;
use crate::discord::DEFAULT_MAX_CHUNK;
use crate::summary::{Locale, DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Parser)]
#[command(author, version, about = "Post a daily digest of upcoming ClickUp tasks to Discord", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub settings: Settings,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, compose and send today's digest (default)
    Run,
    /// Print today's digest without sending it
    Preview,
    /// List the workspaces visible to the token
    Workspaces,
    /// Generate shell completions
    Completions {
        #[arg(value_name = "SHELL", value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// ClickUp personal API token
    #[arg(long, global = true, env = "CLICKUP_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Workspace (team) id to read tasks from
    #[arg(long, global = true, env = "CLICKUP_TEAM_ID")]
    pub workspace_id: Option<String>,

    /// Discord webhook receiving the digest
    #[arg(long, global = true, env = "DISCORD_WEBHOOK_URL", hide_env_values = true)]
    pub webhook_url: Option<String>,

    /// Days ahead to include regular work
    #[arg(long, global = true, env = "DAYS_AHEAD", default_value_t = 7)]
    pub days_ahead: u32,

    /// Days ahead to include tasks carrying the urgent marker
    #[arg(long, global = true, env = "EXAM_DAYS_AHEAD", default_value_t = 14)]
    pub urgent_days_ahead: u32,

    /// Tag that marks a task as an exam
    #[arg(long, global = true, env = "URGENT_MARKER", default_value = "exam")]
    pub urgent_marker: String,

    /// Only include tasks assigned to the token's owner
    #[arg(
        long,
        global = true,
        env = "ONLY_ASSIGNED_TO_ME",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = parse_flag
    )]
    pub only_assigned_to_me: bool,

    /// Include closed tasks
    #[arg(
        long,
        global = true,
        env = "INCLUDE_CLOSED",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = parse_flag
    )]
    pub include_closed: bool,

    /// IANA timezone used for windows and dates
    #[arg(long, global = true, env = "DIGEST_TIMEZONE", default_value = "Asia/Bangkok", value_parser = parse_timezone)]
    pub timezone: Tz,

    /// Link used when a task has no url; `{id}` is replaced by the task id
    #[arg(long, global = true, env = "TASK_URL_TEMPLATE", default_value = "https://app.clickup.com/t/{id}")]
    pub task_url_template: String,

    #[arg(long, global = true, env = "CLICKUP_API_BASE", default_value = DEFAULT_API_BASE, hide = true)]
    pub api_base: String,

    /// API key for the optional AI summary
    #[arg(long, global = true, env = "SUMMARY_API_KEY", hide_env_values = true)]
    pub summary_api_key: Option<String>,

    #[arg(long, global = true, env = "SUMMARY_MODEL", default_value = DEFAULT_MODEL)]
    pub summary_model: String,

    #[arg(long, global = true, env = "SUMMARY_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub summary_base_url: String,

    /// Language of the AI summary
    #[arg(long, global = true, env = "SUMMARY_LOCALE", value_enum, ignore_case = true, default_value = "en")]
    pub summary_locale: Locale,

    /// Maximum characters per Discord message
    #[arg(long, global = true, env = "DISCORD_MAX_CHUNK", default_value_t = DEFAULT_MAX_CHUNK)]
    pub max_chunk: usize,
}

// Anything outside the truthy set reads as false, never as an error
pub fn parse_flag(value: &str) -> Result<bool, String> {
    Ok(matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    ))
}

pub fn parse_timezone(value: &str) -> Result<Tz, String> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|e| format!("unknown timezone '{}': {}", value, e))
}
