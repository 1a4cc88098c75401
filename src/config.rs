use chrono::DateTime;
use chrono_tz::Tz;

use crate::cli::Settings;
use crate::error::ConfigError;
use crate::summary::SummaryConfig;
use crate::window::Window;

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub workspace_id: Option<String>,
    pub webhook_url: Option<String>,
    pub regular_days: u32,
    pub urgent_days: u32,
    pub urgent_marker: String,
    pub only_assigned_to_me: bool,
    pub include_closed: bool,
    pub timezone: Tz,
    pub task_url_template: String,
    pub api_base: String,
    pub summary: Option<SummaryConfig>,
    pub max_chunk: usize,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_settings(settings: Settings) -> Result<Self, ConfigError> {
        let token = non_empty(settings.token).ok_or(ConfigError::Missing("CLICKUP_TOKEN"))?;

        let urgent_marker = settings.urgent_marker.trim().to_string();
        if urgent_marker.is_empty() {
            return Err(ConfigError::Invalid {
                name: "URGENT_MARKER",
                reason: "must not be empty".to_string(),
            });
        }
        if settings.max_chunk == 0 {
            return Err(ConfigError::Invalid {
                name: "DISCORD_MAX_CHUNK",
                reason: "must be at least 1".to_string(),
            });
        }
        if settings.urgent_days_ahead < settings.days_ahead {
            log::warn!(
                "EXAM_DAYS_AHEAD ({}) is shorter than DAYS_AHEAD ({}); fetching the wider window",
                settings.urgent_days_ahead,
                settings.days_ahead
            );
        }

        let summary = non_empty(settings.summary_api_key).map(|api_key| SummaryConfig {
            api_key,
            model: settings.summary_model,
            base_url: settings.summary_base_url,
            locale: settings.summary_locale,
        });

        Ok(Config {
            token,
            workspace_id: non_empty(settings.workspace_id),
            webhook_url: non_empty(settings.webhook_url),
            regular_days: settings.days_ahead,
            urgent_days: settings.urgent_days_ahead,
            urgent_marker,
            only_assigned_to_me: settings.only_assigned_to_me,
            include_closed: settings.include_closed,
            timezone: settings.timezone,
            task_url_template: settings.task_url_template,
            api_base: settings.api_base,
            summary,
            max_chunk: settings.max_chunk,
        })
    }

    pub fn webhook(&self) -> Result<&str, ConfigError> {
        self.webhook_url
            .as_deref()
            .ok_or(ConfigError::Missing("DISCORD_WEBHOOK_URL"))
    }

    pub fn regular_window(&self, now: &DateTime<Tz>) -> Window {
        Window::days_ahead(now, self.regular_days)
    }

    pub fn urgent_window(&self, now: &DateTime<Tz>) -> Window {
        Window::days_ahead(now, self.urgent_days)
    }
}
