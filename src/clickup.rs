use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;

use crate::error::FetchError;
use crate::models::{Task, Workspace};
use crate::window::Window;

pub const DEFAULT_API_BASE: &str = "https://api.clickup.com/api/v2";
pub const PAGE_SIZE: usize = 100;

const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct TeamsResponse {
    #[serde(default)]
    teams: Vec<RawTeam>,
}

#[derive(Deserialize)]
struct RawTeam {
    id: Value,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct UserResponse {
    user: RawUser,
}

#[derive(Deserialize)]
struct RawUser {
    id: Value,
}

#[derive(Deserialize)]
struct TasksResponse {
    // decoded one by one so a single odd record cannot sink the page
    #[serde(default)]
    tasks: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawTask {
    pub id: Value,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub due_date: Option<Value>,
    #[serde(default)]
    pub status: Option<RawStatus>,
    #[serde(default)]
    pub tags: Vec<RawTag>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawStatus {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawTag {
    #[serde(default)]
    pub name: Option<String>,
}

pub struct FetchQuery<'a> {
    pub workspace_id: &'a str,
    pub window: Window,
    pub assignee: Option<&'a str>,
    pub include_closed: bool,
}

pub struct ClickUpClient {
    client: Client,
    base_url: String,
    token: String,
    link_template: String,
}

impl ClickUpClient {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        link_template: impl Into<String>,
    ) -> Self {
        ClickUpClient {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            link_template: link_template.into(),
        }
    }

    fn get(&self, path: &str, timeout: Duration) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .header("Authorization", &self.token)
            .timeout(timeout)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, FetchError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }

    pub async fn workspaces(&self) -> Result<Vec<Workspace>, FetchError> {
        let resp: TeamsResponse = self.get_json(self.get("/team", DISCOVERY_TIMEOUT)).await?;
        Ok(resp
            .teams
            .into_iter()
            .map(|t| Workspace {
                id: id_string(&t.id),
                name: t.name.unwrap_or_default(),
            })
            .collect())
    }

    pub async fn current_user_id(&self) -> Result<String, FetchError> {
        let resp: UserResponse = self.get_json(self.get("/user", DISCOVERY_TIMEOUT)).await?;
        Ok(id_string(&resp.user.id))
    }

    /// Pages through every task in the workspace and keeps only those due
    /// inside `query.window`. The upstream due-date filters are not used.
    pub async fn fetch_due_tasks(&self, query: &FetchQuery<'_>) -> Result<Vec<Task>, FetchError> {
        let mut tasks = Vec::new();
        let mut page = 0u32;

        loop {
            let mut params: Vec<(&str, String)> = vec![
                ("include_closed", query.include_closed.to_string()),
                ("subtasks", "true".to_string()),
                ("page", page.to_string()),
            ];
            if let Some(assignee) = query.assignee {
                params.push(("assignees[]", assignee.to_string()));
            }

            let request = self
                .get(&format!("/team/{}/task", query.workspace_id), PAGE_TIMEOUT)
                .query(&params);
            let batch = self.get_json::<TasksResponse>(request).await?.tasks;
            let batch_len = batch.len();
            log::debug!("page {} returned {} task(s)", page, batch_len);

            if batch_len == 0 {
                break;
            }

            for record in batch {
                let raw = match serde_json::from_value::<RawTask>(record) {
                    Ok(raw) => raw,
                    Err(e) => {
                        log::debug!("skipping unreadable task record: {}", e);
                        continue;
                    }
                };
                if let Some(task) = self.normalize(raw) {
                    if task.due_at.map_or(false, |due| query.window.contains(due)) {
                        tasks.push(task);
                    }
                }
            }

            if batch_len < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        log::info!("Fetched {} task(s) due in the next {} days", tasks.len(), query.window.days);
        Ok(tasks)
    }

    /// Returns `None` for records without a usable due date.
    pub fn normalize(&self, raw: RawTask) -> Option<Task> {
        let id = id_string(&raw.id);
        let due_at = match raw.due_date.as_ref() {
            None | Some(Value::Null) => return None,
            Some(value) => match parse_due(value) {
                Some(ms) => ms,
                None => {
                    log::debug!("skipping task {}: malformed due_date {}", id, value);
                    return None;
                }
            },
        };

        let link = raw
            .url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.link_template.replace("{id}", &id));

        Some(Task {
            title: raw.name.filter(|n| !n.is_null()).map(|n| id_string(&n)),
            due_at: Some(due_at),
            status: raw.status.and_then(|s| s.status),
            labels: raw.tags.into_iter().filter_map(|t| t.name).collect(),
            link,
            id,
        })
    }
}

fn parse_due(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

// ClickUp sends ids as numbers on some endpoints and strings on others;
// also used for names that arrive as non-strings
fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
