use std::time::Duration;

use anyhow::Context;
use chrono::DateTime;
use chrono_tz::Tz;
use clap::ValueEnum;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::SummaryError;
use crate::models::{Category, Classified};
use crate::window::{due_label, due_local};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const MAX_SNAPSHOT_TASKS: usize = 40;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Locale {
    En,
    Th,
}

#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub locale: Locale,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

pub struct Summarizer {
    client: Client,
    config: SummaryConfig,
}

impl Summarizer {
    /// `None` when no credential is configured.
    pub fn from_config(config: Option<&SummaryConfig>) -> Option<Self> {
        let config = config.filter(|c| !c.api_key.trim().is_empty())?;
        Some(Summarizer {
            client: Client::new(),
            config: config.clone(),
        })
    }

    /// Best effort: every failure is logged and reported as no summary.
    pub async fn summarize(&self, tasks: &Classified, now: &DateTime<Tz>) -> Option<String> {
        if tasks.is_empty() {
            return None;
        }
        match self.request(tasks, now).await {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("AI summary skipped: {:#}", e);
                None
            }
        }
    }

    async fn request(&self, tasks: &Classified, now: &DateTime<Tz>) -> anyhow::Result<String> {
        let prompt = build_prompt(self.config.locale, &snapshot(tasks, now), now);
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: 0.3,
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(SummaryError::from)
            .context("Failed to reach summary service")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummaryError::Http {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(SummaryError::from)
            .context("Failed to parse summary response")?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(SummaryError::Empty.into());
        }
        Ok(text)
    }
}

/// One line per task, capped at [`MAX_SNAPSHOT_TASKS`].
pub fn snapshot(tasks: &Classified, now: &DateTime<Tz>) -> String {
    let tz = now.timezone();
    tasks
        .combined()
        .into_iter()
        .filter_map(|(category, task)| task.due_at.map(|ms| (category, task, ms)))
        .take(MAX_SNAPSHOT_TASKS)
        .map(|(category, task, due_ms)| {
            let kind = match category {
                Category::Urgent => "EXAM",
                _ => "WORK",
            };
            let tags = if task.labels.is_empty() {
                "-".to_string()
            } else {
                task.labels.join(", ")
            };
            format!(
                "- [{}] {} | {} | due {} ({}) | {}",
                kind,
                task.display_title(),
                task.display_status(),
                due_local(due_ms, &tz).format("%Y-%m-%d"),
                due_label(due_ms, now),
                tags
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(locale: Locale, snapshot: &str, now: &DateTime<Tz>) -> String {
    let today = now.format("%Y-%m-%d");
    match locale {
        Locale::En => format!(
            "Today is {today}. Below is a list of upcoming tasks.\n\
             Write a short summary of 3-6 bullet points in English.\n\
             Mention EXAM tasks first, then other tasks with the closest deadlines.\n\
             Finish with one short encouraging remark.\n\n\
             Tasks:\n{snapshot}"
        ),
        Locale::Th => format!(
            "วันนี้คือวันที่ {today} ด้านล่างคือรายการงานที่ใกล้ถึงกำหนดส่ง\n\
             ช่วยสรุปเป็นภาษาไทยแบบสั้น ๆ 3-6 บูลเล็ต\n\
             ให้พูดถึงงานที่เป็น EXAM ก่อน แล้วตามด้วยงานอื่นที่ใกล้กำหนดที่สุด\n\
             ปิดท้ายด้วยประโยคให้กำลังใจหนึ่งประโยค\n\n\
             รายการงาน:\n{snapshot}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;
    use chrono::TimeZone;
    use chrono_tz::Asia::Bangkok;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn now() -> DateTime<Tz> {
        Bangkok.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    }

    fn task(title: &str, day: u32, labels: &[&str]) -> Task {
        Task {
            id: title.into(),
            title: Some(title.into()),
            due_at: Some(Bangkok.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap().timestamp_millis()),
            status: Some("open".into()),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            link: String::new(),
        }
    }

    fn sample() -> Classified {
        Classified {
            urgent: vec![task("Calculus", 5, &["exam"])],
            regular: vec![task("Essay", 2, &[])],
        }
    }

    fn config(base_url: String) -> SummaryConfig {
        SummaryConfig {
            api_key: "sk-test".into(),
            model: DEFAULT_MODEL.into(),
            base_url,
            locale: Locale::En,
        }
    }

    #[test]
    fn absent_credential_means_no_summarizer() {
        assert!(Summarizer::from_config(None).is_none());
        let mut blank = config("http://unused".into());
        blank.api_key = "  ".into();
        assert!(Summarizer::from_config(Some(&blank)).is_none());
    }

    #[test]
    fn snapshot_is_date_sorted_across_categories() {
        let text = snapshot(&sample(), &now());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "- [WORK] Essay | open | due 2024-01-02 (tomorrow) | -",
                "- [EXAM] Calculus | open | due 2024-01-05 (in 4 days) | exam",
            ]
        );
    }

    #[test]
    fn snapshot_is_capped() {
        let many = Classified {
            urgent: vec![],
            regular: (0..60).map(|i| task(&format!("T{}", i), 3, &[])).collect(),
        };
        assert_eq!(snapshot(&many, &now()).lines().count(), MAX_SNAPSHOT_TASKS);
    }

    #[test]
    fn prompts_differ_by_locale() {
        let en = build_prompt(Locale::En, "- [EXAM] x", &now());
        let th = build_prompt(Locale::Th, "- [EXAM] x", &now());
        assert!(en.contains("2024-01-01") && en.contains("- [EXAM] x"));
        assert!(th.contains("2024-01-01") && th.contains("ภาษาไทย"));
        assert_ne!(en, th);
    }

    #[tokio::test]
    async fn returns_trimmed_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "  • Study calculus\n"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let s = Summarizer::from_config(Some(&config(server.uri()))).unwrap();
        assert_eq!(
            s.summarize(&sample(), &now()).await.as_deref(),
            Some("• Study calculus")
        );
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .mount(&server)
            .await;
        let s = Summarizer::from_config(Some(&config(server.uri()))).unwrap();
        assert!(s.summarize(&sample(), &now()).await.is_none());

        let garbage = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&garbage)
            .await;
        let s = Summarizer::from_config(Some(&config(garbage.uri()))).unwrap();
        assert!(s.summarize(&sample(), &now()).await.is_none());
    }

    #[tokio::test]
    async fn skips_request_when_nothing_is_due() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let s = Summarizer::from_config(Some(&config(server.uri()))).unwrap();
        assert!(s.summarize(&Classified::default(), &now()).await.is_none());
    }
}
