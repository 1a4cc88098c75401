use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use crate::error::DeliveryError;

/// Discord rejects messages over 2000 characters; leave room for the margin.
pub const DEFAULT_MAX_CHUNK: usize = 1900;

const POST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub chunks_sent: usize,
    pub task_count: usize,
}

pub struct DiscordWebhook {
    client: Client,
    url: String,
    max_chunk: usize,
}

impl DiscordWebhook {
    pub fn new(url: impl Into<String>, max_chunk: usize) -> Self {
        DiscordWebhook {
            client: Client::new(),
            url: url.into(),
            max_chunk: max_chunk.max(1),
        }
    }

    /// Posts `text` in order, one message per chunk. Stops at the first
    /// rejected chunk; chunks already posted stay posted.
    pub async fn deliver(&self, text: &str, task_count: usize) -> Result<DeliveryReport, DeliveryError> {
        let chunks = split_chunks(text, self.max_chunk);
        let total = chunks.len();
        if total > 1 {
            log::info!("Digest is {} chars, sending in {} parts", text.chars().count(), total);
        }

        for (i, chunk) in chunks.iter().enumerate() {
            let n = i + 1;
            let response = self
                .client
                .post(&self.url)
                .timeout(POST_TIMEOUT)
                .json(&WebhookPayload { content: chunk })
                .send()
                .await
                .map_err(|source| DeliveryError::Transport {
                    chunk: n,
                    total,
                    source,
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(DeliveryError::Rejected {
                    chunk: n,
                    total,
                    status: status.as_u16(),
                    body,
                });
            }
            log::debug!("chunk {}/{} accepted ({})", n, total, status);
        }

        Ok(DeliveryReport {
            chunks_sent: total,
            task_count,
        })
    }
}

/// Fixed-width split on char boundaries. Concatenating the pieces gives
/// back `text`.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let cut = rest
            .char_indices()
            .nth(max_chars)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }
    chunks
}
