//! Telegram Bot API notifier.
//!
//! Posts to `sendMessage` once per channel. HTTP 429 answers are retried after
//! the `parameters.retry_after` delay the API asks for.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::TelegramConfig;
use crate::dispatcher::Notifier;
use crate::error::NotifyError;
use crate::types::{ContentKind, Identifier};

const API_BASE: &str = "https://api.telegram.org";

/// Attempts per message before giving up on a rate-limited channel.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Longest server-requested backoff honored before retrying.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// `sendMessage` text limit in characters.
const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    parse_mode: String,
    api_base: String,
}

impl TelegramNotifier {
    pub fn new(cfg: &TelegramConfig) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(Duration::from_secs(cfg.timeout_secs)).build()?;
        Ok(Self { client, bot_token: cfg.bot_token.trim().to_string(), parse_mode: cfg.parse_mode.clone(), api_base: API_BASE.to_string() })
    }

    /// Points the notifier at another Bot API server (self-hosted `telegram-bot-api`).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_enabled(&self) -> bool { !self.bot_token.is_empty() }

    fn send_url(&self) -> String { format!("{}/bot{}/sendMessage", self.api_base, self.bot_token) }

    pub fn build_message(&self, kind: ContentKind, id: &Identifier) -> String {
        let heading = match kind { ContentKind::Vod => "New film", ContentKind::Series => "New series" };
        let id_text = id.to_string();
        let text = if self.parse_mode.eq_ignore_ascii_case("HTML") {
            format!("\u{1f3ac} <b>{}</b> added to the catalog\nID: <code>{}</code>", heading, escape_html(&id_text))
        } else {
            format!("\u{1f3ac} *{}* added to the catalog\nID: `{}`", heading, escape_markdown_code(&id_text))
        };
        truncate_message(&text, TELEGRAM_MESSAGE_LIMIT)
    }

    async fn send_with_retry(&self, payload: &Value) -> Result<(), NotifyError> {
        let url = self.send_url();
        let mut attempts = 0;
        loop {
            attempts += 1;
            let response = self.client.post(&url).json(payload).send().await?;
            let status = response.status();
            if status.is_success() { return Ok(()); }

            if status.as_u16() == 429 {
                let body: Value = response.json().await.unwrap_or_default();
                let wait = retry_after(&body).unwrap_or(Duration::from_secs(1));
                if attempts >= MAX_RATE_LIMIT_RETRIES {
                    return Err(NotifyError::RateLimited { attempts });
                }
                debug!("telegram rate limited, waiting {:?} (attempt {}/{})", wait, attempts, MAX_RATE_LIMIT_RETRIES);
                tokio::time::sleep(wait).await;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status: status.as_u16(), body });
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, channel: &str, kind: ContentKind, id: &Identifier) -> Result<(), NotifyError> {
        if !self.is_enabled() { return Err(NotifyError::Disabled); }
        let payload = json!({
            "chat_id": channel,
            "text": self.build_message(kind, id),
            "parse_mode": self.parse_mode,
        });
        self.send_with_retry(&payload).await?;
        debug!(channel = %channel, id = %id, "telegram message sent");
        Ok(())
    }
}

fn retry_after(body: &Value) -> Option<Duration> {
    body.get("parameters").and_then(|p| p.get("retry_after")).and_then(|v| v.as_u64())
        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Inside a code span only the backslash and backtick need escaping.
fn escape_markdown_code(s: &str) -> String {
    s.replace('\\', "\\\\").replace('`', "\\`")
}

fn truncate_message(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit { return text.to_string(); }
    let suffix = "\n\n[truncated]";
    let budget = limit - suffix.len();
    let truncated: String = text.chars().take(budget).collect();
    format!("{}{}", truncated, suffix)
}
