//! Catalog side: the `Fetcher` seam and an Xtream Codes `player_api.php` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::CatalogConfig;
use crate::error::FetchError;
use crate::types::{ContentKind, FetchResult, Identifier};

/// Lists the identifiers currently visible in the catalog for one kind.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, kind: ContentKind) -> Result<FetchResult, FetchError>;
}

pub struct XtreamCatalog {
    client: Client,
    endpoint: Url,
    username: String,
    password: String,
}

impl XtreamCatalog {
    pub fn new(cfg: &CatalogConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self { client, endpoint: player_api_url(&cfg.api_url)?, username: cfg.username.clone(), password: cfg.password.clone() })
    }

    pub fn endpoint(&self) -> &Url { &self.endpoint }
}

#[async_trait]
impl Fetcher for XtreamCatalog {
    async fn fetch(&self, kind: ContentKind) -> Result<FetchResult, FetchError> {
        let response = self.client
            .get(self.endpoint.clone())
            .query(&[("username", self.username.as_str()), ("password", self.password.as_str()), ("action", action_for(kind))])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), body });
        }
        let ids = parse_listing(kind, &body)?;
        debug!(kind = %kind, count = ids.len(), "catalog listed");
        Ok(ids)
    }
}

/// `http://host:port` or `http://host:port/player_api.php` both resolve to the API script.
pub fn player_api_url(base: &str) -> Result<Url, FetchError> {
    let trimmed = base.trim().trim_end_matches('/');
    if trimmed.ends_with("player_api.php") { return Ok(Url::parse(trimmed)?); }
    Ok(Url::parse(&format!("{}/player_api.php", trimmed))?)
}

pub fn action_for(kind: ContentKind) -> &'static str {
    match kind { ContentKind::Vod => "get_vod_streams", ContentKind::Series => "get_series" }
}

fn id_field(kind: ContentKind) -> &'static str {
    match kind { ContentKind::Vod => "stream_id", ContentKind::Series => "series_id" }
}

/// Extracts the id of every entry in a listing response. Entries without a usable id are skipped.
pub fn parse_listing(kind: ContentKind, body: &str) -> Result<FetchResult, FetchError> {
    let value: Value = serde_json::from_str(body)?;
    let entries = match value {
        Value::Array(items) => items,
        // Some panels answer an empty catalog with `{}` or `null`
        Value::Null => return Ok(FetchResult::new()),
        Value::Object(map) if map.is_empty() => return Ok(FetchResult::new()),
        other => return Err(FetchError::Other(format!("expected a list for {}, got {}", action_for(kind), short(&other)))),
    };
    let field = id_field(kind);
    let mut out = FetchResult::with_capacity(entries.len());
    for entry in entries {
        match entry.get(field).and_then(identifier_from) {
            Some(id) => { out.insert(id); }
            None => warn!(kind = %kind, "catalog entry without {}: {}", field, short(&entry)),
        }
    }
    Ok(out)
}

fn identifier_from(v: &Value) -> Option<Identifier> {
    match v {
        Value::Number(n) => n.as_i64().map(Identifier::Int).or_else(|| n.as_u64().map(Identifier::UInt)),
        Value::String(s) if !s.trim().is_empty() => Some(Identifier::Text(s.trim().to_string())),
        _ => None,
    }
}

fn short(v: &Value) -> String {
    let s = v.to_string();
    if s.chars().count() <= 120 { return s; }
    let head: String = s.chars().take(120).collect();
    format!("{}...", head)
}
