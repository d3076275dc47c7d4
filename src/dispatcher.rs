use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::NotifyError;
use crate::types::{ContentKind, Identifier};

/// Delivers one announcement to one channel. Any retry policy lives behind this trait.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, channel: &str, kind: ContentKind, id: &Identifier) -> Result<(), NotifyError>;
}

/// A channel that could not be reached for an identifier.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelFailure {
    pub channel: String,
    pub error: String,
}

/// Per-identifier delivery result across all channels.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub id: Identifier,
    pub delivered: Vec<String>,
    pub failed: Vec<ChannelFailure>,
}

impl DispatchReport {
    pub fn all_failed(&self) -> bool { self.delivered.is_empty() && !self.failed.is_empty() }
}

/// Sends `id` to every channel concurrently. One channel failing never
/// prevents the others from being attempted.
pub async fn dispatch(notifier: &dyn Notifier, kind: ContentKind, id: &Identifier, channels: &[String]) -> DispatchReport {
    let attempts = channels.iter().map(|ch| async move { (ch, notifier.notify(ch, kind, id).await) });
    let results = join_all(attempts).await;

    let mut report = DispatchReport { id: id.clone(), delivered: Vec::new(), failed: Vec::new() };
    for (channel, result) in results {
        match result {
            Ok(()) => {
                debug!(kind = %kind, id = %id, channel = %channel, "delivered");
                report.delivered.push(channel.clone());
            }
            Err(e) => {
                warn!(kind = %kind, id = %id, channel = %channel, error = %e, "delivery failed");
                report.failed.push(ChannelFailure { channel: channel.clone(), error: e.to_string() });
            }
        }
    }
    report
}
