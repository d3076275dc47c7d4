pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod detector;
pub mod dispatcher;
pub mod error;
pub mod storage;
pub mod telegram;
pub mod types;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::catalog::{Fetcher, XtreamCatalog};
    pub use crate::config::Config;
    pub use crate::coordinator::{KindReport, RunCoordinator, RunOutcome};
    pub use crate::detector::{detect, Detection};
    pub use crate::dispatcher::{dispatch, DispatchReport, Notifier};
    pub use crate::error::{ErrorKind, FetchError, NotifyError, StorageError};
    pub use crate::storage::{JsonFileStore, StateStore};
    pub use crate::types::{ContentKind, FetchResult, Identifier, SeenSet};
}

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::catalog::XtreamCatalog;
use crate::config::Config;
use crate::coordinator::RunCoordinator;
use crate::storage::JsonFileStore;
use crate::telegram::TelegramNotifier;

/// Wires the file store, Xtream catalog and Telegram notifier described by `cfg`.
pub fn coordinator_from_config(cfg: &Config) -> Result<RunCoordinator> {
    let store = JsonFileStore::new(cfg.state_dir()?);
    let fetcher = XtreamCatalog::new(&cfg.catalog).context("building catalog client")?;
    let notifier = TelegramNotifier::new(&cfg.telegram).context("building telegram client")?;
    tracing::debug!(state_dir = %store.dir().display(), endpoint = %fetcher.endpoint(), "coordinator configured");
    Ok(RunCoordinator::new(Arc::new(store), Arc::new(fetcher), Arc::new(notifier), cfg.telegram.channels.clone())
        .with_kinds(cfg.kinds.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentKind;
    use tempfile::TempDir;

    #[test]
    fn wires_configured_kinds_and_channels() {
        let tmp = TempDir::new().unwrap();
        let raw = format!(
            "state_dir = {:?}\nkinds = [\"series\"]\n[catalog]\napi_url = \"http://panel.tv\"\nusername = \"u\"\npassword = \"p\"\n[telegram]\nbot_token = \"t\"\nchannels = [\"@a\", \"@b\"]\n",
            tmp.path().display().to_string()
        );
        let cfg = Config::from_toml(&raw).unwrap();
        let c = coordinator_from_config(&cfg).unwrap();
        assert_eq!(c.kinds(), &[ContentKind::Series]);
        assert_eq!(c.channels(), &["@a".to_string(), "@b".to_string()]);
    }
}
