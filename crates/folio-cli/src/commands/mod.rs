pub mod check;
pub mod codes;
pub mod config;
pub mod group;
pub mod init;
pub mod login;
pub mod user;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use folio_auth::{DirectoryStore, SqliteDirectoryStore};
use folio_core::PermissionCodec;
use folio_core::config::FolioConfig;

/// Everything a directory command needs: config, codec and an open store.
pub struct Context {
    pub config: FolioConfig,
    pub codec: Arc<PermissionCodec>,
    pub store: SqliteDirectoryStore,
}

impl Context {
    pub async fn open(base_dir: &Path) -> Result<Self> {
        let config = FolioConfig::load(&FolioConfig::default_path(base_dir))?;
        let codec = Arc::new(config.codec()?);
        let store = SqliteDirectoryStore::open(&config.folio.db_path)?;
        store.migrate().await?;
        Ok(Self {
            config,
            codec,
            store,
        })
    }
}

/// Codec from the config file when one exists, built-in kinds otherwise.
pub fn load_codec(base_dir: &Path) -> Result<PermissionCodec> {
    let config_path = FolioConfig::default_path(base_dir);
    if config_path.exists() {
        Ok(FolioConfig::load(&config_path)?.codec()?)
    } else {
        Ok(PermissionCodec::builtin()?)
    }
}

pub const DEFAULT_LOG_FILTER: &str = "folio=info";

/// The `log_filter` from the config file, or the default when there is none.
pub fn log_directive(base_dir: &Path) -> String {
    FolioConfig::load(&FolioConfig::default_path(base_dir))
        .map(|c| c.folio.log_filter)
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string())
}

/// Build a filter from a configured `RUST_LOG`-style string. A bad value
/// yields the default filter plus a message to log once tracing is up.
pub fn config_filter(directives: &str) -> (EnvFilter, Option<String>) {
    match EnvFilter::try_new(directives) {
        Ok(filter) => (filter, None),
        Err(e) => (
            EnvFilter::new(DEFAULT_LOG_FILTER),
            Some(format!(
                "invalid log_filter {directives:?} ({e}), using {DEFAULT_LOG_FILTER:?}"
            )),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_directive_filter_is_accepted() {
        let (filter, warning) = config_filter("folio=info,rusqlite=warn");
        assert!(warning.is_none());
        let rendered = filter.to_string();
        assert!(rendered.contains("folio=info"));
        assert!(rendered.contains("rusqlite=warn"));
    }

    #[test]
    fn bad_filter_falls_back_to_default() {
        let (filter, warning) = config_filter("folio=loud");
        assert!(warning.unwrap().contains("folio=loud"));
        assert_eq!(filter.to_string(), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn missing_config_uses_default_directive() {
        let dir = std::env::temp_dir().join("folio-no-such-config-dir");
        assert_eq!(log_directive(&dir), DEFAULT_LOG_FILTER);
    }
}
