pub mod cycles;
pub mod entries;
pub mod export;
pub mod init;
pub mod month;
pub mod mutate;
pub mod root;
pub mod stats;

use crate::data::AppSettings;
use crate::service::{DataService, LocalService, resolve_entry};
use crate::ui::{LoadStatus, ViewController};
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Everything a command needs: where the data lives, the settings read from
/// it, and the service opened on it.
pub struct Session {
    pub data_dir: PathBuf,
    pub settings: AppSettings,
    pub service: Arc<LocalService>,
}

impl Session {
    pub fn open(data_dir: &Path, entry_override: Option<String>) -> Result<Self> {
        let settings = AppSettings::load_from(data_dir)
            .with_context(|| format!("Failed to load settings from {}", data_dir.display()))?
            .with_entry_override(entry_override);
        let service = LocalService::open(data_dir)
            .with_context(|| format!("Failed to open tracker data in {}", data_dir.display()))?;
        Ok(Session {
            data_dir: data_dir.to_path_buf(),
            settings,
            service: Arc::new(service),
        })
    }

    pub fn service(&self) -> Arc<dyn DataService> {
        self.service.clone()
    }

    /// Resolves the target entry once. Fails when there is nothing to open.
    pub async fn entry_id(&self) -> Result<String> {
        match resolve_entry(self.service.as_ref(), self.settings.entry_id.as_deref()).await? {
            Some(id) => Ok(id),
            None => bail!(
                "No tracker entries in {}. Run `ftcal init` or pass --entry.",
                self.data_dir.display()
            ),
        }
    }

    /// A controller bound to the resolved entry, loaded once.
    pub async fn controller(&self) -> Result<ViewController> {
        let entry_id = self.entry_id().await?;
        info!(entry = %entry_id, "opening view controller");
        let mut controller = ViewController::new(self.service(), entry_id);
        controller.refresh().await;
        if let LoadStatus::Error(err) = controller.status() {
            bail!("Failed to load cycles for '{}': {err}", controller.entry_id());
        }
        Ok(controller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_session_resolves_first_entry() {
        let tmp = TempDir::new().unwrap();
        let session = Session::open(tmp.path(), None).unwrap();
        session.service.create_entry("only", "Only").await.unwrap();
        assert_eq!(session.entry_id().await.unwrap(), "only");
        let controller = session.controller().await.unwrap();
        assert_eq!(controller.entry_id(), "only");
    }

    #[tokio::test]
    async fn test_session_without_entries_fails() {
        let tmp = TempDir::new().unwrap();
        let session = Session::open(tmp.path(), None).unwrap();
        let err = session.entry_id().await.unwrap_err();
        assert!(err.to_string().contains("No tracker entries"));
    }

    #[tokio::test]
    async fn test_session_unknown_override_fails_on_load() {
        let tmp = TempDir::new().unwrap();
        let session = Session::open(tmp.path(), Some("ghost".to_string())).unwrap();
        let err = session.controller().await.err().unwrap();
        assert!(err.to_string().contains("Entry not found: ghost"));
    }
}
