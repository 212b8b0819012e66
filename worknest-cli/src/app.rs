//! Wiring shared by the commands: config, session file, API client.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;
use worknest_core::{
    ApiClient, EventWizard, FileStore, IdentityResolver, OrganizationContext, WorknestConfig,
};

use crate::notifier::TerminalNotifier;

pub type Wizard = EventWizard<Arc<FileStore>, TerminalNotifier>;

pub struct App {
    pub config: WorknestConfig,
    pub api: ApiClient,
    pub identity: IdentityResolver<Arc<FileStore>>,
}

impl App {
    pub fn load() -> Result<Self> {
        let config = WorknestConfig::load().context("Could not load configuration")?;
        let session = Arc::new(FileStore::new(config.session_path()?));
        let api = ApiClient::from_config(&config)?;
        let identity = IdentityResolver::new(session, config.default_organization_id.clone());
        debug!(base_url = %config.base_url, "client configured");

        Ok(App {
            config,
            api,
            identity,
        })
    }

    pub fn organization(&self) -> OrganizationContext {
        self.identity.resolve(None)
    }

    pub fn wizard(&self) -> Wizard {
        EventWizard::new(
            self.api.clone(),
            self.identity.clone(),
            self.config.verify_policy(),
            TerminalNotifier,
        )
    }
}

pub fn session_store() -> Result<FileStore> {
    let config = WorknestConfig::load().context("Could not load configuration")?;
    Ok(FileStore::new(config.session_path()?))
}
