use std::path::Path;

use chrono::Local;

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::fritzbox::FritzBoxClient;
use crate::model::PipelineWarning;

pub struct CLIContext {
    pub config: SyncConfig,
}

impl CLIContext {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    pub fn load(config_path: &Path) -> SyncResult<Self> {
        Ok(Self::new(SyncConfig::load(config_path)?))
    }

    /// Router client for the configured box. Fails without a session id.
    pub fn router(&self) -> SyncResult<FritzBoxClient> {
        let sid = self.config.session_id()?;
        Ok(FritzBoxClient::new(&self.config.fritzbox.url, sid))
    }

    pub fn confirmation(&self) -> &str {
        self.config.fritzbox.confirmation()
    }

    /// File name for keeping a rejected phonebook around for manual review.
    pub fn rejected_file_name() -> String {
        format!("phonebook-{}.xml", Local::now().format("%Y%m%d-%H%M%S"))
    }

    pub fn print_warnings(&self, warnings: &[PipelineWarning]) {
        for w in warnings {
            println!("Warning: {}", w);
        }
    }
}
