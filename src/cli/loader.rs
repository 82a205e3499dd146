use std::time::Duration;

use crate::error::ClientIdError;
use crate::net::CacheSettings;
use crate::policy::ClientAccess;

use super::args::Args;
use super::config::ConfigFile;

/// Everything the commands need, resolved once at startup
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub cache: CacheSettings,
    pub access: ClientAccess,
}

/// Load and merge settings from the config file and command line arguments
pub struct SettingsLoader;

impl SettingsLoader {
    /// Defaults, then the config file, then CLI overrides; validated last
    pub fn load(args: &Args) -> Result<Settings, ClientIdError> {
        let mut settings = Settings::default();

        if let Some(config_path) = args.config.as_ref() {
            let config = ConfigFile::load(config_path)?;
            settings.cache = config.to_settings();
            settings.access = config.to_access()?;
        }

        if let Some(index_size) = args.index_size {
            settings.cache.index_size = index_size;
        }
        if let Some(secs) = args.expiration_time {
            settings.cache.expiration_time = Duration::from_secs(secs);
        }
        settings
            .access
            .merge(ClientAccess::from_entries(&args.allow_client)?);

        settings.cache.validate()?;
        log::debug!(
            "Address cache: {} partitions, entries expire after {:?}",
            settings.cache.index_size,
            settings.cache.expiration_time
        );
        Ok(settings)
    }
}
