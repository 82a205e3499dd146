use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::ClientIdError,
    net::settings::{CacheSettings, DEFAULT_EXPIRATION_SECS, DEFAULT_INDEX_SIZE},
    policy::ClientAccess,
};

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ConfigFile {
    #[serde(default, alias = "NFS_IP_Name")]
    pub ip_name: IpNameConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Address cache parameters as written in the file
#[derive(Debug, Deserialize, Serialize)]
pub struct IpNameConfig {
    /// Number of hash partitions; must be prime
    #[serde(default = "default_index_size", alias = "Index_Size")]
    pub index_size: usize,
    /// Entry lifetime in seconds
    #[serde(default = "default_expiration_time", alias = "Expiration_Time")]
    pub expiration_time: u64,
    /// Background sweep period in seconds; absent disables the sweep
    #[serde(default, alias = "Reap_Interval")]
    pub reap_interval: Option<u64>,
}

impl Default for IpNameConfig {
    fn default() -> Self {
        Self {
            index_size: default_index_size(),
            expiration_time: default_expiration_time(),
            reap_interval: None,
        }
    }
}

fn default_index_size() -> usize {
    DEFAULT_INDEX_SIZE
}

fn default_expiration_time() -> u64 {
    DEFAULT_EXPIRATION_SECS
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ExportConfig {
    /// Client networks allowed to use the export
    #[serde(default, alias = "Clients")]
    pub clients: Vec<String>,
}

impl ConfigFile {
    /// Load configuration file
    pub fn load(path: &Path) -> Result<Self, ClientIdError> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| ClientIdError::ConfigParse {
            path: PathBuf::from(path),
            source,
        })
    }

    /// Cache settings from the file, not yet validated
    pub fn to_settings(&self) -> CacheSettings {
        CacheSettings {
            index_size: self.ip_name.index_size,
            expiration_time: Duration::from_secs(self.ip_name.expiration_time),
            reap_interval: self.ip_name.reap_interval.map(Duration::from_secs),
        }
    }

    /// Build the export client list from configuration file
    pub fn to_access(&self) -> Result<ClientAccess, ClientIdError> {
        ClientAccess::from_entries(&self.export.clients)
    }
}
