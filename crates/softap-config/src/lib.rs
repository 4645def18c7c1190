//! File-backed persisted default configuration for a single SoftAP
//! instance.
//!
//! Layers a TOML file over built-in defaults and `SOFTAP_`-prefixed
//! environment variables with `figment`, collapsed from multi-profile
//! credential resolution down to one configuration struct, since a SoftAP
//! has no accounts to authenticate.

mod error;
mod mac;

pub use error::ConfigStoreError;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use tracing::{debug, warn};

use softap_core::{ApConfiguration, Band, BandMask, ConfigStore, SecurityMode};

/// Resolves the canonical config file path via XDG / platform conventions.
pub fn default_config_path() -> PathBuf {
    ProjectDirs::from("dev", "softap", "softap-manager")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("softap-config.toml"))
}

fn built_in_defaults() -> ApConfiguration {
    ApConfiguration {
        ssid: String::new(),
        bssid: None,
        bssid_was_randomized: false,
        bands: BandMask::single(Band::Ghz2_4),
        security: SecurityMode::WpaPersonal,
        hidden: false,
        blocked_macs: BTreeSet::new(),
        allowed_macs: BTreeSet::new(),
        client_control_enabled: false,
        max_clients: 0,
        shutdown_timeout_ms: 0,
        auto_shutdown_enabled: true,
        bridged_opportunistic_shutdown_enabled: false,
    }
}

/// A [`ConfigStore`] backed by a TOML file on disk, merged with
/// `SOFTAP_`-prefixed environment overrides.
///
/// 
/// core crate; this is one concrete, file-backed implementation meant for
/// `softap-cli` and similar standalone integrators.
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Uses the platform-conventional config path.
    pub fn new() -> Self {
        Self { path: default_config_path() }
    }

    /// Points the store at an explicit file, bypassing platform path
    /// resolution — used by tests and callers that manage their own
    /// config location.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn figment(&self) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(built_in_defaults()))
            .merge(Toml::file(&self.path))
            .merge(Env::prefixed("SOFTAP_").split("_"))
    }

    /// Loads the merged configuration. Falls back to built-in defaults on
    /// any parse/merge error rather than failing the caller — `defaultConfig`
    /// must always return something usable.
    pub fn load(&self) -> ApConfiguration {
        match self.figment().extract() {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, path = %self.path.display(), "falling back to built-in default configuration");
                built_in_defaults()
            }
        }
    }

    /// Serializes `config` to TOML and writes it to the store's path,
    /// creating parent directories as needed.
    pub fn save(&self, config: &ApConfiguration) -> Result<(), ConfigStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| ConfigStoreError::Io { path: parent.to_path_buf(), source })?;
        }
        let toml_str = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, toml_str)
            .map_err(|source| ConfigStoreError::Io { path: self.path.clone(), source })?;
        debug!(path = %self.path.display(), "wrote configuration");
        Ok(())
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn default_config(&self) -> ApConfiguration {
        self.load()
    }

    /// Fills in a randomized BSSID when the stored config leaves it unset,
    /// and records that it did so.
    fn randomize_bssid_if_unset(&self, mut config: ApConfiguration) -> ApConfiguration {
        if config.bssid.is_none() {
            config.bssid = Some(mac::random_locally_administered());
            config.bssid_was_randomized = true;
        }
        config
    }
}
