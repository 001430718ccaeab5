use std::{
    env::{self, VarError},
    fs::{self, File},
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    error::Error,
    lookup::{SteamClient, SuggestionCache},
    persist::{FileStorage, Persistence, DEFAULT_BACKUP_EVERY, DEFAULT_HISTORY_LIMIT},
};

const APP_NAME: &str = "Pantheon";
const CONFIG_FILENAME: &str = "config.json";
const PROXY_ENV_VAR: &str = "HTTPS_PROXY";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overrides the platform data directory for collections.
    pub storage_dir: Option<PathBuf>,
    /// Page that share links point at.
    pub share_base_url: String,
    pub history_limit: usize,
    pub backup_every: usize,
    pub debounce_ms: u64,
    pub suggestion_cache_size: usize,
    pub suggestion_cache_ttl_secs: u64,
    pub steam_api_key: String,
    pub steam_id: String,
    /// Prefix for requests the Steam API would otherwise refuse cross-origin,
    /// e.g. `https://corsproxy.io/?`.
    pub cors_proxy: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: None,
            share_base_url: "http://localhost:8000/".into(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            backup_every: DEFAULT_BACKUP_EVERY,
            debounce_ms: 300,
            suggestion_cache_size: SuggestionCache::DEFAULT_SIZE,
            suggestion_cache_ttl_secs: SuggestionCache::DEFAULT_TTL.as_secs(),
            steam_api_key: String::new(),
            steam_id: String::new(),
            cors_proxy: None,
        }
    }
}

impl Config {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    pub fn config_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn data_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join(CONFIG_FILENAME))
    }

    /// Reads the saved config, if there is a readable one.
    pub fn load() -> Option<Config> {
        let path = Self::config_path()?;
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("failed to read config {:?}: {}", path, err);
                None
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Config>, Error> {
        if let Ok(file) = File::open(path) {
            log::info!("loading config: {:?}", path);
            Ok(Some(serde_json::from_reader(file)?))
        } else {
            Ok(None)
        }
    }

    pub fn save(&self) -> Result<(), Error> {
        let path = Self::config_path()
            .ok_or_else(|| Error::StorageError("no config directory".into()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Error> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.storage_dir.clone().or_else(Self::data_dir)
    }

    pub fn persistence(&self) -> Result<Persistence, Error> {
        let dir = self
            .storage_dir()
            .ok_or_else(|| Error::StorageError("no data directory".into()))?;
        let storage = FileStorage::new(dir)?;
        Ok(Persistence::with_limits(
            Box::new(storage),
            self.history_limit,
            self.backup_every,
        ))
    }

    pub fn share_base(&self) -> Result<Url, Error> {
        Url::parse(&self.share_base_url).map_err(|err| {
            Error::InvalidShare(format!("bad base URL {:?}: {err}", self.share_base_url))
        })
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn suggestion_cache(&self) -> SuggestionCache {
        SuggestionCache::new(
            self.suggestion_cache_size,
            Duration::from_secs(self.suggestion_cache_ttl_secs),
        )
    }

    pub fn has_steam_credentials(&self) -> bool {
        !self.steam_api_key.is_empty() && !self.steam_id.is_empty()
    }

    pub fn steam_client(&self) -> Option<SteamClient> {
        if self.has_steam_credentials() {
            Some(SteamClient::new(
                self.steam_api_key.clone(),
                self.steam_id.clone(),
                self.cors_proxy.clone(),
                self.proxy().as_deref(),
            ))
        } else {
            None
        }
    }

    pub fn proxy(&self) -> Option<String> {
        env::var(PROXY_ENV_VAR).map_or_else(
            |err| match err {
                VarError::NotPresent => None,
                VarError::NotUnicode(_) => {
                    log::error!("proxy URL is not a valid unicode");
                    None
                }
            },
            Some,
        )
    }
}
