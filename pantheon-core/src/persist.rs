use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{
    enforce,
    error::Error,
    item::{ContentKind, Item},
    seed,
    util::unix_timestamp,
};

/// String key/value store the collections are saved into.
pub trait Storage: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> Result<(), Error>;
    fn remove(&self, key: &str) -> Result<(), Error>;
}

/// One file per key inside `base`.
pub struct FileStorage {
    base: PathBuf,
}

impl FileStorage {
    pub fn new(base: PathBuf) -> Result<Self, Error> {
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)).ok()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Error> {
        // Keys are replaced atomically.
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        match fs::remove_file(self.path(key)) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Error> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: i64,
    pub items: Vec<Item>,
}

pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const DEFAULT_BACKUP_EVERY: usize = 5;

/// Where a loaded collection came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadSource {
    Primary,
    Backup,
    Seed,
}

pub struct Persistence {
    storage: Box<dyn Storage>,
    history_limit: usize,
    backup_every: usize,
    saves: HashMap<ContentKind, usize>,
}

impl Persistence {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self::with_limits(storage, DEFAULT_HISTORY_LIMIT, DEFAULT_BACKUP_EVERY)
    }

    pub fn with_limits(
        storage: Box<dyn Storage>,
        history_limit: usize,
        backup_every: usize,
    ) -> Self {
        Self {
            storage,
            history_limit,
            backup_every: backup_every.max(1),
            saves: HashMap::new(),
        }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Loads the collection of `kind`, falling back from the primary key to the
    /// backup and finally to the built-in seed.
    pub fn load(&self, kind: ContentKind) -> (Vec<Item>, LoadSource) {
        if let Some(items) = self.read_items(&primary_key(kind), kind) {
            return (items, LoadSource::Primary);
        }
        if let Some(items) = self.read_items(&backup_key(kind), kind) {
            log::warn!("restored {} from backup", kind.slug());
            return (items, LoadSource::Backup);
        }
        log::info!("no saved {}, using defaults", kind.slug());
        (seed::default_collection(kind), LoadSource::Seed)
    }

    fn read_items(&self, key: &str, kind: ContentKind) -> Option<Vec<Item>> {
        let json = self.storage.read(key)?;
        match parse_items(&json, kind) {
            Ok(items) => Some(items),
            Err(err) => {
                log::warn!("failed to parse {key}: {err}");
                None
            }
        }
    }

    pub fn save(&mut self, kind: ContentKind, items: &[Item]) -> Result<(), Error> {
        let json = serde_json::to_string(items)?;
        self.storage.write(&primary_key(kind), &json)?;
        self.push_history(kind, items)?;

        let saves = self.saves.entry(kind).or_insert(0);
        *saves += 1;
        if *saves % self.backup_every == 0 || self.storage.read(&backup_key(kind)).is_none() {
            log::debug!("writing backup of {}", kind.slug());
            self.storage.write(&backup_key(kind), &json)?;
        }
        Ok(())
    }

    fn push_history(&self, kind: ContentKind, items: &[Item]) -> Result<(), Error> {
        if self.history_limit == 0 {
            return Ok(());
        }
        let mut history = self.history(kind);
        history.push(Snapshot {
            timestamp: unix_timestamp(),
            items: items.to_vec(),
        });
        let excess = history.len().saturating_sub(self.history_limit);
        history.drain(..excess);
        self.storage
            .write(&history_key(kind), &serde_json::to_string(&history)?)
    }

    /// Saved snapshots of `kind`, oldest first.
    pub fn history(&self, kind: ContentKind) -> Vec<Snapshot> {
        self.storage
            .read(&history_key(kind))
            .and_then(|json| match serde_json::from_str(&json) {
                Ok(history) => Some(history),
                Err(err) => {
                    log::warn!("discarding unreadable history: {err}");
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Drops everything saved for `kind`, so the next load yields the seed.
    pub fn reset(&mut self, kind: ContentKind) -> Result<(), Error> {
        self.storage.remove(&primary_key(kind))?;
        self.storage.remove(&backup_key(kind))?;
        self.storage.remove(&history_key(kind))?;
        self.saves.remove(&kind);
        Ok(())
    }
}

fn parse_items(json: &str, kind: ContentKind) -> Result<Vec<Item>, Error> {
    let items: Vec<Item> = serde_json::from_str(json)?;
    if let Some(other) = items.iter().find(|item| item.kind() != kind) {
        return Err(Error::StorageError(format!(
            "{} stored among {}",
            other.kind().slug(),
            kind.slug()
        )));
    }
    Ok(items.into_iter().map(enforce::sanitize).collect())
}

fn primary_key(kind: ContentKind) -> String {
    format!("pantheon-{}", kind.slug())
}

fn backup_key(kind: ContentKind) -> String {
    format!("pantheon-{}-backup", kind.slug())
}

fn history_key(kind: ContentKind) -> String {
    format!("pantheon-{}-history", kind.slug())
}
