//! Snapshot storage for the single player state.

use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use chrono::NaiveDate;

use crate::data::ContentPack;
use crate::state::PlayerState;

/// Key-value store for JSON snapshots.
/// Platform-specific implementations should provide this
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the snapshot stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn read_snapshot(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Replace the snapshot stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn write_snapshot(&self, key: &str, json: &str) -> Result<(), Self::Error>;

    /// Remove the snapshot stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be modified.
    fn delete_snapshot(&self, key: &str) -> Result<(), Self::Error>;
}

/// In-process storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    saves: Rc<RefCell<HashMap<String, String>>>,
}

impl GameStorage for MemoryStorage {
    type Error = Infallible;

    fn read_snapshot(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.saves.borrow().get(key).cloned())
    }

    fn write_snapshot(&self, key: &str, json: &str) -> Result<(), Self::Error> {
        self.saves
            .borrow_mut()
            .insert(key.to_string(), json.to_string());
        Ok(())
    }

    fn delete_snapshot(&self, key: &str) -> Result<(), Self::Error> {
        self.saves.borrow_mut().remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per snapshot inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl GameStorage for FileStorage {
    type Error = io::Error;

    fn read_snapshot(&self, key: &str) -> Result<Option<String>, Self::Error> {
        match fs::read_to_string(self.path(key)) {
            Ok(json) => Ok(Some(json)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write_snapshot(&self, key: &str, json: &str) -> Result<(), Self::Error> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), json)
    }

    fn delete_snapshot(&self, key: &str) -> Result<(), Self::Error> {
        match fs::remove_file(self.path(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

/// A state recovered from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restored {
    pub state: PlayerState,
    /// No usable snapshot existed and a new game was started.
    pub fresh: bool,
}

/// Turn a stored snapshot into a playable state. Missing fields take their
/// defaults and are patched from content; an undecodable snapshot starts a
/// new game.
#[must_use]
pub fn decode_snapshot(json: Option<&str>, content: &ContentPack, today: NaiveDate) -> Restored {
    let Some(json) = json else {
        return Restored {
            state: PlayerState::new(content, today),
            fresh: true,
        };
    };
    match PlayerState::from_json(json) {
        Ok(mut state) => {
            state.patch_with(content);
            Restored {
                state,
                fresh: false,
            }
        }
        Err(err) => {
            log::warn!("discarding unreadable save: {err}");
            Restored {
                state: PlayerState::new(content, today),
                fresh: true,
            }
        }
    }
}

/// Load and decode the snapshot under `key`.
///
/// # Errors
///
/// Returns an error only if the storage itself fails; bad snapshots fall back
/// to a fresh state.
pub fn load_state<S: GameStorage>(
    storage: &S,
    key: &str,
    content: &ContentPack,
    today: NaiveDate,
) -> anyhow::Result<Restored> {
    let json = storage
        .read_snapshot(key)
        .with_context(|| format!("reading snapshot `{key}`"))?;
    Ok(decode_snapshot(json.as_deref(), content, today))
}

/// Encode and store `state` under `key`.
///
/// # Errors
///
/// Returns an error if encoding or the storage write fails.
pub fn save_state<S: GameStorage>(storage: &S, key: &str, state: &PlayerState) -> anyhow::Result<()> {
    let json = state.to_json().context("encoding player state")?;
    storage
        .write_snapshot(key, &json)
        .with_context(|| format!("writing snapshot `{key}`"))
}
