// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON file state store for host builds.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

use super::PersistentStateStore;

/// A [`PersistentStateStore`] persisted as a flat JSON object.
///
/// The whole map is rewritten on every `put` through a temporary file and a
/// rename, so a crash mid-write leaves the previous document intact. A failed
/// write keeps the value in memory; the next `put` writes it again.
///
/// # Examples
///
/// ```no_run
/// use ledlink::port::{JsonFileStore, PersistentStateStore};
///
/// let mut store = JsonFileStore::open("/var/lib/ledlink/state.json")?;
/// store.put("ledState", 1)?;
/// # Ok::<(), ledlink::error::StoreError>(())
/// ```
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, u32>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), keys = values.len(), "Opened state store");
        Ok(Self { path, values })
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&self.values)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PersistentStateStore for JsonFileStore {
    fn get(&self, key: &str, default: u32) -> Result<u32, StoreError> {
        Ok(self.values.get(key).copied().unwrap_or(default))
    }

    fn put(&mut self, key: &str, value: u32) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        self.write()
    }
}
