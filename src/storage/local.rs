// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use super::{
    bounded, check_relative, CreationError, DirEntry, EntryKind, Error, Factory as IStorageFactory,
    Metadata, Storage as IStorage, TypeInfo, DEFAULT_TIMEOUT,
};
use crate::settings::PartialSettings;
use async_std::fs;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use std::{
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
    time::Duration,
};

pub static STORAGE_TYPE: LazyLock<TypeInfo> = LazyLock::new(|| TypeInfo {
    name: "local",
    description: "Reads the archive from a directory on a local (or mounted) filesystem.",
});

#[derive(Deserialize, Debug)]
pub struct Config {
    /// The directory containing the collection folders
    /// (`mvol`, `ewm`, ...).
    root: PathBuf,
    /// Timeout per operation in milliseconds (ms)
    timeout: Option<u64>,
}

pub struct StorageFactory;

impl IStorageFactory for StorageFactory {
    fn info(&self) -> &'static TypeInfo {
        &STORAGE_TYPE
    }

    fn create(
        &self,
        _config_all: Arc<PartialSettings>,
        config_storage: Value,
    ) -> Result<Box<dyn IStorage>, CreationError> {
        let config: Config = serde_json::from_value(config_storage)
            .map_err(|err| CreationError::InvalidConfig(STORAGE_TYPE.name.to_string(), err))?;
        Ok(Box::new(
            Storage::new(config.root)
                .with_timeout(Duration::from_millis(config.timeout.unwrap_or(DEFAULT_TIMEOUT))),
        ))
    }
}

/// The archive as a plain directory tree.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    timeout: Duration,
}

impl Storage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT),
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf, Error> {
        check_relative(path)?;
        Ok(self.root.join(path))
    }

    async fn list_unbounded(&self, path: &Path) -> Result<Vec<DirEntry>, Error> {
        let full = self.resolve(path)?;
        let mut entries = fs::read_dir(&full)
            .await
            .map_err(|err| Error::from_io(path, err))?;
        let mut listing = Vec::new();
        while let Some(entry) = entries.next().await {
            let entry = entry.map_err(|err| Error::from_io(path, err))?;
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!(
                    "Skipping non UTF-8 entry '{}' in '{}'",
                    entry.path().display(),
                    path.display()
                );
                continue;
            };
            let file_type = entry
                .file_type()
                .await
                .map_err(|err| Error::from_io(&path.join(&name), err))?;
            listing.push(DirEntry {
                name,
                kind: kind_of(file_type),
            });
        }
        Ok(listing)
    }

    async fn read_unbounded(&self, path: &Path) -> Result<Vec<u8>, Error> {
        let full = self.resolve(path)?;
        fs::read(&full).await.map_err(|err| Error::from_io(path, err))
    }

    async fn stat_unbounded(&self, path: &Path) -> Result<Metadata, Error> {
        let full = self.resolve(path)?;
        let meta = fs::metadata(&full)
            .await
            .map_err(|err| Error::from_io(path, err))?;
        let kind = kind_of(meta.file_type());
        Ok(Metadata {
            kind,
            size: if kind == EntryKind::File { meta.len() } else { 0 },
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}

fn kind_of(file_type: std::fs::FileType) -> EntryKind {
    if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}

#[async_trait]
impl IStorage for Storage {
    fn info(&self) -> &'static TypeInfo {
        &STORAGE_TYPE
    }

    fn root(&self) -> String {
        self.root.display().to_string()
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>, Error> {
        tracing::trace!("list_directory - '{}' ...", path.display());
        bounded(path, self.timeout, self.list_unbounded(path)).await
    }

    async fn open_for_read(&self, path: &Path) -> Result<Vec<u8>, Error> {
        tracing::trace!("open_for_read - '{}' ...", path.display());
        bounded(path, self.timeout, self.read_unbounded(path)).await
    }

    async fn stat(&self, path: &Path) -> Result<Metadata, Error> {
        bounded(path, self.timeout, self.stat_unbounded(path)).await
    }
}
