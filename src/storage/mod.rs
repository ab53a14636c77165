// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{
    collections::HashMap,
    future::Future,
    path::{Component, Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::settings::PartialSettings;

pub mod local;
pub mod webdav;

/// Default per-operation timeout in milliseconds (ms)
pub const DEFAULT_TIMEOUT: u64 = 10000;
pub const DEFAULT_RETRIES: u32 = 3;

/// Failure of a single storage operation.
///
/// Only [`Error::NotFound`] means "this does not exist";
/// everything else is an infrastructure problem
/// and has to be propagated, not taken for absence.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No such file or directory: '{0}'")]
    NotFound(PathBuf),
    #[error("Timed out after {1:?} while accessing '{0}'")]
    Timeout(PathBuf, Duration),
    #[error("I/O failure while accessing '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Request for '{0}' failed: {1}")]
    Http(PathBuf, #[source] reqwest_middleware::Error),
    #[error("Server answered with status {1} for '{0}'")]
    Status(PathBuf, reqwest::StatusCode),
    #[error("Unexpected response for '{0}': {1}")]
    InvalidResponse(PathBuf, String),
    #[error("The path '{0}' is not relative to the storage root")]
    OutsideRoot(PathBuf),
}

impl Error {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_, _))
    }

    /// Sorts an I/O error into not-found, time-out or other.
    #[must_use]
    pub fn from_io(path: &Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::TimedOut => Self::Timeout(path.to_path_buf(), Duration::ZERO),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// Thrown when creating a new [`Storage`] failed.
#[derive(Error, Debug)]
pub enum CreationError {
    #[error("Unknown storage type: '{0}'")]
    UnknownStorageType(String),
    #[error("Invalid config for storage type '{0}': {1}")]
    InvalidConfig(String, #[source] serde_json::Error),
    #[error("Invalid base URL for storage type '{0}': {1}")]
    InvalidUrl(String, #[source] url::ParseError),
    #[error("Failed to set up the HTTP client for storage type '{0}': {1}")]
    Client(String, #[source] reqwest::Error),
    #[error("Invalid HTTP header value for storage type '{0}': {1}")]
    Header(String, #[source] reqwest::header::InvalidHeaderValue),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    pub kind: EntryKind,
    /// Size in bytes; `0` for directories
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Contains descriptive data about the type of a storage backend.
pub struct TypeInfo {
    /// Machine-readable name/id of this type of storage.
    /// It should be in "kebab-case".
    pub name: &'static str,

    /// Human-readable description of this type of storage.
    pub description: &'static str,
}

/// Read-only access to the archive.
///
/// All paths are relative to the root of the archive,
/// e.g. `mvol/0004/1930/0103/TIFF`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Info about this type of storage.
    fn info(&self) -> &'static TypeInfo;

    /// Human-readable location of the archive root.
    fn root(&self) -> String;

    /// Lists the entries of a directory, in no particular order.
    async fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>, Error>;

    /// Reads the whole content of a file.
    async fn open_for_read(&self, path: &Path) -> Result<Vec<u8>, Error>;

    async fn stat(&self, path: &Path) -> Result<Metadata, Error>;

    /// Whether `path` exists; fails on anything but [`Error::NotFound`].
    async fn exists(&self, path: &Path) -> Result<bool, Error> {
        match self.stat(path).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn is_dir(&self, path: &Path) -> Result<bool, Error> {
        match self.stat(path).await {
            Ok(meta) => Ok(meta.kind == EntryKind::Directory),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Display for dyn Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-storage({})", self.info().name, self.root())
    }
}

/// Creates instances of storage backends of a specific type.
pub trait Factory {
    /// Info about the type of storage produced by this factory.
    fn info(&self) -> &'static TypeInfo;

    /// Creates a new instance of this type of storage,
    /// following the supplied configuration.
    ///
    /// # Errors
    ///
    /// - Invalid config for storage type
    /// - Failure to set up a network client
    fn create(
        &self,
        config_all: Arc<PartialSettings>,
        config_storage: Value,
    ) -> Result<Box<dyn Storage>, CreationError>;
}

#[must_use]
pub fn assemble_factories() -> HashMap<String, Box<dyn Factory>> {
    let factories: Vec<Box<dyn Factory>> = vec![
        Box::new(local::StorageFactory),
        Box::new(webdav::StorageFactory),
    ];
    factories
        .into_iter()
        .map(|f| (f.info().name.to_string(), f))
        .collect()
}

/// Makes sure a path stays below the storage root.
pub(crate) fn check_relative(path: &Path) -> Result<(), Error> {
    let escapes = path
        .components()
        .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
    if escapes {
        Err(Error::OutsideRoot(path.to_path_buf()))
    } else {
        Ok(())
    }
}

/// Runs a storage operation, failing with [`Error::Timeout`]
/// if it takes longer than `limit`.
pub(crate) async fn bounded<T, F>(path: &Path, limit: Duration, operation: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(res) => res,
        Err(_elapsed) => Err(Error::Timeout(path.to_path_buf(), limit)),
    }
}
