// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! File-level checks of the artifacts of one identifier,
//! and the per-collection sequence they are run in ([`aggregate`]).
//!
//! Findings are [`Problem`]s, collected into a list;
//! an empty list means "valid".
//! Only infrastructure failures become an [`Error`].

pub mod aggregate;
pub mod dc_xml;
pub mod directory;
pub mod files;
pub mod issue_path;
pub mod libxml2;
pub mod mets_xml;
pub mod ocr;
pub mod struct_txt;

use std::{
    borrow::Cow,
    fmt,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::model::identifier::Identifier;
use crate::storage::{self, Storage};

/// A hard failure while validating,
/// as opposed to a finding about the validated data.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Storage(#[from] storage::Error),
    #[error("Failed to read the METS schema file '{0}': {1}")]
    SchemaFile(PathBuf, #[source] std::io::Error),
    #[error("Failed to load the METS schema '{path}': {message}")]
    Schema { path: PathBuf, message: String },
    #[error("Failed to set up the OCR status client: {0}")]
    OcrClient(#[from] ocr::SetupError),
}

/// Which part of a date failed its range check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Year,
    Month,
    Day,
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
        })
    }
}

/// A single finding about the data of an identifier.
///
/// `path` fields hold the storage relative path of the identifier,
/// e.g. `mvol/0004/1930/0103`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    /// A misnamed (or, for ALTO, unparsable) file in a page folder
    FolderEntry {
        identifier: String,
        folder: String,
        entry: String,
    },
    MissingAltoOrPos {
        path: String,
    },
    MissingFolder {
        path: String,
        folder: String,
    },
    MissingFile {
        path: String,
        file: String,
    },
    NotWellFormed {
        path: String,
        file: String,
    },
    NotValid {
        path: String,
        file: String,
    },
    DateOutOfRange {
        path: String,
        file: String,
        field: DateField,
    },
    MalformedDate {
        path: String,
        file: String,
    },
    StructTxt {
        path: String,
        file: String,
    },
    EmptyFile {
        name: Option<String>,
    },
    NotATif {
        name: String,
    },
    NonAllowableFile {
        identifier: String,
        file: String,
    },
    /// One of the page folders (or both of ALTO and POS) is absent
    FolderMissingIn {
        identifier: String,
        folder: String,
    },
    FileCountMismatch {
        identifier: String,
    },
    SequenceFileNotFound {
        identifier: String,
        file: String,
    },
    SequenceFileNotExpected {
        identifier: String,
        file: String,
    },
    InvalidYearFolder {
        identifier: String,
    },
    InvalidMmddFolder {
        identifier: String,
    },
    OcrFailure {
        identifier: String,
    },
    OcrTimeout {
        identifier: String,
    },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FolderEntry {
                identifier,
                folder,
                entry,
            } => write!(f, "{identifier}/{folder}/{entry} problem."),
            Self::MissingAltoOrPos { path } => write!(f, "{path}/ALTO or POS missing"),
            Self::MissingFolder { path, folder } => write!(f, "{path}/{folder} missing"),
            Self::MissingFile { path, file } => write!(f, "{path}/{file} missing"),
            Self::NotWellFormed { path, file } => write!(f, "{path}/{file} not well-formed"),
            Self::NotValid { path, file } => write!(f, "{path}/{file} not valid"),
            Self::DateOutOfRange { path, file, field } => {
                write!(f, "{path}/{file} has an incorrect {field} field")
            }
            Self::MalformedDate { path, file } => {
                write!(f, "{path}/{file} has a date with a wrong format")
            }
            Self::StructTxt { path, file } => write!(f, "{path}/{file} has one or more errors"),
            Self::EmptyFile { name: Some(name) } => write!(f, "{name} is an empty file."),
            Self::EmptyFile { name: None } => f.write_str("empty file."),
            Self::NotATif { name } => write!(f, "{name} is not a tif file"),
            Self::NonAllowableFile { identifier, file } => {
                write!(f, "non-allowable file {file} in {identifier}")
            }
            Self::FolderMissingIn { identifier, folder } => {
                write!(f, "{folder} dir missing in {identifier}")
            }
            Self::FileCountMismatch { identifier } => {
                write!(f, "file count mismatch in {identifier}")
            }
            Self::SequenceFileNotFound { identifier, file } => {
                write!(f, "{identifier}/tifs/{file} not found.")
            }
            Self::SequenceFileNotExpected { identifier, file } => {
                write!(f, "{identifier}/tifs/{file} not expected.")
            }
            Self::InvalidYearFolder { identifier } => write!(
                f,
                "{identifier} is contained in a parent folder that is not a valid year."
            ),
            Self::InvalidMmddFolder { identifier } => {
                write!(f, "{identifier} is not a valid mmdd folder name.")
            }
            Self::OcrFailure { identifier } => write!(f, "{identifier} has an unknown error."),
            Self::OcrTimeout { identifier } => {
                write!(f, "{identifier} timed out during the OCR status check.")
            }
        }
    }
}

/// The bytes of a file, or an in-memory stand-in for one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawContent {
    String(String),
    Bytes(Vec<u8>),
}

impl RawContent {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::String(s) => s.as_bytes(),
            Self::Bytes(b) => b,
        }
    }

    /// The content as UTF-8 text, or `None` if it is not.
    #[must_use]
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::String(s) => Some(Cow::Borrowed(s)),
            Self::Bytes(b) => std::str::from_utf8(b).ok().map(Cow::Borrowed),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for RawContent {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for RawContent {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Vec<u8>> for RawContent {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// Where a file-level check gets its data from.
///
/// Checks usually look at [`Self::Stored`] files,
/// but all of them also accept already loaded content.
#[derive(Debug, Clone)]
pub enum Source {
    /// A storage relative file path
    Stored(PathBuf),
    Content(RawContent),
}

impl Source {
    #[must_use]
    pub fn stored(path: impl Into<PathBuf>) -> Self {
        Self::Stored(path.into())
    }

    /// The file name, if this is a stored file.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        match self {
            Self::Stored(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            Self::Content(_) => None,
        }
    }

    /// Loads the content; `None` if the stored file does not exist.
    pub async fn read(&self, storage: &dyn Storage) -> Result<Option<RawContent>, Error> {
        match self {
            Self::Stored(path) => Ok(found(storage.open_for_read(path).await)?.map(RawContent::from)),
            Self::Content(content) => Ok(Some(content.clone())),
        }
    }

    /// The size in bytes; `None` if the stored file does not exist.
    pub async fn size(&self, storage: &dyn Storage) -> Result<Option<u64>, Error> {
        match self {
            Self::Stored(path) => Ok(found(storage.stat(path).await)?.map(|meta| meta.size)),
            Self::Content(content) => Ok(Some(content.len() as u64)),
        }
    }
}

impl From<RawContent> for Source {
    fn from(value: RawContent) -> Self {
        Self::Content(value)
    }
}

/// Turns [`storage::Error::NotFound`] into `None`,
/// and every other storage failure into a hard error.
pub(crate) fn found<T>(res: Result<T, storage::Error>) -> Result<Option<T>, Error> {
    match res {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// A storage relative path as used in messages,
/// always with `/` as separator.
#[must_use]
pub fn display_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// The message path of an identifier.
#[must_use]
pub fn identifier_path(identifier: &Identifier) -> String {
    display_path(&identifier.path())
}
