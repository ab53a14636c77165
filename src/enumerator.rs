// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::{Path, PathBuf};

use async_stream::stream;
use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use thiserror::Error;

use crate::model::identifier::{
    Identifier, IdentifierChunk, ItemLocation, ParseError, SERIES_IMAGES_DIR,
};
use crate::storage::{self, DirEntry, Storage};

#[derive(Error, Debug)]
pub enum FindError {
    #[error(transparent)]
    Storage(#[from] storage::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// The directory in which the children of `chunk` are found.
/// Series prefixes keep their items in an image sub-folder.
fn listing_dir(chunk: &IdentifierChunk) -> PathBuf {
    let path = chunk.path();
    if chunk.collection().series_folder(chunk.prefix()).is_some() {
        path.join(SERIES_IMAGES_DIR)
    } else {
        path
    }
}

fn descends_from(chunk: &IdentifierChunk, ancestor: &IdentifierChunk) -> bool {
    let mut current = Some(chunk.clone());
    while let Some(cur) = current {
        if &cur == ancestor {
            return true;
        }
        current = cur.parent();
    }
    false
}

/// The file name up to its first `.`
fn stem(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or_default()
}

/// The identifier stored as the file `entry` in `dir`,
/// if it is one of the file-shaped items below `chunk`.
fn file_item(chunk: &IdentifierChunk, dir: &Path, entry: &DirEntry) -> Option<Identifier> {
    if !entry.is_file() {
        return None;
    }
    let identifier = Identifier::parse(stem(&entry.name)).ok()?;
    let stored_here = identifier.location()
        == ItemLocation::File {
            container: dir.to_path_buf(),
        };
    (stored_here
        && identifier.collection() == chunk.collection()
        && descends_from(identifier.as_chunk(), chunk))
    .then_some(identifier)
}

/// Looks one level below an incomplete chunk,
/// returning the sub-chunks to descend into
/// and the file-shaped identifiers found on the way.
async fn expand(
    storage: &dyn Storage,
    chunk: &IdentifierChunk,
) -> Result<(Vec<IdentifierChunk>, Vec<Identifier>), FindError> {
    let dir = listing_dir(chunk);
    tracing::trace!("expand - dir: '{}' ...", dir.display());
    let mut sub_chunks = Vec::new();
    let mut items = Vec::new();
    for entry in storage.list_directory(&dir).await? {
        if entry.is_dir() {
            if let Some(child) = chunk.child(&entry.name) {
                sub_chunks.push(child);
                continue;
            }
        } else if let Some(identifier) = file_item(chunk, &dir, &entry) {
            items.push(identifier);
            continue;
        }
        tracing::trace!("expand - ignoring '{}'", entry.name);
    }
    Ok((sub_chunks, items))
}

/// Lists the names below an identifier chunk.
///
/// For an incomplete chunk, these are the identifier chunks
/// (or file-shaped identifiers) one level further down;
/// for a complete identifier, the names of its artifacts.
/// The result is sorted.
pub async fn list_directory(
    storage: &dyn Storage,
    chunk: &IdentifierChunk,
) -> Result<Vec<String>, FindError> {
    let mut names: Vec<String> = if chunk.is_complete() {
        let identifier = chunk.to_identifier()?;
        match identifier.location() {
            ItemLocation::Directory(path) => storage
                .list_directory(&path)
                .await?
                .into_iter()
                .map(|entry| entry.name)
                .collect(),
            ItemLocation::File { container } => storage
                .list_directory(&container)
                .await?
                .into_iter()
                .filter(|entry| entry.is_file() && stem(&entry.name) == identifier.as_str())
                .map(|entry| entry.name)
                .collect(),
        }
    } else {
        let (sub_chunks, items) = expand(storage, chunk).await?;
        sub_chunks
            .iter()
            .map(ToString::to_string)
            .chain(items.iter().map(ToString::to_string))
            .collect()
    };
    names.sort();
    names.dedup();
    Ok(names)
}

/// Walks the storage below `chunk`,
/// producing every complete identifier found, in no particular order.
///
/// Only directories extending the current chunk into a valid chunk
/// are descended into; a complete identifier is produced as-is,
/// without looking further down.
/// The stream ends after the first error.
pub fn walk(
    storage: &dyn Storage,
    chunk: IdentifierChunk,
) -> BoxStream<'_, Result<Identifier, FindError>> {
    stream! {
        let mut chunks = vec![chunk];
        while let Some(chunk) = chunks.pop() {
            if chunk.is_complete() {
                yield chunk.to_identifier().map_err(FindError::from);
                continue;
            }
            match expand(storage, &chunk).await {
                Ok((sub_chunks, items)) => {
                    chunks.extend(sub_chunks);
                    for item in items {
                        yield Ok(item);
                    }
                }
                Err(err) => {
                    yield Err(err);
                    return;
                }
            }
        }
    }
    .boxed()
}

/// All complete identifiers at or below `chunk`, sorted and unique.
pub async fn recursive_ls(
    storage: &dyn Storage,
    chunk: &IdentifierChunk,
) -> Result<Vec<Identifier>, FindError> {
    let mut identifiers: Vec<Identifier> = walk(storage, chunk.clone()).try_collect().await?;
    identifiers.sort();
    identifiers.dedup();
    tracing::debug!("recursive_ls - '{chunk}': {} identifiers", identifiers.len());
    Ok(identifiers)
}

/// The newest modification time of any file belonging to `identifier`,
/// or `None` if there are no files (or the storage reports no times).
/// Items that are not there at all have no files.
pub async fn newest_modification_time(
    storage: &dyn Storage,
    identifier: &Identifier,
) -> Result<Option<DateTime<Utc>>, FindError> {
    let mut newest: Option<DateTime<Utc>> = None;
    let mut consider = |modified: Option<DateTime<Utc>>| {
        if modified > newest {
            newest = modified;
        }
    };
    match identifier.location() {
        ItemLocation::Directory(path) => {
            let mut dirs = vec![path];
            while let Some(dir) = dirs.pop() {
                let entries = match storage.list_directory(&dir).await {
                    Ok(entries) => entries,
                    Err(err) if err.is_not_found() => continue,
                    Err(err) => return Err(err.into()),
                };
                for entry in entries {
                    let entry_path = dir.join(&entry.name);
                    if entry.is_dir() {
                        dirs.push(entry_path);
                    } else if entry.is_file() {
                        consider(storage.stat(&entry_path).await?.modified);
                    }
                }
            }
        }
        ItemLocation::File { container } => {
            let entries = match storage.list_directory(&container).await {
                Ok(entries) => entries,
                Err(err) if err.is_not_found() => vec![],
                Err(err) => return Err(err.into()),
            };
            for entry in entries {
                if entry.is_file() && stem(&entry.name) == identifier.as_str() {
                    consider(storage.stat(&container.join(&entry.name)).await?.modified);
                }
            }
        }
    }
    Ok(newest)
}
