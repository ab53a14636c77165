// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::{BTreeMap, BTreeSet};

use strum::IntoEnumIterator;

use super::{display_path, found, identifier_path, Error, Problem, Source};
use crate::model::{
    artifact::{ArtifactFile, Folder},
    identifier::{Identifier, ItemLocation},
};
use crate::storage::{DirEntry, Storage};

/// Checks that a file is not empty.
///
/// Returns `None` if the file does not exist.
pub async fn validate_not_empty(
    storage: &dyn Storage,
    source: &Source,
) -> Result<Option<Vec<Problem>>, Error> {
    let Some(size) = source.size(storage).await? else {
        return Ok(None);
    };
    Ok(Some(if size == 0 {
        vec![Problem::EmptyFile {
            name: source.name(),
        }]
    } else {
        vec![]
    }))
}

/// Checks that an artifact file of an item exists and is not empty,
/// e.g. the PDF.
pub async fn validate_artifact_not_empty(
    storage: &dyn Storage,
    identifier: &Identifier,
    artifact: ArtifactFile,
) -> Result<Vec<Problem>, Error> {
    let file = artifact.file_name(identifier);
    let source = Source::stored(identifier.path().join(&file));
    Ok(validate_not_empty(storage, &source)
        .await?
        .unwrap_or_else(|| {
            vec![Problem::MissingFile {
                path: identifier_path(identifier),
                file,
            }]
        }))
}

/// Lists a directory, sorted by name; empty if it does not exist.
async fn sorted_entries(
    storage: &dyn Storage,
    dir: &std::path::Path,
) -> Result<Vec<DirEntry>, Error> {
    let mut entries = found(storage.list_directory(dir).await)?.unwrap_or_default();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// The image file of a single-image item:
/// preferably one whose stem is the identifier,
/// otherwise the first one whose name contains it.
fn pick_image<'a>(identifier: &Identifier, files: &'a [DirEntry]) -> Option<&'a DirEntry> {
    let id = identifier.as_str();
    files
        .iter()
        .filter(|entry| entry.is_file())
        .find(|entry| entry.name.split('.').next() == Some(id))
        .or_else(|| {
            files
                .iter()
                .find(|entry| entry.is_file() && entry.name.contains(id))
        })
}

/// Checks that the image of a single-image item exists and is not empty.
///
/// Directory items keep it in one of their sub-folders,
/// file-shaped items are the image, inside their container folder.
pub async fn validate_item_image(
    storage: &dyn Storage,
    identifier: &Identifier,
) -> Result<Vec<Problem>, Error> {
    let image = match identifier.location() {
        ItemLocation::Directory(path) => {
            let mut image = None;
            for sub_dir in sorted_entries(storage, &path).await? {
                if !sub_dir.is_dir() {
                    continue;
                }
                let dir = path.join(&sub_dir.name);
                let files = sorted_entries(storage, &dir).await?;
                if let Some(entry) = pick_image(identifier, &files) {
                    image = Some(dir.join(&entry.name));
                    break;
                }
            }
            image
        }
        ItemLocation::File { container } => {
            let files = sorted_entries(storage, &container).await?;
            pick_image(identifier, &files).map(|entry| container.join(&entry.name))
        }
    };
    let missing = || {
        vec![Problem::MissingFile {
            path: identifier_path(identifier),
            file: format!("{identifier}.tiff"),
        }]
    };
    let Some(image) = image else {
        tracing::debug!("{identifier}: no image found");
        return Ok(missing());
    };
    tracing::trace!("{identifier}: image at '{}'", display_path(&image));
    Ok(validate_not_empty(storage, &Source::Stored(image))
        .await?
        .unwrap_or_else(missing))
}

/// Checks all the images in the `tifs/` folder of a container item
/// (`rac-DDDD`): each has to be a non-empty TIFF.
pub async fn validate_container_images(
    storage: &dyn Storage,
    identifier: &Identifier,
) -> Result<Vec<Problem>, Error> {
    let dir = identifier.path().join(Folder::Tifs.as_str());
    let Some(mut entries) = found(storage.list_directory(&dir).await)? else {
        return Ok(vec![Problem::MissingFolder {
            path: identifier_path(identifier),
            folder: Folder::Tifs.as_str().to_string(),
        }]);
    };
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    let suffix = format!(".{}", Folder::Tifs.extension());
    let mut problems = Vec::new();
    for entry in entries.iter().filter(|entry| entry.is_file()) {
        if !entry.name.ends_with(&suffix) {
            problems.push(Problem::NotATif {
                name: entry.name.clone(),
            });
        }
        let source = Source::Stored(dir.join(&entry.name));
        if let Some(empty) = validate_not_empty(storage, &source).await? {
            problems.extend(empty);
        }
    }
    Ok(problems)
}

/// Checks that an `mvol` item holds nothing but its artifacts,
/// has all page folders, and the same number of files in each of them.
pub async fn validate_allowable_files(
    storage: &dyn Storage,
    identifier: &Identifier,
) -> Result<Vec<Problem>, Error> {
    let path = identifier.path();
    let allowed: BTreeSet<String> = ArtifactFile::iter()
        .map(|artifact| artifact.file_name(identifier))
        .collect();
    let entries = sorted_entries(storage, &path).await?;

    let mut problems: Vec<Problem> = entries
        .iter()
        .filter(|entry| entry.is_file() && !allowed.contains(&entry.name))
        .map(|entry| Problem::NonAllowableFile {
            identifier: identifier.to_string(),
            file: entry.name.clone(),
        })
        .collect();

    let present: BTreeSet<&str> = entries
        .iter()
        .filter(|entry| entry.is_dir())
        .map(|entry| entry.name.as_str())
        .collect();
    let missing_in = |folder: &str| Problem::FolderMissingIn {
        identifier: identifier.to_string(),
        folder: folder.to_string(),
    };
    for folder in [Folder::Jpeg, Folder::Tiff] {
        if !present.contains(folder.as_str()) {
            problems.push(missing_in(folder.as_str()));
        }
    }
    if !present.contains(Folder::Alto.as_str()) && !present.contains(Folder::Pos.as_str()) {
        problems.push(missing_in("ALTO or POS"));
    }

    let mut counts = BTreeMap::new();
    for folder in [Folder::Alto, Folder::Pos, Folder::Jpeg, Folder::Tiff] {
        if present.contains(folder.as_str()) {
            let listing = storage.list_directory(&path.join(folder.as_str())).await?;
            counts.insert(folder.as_str(), listing.len());
        }
    }
    let distinct: BTreeSet<usize> = counts.values().copied().collect();
    if distinct.len() > 1 {
        tracing::debug!("{identifier}: page counts {counts:?}");
        problems.push(Problem::FileCountMismatch {
            identifier: identifier.to_string(),
        });
    }
    Ok(problems)
}
