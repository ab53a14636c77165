// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Page folders: the naming of the page files in `ALTO/`, `POS/`, `JPEG/`
//! and `TIFF/` of `mvol` items, and the page sequence in `tifs/`
//! of `chopin` and `gms` items.

use std::collections::BTreeSet;

use roxmltree::Document;

use super::{found, identifier_path, Error, Problem, RawContent};
use crate::model::{artifact::Folder, identifier::Identifier};
use crate::storage::Storage;

/// Digits of the page number in `mvol` page file names
pub const MVOL_PAGE_DIGITS: usize = 4;
/// Digits of the page number in `tifs/` file names
pub const SEQUENCE_DIGITS: usize = 3;

/// The page number of a file called
/// `{identifier}{separator}{page number}.{extension}`,
/// the page number having exactly `digits` digits.
///
/// ```
/// # use digcoll_validator::validators::directory::page_number;
/// assert_eq!(page_number("mvol-0004-1930-0103_0002.jpg", "mvol-0004-1930-0103", '_', 4, "jpg"), Some(2));
/// assert_eq!(page_number("mvol-0004-1930-0103_02.jpg", "mvol-0004-1930-0103", '_', 4, "jpg"), None);
/// assert_eq!(page_number("chopin-001-012.tif", "chopin-001", '-', 3, "tif"), Some(12));
/// ```
#[must_use]
pub fn page_number(
    name: &str,
    identifier: &str,
    separator: char,
    digits: usize,
    extension: &str,
) -> Option<u32> {
    let rest = name.strip_prefix(identifier)?.strip_prefix(separator)?;
    let (number, ext) = rest.split_once('.')?;
    if ext != extension || number.len() != digits || !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    number.parse().ok()
}

fn is_well_formed_xml(content: &RawContent) -> bool {
    content
        .as_text()
        .is_some_and(|text| Document::parse(&text).is_ok())
}

/// Checks the files of one page folder of an `mvol` item.
///
/// Only files with the extension of the folder are looked at;
/// they have to be called `{id}_{NNNN}.{ext}`,
/// and in the ALTO folder they also have to be well-formed XML.
///
/// Returns `None` if the folder does not exist.
pub async fn validate_folder(
    storage: &dyn Storage,
    identifier: &Identifier,
    folder: Folder,
) -> Result<Option<Vec<Problem>>, Error> {
    let dir = identifier.path().join(folder.as_str());
    if !storage.is_dir(&dir).await? {
        tracing::debug!("{identifier}: no {folder} folder");
        return Ok(None);
    }
    let extension = folder.extension();
    let mut entries: Vec<String> = storage
        .list_directory(&dir)
        .await?
        .into_iter()
        .map(|entry| entry.name)
        .filter(|name| name.ends_with(extension))
        .collect();
    entries.sort();

    let mut problems = Vec::new();
    for entry in entries {
        let named_right = page_number(
            &entry,
            identifier.as_str(),
            '_',
            MVOL_PAGE_DIGITS,
            extension,
        )
        .is_some();
        let fine = if !named_right {
            false
        } else if folder == Folder::Alto {
            found(storage.open_for_read(&dir.join(&entry)).await)?
                .is_some_and(|bytes| is_well_formed_xml(&RawContent::from(bytes)))
        } else {
            true
        };
        if !fine {
            problems.push(Problem::FolderEntry {
                identifier: identifier.to_string(),
                folder: folder.as_str().to_string(),
                entry,
            });
        }
    }
    Ok(Some(problems))
}

/// The ALTO folder, or if there is none, the POS folder.
pub async fn validate_alto_or_pos(
    storage: &dyn Storage,
    identifier: &Identifier,
) -> Result<Vec<Problem>, Error> {
    if let Some(problems) = validate_folder(storage, identifier, Folder::Alto).await? {
        return Ok(problems);
    }
    if let Some(problems) = validate_folder(storage, identifier, Folder::Pos).await? {
        return Ok(problems);
    }
    Ok(vec![Problem::MissingAltoOrPos {
        path: identifier_path(identifier),
    }])
}

/// A page folder that has to exist (JPEG or TIFF).
pub async fn validate_required_folder(
    storage: &dyn Storage,
    identifier: &Identifier,
    folder: Folder,
) -> Result<Vec<Problem>, Error> {
    Ok(validate_folder(storage, identifier, folder)
        .await?
        .unwrap_or_else(|| {
            vec![Problem::MissingFolder {
                path: identifier_path(identifier),
                folder: folder.as_str().to_string(),
            }]
        }))
}

/// Compares the files present in a `tifs/` folder
/// with the complete sequence `{id}-001.tif` up to the highest page number present.
///
/// Missing files are reported first, then unexpected ones, each sorted.
#[must_use]
pub fn sequence_diff(identifier: &str, existing: &BTreeSet<String>) -> Vec<Problem> {
    let extension = Folder::Tifs.extension();
    let highest = existing
        .iter()
        .filter_map(|name| page_number(name, identifier, '-', SEQUENCE_DIGITS, extension))
        .max()
        .unwrap_or(0);
    let expected: BTreeSet<String> = (1..=highest)
        .map(|page| format!("{identifier}-{page:03}.{extension}"))
        .collect();

    let missing = expected
        .difference(existing)
        .map(|file| Problem::SequenceFileNotFound {
            identifier: identifier.to_string(),
            file: file.clone(),
        });
    let unexpected = existing
        .difference(&expected)
        .map(|file| Problem::SequenceFileNotExpected {
            identifier: identifier.to_string(),
            file: file.clone(),
        });
    missing.chain(unexpected).collect()
}

/// Checks the `tifs/` folder of a `chopin` or `gms` item.
pub async fn validate_sequence(
    storage: &dyn Storage,
    identifier: &Identifier,
) -> Result<Vec<Problem>, Error> {
    let dir = identifier.path().join(Folder::Tifs.as_str());
    let Some(entries) = found(storage.list_directory(&dir).await)? else {
        return Ok(vec![Problem::MissingFolder {
            path: identifier_path(identifier),
            folder: Folder::Tifs.as_str().to_string(),
        }]);
    };
    let existing: BTreeSet<String> = entries.into_iter().map(|entry| entry.name).collect();
    Ok(sequence_diff(identifier.as_str(), &existing))
}
