// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use super::collection::{Collection, Layout};
use std::fmt::{self, Display};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Name of the folder that holds the image files of file-shaped series items.
pub const SERIES_IMAGES_DIR: &str = "tifs";

/// Everything up to and including this path component
/// is stripped when mapping paths back to identifiers.
pub const IIIF_ROOT_DIR: &str = "IIIF_Files";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("No known collection matches the identifier (chunk) '{0}'")]
    UnknownCollection(String),
    #[error("'{0}' is not a complete {1} identifier")]
    MalformedIdentifier(String, Collection),
    #[error("'{0}' is not a valid {1} identifier chunk")]
    MalformedChunk(String, Collection),
    #[error("The path '{0}' does not map to an identifier chunk")]
    UnmappablePath(PathBuf),
}

/// Determines the collection an identifier or identifier chunk belongs to.
pub fn project_of(value: &str) -> Result<Collection, ParseError> {
    Collection::of(value).ok_or_else(|| ParseError::UnknownCollection(value.to_string()))
}

/// Whether `value` is a complete identifier of its collection.
/// Values of no known collection are never identifiers.
#[must_use]
pub fn is_identifier(value: &str) -> bool {
    Collection::of(value).is_some_and(|collection| collection.is_identifier(value))
}

/// Whether `value` is a legal prefix of some complete identifier
/// of its collection, including the bare collection tag.
#[must_use]
pub fn is_identifier_chunk(value: &str) -> bool {
    Collection::of(value).is_some_and(|collection| collection.is_identifier_chunk(value))
}

/// The storage-root relative path of an identifier chunk.
pub fn path_of(value: &str) -> Result<PathBuf, ParseError> {
    IdentifierChunk::parse(value).map(|chunk| chunk.path())
}

/// Where the files of a complete identifier live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemLocation {
    /// The item is a directory holding its artifacts.
    Directory(PathBuf),
    /// The item is a single image file somewhere in `container`,
    /// its name containing the identifier.
    File { container: PathBuf },
}

/// A syntactically valid prefix of one or more identifiers,
/// denoting a sub-tree of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentifierChunk {
    value: String,
    collection: Collection,
}

impl IdentifierChunk {
    pub fn parse(value: &str) -> Result<Self, ParseError> {
        let collection = project_of(value)?;
        if !collection.is_identifier_chunk(value) {
            return Err(ParseError::MalformedChunk(value.to_string(), collection));
        }
        Ok(Self {
            value: value.to_string(),
            collection,
        })
    }

    /// Maps a storage path back to the identifier chunk it holds.
    /// Anything up to and including an `IIIF_Files` component is ignored.
    pub fn from_path(path: &Path) -> Result<Self, ParseError> {
        let unmappable = || ParseError::UnmappablePath(path.to_path_buf());
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(unmappable)?;
                    if part == IIIF_ROOT_DIR {
                        parts.clear();
                    } else {
                        parts.push(part);
                    }
                }
                Component::RootDir | Component::Prefix(_) => parts.clear(),
                Component::CurDir => {}
                Component::ParentDir => {
                    parts.pop();
                }
            }
        }
        let (head, tail) = parts.split_first().ok_or_else(unmappable)?;
        let collection =
            Collection::of(head).ok_or_else(|| ParseError::UnknownCollection((*head).to_string()))?;
        let value = match collection.layout() {
            Layout::RepeatedName => tail.last().unwrap_or(head).to_string(),
            Layout::Flat | Layout::Series(_) => parts.join("-"),
            Layout::FlatFiles => match tail.split_first() {
                Some((first, rest)) => {
                    let mut value = format!("{head}{first}");
                    for part in rest {
                        value.push('-');
                        value.push_str(part);
                    }
                    value
                }
                None => (*head).to_string(),
            },
        };
        Self::parse(&value)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub const fn collection(&self) -> Collection {
        self.collection
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.collection.is_identifier(&self.value)
    }

    /// The leading alphabetic part, usually the collection tag,
    /// e.g. `apf` for `apf1-00001` or `chess` for `chess-0392-001`.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.value
            .split(|chr: char| !chr.is_ascii_lowercase())
            .next()
            .unwrap_or_default()
    }

    /// The parts after the prefix,
    /// e.g. `["1", "00001"]` for `apf1-00001`.
    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        let rest = self
            .value
            .strip_prefix(self.prefix())
            .unwrap_or_default();
        rest.split('-').filter(|part| !part.is_empty()).collect()
    }

    /// The storage-root relative path of this chunk.
    ///
    /// ```
    /// # use digcoll_validator::model::identifier::IdentifierChunk;
    /// # use std::path::PathBuf;
    /// let chunk = IdentifierChunk::parse("mvol-0004-1930-0103").unwrap();
    /// assert_eq!(chunk.path(), PathBuf::from("mvol/0004/1930/0103"));
    /// let chunk = IdentifierChunk::parse("ewm-0001").unwrap();
    /// assert_eq!(chunk.path(), PathBuf::from("ewm/ewm-0001"));
    /// ```
    #[must_use]
    pub fn path(&self) -> PathBuf {
        let prefix = self.prefix();
        let segments = self.segments();
        let mut path = PathBuf::from(self.collection.as_str());
        match self.collection.layout() {
            Layout::RepeatedName => {
                let mut growing = prefix.to_string();
                for segment in segments {
                    growing.push('-');
                    growing.push_str(segment);
                    path.push(&growing);
                }
            }
            Layout::Flat | Layout::FlatFiles => path.extend(segments),
            Layout::Series(_) => match self.collection.series_folder(prefix) {
                Some(folder) => path.push(folder),
                None => path.extend(segments),
            },
        }
        path
    }

    /// This chunk without its last segment,
    /// or `None` if there is nothing left to drop.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let value = match self.value.rsplit_once('-') {
            Some((head, _)) => head.to_string(),
            None if !self.segments().is_empty() => self.prefix().to_string(),
            None => return None,
        };
        Some(Self {
            value,
            collection: self.collection,
        })
    }

    /// The chunk that a directory called `name` represents
    /// when found inside the directory of this chunk,
    /// or `None` if it is no valid extension of this chunk
    /// (e.g. an artifact folder or a stray file).
    #[must_use]
    pub fn child(&self, name: &str) -> Option<Self> {
        let candidates = match self.collection.layout() {
            Layout::RepeatedName => vec![name.to_string()],
            Layout::Flat | Layout::FlatFiles => {
                vec![format!("{}-{name}", self.value), format!("{}{name}", self.value)]
            }
            Layout::Series(_) => {
                if self.prefix() == self.collection.as_str() {
                    vec![format!("{}-{name}", self.value)]
                } else {
                    vec![]
                }
            }
        };
        candidates.into_iter().find_map(|candidate| {
            let child = Self {
                value: candidate,
                collection: self.collection,
            };
            (self.collection.is_identifier_chunk(&child.value)
                && child.parent().as_ref() == Some(self))
            .then_some(child)
        })
    }

    pub fn to_identifier(&self) -> Result<Identifier, ParseError> {
        Identifier::try_from(self.clone())
    }
}

impl FromStr for IdentifierChunk {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Display for IdentifierChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for IdentifierChunk {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// A complete identifier, naming one digitized unit,
/// e.g. `mvol-0004-1930-0103` (one newspaper issue).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(IdentifierChunk);

impl Identifier {
    pub fn parse(value: &str) -> Result<Self, ParseError> {
        Self::try_from(IdentifierChunk::parse(value)?)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub const fn as_chunk(&self) -> &IdentifierChunk {
        &self.0
    }

    #[must_use]
    pub const fn collection(&self) -> Collection {
        self.0.collection()
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.0.path()
    }

    /// Where the artifacts of this identifier are stored.
    #[must_use]
    pub fn location(&self) -> ItemLocation {
        match self.collection().layout() {
            Layout::RepeatedName | Layout::Flat => ItemLocation::Directory(self.path()),
            Layout::FlatFiles => ItemLocation::File {
                container: self
                    .0
                    .parent()
                    .map_or_else(|| self.path(), |parent| parent.path()),
            },
            Layout::Series(_) => {
                if self.0.prefix() == self.collection().as_str() {
                    ItemLocation::Directory(self.path())
                } else {
                    ItemLocation::File {
                        container: self.path().join(SERIES_IMAGES_DIR),
                    }
                }
            }
        }
    }

    /// Whether this identifier belongs to the given series,
    /// e.g. `mvol-0004` (the Daily Maroon).
    #[must_use]
    pub fn is_in_series(&self, series: &str) -> bool {
        self.as_str() == series
            || self
                .as_str()
                .strip_prefix(series)
                .is_some_and(|rest| rest.starts_with('-'))
    }
}

impl TryFrom<IdentifierChunk> for Identifier {
    type Error = ParseError;

    fn try_from(chunk: IdentifierChunk) -> Result<Self, Self::Error> {
        if chunk.is_complete() {
            Ok(Self(chunk))
        } else {
            Err(ParseError::MalformedIdentifier(
                chunk.value,
                chunk.collection,
            ))
        }
    }
}

impl FromStr for Identifier {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(value: &str) -> IdentifierChunk {
        IdentifierChunk::parse(value).unwrap()
    }

    #[test]
    fn identifier_table() {
        assert!(is_identifier("mvol-0001-0002-0003"));
        assert!(!is_identifier("mvol-0001"));
        assert!(is_identifier_chunk("mvol-0001"));
        assert!(is_identifier("chopin-001"));
        assert!(!is_identifier("chopin-0000"));
        assert!(!is_identifier("maps-0001"));
        assert!(!is_identifier_chunk("maps"));
    }

    #[test]
    fn completeness_implies_chunk_validity() {
        for value in [
            "mvol-0001-0002-0003",
            "mvol-0004-1930-0103-01",
            "apf1-00001",
            "apf1-00001-001",
            "chopin-001",
            "ewm-0001",
            "gms-0019",
            "speculum-0001",
            "rac-0392",
            "chess-0392-001",
            "rose-1380-001",
        ] {
            assert!(is_identifier(value), "{value}");
            assert!(is_identifier_chunk(value), "{value}");
        }
    }

    #[test]
    fn unknown_collection() {
        assert!(matches!(
            project_of("maps-0001"),
            Err(ParseError::UnknownCollection(_))
        ));
        assert!(matches!(
            path_of("maps-0001"),
            Err(ParseError::UnknownCollection(_))
        ));
        assert!(matches!(
            IdentifierChunk::parse("mvol-01"),
            Err(ParseError::MalformedChunk(_, Collection::Mvol))
        ));
        assert!(matches!(
            Identifier::parse("mvol-0004"),
            Err(ParseError::MalformedIdentifier(_, Collection::Mvol))
        ));
    }

    #[test]
    fn paths() {
        assert_eq!(path_of("mvol").unwrap(), PathBuf::from("mvol"));
        assert_eq!(
            path_of("mvol-0004-1930-0103").unwrap(),
            PathBuf::from("mvol/0004/1930/0103")
        );
        assert_eq!(
            path_of("mvol-0004-1930-0103-02").unwrap(),
            PathBuf::from("mvol/0004/1930/0103/02")
        );
        assert_eq!(path_of("ewm-0001").unwrap(), PathBuf::from("ewm/ewm-0001"));
        assert_eq!(
            path_of("chopin-003").unwrap(),
            PathBuf::from("chopin/chopin-003")
        );
        assert_eq!(path_of("apf1").unwrap(), PathBuf::from("apf/1"));
        assert_eq!(path_of("apf1-00001").unwrap(), PathBuf::from("apf/1/00001"));
        assert_eq!(path_of("rac-0392").unwrap(), PathBuf::from("rac/0392"));
        assert_eq!(path_of("chess-0392-001").unwrap(), PathBuf::from("rac/0392"));
        assert_eq!(path_of("rose-1380-004").unwrap(), PathBuf::from("rac/1380"));
    }

    #[test]
    fn mvol_paths_have_four_levels_below_the_root() {
        let path = path_of("mvol-0004-1930-0103").unwrap();
        let below_root: Vec<_> = path.strip_prefix("mvol").unwrap().iter().collect();
        assert_eq!(below_root, ["0004", "1930", "0103"]);
        assert_eq!(path.iter().count(), 4);
    }

    #[test]
    fn parents_and_children() {
        assert_eq!(chunk("mvol-0004").parent(), Some(chunk("mvol")));
        assert_eq!(chunk("apf1").parent(), Some(chunk("apf")));
        assert_eq!(chunk("apf1-00001").parent(), Some(chunk("apf1")));
        assert_eq!(chunk("mvol").parent(), None);
        assert_eq!(chunk("chess").parent(), None);

        assert_eq!(chunk("mvol").child("0004"), Some(chunk("mvol-0004")));
        assert_eq!(chunk("mvol-0004").child("TIFF"), None);
        assert_eq!(chunk("apf").child("1"), Some(chunk("apf1")));
        assert_eq!(chunk("apf1").child("00001"), Some(chunk("apf1-00001")));
        assert_eq!(chunk("ewm").child("ewm-0001"), Some(chunk("ewm-0001")));
        assert_eq!(chunk("ewm").child("gms-0001"), None);
        assert_eq!(chunk("ewm").child("0001"), None);
        assert_eq!(chunk("rac").child("0392"), Some(chunk("rac-0392")));
        assert_eq!(chunk("rac-0392").child("tifs"), None);
    }

    #[test]
    fn from_path() {
        assert_eq!(
            IdentifierChunk::from_path(Path::new(
                "/data/digital_collections/IIIF_Files/mvol/0004/1930/0103"
            ))
            .unwrap(),
            chunk("mvol-0004-1930-0103")
        );
        assert_eq!(
            IdentifierChunk::from_path(Path::new("ewm/ewm-0001")).unwrap(),
            chunk("ewm-0001")
        );
        assert_eq!(
            IdentifierChunk::from_path(Path::new("apf/1/00001")).unwrap(),
            chunk("apf1-00001")
        );
        assert!(IdentifierChunk::from_path(Path::new("IIIF_Files")).is_err());
        assert!(IdentifierChunk::from_path(Path::new("mvol/TIFF")).is_err());
    }

    #[test]
    fn locations() {
        assert_eq!(
            Identifier::parse("mvol-0004-1930-0103").unwrap().location(),
            ItemLocation::Directory(PathBuf::from("mvol/0004/1930/0103"))
        );
        assert_eq!(
            Identifier::parse("apf1-00001").unwrap().location(),
            ItemLocation::File {
                container: PathBuf::from("apf/1")
            }
        );
        assert_eq!(
            Identifier::parse("chess-0392-001").unwrap().location(),
            ItemLocation::File {
                container: PathBuf::from("rac/0392/tifs")
            }
        );
        assert_eq!(
            Identifier::parse("rac-0392").unwrap().location(),
            ItemLocation::Directory(PathBuf::from("rac/0392"))
        );
    }

    #[test]
    fn series_membership() {
        let id = Identifier::parse("mvol-0004-1930-0103").unwrap();
        assert!(id.is_in_series("mvol-0004"));
        assert!(!id.is_in_series("mvol-0001"));
        assert!(!id.is_in_series("mvol-000"));
    }
}
