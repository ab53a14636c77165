// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::sync::LazyLock;
use strum::{EnumIter, IntoEnumIterator};

/// One of the digitization projects kept in the archive.
///
/// The collection decides both the identifier grammar
/// and the directory layout on disk.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Apf,
    Chopin,
    Ewm,
    Gms,
    Mvol,
    Rac,
    Speculum,
}

/// How the path segments of an identifier chunk map to directories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Every level repeats the growing identifier,
    /// e.g. `ewm/ewm-0001`.
    RepeatedName,
    /// Every level is just the plain segment,
    /// e.g. `mvol/0004/1930/0103`.
    /// Complete identifiers are directories.
    Flat,
    /// Like [`Self::Flat`], but complete identifiers are single image files
    /// stored in the folder of their parent chunk,
    /// e.g. `apf1-00001` is `apf/1/apf1-00001.tif`.
    FlatFiles,
    /// `rac`: plain segments below `rac`,
    /// plus series prefixes living in fixed folders,
    /// their items being image files in the `tifs` sub-folder.
    Series(&'static [SeriesFolder]),
}

/// A series stored under a fixed folder of its collection,
/// independent of the numeric segments of its identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeriesFolder {
    pub prefix: &'static str,
    pub folder: &'static str,
}

// NOTE Not derivable from the identifiers; confirm with the collection owners
//      before adding series here.
pub const RAC_SERIES: &[SeriesFolder] = &[
    SeriesFolder {
        prefix: "chess",
        folder: "0392",
    },
    SeriesFolder {
        prefix: "rose",
        folder: "1380",
    },
];

/// The table entry of a collection:
/// its grammars for complete identifiers and for identifier chunks,
/// and its directory layout.
#[derive(Debug)]
pub struct CollectionRule {
    pub collection: Collection,
    identifier: Regex,
    chunk: Regex,
    pub layout: Layout,
}

impl CollectionRule {
    fn new(collection: Collection, identifier: &str, chunk: &str, layout: Layout) -> Self {
        Self {
            collection,
            identifier: Regex::new(identifier)
                .unwrap_or_else(|err| panic!("bad identifier regex for {collection}: {err}")),
            chunk: Regex::new(chunk)
                .unwrap_or_else(|err| panic!("bad chunk regex for {collection}: {err}")),
            layout,
        }
    }

    #[must_use]
    pub fn is_identifier(&self, value: &str) -> bool {
        self.identifier.is_match(value)
    }

    #[must_use]
    pub fn is_identifier_chunk(&self, value: &str) -> bool {
        self.chunk.is_match(value)
    }
}

/// Indexed in the order of [`Collection::iter`].
static RULES: LazyLock<Vec<CollectionRule>> = LazyLock::new(|| {
    Collection::iter()
        .map(|collection| match collection {
            Collection::Apf => CollectionRule::new(
                collection,
                r"^apf[0-9]-[0-9]{5}(-[0-9]{3})?$",
                r"^apf([0-9](-[0-9]{5}(-[0-9]{3})?)?)?$",
                Layout::FlatFiles,
            ),
            Collection::Chopin => CollectionRule::new(
                collection,
                r"^chopin-[0-9]{3}$",
                r"^chopin(-[0-9]{3})?$",
                Layout::RepeatedName,
            ),
            Collection::Ewm => CollectionRule::new(
                collection,
                r"^ewm-[0-9]{4}$",
                r"^ewm(-[0-9]{4})?$",
                Layout::RepeatedName,
            ),
            Collection::Gms => CollectionRule::new(
                collection,
                r"^gms-[0-9]{4}$",
                r"^gms(-[0-9]{4})?$",
                Layout::RepeatedName,
            ),
            Collection::Mvol => CollectionRule::new(
                collection,
                r"^mvol-[0-9]{4}-[0-9]{4}-[0-9A-Z]{4}(-[0-9]{2})?$",
                r"^mvol(-[0-9]{4}(-[0-9]{4}(-[0-9A-Z]{4}(-[0-9]{2})?)?)?)?$",
                Layout::Flat,
            ),
            Collection::Rac => CollectionRule::new(
                collection,
                r"^(rac-[0-9]{4}|chess-[0-9]{4}-[0-9]{3}|rose-[0-9]{4}-[0-9]{3})$",
                r"^(rac(-[0-9]{4})?|chess(-[0-9]{4}(-[0-9]{3})?)?|rose(-[0-9]{4}(-[0-9]{3})?)?)$",
                Layout::Series(RAC_SERIES),
            ),
            Collection::Speculum => CollectionRule::new(
                collection,
                r"^speculum-[0-9]{4}$",
                r"^speculum(-[0-9]{4})?$",
                Layout::RepeatedName,
            ),
        })
        .collect()
});

impl Collection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Apf => "apf",
            Self::Chopin => "chopin",
            Self::Ewm => "ewm",
            Self::Gms => "gms",
            Self::Mvol => "mvol",
            Self::Rac => "rac",
            Self::Speculum => "speculum",
        }
    }

    /// Determines the collection of an identifier or identifier chunk
    /// by its textual prefix.
    ///
    /// `mvol`, `ewm`, `gms` and `speculum` have to match
    /// the whole part before the first dash;
    /// `apf` and `chopin` only need to appear somewhere;
    /// `rac` is recognized by any of `rac`, `chess` or `rose`.
    ///
    /// ```
    /// # use digcoll_validator::model::collection::Collection;
    /// assert_eq!(Collection::of("mvol-0004-1930-0103"), Some(Collection::Mvol));
    /// assert_eq!(Collection::of("apf1-00001"), Some(Collection::Apf));
    /// assert_eq!(Collection::of("chess-0392-001"), Some(Collection::Rac));
    /// assert_eq!(Collection::of("maps-0001"), None);
    /// ```
    #[must_use]
    pub fn of(value: &str) -> Option<Self> {
        let head = value.split('-').next().unwrap_or_default();
        match head {
            "ewm" => return Some(Self::Ewm),
            "gms" => return Some(Self::Gms),
            "mvol" => return Some(Self::Mvol),
            "speculum" => return Some(Self::Speculum),
            _ => {}
        }
        if value.contains("apf") {
            Some(Self::Apf)
        } else if value.contains("chopin") {
            Some(Self::Chopin)
        } else if ["rac", "chess", "rose"]
            .iter()
            .any(|needle| value.contains(needle))
        {
            Some(Self::Rac)
        } else {
            None
        }
    }

    #[must_use]
    pub fn rule(self) -> &'static CollectionRule {
        &RULES[self as usize]
    }

    #[must_use]
    pub fn layout(self) -> Layout {
        self.rule().layout
    }

    #[must_use]
    pub fn is_identifier(self, value: &str) -> bool {
        self.rule().is_identifier(value)
    }

    #[must_use]
    pub fn is_identifier_chunk(self, value: &str) -> bool {
        self.rule().is_identifier_chunk(value)
    }

    /// The fixed folder of a series prefix, if this collection has one.
    #[must_use]
    pub fn series_folder(self, prefix: &str) -> Option<&'static str> {
        match self.layout() {
            Layout::Series(series) => series
                .iter()
                .find(|entry| entry.prefix == prefix)
                .map(|entry| entry.folder),
            Layout::RepeatedName | Layout::Flat | Layout::FlatFiles => None,
        }
    }
}

impl AsRef<str> for Collection {
    fn as_ref(&self) -> &'static str {
        self.as_str()
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
