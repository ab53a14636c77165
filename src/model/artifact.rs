// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt;
use strum::EnumIter;

use super::identifier::Identifier;

/// A sub-directory of an item directory,
/// holding one file per page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter)]
pub enum Folder {
    Alto,
    Jpeg,
    Pos,
    Tiff,
    /// Image folder of the `chopin`, `gms` and `rac` collections.
    Tifs,
}

impl Folder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alto => "ALTO",
            Self::Jpeg => "JPEG",
            Self::Pos => "POS",
            Self::Tiff => "TIFF",
            Self::Tifs => "tifs",
        }
    }

    /// File extension of the page files, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Alto => "xml",
            Self::Jpeg => "jpg",
            Self::Pos => "pos",
            Self::Tiff | Self::Tifs => "tif",
        }
    }
}

impl AsRef<str> for Folder {
    fn as_ref(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file directly inside an item directory,
/// named after the identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter)]
pub enum ArtifactFile {
    DcXml,
    MetsXml,
    Pdf,
    StructTxt,
    Txt,
}

impl ArtifactFile {
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::DcXml => ".dc.xml",
            Self::MetsXml => ".mets.xml",
            Self::Pdf => ".pdf",
            Self::StructTxt => ".struct.txt",
            Self::Txt => ".txt",
        }
    }

    /// e.g. `mvol-0004-1930-0103.struct.txt`
    #[must_use]
    pub fn file_name(self, identifier: &Identifier) -> String {
        format!("{identifier}{}", self.suffix())
    }
}
