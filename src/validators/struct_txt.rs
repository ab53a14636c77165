// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The `{id}.struct.txt` page map:
//! a tab separated table with the header `object\tpage\tmilestone`,
//! followed by one line per page.

use std::sync::LazyLock;

use regex::Regex;

use super::{identifier_path, Error, Problem, RawContent, Source};
use crate::model::{artifact::ArtifactFile, identifier::Identifier};
use crate::storage::Storage;

pub const HEADER: &str = "object\tpage\tmilestone";

/// 8-digit object number, page number and an optional milestone
static RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{8}\t[0-9]+(\t[^\t]*)?$").expect("constant struct.txt record regex is valid")
});

/// Whether `text` is a well-formed struct.txt.
///
/// Line ends may be `\n` or `\r\n`;
/// a single blank line at the very end is tolerated.
#[must_use]
pub fn is_well_formed(text: &str) -> bool {
    let mut lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    // the terminator of the last line
    if lines.len() > 1 && lines.last() == Some(&"") {
        lines.pop();
    }
    if lines.len() > 1 && lines.last() == Some(&"") {
        lines.pop();
    }
    let Some((header, records)) = lines.split_first() else {
        return false;
    };
    *header == HEADER && records.iter().all(|record| RECORD.is_match(record))
}

/// Checks already loaded struct.txt content.
/// The whole file gets at most one problem.
#[must_use]
pub fn check(identifier: &Identifier, content: &RawContent) -> Vec<Problem> {
    let well_formed = content.as_text().is_some_and(|text| is_well_formed(&text));
    if well_formed {
        vec![]
    } else {
        tracing::debug!("{identifier}: malformed struct.txt");
        vec![Problem::StructTxt {
            path: identifier_path(identifier),
            file: ArtifactFile::StructTxt.file_name(identifier),
        }]
    }
}

/// Checks the struct.txt of `identifier`, reporting it if missing.
pub async fn validate(
    storage: &dyn Storage,
    identifier: &Identifier,
    source: &Source,
) -> Result<Vec<Problem>, Error> {
    Ok(match source.read(storage).await? {
        Some(content) => check(identifier, &content),
        None => vec![Problem::MissingFile {
            path: identifier_path(identifier),
            file: ArtifactFile::StructTxt.file_name(identifier),
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(text: &str) -> Vec<Problem> {
        let id = Identifier::parse("mvol-0004-1901-0101").unwrap();
        check(&id, &RawContent::from(text))
    }

    #[test]
    fn accepts_good_files() {
        assert!(errors("object\tpage\tmilestone\n00000002\t2\n00000003\t3\n00000004\t4").is_empty());
        assert!(errors("object\tpage\tmilestone\n00000001\t1\n00000002\t2\t\n").is_empty());
        assert!(errors("object\tpage\tmilestone\r\n00000001\t1\tcover\r\n").is_empty());
        assert!(errors("object\tpage\tmilestone\n").is_empty());
    }

    #[test]
    fn tolerates_one_trailing_blank_line() {
        assert!(errors("object\tpage\tmilestone\n00000001\t1\n\n").is_empty());
        assert!(!errors("object\tpage\tmilestone\n00000001\t1\n\n\n").is_empty());
    }

    #[test]
    fn requires_the_header() {
        let found = errors("00000001\t1\n00000002\t2\n00000003\t3\n00000004\t4");
        assert_eq!(
            found.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["mvol/0004/1901/0101/mvol-0004-1901-0101.struct.txt has one or more errors"]
        );
        assert!(!errors("").is_empty());
        assert!(!errors("object\tpage\n00000001\t1").is_empty());
    }

    #[test]
    fn requires_tabs() {
        assert_eq!(
            errors("object,page,milestone\n00000001,1\n00000002,2").len(),
            1
        );
        assert_eq!(errors("object\tpage\tmilestone\n00000001,1\n0002\t2").len(), 1);
    }

    #[test]
    fn object_numbers_are_ascii_digits() {
        // eight Arabic-Indic digits
        assert_eq!(
            errors("object\tpage\tmilestone\n\u{661}\u{662}\u{663}\u{664}\u{665}\u{666}\u{667}\u{668}\t1\n").len(),
            1
        );
        assert_eq!(errors("object\tpage\tmilestone\n00000001\t\u{661}\n").len(), 1);
    }

    #[test]
    fn rejects_blank_lines_in_between() {
        assert!(!errors("object\tpage\tmilestone\n00000001\t1\n\n00000002\t2\n").is_empty());
    }

    #[test]
    fn rejects_binary_content() {
        let id = Identifier::parse("mvol-0004-1901-0101").unwrap();
        assert_eq!(check(&id, &RawContent::from(vec![0xff, 0x00])).len(), 1);
    }
}
