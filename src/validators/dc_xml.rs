// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The simple Dublin Core record `{id}.dc.xml`:
//!
//! ```xml
//! <metadata>
//!   <title>...</title>
//!   <date>1930-01-03</date>
//!   <description>...</description>
//!   <identifier>mvol-0004-1930-0103</identifier>
//! </metadata>
//! ```
//!
//! The four children may come in any order, but each exactly once.

use std::sync::LazyLock;

use regex::Regex;
use roxmltree::{Document, Node};

use super::{
    identifier_path,
    libxml2::{self, DtdValidity},
    DateField, Error, Problem, RawContent, Source,
};
use crate::model::{artifact::ArtifactFile, identifier::Identifier};
use crate::storage::Storage;

pub const ROOT_ELEMENT: &str = "metadata";

/// `metadata` holds `date`, `description`, `identifier` and `title`,
/// each exactly once, in any order.
/// The alternatives are nested by their first element,
/// so libxml2 can build a deterministic automaton from them.
pub const DTD: &str = "\
<!ELEMENT metadata (
    (date, (
        (description, ((identifier, title) | (title, identifier))) |
        (identifier, ((description, title) | (title, description))) |
        (title, ((description, identifier) | (identifier, description))))) |
    (description, (
        (date, ((identifier, title) | (title, identifier))) |
        (identifier, ((date, title) | (title, date))) |
        (title, ((date, identifier) | (identifier, date))))) |
    (identifier, (
        (date, ((description, title) | (title, description))) |
        (description, ((date, title) | (title, date))) |
        (title, ((date, description) | (description, date))))) |
    (title, (
        (date, ((description, identifier) | (identifier, description))) |
        (description, ((date, identifier) | (identifier, date))) |
        (identifier, ((date, description) | (description, date))))))>
<!ELEMENT title (#PCDATA)>
<!ELEMENT date (#PCDATA)>
<!ELEMENT identifier (#PCDATA)>
<!ELEMENT description (#PCDATA)>
";

/// Only the dates of this series get checked.
pub const DATED_SERIES: &str = "mvol-0004";

pub const YEAR_RANGE: std::ops::RangeInclusive<u32> = 1700..=2100;
pub const MONTH_RANGE: std::ops::RangeInclusive<u32> = 1..=12;
pub const DAY_RANGE: std::ops::RangeInclusive<u32> = 1..=31;

static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4})(?:-([0-9]{2}))?(?:-([0-9]{2}))?$")
        .expect("constant date regex is valid")
});

/// The fields of a `YYYY[-MM[-DD]]` date that are out of range,
/// or `None` if the text does not have that shape.
#[must_use]
pub fn date_fields_out_of_range(date: &str) -> Option<Vec<DateField>> {
    let captures = DATE.captures(date)?;
    // a field that is present but does not parse makes the date malformed
    let number = |idx: usize| {
        captures
            .get(idx)
            .map(|part| part.as_str().parse::<u32>())
            .transpose()
            .ok()
    };
    let (year, month, day) = (number(1)?, number(2)?, number(3)?);
    let mut bad = Vec::new();
    if year.is_some_and(|year| !YEAR_RANGE.contains(&year)) {
        bad.push(DateField::Year);
    }
    if month.is_some_and(|month| !MONTH_RANGE.contains(&month)) {
        bad.push(DateField::Month);
    }
    if day.is_some_and(|day| !DAY_RANGE.contains(&day)) {
        bad.push(DateField::Day);
    }
    Some(bad)
}

/// The text of `node`, without comments and processing instructions.
fn text_content(node: Node) -> String {
    node.children()
        .filter(Node::is_text)
        .filter_map(|child| child.text())
        .collect()
}

/// Checks already loaded dc.xml content.
#[must_use]
pub fn check(identifier: &Identifier, content: &RawContent) -> Vec<Problem> {
    let path = identifier_path(identifier);
    let file = ArtifactFile::DcXml.file_name(identifier);
    let not_well_formed = || {
        vec![Problem::NotWellFormed {
            path: path.clone(),
            file: file.clone(),
        }]
    };
    let Some(text) = content.as_text() else {
        return not_well_formed();
    };
    let doc = match Document::parse(&text) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::debug!("{identifier}: dc.xml not well-formed: {err}");
            return not_well_formed();
        }
    };
    match libxml2::validate_with_dtd(&text, ROOT_ELEMENT, DTD) {
        DtdValidity::Valid => {}
        DtdValidity::NotWellFormed => return not_well_formed(),
        DtdValidity::NotValid => {
            tracing::debug!("{identifier}: dc.xml does not follow the DTD");
            return vec![Problem::NotValid { path, file }];
        }
    }
    if !identifier.is_in_series(DATED_SERIES) {
        return vec![];
    }
    let date = doc
        .root_element()
        .children()
        .find(|child| child.has_tag_name("date"))
        .map(text_content)
        .unwrap_or_default();
    match date_fields_out_of_range(date.trim()) {
        Some(fields) => fields
            .into_iter()
            .map(|field| Problem::DateOutOfRange {
                path: path.clone(),
                file: file.clone(),
                field,
            })
            .collect(),
        None => vec![Problem::MalformedDate { path, file }],
    }
}

/// Checks the dc.xml of `identifier`, reporting it if missing.
pub async fn validate(
    storage: &dyn Storage,
    identifier: &Identifier,
    source: &Source,
) -> Result<Vec<Problem>, Error> {
    Ok(match source.read(storage).await? {
        Some(content) => check(identifier, &content),
        None => vec![Problem::MissingFile {
            path: identifier_path(identifier),
            file: ArtifactFile::DcXml.file_name(identifier),
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(xml: &str) -> Vec<String> {
        let id = Identifier::parse("mvol-0004-1901-0101").unwrap();
        check(&id, &RawContent::from(xml))
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn accepts_a_correct_record() {
        assert!(errors("<metadata><title>test</title><date>2000-01-31</date><description>test</description><identifier>mvol-0004-1900-0101</identifier></metadata>").is_empty());
        assert!(errors(
            "<?xml version=\"1.0\"?>\n<metadata>\n  <identifier>x</identifier>\n  <date>1930</date>\n  <!-- c -->\n  <title/>\n  <description>d</description>\n</metadata>\n"
        )
        .is_empty());
    }

    #[test]
    fn catches_well_formedness_errors() {
        assert_eq!(
            errors("<not_well></formed_xml>"),
            vec!["mvol/0004/1901/0101/mvol-0004-1901-0101.dc.xml not well-formed"]
        );
    }

    #[test]
    fn checks_the_structure() {
        let not_valid = vec!["mvol/0004/1901/0101/mvol-0004-1901-0101.dc.xml not valid"];
        assert_eq!(errors("<dublin_core><title>test</title><date>2000-01-01</date><description>test</description><identifier>mvol-0004-1900-0101</identifier></dublin_core>"), not_valid);
        // missing identifier
        assert_eq!(errors("<metadata><title/><date>2000</date><description/></metadata>"), not_valid);
        // repeated title
        assert_eq!(errors("<metadata><title/><title/><date>2000</date><description/><identifier/></metadata>"), not_valid);
        // extra element
        assert_eq!(errors("<metadata><title/><date>2000</date><description/><identifier/><creator/></metadata>"), not_valid);
        // nested markup
        assert_eq!(errors("<metadata><title><b>x</b></title><date>2000</date><description/><identifier/></metadata>"), not_valid);
        // namespaced children are different elements
        assert_eq!(errors("<metadata xmlns:dc=\"http://purl.org/dc/elements/1.1/\"><dc:title/><date>2000</date><description/><identifier/></metadata>"), not_valid);
        // attributes
        assert_eq!(errors("<metadata><title lang=\"en\"/><date>2000</date><description/><identifier/></metadata>"), not_valid);
        // text between the elements
        assert_eq!(errors("<metadata>x<title/><date>2000</date><description/><identifier/></metadata>"), not_valid);
    }

    #[test]
    fn accepts_any_order() {
        assert!(errors("<metadata><identifier/><description/><date>2000</date><title/></metadata>").is_empty());
        assert!(errors("<metadata><description/><title/><identifier/><date>2000</date></metadata>").is_empty());
    }

    #[test]
    fn checks_date_ranges() {
        let found = errors("<metadata><title>test</title><date>2000-31-01</date><description>test</description><identifier>mvol-0004-1900-0101</identifier></metadata>");
        assert_eq!(
            found,
            vec!["mvol/0004/1901/0101/mvol-0004-1901-0101.dc.xml has an incorrect month field"]
        );
        let found = errors("<metadata><title/><date>1600-00-32</date><description/><identifier/></metadata>");
        assert_eq!(found.len(), 3);
        assert!(found[0].ends_with("incorrect year field"));
        assert!(found[2].ends_with("incorrect day field"));
    }

    #[test]
    fn catches_malformed_dates() {
        assert_eq!(
            errors("<metadata><title/><date>January 3, 1930</date><description/><identifier/></metadata>"),
            vec!["mvol/0004/1901/0101/mvol-0004-1901-0101.dc.xml has a date with a wrong format"]
        );
    }

    #[test]
    fn dates_are_ascii_digits() {
        let malformed =
            vec!["mvol/0004/1901/0101/mvol-0004-1901-0101.dc.xml has a date with a wrong format"];
        // "0000-99-99" in Arabic-Indic digits
        assert_eq!(
            errors("<metadata><title/><date>\u{660}\u{660}\u{660}\u{660}-\u{669}\u{669}-\u{669}\u{669}</date><description/><identifier/></metadata>"),
            malformed
        );
        assert_eq!(
            errors("<metadata><title/><date>\u{ff11}\u{ff19}\u{ff13}\u{ff10}</date><description/><identifier/></metadata>"),
            malformed
        );
    }

    #[test]
    fn comments_are_not_part_of_the_date() {
        assert!(errors("<metadata><title/><date>1930<!--x-->-01-01</date><description/><identifier/></metadata>").is_empty());
        assert_eq!(
            errors("<metadata><title/><date>1930<!--x-->-13-01</date><description/><identifier/></metadata>"),
            vec!["mvol/0004/1901/0101/mvol-0004-1901-0101.dc.xml has an incorrect month field"]
        );
    }

    #[test]
    fn only_checks_dates_of_the_dated_series() {
        let id = Identifier::parse("mvol-0001-0002-0003").unwrap();
        let content = RawContent::from(
            "<metadata><title/><date>whenever</date><description/><identifier/></metadata>",
        );
        assert!(check(&id, &content).is_empty());
    }

    #[test]
    fn date_shapes() {
        assert_eq!(date_fields_out_of_range("1930"), Some(vec![]));
        assert_eq!(date_fields_out_of_range("1930-02"), Some(vec![]));
        assert_eq!(
            date_fields_out_of_range("1930-13-01"),
            Some(vec![DateField::Month])
        );
        assert_eq!(date_fields_out_of_range("30-01-01"), None);
        assert_eq!(date_fields_out_of_range("1930/01/01"), None);
        assert_eq!(date_fields_out_of_range("\u{661}\u{669}\u{663}\u{660}"), None);
    }
}
