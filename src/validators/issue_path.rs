// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Sanity of the folders an `mvol-0004` (Daily Maroon) issue is filed under:
//! `mvol/0004/<year>/<mmdd>`.

use std::sync::LazyLock;

use regex::Regex;

use super::Problem;
use crate::model::identifier::Identifier;

/// The only series whose issues are filed by date
pub const DATED_SERIES: &str = "mvol-0004";

static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(18|19|20)[0-9]{2}$").expect("constant year regex is valid"));
static MMDD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0[0-9]|1[012])[0123][0-9]$").expect("constant mmdd regex is valid")
});

/// Checks the year and mmdd folders of a dated issue;
/// identifiers of other series pass unchecked.
#[must_use]
pub fn check(identifier: &Identifier) -> Vec<Problem> {
    if !identifier.is_in_series(DATED_SERIES) {
        return vec![];
    }
    let segments = identifier.as_chunk().segments();
    let mut problems = Vec::new();
    // segments: series, year, mmdd[, part]
    if !segments.get(1).is_some_and(|year| YEAR.is_match(year)) {
        problems.push(Problem::InvalidYearFolder {
            identifier: identifier.to_string(),
        });
    }
    if !segments.get(2).is_some_and(|mmdd| MMDD.is_match(mmdd)) {
        problems.push(Problem::InvalidMmddFolder {
            identifier: identifier.to_string(),
        });
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(value: &str) -> Vec<String> {
        check(&Identifier::parse(value).unwrap())
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn dated_issues() {
        assert!(errors("mvol-0004-1930-0103").is_empty());
        assert!(errors("mvol-0004-2001-1231-01").is_empty());
        assert_eq!(
            errors("mvol-0004-1630-0103"),
            vec!["mvol-0004-1630-0103 is contained in a parent folder that is not a valid year."]
        );
        assert_eq!(
            errors("mvol-0004-1930-1303"),
            vec!["mvol-0004-1930-1303 is not a valid mmdd folder name."]
        );
        assert_eq!(errors("mvol-0004-2130-0A03").len(), 2);
    }

    #[test]
    fn other_series_pass() {
        assert!(errors("mvol-0001-0002-0003").is_empty());
    }
}
