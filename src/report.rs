// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use strum::{Display, EnumString, VariantNames};

use crate::model::identifier::Identifier;
use crate::validators::Problem;

/// How validation outcomes get printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum Format {
    #[default]
    Text,
    /// One JSON object per line and identifier
    Json,
}

/// What gets printed in [`Format::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Only the valid identifiers, one per line
    ListValid,
    /// One line per problem
    ShowErrors,
}

/// The result of validating one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub identifier: Identifier,
    pub problems: Vec<Problem>,
}

impl Outcome {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }
}

#[derive(Serialize)]
struct JsonOutcome<'a> {
    identifier: &'a str,
    valid: bool,
    errors: Vec<String>,
}

/// The output lines for one outcome.
///
/// In JSON format, every identifier gets exactly one line,
/// no matter the mode.
pub fn lines(outcome: &Outcome, mode: Mode, format: Format) -> Result<Vec<String>, serde_json::Error> {
    Ok(match format {
        Format::Json => {
            let json = JsonOutcome {
                identifier: outcome.identifier.as_str(),
                valid: outcome.is_valid(),
                errors: outcome.problems.iter().map(ToString::to_string).collect(),
            };
            vec![serde_json::to_string(&json)?]
        }
        Format::Text => match mode {
            Mode::ListValid if outcome.is_valid() => vec![outcome.identifier.to_string()],
            Mode::ListValid => vec![],
            Mode::ShowErrors => outcome.problems.iter().map(ToString::to_string).collect(),
        },
    })
}

/// `identifier<TAB>time`, with `-` as time if there is none.
#[must_use]
pub fn mtime_line(identifier: &Identifier, modified: Option<DateTime<Utc>>) -> String {
    let time = modified.map_or_else(
        || "-".to_string(),
        |time| time.to_rfc3339_opts(SecondsFormat::Secs, true),
    );
    format!("{identifier}\t{time}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn outcome(problems: Vec<Problem>) -> Outcome {
        Outcome {
            identifier: Identifier::parse("mvol-0004-1930-0103").unwrap(),
            problems,
        }
    }

    fn mismatch() -> Problem {
        Problem::FileCountMismatch {
            identifier: "mvol-0004-1930-0103".to_string(),
        }
    }

    #[test]
    fn text_lines() {
        let valid = outcome(vec![]);
        let invalid = outcome(vec![mismatch()]);
        assert_eq!(
            lines(&valid, Mode::ListValid, Format::Text).unwrap(),
            vec!["mvol-0004-1930-0103"]
        );
        assert!(lines(&invalid, Mode::ListValid, Format::Text)
            .unwrap()
            .is_empty());
        assert!(lines(&valid, Mode::ShowErrors, Format::Text)
            .unwrap()
            .is_empty());
        assert_eq!(
            lines(&invalid, Mode::ShowErrors, Format::Text).unwrap(),
            vec!["file count mismatch in mvol-0004-1930-0103"]
        );
    }

    #[test]
    fn json_lines() {
        let invalid = outcome(vec![mismatch()]);
        assert_eq!(
            lines(&invalid, Mode::ListValid, Format::Json).unwrap(),
            vec![r#"{"identifier":"mvol-0004-1930-0103","valid":false,"errors":["file count mismatch in mvol-0004-1930-0103"]}"#]
        );
        assert_eq!(
            lines(&outcome(vec![]), Mode::ShowErrors, Format::Json).unwrap(),
            vec![r#"{"identifier":"mvol-0004-1930-0103","valid":true,"errors":[]}"#]
        );
    }

    #[test]
    fn formats_by_name() {
        assert_eq!(Format::from_str("json").unwrap(), Format::Json);
        assert_eq!(Format::Text.to_string(), "text");
        assert_eq!(Format::VARIANTS, &["text", "json"]);
    }

    #[test]
    fn mtime_lines() {
        let id = Identifier::parse("gms-0019").unwrap();
        let time = Utc.with_ymd_and_hms(2024, 3, 5, 14, 2, 7).unwrap();
        assert_eq!(mtime_line(&id, Some(time)), "gms-0019\t2024-03-05T14:02:07Z");
        assert_eq!(mtime_line(&id, None), "gms-0019\t-");
    }
}
