// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, PoisonError,
    },
};

use libxml::schemas::{SchemaParserContext, SchemaValidationContext};

use super::{identifier_path, libxml2, Error, Problem, RawContent, Source};
use crate::model::{artifact::ArtifactFile, identifier::Identifier};
use crate::storage::Storage;

/// The METS schema shipped with this crate, as its file name and content.
pub const BUNDLED_SCHEMA: (&str, &str) = ("mets.xsd", include_str!("../../schemas/mets.xsd"));

/// Schemas imported by [`BUNDLED_SCHEMA`], relative to it.
pub const BUNDLED_IMPORTS: &[(&str, &str)] =
    &[("xlink.xsd", include_str!("../../schemas/xlink.xsd"))];

static UNPACK_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Writes the bundled schemas into a directory of their own,
/// so libxml2 can resolve the imports,
/// and returns the path of the main schema.
///
/// Files that are already there with the right content are left alone.
fn unpack_bundled() -> Result<PathBuf, Error> {
    let dir = std::env::temp_dir().join(format!(
        "{}-{}-schemas",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    ));
    fs::create_dir_all(&dir).map_err(|err| Error::SchemaFile(dir.clone(), err))?;
    for (name, content) in std::iter::once(&BUNDLED_SCHEMA).chain(BUNDLED_IMPORTS) {
        let path = dir.join(name);
        if fs::read_to_string(&path).is_ok_and(|existing| existing == *content) {
            continue;
        }
        // written next to it first, so no reader ever sees a partial file
        let tmp = dir.join(format!(
            "{name}.{}-{}.tmp",
            std::process::id(),
            UNPACK_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, content)
            .and_then(|()| fs::rename(&tmp, &path))
            .map_err(|err| Error::SchemaFile(path.clone(), err))?;
    }
    Ok(dir.join(BUNDLED_SCHEMA.0))
}

/// Checks `{id}.mets.xml` files against a METS XML Schema,
/// which is parsed once, when this is created.
pub struct MetsValidator {
    schema: Mutex<SchemaValidationContext>,
}

impl MetsValidator {
    pub fn bundled() -> Result<Self, Error> {
        Self::from_file(&unpack_bundled()?)
    }

    /// Loads the schema at `path`; imports are resolved relative to it.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        fs::metadata(path).map_err(|err| Error::SchemaFile(path.to_path_buf(), err))?;
        let schema_error = |message: String| Error::Schema {
            path: path.to_path_buf(),
            message,
        };
        let location = path
            .to_str()
            .ok_or_else(|| schema_error("the path is not valid UTF-8".to_string()))?;
        libxml2::init();
        let mut parser = SchemaParserContext::from_file(location);
        let schema = SchemaValidationContext::from_parser(&mut parser)
            .map_err(|errors| schema_error(libxml2::describe(&errors)))?;
        Ok(Self {
            schema: Mutex::new(schema),
        })
    }

    /// Uses the schema file if one is given, the bundled schema otherwise.
    pub fn load(schema_file: Option<&Path>) -> Result<Self, Error> {
        match schema_file {
            Some(path) => {
                tracing::debug!("Loading METS schema from '{}' ...", path.display());
                Self::from_file(path)
            }
            None => Self::bundled(),
        }
    }

    /// Checks already loaded METS content.
    #[must_use]
    pub fn check(&self, identifier: &Identifier, content: &RawContent) -> Vec<Problem> {
        let path = identifier_path(identifier);
        let file = ArtifactFile::MetsXml.file_name(identifier);
        let Ok(doc) = libxml2::parse(content.as_bytes()) else {
            tracing::debug!("{identifier}: mets.xml not well-formed");
            return vec![Problem::NotWellFormed { path, file }];
        };
        let validated = self
            .schema
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .validate_document(&doc);
        match validated {
            Ok(()) => vec![],
            Err(errors) => {
                tracing::debug!(
                    "{identifier}: mets.xml not valid: {}",
                    libxml2::describe(&errors)
                );
                vec![Problem::NotValid { path, file }]
            }
        }
    }

    /// Checks the METS file of `identifier`, reporting it if missing.
    pub async fn validate(
        &self,
        storage: &dyn Storage,
        identifier: &Identifier,
        source: &Source,
    ) -> Result<Vec<Problem>, Error> {
        Ok(match source.read(storage).await? {
            Some(content) => self.check(identifier, &content),
            None => vec![Problem::MissingFile {
                path: identifier_path(identifier),
                file: ArtifactFile::MetsXml.file_name(identifier),
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = include_str!("../../tests/data/good.mets.xml");
    const NOT_VALID: &str = "mvol/0004/1901/0101/mvol-0004-1901-0101.mets.xml not valid";

    fn errors(xml: &str) -> Vec<String> {
        let validator = MetsValidator::bundled().unwrap();
        let id = Identifier::parse("mvol-0004-1901-0101").unwrap();
        validator
            .check(&id, &RawContent::from(xml))
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn broken(from: &str, to: &str) -> String {
        let broken = GOOD.replacen(from, to, 1);
        assert_ne!(broken, GOOD, "'{from}' is not in the good file");
        broken
    }

    #[test]
    fn the_bundled_schema_loads() {
        MetsValidator::load(None).unwrap();
        // a second time, over the unpacked files
        MetsValidator::load(None).unwrap();
    }

    #[test]
    fn accepts_a_good_file() {
        assert_eq!(errors(GOOD), Vec::<String>::new());
    }

    #[test]
    fn catches_well_formedness_errors() {
        let not_well_formed = vec!["mvol/0004/1901/0101/mvol-0004-1901-0101.mets.xml not well-formed"];
        assert_eq!(errors("<not_well></formed_xml>"), not_well_formed);
        assert_eq!(errors(""), not_well_formed);
    }

    #[test]
    fn catches_structural_errors() {
        // no structMap
        assert_eq!(
            errors(r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/"/>"#),
            vec![NOT_VALID]
        );
        // well-formed, but not METS at all
        assert_eq!(
            errors("<metadata><title>t</title><date>1942-04-07</date><description/><identifier/></metadata>"),
            vec![NOT_VALID]
        );
        // a file without its ID
        assert_eq!(
            errors(&broken(r#"<mets:file ID="TIFF0001""#, r#"<mets:file"#)),
            vec![NOT_VALID]
        );
    }

    #[test]
    fn catches_attribute_value_errors() {
        let bad_values = [
            broken(r#"<mets:FLocat LOCTYPE="URL""#, r#"<mets:FLocat LOCTYPE="NOT-A-LOCTYPE""#),
            broken(r#"MDTYPE="OTHER""#, r#"MDTYPE="ALTO""#),
            broken(r#"SEQ="2""#, r#"SEQ="two""#),
            broken(r#"ORDER="2""#, r#"ORDER="second""#),
            broken(r#"CREATEDATE="2019-05-14T10:22:00""#, r#"CREATEDATE="yesterday""#),
            // not declared for div
            broken(r#"ORDER="2""#, r#"SEQ="one""#),
        ];
        for xml in &bad_values {
            assert_eq!(errors(xml), vec![NOT_VALID]);
        }
    }

    #[test]
    fn catches_duplicate_ids() {
        assert_eq!(
            errors(&broken(r#"ID="TIFF0002""#, r#"ID="TIFF0001""#)),
            vec![NOT_VALID]
        );
    }

    #[test]
    fn catches_missing_required_attributes() {
        assert_eq!(
            errors(&broken(r#"<mets:FLocat LOCTYPE="URL" "#, "<mets:FLocat ")),
            vec![NOT_VALID]
        );
    }

    #[test]
    fn schema_files_can_be_missing() {
        assert!(matches!(
            MetsValidator::from_file(Path::new("/nonexistent/mets.xsd")),
            Err(Error::SchemaFile(..))
        ));
    }

    #[test]
    fn schema_files_can_be_broken() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mets.xsd");
        fs::write(&path, "<xsd:schema").unwrap();
        assert!(matches!(
            MetsValidator::from_file(&path),
            Err(Error::Schema { .. })
        ));
    }
}
