// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Arc;

use typed_builder::TypedBuilder;

use super::{
    dc_xml, directory, files, issue_path, mets_xml::MetsValidator, ocr, struct_txt, Error,
    Problem, Source,
};
use crate::model::{
    artifact::{ArtifactFile, Folder},
    collection::Collection,
    identifier::{Identifier, ItemLocation},
};
use crate::settings::Settings;
use crate::storage::Storage;

/// One step in the check sequence of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    IssuePath,
    AltoOrPos,
    Jpeg,
    Tiff,
    Pdf,
    StructTxt,
    Txt,
    DcXml,
    /// Only if the item has a METS file
    MetsXml,
    AllowableFiles,
    /// Only if all the checks before passed
    Ocr,
    Sequence,
    ItemImage,
    ContainerImages,
}

pub const MVOL_CHECKS: &[Check] = &[
    Check::IssuePath,
    Check::AltoOrPos,
    Check::Jpeg,
    Check::Tiff,
    Check::Pdf,
    Check::StructTxt,
    Check::Txt,
    Check::DcXml,
    Check::MetsXml,
    Check::AllowableFiles,
    Check::Ocr,
];
pub const SEQUENCE_CHECKS: &[Check] = &[Check::Sequence];
pub const ITEM_IMAGE_CHECKS: &[Check] = &[Check::ItemImage];
pub const CONTAINER_CHECKS: &[Check] = &[Check::ContainerImages];

/// The checks run for `identifier`, in order.
#[must_use]
pub fn checks_for(identifier: &Identifier) -> &'static [Check] {
    match identifier.collection() {
        Collection::Mvol => MVOL_CHECKS,
        Collection::Chopin | Collection::Gms => SEQUENCE_CHECKS,
        Collection::Apf | Collection::Ewm | Collection::Speculum => ITEM_IMAGE_CHECKS,
        Collection::Rac => match identifier.location() {
            ItemLocation::Directory(_) => CONTAINER_CHECKS,
            ItemLocation::File { .. } => ITEM_IMAGE_CHECKS,
        },
    }
}

/// Validates identifiers against the data in one storage.
///
/// Holds no state that changes between validations,
/// so one instance can validate many identifiers concurrently.
#[derive(TypedBuilder)]
pub struct Validator {
    storage: Arc<dyn Storage>,
    mets: MetsValidator,
    /// `None` disables the final OCR check.
    #[builder(default)]
    ocr: Option<Arc<dyn ocr::OcrStatusCheck>>,
}

impl Validator {
    /// Sets up storage, METS schema and OCR check as configured.
    pub fn from_settings(settings: &Settings) -> Result<Self, Error> {
        let mets = MetsValidator::load(settings.mets_schema.as_deref())?;
        let ocr: Option<Arc<dyn ocr::OcrStatusCheck>> = if settings.ocr_check.enabled {
            Some(Arc::new(ocr::HttpOcrCheck::new(
                &settings.ocr_check,
                &settings.user_agent,
            )?))
        } else {
            tracing::debug!("OCR status check disabled");
            None
        };
        Ok(Self {
            storage: Arc::clone(&settings.storage),
            mets,
            ocr,
        })
    }

    #[must_use]
    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    fn artifact(identifier: &Identifier, artifact: ArtifactFile) -> Source {
        Source::stored(identifier.path().join(artifact.file_name(identifier)))
    }

    async fn run(
        &self,
        check: Check,
        identifier: &Identifier,
        so_far: &[Problem],
    ) -> Result<Vec<Problem>, Error> {
        let storage = self.storage();
        Ok(match check {
            Check::IssuePath => issue_path::check(identifier),
            Check::AltoOrPos => directory::validate_alto_or_pos(storage, identifier).await?,
            Check::Jpeg => {
                directory::validate_required_folder(storage, identifier, Folder::Jpeg).await?
            }
            Check::Tiff => {
                directory::validate_required_folder(storage, identifier, Folder::Tiff).await?
            }
            Check::Pdf => {
                files::validate_artifact_not_empty(storage, identifier, ArtifactFile::Pdf).await?
            }
            Check::StructTxt => {
                let source = Self::artifact(identifier, ArtifactFile::StructTxt);
                struct_txt::validate(storage, identifier, &source).await?
            }
            Check::Txt => {
                files::validate_artifact_not_empty(storage, identifier, ArtifactFile::Txt).await?
            }
            Check::DcXml => {
                let source = Self::artifact(identifier, ArtifactFile::DcXml);
                dc_xml::validate(storage, identifier, &source).await?
            }
            Check::MetsXml => {
                let path = identifier
                    .path()
                    .join(ArtifactFile::MetsXml.file_name(identifier));
                if storage.exists(&path).await? {
                    let source = Source::Stored(path);
                    self.mets.validate(storage, identifier, &source).await?
                } else {
                    vec![]
                }
            }
            Check::AllowableFiles => files::validate_allowable_files(storage, identifier).await?,
            Check::Ocr => match &self.ocr {
                Some(ocr_check) if so_far.is_empty() => {
                    ocr::validate(ocr_check.as_ref(), identifier).await
                }
                _ => vec![],
            },
            Check::Sequence => directory::validate_sequence(storage, identifier).await?,
            Check::ItemImage => files::validate_item_image(storage, identifier).await?,
            Check::ContainerImages => files::validate_container_images(storage, identifier).await?,
        })
    }

    /// Runs all checks of the collection of `identifier`, in order,
    /// and returns all problems found; none means valid.
    ///
    /// # Errors
    ///
    /// Only if the storage fails in a way other than
    /// a file or directory not being there.
    pub async fn validate(&self, identifier: &Identifier) -> Result<Vec<Problem>, Error> {
        let mut problems = Vec::new();
        for check in checks_for(identifier) {
            tracing::trace!("{identifier}: {check:?} ...");
            let found = self.run(*check, identifier, &problems).await?;
            problems.extend(found);
        }
        tracing::debug!("{identifier}: {} problems", problems.len());
        Ok(problems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::local;
    use crate::validators::ocr::{OcrStatus, OcrStatusCheck};
    use async_trait::async_trait;
    use std::{
        fs,
        sync::atomic::{AtomicUsize, Ordering},
    };

    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OcrStatusCheck for Counting {
        async fn status(&self, _identifier: &Identifier) -> OcrStatus {
            self.calls.fetch_add(1, Ordering::SeqCst);
            OcrStatus::Failed
        }
    }

    fn write(path: &std::path::Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn complete_issue(root: &std::path::Path) {
        let item = root.join("mvol/0004/1930/0103");
        let id = "mvol-0004-1930-0103";
        for (folder, ext, content) in [
            ("ALTO", "xml", "<alto/>"),
            ("JPEG", "jpg", "jpeg"),
            ("TIFF", "tif", "tiff"),
        ] {
            for page in 1..=2 {
                write(&item.join(format!("{folder}/{id}_{page:04}.{ext}")), content);
            }
        }
        write(&item.join(format!("{id}.pdf")), "%PDF");
        write(&item.join(format!("{id}.txt")), "text");
        write(
            &item.join(format!("{id}.struct.txt")),
            "object\tpage\tmilestone\n00000001\t1\n00000002\t2\n",
        );
        write(
            &item.join(format!("{id}.dc.xml")),
            "<metadata><title>Daily Maroon</title><date>1930-01-03</date><description/><identifier>mvol-0004-1930-0103</identifier></metadata>",
        );
    }

    fn validator(root: &std::path::Path, ocr: Arc<Counting>) -> Validator {
        Validator::builder()
            .storage(Arc::new(local::Storage::new(root)))
            .mets(MetsValidator::bundled().unwrap())
            .ocr(Some(ocr as Arc<dyn OcrStatusCheck>))
            .build()
    }

    #[test]
    fn check_tables() {
        let id = |value: &str| Identifier::parse(value).unwrap();
        assert_eq!(checks_for(&id("mvol-0001-0002-0003")), MVOL_CHECKS);
        assert_eq!(checks_for(&id("gms-0019")), SEQUENCE_CHECKS);
        assert_eq!(checks_for(&id("rac-0392")), CONTAINER_CHECKS);
        assert_eq!(checks_for(&id("chess-0392-001")), ITEM_IMAGE_CHECKS);
        assert_eq!(MVOL_CHECKS.last(), Some(&Check::Ocr));
    }

    #[tokio::test]
    async fn a_complete_issue_reaches_the_ocr_check() {
        let root = tempfile::tempdir().unwrap();
        complete_issue(root.path());
        let ocr = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let validator = validator(root.path(), Arc::clone(&ocr));
        let id = Identifier::parse("mvol-0004-1930-0103").unwrap();

        let problems = validator.validate(&id).await.unwrap();
        assert_eq!(
            problems.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["mvol-0004-1930-0103 has an unknown error."]
        );
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn earlier_problems_skip_the_ocr_check() {
        let root = tempfile::tempdir().unwrap();
        complete_issue(root.path());
        let item = root.path().join("mvol/0004/1930/0103");
        fs::remove_file(item.join("mvol-0004-1930-0103.pdf")).unwrap();
        write(&item.join("mvol-0004-1930-0103.mets.xml"), "<mets/>");
        let ocr = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let validator = validator(root.path(), Arc::clone(&ocr));
        let id = Identifier::parse("mvol-0004-1930-0103").unwrap();

        let problems = validator.validate(&id).await.unwrap();
        assert_eq!(
            problems.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec![
                "mvol/0004/1930/0103/mvol-0004-1930-0103.pdf missing",
                "mvol/0004/1930/0103/mvol-0004-1930-0103.mets.xml not valid",
            ]
        );
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn nothing_there_at_all() {
        let root = tempfile::tempdir().unwrap();
        let validator = Validator::builder()
            .storage(Arc::new(local::Storage::new(root.path())))
            .mets(MetsValidator::bundled().unwrap())
            .build();
        let id = Identifier::parse("mvol-0001-0002-0003").unwrap();
        let problems = validator.validate(&id).await.unwrap();
        assert_eq!(
            problems.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec![
                "mvol/0001/0002/0003/ALTO or POS missing",
                "mvol/0001/0002/0003/JPEG missing",
                "mvol/0001/0002/0003/TIFF missing",
                "mvol/0001/0002/0003/mvol-0001-0002-0003.pdf missing",
                "mvol/0001/0002/0003/mvol-0001-0002-0003.struct.txt missing",
                "mvol/0001/0002/0003/mvol-0001-0002-0003.txt missing",
                "mvol/0001/0002/0003/mvol-0001-0002-0003.dc.xml missing",
                "JPEG dir missing in mvol-0001-0002-0003",
                "TIFF dir missing in mvol-0001-0002-0003",
                "ALTO or POS dir missing in mvol-0001-0002-0003",
            ]
        );
    }
}
