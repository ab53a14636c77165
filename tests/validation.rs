// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

mod common;

use std::sync::Arc;

use digcoll_validator::{
    enumerator,
    model::identifier::{Identifier, IdentifierChunk},
    storage::local,
    validators::{aggregate::Validator, mets_xml::MetsValidator},
};

fn validator(root: &std::path::Path) -> Validator {
    Validator::builder()
        .storage(Arc::new(local::Storage::new(root)))
        .mets(MetsValidator::bundled().unwrap())
        .build()
}

async fn messages(validator: &Validator, id: &str) -> Vec<String> {
    validator
        .validate(&Identifier::parse(id).unwrap())
        .await
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[tokio::test]
async fn complete_issues_are_valid() {
    let root = tempfile::tempdir().unwrap();
    common::mvol_issue(root.path(), "mvol-0004-1930-0103", "1930-01-03", 3);
    common::mvol_issue(root.path(), "mvol-0001-0002-0003", "1900", 1);
    common::write(
        root.path(),
        "mvol/0001/0002/0003/mvol-0001-0002-0003.mets.xml",
        common::GOOD_METS,
    );
    let validator = validator(root.path());

    assert!(messages(&validator, "mvol-0004-1930-0103").await.is_empty());
    assert!(messages(&validator, "mvol-0001-0002-0003").await.is_empty());
}

#[tokio::test]
async fn broken_issue_reports_in_check_order() {
    let root = tempfile::tempdir().unwrap();
    let id = "mvol-0004-1930-0103";
    common::mvol_issue(root.path(), id, "1930-13-03", 2);
    let dir = "mvol/0004/1930/0103";
    common::write(root.path(), &format!("{dir}/JPEG/{id}_3.jpg"), "JFIF");
    common::write(root.path(), &format!("{dir}/{id}.struct.txt"), "object,page\n1,1\n");
    common::write(root.path(), &format!("{dir}/notes.txt"), "todo");
    let validator = validator(root.path());

    assert_eq!(
        messages(&validator, id).await,
        vec![
            "mvol-0004-1930-0103/JPEG/mvol-0004-1930-0103_3.jpg problem.",
            "mvol/0004/1930/0103/mvol-0004-1930-0103.struct.txt has one or more errors",
            "mvol/0004/1930/0103/mvol-0004-1930-0103.dc.xml has an incorrect month field",
            "non-allowable file notes.txt in mvol-0004-1930-0103",
            "file count mismatch in mvol-0004-1930-0103",
        ]
    );
}

#[tokio::test]
async fn image_sequences() {
    let root = tempfile::tempdir().unwrap();
    common::sequence_item(root.path(), "gms", "gms-0019", &[1, 2, 3]);
    common::sequence_item(root.path(), "chopin", "chopin-001", &[1, 3]);
    let validator = validator(root.path());

    assert!(messages(&validator, "gms-0019").await.is_empty());
    assert_eq!(
        messages(&validator, "chopin-001").await,
        vec!["chopin-001/tifs/chopin-001-002.tif not found."]
    );
    assert_eq!(
        messages(&validator, "gms-0020").await,
        vec!["gms/gms-0020/tifs missing"]
    );
}

#[tokio::test]
async fn validates_everything_found_below_a_chunk() {
    let root = tempfile::tempdir().unwrap();
    common::mvol_issue(root.path(), "mvol-0004-1930-0103", "1930-01-03", 1);
    common::mvol_issue(root.path(), "mvol-0004-1930-0104", "1930-01-04", 1);
    common::write(
        root.path(),
        "mvol/0004/1930/0104/mvol-0004-1930-0104.pdf",
        "",
    );
    let storage = local::Storage::new(root.path());
    let validator = validator(root.path());

    let identifiers =
        enumerator::recursive_ls(&storage, &IdentifierChunk::parse("mvol-0004").unwrap())
            .await
            .unwrap();
    let mut invalid = Vec::new();
    for identifier in &identifiers {
        if !validator.validate(identifier).await.unwrap().is_empty() {
            invalid.push(identifier.as_str());
        }
    }
    assert_eq!(identifiers.len(), 2);
    assert_eq!(invalid, vec!["mvol-0004-1930-0104"]);
}
