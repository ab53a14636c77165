// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

#![allow(dead_code)]

use std::{fs, path::Path};

pub const GOOD_STRUCT_TXT: &str = include_str!("../data/good.struct.txt");
pub const GOOD_METS: &str = include_str!("../data/good.mets.xml");

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub fn dc_xml(id: &str, date: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<metadata>\n  <title>The Daily Maroon</title>\n  <date>{date}</date>\n  <description>A student newspaper.</description>\n  <identifier>{id}</identifier>\n</metadata>\n"
    )
}

/// An `mvol` issue with everything it needs, and `pages` pages.
pub fn mvol_issue(root: &Path, id: &str, date: &str, pages: u32) {
    let dir = id.replace('-', "/");
    for (folder, ext, content) in [
        ("ALTO", "xml", "<alto><Layout/></alto>"),
        ("JPEG", "jpg", "JFIF"),
        ("TIFF", "tif", "II*"),
    ] {
        for page in 1..=pages {
            write(root, &format!("{dir}/{folder}/{id}_{page:04}.{ext}"), content);
        }
    }
    write(root, &format!("{dir}/{id}.pdf"), "%PDF-1.4");
    write(root, &format!("{dir}/{id}.txt"), "All the news.");
    write(root, &format!("{dir}/{id}.struct.txt"), GOOD_STRUCT_TXT);
    write(root, &format!("{dir}/{id}.dc.xml"), &dc_xml(id, date));
}

/// A `gms` or `chopin` item with the TIFF pages given.
pub fn sequence_item(root: &Path, collection: &str, id: &str, pages: &[u32]) {
    for page in pages {
        write(root, &format!("{collection}/{id}/tifs/{id}-{page:03}.tif"), "II*");
    }
}
