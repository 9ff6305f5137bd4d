// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::MergeError;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

/// Lists the fragments in `dir`: regular files whose name contains `marker`.
///
/// Subdirectories are not searched. Fragments are returned in byte-wise file name order.
pub fn discover_fragments(dir: &Utf8Path, marker: &str) -> Result<Vec<Utf8PathBuf>, MergeError> {
    let input_error = |error| MergeError::InputDirectory {
        dir: dir.to_owned(),
        error,
    };

    let mut fragments = Vec::new();
    for entry in dir.read_dir_utf8().map_err(input_error)? {
        let entry = entry.map_err(input_error)?;
        if !entry.file_name().contains(marker) {
            continue;
        }
        let path = entry.path().to_owned();
        if path.is_file() {
            fragments.push(path);
        } else {
            debug!("skipping {path}: not a regular file");
        }
    }

    fragments.sort_unstable_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!("found {} fragments in {dir}", fragments.len());
    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;
    use pretty_assertions::assert_eq;

    #[test]
    fn lists_matching_files_in_order() {
        let dir = tempdir().expect("tempdir created");
        for name in ["tmp-b.xml", "tmp-A.xml", "merged.ibutsu.xml", "notes.txt", "tmp-a.xml"] {
            std::fs::write(dir.path().join(name), "").expect("file written");
        }
        std::fs::create_dir(dir.path().join("tmp-dir")).expect("dir created");

        let fragments = discover_fragments(dir.path(), "tmp").expect("dir listed");
        let names: Vec<_> = fragments
            .iter()
            .map(|path| path.file_name().expect("file name"))
            .collect();
        assert_eq!(names, ["tmp-A.xml", "tmp-a.xml", "tmp-b.xml"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().expect("tempdir created");
        let missing = dir.path().join("missing");
        match discover_fragments(&missing, "tmp") {
            Err(MergeError::InputDirectory { dir, .. }) => assert_eq!(dir, missing),
            other => panic!("expected an input directory error, found {other:?}"),
        }
    }
}
