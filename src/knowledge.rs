//! Local knowledge corpus loading.
//!
//! The answer prompt can be enriched with course scripts and past exam
//! solutions. The corpus lives on local disk, either as a zip archive of
//! text files or as a plain directory; remote storage is out of scope.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;
use zip::ZipArchive;

const CORPUS_EXTENSIONS: [&str; 2] = ["txt", "md"];

fn has_corpus_extension(name: &str) -> bool {
    CORPUS_EXTENSIONS
        .iter()
        .any(|ext| name.to_lowercase().ends_with(&format!(".{}", ext)))
}

/// Load the knowledge corpus from `path`.
///
/// A `.zip` path is read as an archive, anything else as a directory tree.
/// Text is decoded lossily; a corpus member that is not valid UTF-8 still
/// contributes what it can. Members are concatenated with blank lines, in
/// deterministic (archive / sorted path) order.
pub fn load_corpus(path: &Path) -> Result<String> {
    if path.extension().map_or(false, |ext| ext == "zip") {
        load_from_zip(path)
    } else if path.is_dir() {
        load_from_dir(path)
    } else {
        anyhow::bail!(
            "knowledge path {} is neither a zip archive nor a directory",
            path.display()
        )
    }
}

fn load_from_zip(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("failed to open knowledge archive {}", path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("failed to read knowledge archive {}", path.display()))?;

    let mut parts = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if !has_corpus_extension(entry.name()) {
            continue;
        }
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        parts.push(String::from_utf8_lossy(&bytes).into_owned());
    }

    tracing::info!(
        archive = %path.display(),
        members = parts.len(),
        "loaded knowledge corpus"
    );
    Ok(parts.join("\n\n"))
}

fn load_from_dir(path: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for entry in WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let name = entry.file_name().to_string_lossy();
        if !has_corpus_extension(&name) {
            continue;
        }
        let bytes = std::fs::read(entry.path())
            .with_context(|| format!("failed to read {}", entry.path().display()))?;
        parts.push(String::from_utf8_lossy(&bytes).into_owned());
    }

    tracing::info!(
        dir = %path.display(),
        files = parts.len(),
        "loaded knowledge corpus"
    );
    Ok(parts.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_text_files_from_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a_skript.txt"), "Einheit 1").unwrap();
        std::fs::write(dir.path().join("b_klausur.md"), "Altklausur WS2022").unwrap();
        std::fs::write(dir.path().join("ignored.pdf"), [0u8, 1, 2]).unwrap();

        let corpus = load_corpus(dir.path()).unwrap();
        assert_eq!(corpus, "Einheit 1\n\nAltklausur WS2022");
    }

    #[test]
    fn loads_text_members_from_a_zip() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("wissen.zip");
        let file = File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("skript.txt", options).unwrap();
        writer.write_all(b"Einheit 2").unwrap();
        writer.start_file("bild.png", options).unwrap();
        writer.write_all(&[0u8; 4]).unwrap();
        writer.finish().unwrap();

        let corpus = load_corpus(&zip_path).unwrap();
        assert_eq!(corpus, "Einheit 2");
    }

    #[test]
    fn rejects_a_plain_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wissen.txt");
        std::fs::write(&path, "x").unwrap();
        assert!(load_corpus(&path).is_err());
    }
}
