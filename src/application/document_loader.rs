//! Document loader (C4): walks a project folder and produces
//! [`LoadedDocument`]s, classified and language-tagged.

use crate::domain::types::{Language, LoadedDocument, SourceType};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Directories skipped regardless of configuration, so the daemon never
/// indexes its own state or common build artifacts (SPEC_FULL.md §2).
const SKIPPED_DIRS: &[&str] = &[
    ".git",
    "target",
    "node_modules",
    "dist",
    "build",
    ".venv",
    "__pycache__",
    ".claude",
    ".agent-brain",
];

/// Walk `root` (honoring `.gitignore`-style ignore rules via
/// `ignore::WalkBuilder`), load each eligible file, and classify it.
///
/// `recursive = false` caps the walk at `root`'s direct children (spec
/// §4.10's `POST /index` request field), rather than descending into
/// subdirectories.
///
/// Files that fail UTF-8 decoding are skipped with a warning, never a fatal
/// error (spec §4.4).
pub fn load_documents(root: &Path, recursive: bool) -> Vec<LoadedDocument> {
    let mut builder = ignore::WalkBuilder::new(root);
    builder.hidden(false).filter_entry(|entry| {
        entry
            .file_name()
            .to_str()
            .map(|name| !SKIPPED_DIRS.contains(&name))
            .unwrap_or(true)
    });
    if !recursive {
        builder.max_depth(Some(1));
    }
    let walker = builder.build();

    let candidates: Vec<(PathBuf, Language)> = walker
        .flatten()
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter_map(|entry| {
            let path = entry.path();
            let extension = path.extension().and_then(|e| e.to_str())?;
            let language = Language::from_extension(extension)?;
            Some((path.to_path_buf(), language))
        })
        .collect();

    // Reading and hashing every candidate file is CPU/IO-bound and
    // independent per path, so it fans out across rayon's global pool
    // rather than running one file at a time.
    candidates
        .into_par_iter()
        .filter_map(|(path, language)| load_one(&path, language))
        .collect()
}

fn load_one(path: &Path, language: Language) -> Option<LoadedDocument> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read file, skipping");
            return None;
        }
    };
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => {
            warn!(path = %path.display(), "file is not valid UTF-8, skipping");
            return None;
        }
    };

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let source_type = classify(&file_name, language);
    let file_hash = hash_content(&text);

    Some(LoadedDocument {
        source: path.to_string_lossy().to_string(),
        file_name,
        text,
        source_type,
        language: Some(language),
        file_hash,
    })
}

/// Classification order from spec §4.4: doc extensions first, then
/// test-file naming conventions, then plain code.
fn classify(file_name: &str, language: Language) -> SourceType {
    if matches!(language, Language::Markdown | Language::PlainText) {
        return SourceType::Doc;
    }
    let stem = file_name.rsplit_once('.').map(|(s, _)| s).unwrap_or(file_name);
    if stem.starts_with("test_") || stem.ends_with("_test") || stem.ends_with(".test") {
        return SourceType::Test;
    }
    SourceType::Code
}

fn hash_content(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn classifies_test_files() {
        assert_eq!(classify("test_utils.py", Language::Python), SourceType::Test);
        assert_eq!(classify("utils_test.go", Language::Go), SourceType::Test);
        assert_eq!(classify("utils.py", Language::Python), SourceType::Code);
        assert_eq!(classify("README.md", Language::Markdown), SourceType::Doc);
    }

    #[test]
    fn skips_noisy_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        let mut f = std::fs::File::create(dir.path().join("node_modules/ignored.js")).unwrap();
        writeln!(f, "console.log(1);").unwrap();

        let mut g = std::fs::File::create(dir.path().join("kept.js")).unwrap();
        writeln!(g, "console.log(2);").unwrap();

        let docs = load_documents(dir.path(), true);
        assert_eq!(docs.len(), 1);
        assert!(docs[0].source.ends_with("kept.js"));
    }

    #[test]
    fn skips_non_utf8_files_without_failing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("binary.py"), [0xff, 0xfe, 0x00, 0xff]).unwrap();
        let docs = load_documents(dir.path(), true);
        assert!(docs.is_empty());
    }

    #[test]
    fn non_recursive_skips_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/deep.py"), "x = 1\n").unwrap();
        std::fs::write(dir.path().join("top.py"), "y = 2\n").unwrap();

        let docs = load_documents(dir.path(), false);
        assert_eq!(docs.len(), 1);
        assert!(docs[0].source.ends_with("top.py"));

        let docs = load_documents(dir.path(), true);
        assert_eq!(docs.len(), 2);
    }
}
