//! Project root resolution and state-directory layout (C1, spec §4.1/§6).

use crate::domain::error::{Error, Result};
use crate::infrastructure::config::types::Mode;
use std::path::{Path, PathBuf};

/// Version-control metadata directories/files recognized as an ancestor
/// marker, checked before project-marker files.
const VCS_MARKERS: &[&str] = &[".git", ".hg", ".svn"];

/// Project-marker files recognized when no VCS metadata is found
/// (SPEC_FULL.md §2).
const PROJECT_MARKERS: &[&str] = &["Cargo.toml", "package.json", "pyproject.toml", "go.mod"];

/// Resolve the project root with the precedence from spec §4.1: explicit
/// override → nearest ancestor with VCS metadata → nearest ancestor with a
/// project-marker file → current directory.
pub fn resolve_project_root(explicit: Option<&Path>, start: &Path) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return path
            .canonicalize()
            .map_err(|e| Error::config(format!("explicit project root {path:?} is invalid: {e}")));
    }

    let start = start
        .canonicalize()
        .map_err(|e| Error::config(format!("cannot resolve starting directory {start:?}: {e}")))?;

    if let Some(root) = nearest_ancestor_with(&start, VCS_MARKERS) {
        return Ok(root);
    }
    if let Some(root) = nearest_ancestor_with(&start, PROJECT_MARKERS) {
        return Ok(root);
    }
    Ok(start)
}

fn nearest_ancestor_with(start: &Path, markers: &[&str]) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if markers.iter().any(|marker| dir.join(marker).exists()) {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

/// The daemon's state directory: `<project_root>/.claude/agent-brain/` in
/// project mode, `<user_home>/.agent-brain/` in shared mode (spec §4.1).
pub fn state_dir(mode: Mode, project_root: &Path) -> Result<PathBuf> {
    match mode {
        Mode::Project => Ok(project_root.join(".claude").join("agent-brain")),
        Mode::Shared => dirs::home_dir()
            .map(|home| home.join(".agent-brain"))
            .ok_or_else(|| Error::config("could not resolve user home directory for shared mode")),
    }
}

/// Sibling store directories derived from the state directory (spec §6).
pub struct StorePaths {
    pub vector: PathBuf,
    pub keyword: PathBuf,
    pub graph: PathBuf,
}

impl StorePaths {
    pub fn under(state_dir: &Path) -> Self {
        Self {
            vector: state_dir.join("chroma_db"),
            keyword: state_dir.join("bm25_index"),
            graph: state_dir.join("graph_index"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_explicit_override() {
        let dir = tempfile::tempdir().unwrap();
        let root = resolve_project_root(Some(dir.path()), Path::new(".")).unwrap();
        assert_eq!(root, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn finds_nearest_vcs_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        let root = resolve_project_root(None, &nested).unwrap();
        assert_eq!(root, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn falls_back_to_project_marker_then_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        let nested = dir.path().join("src");
        std::fs::create_dir_all(&nested).unwrap();
        let root = resolve_project_root(None, &nested).unwrap();
        assert_eq!(root, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn state_dir_layout_matches_mode() {
        let project = PathBuf::from("/tmp/myproject");
        let dir = state_dir(Mode::Project, &project).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/myproject/.claude/agent-brain"));
    }
}
