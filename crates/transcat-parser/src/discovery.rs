//! Locate PHP and Blade files under the scan roots.

use crate::file_kind::FileKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively list recognized files under `root`, sorted by path.
///
/// Hidden entries (names starting with `.`) are skipped along with everything
/// below them. A missing root yields an empty list.
pub fn list_files(root: &Path) -> Vec<PathBuf> {
    if !root.exists() {
        tracing::warn!("scan root {} does not exist", root.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::warn!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| FileKind::from_path(e.path()).is_some())
        .map(walkdir::DirEntry::into_path)
        .collect();

    files.sort();
    files
}

/// List files under every root, each root's files in sorted order.
///
/// A file reachable from two roots is listed once, at its first position.
pub fn list_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = std::collections::HashSet::new();
    roots
        .iter()
        .flat_map(|root| list_files(root))
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_names() {
        assert!(is_hidden(std::ffi::OsStr::new(".git")));
        assert!(is_hidden(std::ffi::OsStr::new(".env.php")));
        assert!(!is_hidden(std::ffi::OsStr::new("app")));
    }

    #[test]
    fn test_missing_root_is_empty() {
        let files = list_files(Path::new("/definitely/not/here/transcat"));
        assert!(files.is_empty());
    }
}
