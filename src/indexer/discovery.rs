/// Recursive file discovery with include/exclude pattern pruning.
///
/// Walks a root directory depth-first, skipping excluded subtrees
/// entirely, and returns the files to index in filesystem-enumeration
/// order. That order is not sorted and not guaranteed stable across
/// runs; callers must not depend on it.
use std::path::{Path, PathBuf};

use tracing::warn;

use super::patterns;

/// Discover files under `root` matching the include/exclude rules.
///
/// A file is returned iff (`include` is empty OR at least one include
/// pattern matches) AND no exclude pattern matches. Directories whose
/// root-relative path matches an exclude pattern are pruned without
/// recursing. Unreadable directories are logged and skipped; discovery
/// never aborts as a whole.
#[must_use]
pub fn discover(root: &Path, include: &[String], exclude: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk(root, root, include, exclude, &mut files);
    files
}

fn walk(root: &Path, dir: &Path, include: &[String], exclude: &[String], out: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("skipping unreadable directory {}: {e}", dir.display());
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry in {}: {e}", dir.display());
                continue;
            }
        };

        let path = entry.path();
        let rel = relative_key(root, &path);

        if path.is_dir() {
            if exclude.iter().any(|p| patterns::matches(&rel, p)) {
                continue;
            }
            walk(root, &path, include, exclude, out);
        } else {
            let included =
                include.is_empty() || include.iter().any(|p| patterns::matches(&rel, p));
            let excluded = exclude.iter().any(|p| patterns::matches(&rel, p));
            if included && !excluded {
                out.push(path);
            }
        }
    }
}

/// Root-relative path with forward slashes, the form patterns match against.
pub(crate) fn relative_key(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
