/// Include/exclude pattern matching for file discovery.
///
/// Three pattern shapes are recognized:
/// - `dir/**`  — matches the directory itself and everything under it
///   (the only shape that prunes whole subtrees during traversal)
/// - `*.ext`   — case-sensitive extension suffix match
/// - any other — generic glob: `**` and `*` match any character sequence,
///   `?` matches a single character, anchored to the whole path
use regex::Regex;

/// Returns whether `relative_path` matches `pattern`.
///
/// Paths are expected to use forward slashes and be relative to the
/// project root. A pattern that fits none of the recognized shapes
/// simply matches nothing.
#[must_use]
pub fn matches(relative_path: &str, pattern: &str) -> bool {
    // Directory subtree pattern: "node_modules/**"
    if let Some(prefix) = pattern.strip_suffix("/**") {
        return relative_path == prefix
            || relative_path.starts_with(&format!("{prefix}/"));
    }

    // Extension suffix pattern: "*.py" matches any path ending in ".py"
    if pattern.starts_with("*.") {
        return relative_path.ends_with(&pattern[1..]);
    }

    // Generic glob, translated to an anchored regex
    match glob_to_regex(pattern) {
        Some(re) => re.is_match(relative_path),
        None => false,
    }
}

/// Translate a glob pattern to an anchored regex.
///
/// All regex metacharacters are escaped first, then the escaped wildcard
/// sequences are reinterpreted. There are no path-separator-aware
/// semantics here; `*` crosses `/` freely.
fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let translated = regex::escape(pattern)
        .replace(r"\*\*", ".*")
        .replace(r"\*", ".*")
        .replace(r"\?", ".");
    Regex::new(&format!("^{translated}$")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_pattern() {
        assert!(matches("node_modules", "node_modules/**"));
        assert!(matches("node_modules/foo/bar.js", "node_modules/**"));
        assert!(!matches("my_node_modules/x", "node_modules/**"));
        assert!(!matches("src/node_modules_like", "node_modules/**"));
    }

    #[test]
    fn test_extension_pattern() {
        assert!(matches("a/b/c.py", "*.py"));
        assert!(matches("main.py", "*.py"));
        assert!(!matches("a/b/c.pyc", "*.py"));
        // Case-sensitive
        assert!(!matches("a/b/C.PY", "*.py"));
    }

    #[test]
    fn test_generic_glob() {
        assert!(matches("src/main.rs", "src/*.rs"));
        assert!(matches("src/deep/nested/mod.rs", "src/**/mod.rs"));
        assert!(matches("a.rs", "?.rs"));
        assert!(!matches("ab.rs", "?.rs"));
        assert!(matches("exact/path.txt", "exact/path.txt"));
        assert!(!matches("exact/path.txt", "other/path.txt"));
    }

    #[test]
    fn test_glob_escapes_metacharacters() {
        // A literal dot in the pattern must not act as a regex wildcard
        assert!(!matches("fileXtxt", "file.txt"));
        assert!(matches("file.txt", "file.txt"));
        // Parentheses and plus are literal
        assert!(matches("weird(name)+.txt", "weird(name)+.txt"));
    }

    #[test]
    fn test_star_crosses_separators() {
        // No path-separator-aware semantics in the generic shape
        assert!(matches("a/b/c.txt", "a/*.txt"));
    }
}
