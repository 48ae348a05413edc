//! Route descriptors and the file naming conventions they are derived from.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Page file names, in priority order. The first one present in a directory
/// backs that directory's route.
pub const PAGE_FILES: [&str; 4] = ["page.tsx", "page.jsx", "page.ts", "page.js"];

/// Custom not-found file names, in priority order. Only the pages root is
/// consulted.
pub const NOT_FOUND_FILES: [&str; 4] = [
    "not-found.tsx",
    "not-found.jsx",
    "not-found.ts",
    "not-found.js",
];

/// Display name of the synthesized root route.
pub const ROOT_ROUTE_NAME: &str = "Home";

/// One discovered route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    /// URL pattern, `:name` for dynamic segments (e.g. `/blog/:slug`)
    pub route_path: String,
    /// Absolute path of the backing page file
    pub source_file: PathBuf,
    /// Whether the owning directory itself is a `[name]` segment
    pub is_dynamic: bool,
    /// Every dynamic segment name from the pages root down to this route
    pub param_names: Vec<String>,
    /// Name of the originating directory
    pub display_name: String,
}

impl RouteDescriptor {
    /// Descriptor for the root route `/`.
    pub fn root(source_file: impl Into<PathBuf>) -> Self {
        Self {
            route_path: "/".to_string(),
            source_file: source_file.into(),
            is_dynamic: false,
            param_names: Vec::new(),
            display_name: ROOT_ROUTE_NAME.to_string(),
        }
    }
}

/// Parameter name of a `[name]` directory segment.
///
/// `[]` is not a dynamic segment.
pub fn dynamic_param(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .filter(|name| !name.is_empty())
}

/// Whether a directory entry is never scanned or watched.
pub fn is_skipped_name(name: &str) -> bool {
    name == "node_modules" || name.starts_with('.')
}

/// First page file present in `dir`, by priority.
pub fn find_page_file(dir: &Path) -> Option<PathBuf> {
    first_existing(dir, &PAGE_FILES)
}

/// First not-found file present in `dir`, by priority.
pub fn find_not_found_file(dir: &Path) -> Option<PathBuf> {
    first_existing(dir, &NOT_FOUND_FILES)
}

/// Whether `path` is named like a page file.
pub fn is_page_file(path: &Path) -> bool {
    file_name_in(path, &PAGE_FILES)
}

/// Whether `path` is named like a not-found file.
pub fn is_not_found_file(path: &Path) -> bool {
    file_name_in(path, &NOT_FOUND_FILES)
}

fn first_existing(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    let found: Vec<PathBuf> = names
        .iter()
        .map(|name| dir.join(name))
        .filter(|candidate| candidate.is_file())
        .collect();

    if found.len() > 1 {
        tracing::debug!(
            "{} has {} candidate files, using {}",
            dir.display(),
            found.len(),
            found[0].display()
        );
    }

    found.into_iter().next()
}

fn file_name_in(path: &Path, names: &[&str]) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| names.contains(&name))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_dynamic_param() {
        assert_eq!(dynamic_param("[slug]"), Some("slug"));
        assert_eq!(dynamic_param("[user_id]"), Some("user_id"));
        assert_eq!(dynamic_param("blog"), None);
        assert_eq!(dynamic_param("[slug"), None);
        assert_eq!(dynamic_param("slug]"), None);
        assert_eq!(dynamic_param("[]"), None);
    }

    #[test]
    fn test_is_skipped_name() {
        assert!(is_skipped_name("node_modules"));
        assert!(is_skipped_name(".git"));
        assert!(is_skipped_name(".hidden"));
        assert!(!is_skipped_name("blog"));
        assert!(!is_skipped_name("[id]"));
    }

    #[test]
    fn test_page_priority_tsx_first() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("page.js"), "").unwrap();
        fs::write(temp.path().join("page.tsx"), "").unwrap();
        fs::write(temp.path().join("page.jsx"), "").unwrap();

        assert_eq!(find_page_file(temp.path()), Some(temp.path().join("page.tsx")));
    }

    #[test]
    fn test_page_priority_jsx_before_ts() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("page.ts"), "").unwrap();
        fs::write(temp.path().join("page.jsx"), "").unwrap();

        assert_eq!(find_page_file(temp.path()), Some(temp.path().join("page.jsx")));
    }

    #[test]
    fn test_page_file_must_be_a_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("page.tsx")).unwrap();
        assert_eq!(find_page_file(temp.path()), None);
    }

    #[test]
    fn test_not_found_lookup() {
        let temp = TempDir::new().unwrap();
        assert_eq!(find_not_found_file(temp.path()), None);

        fs::write(temp.path().join("not-found.js"), "").unwrap();
        assert_eq!(
            find_not_found_file(temp.path()),
            Some(temp.path().join("not-found.js"))
        );
    }

    #[test]
    fn test_file_name_classification() {
        assert!(is_page_file(Path::new("/app/blog/page.tsx")));
        assert!(is_page_file(Path::new("page.js")));
        assert!(!is_page_file(Path::new("/app/homepage.tsx")));
        assert!(!is_page_file(Path::new("/app/page.css")));

        assert!(is_not_found_file(Path::new("/app/not-found.jsx")));
        assert!(!is_not_found_file(Path::new("/app/page.jsx")));
    }
}
