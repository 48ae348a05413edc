//! Route table builder.
//!
//! Turns scanned descriptors into an ordered, de-duplicated table of import
//! and route records. The table is plain data; [`crate::render`] is the only
//! place that turns it into source text.

use crate::descriptor::{find_not_found_file, find_page_file, RouteDescriptor};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Marker a page file must contain to be imported rather than replaced by
/// the placeholder.
pub const DEFAULT_EXPORT_MARKER: &str = "export default";

/// A lazily imported page component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    /// Local component identifier (`Page0`, `Page1`, ...)
    pub ident: String,
    /// Module specifier, relative to the import base (`./app/about/page`)
    pub module_path: String,
}

/// What a route renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteElement {
    /// An imported page component, wrapped in the error boundary
    Component(String),
    /// Placeholder for a page with no default export yet
    Placeholder {
        /// Page file path shown to the developer
        page_path: String,
    },
}

/// One `<Route>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    pub path: String,
    pub element: RouteElement,
    pub dynamic: bool,
}

/// Catch-all route target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundRoute {
    /// The project's own not-found page
    Custom { module_path: String },
    /// The built-in 404 component
    Builtin,
}

/// The full, ordered route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    pub imports: Vec<ImportRecord>,
    pub routes: Vec<RouteRecord>,
    pub not_found: NotFoundRoute,
}

impl RouteTable {
    /// Build the table for a pages root.
    ///
    /// `descriptors` are the scanner's output. The root route `/` is
    /// synthesized from a page file directly inside `pages_root`. Page files
    /// are read once here to decide between an import and the placeholder.
    pub fn build(pages_root: &Path, import_base: &Path, descriptors: Vec<RouteDescriptor>) -> Self {
        let mut descriptors = descriptors;
        if let Some(root_page) = find_page_file(pages_root) {
            descriptors.insert(0, RouteDescriptor::root(root_page));
        }

        let not_found = match find_not_found_file(pages_root) {
            Some(file) => NotFoundRoute::Custom {
                module_path: import_specifier(import_base, &file),
            },
            None => NotFoundRoute::Builtin,
        };

        let mut table = RouteTable {
            imports: Vec::new(),
            routes: Vec::new(),
            not_found,
        };

        for (index, route) in order_routes(descriptors).into_iter().enumerate() {
            let element = if has_default_export(&route.source_file) {
                let ident = format!("Page{}", index);
                table.imports.push(ImportRecord {
                    ident: ident.clone(),
                    module_path: import_specifier(import_base, &route.source_file),
                });
                RouteElement::Component(ident)
            } else {
                RouteElement::Placeholder {
                    page_path: display_path(import_base, &route.source_file),
                }
            };

            table.routes.push(RouteRecord {
                path: route.route_path,
                element,
                dynamic: route.is_dynamic,
            });
        }

        table
    }

    /// Route paths in emission order.
    pub fn paths(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.path.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Sort and de-duplicate descriptors.
///
/// Static routes precede dynamic ones; within each group shorter paths come
/// first. The sort is stable, so equal keys keep their incoming order, and
/// when two descriptors share a path the earlier one wins.
pub fn order_routes(mut descriptors: Vec<RouteDescriptor>) -> Vec<RouteDescriptor> {
    descriptors.sort_by_key(|d| (d.is_dynamic, d.route_path.len()));

    let mut seen = HashSet::new();
    descriptors.retain(|d| {
        if seen.insert(d.route_path.clone()) {
            true
        } else {
            tracing::warn!(
                "Duplicate route {} from {} ignored",
                d.route_path,
                d.source_file.display()
            );
            false
        }
    });

    descriptors
}

/// Whether a page file can be imported as a component.
///
/// Unreadable, blank, and marker-less files all count as empty.
pub fn has_default_export(path: &Path) -> bool {
    match fs::read_to_string(path) {
        Ok(content) => {
            let content = content.trim();
            !content.is_empty() && content.contains(DEFAULT_EXPORT_MARKER)
        }
        Err(err) => {
            tracing::debug!("Treating {} as empty: {}", path.display(), err);
            false
        }
    }
}

/// Module specifier for `file`, relative to `import_base`, without its
/// script extension. Files outside the base keep their absolute path.
fn import_specifier(import_base: &Path, file: &Path) -> String {
    let file = strip_script_extension(file);
    match file.strip_prefix(import_base) {
        Ok(relative) => format!("./{}", to_slash(relative)),
        Err(_) => to_slash(&file),
    }
}

/// Path shown in the placeholder, relative to `import_base` when possible.
fn display_path(import_base: &Path, file: &Path) -> String {
    match file.strip_prefix(import_base) {
        Ok(relative) => to_slash(relative),
        Err(_) => to_slash(file),
    }
}

fn strip_script_extension(path: &Path) -> PathBuf {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("ts" | "tsx" | "js" | "jsx") => path.with_extension(""),
        _ => path.to_path_buf(),
    }
}

fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(path: &str, dynamic: bool) -> RouteDescriptor {
        RouteDescriptor {
            route_path: path.to_string(),
            source_file: PathBuf::from(format!("/project/src/app{}/page.tsx", path)),
            is_dynamic: dynamic,
            param_names: Vec::new(),
            display_name: path.rsplit('/').next().unwrap_or_default().to_string(),
        }
    }

    #[test]
    fn test_order_static_before_dynamic_then_length() {
        let ordered = order_routes(vec![
            descriptor("/blog/:slug", true),
            descriptor("/about", false),
            descriptor("/", false),
            descriptor("/:lang", true),
            descriptor("/blog/archive", false),
        ]);

        let paths: Vec<_> = ordered.iter().map(|d| d.route_path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["/", "/about", "/blog/archive", "/:lang", "/blog/:slug"]
        );
    }

    #[test]
    fn test_order_is_stable_for_equal_keys() {
        let ordered = order_routes(vec![
            descriptor("/bbb", false),
            descriptor("/aaa", false),
            descriptor("/ccc", false),
        ]);

        let paths: Vec<_> = ordered.iter().map(|d| d.route_path.as_str()).collect();
        assert_eq!(paths, vec!["/bbb", "/aaa", "/ccc"]);
    }

    #[test]
    fn test_duplicate_paths_keep_first() {
        let mut literal = descriptor("/:id", false);
        literal.source_file = PathBuf::from("/project/src/app/:id/page.tsx");
        let dynamic = descriptor("/:id", true);

        let ordered = order_routes(vec![dynamic, literal.clone()]);
        assert_eq!(ordered, vec![literal]);
    }

    #[test]
    fn test_import_specifier_strips_extension() {
        let base = Path::new("/project/src");
        assert_eq!(
            import_specifier(base, Path::new("/project/src/app/about/page.tsx")),
            "./app/about/page"
        );
        assert_eq!(
            import_specifier(base, Path::new("/project/src/app/not-found.js")),
            "./app/not-found"
        );
        assert_eq!(
            import_specifier(base, Path::new("/elsewhere/app/page.jsx")),
            "/elsewhere/app/page"
        );
    }

    #[test]
    fn test_display_path_keeps_extension() {
        let base = Path::new("/project/src");
        assert_eq!(
            display_path(base, Path::new("/project/src/app/draft/page.tsx")),
            "app/draft/page.tsx"
        );
    }

    #[test]
    fn test_has_default_export() {
        let temp = tempfile::TempDir::new().unwrap();
        let cases = [
            ("empty.tsx", "", false),
            ("blank.tsx", "   \n\t  ", false),
            ("named.tsx", "export function Page() {}", false),
            ("ok.tsx", "export default function Page() {}", true),
        ];

        for (name, content, expected) in cases {
            let path = temp.path().join(name);
            fs::write(&path, content).unwrap();
            assert_eq!(has_default_export(&path), expected, "{}", name);
        }

        assert!(!has_default_export(&temp.path().join("missing.tsx")));
    }
}
