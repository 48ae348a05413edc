//! Directory scanner: turns the pages tree into route descriptors.
//!
//! Every non-skipped directory below the pages root that holds a page file
//! becomes one route. The root directory's own page is not reported here;
//! the route table synthesizes `/` from it.

use crate::descriptor::{dynamic_param, find_page_file, is_skipped_name, RouteDescriptor};
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Scan `root` recursively for routes.
///
/// Directories are visited parent-first with siblings in file-name order,
/// so the result is deterministic for a given tree. A missing root yields
/// no routes. Unreadable subtrees are logged and contribute nothing.
pub fn scan(root: &Path) -> Vec<RouteDescriptor> {
    if !root.exists() {
        return Vec::new();
    }

    let mut routes = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(is_scannable_dir);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let location = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| root.display().to_string());
                tracing::warn!("Could not scan routes in {}: {}", location, err);
                continue;
            }
        };

        if let Some(route) = describe(root, &entry) {
            routes.push(route);
        }
    }

    routes
}

fn is_scannable_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && !is_skipped_name(&entry.file_name().to_string_lossy())
}

/// Build the descriptor for one directory, if it has a page file.
fn describe(root: &Path, entry: &DirEntry) -> Option<RouteDescriptor> {
    let source_file = find_page_file(entry.path())?;
    let relative = entry.path().strip_prefix(root).ok()?;

    let mut route_path = String::new();
    let mut param_names = Vec::new();
    let mut is_dynamic = false;

    for component in relative.components() {
        let segment = component.as_os_str().to_string_lossy();
        route_path.push('/');
        match dynamic_param(&segment) {
            Some(param) => {
                route_path.push(':');
                route_path.push_str(param);
                param_names.push(param.to_string());
                is_dynamic = true;
            }
            None => {
                route_path.push_str(&segment);
                is_dynamic = false;
            }
        }
    }

    Some(RouteDescriptor {
        route_path,
        source_file,
        is_dynamic,
        param_names,
        display_name: entry.file_name().to_string_lossy().into_owned(),
    })
}
