//! File-based route discovery and router regeneration for Bini.js projects
//!
//! Pages live under a pages root (`src/app` by default). Every directory
//! holding a `page.{tsx,jsx,ts,js}` file becomes a route, `[name]`
//! directories become `:name` parameters, and a `not-found.*` file at the
//! root replaces the built-in 404 page. The discovered routes are rendered
//! into a single React Router component (`src/App.tsx` or `src/App.jsx`).
//!
//! # Pipeline
//!
//! - [`scanner::scan`] walks the pages root into [`RouteDescriptor`]s
//! - [`RouteTable::build`] orders and de-duplicates them into plain records
//! - [`render::render`] turns the table into source text, escaping every
//!   interpolated value in one place
//!
//! During development a [`WatchSession`] feeds filesystem notifications
//! through a [`ChangeDetector`] into a [`RegenerationCoordinator`], which
//! debounces triggers and runs at most one regeneration pass at a time.
//!
//! # Example
//!
//! ```rust,no_run
//! use bini_router::{write_router, RouterConfig};
//!
//! let config = RouterConfig::new("./my-app");
//! let (path, source) = write_router(&config)?;
//! println!("wrote {} bytes to {}", source.len(), path.display());
//! # Ok::<(), bini_router::RouterError>(())
//! ```

pub mod config;
pub mod coordinator;
pub mod descriptor;
pub mod detector;
pub mod error;
pub mod plugin;
pub mod render;
pub mod scanner;
pub mod session;
pub mod table;

pub use config::{RouterConfig, WatchTimings};
pub use coordinator::{
    CoordinatorHandle, CoordinatorState, RegenerationCoordinator, RouterEvent, SourceGenerator,
};
pub use descriptor::RouteDescriptor;
pub use detector::{ChangeDetector, Decision, EventKind};
pub use error::{Result, RouterError};
pub use plugin::{
    DevPlugin, HotUpdate, LayoutReloadPlugin, PluginContainer, RouterPlugin, ServerContext,
};
pub use session::{FsEvent, WatchSession};
pub use table::RouteTable;

use std::path::PathBuf;

/// Scan the pages root and build the ordered route table.
pub fn build_table(config: &RouterConfig) -> RouteTable {
    let pages_root = config.pages_root();
    let descriptors = scanner::scan(&pages_root);
    RouteTable::build(&pages_root, &config.import_base(), descriptors)
}

/// Render the full router source for the current state of the pages root.
///
/// A missing pages root yields a router with only the catch-all route.
pub fn generate(config: &RouterConfig) -> String {
    render::render(&build_table(config))
}

/// Generate the router source and write it to the configured router file.
///
/// Returns the file written and the source it now holds.
pub fn write_router(config: &RouterConfig) -> Result<(PathBuf, String)> {
    let source = generate(config);
    let path = config.router_path();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| RouterError::write(parent, e))?;
    }
    std::fs::write(&path, &source).map_err(|e| RouterError::write(&path, e))?;

    tracing::debug!("Wrote {} ({} bytes)", path.display(), source.len());
    Ok((path, source))
}
