//! Full reload when an API handler changes.

use crate::dev::api::API_EXTENSIONS;
use bini_router::{DevPlugin, HotUpdate, RouterConfig};
use std::path::{Path, PathBuf};

pub struct ApiReloadPlugin {
    api_dir: PathBuf,
}

impl ApiReloadPlugin {
    pub fn new(router: &RouterConfig) -> Self {
        Self {
            api_dir: router.pages_root().join("api"),
        }
    }

    fn is_handler(&self, file: &Path) -> bool {
        file.starts_with(&self.api_dir)
            && file
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| API_EXTENSIONS.contains(&ext))
    }
}

impl DevPlugin for ApiReloadPlugin {
    fn name(&self) -> &'static str {
        "bini-api-reload"
    }

    fn handle_hot_update(&self, file: &Path) -> HotUpdate {
        if self.is_handler(file) {
            tracing::info!("API route {} changed", file.display());
            HotUpdate::FullReload
        } else {
            HotUpdate::Default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_changes_reload() {
        let plugin = ApiReloadPlugin::new(&RouterConfig::new("/p"));
        assert_eq!(
            plugin.handle_hot_update(Path::new("/p/src/app/api/hello.ts")),
            HotUpdate::FullReload
        );
        assert_eq!(
            plugin.handle_hot_update(Path::new("/p/src/app/api/users/list.mjs")),
            HotUpdate::FullReload
        );
        assert_eq!(
            plugin.handle_hot_update(Path::new("/p/src/app/api/notes.md")),
            HotUpdate::Default
        );
        assert_eq!(
            plugin.handle_hot_update(Path::new("/p/src/app/about/page.tsx")),
            HotUpdate::Default
        );
    }
}
