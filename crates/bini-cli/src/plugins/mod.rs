//! Project plugins registered by `bini dev`, `bini routes` and `bini create`.
//!
//! The router plugins come from `bini-router`; the ones here touch files
//! outside the pages tree.

pub mod api;
pub mod meta;

pub use api::ApiReloadPlugin;
pub use meta::MetaTagsPlugin;

use bini_router::{LayoutReloadPlugin, PluginContainer, RouterConfig, RouterPlugin};

/// Every plugin a Bini.js project runs with, in hook order.
///
/// The meta tags plugin sits before the layout reload plugin so
/// `index.html` is rewritten before browsers are told to reload.
pub fn project_plugins(router: &RouterConfig) -> PluginContainer {
    PluginContainer::new()
        .with(RouterPlugin::new(router.clone()))
        .with(MetaTagsPlugin::new(router))
        .with(LayoutReloadPlugin::new(router.clone()))
        .with(ApiReloadPlugin::new(router))
}
