//! Command-line tooling for Bini.js projects.
//!
//! - [`error`] - Error types with actionable hints
//! - [`logger`] - tracing setup
//! - [`ui`] - Terminal status lines, spinners and progress bars
//! - [`config`] - `bini.config.json` loading
//! - [`commands`] - `create`, `routes` and `dev`
//! - [`dev`] - Reload server, `/api` handlers and the Vite process used by `bini dev`
//! - [`plugins`] - Project plugins: router, `index.html` meta tags, reloads
//!
//! Route discovery and router generation live in the `bini-router` crate;
//! this crate wires them to the filesystem, the terminal and the browser.
//!
//! # Example
//!
//! ```rust,no_run
//! use bini_cli::config::{BiniConfig, ConfigOverrides};
//! use std::path::Path;
//!
//! let root = Path::new("./my-app");
//! let config = BiniConfig::load(root, &ConfigOverrides::default())?;
//! let (path, _) = bini_router::write_router(&config.to_router_config(root))?;
//! println!("wrote {}", path.display());
//! # Ok::<(), bini_cli::CliError>(())
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod error;
pub mod logger;
pub mod plugins;
pub mod ui;

pub use error::{CliError, ConfigError, Result, ResultExt, ScaffoldError};
