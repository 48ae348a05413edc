//! Command implementations.

pub mod create;
pub mod dev;
pub mod routes;
pub mod templates;
pub mod utils;
