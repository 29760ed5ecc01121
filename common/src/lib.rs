//! # Underlay Common
//!
//! Types shared by the discovery engine and the command line front-end.
//!
//! * **[`target`]**: Parsing and normalising the host or URL being investigated.
//! * **[`models`]**: Signals, queries and result rows that flow through a discovery run.
//! * **[`config`]**: Runtime settings and search-index credentials.
//! * **[`dirs`]**: Platform-specific locations for configuration and cached rule files.

pub mod config;
pub mod dirs;
pub mod models;
pub mod target;
