//! # Underlay Core
//!
//! The origin-IP discovery engine.
//!
//! ## Layout
//! * **[`ports`]**: Traits for everything the engine needs from the outside world
//!   (web pages, the search index). Tests drive the engine through fakes of these.
//! * **[`http`]** and **[`search`]**: The reqwest-backed implementations of those ports.
//! * **[`hash`]**: Index-compatible favicon hashing.
//! * **[`exclusion`]**: Cached CDN IP-range lists and the exclusion clause built from them.
//! * **[`signals`]**: Deriving host, title and favicon signals from a target.
//! * **[`query`]**: Turning a signal into a CDN-excluding query.
//! * **[`discovery`]**: The service coordinating a full run.

pub mod discovery;
pub mod exclusion;
pub mod hash;
pub mod http;
pub mod ports;
pub mod query;
pub mod search;
pub mod signals;

#[cfg(test)]
mod testing;
