//! # Discovery Models
//!
//! Values created and consumed during a single discovery run.
//!
//! * [`signal::Signal`]: One identification signal derived from the target.
//! * [`query::Query`]: A search-index query with its transport encoding.
//! * [`row::ResultRow`]: One canonical row returned by the index.

pub mod query;
pub mod row;
pub mod signal;
