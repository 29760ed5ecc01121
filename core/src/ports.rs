//! # Outbound Ports
//!
//! Contracts for interactions initiated by the engine towards the network.
//!
//! ## Rules
//! 1. Only traits and the plain data they exchange live here.
//! 2. Concrete implementations live in [`crate::http`] and [`crate::search`].
//! 3. Every call is independent; implementations must not rely on call order.

use async_trait::async_trait;
use underlay_common::models::query::Query;
use underlay_common::models::row::{Field, ResultRow};
use url::Url;

use crate::http::FetchError;
use crate::search::SearchError;

/// A fetched web resource.
#[derive(Debug, Clone)]
pub struct WebPage {
    /// Final URL after redirects. Relative links resolve against it.
    pub url: Url,
    pub status: u16,
    pub body: Vec<u8>,
}

impl WebPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Plain HTTP access to the target site and to the rule providers.
#[async_trait]
pub trait WebClient: Send + Sync {
    /// Performs a GET request. Non-2xx responses are returned, not treated as errors.
    async fn get(&self, url: &Url) -> Result<WebPage, FetchError>;

    /// Performs a bounded HEAD request and reports whether it succeeded.
    async fn is_reachable(&self, url: &Url) -> bool;
}

/// The internet-wide search index.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Runs `query`, asking for `fields` in each row.
    ///
    /// Rows whose first column is empty are never returned.
    async fn search(&self, query: &Query, fields: &[Field]) -> Result<Vec<ResultRow>, SearchError>;
}
