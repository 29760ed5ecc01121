//! The search-index client and the decoding of its responses.

use thiserror::Error;

pub mod fofa;
pub mod response;

pub use fofa::FofaClient;

/// Why a query produced no rows.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("request to the index failed: {0}")]
    Transport(String),
    #[error("index answered with status {0}")]
    Status(u16),
    #[error("index returned an error: {0}")]
    Remote(String),
    #[error("cannot decode results field: {0}")]
    Decode(String),
}
