use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use underlay_common::config::Credentials;
use underlay_common::models::query::Query;
use underlay_common::models::row::{Field, ResultRow, join_fields};

use super::{SearchError, response};
use crate::ports::SearchIndex;

/// Client for the index's `search/all` endpoint.
///
/// Credentials are bound at construction, so a client cannot exist without them.
pub struct FofaClient {
    client: Client,
    api_url: String,
    credentials: Credentials,
    size: usize,
}

impl FofaClient {
    pub fn new(client: Client, api_url: impl Into<String>, credentials: Credentials, size: usize) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            credentials,
            size,
        }
    }
}

#[async_trait]
impl SearchIndex for FofaClient {
    async fn search(&self, query: &Query, fields: &[Field]) -> Result<Vec<ResultRow>, SearchError> {
        let size = self.size.to_string();
        let fields = join_fields(fields);

        debug!("Querying index with fields [{fields}]: {}", query.plain());
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("email", self.credentials.email()),
                ("key", self.credentials.key()),
                ("qbase64", query.encoded()),
                ("size", size.as_str()),
                ("fields", fields.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SearchError::Transport(e.without_url().to_string()))?;

        let rows = response::decode(&body)?;
        debug!("Index returned {} rows", rows.len());
        Ok(rows)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
