//! reqwest implementation of [`WebClient`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, redirect::Policy};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::ports::{WebClient, WebPage};

const USER_AGENT: &str = concat!("underlay/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: usize = 10;

/// Errors that can occur while fetching a page or file.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("failed to parse URL: {0}")]
    InvalidUrl(String),
}

/// How server certificates are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsPolicy {
    /// Standard validation. Required for anything carrying credentials or
    /// fetching exclusion data.
    Verify,
    /// Any certificate is accepted. Only for pages and icons of the target,
    /// which often sit behind misconfigured or self-signed origins.
    AcceptInvalid,
}

pub struct HttpWebClient {
    client: Client,
    probe_timeout: Duration,
    tls: TlsPolicy,
}

impl HttpWebClient {
    /// Builds a client whose GETs are bounded by `request_timeout` and whose
    /// liveness probes are bounded by `probe_timeout`.
    pub fn new(request_timeout: Duration, probe_timeout: Duration, tls: TlsPolicy) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .danger_accept_invalid_certs(tls == TlsPolicy::AcceptInvalid)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            client,
            probe_timeout,
            tls,
        })
    }

    /// The underlying client, for adapters that need raw request building.
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn tls(&self) -> TlsPolicy {
        self.tls
    }
}

#[async_trait]
impl WebClient for HttpWebClient {
    async fn get(&self, url: &Url) -> Result<WebPage, FetchError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response.bytes().await?;

        debug!("GET {url} -> {status} ({} bytes)", body.len());
        Ok(WebPage {
            url: final_url,
            status,
            body: body.to_vec(),
        })
    }

    async fn is_reachable(&self, url: &Url) -> bool {
        match self
            .client
            .head(url.clone())
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => {
                debug!("HEAD {url} -> {}", response.status());
                response.status().is_success()
            }
            Err(e) => {
                debug!("HEAD {url} failed: {e}");
                false
            }
        }
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
