//! # Signal Extraction
//!
//! Derives identification signals from a target:
//! * **host**: the normalised authority of the target.
//! * **title**: titles the index has recorded for the host plus the live page title.
//! * **icon**: the index-compatible hash of the site's favicon.
//!
//! A signal kind that yields nothing is reported as an [`ExtractError`] scoped to
//! that kind; callers carry on with the remaining kinds.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};
use underlay_common::models::signal::{Signal, SignalKind};
use underlay_common::target::Target;

use crate::hash;
use crate::http::FetchError;
use crate::ports::{SearchIndex, WebClient, WebPage};

pub mod favicon;
pub mod title;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot get a valid website title")]
    NoTitleFound,
    #[error("no valid favicon found")]
    NoFaviconFound,
    #[error("favicon download failed: {0}")]
    Fetch(#[from] FetchError),
}

pub struct SignalExtractor {
    web: Arc<dyn WebClient>,
    index: Arc<dyn SearchIndex>,
}

impl SignalExtractor {
    pub fn new(web: Arc<dyn WebClient>, index: Arc<dyn SearchIndex>) -> Self {
        Self { web, index }
    }

    pub async fn extract(&self, target: &Target, kind: SignalKind) -> Result<Vec<Signal>, ExtractError> {
        match kind {
            SignalKind::Host => Ok(vec![Signal::Host(target.host().to_string())]),
            SignalKind::Title => self.title_signals(target).await,
            SignalKind::Icon => Ok(vec![self.icon_signal(target).await?]),
        }
    }

    async fn title_signals(&self, target: &Target) -> Result<Vec<Signal>, ExtractError> {
        let indexed = title::indexed_titles(self.index.as_ref(), target).await;
        let live = match self.fetch_page(target).await {
            Ok(page) => title::extract_title(&page.text()),
            Err(e) => {
                debug!("Live page for {target} unavailable: {e}");
                None
            }
        };

        let titles = title::merge(indexed, live);
        if titles.is_empty() {
            return Err(ExtractError::NoTitleFound);
        }

        for title in &titles {
            info!("Website title: {title}");
        }
        Ok(titles.into_iter().map(Signal::Title).collect())
    }

    async fn icon_signal(&self, target: &Target) -> Result<Signal, ExtractError> {
        let (bases, hrefs) = match self.fetch_page(target).await {
            Ok(page) => {
                let hrefs = favicon::icon_links(&page.text());
                debug!("Found {} icon links on {}", hrefs.len(), page.url);
                (vec![page.url], hrefs)
            }
            Err(e) => {
                debug!("Live page for {target} unavailable ({e}), probing default icon only");
                (target.page_urls(), Vec::new())
            }
        };

        let mut winner = None;
        for candidate in bases.iter().flat_map(|base| favicon::candidates(base, &hrefs)) {
            if self.web.is_reachable(&candidate).await {
                winner = Some(candidate);
                break;
            }
        }
        let icon_url = winner.ok_or(ExtractError::NoFaviconFound)?;

        let icon = self.web.get(&icon_url).await?;
        if !icon.is_success() {
            return Err(FetchError::Status(icon.status).into());
        }
        if icon.body.is_empty() {
            return Err(ExtractError::NoFaviconFound);
        }

        let hash = hash::icon_hash(&icon.body);
        info!("Favicon hash of {icon_url}: {hash}");
        Ok(Signal::IconHash(hash))
    }

    /// Fetches the live page, trying each candidate URL of the target in turn.
    async fn fetch_page(&self, target: &Target) -> Result<WebPage, FetchError> {
        let mut last_err = FetchError::InvalidUrl(target.input().to_string());
        for url in target.page_urls() {
            match self.web.get(&url).await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    debug!("GET {url} failed: {e}");
                    last_err = e;
                }
            }
        }
        Err(last_err)
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
