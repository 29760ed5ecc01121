//! # Origin Discovery Service
//!
//! Implements the core "find the origin" use case.
//!
//! For each requested signal kind the service derives signals from the target,
//! turns every signal into a CDN-excluding query and collects the hosts the
//! index returns. A kind that fails is logged and skipped; the run only ends
//! early when there is nothing left to try.

use std::sync::Arc;

use tracing::{info, warn};
use underlay_common::models::row::{DISCOVERY_FIELDS, ResultRow, dedup_rows};
use underlay_common::models::signal::SignalKind;
use underlay_common::target::Target;

use crate::ports::SearchIndex;
use crate::query::QueryBuilder;
use crate::signals::SignalExtractor;

/// Application Service for origin discovery.
///
/// Orchestrates a run by:
/// 1. delegating signal derivation to the [`SignalExtractor`].
/// 2. building one query per signal with the [`QueryBuilder`].
/// 3. searching the [`SearchIndex`] and merging the rows.
pub struct DiscoveryService {
    extractor: SignalExtractor,
    builder: QueryBuilder,
    index: Arc<dyn SearchIndex>,
}

impl DiscoveryService {
    pub fn new(extractor: SignalExtractor, builder: QueryBuilder, index: Arc<dyn SearchIndex>) -> Self {
        Self {
            extractor,
            builder,
            index,
        }
    }

    /// Runs every kind in `kinds` against `target`, or all kinds when empty.
    ///
    /// Kinds are processed in order and rows keep the order they were first
    /// seen in. An empty result is a valid outcome, not an error.
    pub async fn discover(&self, target: &Target, kinds: &[SignalKind]) -> Vec<ResultRow> {
        let kinds = if kinds.is_empty() { &SignalKind::ALL[..] } else { kinds };
        let mut rows = Vec::new();

        for &kind in kinds {
            let signals = match self.extractor.extract(target, kind).await {
                Ok(signals) => signals,
                Err(e) => {
                    warn!("Skipping {kind} signals for {target}: {e}");
                    continue;
                }
            };

            for signal in signals {
                let query = self.builder.build(&signal).await;
                match self.index.search(&query, &DISCOVERY_FIELDS).await {
                    Ok(found) => {
                        info!("{} results for {signal}", found.len());
                        rows.extend(found);
                    }
                    Err(e) => warn!("Search for {signal} failed: {e}"),
                }
            }
        }

        dedup_rows(rows)
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
