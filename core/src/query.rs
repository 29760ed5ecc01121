//! Turns a signal into a search query that leaves CDN edge hosts out.

use std::sync::Arc;

use tracing::debug;
use underlay_common::models::query::Query;
use underlay_common::models::signal::Signal;

use crate::exclusion::ExclusionRuleCache;

pub struct QueryBuilder {
    rules: Arc<ExclusionRuleCache>,
}

impl QueryBuilder {
    pub fn new(rules: Arc<ExclusionRuleCache>) -> Self {
        Self { rules }
    }

    /// `<predicate> && <exclusions>`, in plain and base64 form.
    pub async fn build(&self, signal: &Signal) -> Query {
        let clause = self.rules.full_exclusion_clause().await;
        let query = Query::new(format!("{} {clause}", signal.predicate()));
        debug!("Query for {signal}: {}", query.encoded());
        query
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
