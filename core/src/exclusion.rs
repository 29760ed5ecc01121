//! # CDN Exclusion Rules
//!
//! Builds the query fragment that removes known CDN and cloud edge
//! infrastructure from search results. It combines a fixed set of server and
//! organisation exclusions with the published address ranges of CloudFront
//! and Cloudflare.
//!
//! The ranges are cached on disk per provider and downloaded again once the
//! cached copy is older than the configured TTL. A provider whose list cannot
//! be obtained degrades to a header-only exclusion; the run continues with a
//! weaker filter.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

use crate::http::FetchError;
use crate::ports::WebClient;

pub mod provider;
pub mod store;

pub use provider::Provider;
use provider::is_ip_or_cidr;
pub use store::{CacheEntry, RuleStore};

/// Literal server, cloud and organisation exclusions applied to every query.
pub const STATIC_EXCLUSIONS: [&str; 25] = [
    r#"server!="cloudflare""#,
    r#"server!="alicdn""#,
    r#"server!="qcloud""#,
    r#"server!="yunjiasu""#,
    r#"server!="yupaicloud""#,
    r#"cloud_name!="Cloudflare""#,
    r#"server!="upyun""#,
    r#"server!="ws""#,
    r#"server!="cdnws""#,
    r#"server!="china cache""#,
    r#"server!="fastly""#,
    r#"server!="akamai""#,
    r#"server!="akamaighost""#,
    r#"server!="cloudfront""#,
    r#"server!="hwcdn""#,
    r#"server!="wangzhansheshi""#,
    r#"server!="360wzws""#,
    r#"server!="incapsula""#,
    r#"server!="stackpath""#,
    r#"server!="keycdn""#,
    r#"cloud_name!="cloudfront""#,
    r#"org!="CLOUDFLARENET""#,
    r#"server!="layun.com""#,
    r#"server!="*cdn*""#,
    r#"server!="Byte-nginx""#,
];

const AND: &str = " && ";

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("download failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("malformed {provider} list: {reason}")]
    Parse { provider: Provider, reason: String },
    #[error("{0} published an empty list")]
    Empty(Provider),
    #[error("cache file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// State of one provider's cached list.
#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub path: PathBuf,
    pub created: DateTime<Utc>,
    pub entries: usize,
    pub stale: bool,
}

pub struct ExclusionRuleCache {
    store: RuleStore,
    client: Arc<dyn WebClient>,
    ttl: TimeDelta,
    full_clause: OnceCell<String>,
}

impl ExclusionRuleCache {
    pub fn new(store: RuleStore, client: Arc<dyn WebClient>, ttl_days: i64) -> Self {
        Self {
            store,
            client,
            ttl: TimeDelta::days(ttl_days),
            full_clause: OnceCell::new(),
        }
    }

    /// The exclusion clause for one provider's address ranges.
    ///
    /// Never fails: an unavailable list yields the provider's header term alone.
    pub async fn exclusion_clause(&self, provider: Provider) -> String {
        match self.ip_list(provider).await {
            Ok(list) => build_clause(provider, &list),
            Err(e) => {
                warn!("{provider} ranges unavailable ({e}), falling back to header filter");
                provider.header_term().to_string()
            }
        }
    }

    /// Static exclusions followed by every provider clause, prefixed with `&&`
    /// so it can be appended directly to a field predicate.
    ///
    /// Resolved once per cache instance.
    pub async fn full_exclusion_clause(&self) -> String {
        self.full_clause
            .get_or_init(|| async {
                let mut terms: Vec<String> =
                    STATIC_EXCLUSIONS.iter().map(|t| t.to_string()).collect();
                for provider in Provider::ALL {
                    terms.push(self.exclusion_clause(provider).await);
                }
                format!("&& {}", terms.join(AND))
            })
            .await
            .clone()
    }

    async fn ip_list(&self, provider: Provider) -> Result<Vec<String>, RuleError> {
        match self.store.load(provider).await {
            Ok(Some(entry)) if entry.is_fresh(Utc::now(), self.ttl) => {
                debug!("Using cached {provider} ranges ({} entries)", entry.ip_list.len());
                return Ok(entry.ip_list);
            }
            Ok(Some(_)) => info!("Cached {provider} ranges expired, refreshing"),
            Ok(None) => info!("No cached {provider} ranges, downloading"),
            Err(e) => warn!("Ignoring unreadable {provider} cache: {e}"),
        }

        self.refresh(provider).await
    }

    /// Downloads the provider's list regardless of cache age and persists it.
    ///
    /// A list that was downloaded but could not be written is still returned.
    pub async fn refresh(&self, provider: Provider) -> Result<Vec<String>, RuleError> {
        let url = Url::parse(provider.source_url())
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let page = self.client.get(&url).await?;
        if !page.is_success() {
            return Err(FetchError::Status(page.status).into());
        }

        let entry = CacheEntry::new(provider.parse(&page.body)?);
        match self.store.save(provider, &entry).await {
            Ok(()) => info!("Saved {} {provider} ranges", entry.ip_list.len()),
            Err(e) => warn!("Could not persist {provider} ranges: {e}"),
        }

        Ok(entry.ip_list)
    }

    /// Cache details for `provider`, `None` when nothing usable is cached.
    pub async fn status(&self, provider: Provider) -> Option<CacheStatus> {
        let entry = self.store.load(provider).await.ok()??;
        Some(CacheStatus {
            path: self.store.path(provider),
            created: entry.create_time,
            entries: entry.ip_list.len(),
            stale: !entry.is_fresh(Utc::now(), self.ttl),
        })
    }
}

/// One negated `ip` term per range, ANDed with the provider's header term.
///
/// Entries that are not an address or CIDR block are skipped, since a cache
/// file edited by hand is spliced into the query verbatim.
pub fn build_clause(provider: Provider, ip_list: &[String]) -> String {
    ip_list
        .iter()
        .filter(|ip| is_ip_or_cidr(ip))
        .map(|ip| format!(r#"ip!="{ip}""#))
        .chain(std::iter::once(provider.header_term().to_string()))
        .collect::<Vec<String>>()
        .join(AND)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWeb;

    const CLOUDFLARE_BODY: &str = "173.245.48.0/20\n103.21.244.0/22\n";
    const CLOUDFRONT_BODY: &str = r#"{"CLOUDFRONT_GLOBAL_IP_LIST":["120.52.22.96/27"]}"#;

    async fn seeded_store(dir: &std::path::Path, provider: Provider, age_days: i64) -> RuleStore {
        let store = RuleStore::new(dir);
        let entry = CacheEntry {
            create_time: Utc::now() - TimeDelta::days(age_days),
            ip_list: vec!["10.0.0.0/8".to_string()],
        };
        store.save(provider, &entry).await.unwrap();
        store
    }

    #[tokio::test]
    async fn stale_cache_triggers_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path(), Provider::Cloudflare, 40).await;
        let web = Arc::new(FakeWeb::new().page(Provider::Cloudflare.source_url(), CLOUDFLARE_BODY));
        let cache = ExclusionRuleCache::new(store.clone(), web.clone(), 30);

        let clause = cache.exclusion_clause(Provider::Cloudflare).await;

        assert_eq!(web.get_count(), 1);
        assert_eq!(
            clause,
            r#"ip!="173.245.48.0/20" && ip!="103.21.244.0/22" && header!="cloudflare""#
        );
        let persisted = store.load(Provider::Cloudflare).await.unwrap().unwrap();
        assert_eq!(persisted.ip_list, vec!["173.245.48.0/20", "103.21.244.0/22"]);
        assert!(persisted.is_fresh(Utc::now(), TimeDelta::days(30)));
    }

    #[tokio::test]
    async fn fresh_cache_is_served_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path(), Provider::Cloudflare, 1).await;
        let web = Arc::new(FakeWeb::new().page(Provider::Cloudflare.source_url(), CLOUDFLARE_BODY));
        let cache = ExclusionRuleCache::new(store, web.clone(), 30);

        let clause = cache.exclusion_clause(Provider::Cloudflare).await;

        assert_eq!(web.get_count(), 0);
        assert_eq!(clause, r#"ip!="10.0.0.0/8" && header!="cloudflare""#);
    }

    #[tokio::test]
    async fn missing_cache_is_downloaded_and_created() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::new(dir.path().join("rules"));
        let web = Arc::new(FakeWeb::new().page(Provider::CloudFront.source_url(), CLOUDFRONT_BODY));
        let cache = ExclusionRuleCache::new(store.clone(), web.clone(), 30);

        let clause = cache.exclusion_clause(Provider::CloudFront).await;

        assert_eq!(clause, r#"ip!="120.52.22.96/27" && header!="cloudfront""#);
        assert!(store.path(Provider::CloudFront).is_file());
    }

    #[tokio::test]
    async fn failed_download_degrades_to_header_term() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::new(dir.path());
        let cache = ExclusionRuleCache::new(store.clone(), Arc::new(FakeWeb::new()), 30);

        let clause = cache.exclusion_clause(Provider::Cloudflare).await;

        assert_eq!(clause, r#"header!="cloudflare""#);
        assert!(store.load(Provider::Cloudflare).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn full_clause_combines_static_and_dynamic_terms_once() {
        let dir = tempfile::tempdir().unwrap();
        let web = Arc::new(
            FakeWeb::new()
                .page(Provider::Cloudflare.source_url(), CLOUDFLARE_BODY)
                .page(Provider::CloudFront.source_url(), "<html>maintenance</html>"),
        );
        let cache = ExclusionRuleCache::new(RuleStore::new(dir.path()), web.clone(), 30);

        let clause = cache.full_exclusion_clause().await;
        let again = cache.full_exclusion_clause().await;

        assert_eq!(clause, again);
        assert_eq!(web.get_count(), 2);
        assert!(clause.starts_with(r#"&& server!="cloudflare" && "#));
        for term in STATIC_EXCLUSIONS {
            assert!(clause.contains(term), "missing static term {term}");
        }
        assert!(clause.contains(r#"header!="cloudfront""#));
        assert!(!clause.contains("120.52.22.96"));
        assert!(clause.ends_with(
            r#"ip!="173.245.48.0/20" && ip!="103.21.244.0/22" && header!="cloudflare""#
        ));
    }

    #[tokio::test]
    async fn status_reports_staleness() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path(), Provider::CloudFront, 40).await;
        let cache = ExclusionRuleCache::new(store, Arc::new(FakeWeb::new()), 30);

        let status = cache.status(Provider::CloudFront).await.unwrap();
        assert!(status.stale);
        assert_eq!(status.entries, 1);
        assert!(cache.status(Provider::Cloudflare).await.is_none());
    }

    #[tokio::test]
    async fn edited_cache_entries_stay_out_of_the_query() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::new(dir.path());
        let entry = CacheEntry::new(vec![
            "10.0.0.0/8".to_string(),
            r#"1.2.3.4" || ip!="0.0.0.0/0"#.to_string(),
            "not-an-ip".to_string(),
        ]);
        store.save(Provider::Cloudflare, &entry).await.unwrap();
        let web = Arc::new(FakeWeb::new());
        let cache = ExclusionRuleCache::new(store, web.clone(), 30);

        let clause = cache.exclusion_clause(Provider::Cloudflare).await;

        assert_eq!(web.get_count(), 0);
        assert_eq!(clause, r#"ip!="10.0.0.0/8" && header!="cloudflare""#);
    }
}
