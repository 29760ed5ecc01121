#![cfg(test)]
use std::fs;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use serde_json::json;
use underlay_core::exclusion::{ExclusionRuleCache, Provider, RuleStore};

use crate::support::StaticWeb;

/*************************************************************
                     Rule cache lifecycle
**************************************************************/

fn write_cache(dir: &std::path::Path, provider: Provider, age_days: i64, ranges: &[&str]) {
    let entry = json!({
        "create_time": (Utc::now() - TimeDelta::days(age_days)).to_rfc3339(),
        "ip_list": ranges,
    });
    fs::write(dir.join(provider.cache_file()), entry.to_string()).unwrap();
}

#[tokio::test]
async fn expired_cache_is_replaced_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    write_cache(dir.path(), Provider::Cloudflare, 45, &["10.0.0.0/8"]);
    let web = Arc::new(StaticWeb::new().with_page(Provider::Cloudflare.source_url(), "1.1.1.0/24\n"));
    let cache = ExclusionRuleCache::new(RuleStore::new(dir.path()), web.clone(), 30);

    let clause = cache.exclusion_clause(Provider::Cloudflare).await;

    assert_eq!(clause, r#"ip!="1.1.1.0/24" && header!="cloudflare""#);
    assert_eq!(web.fetched(), vec![Provider::Cloudflare.source_url().to_string()]);

    let status = cache.status(Provider::Cloudflare).await.unwrap();
    assert!(!status.stale);
    assert_eq!(status.entries, 1);
}

#[tokio::test]
async fn cache_written_by_another_process_is_reused() {
    let dir = tempfile::tempdir().unwrap();
    write_cache(dir.path(), Provider::CloudFront, 2, &["13.32.0.0/15"]);
    let web = Arc::new(StaticWeb::new());
    let cache = ExclusionRuleCache::new(RuleStore::new(dir.path()), web.clone(), 30);

    let clause = cache.exclusion_clause(Provider::CloudFront).await;

    assert_eq!(clause, r#"ip!="13.32.0.0/15" && header!="cloudfront""#);
    assert!(web.fetched().is_empty());
}

#[tokio::test]
async fn forced_refresh_ignores_cache_age() {
    let dir = tempfile::tempdir().unwrap();
    write_cache(dir.path(), Provider::Cloudflare, 1, &["10.0.0.0/8"]);
    let web = Arc::new(StaticWeb::new().with_page(Provider::Cloudflare.source_url(), "1.1.1.0/24\n"));
    let cache = ExclusionRuleCache::new(RuleStore::new(dir.path()), web, 30);

    let list = cache.refresh(Provider::Cloudflare).await.unwrap();

    assert_eq!(list, vec!["1.1.1.0/24"]);
    let stored: serde_json::Value =
        serde_json::from_slice(&fs::read(dir.path().join("cloudflare.json")).unwrap()).unwrap();
    assert_eq!(stored["ip_list"], json!(["1.1.1.0/24"]));
}
