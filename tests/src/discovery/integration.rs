#![cfg(test)]
use std::str::FromStr;
use std::sync::Arc;

use underlay_common::models::row::ResultRow;
use underlay_common::models::signal::SignalKind;
use underlay_common::target::Target;
use underlay_core::discovery::DiscoveryService;
use underlay_core::exclusion::{ExclusionRuleCache, Provider, RuleStore, STATIC_EXCLUSIONS};
use underlay_core::query::QueryBuilder;
use underlay_core::signals::SignalExtractor;

use crate::support::{ScriptedIndex, StaticWeb};

const CLOUDFRONT_LIST: &str = r#"{"CLOUDFRONT_GLOBAL_IP_LIST":["13.32.0.0/15","52.46.0.0/18"]}"#;
const CLOUDFLARE_LIST: &str = "173.245.48.0/20\n# comment\n\n103.21.244.0/22\n";

fn origin_row(ip: &str) -> ResultRow {
    ResultRow::new([ip, "443", "origin.example.com", "ACME Hosting", "US", "California", "San Jose"])
}

fn engine(rules_dir: &std::path::Path, web: StaticWeb, index: Arc<ScriptedIndex>) -> DiscoveryService {
    let web = Arc::new(web);
    let rules = ExclusionRuleCache::new(RuleStore::new(rules_dir), web.clone(), 30);
    DiscoveryService::new(
        SignalExtractor::new(web, index.clone()),
        QueryBuilder::new(Arc::new(rules)),
        index,
    )
}

/*************************************************************
                     End-to-end discovery
**************************************************************/

/// A host-only run against an index that repeats a row returns that row once,
/// and the query sent carries both static and provider exclusions.
#[tokio::test]
async fn host_run_deduplicates_index_rows() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let web = StaticWeb::new()
        .with_page(Provider::CloudFront.source_url(), CLOUDFRONT_LIST)
        .with_page(Provider::Cloudflare.source_url(), CLOUDFLARE_LIST);
    let index = Arc::new(ScriptedIndex::returning(vec![
        origin_row("203.0.113.10"),
        origin_row("203.0.113.10"),
    ]));
    let service = engine(dir.path(), web, index.clone());
    let target = Target::from_str("example.com").map_err(anyhow::Error::msg)?;

    let rows = service.discover(&target, &[SignalKind::Host]).await;

    assert_eq!(rows, vec![origin_row("203.0.113.10")]);

    let queries = index.seen();
    assert_eq!(queries.len(), 1);
    let plain = queries[0].plain();
    assert!(plain.starts_with(r#"host="example.com" && "#));
    for term in STATIC_EXCLUSIONS {
        assert!(plain.contains(term), "missing static term {term}");
    }
    assert!(plain.contains(r#"ip!="13.32.0.0/15" && ip!="52.46.0.0/18" && header!="cloudfront""#));
    assert!(plain.ends_with(r#"ip!="173.245.48.0/20" && ip!="103.21.244.0/22" && header!="cloudflare""#));

    assert!(dir.path().join("cloudfront.json").is_file());
    assert!(dir.path().join("cloudflare.json").is_file());
    Ok(())
}

/// With the provider lists unreachable the run still completes, using the
/// header-only exclusions.
#[tokio::test]
async fn unreachable_rule_sources_degrade_gracefully() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let index = Arc::new(ScriptedIndex::returning(vec![origin_row("198.51.100.7")]));
    let service = engine(dir.path(), StaticWeb::new(), index.clone());
    let target = Target::from_str("https://shop.example.com/").map_err(anyhow::Error::msg)?;

    let rows = service.discover(&target, &[SignalKind::Host]).await;

    assert_eq!(rows.len(), 1);
    let plain = index.seen()[0].plain().to_string();
    assert!(plain.starts_with(r#"host="shop.example.com" && "#));
    assert!(plain.ends_with(r#"header!="cloudfront" && header!="cloudflare""#));
    assert!(!plain.contains("ip!="));
    Ok(())
}

/// All three kinds run in order; the title lookup comes from the live page and
/// the favicon is hashed from the bytes served at the default location.
#[tokio::test]
async fn full_run_uses_every_signal_kind() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let web = StaticWeb::new()
        .with_page(Provider::CloudFront.source_url(), CLOUDFRONT_LIST)
        .with_page(Provider::Cloudflare.source_url(), CLOUDFLARE_LIST)
        .with_page("http://example.com/", "<html><title>Example Shop</title></html>")
        .with_page("http://example.com/favicon.ico", [0u8, 0, 1, 0]);
    let index = Arc::new(ScriptedIndex::returning(vec![origin_row("192.0.2.1")]));
    let service = engine(dir.path(), web, index.clone());
    let target = Target::from_str("example.com").map_err(anyhow::Error::msg)?;

    let rows = service.discover(&target, &[]).await;

    assert_eq!(rows, vec![origin_row("192.0.2.1")]);

    let discovery_predicates: Vec<String> = index
        .seen()
        .iter()
        .filter(|q| q.plain().contains(" && "))
        .map(|q| q.plain().split(" && ").next().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        discovery_predicates,
        vec![
            r#"host="example.com""#,
            r#"title="Example Shop""#,
            r#"icon_hash="-216455174""#,
        ]
    );
    Ok(())
}
