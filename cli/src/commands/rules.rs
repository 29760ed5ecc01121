use std::sync::Arc;

use colored::*;
use tracing::{error, info};
use underlay_common::config::Config;
use underlay_common::dirs;
use underlay_core::exclusion::{ExclusionRuleCache, Provider, RuleStore};
use underlay_core::http::{HttpWebClient, TlsPolicy};
use underlay_core::ports::WebClient;

use crate::terminal::{format::Detail, print};
use crate::uprint;

pub async fn rules(refresh: bool, cfg: &Config) -> anyhow::Result<()> {
    let web: Arc<dyn WebClient> = Arc::new(HttpWebClient::new(
        cfg.request_timeout,
        cfg.probe_timeout,
        TlsPolicy::Verify,
    )?);
    let cache = ExclusionRuleCache::new(RuleStore::new(dirs::get_rules_dir()?), web, cfg.rule_ttl_days);

    if refresh {
        for provider in Provider::ALL {
            match cache.refresh(provider).await {
                Ok(list) => info!("Refreshed {provider}: {} ranges", list.len()),
                Err(e) => error!("Refreshing {provider} failed: {e}"),
            }
        }
        uprint!();
    }

    for (idx, provider) in Provider::ALL.into_iter().enumerate() {
        print::tree_head(idx, provider.name());
        print::as_tree_one_level(status_details(&cache, provider).await);
    }

    Ok(())
}

async fn status_details(cache: &ExclusionRuleCache, provider: Provider) -> Vec<Detail> {
    let Some(status) = cache.status(provider).await else {
        return vec![
            ("State".to_string(), "not cached".red()),
            ("Source".to_string(), provider.source_url().normal()),
        ];
    };

    let state = if status.stale { "stale".yellow() } else { "fresh".green() };
    vec![
        ("State".to_string(), state),
        ("Entries".to_string(), status.entries.to_string().bold()),
        (
            "Created".to_string(),
            status.created.format("%Y-%m-%d %H:%M:%S UTC").to_string().normal(),
        ),
        ("Path".to_string(), status.path.display().to_string().normal()),
    ]
}
