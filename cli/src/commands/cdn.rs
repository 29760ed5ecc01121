use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::Local;
use colored::*;
use serde_json::Value;
use tracing::{info, warn};
use underlay_common::config::{Config, Credentials};
use underlay_common::dirs;
use underlay_common::models::row::{DISCOVERY_FIELDS, ResultRow};
use underlay_common::models::signal::SignalKind;
use underlay_common::target::Target;
use underlay_core::discovery::DiscoveryService;
use underlay_core::exclusion::{ExclusionRuleCache, RuleStore};
use underlay_core::http::{HttpWebClient, TlsPolicy};
use underlay_core::ports::{SearchIndex, WebClient};
use underlay_core::query::QueryBuilder;
use underlay_core::search::FofaClient;
use underlay_core::signals::SignalExtractor;

use crate::commands::CdnArgs;
use crate::terminal::{colors, format, print, spinner};
use crate::uprint;

const LOG_DIR: &str = "logs";
const KEY_WIDTH: usize = 7;

pub async fn cdn(args: CdnArgs, cfg: &Config) -> anyhow::Result<()> {
    let credentials = Credentials::load(args.email, args.key)?;
    let service = build_service(credentials, cfg)?;

    let kinds: Vec<SignalKind> = if args.pattern.is_empty() {
        SignalKind::ALL.to_vec()
    } else {
        args.pattern
    };
    if cfg.quiet == 0 {
        let signals = kinds.iter().map(SignalKind::as_str).collect::<Vec<_>>().join(", ");
        print::aligned_line("Target", KEY_WIDTH, args.url.host().color(colors::HOSTNAME));
        print::aligned_line("Signals", KEY_WIDTH, signals);
        uprint!();
    }

    spinner::report_stage(&format!("Looking for the origin of {}", args.url.host()));
    let start_time = Instant::now();
    let rows = service.discover(&args.url, &kinds).await;
    spinner::finish();

    if args.log {
        match append_log(Path::new(LOG_DIR), &args.url, &kinds, &rows) {
            Ok(path) => info!("Results appended to {}", path.display()),
            Err(e) => warn!("Could not write result log: {e:#}"),
        }
    }

    if args.json {
        let json = Value::Array(rows.iter().map(|row| row.to_json(&DISCOVERY_FIELDS)).collect());
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    discovery_ends(&rows, start_time.elapsed(), cfg);
    Ok(())
}

/// Wires the reqwest adapters into the discovery service.
///
/// Only target pages and icons go through the lenient client; the index
/// account and the exclusion downloads use a validating one.
fn build_service(credentials: Credentials, cfg: &Config) -> anyhow::Result<DiscoveryService> {
    let (trusted, target_web) = http_clients(cfg)?;
    let target_web: Arc<dyn WebClient> = Arc::new(target_web);

    let index: Arc<dyn SearchIndex> = Arc::new(FofaClient::new(
        trusted.client().clone(),
        cfg.api_url.as_str(),
        credentials,
        cfg.result_size,
    ));

    let rules = ExclusionRuleCache::new(
        RuleStore::new(dirs::get_rules_dir()?),
        Arc::new(trusted),
        cfg.rule_ttl_days,
    );

    Ok(DiscoveryService::new(
        SignalExtractor::new(target_web, index.clone()),
        QueryBuilder::new(Arc::new(rules)),
        index,
    ))
}

/// The validating client and the target-facing client, in that order.
fn http_clients(cfg: &Config) -> anyhow::Result<(HttpWebClient, HttpWebClient)> {
    let trusted = HttpWebClient::new(cfg.request_timeout, cfg.probe_timeout, TlsPolicy::Verify)?;
    let target = HttpWebClient::new(cfg.request_timeout, cfg.probe_timeout, TlsPolicy::AcceptInvalid)?;
    Ok((trusted, target))
}

fn discovery_ends(rows: &[ResultRow], total_time: Duration, cfg: &Config) {
    if rows.is_empty() {
        print::header("no origin candidates", cfg.quiet);
        print::no_results();
        return;
    }

    if cfg.quiet > 0 {
        uprint!();
    }

    print::header("origin candidates", cfg.quiet);
    print_rows(rows, cfg);
    print_summary(rows.len(), total_time, cfg);
}

fn print_rows(rows: &[ResultRow], cfg: &Config) {
    for (idx, row) in rows.iter().enumerate() {
        match cfg.quiet {
            2 => print::print(&format::row_title(row, &DISCOVERY_FIELDS)),
            _ => {
                print::tree_head(idx, &format::row_title(row, &DISCOVERY_FIELDS));
                print::as_tree_one_level(format::row_details(row, &DISCOVERY_FIELDS));
                if idx + 1 != rows.len() {
                    uprint!();
                }
            }
        }
    }
}

fn print_summary(count: usize, total_time: Duration, cfg: &Config) {
    let candidates = format!("{count} candidate hosts").bold().green();
    let total_time = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output = format!("Discovery complete: {candidates} found in {total_time}")
        .color(colors::TEXT_DEFAULT)
        .to_string();

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        1 => {
            uprint!();
            print::print(&format!("{} {output}", "[+]".green().bold()));
        }
        _ => {}
    }
}

/// Appends a timestamped block of tab-separated rows to `<dir>/<host>.log`.
fn append_log(
    dir: &Path,
    target: &Target,
    kinds: &[SignalKind],
    rows: &[ResultRow],
) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(format!("{}.log", target.file_stem()));

    let mut block = format!(
        "[{}] {} ({}) {} results\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        target.host(),
        kinds.iter().map(SignalKind::as_str).collect::<Vec<_>>().join(","),
        rows.len()
    );
    for row in rows {
        block.push_str(&row.values().join("\t"));
        block.push('\n');
    }
    block.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))?;
    file.write_all(block.as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;

    Ok(path)
}
