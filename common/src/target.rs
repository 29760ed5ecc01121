//! # Discovery Target Model
//!
//! Normalises the identifier handed to the engine, which can be:
//! * A bare host (e.g., `example.com`, `example.com:8443`).
//! * A host with a path (e.g., `example.com/login`).
//! * A full URL (e.g., `https://example.com/`).

use std::fmt;
use std::str::FromStr;

use url::Url;

const HTTP: &str = "http://";
const HTTPS: &str = "https://";

/// The site whose origin address is being looked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    input: String,
    host: String,
    explicit_scheme: bool,
}

impl FromStr for Target {
    type Err = String;

    /// Parses a host or URL into a `Target`.
    ///
    /// Inputs without a scheme are read as `http://` for the purpose of
    /// extracting the authority; the scheme itself is decided at fetch time.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err("target cannot be empty".to_string());
        }

        let explicit_scheme = has_web_scheme(input);
        let url = if explicit_scheme {
            Url::parse(input)
        } else {
            Url::parse(&format!("{HTTP}{input}"))
        }
        .map_err(|e| format!("invalid target '{input}': {e}"))?;

        let host = authority(&url).ok_or_else(|| format!("target has no host: {input}"))?;

        Ok(Self {
            input: input.to_string(),
            host,
            explicit_scheme,
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.input)
    }
}

impl Target {
    /// Host and, when present, non-default port of the target.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The identifier exactly as supplied.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// URLs to try, in order, when fetching the live page.
    ///
    /// A scheme given by the caller is honoured as-is. Otherwise plain HTTP is
    /// tried first with HTTPS as the fallback.
    pub fn page_urls(&self) -> Vec<Url> {
        let candidates: Vec<String> = if self.explicit_scheme {
            vec![self.input.clone()]
        } else {
            vec![format!("{HTTP}{}", self.input), format!("{HTTPS}{}", self.input)]
        };

        candidates
            .iter()
            .filter_map(|raw| Url::parse(raw).ok())
            .collect()
    }

    /// File-system safe rendering of the host, used for per-target log files.
    pub fn file_stem(&self) -> String {
        self.host.replace(':', "_")
    }
}

fn has_web_scheme(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    lower.starts_with(HTTP) || lower.starts_with(HTTPS)
}

fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    match url.port() {
        Some(port) => Some(format!("{host}:{port}")),
        None => Some(host.to_string()),
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
