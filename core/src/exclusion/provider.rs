use std::fmt;
use std::net::IpAddr;

use serde::Deserialize;
use tracing::warn;

use super::RuleError;

/// A CDN whose published address ranges are excluded from discovery queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    CloudFront,
    Cloudflare,
}

#[derive(Deserialize)]
struct CloudFrontIps {
    #[serde(rename = "CLOUDFRONT_GLOBAL_IP_LIST")]
    global: Vec<String>,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::CloudFront, Provider::Cloudflare];

    pub fn name(&self) -> &'static str {
        match self {
            Provider::CloudFront => "CloudFront",
            Provider::Cloudflare => "Cloudflare",
        }
    }

    /// Authoritative list of the provider's edge ranges.
    pub fn source_url(&self) -> &'static str {
        match self {
            Provider::CloudFront => "https://d7uri8nf7uskq.cloudfront.net/tools/list-cloudfront-ips",
            Provider::Cloudflare => "https://www.cloudflare.com/ips-v4",
        }
    }

    pub fn cache_file(&self) -> &'static str {
        match self {
            Provider::CloudFront => "cloudfront.json",
            Provider::Cloudflare => "cloudflare.json",
        }
    }

    /// Header-based exclusion, also used alone when the list is unavailable.
    pub fn header_term(&self) -> &'static str {
        match self {
            Provider::CloudFront => r#"header!="cloudfront""#,
            Provider::Cloudflare => r#"header!="cloudflare""#,
        }
    }

    /// Extracts the address ranges from a downloaded source document.
    pub fn parse(&self, body: &[u8]) -> Result<Vec<String>, RuleError> {
        let list = match self {
            Provider::CloudFront => {
                let doc: CloudFrontIps =
                    serde_json::from_slice(body).map_err(|e| RuleError::Parse {
                        provider: *self,
                        reason: e.to_string(),
                    })?;
                doc.global
                    .into_iter()
                    .map(|cidr| cidr.trim().to_string())
                    .filter(|cidr| !cidr.is_empty())
                    .collect::<Vec<String>>()
            }
            Provider::Cloudflare => String::from_utf8_lossy(body)
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect(),
        };

        let (valid, rejected): (Vec<String>, Vec<String>) =
            list.into_iter().partition(|entry| is_ip_or_cidr(entry));
        if !rejected.is_empty() {
            warn!("Dropped {} malformed {self} entries", rejected.len());
        }

        if valid.is_empty() {
            return Err(RuleError::Empty(*self));
        }
        Ok(valid)
    }
}

/// An address, optionally followed by a prefix length valid for its family.
///
/// Anything else could not be embedded safely in an `ip!=` term.
pub fn is_ip_or_cidr(entry: &str) -> bool {
    let (addr, prefix) = match entry.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (entry, None),
    };
    let Ok(addr) = addr.parse::<IpAddr>() else {
        return false;
    };
    let max = if addr.is_ipv4() { 32 } else { 128 };

    match prefix {
        None => true,
        Some(bits) => bits.parse::<u8>().is_ok_and(|bits| bits <= max),
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cloudfront_global_list() {
        let body = br#"{
            "CLOUDFRONT_GLOBAL_IP_LIST": ["120.52.22.96/27", "205.251.249.0/24"],
            "CLOUDFRONT_REGIONAL_EDGE_IP_LIST": ["13.113.196.64/26"]
        }"#;

        let list = Provider::CloudFront.parse(body).unwrap();

        assert_eq!(list, vec!["120.52.22.96/27", "205.251.249.0/24"]);
    }

    #[test]
    fn parses_cloudflare_plaintext() {
        let body = b"# published ranges\n173.245.48.0/20\n\n103.21.244.0/22\r\n  # trailing comment\n";

        let list = Provider::Cloudflare.parse(body).unwrap();

        assert_eq!(list, vec!["173.245.48.0/20", "103.21.244.0/22"]);
    }

    #[test]
    fn rejects_malformed_or_empty_sources() {
        assert!(matches!(
            Provider::CloudFront.parse(b"<html>busy</html>"),
            Err(RuleError::Parse { .. })
        ));
        assert!(matches!(
            Provider::CloudFront.parse(br#"{"CLOUDFRONT_GLOBAL_IP_LIST": []}"#),
            Err(RuleError::Empty(Provider::CloudFront))
        ));
        assert!(matches!(
            Provider::Cloudflare.parse(b"# nothing here\n\n"),
            Err(RuleError::Empty(Provider::Cloudflare))
        ));
    }

    #[test]
    fn entries_that_are_not_addresses_are_dropped() {
        let body = b"173.245.48.0/20\n1.2.3.0/24\" || ip=\"x\n10.0.0.0/33\n2400:cb00::/32\n8.8.8.8\n";

        let list = Provider::Cloudflare.parse(body).unwrap();

        assert_eq!(list, vec!["173.245.48.0/20", "2400:cb00::/32", "8.8.8.8"]);
    }

    #[test]
    fn address_validation() {
        assert!(is_ip_or_cidr("13.32.0.0/15"));
        assert!(is_ip_or_cidr("2600:9000::/28"));
        assert!(!is_ip_or_cidr("13.32.0.0/"));
        assert!(!is_ip_or_cidr("::/129"));
        assert!(!is_ip_or_cidr("example.com"));
        assert!(!is_ip_or_cidr(r#"1.1.1.1" || host="x"#));
    }
}
