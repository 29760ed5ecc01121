use std::fmt;
use std::str::FromStr;

/// The family of identification signal to derive from a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Host,
    Title,
    Icon,
}

impl SignalKind {
    /// Every kind, in the order a default run processes them.
    pub const ALL: [SignalKind; 3] = [SignalKind::Host, SignalKind::Title, SignalKind::Icon];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Host => "host",
            SignalKind::Title => "title",
            SignalKind::Icon => "icon",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "host" => Ok(SignalKind::Host),
            "title" => Ok(SignalKind::Title),
            "icon" => Ok(SignalKind::Icon),
            other => Err(format!("unknown signal kind: {other}")),
        }
    }
}

/// A value that identifies the target independently of the CDN in front of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Host(String),
    Title(String),
    IconHash(i32),
}

impl Signal {
    /// The field predicate matching this signal, e.g. `host="example.com"`.
    pub fn predicate(&self) -> String {
        match self {
            Signal::Host(host) => format!(r#"host="{}""#, escape(host)),
            Signal::Title(title) => format!(r#"title="{}""#, escape(title)),
            Signal::IconHash(hash) => format!(r#"icon_hash="{hash}""#),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Host(host) => write!(f, "host {host}"),
            Signal::Title(title) => write!(f, "title {title}"),
            Signal::IconHash(hash) => write!(f, "favicon hash {hash}"),
        }
    }
}

// Quotes inside a value would terminate the predicate early.
fn escape(value: &str) -> String {
    value.replace('\\', r"\\").replace('"', r#"\""#)
}
