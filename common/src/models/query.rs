use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// A query in plain text together with the Base64 form the index expects in
/// its `qbase64` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    plain: String,
    encoded: String,
}

impl Query {
    pub fn new(plain: impl Into<String>) -> Self {
        let plain = plain.into();
        let encoded = STANDARD.encode(plain.as_bytes());
        Self { plain, encoded }
    }

    pub fn plain(&self) -> &str {
        &self.plain
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}
