//! Favicon hashing compatible with the search index's `icon_hash` field.
//!
//! The index hashes the MIME-style Base64 rendering of the icon: the standard
//! alphabet, a line break after every 76 characters and a final line break,
//! digested with 32-bit MurmurHash3 (x86, seed 0) and stored as a signed
//! integer. Any difference in this preprocessing yields a hash that matches
//! nothing.
//!
//! An encoding whose length is an exact multiple of 76 ends with a single line
//! break, not a break followed by an empty line. Appending an unconditional
//! trailing newline after wrapping would hash those icons differently.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const LINE_WIDTH: usize = 76;
const SEED: u32 = 0;

/// Computes the index-compatible hash of raw icon bytes.
pub fn icon_hash(bytes: &[u8]) -> i32 {
    let wrapped = wrap_base64(bytes);
    murmurhash3::murmurhash3_x86_32(wrapped.as_bytes(), SEED) as i32
}

fn wrap_base64(bytes: &[u8]) -> String {
    let encoded = STANDARD.encode(bytes);
    let mut wrapped = String::with_capacity(encoded.len() + encoded.len() / LINE_WIDTH + 1);

    // Base64 output is ASCII, so byte chunks are valid str boundaries.
    for line in encoded.as_bytes().chunks(LINE_WIDTH) {
        wrapped.push_str(std::str::from_utf8(line).unwrap_or_default());
        wrapped.push('\n');
    }
    if encoded.is_empty() {
        wrapped.push('\n');
    }

    wrapped
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
