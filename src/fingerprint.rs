//
// Copyright 2024 snote Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # Fingerprints and identifier generation.
//!
//! Style keys and header fields are derived from MD5 digests of raster
//! buffers, base64-encoded style identifiers, and timestamp-plus-random
//! file/page IDs.

use md5::{Digest, Md5};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the lowercase hex MD5 digest of `data`.
pub fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    let digest = hasher.finalize();
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}

/// Returns the standard base64 encoding (with padding) of `data`.
pub fn base64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Returns a 17-digit decimal timestamp, `YYYYMMDDHHMMSSfff` truncated to
/// 17 digits, matching the original device's `file_id`/`page_id` format.
fn timestamp_17_digits() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    // Nanosecond precision packed into a monotonically-increasing decimal
    // string wide enough to truncate to 17 digits, the way the original
    // `datetime.now().strftime("%Y%m%d%H%M%S%f")[:17]` truncates a
    // microsecond-precision timestamp.
    let combined = format!("{}{:09}", now.as_secs(), now.subsec_nanos());
    combined.chars().take(17).collect()
}

fn random_alphanumeric(rng: &mut impl Rng, count: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(count)
        .map(char::from)
        .collect()
}

/// Generates a unique per-file identifier: `F` + 17-digit timestamp + 15
/// random alphanumerics.
pub fn generate_file_id() -> String {
    let mut rng = rand::thread_rng();
    format!("F{}{}", timestamp_17_digits(), random_alphanumeric(&mut rng, 15))
}

/// Generates a unique per-page identifier: `P` + 17-digit timestamp + 15
/// random alphanumerics.
pub fn generate_page_id() -> String {
    let mut rng = rand::thread_rng();
    format!("P{}{}", timestamp_17_digits(), random_alphanumeric(&mut rng, 15))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_hex_known_vector() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_base64_encode_known_vector() {
        assert_eq!(base64_encode(b"hello"), "aGVsbG8=");
    }

    #[test]
    fn test_file_id_shape() {
        let id = generate_file_id();
        assert!(id.starts_with('F'));
        assert_eq!(id.len(), 1 + 17 + 15);
        assert!(id[1..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_page_id_shape() {
        let id = generate_page_id();
        assert!(id.starts_with('P'));
        assert_eq!(id.len(), 1 + 17 + 15);
    }

    #[test]
    fn test_ids_are_distinct() {
        assert_ne!(generate_file_id(), generate_file_id());
        assert_ne!(generate_page_id(), generate_page_id());
    }
}
