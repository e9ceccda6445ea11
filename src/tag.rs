//
// Copyright 2024 snote Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # Tag record codec.
//!
//! A block's payload is zero or more `<KEY:VALUE>` records concatenated
//! with no separator. The encoder emits records in caller-specified order
//! (order is load-bearing for byte-exact compatibility with device-
//! authored files); the decoder is order-agnostic and tolerates unknown
//! or duplicate keys.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// A single decoded `(key, value)` tag record.
pub type Tag = (String, String);

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<([^:>]+):([^>]*)>").expect("static tag pattern is valid"))
}

/// Encodes an ordered list of `(key, value)` records as `<KEY:VALUE>`
/// concatenated with no separator.
///
/// # Errors
///
/// Returns `Error::ForbiddenCharacterInValue` if any value contains `>`,
/// or `Error::ForbiddenCharacterInKey` if any key contains `:` or `>`.
pub fn encode<K, V>(records: &[(K, V)]) -> Result<Vec<u8>>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = String::new();
    for (key, value) in records {
        let key = key.as_ref();
        let value = value.as_ref();
        if key.contains(':') || key.contains('>') {
            return Err(Error::ForbiddenCharacterInKey);
        }
        if value.contains('>') {
            return Err(Error::ForbiddenCharacterInValue);
        }
        out.push('<');
        out.push_str(key);
        out.push(':');
        out.push_str(value);
        out.push('>');
    }
    Ok(out.into_bytes())
}

/// Decodes an ordered list of `(key, value)` records from a block's raw
/// payload bytes. Duplicate keys are preserved in the order encountered.
///
/// Malformed trailing bytes that don't match the record grammar simply
/// stop contributing further records; they do not make decoding fail,
/// matching the device-parser's forward-compatible tolerance for
/// trailing garbage or unknown extensions.
pub fn decode(bytes: &[u8]) -> Vec<Tag> {
    let text = String::from_utf8_lossy(bytes);
    tag_pattern()
        .captures_iter(&text)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

/// Looks up the first value for `key` among the decoded tags, if any.
pub fn find<'a>(tags: &'a [Tag], key: &str) -> Option<&'a str> {
    tags.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_simple() {
        let records = [("FILE_TYPE", "NOTE"), ("DEVICE_DPI", "0")];
        let bytes = encode(&records).unwrap();
        assert_eq!(bytes, b"<FILE_TYPE:NOTE><DEVICE_DPI:0>");
    }

    #[test]
    fn test_encode_rejects_forbidden_value() {
        let records = [("FILE_ID", "F1>2")];
        assert_eq!(encode(&records), Err(Error::ForbiddenCharacterInValue));
    }

    #[test]
    fn test_encode_rejects_forbidden_key() {
        let records = [("BAD:KEY", "x")];
        assert_eq!(encode(&records), Err(Error::ForbiddenCharacterInKey));
    }

    #[test]
    fn test_decode_preserves_order_and_duplicates() {
        let tags = decode(b"<PAGE1:100><PAGE2:200><PAGE1:999>");
        assert_eq!(
            tags,
            vec![
                ("PAGE1".to_string(), "100".to_string()),
                ("PAGE2".to_string(), "200".to_string()),
                ("PAGE1".to_string(), "999".to_string()),
            ]
        );
    }

    #[test]
    fn test_decode_empty_value() {
        let tags = decode(b"<DISABLE:>");
        assert_eq!(tags, vec![("DISABLE".to_string(), "".to_string())]);
    }

    #[test]
    fn test_decode_stops_at_malformed_record() {
        let tags = decode(b"<GOOD:1>not a tag<ALSO_GOOD:2>");
        assert_eq!(
            tags,
            vec![
                ("GOOD".to_string(), "1".to_string()),
                ("ALSO_GOOD".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_find() {
        let tags = decode(b"<A:1><B:2>");
        assert_eq!(find(&tags, "B"), Some("2"));
        assert_eq!(find(&tags, "C"), None);
    }
}
