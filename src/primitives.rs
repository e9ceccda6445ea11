//
// Copyright 2024 snote Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # Byte primitives.
//!
//! The container addresses and block lengths are all unsigned 32-bit
//! values in little-endian byte order. This module provides the
//! reader/writer pair used throughout the layout planner, writer and
//! low-level block parser.

use nom::{
    IResult,
    bytes::complete::take,
    combinator::map,
    number::complete::le_u32,
};

use std::convert::TryFrom;

/// Parses a 4-byte little-endian length or address.
pub fn u32_le(input: &[u8]) -> IResult<&[u8], u32> {
    le_u32(input)
}

/// Parses a length-prefixed block: a 4-byte little-endian length followed
/// by that many bytes of payload.
pub fn length_prefixed_block(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, length) = u32_le(input)?;
    map(take(length as usize), |bytes: &[u8]| bytes)(input)
}

/// Serializes a `u32` as 4 little-endian bytes.
pub fn write_u32_le(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Serializes a length-prefixed block: the payload's length as a 4-byte
/// little-endian integer followed by the payload itself.
///
/// # Errors
///
/// Returns `Err` if the payload is longer than `u32::MAX` bytes.
pub fn encode_length_prefixed_block(payload: &[u8]) -> crate::error::Result<Vec<u8>> {
    let length = u32::try_from(payload.len()).map_err(|_| crate::error::Error::AddressOverflow)?;
    let mut out = Vec::with_capacity(4 + payload.len());
    out.extend_from_slice(&write_u32_le(length));
    out.extend_from_slice(payload);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u32_le_roundtrip() {
        let bytes = write_u32_le(0x01020304);
        let (rest, value) = u32_le(&bytes).unwrap();
        assert_eq!(rest.len(), 0);
        assert_eq!(value, 0x01020304);
    }

    #[test]
    fn test_length_prefixed_block() {
        let block = encode_length_prefixed_block(b"hello").unwrap();
        let (rest, payload) = length_prefixed_block(&block).unwrap();
        assert_eq!(rest.len(), 0);
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn test_length_prefixed_block_overrun() {
        let mut block = encode_length_prefixed_block(b"hello").unwrap();
        block.truncate(block.len() - 1);
        assert!(length_prefixed_block(&block).is_err());
    }
}
