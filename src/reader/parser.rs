//
// Copyright 2024 snote Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Low-level nom combinators over a `.note` byte slice.
//!
//! Unlike a self-describing format, blocks here are not read in a single
//! top-to-bottom pass: every block is found by following an address
//! discovered in some other block. These combinators parse one block at
//! a time at a caller-supplied offset; `reader::Reader` owns the
//! address-following logic.

use nom::{bytes::complete::tag, sequence::tuple, IResult};

use crate::document::{FILETYPE_MARKER, SIGNATURE};
use crate::primitives::length_prefixed_block;

/// Parses the fixed 24-byte preamble: file-type marker + signature.
pub fn preamble(input: &[u8]) -> IResult<&[u8], ()> {
    let (input, _) = tuple((tag(FILETYPE_MARKER), tag(SIGNATURE)))(input)?;
    Ok((input, ()))
}

/// Parses one length-prefixed block, returning its payload.
pub fn block(input: &[u8]) -> IResult<&[u8], &[u8]> {
    length_prefixed_block(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preamble_accepts_well_formed_input() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(FILETYPE_MARKER);
        bytes.extend_from_slice(SIGNATURE);
        bytes.extend_from_slice(b"rest");
        let (rest, ()) = preamble(&bytes).unwrap();
        assert_eq!(rest, b"rest");
    }

    #[test]
    fn test_preamble_rejects_wrong_marker() {
        let mut bytes = b"XXXX".to_vec();
        bytes.extend_from_slice(SIGNATURE);
        assert!(preamble(&bytes).is_err());
    }

    #[test]
    fn test_block_reads_length_prefixed_payload() {
        let mut bytes = vec![3, 0, 0, 0];
        bytes.extend_from_slice(b"abcXYZ");
        let (rest, payload) = block(&bytes).unwrap();
        assert_eq!(payload, b"abc");
        assert_eq!(rest, b"XYZ");
    }
}
