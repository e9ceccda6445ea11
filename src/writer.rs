//
// Copyright 2024 snote Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # Serialization.
//!
//! Turns a [`Plan`](crate::layout::Plan) into bytes and, optionally, onto
//! disk. Writing to a path is atomic: the full content is staged in a
//! temporary file in the destination directory and only renamed into
//! place once it has been flushed completely.

use std::convert::TryFrom;
use std::io::Write as _;
use std::path::Path;

use crate::document;
use crate::error::{Error, Result};
use crate::layout::Plan;
use crate::primitives;

pub struct Writer;

impl Writer {
    /// Serializes `plan` to an in-memory byte buffer.
    pub fn encode(plan: &Plan) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(document::FILETYPE_MARKER);
        out.extend_from_slice(document::SIGNATURE);

        for block in &plan.blocks {
            let encoded = primitives::encode_length_prefixed_block(&block.payload)?;
            out.extend_from_slice(&encoded);
        }

        out.extend_from_slice(document::TAIL_MARKER);
        let footer_address =
            u32::try_from(plan.footer_address).map_err(|_| Error::AddressOverflow)?;
        out.extend_from_slice(&primitives::write_u32_le(footer_address));

        Ok(out)
    }

    /// Serializes `plan` and writes it to `path` atomically: the bytes
    /// are staged in a temporary file next to `path` and only renamed
    /// into place once fully flushed, so a reader never observes a
    /// partially-written file.
    pub fn write_to_path(path: impl AsRef<Path>, plan: &Plan) -> Result<()> {
        let bytes = Self::encode(plan)?;
        let path = path.as_ref();
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));

        let mut staged = tempfile::NamedTempFile::new_in(dir)?;
        staged.write_all(&bytes)?;
        staged.flush()?;
        staged
            .persist(path)
            .map_err(|err| Error::Io(err.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document;
    use crate::layout::Layout;
    use crate::model::PageImage;

    fn one_page_paginated() -> Plan {
        let image = PageImage::new(vec![0u8; 16], 1404, 1872);
        Layout::plan_paginated("A5X", "en", false, "notes", 4096, &vec![image]).unwrap()
    }

    #[test]
    fn test_encode_preamble_and_trailer() {
        let plan = one_page_paginated();
        let bytes = Writer::encode(&plan).unwrap();

        assert_eq!(&bytes[0..4], document::FILETYPE_MARKER);
        assert_eq!(&bytes[4..24], document::SIGNATURE);

        let trailer = &bytes[bytes.len() - document::TRAILER_SIZE..];
        assert_eq!(&trailer[0..4], document::TAIL_MARKER);
        let footer_address = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);
        assert_eq!(footer_address as usize, plan.footer_address);
    }

    #[test]
    fn test_encode_length_matches_cursor() {
        let plan = one_page_paginated();
        let bytes = Writer::encode(&plan).unwrap();
        let last_block = plan.blocks.last().unwrap();
        let expected_len = last_block.address + 4 + last_block.payload.len() + document::TRAILER_SIZE;
        assert_eq!(bytes.len(), expected_len);
    }

    #[test]
    fn test_write_to_path_roundtrip() {
        let plan = one_page_paginated();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.note");

        Writer::write_to_path(&path, &plan).unwrap();

        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(on_disk, Writer::encode(&plan).unwrap());
    }
}
