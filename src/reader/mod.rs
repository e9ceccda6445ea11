//
// Copyright 2024 snote Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # Deserialization.
//!
//! A [`Reader`] borrows nothing and owns the whole file in memory; every
//! lookup follows an address pulled from a previously-decoded tag record
//! rather than scanning for a recognizable signature, so a reader never
//! has to guess where a block starts.

mod parser;

use std::path::Path;

use crate::document::{self, LayerName};
use crate::error::{Error, Result};
use crate::model::Shape;
use crate::tag::{self, Tag};

pub struct Reader {
    bytes: Vec<u8>,
    footer_address: usize,
    shape: Shape,
}

impl Reader {
    /// Reads and validates the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Reader> {
        let bytes = std::fs::read(path)?;
        Reader::from_bytes(bytes)
    }

    /// Validates an in-memory byte buffer as a `.note` container.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedHeader` if the preamble is missing or
    /// wrong, `Error::MalformedTrailer` if the trailing `tail` marker or
    /// footer address is missing, invalid, or inconsistent with the
    /// header's declared shape, and `Error::MalformedAddress` if the
    /// header or footer address does not point at a parseable block.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Reader> {
        parser::preamble(&bytes).map_err(|_| Error::MalformedHeader)?;

        if bytes.len() < document::PREAMBLE_SIZE + document::TRAILER_SIZE {
            return Err(Error::MalformedTrailer);
        }
        let trailer_start = bytes.len() - document::TRAILER_SIZE;
        let trailer = &bytes[trailer_start..];
        let marker_len = document::TAIL_MARKER.len();
        if &trailer[..marker_len] != document::TAIL_MARKER {
            return Err(Error::MalformedTrailer);
        }
        let addr = &trailer[marker_len..];
        let footer_address = u32::from_le_bytes([addr[0], addr[1], addr[2], addr[3]]) as usize;

        let header_tags = Self::tags_at(&bytes, document::PREAMBLE_SIZE)?;
        let footer_tags = Self::tags_at(&bytes, footer_address)?;

        let header_has_pdfstyle = tag::find(&header_tags, "PDFSTYLE").is_some();
        let footer_has_pdfstylelist = tag::find(&footer_tags, "PDFSTYLELIST").is_some();
        if header_has_pdfstyle != footer_has_pdfstylelist {
            return Err(Error::MalformedTrailer);
        }

        let shape = if header_has_pdfstyle { Shape::Paginated } else { Shape::ImageTemplate };

        Ok(Reader { bytes, footer_address, shape })
    }

    fn payload_at(bytes: &[u8], address: usize) -> Result<&[u8]> {
        let slice = bytes
            .get(address..)
            .ok_or(Error::MalformedAddress { offset: address })?;
        let (_, payload) =
            parser::block(slice).map_err(|_| Error::MalformedAddress { offset: address })?;
        Ok(payload)
    }

    fn tags_at(bytes: &[u8], address: usize) -> Result<Vec<Tag>> {
        Ok(tag::decode(Self::payload_at(bytes, address)?))
    }

    /// Which on-wire shape this file uses, inferred from the header.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Decoded tag records of the header block.
    pub fn header(&self) -> Result<Vec<Tag>> {
        Self::tags_at(&self.bytes, document::PREAMBLE_SIZE)
    }

    /// Decoded tag records of the footer block.
    pub fn footer(&self) -> Result<Vec<Tag>> {
        Self::tags_at(&self.bytes, self.footer_address)
    }

    /// Number of pages: 1 for an image-template file, or the count of
    /// contiguous `PAGE<n>` entries in the footer for a paginated file.
    pub fn num_pages(&self) -> Result<usize> {
        match self.shape {
            Shape::ImageTemplate => Ok(1),
            Shape::Paginated => {
                let footer = self.footer()?;
                let mut n = 0;
                while tag::find(&footer, &format!("PAGE{}", n + 1)).is_some() {
                    n += 1;
                }
                Ok(n)
            }
        }
    }

    /// Decoded tag records of the 1-based page's metadata block.
    pub fn page(&self, page_num: usize) -> Result<Vec<Tag>> {
        let footer = self.footer()?;
        let address = tag::find(&footer, &format!("PAGE{}", page_num))
            .ok_or(Error::NoSuchPage(page_num))?
            .parse::<usize>()
            .map_err(|_| Error::NoSuchPage(page_num))?;
        Self::tags_at(&self.bytes, address)
    }

    /// Raw content bytes of a named layer on a page: the device-authored
    /// raster for `Background`, or run-length ink bytes otherwise.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoSuchLayer` if the page has no address on record
    /// for this layer (always true for `Aux1`/`Aux2`/`Aux3` in files this
    /// crate writes).
    pub fn layer(&self, page_num: usize, layer: LayerName) -> Result<Vec<u8>> {
        let page_tags = self.page(page_num)?;
        let layer_meta_address = tag::find(&page_tags, layer.wire_name())
            .and_then(|addr| addr.parse::<usize>().ok())
            .filter(|addr| *addr != 0)
            .ok_or(Error::NoSuchLayer)?;

        let layer_tags = Self::tags_at(&self.bytes, layer_meta_address)?;
        let content_address = tag::find(&layer_tags, "LAYERBITMAP")
            .and_then(|addr| addr.parse::<usize>().ok())
            .ok_or(Error::NoSuchLayer)?;

        Self::payload_at(&self.bytes, content_address).map(|payload| payload.to_vec())
    }

    /// The footer's style table: every entry whose key begins `STYLE_`
    /// (including the shared default-style entry), as `(key, address)`
    /// pairs in the order they were written.
    pub fn styles(&self) -> Result<Vec<(String, usize)>> {
        let footer = self.footer()?;
        Ok(footer
            .into_iter()
            .filter(|(key, _)| key.starts_with("STYLE_"))
            .filter_map(|(key, value)| value.parse::<usize>().ok().map(|address| (key, address)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;
    use crate::model::PageImage;
    use crate::writer::Writer;

    fn paginated_bytes(num_pages: usize) -> Vec<u8> {
        let images: Vec<PageImage> = (0..num_pages)
            .map(|i| PageImage::new(vec![i as u8; 32], 1404, 1872))
            .collect();
        let plan = Layout::plan_paginated("A5X", "en", false, "notes", 4096, &images).unwrap();
        Writer::encode(&plan).unwrap()
    }

    #[test]
    fn test_open_roundtrips_paginated_shape_and_page_count() {
        let bytes = paginated_bytes(2);
        let reader = Reader::from_bytes(bytes).unwrap();
        assert_eq!(reader.shape(), Shape::Paginated);
        assert_eq!(reader.num_pages().unwrap(), 2);
    }

    #[test]
    fn test_page_and_layer_lookup() {
        let bytes = paginated_bytes(1);
        let reader = Reader::from_bytes(bytes).unwrap();
        let background = reader.layer(1, LayerName::Background).unwrap();
        assert_eq!(background, vec![0u8; 32]);

        let main = reader.layer(1, LayerName::Main).unwrap();
        assert_eq!(main, document::empty_layer_rle());

        assert_eq!(reader.layer(1, LayerName::Aux1), Err(Error::NoSuchLayer));
    }

    #[test]
    fn test_image_template_shape() {
        let image = PageImage::new(vec![7u8; 32], 1404, 1872);
        let plan = Layout::plan_image_template("A5X", "en", false, "my-template", &image).unwrap();
        let bytes = Writer::encode(&plan).unwrap();
        let reader = Reader::from_bytes(bytes).unwrap();
        assert_eq!(reader.shape(), Shape::ImageTemplate);
        assert_eq!(reader.num_pages().unwrap(), 1);
    }

    #[test]
    fn test_rejects_truncated_footer_address() {
        let mut bytes = paginated_bytes(1);
        let len = bytes.len();
        bytes[len - 1] = 0xFF;
        bytes[len - 2] = 0xFF;
        bytes[len - 3] = 0xFF;
        bytes[len - 4] = 0xFF;
        assert!(matches!(Reader::from_bytes(bytes), Err(Error::MalformedAddress { .. })));
    }

    #[test]
    fn test_rejects_bad_preamble() {
        let mut bytes = paginated_bytes(1);
        bytes[0] = b'X';
        assert!(matches!(Reader::from_bytes(bytes), Err(Error::MalformedHeader)));
    }
}
