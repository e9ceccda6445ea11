//
// Copyright 2024 snote Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The `.note` document object model.
//!
//! A [`Document`] owns an ordered list of [`Page`]s; each page owns its
//! background raster and, once read back from an existing file, its ink
//! layer bytes. [`Block`] and [`StyleEntry`] describe the wire-level
//! units the layout planner and reader operate over.

use std::path::{Path, PathBuf};

use crate::document::DeviceProfile;

/// Which of the two on-wire layouts a document uses.
///
/// The two shapes share every primitive (tag grammar, block framing,
/// address table) but differ in which tags are present and in what
/// order, per the header/footer/page-metadata builders in
/// `src/layout.rs`. There is no discriminator byte in the format itself;
/// a reader infers the shape from the presence of `pdfstyle` in the header.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Shape {
    /// Derived from a multi-page document (e.g. a rendered PDF).
    Paginated,
    /// Derived from a single raster template (e.g. a PNG background).
    ImageTemplate,
}

/// A background raster ready to embed, already at device resolution.
#[derive(Clone, Debug)]
pub struct PageImage {
    /// Exact bytes to embed verbatim; the codec never re-encodes these.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PageImage {
    pub fn new(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        PageImage { bytes, width, height }
    }
}

/// External collaborator supplying page-background rasters already
/// resized to device resolution.
///
/// Rendering a markdown/PDF source document to page images is out of
/// scope for this crate (spec.md §1); callers implement this trait over
/// whatever rasterizer they use and pass the result to [`crate::layout::Layout::plan`].
pub trait PageImageSource {
    fn pages(&self) -> &[PageImage];
}

impl PageImageSource for Vec<PageImage> {
    fn pages(&self) -> &[PageImage] {
        self
    }
}

impl PageImageSource for [PageImage] {
    fn pages(&self) -> &[PageImage] {
        self
    }
}

/// Whether a document requests realtime handwriting recognition.
#[derive(Copy, Clone, Eq, PartialEq, Debug, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeHint {
    Standard,
    Realtime,
}

impl Default for ShapeHint {
    fn default() -> Self {
        ShapeHint::Standard
    }
}

/// External collaborator supplying front-end authoring properties.
pub trait FrontmatterProvider {
    fn shape_hint(&self) -> ShapeHint;
    fn target_file_path(&self) -> Option<&Path>;
}

/// A concrete, deserializable implementation of [`FrontmatterProvider`]
/// for callers that source these properties from a small JSON/YAML
/// record rather than constructing one in code.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct Frontmatter {
    #[serde(default)]
    pub shape_hint: ShapeHint,
    #[serde(default)]
    pub target_file_path: Option<PathBuf>,
}

impl FrontmatterProvider for Frontmatter {
    fn shape_hint(&self) -> ShapeHint {
        self.shape_hint
    }

    fn target_file_path(&self) -> Option<&Path> {
        self.target_file_path.as_deref()
    }
}

/// One page of a document: an immutable background plus an optional ink
/// layer recovered by the reader. Pages are immutable once fingerprinted
/// by [`crate::layout::Layout::plan`].
#[derive(Clone, Debug)]
pub struct Page {
    /// 1-based page index.
    pub index: usize,
    /// Unique per-page identifier (`P` + timestamp + random suffix).
    pub page_id: String,
    /// Background raster bytes, embedded verbatim.
    pub background: Vec<u8>,
    /// MD5 hex digest of `background`.
    pub background_fingerprint: String,
    /// Ink layer bytes recovered from an existing file; `None` for a
    /// freshly planned document, which always carries the empty-layer
    /// constant for its main layer.
    pub ink: Option<Vec<u8>>,
}

/// A document about to be (or having been) encoded.
#[derive(Clone, Debug)]
pub struct Document {
    pub shape: Shape,
    pub device: DeviceProfile,
    pub device_name: String,
    pub language: String,
    pub file_id: String,
    pub realtime: bool,
    /// Base name of the source PDF/PNG template (no extension).
    pub source_name: String,
    /// Byte size of the original source document, if tracked (PDF byte
    /// size for the paginated shape; unused for the image-template shape).
    pub source_size: usize,
    pub pages: Vec<Page>,
}

/// The kind of wire block a [`Block`] represents, used by the reader to
/// label what it recovered.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BlockKind {
    Header,
    Page,
    Layer,
    Content,
    Footer,
}

/// A length-prefixed unit of the container, at a known absolute address.
#[derive(Clone, Debug)]
pub struct Block {
    pub kind: BlockKind,
    pub address: usize,
    pub payload: Vec<u8>,
}

impl Block {
    pub fn length(&self) -> usize {
        self.payload.len()
    }
}

/// A footer record whose key begins `style_`, pointing at a raster or
/// empty-layer RLE block used as a background.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StyleEntry {
    pub key: String,
    pub address: usize,
}

/// The trailing 8 bytes of every `.note` file: the `tail` marker
/// followed by the little-endian footer address.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct FileTrailer {
    pub footer_address: u32,
}
