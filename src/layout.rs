//
// Copyright 2024 snote Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # Layout planner.
//!
//! Computes the absolute address of every block in the file in a single
//! forward pass, because tags must reference addresses of blocks that
//! appear later in the stream. Each tag payload only ever references
//! addresses computed in an earlier step (header and style-list tags
//! reference no addresses at all; layer metadata references content
//! addresses already reserved; page metadata references layer metadata
//! addresses already reserved; the footer references everything else) so
//! the single forward pass in `plan_paginated`/`plan_image_template`
//! never needs to guess a payload's length before building it.

use crate::document::{self, DeviceProfile, LayerName, LAYER_PROTOCOL_RLE, LAYER_TYPE_NOTE, PREAMBLE_SIZE};
use crate::error::{Error, Result};
use crate::fingerprint::{base64_encode, generate_file_id, generate_page_id, md5_hex};
use crate::model::{Block, BlockKind, Document, Page, PageImage, PageImageSource, Shape};
use crate::tag;

/// The default-style footer entry written to every paginated file,
/// pointing at the shared empty-layer RLE block.
const DEFAULT_STYLE_KEY: &str = "STYLE_style_white_a5x2";

/// Result of planning: the document metadata plus every block in the
/// exact order it must be written, already carrying its resolved address.
pub struct Plan {
    pub document: Document,
    pub blocks: Vec<Block>,
    pub footer_address: usize,
}

pub struct Layout;

impl Layout {
    /// Plans a paginated-shape document (one page per entry in `images`,
    /// derived from a multi-page source such as a rendered PDF).
    pub fn plan_paginated(
        device_name: &str,
        language: &str,
        realtime: bool,
        source_name: &str,
        source_size: usize,
        images: &dyn PageImageSource,
    ) -> Result<Plan> {
        let device = document::device_profile(device_name)?;
        let pages = images.pages();
        if pages.is_empty() {
            return Err(Error::Message("a document must have at least one page".to_string()));
        }
        for image in pages {
            check_dimensions(&device, image)?;
        }

        let page_fingerprints: Vec<String> =
            pages.iter().map(|image| md5_hex(&image.bytes)).collect();
        let num_pages = pages.len();
        let file_id = generate_file_id();

        let mut cursor = PREAMBLE_SIZE;

        // Step 2: header. The header references no block address, only
        // counts and fingerprints known up front, so it can be built
        // before any other block is reserved.
        let pdfstylemd5_fingerprint = page_fingerprints.last().cloned().unwrap_or_default();
        let header_tags = header_tags_paginated(
            &device,
            num_pages,
            &file_id,
            realtime,
            language,
            source_name,
            &pdfstylemd5_fingerprint,
            source_size,
        );
        let header_bytes = tag::encode(&header_tags)?;
        let header_address = reserve(&mut cursor, header_bytes.len());

        // Step 3: style-list block, one base64-encoded style name per page.
        let style_list_bytes = style_list_bytes(source_name, source_size, &page_fingerprints)?;
        let style_list_address = reserve(&mut cursor, style_list_bytes.len());

        // Step 4: background raster per page.
        let mut bg_addr = Vec::with_capacity(num_pages);
        for image in pages {
            bg_addr.push(reserve(&mut cursor, image.bytes.len()));
        }

        // Step 5: default-style run-length block.
        let empty_rle = document::empty_layer_rle();
        let default_style_address = reserve(&mut cursor, empty_rle.len());

        // Step 6: empty main-layer run-length block per page.
        let mut main_content_addr = Vec::with_capacity(num_pages);
        for _ in 0..num_pages {
            main_content_addr.push(reserve(&mut cursor, empty_rle.len()));
        }

        // Step 7: layer metadata blocks per page.
        let mut layer_meta_bytes: Vec<(Vec<u8>, Vec<u8>)> = Vec::with_capacity(num_pages);
        let mut main_meta_addr = Vec::with_capacity(num_pages);
        let mut bg_meta_addr = Vec::with_capacity(num_pages);
        for i in 0..num_pages {
            let main_meta = layer_metadata_bytes(LayerName::Main, main_content_addr[i])?;
            main_meta_addr.push(reserve(&mut cursor, main_meta.len()));
            let bg_meta = layer_metadata_bytes(LayerName::Background, bg_addr[i])?;
            bg_meta_addr.push(reserve(&mut cursor, bg_meta.len()));
            layer_meta_bytes.push((main_meta, bg_meta));
        }

        // Step 8: page metadata blocks.
        let mut page_ids = Vec::with_capacity(num_pages);
        let mut page_meta_bytes = Vec::with_capacity(num_pages);
        let mut page_addr = Vec::with_capacity(num_pages);
        for i in 0..num_pages {
            let page_id = generate_page_id();
            let layer_addresses = layer_address_table(main_meta_addr[i], bg_meta_addr[i]);
            let tags = page_metadata_tags_paginated(
                i + 1,
                source_name,
                &page_fingerprints[i],
                source_size,
                &page_id,
                &layer_addresses,
            );
            let bytes = tag::encode(&tags)?;
            page_addr.push(reserve(&mut cursor, bytes.len()));
            page_ids.push(page_id);
            page_meta_bytes.push(bytes);
        }

        // Step 9: footer.
        let style_entries: Vec<(String, usize)> = (0..num_pages)
            .map(|i| {
                let key = format!(
                    "{}{}",
                    pagestyle_paginated(source_name, i + 1),
                    pagestylemd5_paginated(&page_fingerprints[i], source_size)
                );
                (key, bg_addr[i])
            })
            .collect();
        let footer_tags = footer_tags_paginated(
            header_address,
            &page_addr,
            style_list_address,
            default_style_address,
            &style_entries,
        );
        let footer_bytes = tag::encode(&footer_tags)?;
        let footer_address = reserve(&mut cursor, footer_bytes.len());

        let mut blocks = Vec::new();
        blocks.push(block(BlockKind::Header, header_address, header_bytes));
        blocks.push(block(BlockKind::Content, style_list_address, style_list_bytes));
        for (i, image) in pages.iter().enumerate() {
            blocks.push(block(BlockKind::Content, bg_addr[i], image.bytes.clone()));
        }
        blocks.push(block(BlockKind::Content, default_style_address, empty_rle.clone()));
        for addr in &main_content_addr {
            blocks.push(block(BlockKind::Content, *addr, empty_rle.clone()));
        }
        for (i, (main_meta, bg_meta)) in layer_meta_bytes.into_iter().enumerate() {
            blocks.push(block(BlockKind::Layer, main_meta_addr[i], main_meta));
            blocks.push(block(BlockKind::Layer, bg_meta_addr[i], bg_meta));
        }
        for (i, bytes) in page_meta_bytes.into_iter().enumerate() {
            blocks.push(block(BlockKind::Page, page_addr[i], bytes));
        }
        blocks.push(block(BlockKind::Footer, footer_address, footer_bytes));

        let document = Document {
            shape: Shape::Paginated,
            device,
            device_name: device_name.to_string(),
            language: language.to_string(),
            file_id,
            realtime,
            source_name: source_name.to_string(),
            source_size,
            pages: pages
                .iter()
                .enumerate()
                .zip(page_ids)
                .map(|((i, image), page_id)| Page {
                    index: i + 1,
                    page_id,
                    background: image.bytes.clone(),
                    background_fingerprint: page_fingerprints[i].clone(),
                    ink: None,
                })
                .collect(),
        };

        Ok(Plan { document, blocks, footer_address })
    }

    /// Plans an image-template-shape document: a single raster page
    /// derived from a template (e.g. a PNG from the device's MyStyle folder).
    pub fn plan_image_template(
        device_name: &str,
        language: &str,
        realtime: bool,
        template_name: &str,
        image: &PageImage,
    ) -> Result<Plan> {
        let device = document::device_profile(device_name)?;
        check_dimensions(&device, image)?;

        let png_fingerprint = md5_hex(&image.bytes);
        let file_id = generate_file_id();
        let page_id = generate_page_id();

        let mut cursor = PREAMBLE_SIZE;

        let header_tags = header_tags_image_template(&device, &file_id, realtime, language);
        let header_bytes = tag::encode(&header_tags)?;
        let header_address = reserve(&mut cursor, header_bytes.len());

        let bg_address = reserve(&mut cursor, image.bytes.len());

        let empty_rle = document::empty_layer_rle();
        let main_content_address = reserve(&mut cursor, empty_rle.len());

        let main_meta = layer_metadata_bytes(LayerName::Main, main_content_address)?;
        let main_meta_address = reserve(&mut cursor, main_meta.len());

        let bg_meta = layer_metadata_bytes(LayerName::Background, bg_address)?;
        let bg_meta_address = reserve(&mut cursor, bg_meta.len());

        let layer_addresses = layer_address_table(main_meta_address, bg_meta_address);
        let page_tags = page_metadata_tags_image_template(
            template_name,
            &png_fingerprint,
            &page_id,
            &layer_addresses,
        );
        let page_bytes = tag::encode(&page_tags)?;
        let page_address = reserve(&mut cursor, page_bytes.len());

        let footer_tags = footer_tags_image_template(
            header_address,
            page_address,
            bg_address,
            template_name,
            &png_fingerprint,
        );
        let footer_bytes = tag::encode(&footer_tags)?;
        let footer_address = reserve(&mut cursor, footer_bytes.len());

        let blocks = vec![
            block(BlockKind::Header, header_address, header_bytes),
            block(BlockKind::Content, bg_address, image.bytes.clone()),
            block(BlockKind::Content, main_content_address, empty_rle),
            block(BlockKind::Layer, main_meta_address, main_meta),
            block(BlockKind::Layer, bg_meta_address, bg_meta),
            block(BlockKind::Page, page_address, page_bytes),
            block(BlockKind::Footer, footer_address, footer_bytes),
        ];

        let document = Document {
            shape: Shape::ImageTemplate,
            device,
            device_name: device_name.to_string(),
            language: language.to_string(),
            file_id,
            realtime,
            source_name: template_name.to_string(),
            source_size: 0,
            pages: vec![Page {
                index: 1,
                page_id,
                background: image.bytes.clone(),
                background_fingerprint: png_fingerprint,
                ink: None,
            }],
        };

        Ok(Plan { document, blocks, footer_address })
    }
}

fn reserve(cursor: &mut usize, payload_len: usize) -> usize {
    let address = *cursor;
    *cursor += 4 + payload_len;
    address
}

fn block(kind: BlockKind, address: usize, payload: Vec<u8>) -> Block {
    Block { kind, address, payload }
}

fn check_dimensions(device: &DeviceProfile, image: &PageImage) -> Result<()> {
    if image.width != device.width || image.height != device.height {
        return Err(Error::DimensionMismatch {
            expected: (device.width, device.height),
            actual: (image.width, image.height),
        });
    }
    Ok(())
}

fn layer_address_table(main_meta_address: usize, bg_meta_address: usize) -> [(LayerName, usize); 5] {
    [
        (LayerName::Main, main_meta_address),
        (LayerName::Aux1, 0),
        (LayerName::Aux2, 0),
        (LayerName::Aux3, 0),
        (LayerName::Background, bg_meta_address),
    ]
}

fn pagestyle_paginated(source_name: &str, page_num: usize) -> String {
    format!("user_pdf_{}_{}", source_name, page_num)
}

fn pagestylemd5_paginated(page_fingerprint: &str, source_size: usize) -> String {
    format!("{}_{}", page_fingerprint, source_size)
}

fn style_list_bytes(source_name: &str, source_size: usize, page_fingerprints: &[String]) -> Result<Vec<u8>> {
    let mut entries = Vec::with_capacity(page_fingerprints.len());
    for (i, fingerprint) in page_fingerprints.iter().enumerate() {
        let style_name = format!(
            "user_pdf_{}_{}_{}_{}",
            source_name,
            i + 1,
            fingerprint,
            source_size
        );
        entries.push(base64_encode(style_name.as_bytes()));
    }
    let mut content = entries.join(",");
    content.push(',');
    Ok(content.into_bytes())
}

/// Five fixed layer-visibility descriptors emitted verbatim in every page
/// metadata block; only the `#`-substituted JSON rendering varies textually.
#[derive(serde::Serialize)]
struct LayerInfoEntry {
    #[serde(rename = "layerId")]
    layer_id: i32,
    name: &'static str,
    #[serde(rename = "isBackgroundLayer")]
    is_background_layer: bool,
    #[serde(rename = "isAllowAdd")]
    is_allow_add: bool,
    #[serde(rename = "isCurrentLayer")]
    is_current_layer: bool,
    #[serde(rename = "isVisible")]
    is_visible: bool,
    #[serde(rename = "isDeleted")]
    is_deleted: bool,
    #[serde(rename = "isAllowUp")]
    is_allow_up: bool,
    #[serde(rename = "isAllowDown")]
    is_allow_down: bool,
}

fn layer_info_json() -> String {
    let entries = [
        LayerInfoEntry { layer_id: 3, name: "Layer 3", is_background_layer: false, is_allow_add: false, is_current_layer: false, is_visible: true, is_deleted: true, is_allow_up: false, is_allow_down: false },
        LayerInfoEntry { layer_id: 2, name: "Layer 2", is_background_layer: false, is_allow_add: false, is_current_layer: false, is_visible: true, is_deleted: true, is_allow_up: false, is_allow_down: false },
        LayerInfoEntry { layer_id: 1, name: "Layer 1", is_background_layer: false, is_allow_add: false, is_current_layer: false, is_visible: true, is_deleted: true, is_allow_up: false, is_allow_down: false },
        LayerInfoEntry { layer_id: 0, name: "Main Layer", is_background_layer: false, is_allow_add: false, is_current_layer: true, is_visible: true, is_deleted: false, is_allow_up: false, is_allow_down: false },
        LayerInfoEntry { layer_id: -1, name: "Background Layer", is_background_layer: true, is_allow_add: true, is_current_layer: false, is_visible: true, is_deleted: false, is_allow_up: false, is_allow_down: false },
    ];
    // The tag grammar forbids ':' in a value, so the substitution to '#'
    // happens after JSON serialization, never before.
    serde_json::to_string(&entries)
        .expect("layer info descriptors always serialize")
        .replace(':', "#")
}

fn header_tags_paginated(
    device: &DeviceProfile,
    num_pages: usize,
    file_id: &str,
    realtime: bool,
    language: &str,
    source_name: &str,
    last_page_fingerprint: &str,
    source_size: usize,
) -> Vec<(String, String)> {
    let recogn_type = if realtime { "1" } else { "0" };
    let recogn_language = if realtime { language } else { "none" };
    vec![
        ("MODULE_LABEL".into(), "none".into()),
        ("FILE_TYPE".into(), "NOTE".into()),
        ("APPLY_EQUIPMENT".into(), device.equipment_code.into()),
        ("FINALOPERATION_PAGE".into(), num_pages.to_string()),
        ("FINALOPERATION_LAYER".into(), "1".into()),
        ("DEVICE_DPI".into(), "0".into()),
        ("SOFT_DPI".into(), "0".into()),
        ("FILE_PARSE_TYPE".into(), "0".into()),
        ("RATTA_ETMD".into(), "0".into()),
        ("APP_VERSION".into(), "0".into()),
        ("FILE_ID".into(), file_id.into()),
        ("FILE_RECOGN_TYPE".into(), recogn_type.into()),
        ("FILE_RECOGN_LANGUAGE".into(), recogn_language.into()),
        ("PDFSTYLE".into(), format!("user_pdf_{}_{}", source_name, num_pages)),
        ("PDFSTYLEMD5".into(), format!("{}_{}", last_page_fingerprint, source_size)),
        ("STYLEUSAGETYPE".into(), "2".into()),
        ("HIGHLIGHTINFO".into(), "0".into()),
        ("HORIZONTAL_CHECK".into(), "0".into()),
        ("IS_OLD_APPLY_EQUIPMENT".into(), "1".into()),
        ("ANTIALIASING_CONVERT".into(), "2".into()),
    ]
}

fn header_tags_image_template(
    device: &DeviceProfile,
    file_id: &str,
    realtime: bool,
    language: &str,
) -> Vec<(String, String)> {
    let recogn_type = if realtime { "1" } else { "0" };
    let recogn_language = if realtime { language } else { "none" };
    vec![
        ("FILE_TYPE".into(), "NOTE".into()),
        ("APPLY_EQUIPMENT".into(), device.equipment_code.into()),
        ("FINALOPERATION_PAGE".into(), "1".into()),
        ("FINALOPERATION_LAYER".into(), "1".into()),
        ("DEVICE_DPI".into(), "0".into()),
        ("SOFT_DPI".into(), "0".into()),
        ("FILE_PARSE_TYPE".into(), "0".into()),
        ("RATTA_ETMD".into(), "0".into()),
        ("FILE_ID".into(), file_id.into()),
        ("FILE_RECOGN_TYPE".into(), recogn_type.into()),
        ("FILE_RECOGN_LANGUAGE".into(), recogn_language.into()),
        ("HORIZONTAL_CHECK".into(), "0".into()),
        ("IS_OLD_APPLY_EQUIPMENT".into(), "1".into()),
        ("ANTIALIASING_CONVERT".into(), "2".into()),
    ]
}

fn layer_metadata_bytes(layer: LayerName, bitmap_address: usize) -> Result<Vec<u8>> {
    let tags = vec![
        ("LAYERTYPE".to_string(), LAYER_TYPE_NOTE.to_string()),
        ("LAYERPROTOCOL".to_string(), LAYER_PROTOCOL_RLE.to_string()),
        ("LAYERNAME".to_string(), layer.wire_name().to_string()),
        ("LAYERPATH".to_string(), "0".to_string()),
        ("LAYERBITMAP".to_string(), bitmap_address.to_string()),
        ("LAYERVECTORGRAPH".to_string(), "0".to_string()),
        ("LAYERRECOGN".to_string(), "0".to_string()),
    ];
    tag::encode(&tags)
}

fn page_metadata_tags_paginated(
    page_num: usize,
    source_name: &str,
    page_fingerprint: &str,
    source_size: usize,
    page_id: &str,
    layer_addresses: &[(LayerName, usize); 5],
) -> Vec<(String, String)> {
    let mut tags = vec![
        ("PAGESTYLE".into(), pagestyle_paginated(source_name, page_num)),
        ("PAGESTYLEMD5".into(), pagestylemd5_paginated(page_fingerprint, source_size)),
        ("LAYERINFO".into(), layer_info_json()),
        ("LAYERSEQ".into(), "MAINLAYER,BGLAYER".into()),
    ];
    for (name, addr) in layer_addresses {
        tags.push((name.wire_name().to_string(), addr.to_string()));
    }
    tags.extend(vec![
        ("TOTALPATH".into(), "0".into()),
        ("THUMBNAILTYPE".into(), "0".into()),
        ("RECOGNSTATUS".into(), "0".into()),
        ("RECOGNTEXT".into(), "0".into()),
        ("RECOGNFILE".into(), "0".into()),
        ("PAGEID".into(), page_id.into()),
        ("RECOGNTYPE".into(), "0".into()),
        ("RECOGNFILESTATUS".into(), "0".into()),
        ("RECOGNLANGUAGE".into(), "none".into()),
        ("EXTERNALLINKINFO".into(), "0".into()),
        ("IDTABLE".into(), "0".into()),
        ("ORIENTATION".into(), "1000".into()),
        ("PAGETEXTBOX".into(), "0".into()),
        ("DISABLE".into(), "none".into()),
    ]);
    tags
}

fn page_metadata_tags_image_template(
    template_name: &str,
    png_fingerprint: &str,
    page_id: &str,
    layer_addresses: &[(LayerName, usize); 5],
) -> Vec<(String, String)> {
    let mut tags = vec![
        ("PAGESTYLE".into(), format!("user_{}", template_name)),
        ("PAGESTYLEMD5".into(), png_fingerprint.to_string()),
        ("LAYERSEQ".into(), "MAINLAYER,BGLAYER".into()),
        ("PAGEID".into(), page_id.into()),
    ];
    for (name, addr) in layer_addresses {
        tags.push((name.wire_name().to_string(), addr.to_string()));
    }
    tags.extend(vec![
        ("TOTALPATH".into(), "0".into()),
        ("THUMBNAILTYPE".into(), "0".into()),
        ("RECOGNSTATUS".into(), "0".into()),
        ("RECOGNTEXT".into(), "0".into()),
        ("RECOGNFILE".into(), "0".into()),
        ("LAYERINFO".into(), layer_info_json()),
        ("RECOGNTYPE".into(), "0".into()),
        ("RECOGNFILESTATUS".into(), "0".into()),
        ("RECOGNLANGUAGE".into(), "none".into()),
        ("ORIENTATION".into(), "1000".into()),
        ("PAGETEXTBOX".into(), "0".into()),
        ("DISABLE".into(), "none".into()),
    ]);
    tags
}

fn footer_tags_paginated(
    header_address: usize,
    page_addresses: &[usize],
    style_list_address: usize,
    default_style_address: usize,
    style_entries: &[(String, usize)],
) -> Vec<(String, String)> {
    let mut tags = Vec::new();
    for (i, addr) in page_addresses.iter().enumerate() {
        tags.push((format!("PAGE{}", i + 1), addr.to_string()));
    }
    tags.push(("COVER_0".into(), "0".into()));
    tags.push(("DIRTY".into(), "0".into()));
    tags.push(("FILE_FEATURE".into(), header_address.to_string()));
    tags.push(("PDFSTYLELIST".into(), style_list_address.to_string()));
    tags.push((DEFAULT_STYLE_KEY.into(), default_style_address.to_string()));
    for (key, addr) in style_entries {
        tags.push((format!("STYLE_{}", key), addr.to_string()));
    }
    tags
}

fn footer_tags_image_template(
    header_address: usize,
    page_address: usize,
    bg_address: usize,
    template_name: &str,
    png_fingerprint: &str,
) -> Vec<(String, String)> {
    vec![
        ("PAGE1".into(), page_address.to_string()),
        ("DIRTY".into(), "0".into()),
        ("FILE_FEATURE".into(), header_address.to_string()),
        (format!("STYLE_user_{}{}", template_name, png_fingerprint), bg_address.to_string()),
    ]
}
