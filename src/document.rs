//
// Copyright 2024 snote Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The `.note` container format.
//!
//! Constants defined in this module describe the fixed, wire-level
//! framing of a Supernote-family `.note` file: the leading file-type
//! marker and signature, the trailing `tail` marker and footer address,
//! and the per-device equipment/resolution tables used to populate the
//! header.
//!
//! A `.note` file is organized as:
//!
//! 1. File-type marker (4 bytes) + signature (20 bytes).
//! 2. An address-threaded sequence of length-prefixed blocks (header,
//!    rasters, run-length layers, layer/page metadata, footer).
//! 3. Trailer: literal `tail` (4 bytes) + footer address (4 bytes LE).
//!
//! # References
//!
//! Reverse-engineered from device-authored files; see the design notes
//! in `DESIGN.md` for the provenance of each constant.

use crate::error::{Error, Result};

/// Number of bytes preceding the first block: file-type marker + signature.
pub const PREAMBLE_SIZE: usize = 24;

/// The file-type marker at the very start of every `.note` file.
pub const FILETYPE_MARKER: &[u8] = b"note";

/// The signature immediately following the file-type marker. Exactly
/// 20 ASCII bytes: `SN_FILE_VER_` followed by an 8-digit version.
pub const SIGNATURE: &[u8] = b"SN_FILE_VER_20230015";

/// Number of bytes in the signature field.
pub const SIGNATURE_SIZE: usize = 20;

/// The literal ASCII marker preceding the final footer address.
pub const TAIL_MARKER: &[u8] = b"tail";

/// Number of bytes in the `tail` marker plus the footer address that follows it.
pub const TRAILER_SIZE: usize = TAIL_MARKER.len() + 4;

/// Layer names, in the fixed order every page metadata block must list them.
pub const ALL_LAYER_NAMES: [LayerName; 5] = [
    LayerName::Main,
    LayerName::Aux1,
    LayerName::Aux2,
    LayerName::Aux3,
    LayerName::Background,
];

/// One of the five named layers every page carries.
///
/// Only `Main` and `Background` carry content in files this crate
/// generates; `Aux1`..`Aux3` always have a zero content address.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum LayerName {
    Main,
    Aux1,
    Aux2,
    Aux3,
    Background,
}

impl LayerName {
    /// The upper-case wire token for this layer, e.g. `MAINLAYER`.
    pub fn wire_name(self) -> &'static str {
        match self {
            LayerName::Main => "MAINLAYER",
            LayerName::Aux1 => "LAYER1",
            LayerName::Aux2 => "LAYER2",
            LayerName::Aux3 => "LAYER3",
            LayerName::Background => "BGLAYER",
        }
    }

    /// Whether files generated by this crate populate this layer's content.
    pub fn carries_content(self) -> bool {
        matches!(self, LayerName::Main | LayerName::Background)
    }
}

/// The fixed protocol token for ink layers (`layerprotocol`).
pub const LAYER_PROTOCOL_RLE: &str = "RATTA_RLE";

/// The fixed `layertype` constant carried by every layer metadata block.
pub const LAYER_TYPE_NOTE: &str = "NOTE";

/// The 600-byte constant representing an empty ink layer: the two-byte
/// pattern `0x62 0xFF` repeated 300 times.
pub fn empty_layer_rle() -> Vec<u8> {
    std::iter::repeat([0x62u8, 0xFFu8])
        .take(300)
        .flatten()
        .collect()
}

/// Length in bytes of the empty-layer RLE constant.
pub const EMPTY_LAYER_RLE_LEN: usize = 600;

/// Device equipment codes and native resolution/DPI, keyed by the
/// commercial device name a caller selects.
///
/// `A5X` and `A6X`/`A6X2`'s internal equipment codes are not confirmed
/// against Ratta's internal naming; they are carried verbatim from the
/// empirically observed golden files as the commercial name, per the
/// open question in the design notes: do not invent a different value.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct DeviceProfile {
    /// Internal equipment code written to `apply_equipment`.
    pub equipment_code: &'static str,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Native rendering DPI.
    pub dpi: u32,
}

/// Looks up the device profile for a commercial device/alias name.
///
/// # Errors
///
/// Returns `Error::UnsupportedDevice` if `name` is not a known device or alias.
pub fn device_profile(name: &str) -> Result<DeviceProfile> {
    let profile = match name {
        "A5X" => DeviceProfile { equipment_code: "A5X", width: 1404, height: 1872, dpi: 226 },
        "A5X2" | "Manta" => DeviceProfile { equipment_code: "N5", width: 1920, height: 2560, dpi: 300 },
        "A6X" => DeviceProfile { equipment_code: "A6X", width: 1404, height: 1872, dpi: 300 },
        "A6X2" | "Nomad" => DeviceProfile { equipment_code: "A6X2", width: 1404, height: 1872, dpi: 300 },
        other => return Err(Error::UnsupportedDevice(other.to_string())),
    };
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_layer_rle_constant() {
        let rle = empty_layer_rle();
        assert_eq!(rle.len(), EMPTY_LAYER_RLE_LEN);
        assert!(rle.chunks(2).all(|pair| pair == [0x62, 0xFF]));
    }

    #[test]
    fn test_layer_wire_names() {
        assert_eq!(LayerName::Main.wire_name(), "MAINLAYER");
        assert_eq!(LayerName::Background.wire_name(), "BGLAYER");
        assert!(LayerName::Main.carries_content());
        assert!(!LayerName::Aux1.carries_content());
    }

    #[test]
    fn test_device_profile_lookup_and_aliases() {
        let manta = device_profile("A5X2").unwrap();
        let alias = device_profile("Manta").unwrap();
        assert_eq!(manta, alias);
        assert_eq!(manta.width, 1920);
        assert_eq!(manta.height, 2560);
        assert_eq!(manta.equipment_code, "N5");
    }

    #[test]
    fn test_device_profile_unknown() {
        assert_eq!(
            device_profile("PocketPro"),
            Err(Error::UnsupportedDevice("PocketPro".to_string()))
        );
    }
}
