// Checkin-timeline analysis.
//
// The legacy dashboard renders each node's recent history as a small
// image: one pixel column per time unit, color encoding the node's state
// in that unit. Decoding the image and counting colored columns yields
// fractional time-in-state metrics without any API support.
//
// This module is pure -- the image bytes are fetched elsewhere.

use image::GenericImageView;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Pixel color for "checked in as gateway".
const GATEWAY_RGB: [u8; 3] = [0x1f, 0xaa, 0x5f];
/// Pixel color for "checked in as relay".
const RELAY_RGB: [u8; 3] = [0x4f, 0xdd, 0x8f];
/// Pixel color for "offline / no checkin".
const OFFLINE_RGB: [u8; 3] = [0xcc, 0xcc, 0xcc];

/// The sampled pixel row. Row 0 can carry border artifacts; row 1 is the
/// first row that reliably holds timeline colors.
const SAMPLE_ROW: u32 = 1;

/// Fraction of the timeline spent in each state, in percent.
///
/// Unclassified pixels (antialiasing, unknown states) count toward none
/// of the buckets, so the three percentages sum to at most 100. Values
/// are unrounded -- rounding happens at display time only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckinBreakdown {
    pub gateway_pct: f64,
    pub relay_pct: f64,
    pub offline_pct: f64,
}

impl CheckinBreakdown {
    /// Time online in any serving role.
    pub fn online_pct(&self) -> f64 {
        self.gateway_pct + self.relay_pct
    }
}

/// Analyze a rendered checkin-timeline image.
///
/// Samples pixel row 1, classifies each column into the three known color
/// buckets, and converts counts to percentages over `width - 2` -- the two
/// edge columns are chart border, not samples. Division is real-valued.
pub fn analyze(image_bytes: &[u8]) -> Result<CheckinBreakdown, CoreError> {
    let img = image::load_from_memory(image_bytes)
        .map_err(|e| CoreError::CheckinGraph(format!("image decode failed: {e}")))?;

    let (width, height) = img.dimensions();
    if width <= 2 || height <= SAMPLE_ROW {
        return Err(CoreError::CheckinGraph(format!(
            "image too small to sample: {width}x{height}"
        )));
    }

    let rgb = img.to_rgb8();
    let mut gateway = 0u32;
    let mut relay = 0u32;
    let mut offline = 0u32;

    for col in 0..width {
        let pixel = rgb.get_pixel(col, SAMPLE_ROW).0;
        match pixel {
            p if p == GATEWAY_RGB => gateway += 1,
            p if p == RELAY_RGB => relay += 1,
            p if p == OFFLINE_RGB => offline += 1,
            _ => {}
        }
    }

    let samples = f64::from(width - 2);
    Ok(CheckinBreakdown {
        gateway_pct: 100.0 * f64::from(gateway) / samples,
        relay_pct: 100.0 * f64::from(relay) / samples,
        offline_pct: 100.0 * f64::from(offline) / samples,
    })
}
