//! Aperio SVS image description parsing.
//!
//! SVS files store slide metadata in the ImageDescription tag of the first
//! directory as a pipe-separated string:
//!
//! ```text
//! Aperio Image Library v12.0.15
//! 46920x33600 (256x256) JPEG/RGB Q=70|AppMag = 20|MPP = 0.499|...
//! ```
//!
//! The scanning magnification (`AppMag`) anchors every magnification
//! request: the target downsample is `AppMag / requested`.

use std::collections::HashMap;

use crate::error::ExtractError;

/// Property key holding the scanning magnification
pub const APP_MAG_KEY: &str = "AppMag";

/// Property key holding microns per pixel
pub const MPP_KEY: &str = "MPP";

// =============================================================================
// SlideDescription
// =============================================================================

/// Parsed ImageDescription of a slide.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideDescription {
    /// Scanning magnification, if the description carries a usable one
    pub app_mag: Option<u32>,

    /// Microns per pixel (resolution)
    pub mpp: Option<f64>,

    /// Scanner vendor name
    pub vendor: Option<String>,

    /// Every `key = value` token, keys and values trimmed
    pub properties: HashMap<String, String>,
}

impl SlideDescription {
    /// Parse an ImageDescription string.
    ///
    /// Tokens without `=` (such as the leading library banner) are skipped.
    /// When a key appears twice, the first occurrence wins.
    pub fn parse(description: &str) -> Self {
        let mut parsed = SlideDescription::default();

        if description.contains("Aperio") {
            parsed.vendor = Some("Aperio".to_string());
        }

        for token in description.split('|') {
            let Some((key, value)) = token.trim().split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            if parsed.properties.contains_key(key) {
                continue;
            }

            match key {
                APP_MAG_KEY => parsed.app_mag = parse_leading_uint(value).filter(|&m| m > 0),
                MPP_KEY => parsed.mpp = value.parse::<f64>().ok(),
                _ => {}
            }

            parsed
                .properties
                .insert(key.to_string(), value.to_string());
        }

        parsed
    }

    /// Scanning magnification, or `MissingMagnification`.
    ///
    /// A token that is absent, has no leading digits, or is zero counts as
    /// missing.
    pub fn app_mag(&self) -> Result<u32, ExtractError> {
        self.app_mag.ok_or(ExtractError::MissingMagnification)
    }

    /// Look up any property by key.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Parse the leading decimal digits of `value`, ignoring leading whitespace.
///
/// `"20.5"` gives 20, `"40x"` gives 40, `"x40"` gives `None`. Values past
/// `u32::MAX` saturate.
fn parse_leading_uint(value: &str) -> Option<u32> {
    let digits: &str = {
        let trimmed = value.trim_start();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        &trimmed[..end]
    };

    if digits.is_empty() {
        return None;
    }

    Some(digits.bytes().fold(0u32, |acc, b| {
        acc.saturating_mul(10).saturating_add((b - b'0') as u32)
    }))
}

// =============================================================================
// Tests
// =============================================================================
