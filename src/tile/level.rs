//! Pyramid level selection.
//!
//! Levels are the tiled directories of the slide, finest first. The target
//! is the downsample that turns the scan magnification into the requested
//! one (`AppMag / magnification`); the selected level is the one whose
//! width ratio to level 0 matches it within a tolerance, or else the finest
//! level that is still finer than the target.

use tracing::debug;

use crate::error::ExtractError;
use crate::slide::SlideReader;

/// Position `slide` at the best level for `target` and return its downsample.
///
/// The scan starts at the reader's current directory and walks the chain
/// forward. Stripped directories are skipped. A target below 1 asks for
/// upsampling from level 0: it returns `1.0` without moving the reader.
pub fn select_level<S: SlideReader + ?Sized>(
    slide: &mut S,
    target: f32,
    tolerance: f32,
) -> Result<f32, ExtractError> {
    if target < 1.0 {
        debug!(target, "Target below level 0, upsampling from level 0");
        return Ok(1.0);
    }

    let level0_width = slide
        .directory_at(0)
        .map(|d| d.width)
        .ok_or_else(|| ExtractError::UnsupportedFormat {
            reason: "slide has no directories".to_string(),
        })?;

    // Most recent tiled directory finer than the target
    let mut previous: Option<(usize, f32)> = None;

    loop {
        let directory = slide.directory();
        if directory.is_tiled() {
            let index = directory.index;
            let ratio = level0_width as f32 / directory.width as f32;

            if (ratio - target).abs() <= tolerance {
                debug!(directory = index, ratio, target, "Selected matching level");
                return Ok(ratio);
            }

            if ratio > target {
                return match previous {
                    Some((prev_index, prev_ratio)) => {
                        slide.set_directory(prev_index)?;
                        debug!(
                            directory = prev_index,
                            ratio = prev_ratio,
                            target,
                            "Selected finer level"
                        );
                        Ok(prev_ratio)
                    }
                    None => {
                        debug!(directory = index, ratio, target, "Selected first tiled level");
                        Ok(ratio)
                    }
                };
            }

            previous = Some((index, ratio));
        }

        if !slide.read_next_directory() {
            break;
        }
    }

    match previous {
        Some((index, ratio)) => {
            if !slide.directory().is_tiled() {
                slide.set_directory(index)?;
            }
            debug!(directory = index, ratio, target, "Selected coarsest level");
            Ok(ratio)
        }
        None => Err(ExtractError::UnsupportedFormat {
            reason: "slide has no tiled levels".to_string(),
        }),
    }
}

// =============================================================================
// Tests
// =============================================================================
