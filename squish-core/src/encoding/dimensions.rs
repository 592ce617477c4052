//! Output dimension resolution.
//!
//! Maps a preset's scale factor and the source's native resolution to
//! concrete output dimensions. Results are always even (macroblock-aligned
//! encoders reject odd sizes) and never below [`MIN_WIDTH`] x [`MIN_HEIGHT`].

use serde::{Deserialize, Serialize};

/// Smallest output width the resolver produces.
pub const MIN_WIDTH: u32 = 320;

/// Smallest output height the resolver produces.
pub const MIN_HEIGHT: u32 = 240;

/// Concrete output dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedDimensions {
    pub width: u32,
    pub height: u32,
}

impl ResolvedDimensions {
    /// Bytes of one RGB24 frame at these dimensions.
    #[must_use]
    pub fn rgb24_frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

impl std::fmt::Display for ResolvedDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Resolves the output dimensions for `scale` applied to the native size.
///
/// Zero native dimensions violate the caller's precondition (the prober never
/// reports them).
#[must_use]
pub fn resolve(native_width: u32, native_height: u32, scale: f64) -> ResolvedDimensions {
    debug_assert!(native_width > 0 && native_height > 0, "degenerate source dimensions");
    let native_width = native_width.max(1);
    let native_height = native_height.max(1);
    let aspect = f64::from(native_height) / f64::from(native_width);

    let mut width = (f64::from(native_width) * scale + 1e-9).floor() as u32;
    let mut height = (f64::from(width) * aspect).round() as u32;

    if width < MIN_WIDTH || height < MIN_HEIGHT {
        let factor = (f64::from(MIN_WIDTH) / f64::from(native_width))
            .max(f64::from(MIN_HEIGHT) / f64::from(native_height));
        width = (f64::from(native_width) * factor).ceil() as u32;
        height = (f64::from(native_height) * factor).ceil() as u32;
    }

    ResolvedDimensions {
        width: force_even(width).max(MIN_WIDTH),
        height: force_even(height).max(MIN_HEIGHT),
    }
}

/// Fits the native size inside `max_width` x `max_height`, preserving aspect
/// ratio and never upscaling. Results are even and at least 2x2.
#[must_use]
pub fn fit_within(
    native_width: u32,
    native_height: u32,
    max_width: u32,
    max_height: u32,
) -> ResolvedDimensions {
    let native_width = u64::from(native_width.max(1));
    let native_height = u64::from(native_height.max(1));
    let (max_width, max_height) = (u64::from(max_width), u64::from(max_height));

    let (width, height) = if native_width <= max_width && native_height <= max_height {
        (native_width, native_height)
    } else if native_width * max_height >= native_height * max_width {
        (max_width, native_height * max_width / native_width)
    } else {
        (native_width * max_height / native_height, max_height)
    };

    ResolvedDimensions {
        width: force_even(width as u32).max(2),
        height: force_even(height as u32).max(2),
    }
}

/// Decrements odd values to the next even number.
fn force_even(value: u32) -> u32 {
    value - (value % 2)
}
