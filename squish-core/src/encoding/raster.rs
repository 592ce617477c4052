// ============================================================================
// squish-core/src/encoding/raster.rs
// ============================================================================
//
// RASTER SURFACE: Off-Screen Frame Assembly and Output Sampling
//
// Decoded frames arrive at whatever rate the decoder produces them. This
// module holds the two pieces that turn that uncapped stream into the
// constant-rate stream an encoding sink expects:
//
// - RasterSurface: an RGB24 pixel buffer of the output dimensions that frames
//   are drawn into (nearest-neighbour scaled when sizes differ)
// - FrameSampler: decides how many output slots each incoming frame fills

use crate::encoding::dimensions::ResolvedDimensions;
use crate::error::{CoreError, CoreResult};

/// A decoded RGB24 frame with its presentation timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    /// Presentation time in seconds from the start of the source
    pub timestamp: f64,
    /// Packed RGB24 pixels, row-major, `width * height * 3` bytes
    pub data: Vec<u8>,
}

impl DecodedFrame {
    /// Builds a frame, checking that `data` matches the dimensions.
    pub fn new(width: u32, height: u32, timestamp: f64, data: Vec<u8>) -> CoreResult<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected || width == 0 || height == 0 {
            return Err(CoreError::MediaDecode(format!(
                "frame buffer of {} bytes does not match {}x{} rgb24 ({} bytes)",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self { width, height, timestamp, data })
    }

    /// A frame filled with a single colour. Mostly useful in tests.
    #[must_use]
    pub fn solid(width: u32, height: u32, timestamp: f64, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self { width, height, timestamp, data }
    }
}

/// Off-screen RGB24 buffer at the output dimensions.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    dims: ResolvedDimensions,
    pixels: Vec<u8>,
    drawn: bool,
}

impl RasterSurface {
    /// Creates a black surface.
    #[must_use]
    pub fn new(dims: ResolvedDimensions) -> Self {
        Self {
            dims,
            pixels: vec![0; dims.rgb24_frame_len()],
            drawn: false,
        }
    }

    pub fn dimensions(&self) -> ResolvedDimensions {
        self.dims
    }

    /// Raw RGB24 bytes of the surface.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Whether any frame has been drawn yet.
    pub fn has_content(&self) -> bool {
        self.drawn
    }

    /// Draws `frame` over the whole surface.
    pub fn draw(&mut self, frame: &DecodedFrame) {
        let (dst_w, dst_h) = (self.dims.width as usize, self.dims.height as usize);
        let (src_w, src_h) = (frame.width as usize, frame.height as usize);

        if src_w == dst_w && src_h == dst_h {
            self.pixels.copy_from_slice(&frame.data);
        } else {
            // Source column for every destination column, computed once per draw.
            let columns: Vec<usize> = (0..dst_w).map(|x| x * src_w / dst_w * 3).collect();
            for y in 0..dst_h {
                let src_row = (y * src_h / dst_h) * src_w * 3;
                let dst_row = y * dst_w * 3;
                for (x, src_col) in columns.iter().enumerate() {
                    let src = src_row + src_col;
                    let dst = dst_row + x * 3;
                    self.pixels[dst..dst + 3].copy_from_slice(&frame.data[src..src + 3]);
                }
            }
        }
        self.drawn = true;
    }
}

/// Maps frame timestamps onto constant-rate output slots.
///
/// Slot `n` sits at `n / frame_rate` seconds. A slot shows the most recent
/// frame whose timestamp is at or before it.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    interval: f64,
    next_slot: u64,
}

// Timestamps reported by decoders are rounded; this absorbs the rounding.
const SLOT_EPSILON: f64 = 1e-6;

impl FrameSampler {
    pub fn new(frame_rate: u32) -> Self {
        Self {
            interval: 1.0 / f64::from(frame_rate.max(1)),
            next_slot: 0,
        }
    }

    fn next_due(&self) -> f64 {
        self.next_slot as f64 * self.interval
    }

    /// Slots strictly before `timestamp`; they belong to the previous frame.
    pub fn slots_before(&mut self, timestamp: f64) -> u64 {
        let mut count = 0;
        while self.next_due() + SLOT_EPSILON < timestamp {
            self.next_slot += 1;
            count += 1;
        }
        count
    }

    /// Slots at `timestamp` (within rounding); they belong to the frame at
    /// that timestamp. Call after [`Self::slots_before`].
    pub fn slots_at(&mut self, timestamp: f64) -> u64 {
        let mut count = 0;
        while self.next_due() <= timestamp + SLOT_EPSILON {
            self.next_slot += 1;
            count += 1;
        }
        count
    }

    /// Slots still owed to hold the last frame until `duration`.
    pub fn slots_until(&mut self, duration: f64) -> u64 {
        self.slots_before(duration)
    }

    /// Total slots handed out so far.
    pub fn emitted(&self) -> u64 {
        self.next_slot
    }
}
