/// Colour written over overlay-line pixels and their neighbours. A near gray,
/// so it is never itself classified as line-coloured.
pub const FILL_COLOR: [u8; 3] = [0xF6, 0xF6, 0xF6];

/// Lowest hue (0-255 scale) treated as overlay-line coloured. Cyan is ~128.
pub const DEFAULT_HUE_MIN: u8 = 100;

/// Highest hue (0-255 scale) treated as overlay-line coloured. Blue is ~170.
pub const DEFAULT_HUE_MAX: u8 = 175;

/// Minimum saturation. Keeps near-gray pixels out of the hue window.
pub const DEFAULT_SAT_MIN: u8 = 30;

/// Minimum value. Keeps near-black pixels out of the hue window.
pub const DEFAULT_VAL_MIN: u8 = 50;

/// Number of pixel rows removed from the top of each frame by the top cropper.
pub const DEFAULT_TOP_CROP_ROWS: u32 = 24;

/// Wall-clock time between sampled frames.
///
/// Unit: Seconds
pub const DEFAULT_SAMPLE_INTERVAL_SECS: f64 = 10.0;

/// Sampled frames keep the top `height / DEFAULT_CROP_RATIO` rows, which is where the
/// recorded score sits in the source videos. Must be at least 1.0.
pub const DEFAULT_CROP_RATIO: f64 = 2.5;

/// Width of the zero-padded index in `frame_NNNNN.png`.
pub const FRAME_INDEX_DIGITS: usize = 5;

/// Extension (without the dot) of every frame image read or written.
pub const FRAME_EXTENSION: &str = "png";
