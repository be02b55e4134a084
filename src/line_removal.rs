//! Removal of coloured overlay lines (the playback-position marker drawn over the score).
//!
//! A pixel is "line coloured" when its hue lies in a window and it is saturated and bright
//! enough. The classified mask is dilated by one pixel with 8-connectivity to swallow the
//! anti-aliased edges of the line, and every masked pixel is painted with a fill colour.

use std::path::Path;

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::{distance_transform::Norm::LInf, morphology};

use crate::{batch::FrameTransform, definitions::*, Error, ItemError};

const MASKED: Luma<u8> = Luma([u8::MAX]);

/// Thresholds that decide whether a pixel belongs to an overlay line, and the colour
/// that replaces it. All hue/saturation/value thresholds use the 0-255 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineColorFilter {
    pub hue_min: u8,
    pub hue_max: u8,
    pub sat_min: u8,
    pub val_min: u8,
    pub fill: Rgb<u8>,
}

impl Default for LineColorFilter {
    fn default() -> Self {
        Self {
            hue_min: DEFAULT_HUE_MIN,
            hue_max: DEFAULT_HUE_MAX,
            sat_min: DEFAULT_SAT_MIN,
            val_min: DEFAULT_VAL_MIN,
            fill: Rgb(FILL_COLOR),
        }
    }
}

impl LineColorFilter {
    #[must_use]
    pub fn is_line_colored(&self, pix: Rgb<u8>) -> bool {
        let [h, s, v] = hsv_from_rgb(pix);
        (self.hue_min..=self.hue_max).contains(&h) && s >= self.sat_min && v >= self.val_min
    }

    /// White wherever the pixel is line coloured, black everywhere else.
    #[must_use]
    pub fn line_mask(&self, img: &RgbImage) -> GrayImage {
        let mut mask = GrayImage::new(img.width(), img.height());
        for (&pix, mask_pix) in img.pixels().zip(mask.pixels_mut()) {
            if self.is_line_colored(pix) {
                *mask_pix = MASKED;
            }
        }
        mask
    }

    /// Replace every line-coloured pixel, and each of its 8 neighbours, with the fill colour.
    /// All other pixels are left as they are.
    #[must_use]
    pub fn remove_lines(&self, img: &RgbImage) -> RgbImage {
        let mask = self.line_mask(img);
        let mut out = img.clone();

        if mask.pixels().all(|&p| p != MASKED) {
            return out;
        }

        let expanded = dilate_8_connected(&mask);
        for (out_pix, &mask_pix) in out.pixels_mut().zip(expanded.pixels()) {
            if mask_pix == MASKED {
                *out_pix = self.fill;
            }
        }
        out
    }
}

impl FrameTransform for LineColorFilter {
    fn describe(&self) -> &'static str {
        "remove overlay lines"
    }

    fn validate(&self) -> Result<(), Error> {
        if self.hue_min > self.hue_max {
            return Err(Error::InvalidConfig(format!(
                "hue window is empty: minimum {} is above maximum {}",
                self.hue_min, self.hue_max
            )));
        }
        if self.is_line_colored(self.fill) {
            return Err(Error::InvalidConfig(format!(
                "fill colour {:?} would itself be detected as a line",
                self.fill.0
            )));
        }
        Ok(())
    }

    fn apply(&self, _src_path: &Path, img: DynamicImage) -> Result<DynamicImage, ItemError> {
        // alpha and extra bit depth are dropped
        Ok(DynamicImage::ImageRgb8(self.remove_lines(&img.to_rgb8())))
    }
}

/// Single-pass dilation over the 3x3 neighbourhood. Neighbours outside the image contribute nothing.
#[must_use]
pub fn dilate_8_connected(mask: &GrayImage) -> GrayImage {
    // with the chessboard (L-infinity) norm, the pixels within distance 1 of a
    // foreground pixel are exactly its 8 neighbours.
    morphology::dilate(mask, LInf, 1)
}

/// Hue, saturation and value of an RGB pixel, each quantized to 0-255.
///
/// Quantization truncates, so pure cyan has hue 127 and pure blue 170. The arithmetic is
/// exact: the hue sector is kept as a fraction over `6 * chroma`.
#[must_use]
pub fn hsv_from_rgb(Rgb([r, g, b]): Rgb<u8>) -> [u8; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);

    if max == min {
        return [0, 0, max];
    }

    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let chroma = i32::from(max - min);

    //the hue times 6 * chroma, before wrapping into [0, 6 * chroma)
    let sector = if r == i32::from(max) {
        g - b
    } else if g == i32::from(max) {
        2 * chroma + b - r
    } else {
        4 * chroma + r - g
    };
    let full_turn = 6 * chroma;
    let hue = 255 * sector.rem_euclid(full_turn) / full_turn;
    let sat = 255 * chroma / i32::from(max);

    [to_u8(hue), to_u8(sat), max]
}

fn to_u8(quantized: i32) -> u8 {
    u8::try_from(quantized).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod test {
    use rand::prelude::*;

    use super::*;

    const BLUE: Rgb<u8> = Rgb([20, 60, 230]);
    const PAPER: Rgb<u8> = Rgb([250, 250, 250]);
    const INK: Rgb<u8> = Rgb([10, 10, 10]);

    fn fill() -> Rgb<u8> {
        Rgb(FILL_COLOR)
    }

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv_from_rgb(Rgb([255, 0, 0])), [0, 255, 255]);
        assert_eq!(hsv_from_rgb(Rgb([0, 255, 255])), [127, 255, 255]);

        assert_eq!(hsv_from_rgb(Rgb([0, 0, 255])), [170, 255, 255]);
    }

    #[test]
    fn test_hsv_truncates_exactly() {
        //255 * 338 / 510 is exactly 169
        assert_eq!(hsv_from_rgb(Rgb([0, 2, 85])), [169, 255, 85]);
        //hue wraps below red
        assert_eq!(hsv_from_rgb(Rgb([255, 0, 1])), [254, 255, 255]);
        assert_eq!(hsv_from_rgb(Rgb([200, 100, 50])), [14, 191, 200]);
    }

    #[test]
    fn test_hsv_grays_have_no_hue() {
        assert_eq!(hsv_from_rgb(Rgb([0, 0, 0])), [0, 0, 0]);
        assert_eq!(hsv_from_rgb(Rgb(FILL_COLOR)), [0, 0, 0xF6]);
        assert_eq!(hsv_from_rgb(Rgb([128, 128, 128])), [0, 0, 128]);
    }

    #[test]
    fn test_classification_thresholds() {
        let filter = LineColorFilter::default();

        assert!(filter.is_line_colored(BLUE));
        assert!(filter.is_line_colored(Rgb([0, 200, 200]))); //cyan

        assert!(!filter.is_line_colored(PAPER));
        assert!(!filter.is_line_colored(INK));
        assert!(!filter.is_line_colored(fill()));
        assert!(!filter.is_line_colored(Rgb([200, 30, 30]))); //red
        assert!(!filter.is_line_colored(Rgb([30, 200, 30]))); //green

        //blue hue but almost gray
        assert!(!filter.is_line_colored(Rgb([200, 200, 210])));
        //blue hue but almost black
        assert!(!filter.is_line_colored(Rgb([0, 0, 40])));
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let only_cyan = LineColorFilter {
            hue_min: 120,
            hue_max: 135,
            ..LineColorFilter::default()
        };
        assert!(only_cyan.is_line_colored(Rgb([0, 200, 200])));
        assert!(!only_cyan.is_line_colored(BLUE));
    }

    #[test]
    fn test_degenerate_filters_rejected() {
        assert!(LineColorFilter::default().validate().is_ok());

        let inverted = LineColorFilter {
            hue_min: 150,
            hue_max: 120,
            ..LineColorFilter::default()
        };
        assert!(matches!(inverted.validate(), Err(Error::InvalidConfig(_))));

        let blue_fill = LineColorFilter {
            fill: BLUE,
            ..LineColorFilter::default()
        };
        assert!(blue_fill.validate().is_err());
    }

    #[test]
    fn test_center_pixel_dilates_to_3x3() {
        let mut img = RgbImage::from_pixel(5, 5, PAPER);
        img.put_pixel(2, 2, BLUE);

        let out = LineColorFilter::default().remove_lines(&img);

        for (x, y, pix) in out.enumerate_pixels() {
            let in_block = (1..=3).contains(&x) && (1..=3).contains(&y);
            let expected = if in_block { fill() } else { PAPER };
            assert_eq!(*pix, expected, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn test_corner_pixel_dilates_in_bounds_only() {
        let mut img = RgbImage::from_pixel(5, 5, INK);
        img.put_pixel(0, 0, BLUE);

        let out = LineColorFilter::default().remove_lines(&img);

        let filled = out
            .enumerate_pixels()
            .filter(|(_, _, &pix)| pix == fill())
            .map(|(x, y, _)| (x, y))
            .collect::<Vec<_>>();
        assert_eq!(filled, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn test_opposite_corner() {
        let mut img = RgbImage::from_pixel(3, 4, PAPER);
        img.put_pixel(2, 3, BLUE);

        let mask = dilate_8_connected(&LineColorFilter::default().line_mask(&img));
        let masked = mask
            .enumerate_pixels()
            .filter(|(_, _, &p)| p == MASKED)
            .count();
        assert_eq!(masked, 4);
        assert_eq!(*mask.get_pixel(1, 2), MASKED);
        assert_ne!(*mask.get_pixel(0, 3), MASKED);
    }

    #[test]
    fn test_line_is_widened_by_one_pixel() {
        //a vertical line, 2 pixels wide, at x = 4 and 5
        let img = RgbImage::from_fn(10, 6, |x, _| if x == 4 || x == 5 { BLUE } else { INK });
        let out = LineColorFilter::default().remove_lines(&img);

        for (x, _, pix) in out.enumerate_pixels() {
            let expected = if (3..=6).contains(&x) { fill() } else { INK };
            assert_eq!(*pix, expected);
        }
    }

    #[test]
    fn test_no_line_leaves_image_untouched() {
        let img = RgbImage::from_fn(8, 8, |x, y| if (x + y) % 2 == 0 { PAPER } else { INK });
        assert_eq!(LineColorFilter::default().remove_lines(&img), img);
    }

    #[test]
    fn test_idempotent_on_random_images() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let filter = LineColorFilter::default();

        for _ in 0..20 {
            let img = RgbImage::from_fn(17, 11, |_, _| Rgb(rng.gen::<[u8; 3]>()));
            let once = filter.remove_lines(&img);
            let twice = filter.remove_lines(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_single_pixel_image() {
        let img = RgbImage::from_pixel(1, 1, BLUE);
        let out = LineColorFilter::default().remove_lines(&img);
        assert_eq!(*out.get_pixel(0, 0), fill());
    }
}
