use std::path::Path;

use image::{DynamicImage, GenericImageView};

use crate::{batch::FrameTransform, definitions::DEFAULT_TOP_CROP_ROWS, Crop, ItemError};

/// Trims a band of rows off the top of every frame (left behind by the recording's
/// overlay after line removal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopCropCfg {
    pub rows: u32,
}

impl Default for TopCropCfg {
    fn default() -> Self {
        Self {
            rows: DEFAULT_TOP_CROP_ROWS,
        }
    }
}

impl TopCropCfg {
    /// Returns None unless `rows` is less than the image height. The pixel format of
    /// `img` is kept.
    #[must_use]
    pub fn crop_top(&self, img: &DynamicImage) -> Option<DynamicImage> {
        let crop = Crop::without_top_rows(img.dimensions(), self.rows)?;
        let (x, y, width, height) = crop.as_view_args();
        Some(img.crop_imm(x, y, width, height))
    }
}

impl FrameTransform for TopCropCfg {
    fn describe(&self) -> &'static str {
        "crop top rows"
    }

    fn apply(&self, src_path: &Path, img: DynamicImage) -> Result<DynamicImage, ItemError> {
        self.crop_top(&img).ok_or_else(|| ItemError::CropTooLarge {
            path: src_path.to_path_buf(),
            rows: self.rows,
            height: img.height(),
        })
    }
}

#[cfg(test)]
mod test {
    use image::{ColorType, ImageBuffer, Rgb, RgbImage, Rgba};
    type Rgba16Image = ImageBuffer<Rgba<u16>, Vec<u16>>;

    use super::*;
    use crate::{batch::process_dir, StageOutcome};

    fn striped(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, y| Rgb([y as u8, 0, 0])))
    }

    #[test]
    fn test_rows_removed_from_top() {
        let img = striped(7, 40);
        let out = TopCropCfg::default().crop_top(&img).unwrap().to_rgb8();

        assert_eq!(out.dimensions(), (7, 16));
        for (_, y, pix) in out.enumerate_pixels() {
            assert_eq!(*pix, Rgb([y as u8 + 24, 0, 0]));
        }
    }

    #[test]
    fn test_zero_rows_is_identity() {
        let img = striped(3, 5);
        assert_eq!(TopCropCfg { rows: 0 }.crop_top(&img).unwrap(), img);
    }

    #[test]
    fn test_leaves_single_row() {
        let img = striped(3, 5);
        let out = TopCropCfg { rows: 4 }.crop_top(&img).unwrap().to_rgb8();
        assert_eq!(out.dimensions(), (3, 1));
        assert_eq!(*out.get_pixel(2, 0), Rgb([4, 0, 0]));
    }

    #[test]
    fn test_too_many_rows_is_item_error() {
        let img = striped(3, 24);
        let err = TopCropCfg::default()
            .apply(Path::new("frame_00003.png"), img)
            .unwrap_err();

        assert!(matches!(
            err,
            ItemError::CropTooLarge {
                rows: 24,
                height: 24,
                ..
            }
        ));
        assert_eq!(err.path(), Path::new("frame_00003.png"));
    }

    #[test]
    fn test_alpha_and_bit_depth_survive_a_batch() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();

        let translucent = Rgba([1000, 20000, 65535, 1234]);
        Rgba16Image::from_pixel(4, 30, translucent)
            .save(input.path().join("frame_00000.png"))
            .unwrap();

        let outcome = process_dir(input.path(), output.path(), &TopCropCfg::default()).unwrap();
        assert!(matches!(outcome, StageOutcome::Completed(_)));

        let out = image::open(output.path().join("frame_00000.png")).unwrap();
        assert_eq!(out.color(), ColorType::Rgba16);
        assert_eq!(out.dimensions(), (4, 6));
        assert_eq!(*out.to_rgba16().get_pixel(3, 5), translucent);
    }
}
