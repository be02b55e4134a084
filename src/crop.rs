use image::{imageops, RgbImage};

/// A rectangular region of an image, stored as the number of pixels trimmed from each edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Crop {
    pub orig_res: (u32, u32),
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Crop {
    /// Returns None if the offsets would leave no pixels in either dimension.
    #[must_use]
    pub fn from_edge_offsets(
        orig_res: (u32, u32),
        left: u32,
        right: u32,
        top: u32,
        bottom: u32,
    ) -> Option<Self> {
        let (orig_width, orig_height) = orig_res;
        if left.checked_add(right)? >= orig_width || top.checked_add(bottom)? >= orig_height {
            return None;
        }

        Some(Self {
            orig_res,
            left,
            right,
            top,
            bottom,
        })
    }

    /// Remove `rows` rows from the top edge, keeping the full width.
    #[must_use]
    pub fn without_top_rows(orig_res: (u32, u32), rows: u32) -> Option<Self> {
        Self::from_edge_offsets(orig_res, 0, 0, rows, 0)
    }

    /// Keep only the topmost `height` rows, keeping the full width.
    #[must_use]
    pub fn keep_top_rows(orig_res: (u32, u32), height: u32) -> Option<Self> {
        let bottom = orig_res.1.checked_sub(height)?;
        Self::from_edge_offsets(orig_res, 0, 0, 0, bottom)
    }

    /// (x, y, width, height) of the retained region.
    #[must_use]
    pub fn as_view_args(&self) -> (u32, u32, u32, u32) {
        (self.left, self.top, self.width(), self.height())
    }

    pub fn width(&self) -> u32 {
        self.orig_res.0 - (self.left + self.right)
    }

    pub fn height(&self) -> u32 {
        self.orig_res.1 - (self.top + self.bottom)
    }

    pub fn is_uncropped(&self) -> bool {
        (self.left == 0) && (self.right == 0) && (self.top == 0) && (self.bottom == 0)
    }

    /// Copy the retained region out of `img`. `img` must have the resolution this crop was made for.
    #[must_use]
    pub fn apply(&self, img: &RgbImage) -> RgbImage {
        debug_assert_eq!(img.dimensions(), self.orig_res);

        if self.is_uncropped() {
            return img.clone();
        }

        let (x, y, w, h) = self.as_view_args();
        imageops::crop_imm(img, x, y, w, h).to_image()
    }
}
