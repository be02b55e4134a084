//! Vertical stacking of images onto fixed-size pages.
//!
//! All values are PDF points, with the origin at the bottom-left corner of the page.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    /// Blank border on all four sides.
    pub margin: f64,
    /// Vertical gap between consecutive images.
    pub spacing: f64,
}

impl PageGeometry {
    pub fn usable_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    pub fn usable_height(&self) -> f64 {
        self.height - 2.0 * self.margin
    }

    /// Where the cursor sits on an empty page.
    pub fn top(&self) -> f64 {
        self.height - self.margin
    }
}

/// Where an image goes. `x`/`y` is the bottom-left corner of the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    /// Zero-based page index.
    pub page: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// The image was too tall for a page at full width and was shrunk to fit one.
    pub oversized: bool,
}

/// The running cursor of a document being laid out.
#[derive(Debug, Clone)]
pub struct PageLayout {
    geom: PageGeometry,
    cursor: f64,
    page: usize,
    page_has_content: bool,
}

impl PageLayout {
    pub fn new(geom: PageGeometry) -> Self {
        Self {
            geom,
            cursor: geom.top(),
            page: 0,
            page_has_content: false,
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geom
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    /// Number of pages started so far. At least 1.
    pub fn page_count(&self) -> usize {
        self.page + 1
    }

    fn new_page(&mut self) {
        self.page += 1;
        self.cursor = self.geom.top();
        self.page_has_content = false;
    }

    /// Centre a line of text `text_width` wide on the current page with its baseline at
    /// the cursor, then move the cursor down by `gap`. Returns `(x, baseline_y)`.
    pub fn place_title(&mut self, text_width: f64, gap: f64) -> (f64, f64) {
        let x = (self.geom.width - text_width) / 2.0;
        let baseline = self.cursor;

        self.cursor -= gap;
        self.page_has_content = true;
        (x, baseline)
    }

    /// Place an image of `px_width` x `px_height` pixels below everything placed so far,
    /// scaled to the usable page width.
    ///
    /// A new page is started first when the image would cross the bottom margin and the
    /// current page is not empty. An image that cannot fit even on an empty page gets a
    /// page to itself, shrunk to the usable height and centred horizontally.
    pub fn place_image(&mut self, px_width: u32, px_height: u32) -> Placement {
        let usable_width = self.geom.usable_width();
        let scale = usable_width / f64::from(px_width.max(1));
        let mut width = usable_width;
        let mut height = f64::from(px_height) * scale;

        let oversized = height > self.geom.usable_height();
        if oversized {
            let shrink = self.geom.usable_height() / height;
            width *= shrink;
            height = self.geom.usable_height();
        }

        if self.cursor - height < self.geom.margin && self.page_has_content {
            self.new_page();
        }

        let placement = Placement {
            page: self.page,
            x: (self.geom.width - width) / 2.0,
            y: self.cursor - height,
            width,
            height,
            oversized,
        };

        self.cursor -= height + self.geom.spacing;
        self.page_has_content = true;
        placement
    }
}
