//! Assembly of a directory of frames into a paginated PDF.

mod font_metrics;
mod layout;

use std::path::{Path, PathBuf};

use image::DynamicImage;
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerIndex, PdfLayerReference, PdfPageIndex, Pt,
};
use serde::Serialize;

pub use self::{
    font_metrics::helvetica_bold_width,
    layout::{PageGeometry, PageLayout, Placement},
};
use crate::{
    batch::{create_output_dir, list_png_files, StageOutcome},
    Error,
};

const LAYER_NAME: &str = "Layer 1";
const UNTITLED: &str = "Sheet music";

/// Images are embedded at one pixel per point before scaling.
const IMAGE_DPI: f32 = 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSize {
    /// 8.27 x 11.69 inches, portrait.
    #[default]
    A4,
    /// 8.5 x 11 inches, portrait.
    Letter,
}

impl PageSize {
    /// (width, height) in points.
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            Self::A4 => (8.27 * 72.0, 11.69 * 72.0),
            Self::Letter => (8.5 * 72.0, 11.0 * 72.0),
        }
    }
}

impl std::str::FromStr for PageSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "letter" => Ok(Self::Letter),
            _ => Err(Error::InvalidConfig(format!("unknown page size: {s}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfCfg {
    pub page_size: PageSize,
    /// Points.
    pub margin: f64,
    /// Points between consecutive images.
    pub spacing: f64,
    /// Drawn centred at the top of the first page.
    pub title: Option<String>,
    pub title_font_size: f64,
    /// Points between the title baseline and the first image.
    pub title_gap: f64,
    /// Log progress after this many images.
    pub progress_every: usize,
}

impl Default for PdfCfg {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margin: 36.0,
            spacing: 10.0,
            title: None,
            title_font_size: 24.0,
            title_gap: 40.0,
            progress_every: 5,
        }
    }
}

impl PdfCfg {
    /// # errors
    /// The margins leave no room on the page, or a length is negative or not finite.
    pub fn geometry(&self) -> Result<PageGeometry, Error> {
        let (width, height) = self.page_size.dimensions();
        let geom = PageGeometry {
            width,
            height,
            margin: self.margin,
            spacing: self.spacing,
        };

        let lengths = [self.margin, self.spacing, self.title_font_size, self.title_gap];
        if lengths.iter().any(|l| !(l.is_finite() && *l >= 0.0)) {
            return Err(Error::InvalidConfig(
                "page margin, spacing and title sizes must be non-negative".to_string(),
            ));
        }
        if geom.usable_width() <= 0.0 || geom.usable_height() <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "a margin of {}pt leaves no room on a {:?} page",
                self.margin, self.page_size
            )));
        }

        Ok(geom)
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfReport {
    pub frames_dir: PathBuf,
    pub output: PathBuf,
    pub page_size: PageSize,
    pub images: usize,
    pub pages: usize,
    /// Images too tall for a page at full width, which were shrunk onto a page of their own.
    pub oversized: usize,
    pub title: Option<String>,
}

/// The document under construction, with the pages started so far.
struct SheetDocument {
    doc: PdfDocumentReference,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    geom: PageGeometry,
}

impl SheetDocument {
    fn new(title: &str, geom: PageGeometry) -> Self {
        let (doc, page, layer) =
            PdfDocument::new(title, mm(geom.width), mm(geom.height), LAYER_NAME);
        Self {
            doc,
            pages: vec![(page, layer)],
            geom,
        }
    }

    fn layer(&mut self, page: usize) -> PdfLayerReference {
        while self.pages.len() <= page {
            let next = self
                .doc
                .add_page(mm(self.geom.width), mm(self.geom.height), LAYER_NAME);
            self.pages.push(next);
        }
        let (page, layer) = self.pages[page];
        self.doc.get_page(page).get_layer(layer)
    }

    fn draw_text(&mut self, text: &str, font: &IndirectFontRef, size: f64, x: f64, y: f64) {
        #[allow(clippy::cast_possible_truncation)]
        self.layer(0).use_text(text, size as f32, mm(x), mm(y), font);
    }

    fn draw_image(&mut self, img: &DynamicImage, placement: &Placement) {
        let (px_width, px_height) = (f64::from(img.width()), f64::from(img.height()));

        #[allow(clippy::cast_possible_truncation)]
        let transform = ImageTransform {
            translate_x: Some(mm(placement.x)),
            translate_y: Some(mm(placement.y)),
            scale_x: Some((placement.width / px_width) as f32),
            scale_y: Some((placement.height / px_height) as f32),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        };

        let layer = self.layer(placement.page);
        Image::from_dynamic_image(img).add_to_layer(layer, transform);
    }
}

#[allow(clippy::cast_possible_truncation)]
fn mm(points: f64) -> Mm {
    Mm::from(Pt(points as f32))
}

/// Stack every PNG in `frames_dir` (in file name order) onto the pages of a new PDF
/// written to `output`.
///
/// The file is written in one go once every image has been placed, so on error no
/// PDF is left behind.
///
/// # errors
/// * `frames_dir` is missing or cannot be listed
/// * the page configuration leaves no room for images
/// * an image cannot be decoded
/// * the PDF cannot be encoded or written
pub fn assemble_pdf(
    frames_dir: impl AsRef<Path>,
    output: impl AsRef<Path>,
    cfg: &PdfCfg,
) -> Result<StageOutcome<PdfReport>, Error> {
    let frames_dir = frames_dir.as_ref();
    let output = output.as_ref();

    let frame_paths = list_png_files(frames_dir)?;
    if frame_paths.is_empty() {
        info!("No PNG files found in {}", frames_dir.display());
        return Ok(StageOutcome::NoInput {
            searched: frames_dir.to_path_buf(),
        });
    }

    let geom = cfg.geometry()?;
    info!("Found {} frames", frame_paths.len());

    let pdf_err = |reason: String| Error::Pdf {
        path: output.to_path_buf(),
        reason,
    };

    let mut document = SheetDocument::new(cfg.title().unwrap_or(UNTITLED), geom);
    let mut layout = PageLayout::new(geom);

    if let Some(title) = cfg.title() {
        let font = document
            .doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| pdf_err(format!("{e:?}")))?;
        let text_width = helvetica_bold_width(title, cfg.title_font_size);
        let (x, baseline) = layout.place_title(text_width, cfg.title_gap);
        document.draw_text(title, &font, cfg.title_font_size, x, baseline);
    }

    let mut oversized = 0;
    for (i, path) in frame_paths.iter().enumerate() {
        let img = image::open(path).map_err(|source| Error::LoadImage {
            path: path.clone(),
            source,
        })?;
        // alpha is dropped; frames are opaque
        let img = DynamicImage::ImageRgb8(img.to_rgb8());

        if i == 0 {
            info!("Frame dimensions: {}x{}", img.width(), img.height());
        }

        let placement = layout.place_image(img.width(), img.height());
        if placement.oversized {
            warn!(
                "{} is too tall to fit on one page at full width. Shrinking it onto its own page",
                path.display()
            );
            oversized += 1;
        }
        trace!("{} -> {:?}", path.display(), placement);
        document.draw_image(&img, &placement);

        if cfg.progress_every > 0 && (i + 1) % cfg.progress_every == 0 {
            info!("Processed {}/{} frames...", i + 1, frame_paths.len());
        }
    }

    let bytes = document
        .doc
        .save_to_bytes()
        .map_err(|e| pdf_err(format!("{e:?}")))?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_output_dir(parent)?;
    }
    std::fs::write(output, bytes).map_err(|e| pdf_err(e.to_string()))?;

    let report = PdfReport {
        frames_dir: frames_dir.to_path_buf(),
        output: output.to_path_buf(),
        page_size: cfg.page_size,
        images: frame_paths.len(),
        pages: layout.page_count(),
        oversized,
        title: cfg.title().map(str::to_string),
    };

    info!("PDF created successfully: {}", output.display());
    info!("Total frames: {}", report.images);
    if let Some(title) = &report.title {
        info!("Song name: {title}");
    }

    Ok(StageOutcome::Completed(report))
}
