/// Advance widths of Helvetica-Bold for printable ASCII (32..=126), in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0..?
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // P.._
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // `..o
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,      // p..~
];

/// Used for characters outside printable ASCII.
const FALLBACK_WIDTH: u16 = 556;

/// Width in points of `text` set in Helvetica-Bold at `font_size` points.
#[must_use]
pub fn helvetica_bold_width(text: &str, font_size: f64) -> f64 {
    let units: u32 = text
        .chars()
        .map(|c| {
            let idx = (c as usize).wrapping_sub(32);
            u32::from(*HELVETICA_BOLD_WIDTHS.get(idx).unwrap_or(&FALLBACK_WIDTH))
        })
        .sum();

    f64::from(units) * font_size / 1000.0
}
