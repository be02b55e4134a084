use lazy_static::lazy_static;
use regex::Regex;

use crate::definitions::{FRAME_EXTENSION, FRAME_INDEX_DIGITS};

lazy_static! {
    static ref FRAME_NAME_RE: Regex = Regex::new(r"^frame_(\d+)\.png$").expect("static regex");
}

/// File name of the frame with the given index, e.g `frame_00042.png`.
///
/// Indices below 10^5 are zero padded so that names sort lexicographically in index order.
#[must_use]
pub fn frame_file_name(index: u64) -> String {
    format!("frame_{index:0width$}.{FRAME_EXTENSION}", width = FRAME_INDEX_DIGITS)
}

/// The index embedded in a `frame_<digits>.png` file name. Any number of digits is
/// accepted, so `frame_7.png` and `frame_00007.png` both give 7.
///
/// Returns None for names that do not match, or whose index does not fit in a u64.
#[must_use]
pub fn parse_frame_number(file_name: &str) -> Option<u64> {
    let caps = FRAME_NAME_RE.captures(file_name)?;
    caps.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_names_are_padded() {
        assert_eq!(frame_file_name(0), "frame_00000.png");
        assert_eq!(frame_file_name(42), "frame_00042.png");
        assert_eq!(frame_file_name(99999), "frame_99999.png");
    }

    #[test]
    fn test_padded_names_sort_like_indices() {
        let mut names = [10, 2, 100, 1].map(frame_file_name);
        names.sort();
        assert_eq!(
            names,
            ["frame_00001.png", "frame_00002.png", "frame_00010.png", "frame_00100.png"]
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse_frame_number("frame_00005.png"), Some(5));
        assert_eq!(parse_frame_number("frame_7.png"), Some(7));
        assert_eq!(parse_frame_number("frame_123456.png"), Some(123456));
    }

    #[test]
    fn test_parse_rejects_other_names() {
        for name in [
            "frame_.png",
            "frame_12.jpg",
            "frame_12.png.bak",
            "myframe_12.png",
            "frame_1a.png",
            "Frame_12.png",
            "frame_99999999999999999999999.png",
        ] {
            assert_eq!(parse_frame_number(name), None, "{name}");
        }
    }
}
