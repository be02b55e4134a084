use std::path::Path;

use image::{Rgb, RgbImage};
use itertools::Itertools;
use rand::prelude::*;
use vid2sheet_lib::*;

const PAPER: Rgb<u8> = Rgb([252, 252, 250]);
const INK: Rgb<u8> = Rgb([15, 15, 20]);
const MARKER: Rgb<u8> = Rgb([30, 90, 235]);
const BAND: Rgb<u8> = Rgb([90, 90, 90]);

const WIDTH: u32 = 64;
const HEIGHT: u32 = 160;

/// A fake video frame: the score (staff lines on paper) in the upper part, with a
/// playback marker at `marker_x` and a gray band across the very top. The lower part of
/// the frame is the piano keyboard.
fn video_frame(marker_x: u32) -> RgbImage {
    RgbImage::from_fn(WIDTH, HEIGHT, |x, y| match y {
        0..=23 => BAND,
        _ if y >= 64 => Rgb([40, 40, 40]),
        _ if x == marker_x || x == marker_x + 1 => MARKER,
        _ if y % 8 == 0 => INK,
        _ => PAPER,
    })
}

fn frame_names(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .sorted()
        .collect()
}

#[test]
fn test_frames_to_pdf() {
    let work = tempfile::tempdir().unwrap();
    let frames_dir = work.path().join("sheet_music_frames");
    let noline_dir = work.path().join("sheet_music_frames_noline");
    let final_dir = work.path().join("final_frames");
    let pdf_path = work.path().join("sheet_music.pdf");

    // 2 fps "video" of 40 frames, sampled every 3 seconds
    let cfg = SamplerCfg {
        interval_secs: 3.0,
        ..SamplerCfg::default()
    };
    let crop = cfg.upper_region((WIDTH, HEIGHT)).unwrap();
    assert_eq!(crop.height(), 64);

    let frames = (0..40).map(|i| video_frame(4 + i));
    let mut sampler = FrameSampler::new(frames, cfg.frame_interval(2.0).unwrap(), crop);
    std::fs::create_dir(&frames_dir).unwrap();
    let saved = save_sampled_frames(&mut sampler, &frames_dir, |_| ()).unwrap();

    // frames 6, 12, .., 36
    assert_eq!(saved, 6);
    assert_eq!(sampler.frames_read(), 40);

    // a duplicate page is deleted by hand, leaving a gap
    std::fs::remove_file(frames_dir.join("frame_00002.png")).unwrap();
    let renumbered = renumber_frames(&frames_dir).unwrap().completed().unwrap();
    assert_eq!(renumbered.old_range, (0, 5));
    assert_eq!(renumbered.new_range, (0, 4));
    assert_eq!(
        frame_names(&frames_dir),
        (0..5).map(frame_file_name).collect::<Vec<_>>()
    );

    let filter = LineColorFilter::default();
    let report = process_dir(&frames_dir, &noline_dir, &filter)
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(report.processed, 5);
    assert!(report.failed.is_empty());

    for name in frame_names(&noline_dir) {
        let img = image::open(noline_dir.join(&name)).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (WIDTH, 64));
        assert!(
            img.pixels().all(|&p| !filter.is_line_colored(p)),
            "{name} still has marker pixels"
        );
        // the ink away from the marker is untouched
        assert_eq!(*img.get_pixel(WIDTH - 1, 32), INK);
    }

    let report = process_dir(&noline_dir, &final_dir, &TopCropCfg::default())
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(report.processed, 5);

    let first = image::open(final_dir.join("frame_00000.png")).unwrap().to_rgb8();
    assert_eq!(first.dimensions(), (WIDTH, 40));
    assert!(first.pixels().all(|&p| p != BAND));

    let pdf_cfg = PdfCfg {
        title: Some("Test Piece".to_string()),
        ..PdfCfg::default()
    };
    let report = assemble_pdf(&final_dir, &pdf_path, &pdf_cfg)
        .unwrap()
        .completed()
        .unwrap();

    // each frame is 523.44 x 327.15pt at A4 width, so two fit on a page (also below the
    // title) and the five frames take 2 + 2 + 1
    assert_eq!(report.images, 5);
    assert_eq!(report.pages, 3);
    assert!(std::fs::read(&pdf_path).unwrap().starts_with(b"%PDF-"));
}

#[test]
fn test_one_bad_frame_does_not_stop_the_pipeline() {
    let work = tempfile::tempdir().unwrap();
    let input = work.path().join("in");
    let output = work.path().join("out");
    std::fs::create_dir(&input).unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    for i in 0..6 {
        let marker_x = rng.gen_range(0..WIDTH - 1);
        let frame = video_frame(marker_x);
        let frame = image::imageops::crop_imm(&frame, 0, 0, WIDTH, 64).to_image();
        frame.save(input.join(frame_file_name(i))).unwrap();
    }
    std::fs::write(input.join("frame_00003.png"), b"truncated").unwrap();

    let report = process_dir(&input, &output, &LineColorFilter::default())
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(report.processed, 5);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, input.join("frame_00003.png"));

    let report = process_dir(&output, &output, &TopCropCfg { rows: 100 })
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(report.processed, 0);
    assert_eq!(report.failed.len(), 5);

    // frames that could not be cropped are left as they were
    let img = image::open(output.join("frame_00000.png")).unwrap().to_rgb8();
    assert_eq!(img.height(), 64);
}

#[test]
fn test_reports_serialize() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = process_dir(dir.path(), dir.path().join("out"), &TopCropCfg::default())
        .unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["outcome"], "no_input");
    assert_eq!(json["searched"], dir.path().to_str().unwrap());
}
