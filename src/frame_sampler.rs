use std::path::{Path, PathBuf};

use ffmpeg_cmdline_utils::{ffmpeg_and_ffprobe_are_callable, FfmpegFrameReaderBuilder};
use image::RgbImage;
use serde::Serialize;

use crate::{
    batch::create_output_dir,
    definitions::{DEFAULT_CROP_RATIO, DEFAULT_SAMPLE_INTERVAL_SECS},
    frame_name::frame_file_name,
    Crop, Error,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerCfg {
    /// Wall-clock seconds between saved frames.
    pub interval_secs: f64,
    /// Saved frames keep their top `floor(height / crop_ratio)` rows.
    pub crop_ratio: f64,
    /// Log progress after this many decoded frames.
    pub progress_every: u64,
}

impl Default for SamplerCfg {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_SAMPLE_INTERVAL_SECS,
            crop_ratio: DEFAULT_CROP_RATIO,
            progress_every: 100,
        }
    }
}

impl SamplerCfg {
    /// Number of decoded frames between saved frames: `floor(fps * interval_secs)`.
    ///
    /// # errors
    /// The interval is not a positive number, or is shorter than one frame at this fps.
    pub fn frame_interval(&self, fps: f64) -> Result<u64, Error> {
        if !(self.interval_secs.is_finite() && self.interval_secs > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "sampling interval must be a positive number of seconds, got {}",
                self.interval_secs
            )));
        }

        let frames = (fps * self.interval_secs).floor();
        if !(frames.is_finite() && frames >= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "sampling interval of {}s is shorter than one frame at {fps:.2} fps",
                self.interval_secs
            )));
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let frames = frames as u64;
        Ok(frames)
    }

    /// The region of a `resolution` sized frame that is kept.
    ///
    /// # errors
    /// The crop ratio is below 1.0, or would leave no rows at this resolution.
    pub fn upper_region(&self, resolution: (u32, u32)) -> Result<Crop, Error> {
        if !(self.crop_ratio.is_finite() && self.crop_ratio >= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "crop ratio must be at least 1.0, got {}",
                self.crop_ratio
            )));
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let keep_rows = (f64::from(resolution.1) / self.crop_ratio).floor() as u32;

        Crop::keep_top_rows(resolution, keep_rows).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "crop ratio {} leaves no rows of a {}x{} frame",
                self.crop_ratio, resolution.0, resolution.1
            ))
        })
    }
}

/// A frame picked by a [`FrameSampler`].
#[derive(Debug, Clone)]
pub struct SampledFrame {
    /// Zero-based position among the saved frames.
    pub index: u64,
    /// One-based position of the frame in the decoded stream.
    pub source_frame: u64,
    pub image: RgbImage,
}

/// Picks every `interval`-th frame (counting from 1) out of a stream of decoded
/// frames and crops it. Frames are consumed strictly in order; none are revisited.
pub struct FrameSampler<I> {
    frames: I,
    interval: u64,
    crop: Crop,
    frames_read: u64,
    frames_sampled: u64,
}

impl<I> FrameSampler<I>
where
    I: Iterator<Item = RgbImage>,
{
    /// `interval` must be at least 1.
    pub fn new(frames: I, interval: u64, crop: Crop) -> Self {
        Self {
            frames,
            interval: interval.max(1),
            crop,
            frames_read: 0,
            frames_sampled: 0,
        }
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    pub fn frames_sampled(&self) -> u64 {
        self.frames_sampled
    }

    /// Like [`Iterator::next`], but calls `on_frame` with the running count for every
    /// decoded frame, sampled or not.
    pub fn next_with_progress(&mut self, mut on_frame: impl FnMut(u64)) -> Option<SampledFrame> {
        loop {
            let frame = self.frames.next()?;
            self.frames_read += 1;
            on_frame(self.frames_read);

            if self.frames_read % self.interval != 0 {
                continue;
            }

            // Frames that do not match the probed resolution cannot be cropped
            // consistently. Skip them rather than produce misaligned output.
            if frame.dimensions() != self.crop.orig_res {
                warn!(
                    "frame {} is {:?}, expected {:?}. Skipping",
                    self.frames_read,
                    frame.dimensions(),
                    self.crop.orig_res
                );
                continue;
            }

            let sampled = SampledFrame {
                index: self.frames_sampled,
                source_frame: self.frames_read,
                image: self.crop.apply(&frame),
            };
            self.frames_sampled += 1;
            return Some(sampled);
        }
    }
}

impl<I> Iterator for FrameSampler<I>
where
    I: Iterator<Item = RgbImage>,
{
    type Item = SampledFrame;

    fn next(&mut self) -> Option<SampledFrame> {
        self.next_with_progress(|_| ())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleReport {
    pub video: PathBuf,
    pub output_dir: PathBuf,
    pub resolution: (u32, u32),
    pub fps: f64,
    pub interval_secs: f64,
    pub frame_interval: u64,
    pub frames_read: u64,
    pub frames_saved: u64,
}

/// Decode `video_path` with ffmpeg and save one cropped frame every `cfg.interval_secs`
/// seconds into `output_dir` as `frame_00000.png`, `frame_00001.png`, ...
///
/// # errors
/// * ffmpeg/ffprobe are not installed, or the video cannot be probed (nothing is written)
/// * the configuration is degenerate for this video (nothing is written)
/// * a sampled frame cannot be written
pub fn extract_frames(
    video_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    cfg: &SamplerCfg,
) -> Result<SampleReport, Error> {
    let video_path = video_path.as_ref();
    let output_dir = output_dir.as_ref();

    if !ffmpeg_and_ffprobe_are_callable() {
        return Err(Error::FfmpegUnavailable);
    }

    let (frames, info) = FfmpegFrameReaderBuilder::new(video_path)
        .spawn_rgb()
        .map_err(|source| Error::OpenVideo {
            path: video_path.to_path_buf(),
            source,
        })?;

    let (width, height) = info.resolution();
    let fps = info.frame_rate();
    let total = info
        .num_frames()
        .map_or_else(|| "?".to_string(), |n| n.to_string());
    info!("Video info: {width}x{height}, {fps:.2} FPS, {total} frames total");

    let frame_interval = cfg.frame_interval(fps)?;
    let crop = cfg.upper_region(info.resolution())?;
    info!(
        "Saving one frame every {} seconds (every {} frames)",
        cfg.interval_secs, frame_interval
    );

    create_output_dir(output_dir)?;

    info!("Processing video...");
    let mut sampler = FrameSampler::new(frames, frame_interval, crop);
    let frames_saved = save_sampled_frames(&mut sampler, output_dir, |n| {
        if cfg.progress_every > 0 && n % cfg.progress_every == 0 {
            info!("Processed: {n}/{total} frames");
        }
    })?;

    info!("Processing complete!");
    info!("Total frames processed: {}", sampler.frames_read());
    info!("Frames saved: {frames_saved}");

    Ok(SampleReport {
        video: video_path.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        resolution: info.resolution(),
        fps,
        interval_secs: cfg.interval_secs,
        frame_interval,
        frames_read: sampler.frames_read(),
        frames_saved,
    })
}

/// Drain `sampler`, writing each sampled frame into `output_dir`. Returns the number of
/// frames written.
pub fn save_sampled_frames<I>(
    sampler: &mut FrameSampler<I>,
    output_dir: &Path,
    mut on_frame: impl FnMut(u64),
) -> Result<u64, Error>
where
    I: Iterator<Item = RgbImage>,
{
    let mut saved = 0;
    while let Some(frame) = sampler.next_with_progress(&mut on_frame) {
        let path = output_dir.join(frame_file_name(frame.index));
        trace!("frame {} -> {}", frame.source_frame, path.display());
        frame
            .image
            .save(&path)
            .map_err(|source| Error::WriteFrame { path, source })?;
        saved += 1;
    }
    Ok(saved)
}

#[cfg(test)]
mod test {
    use image::Rgb;

    use super::*;

    // frame n (1-based) is filled with the value n so it can be identified after saving
    fn numbered_frames(count: u8, width: u32, height: u32) -> impl Iterator<Item = RgbImage> {
        (1..=count).map(move |n| RgbImage::from_pixel(width, height, Rgb([n, n, n])))
    }

    fn cfg(interval_secs: f64, crop_ratio: f64) -> SamplerCfg {
        SamplerCfg {
            interval_secs,
            crop_ratio,
            ..SamplerCfg::default()
        }
    }

    #[test]
    fn test_frame_interval() {
        assert_eq!(cfg(10.0, 2.5).frame_interval(29.97).unwrap(), 299);
        assert_eq!(cfg(9.0, 2.5).frame_interval(30.0).unwrap(), 270);
        assert_eq!(cfg(1.5, 2.5).frame_interval(2.0).unwrap(), 3);
        assert_eq!(cfg(0.5, 2.5).frame_interval(2.0).unwrap(), 1);
    }

    #[test]
    fn test_degenerate_interval_rejected() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                cfg(bad, 2.5).frame_interval(30.0),
                Err(Error::InvalidConfig(_))
            ));
        }
        //shorter than one frame
        assert!(cfg(0.01, 2.5).frame_interval(30.0).is_err());
        //ffprobe did not know the frame rate
        assert!(cfg(10.0, 2.5).frame_interval(0.0).is_err());
    }

    #[test]
    fn test_upper_region() {
        let crop = cfg(10.0, 2.5).upper_region((1920, 1080)).unwrap();
        assert_eq!(crop.as_view_args(), (0, 0, 1920, 432));

        let crop = cfg(10.0, 2.5).upper_region((640, 481)).unwrap();
        assert_eq!(crop.height(), 192);

        let crop = cfg(10.0, 1.0).upper_region((640, 480)).unwrap();
        assert!(crop.is_uncropped());
    }

    #[test]
    fn test_degenerate_crop_ratio_rejected() {
        assert!(cfg(10.0, 0.5).upper_region((640, 480)).is_err());
        assert!(cfg(10.0, f64::NAN).upper_region((640, 480)).is_err());
        //would keep zero rows
        assert!(cfg(10.0, 3.0).upper_region((10, 2)).is_err());
    }

    #[test]
    fn test_every_nth_frame_counting_from_one() {
        let crop = Crop::keep_top_rows((4, 10), 4).unwrap();
        let sampler = FrameSampler::new(numbered_frames(10, 4, 10), 3, crop);

        let sampled = sampler
            .map(|f| (f.index, f.source_frame, f.image.get_pixel(0, 0)[0], f.image.dimensions()))
            .collect::<Vec<_>>();

        assert_eq!(
            sampled,
            vec![(0, 3, 3, (4, 4)), (1, 6, 6, (4, 4)), (2, 9, 9, (4, 4))]
        );
    }

    #[test]
    fn test_interval_of_one_keeps_everything() {
        let crop = Crop::keep_top_rows((2, 2), 2).unwrap();
        let mut sampler = FrameSampler::new(numbered_frames(5, 2, 2), 1, crop);
        assert_eq!(sampler.by_ref().count(), 5);
        assert_eq!(sampler.frames_read(), 5);
        assert_eq!(sampler.frames_sampled(), 5);
    }

    #[test]
    fn test_short_stream_saves_nothing() {
        let crop = Crop::keep_top_rows((2, 2), 1).unwrap();
        let mut sampler = FrameSampler::new(numbered_frames(4, 2, 2), 5, crop);
        assert!(sampler.next().is_none());
        assert_eq!(sampler.frames_read(), 4);
    }

    #[test]
    fn test_mismatched_frame_is_skipped() {
        let crop = Crop::keep_top_rows((2, 2), 1).unwrap();
        let frames = vec![
            RgbImage::new(2, 2),
            RgbImage::new(3, 3),
            RgbImage::new(2, 2),
        ];
        let sampled = FrameSampler::new(frames.into_iter(), 1, crop)
            .map(|f| (f.index, f.source_frame))
            .collect::<Vec<_>>();
        assert_eq!(sampled, vec![(0, 1), (1, 3)]);
    }

    #[test]
    fn test_save_sampled_frames() {
        let out = tempfile::tempdir().unwrap();
        let cfg = cfg(1.5, 2.5);
        let crop = cfg.upper_region((6, 10)).unwrap();
        let mut sampler = FrameSampler::new(
            numbered_frames(10, 6, 10),
            cfg.frame_interval(2.0).unwrap(),
            crop,
        );

        let mut progress = vec![];
        let saved = save_sampled_frames(&mut sampler, out.path(), |n| progress.push(n)).unwrap();

        assert_eq!(saved, 3);
        assert_eq!(progress, (1..=10).collect::<Vec<u64>>());

        for (index, source_frame) in [(0, 3u8), (1, 6), (2, 9)] {
            let img = image::open(out.path().join(frame_file_name(index)))
                .unwrap()
                .to_rgb8();
            assert_eq!(img.dimensions(), (6, 4));
            assert_eq!(*img.get_pixel(5, 3), Rgb([source_frame; 3]));
        }
        assert!(!out.path().join(frame_file_name(3)).exists());
    }
}
