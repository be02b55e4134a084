use std::{
    ffi::OsStr,
    io::prelude::*,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    time::Duration,
};

#[cfg(target_family = "windows")]
use std::os::windows::process::CommandExt;

use image::RgbImage;
use wait_timeout::ChildExt;
use FfmpegCommandName::*;
use FfmpegError::*;

use crate::*;

const FFPROBE_TIMEOUT_SECS: u64 = 60;

/// Iterator over the decoded frames of a video, in presentation order.
///
/// Iteration ends cleanly (returns `None`) at end of stream or on a short read.
/// The ffmpeg child process is killed and reaped when the iterator finishes or
/// is dropped.
#[derive(Debug)]
pub struct FfmpegFrameIterRgb {
    x: u32,
    y: u32,
    child: Child,
    frames_read: u64,
    finished: bool,
}

impl FfmpegFrameIterRgb {
    /// Number of frames returned so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    fn finish(&mut self) {
        self.finished = true;
        let _kill_error = self.child.kill();
        let _wait_error = self.child.wait();
    }

    fn frame_buf_size(&self) -> Option<usize> {
        let size = usize::try_from(self.x)
            .ok()?
            .checked_mul(usize::try_from(self.y).ok()?)?
            .checked_mul(3)?;

        // Attempt to prevent OOM on very implausible sizes
        let five_gigabytes = 5_368_709_120_u64;
        (u64::try_from(size).ok()? <= five_gigabytes).then_some(size)
    }
}

impl Iterator for FfmpegFrameIterRgb {
    type Item = RgbImage;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let Some(raw_buf_size) = self.frame_buf_size() else {
            self.finish();
            return None;
        };
        let mut raw_buf = vec![0u8; raw_buf_size];

        let Some(stdout) = self.child.stdout.as_mut() else {
            self.finish();
            return None;
        };

        // read_exact blocks until a whole frame has arrived. A short read means
        // ffmpeg reached the end of the stream (or failed to decode further).
        if stdout.read_exact(&mut raw_buf).is_err() {
            self.finish();
            return None;
        }

        self.frames_read += 1;
        RgbImage::from_raw(self.x, self.y, raw_buf)
    }
}

// to prevent accumulation of zombie processes, reap the return code of
// ffmpeg subcommands (if nothing else has done so already) here
impl Drop for FfmpegFrameIterRgb {
    fn drop(&mut self) {
        if !self.finished {
            self.finish();
        }
    }
}

/// Configures and spawns an ffmpeg process that decodes every frame of a video
/// into raw `rgb24` on its stdout.
#[derive(Clone, Debug)]
pub struct FfmpegFrameReaderBuilder {
    src_path: PathBuf,
}

impl FfmpegFrameReaderBuilder {
    pub fn new(src_path: impl AsRef<Path>) -> Self {
        Self {
            src_path: src_path.as_ref().to_path_buf(),
        }
    }

    pub fn src_path(&self) -> &Path {
        &self.src_path
    }

    /// Probe the video with ffprobe, then start ffmpeg decoding it.
    ///
    /// # errors
    /// * ffprobe/ffmpeg cannot be run
    /// * ffprobe does not recognize the file as a video
    /// * the first video stream has a zero width or height
    pub fn spawn_rgb(&self) -> Result<(FfmpegFrameIterRgb, VideoInfo), FfmpegError> {
        //we need to know the resolution of the video so that stdout can be cut into frames.
        let stats = VideoInfo::new(&self.src_path)?;

        let (x, y) = stats.resolution();
        if x == 0 || y == 0 {
            return Err(InvalidResolution);
        }

        #[rustfmt::skip]
        let mut args = vec![
            OsStr::new("-hide_banner"),
            OsStr::new("-loglevel"), OsStr::new("warning"),
            OsStr::new("-nostats"),
        ];

        #[rustfmt::skip]
        args.extend([
            OsStr::new("-i"),        self.src_path.as_os_str(),
            OsStr::new("-an"),
            OsStr::new("-pix_fmt"),  OsStr::new("rgb24"),
            OsStr::new("-c:v"),      OsStr::new("rawvideo"),
            OsStr::new("-f"),        OsStr::new("image2pipe"),
            OsStr::new("-"),
        ]);

        log::debug!(
            "spawning ffmpeg {}",
            args.iter()
                .map(|arg| arg.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let mut child = spawn_ffmpeg_command(Ffmpeg, &args, true)?;

        //Prevent possible lockup if stderr gets full by dropping the
        //handle from our side
        std::mem::drop(child.stderr.take());

        let frame_iterator = FfmpegFrameIterRgb {
            x,
            y,
            child,
            frames_read: 0,
            finished: false,
        };

        Ok((frame_iterator, stats))
    }
}

/// Run ffprobe on a file and return its format and stream information as a JSON string.
pub fn get_video_stats<P: AsRef<Path>>(src_path: P) -> Result<String, FfmpegError> {
    let args = &[
        OsStr::new("-v"),
        OsStr::new("quiet"),
        OsStr::new("-show_format"),
        OsStr::new("-show_streams"),
        OsStr::new("-print_format"),
        OsStr::new("json"),
        src_path.as_ref().as_os_str(),
    ];

    let stdout = run_ffmpeg_command(Ffprobe, args)?;

    String::from_utf8(stdout).map_err(|_| Utf8Conversion)
}

pub fn ffmpeg_and_ffprobe_are_callable() -> bool {
    [Ffprobe, Ffmpeg]
        .into_iter()
        .all(|name| run_ffmpeg_command(name, &[OsStr::new("-version")]).is_ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FfmpegCommandName {
    Ffprobe,
    Ffmpeg,
}

impl FfmpegCommandName {
    pub fn as_os_str(&self) -> &'static OsStr {
        match self {
            Self::Ffprobe => OsStr::new("ffprobe"),
            Self::Ffmpeg => OsStr::new("ffmpeg"),
        }
    }
}

fn spawn_ffmpeg_command(
    name: FfmpegCommandName,
    args: &[&OsStr],
    stderr_null: bool,
) -> Result<Child, FfmpegError> {
    let stderr_cfg = if stderr_null {
        Stdio::null()
    } else {
        Stdio::piped()
    };

    let mut command = Command::new(name.as_os_str());
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(stderr_cfg);

    //do not spawn a command window on windows when when in a gui application
    #[cfg(target_family = "windows")]
    command.creation_flags(winapi::um::winbase::CREATE_NO_WINDOW);

    command.spawn().map_err(|e| match e.kind() {
        //Separate out NotFound from all other errors as by far the most likely
        //cause is ffmpeg is not installed.
        std::io::ErrorKind::NotFound => FfmpegNotFound,
        _ => Io(format!("{:?}", e.kind())),
    })
}

// Run ffmpeg/ffprobe to completion and return its stdout.
fn run_ffmpeg_command(name: FfmpegCommandName, args: &[&OsStr]) -> Result<Vec<u8>, FfmpegError> {
    fn truncate_ffmpeg_err_msg(stderr: &[u8]) -> FfmpegError {
        //sometimes ffmpeg creates very long error messages. Limit them to the first 500 characters
        match std::str::from_utf8(stderr) {
            Ok(error_text) => FfmpegInternal(error_text.chars().take(500).collect::<String>()),
            Err(_) => Utf8Conversion,
        }
    }

    let mut child = spawn_ffmpeg_command(name, args, false)?;

    // Drain stdout and stderr on their own threads so that a chatty child can never
    // block on a full pipe while we wait for it to exit.
    let stdout_reader = child.stdout.take().map(|mut stdout| {
        std::thread::spawn(move || {
            let mut acc = vec![];
            stdout.read_to_end(&mut acc).map(|_| acc)
        })
    });
    let stderr_reader = child.stderr.take().map(|mut stderr| {
        std::thread::spawn(move || {
            let mut acc = vec![];
            stderr.read_to_end(&mut acc).map(|_| acc)
        })
    });

    let status = match child.wait_timeout(Duration::from_secs(FFPROBE_TIMEOUT_SECS)) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _kill_error = child.kill();
            let _wait_error = child.wait();
            return Err(Timeout);
        }
        Err(e) => return Err(Io(format!("{:?}", e.kind()))),
    };

    let join = |reader: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>| {
        match reader.map(std::thread::JoinHandle::join) {
            Some(Ok(Ok(bytes))) => Ok(bytes),
            Some(Ok(Err(e))) => Err(Io(format!("{:?}", e.kind()))),
            Some(Err(_)) => Err(Io("output reader thread panicked".to_string())),
            None => Ok(vec![]),
        }
    };

    let stdout = join(stdout_reader)?;
    let stderr = join(stderr_reader)?;

    //The shell successfully executed it, but maybe it returned an error code
    if status.success() {
        Ok(stdout)
    } else {
        Err(truncate_ffmpeg_err_msg(&stderr))
    }
}
