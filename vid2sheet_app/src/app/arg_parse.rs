use std::path::PathBuf;

use clap::{value_parser, ArgAction::*, ArgMatches};
use vid2sheet_lib::*;

use crate::app::*;

//subcommands
const EXTRACT: &str = "extract";
const REMOVE_LINES: &str = "remove-lines";
const CROP_TOP: &str = "crop-top";
const RENUMBER: &str = "renumber";
const MAKE_PDF: &str = "make-pdf";

//directories and files
const VIDEO: &str = "Video file";
const INPUT_DIR: &str = "Input directory";
const OUTPUT_DIR: &str = "Output directory";
const FRAMES_DIR: &str = "Frames directory";
const OUTPUT_PDF: &str = "Output PDF";

//frame sampling
const INTERVAL: &str = "Sampling interval";
const CROP_RATIO: &str = "Crop ratio";

//line removal
const HUE_MIN: &str = "Minimum hue";
const HUE_MAX: &str = "Maximum hue";
const SAT_MIN: &str = "Minimum saturation";
const VAL_MIN: &str = "Minimum value";

//top crop
const ROWS: &str = "Rows";

//pdf
const SONG_NAME: &str = "Song name";
const PAGE_SIZE: &str = "Page size";

//output settings
const OUTPUT_FORMAT: &str = "Format";

//Verbosity
const VERBOSITY_QUIET: &str = "Quiet";
const VERBOSITY_VERBOSE: &str = "Verbose";

const DISPLAY_ORDERING: [&str; 17] = [
    //
    //inputs and outputs
    VIDEO,
    INPUT_DIR,
    FRAMES_DIR,
    OUTPUT_DIR,
    OUTPUT_PDF,
    //
    //stage settings
    INTERVAL,
    CROP_RATIO,
    HUE_MIN,
    HUE_MAX,
    SAT_MIN,
    VAL_MIN,
    ROWS,
    SONG_NAME,
    PAGE_SIZE,
    //
    //outputs
    OUTPUT_FORMAT,
    //
    //verbosity
    VERBOSITY_QUIET,
    VERBOSITY_VERBOSE,
];

fn get_ordering(arg_name: &str) -> usize {
    match DISPLAY_ORDERING.iter().position(|x| *x == arg_name) {
        Some(idx) => idx,
        None => {
            panic!("argument not assigned a display order: {arg_name:?}");
        }
    }
}

fn dir_arg(
    id: &'static str,
    long: &'static str,
    default: &'static str,
    help: &'static str,
) -> clap::Arg {
    clap::Arg::new(id)
        .long(long)
        .value_parser(value_parser!(PathBuf))
        .num_args(1)
        .default_value(default)
        .help(help)
        .display_order(get_ordering(id))
}

fn build_extract() -> clap::Command {
    let mut cmd = clap::Command::new(EXTRACT)
        .about("Save one cropped frame every few seconds of a video");

    cmd = cmd.arg(
        clap::Arg::new(VIDEO)
            .long("video")
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .num_args(1)
            .help("The video to sample frames from")
            .display_order(get_ordering(VIDEO)),
    );

    cmd = cmd.arg(dir_arg(
        OUTPUT_DIR,
        "output-dir",
        "sheet_music_frames",
        "Directory the frames are written to. Created if it does not exist",
    ));

    cmd = cmd.arg(
        clap::Arg::new(INTERVAL)
            .long("interval")
            .value_parser(value_parser!(f64))
            .num_args(1)
            .default_value(DEFAULT_SAMPLE_INTERVAL_SECS.to_string())
            .help("Seconds of video between saved frames")
            .display_order(get_ordering(INTERVAL)),
    );

    cmd = cmd.arg(
        clap::Arg::new(CROP_RATIO)
            .long("crop-ratio")
            .value_parser(value_parser!(f64))
            .num_args(1)
            .default_value(DEFAULT_CROP_RATIO.to_string())
            .help("Only the top (height / crop-ratio) rows of each frame are kept. Must be at least 1.0")
            .display_order(get_ordering(CROP_RATIO)),
    );

    cmd
}

fn build_remove_lines() -> clap::Command {
    let mut cmd = clap::Command::new(REMOVE_LINES)
        .about("Paint over the coloured playback marker in every frame");

    cmd = cmd.arg(dir_arg(
        INPUT_DIR,
        "input-dir",
        "sheet_music_frames",
        "Directory containing the frames to clean",
    ));
    cmd = cmd.arg(dir_arg(
        OUTPUT_DIR,
        "output-dir",
        "sheet_music_frames_noline",
        "Directory the cleaned frames are written to. May be the same as the input directory",
    ));

    let thresholds = [
        (HUE_MIN, "hue-min", DEFAULT_HUE_MIN, "Lowest hue (0-255) treated as marker colour"),
        (HUE_MAX, "hue-max", DEFAULT_HUE_MAX, "Highest hue (0-255) treated as marker colour"),
        (SAT_MIN, "sat-min", DEFAULT_SAT_MIN, "Minimum saturation (0-255) of marker pixels"),
        (VAL_MIN, "val-min", DEFAULT_VAL_MIN, "Minimum brightness (0-255) of marker pixels"),
    ];
    for (id, long, default, help) in thresholds {
        cmd = cmd.arg(
            clap::Arg::new(id)
                .long(long)
                .value_parser(value_parser!(u8))
                .num_args(1)
                .default_value(default.to_string())
                .help(help)
                .display_order(get_ordering(id)),
        );
    }

    cmd
}

fn build_crop_top() -> clap::Command {
    let mut cmd =
        clap::Command::new(CROP_TOP).about("Trim a band of rows off the top of every frame");

    cmd = cmd.arg(dir_arg(
        INPUT_DIR,
        "input-dir",
        "sheet_music_frames_noline",
        "Directory containing the frames to crop",
    ));
    cmd = cmd.arg(dir_arg(
        OUTPUT_DIR,
        "output-dir",
        "final_frames",
        "Directory the cropped frames are written to",
    ));

    cmd = cmd.arg(
        clap::Arg::new(ROWS)
            .long("rows")
            .value_parser(value_parser!(u32))
            .num_args(1)
            .default_value(DEFAULT_TOP_CROP_ROWS.to_string())
            .help("Number of pixel rows to remove. Frames that are not taller than this are skipped")
            .display_order(get_ordering(ROWS)),
    );

    cmd
}

fn build_renumber() -> clap::Command {
    clap::Command::new(RENUMBER)
        .about("Renumber frame_<n>.png files to a gapless sequence starting at 0")
        .arg(
            clap::Arg::new(INPUT_DIR)
                .long("dir")
                .value_parser(value_parser!(PathBuf))
                .num_args(1)
                .default_value("sheet_music_frames")
                .help("Directory containing the frames. Other files in it are left alone")
                .display_order(get_ordering(INPUT_DIR)),
        )
}

fn build_make_pdf() -> clap::Command {
    let mut cmd = clap::Command::new(MAKE_PDF).about("Combine frames into a single PDF");

    cmd = cmd.arg(dir_arg(
        FRAMES_DIR,
        "frames-dir",
        "sheet_music_frames",
        "Directory containing frame PNG files",
    ));

    cmd = cmd.arg(
        clap::Arg::new(OUTPUT_PDF)
            .long("output")
            .value_parser(value_parser!(PathBuf))
            .num_args(1)
            .default_value("sheet_music.pdf")
            .help("Output PDF filename")
            .display_order(get_ordering(OUTPUT_PDF)),
    );

    cmd = cmd.arg(
        clap::Arg::new(SONG_NAME)
            .long("song-name")
            .num_args(1)
            .help("Song name to display at top of first page")
            .display_order(get_ordering(SONG_NAME)),
    );

    cmd = cmd.arg(
        clap::Arg::new(PAGE_SIZE)
            .long("page-size")
            .value_parser(value_parser!(PageSizeArg))
            .num_args(1)
            .default_value("a4")
            .help("Paper size of the pages (portrait)")
            .display_order(get_ordering(PAGE_SIZE)),
    );

    cmd
}

pub(super) fn build_app() -> clap::Command {
    //args are not added through method chaining because rustfmt struggles with very long expressions.
    let mut clap_app = clap::Command::new("vid2sheet")
        .version(clap::crate_version!())
        .about("Turn a screen recording of a piano performance into printable sheet music")
        .subcommand_required(true)
        .arg_required_else_help(true);

    clap_app = clap_app
        .subcommand(build_extract())
        .subcommand(build_remove_lines())
        .subcommand(build_crop_top())
        .subcommand(build_renumber())
        .subcommand(build_make_pdf());

    clap_app = clap_app.arg(
        clap::Arg::new(OUTPUT_FORMAT)
            .long("output-format")
            .help("Whether to print the result as normal text, or JSON.")
            .value_parser(value_parser!(OutputFormat))
            .default_value("normal")
            .num_args(1)
            .global(true)
            .display_order(get_ordering(OUTPUT_FORMAT)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_QUIET)
            .long("quiet")
            .help("Only print warnings and errors")
            .conflicts_with(VERBOSITY_VERBOSE)
            .action(SetTrue)
            .global(true)
            .display_order(get_ordering(VERBOSITY_QUIET)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_VERBOSE)
            .long("verbose")
            .help("Increased verbosity")
            .conflicts_with(VERBOSITY_QUIET)
            .action(SetTrue)
            .global(true)
            .display_order(get_ordering(VERBOSITY_VERBOSE)),
    );

    clap_app
}

pub fn parse_args() -> AppCfg {
    let args = build_app().get_matches();
    cfg_from_matches(&args)
}

fn path_arg(args: &ArgMatches, id: &str) -> PathBuf {
    args.get_one::<PathBuf>(id)
        .cloned()
        .expect("This argument has a default value")
}

fn copied_arg<T: Copy + Send + Sync + 'static>(args: &ArgMatches, id: &str) -> T {
    *args
        .get_one::<T>(id)
        .expect("This argument has a default value")
}

pub(super) fn cfg_from_matches(args: &ArgMatches) -> AppCfg {
    let (name, sub_args) = args
        .subcommand()
        .expect("clap is configured to require a subcommand");

    let stage = match name {
        EXTRACT => StageCfg::Extract {
            video: path_arg(sub_args, VIDEO),
            output_dir: path_arg(sub_args, OUTPUT_DIR),
            sampler: SamplerCfg {
                interval_secs: copied_arg(sub_args, INTERVAL),
                crop_ratio: copied_arg(sub_args, CROP_RATIO),
                ..SamplerCfg::default()
            },
        },

        REMOVE_LINES => StageCfg::RemoveLines {
            input_dir: path_arg(sub_args, INPUT_DIR),
            output_dir: path_arg(sub_args, OUTPUT_DIR),
            filter: LineColorFilter {
                hue_min: copied_arg(sub_args, HUE_MIN),
                hue_max: copied_arg(sub_args, HUE_MAX),
                sat_min: copied_arg(sub_args, SAT_MIN),
                val_min: copied_arg(sub_args, VAL_MIN),
                ..LineColorFilter::default()
            },
        },

        CROP_TOP => StageCfg::CropTop {
            input_dir: path_arg(sub_args, INPUT_DIR),
            output_dir: path_arg(sub_args, OUTPUT_DIR),
            crop: TopCropCfg {
                rows: copied_arg(sub_args, ROWS),
            },
        },

        RENUMBER => StageCfg::Renumber {
            dir: path_arg(sub_args, INPUT_DIR),
        },

        MAKE_PDF => StageCfg::MakePdf {
            frames_dir: path_arg(sub_args, FRAMES_DIR),
            output: path_arg(sub_args, OUTPUT_PDF),
            pdf: PdfCfg {
                title: sub_args.get_one::<String>(SONG_NAME).cloned(),
                page_size: copied_arg::<PageSizeArg>(sub_args, PAGE_SIZE).into(),
                ..PdfCfg::default()
            },
        },

        other => unreachable!("unknown subcommand {other:?}"),
    };

    let verbosity = if args.get_flag(VERBOSITY_QUIET) {
        ReportVerbosity::Quiet
    } else if args.get_flag(VERBOSITY_VERBOSE) {
        ReportVerbosity::Verbose
    } else {
        ReportVerbosity::Default
    };

    let output_cfg = OutputCfg {
        verbosity,
        format: copied_arg(args, OUTPUT_FORMAT),
    };

    AppCfg { stage, output_cfg }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::*;

    fn parse(cmdline: &[&str]) -> AppCfg {
        let args = build_app()
            .try_get_matches_from(std::iter::once("vid2sheet").chain(cmdline.iter().copied()))
            .unwrap();
        cfg_from_matches(&args)
    }

    #[test]
    fn test_arg_definitions() {
        build_app().debug_assert();
    }

    #[test]
    fn test_extract_defaults() {
        let cfg = parse(&["extract", "--video", "song.mp4"]);

        assert_eq!(
            cfg.stage,
            StageCfg::Extract {
                video: PathBuf::from("song.mp4"),
                output_dir: PathBuf::from("sheet_music_frames"),
                sampler: SamplerCfg::default(),
            }
        );
        assert_eq!(cfg.output_cfg.verbosity, ReportVerbosity::Default);
        assert_eq!(cfg.output_cfg.format, OutputFormat::Normal);
    }

    #[test]
    fn test_extract_requires_video() {
        assert!(build_app()
            .try_get_matches_from(["vid2sheet", "extract"])
            .is_err());
    }

    #[test]
    fn test_remove_lines_thresholds() {
        let cfg = parse(&["remove-lines", "--hue-min", "120", "--val-min", "80"]);

        let StageCfg::RemoveLines {
            input_dir,
            output_dir,
            filter,
        } = cfg.stage.clone()
        else {
            panic!("wrong stage: {:?}", cfg.stage);
        };
        assert_eq!(input_dir, Path::new("sheet_music_frames"));
        assert_eq!(output_dir, Path::new("sheet_music_frames_noline"));
        assert_eq!(
            filter,
            LineColorFilter {
                hue_min: 120,
                val_min: 80,
                ..LineColorFilter::default()
            }
        );
    }

    #[test]
    fn test_threshold_out_of_range() {
        assert!(build_app()
            .try_get_matches_from(["vid2sheet", "remove-lines", "--hue-max", "300"])
            .is_err());
    }

    #[test]
    fn test_crop_top_and_renumber_defaults() {
        assert_eq!(
            parse(&["crop-top"]).stage,
            StageCfg::CropTop {
                input_dir: PathBuf::from("sheet_music_frames_noline"),
                output_dir: PathBuf::from("final_frames"),
                crop: TopCropCfg::default(),
            }
        );
        assert_eq!(
            parse(&["renumber", "--dir", "frames"]).stage,
            StageCfg::Renumber {
                dir: PathBuf::from("frames"),
            }
        );
    }

    #[test]
    fn test_make_pdf() {
        let cfg = parse(&[
            "make-pdf",
            "--song-name",
            "Für Elise",
            "--page-size",
            "letter",
            "--output-format",
            "json",
            "--quiet",
        ]);

        assert_eq!(
            cfg.stage,
            StageCfg::MakePdf {
                frames_dir: PathBuf::from("sheet_music_frames"),
                output: PathBuf::from("sheet_music.pdf"),
                pdf: PdfCfg {
                    title: Some("Für Elise".to_string()),
                    page_size: PageSize::Letter,
                    ..PdfCfg::default()
                },
            }
        );
        assert_eq!(cfg.output_cfg.format, OutputFormat::Json);
        assert_eq!(cfg.output_cfg.verbosity, ReportVerbosity::Quiet);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(build_app()
            .try_get_matches_from(["vid2sheet", "renumber", "--quiet", "--verbose"])
            .is_err());
    }
}
