use std::error::Error;

use vid2sheet_lib::*;

use crate::app::{report_output::print_outcome, *};

pub fn run_app() -> i32 {
    let cfg = arg_parse::parse_args();
    configure_logs(cfg.output_cfg);

    let ret = match run_app_inner(&cfg) {
        Ok(()) => 0,
        Err(fatal_error) => {
            print_fatal_err(fatal_error, cfg.output_cfg.verbosity);
            1
        }
    };

    ret
}

fn run_app_inner(cfg: &AppCfg) -> eyre::Result<()> {
    let format = cfg.output_cfg.format;

    match &cfg.stage {
        StageCfg::Extract {
            video,
            output_dir,
            sampler,
        } => {
            let report = extract_frames(video, output_dir, sampler).map_err(AppError::from)?;
            print_outcome(&StageOutcome::Completed(report), format)?;
        }

        StageCfg::RemoveLines {
            input_dir,
            output_dir,
            filter,
        } => {
            let outcome = process_dir(input_dir, output_dir, filter).map_err(AppError::from)?;
            print_outcome(&outcome, format)?;
        }

        StageCfg::CropTop {
            input_dir,
            output_dir,
            crop,
        } => {
            let outcome = process_dir(input_dir, output_dir, crop).map_err(AppError::from)?;
            print_outcome(&outcome, format)?;
        }

        StageCfg::Renumber { dir } => {
            let outcome = renumber_frames(dir).map_err(AppError::from)?;
            print_outcome(&outcome, format)?;
        }

        StageCfg::MakePdf {
            frames_dir,
            output,
            pdf,
        } => {
            let outcome = assemble_pdf(frames_dir, output, pdf).map_err(AppError::from)?;
            print_outcome(&outcome, format)?;
        }
    }

    Ok(())
}

fn print_fatal_err(fatal_err: eyre::Report, verbosity: ReportVerbosity) {
    error!(target: "app-errorlog", "{}", fatal_err);

    if verbosity == ReportVerbosity::Verbose {
        let mut source: Option<&(dyn Error + 'static)> = fatal_err.source();
        while let Some(e) = source {
            error!(target: "app-errorlog", "    caused by: {}", e);
            source = e.source();
        }
    }
}

pub fn configure_logs(output_cfg: OutputCfg) {
    use simplelog::*;

    let mut cfg = simplelog::ConfigBuilder::new();
    cfg.set_time_level(LevelFilter::Off);
    cfg.set_target_level(LevelFilter::Off);
    cfg.set_thread_level(LevelFilter::Off);

    let min_loglevel = match output_cfg.verbosity {
        ReportVerbosity::Quiet => LevelFilter::Warn,
        ReportVerbosity::Default => LevelFilter::Info,
        ReportVerbosity::Verbose => LevelFilter::Trace,
    };

    TermLogger::init(
        min_loglevel,
        cfg.build(),
        log_terminal_mode(output_cfg.format),
        ColorChoice::Auto,
    )
    .expect("TermLogger failed to initialize");
}

// stdout carries nothing but the report when it is JSON
fn log_terminal_mode(format: OutputFormat) -> simplelog::TerminalMode {
    match format {
        OutputFormat::Normal => simplelog::TerminalMode::Mixed,
        OutputFormat::Json => simplelog::TerminalMode::Stderr,
    }
}
