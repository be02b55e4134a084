use std::path::PathBuf;

use vid2sheet_lib::{LineColorFilter, PageSize, PdfCfg, SamplerCfg, TopCropCfg};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportVerbosity {
    Quiet,
    Default,
    Verbose,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputFormat {
    Normal,
    Json,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageSizeArg {
    A4,
    Letter,
}

impl From<PageSizeArg> for PageSize {
    fn from(arg: PageSizeArg) -> Self {
        match arg {
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Letter => PageSize::Letter,
        }
    }
}

/// The pipeline stage to run, with everything it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum StageCfg {
    Extract {
        video: PathBuf,
        output_dir: PathBuf,
        sampler: SamplerCfg,
    },
    RemoveLines {
        input_dir: PathBuf,
        output_dir: PathBuf,
        filter: LineColorFilter,
    },
    CropTop {
        input_dir: PathBuf,
        output_dir: PathBuf,
        crop: TopCropCfg,
    },
    Renumber {
        dir: PathBuf,
    },
    MakePdf {
        frames_dir: PathBuf,
        output: PathBuf,
        pdf: PdfCfg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputCfg {
    pub verbosity: ReportVerbosity,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppCfg {
    pub stage: StageCfg,
    pub output_cfg: OutputCfg,
}
