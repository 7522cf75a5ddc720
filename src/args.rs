use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use webshot::CaptureMode;
use webshot::config::{FilenameConvention, ImageFormat};
use webshot::input::InputFormat;

#[derive(Parser, Debug)]
#[command(name = "webshot")]
#[command(about = "Batch-captures screenshots of a list of URLs via WebDriver")]
#[command(version)]
pub struct Args {
    /// Input file: a URL list or a network-scan XML export ("-" for stdin)
    pub input: String,

    /// Input format (detected from the content when not given)
    #[arg(short = 't', long, value_enum)]
    pub input_format: Option<InputFormatArg>,

    /// Capture mode
    #[arg(short, long, value_enum, default_value_t = ModeArg::Visible)]
    pub mode: ModeArg,

    /// Number of tabs to capture concurrently
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Extra wait after page load, in seconds
    #[arg(long)]
    pub delay: Option<u64>,

    /// Deadline for each tab's capture, in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Image format for captures and downloads
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Encoder quality (0-100, jpg only)
    #[arg(long)]
    pub quality: Option<u8>,

    /// Naming scheme for downloaded images
    #[arg(long, value_enum)]
    pub filename_convention: Option<ConventionArg>,

    /// Subfolder for this batch's downloads and report
    #[arg(long)]
    pub folder: Option<String>,

    /// Skip the spreadsheet export
    #[arg(long)]
    pub no_spreadsheet: bool,

    /// Directory downloads and reports are written into
    #[arg(short, long, default_value = "webshot-output")]
    pub output_dir: PathBuf,

    /// Settings file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum InputFormatArg {
    Urls,
    Nmap,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Visible,
    Fullpage,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Png,
    Jpg,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConventionArg {
    Title,
    Url,
    Index,
}

/// Convert from CLI argument input format to internal input format
pub fn convert_input_format(arg: InputFormatArg) -> InputFormat {
    match arg {
        InputFormatArg::Urls => InputFormat::UrlList,
        InputFormatArg::Nmap => InputFormat::NmapXml,
    }
}

/// Convert from CLI argument mode to internal capture mode
pub fn convert_mode(arg: ModeArg) -> CaptureMode {
    match arg {
        ModeArg::Visible => CaptureMode::Visible,
        ModeArg::Fullpage => CaptureMode::FullPage,
    }
}

/// Convert from CLI argument format to internal image format
pub fn convert_format(arg: FormatArg) -> ImageFormat {
    match arg {
        FormatArg::Png => ImageFormat::Png,
        FormatArg::Jpg => ImageFormat::Jpg,
    }
}

/// Convert from CLI argument convention to internal filename convention
pub fn convert_convention(arg: ConventionArg) -> FilenameConvention {
    match arg {
        ConventionArg::Title => FilenameConvention::Title,
        ConventionArg::Url => FilenameConvention::Url,
        ConventionArg::Index => FilenameConvention::Index,
    }
}
