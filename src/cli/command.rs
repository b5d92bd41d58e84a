use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};

#[derive(Debug, ClapParser)]
#[command(
    name       = env!("CARGO_PKG_NAME"),
    version    = env!("CARGO_PKG_VERSION"),
    author     = env!("CARGO_PKG_AUTHORS"),
    about      = "Export PCX/PNG snapshots, WAV audio and AVI recordings from raw framebuffer/PCM capture files",
    long_about = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Encode a single raw framebuffer as a PCX or PNG snapshot.
    Snapshot(SnapshotArgs),

    /// Record a sequence of raw framebuffers (and optional raw PCM audio)
    /// into an interleaved AVI.
    Record(RecordArgs),
}

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Raw 8-bit indexed framebuffer (width * height bytes, no header).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output snapshot path.
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,

    /// Framebuffer width in pixels.
    #[arg(long)]
    pub width: u32,

    /// Framebuffer height in pixels.
    #[arg(long)]
    pub height: u32,

    /// Raw 768-byte (256 * RGB) palette file.
    #[arg(long, value_name = "PATH")]
    pub palette: PathBuf,

    /// Snapshot container to write.
    #[arg(long, value_enum, default_value_t = SnapshotFormat::Pcx)]
    pub format: SnapshotFormat,

    /// PNG compression level, 0 (fastest) to 9 (smallest). Ignored for PCX.
    #[arg(long = "compression-level", default_value_t = 6)]
    pub compression_level: u8,
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Raw indexed framebuffer stream: consecutive width * height frames,
    /// no per-frame header.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output AVI path.
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,

    /// Framebuffer width in pixels.
    #[arg(long)]
    pub width: u32,

    /// Framebuffer height in pixels.
    #[arg(long)]
    pub height: u32,

    /// Frame rate in frames per second.
    #[arg(long, default_value_t = 60.0)]
    pub frame_rate: f64,

    /// Raw 768-byte (256 * RGB) palette file.
    #[arg(long, value_name = "PATH")]
    pub palette: PathBuf,

    /// Optional raw PCM audio file interleaved alongside the video.
    #[arg(long, value_name = "PATH")]
    pub audio: Option<PathBuf>,

    /// Load codec/keyframe/compression settings from a `KEY=VALUE` config
    /// file, overriding `--videocodec`/`--keyframe-interval`/`--compression-level`.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Audio channel count, used only when `--audio` is given.
    #[arg(long, default_value_t = 1)]
    pub audio_channels: u16,

    /// Audio sample rate in Hz, used only when `--audio` is given.
    #[arg(long, default_value_t = 44100)]
    pub audio_sample_rate: u32,

    /// Audio sample width in bits, used only when `--audio` is given.
    #[arg(long, default_value_t = 8)]
    pub audio_bits_per_sample: u16,

    /// Video codec id, or "auto" to let the registry pick.
    #[arg(long = "videocodec", default_value = "auto")]
    pub video_codec: String,

    /// Milliseconds between forced keyframes.
    #[arg(long = "keyframe-interval", default_value_t = 1000)]
    pub keyframe_interval: u32,

    /// Codec compression level, 0 (fastest) to 9 (smallest).
    #[arg(long = "compression-level", default_value_t = 6)]
    pub compression_level: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SnapshotFormat {
    Pcx,
    Png,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}
