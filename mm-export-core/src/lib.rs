//! Multimedia export primitives for an 8-bit computer emulator.
//!
//! This crate turns in-memory framebuffers and audio buffers into the three
//! output formats a screenshot/recording feature needs:
//!
//! - **Snapshots**: [`pcx::PcxEncoder`] (paletted PCX) and [`png::PngEncoder`]
//!   (indexed or RGB-averaged PNG, behind the `mpng` feature).
//! - **Audio capture**: [`wav::WavWriter`], a standard RIFF/WAVE writer.
//! - **Video capture**: [`avi::AviWriter`], an interleaved RIFF/AVI writer
//!   with a pluggable [`codec::VideoCodec`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use mm_export_core::avi::AviWriter;
//! use mm_export_core::codec::CodecRegistry;
//! use mm_export_core::palette::Palette;
//! use std::fs::File;
//!
//! # fn run() -> Result<(), mm_export_core::error::ExportError> {
//! let registry = CodecRegistry::with_defaults();
//! let codec = registry.resolve("auto")?;
//! let file = File::create("capture.avi")?;
//! let mut writer = AviWriter::open(file, 320, 200, 60.0, 300, codec, Palette::black(), None)?;
//! writer.add_video_frame(&[0u8; 320 * 200])?;
//! writer.close()?;
//! # Ok(())
//! # }
//! ```

pub mod avi;
pub mod byteorder;
pub mod codec;
pub mod config;
pub mod error;
pub mod palette;
pub mod pcx;
#[cfg(feature = "mpng")]
pub mod png;
mod rle;
pub mod sink;
pub mod stats;
pub mod wav;
