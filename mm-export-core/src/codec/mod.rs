//! Pluggable video codec surface used by [`crate::avi::AviWriter`].
//!
//! A codec converts one paletted framebuffer into the bytes that go into a
//! `00dc` chunk. Callers never see the encoded format directly; they only
//! see [`CodecInfo`] metadata (FourCC, AVI compression tag, whether the
//! codec emits delta frames).

mod mrle;
mod registry;

#[cfg(feature = "mpng")]
mod mpng;
#[cfg(feature = "zmbv")]
mod zmbv_stub;

pub use registry::{CodecEntry, CodecRegistry};

use crate::error::ExportError;
use crate::palette::Palette;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecInfo {
    pub id: &'static str,
    pub fourcc: [u8; 4],
    /// `biCompression` value written into the stream's `strf` header.
    pub avi_compression_tag: u32,
    /// Whether frames after the first may depend on the previous frame.
    /// Codecs that report `false` here are always re-encoded as keyframes.
    pub uses_interframes: bool,
}

/// A frame encoder producing the payload bytes of one `00dc` chunk.
///
/// `init` is called once per recording with the framebuffer dimensions.
/// `frame` is called once per video frame, in order; `is_keyframe` tells the
/// codec whether it may skip delta encoding and is free to ignore it if it
/// has no concept of delta frames. `end` finalizes any codec-internal state
/// (e.g. flushing a compressor) and is called once at close.
pub trait VideoCodec {
    fn info(&self) -> CodecInfo;

    fn init(&mut self, width: u32, height: u32) -> Result<(), ExportError>;

    fn frame(
        &mut self,
        framebuffer: &[u8],
        palette: &Palette,
        is_keyframe: bool,
    ) -> Result<Vec<u8>, ExportError>;

    fn end(&mut self) -> Result<(), ExportError> {
        Ok(())
    }

    /// Sets the codec's compression effort, `0` (fastest) to `9` (smallest).
    /// Codecs with no compression knob leave this a no-op.
    fn set_compression_level(&mut self, _level: u8) {}
}
