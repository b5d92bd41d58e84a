//! Stand-in for DOSBox's ZMBV codec.
//!
//! Real ZMBV does block-motion compensation against the previous frame
//! before a final zlib pass; implementing that motion search is out of
//! scope here. This codec only exercises the registry's "auto prefers
//! zmbv" behavior and the `uses_interframes` plumbing in
//! [`crate::avi::AviWriter`] — it zlib-compresses each raw framebuffer
//! independently and reports a codec id so callers can see exactly what
//! they got. It is not bitstream-compatible with DOSBox's ZMBV.

use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::io::Write;

use super::{CodecInfo, VideoCodec};
use crate::error::ExportError;
use crate::palette::Palette;

pub struct ZmbvStubCodec {
    width: u32,
    height: u32,
    compression_level: u8,
}

impl ZmbvStubCodec {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            compression_level: 6,
        }
    }
}

impl VideoCodec for ZmbvStubCodec {
    fn info(&self) -> CodecInfo {
        CodecInfo {
            id: "zmbv",
            fourcc: *b"ZMBV",
            avi_compression_tag: u32::from_le_bytes(*b"ZMBV"),
            uses_interframes: true,
        }
    }

    fn init(&mut self, width: u32, height: u32) -> Result<(), ExportError> {
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn frame(
        &mut self,
        framebuffer: &[u8],
        _palette: &Palette,
        _is_keyframe: bool,
    ) -> Result<Vec<u8>, ExportError> {
        let width = self.width as usize;
        let height = self.height as usize;
        if framebuffer.len() != width * height {
            return Err(ExportError::InvalidArgument(format!(
                "framebuffer length {} does not match {}x{}",
                framebuffer.len(),
                width,
                height
            )));
        }

        let mut encoder =
            ZlibEncoder::new(Vec::new(), Compression::new(self.compression_level as u32));
        encoder
            .write_all(framebuffer)
            .map_err(|e| ExportError::Codec(e.to_string()))?;
        encoder.finish().map_err(|e| ExportError::Codec(e.to_string()))
    }

    fn set_compression_level(&mut self, level: u8) {
        self.compression_level = level.min(9);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compresses_a_flat_frame_smaller_than_raw() {
        let mut codec = ZmbvStubCodec::new();
        codec.init(64, 64).unwrap();
        let framebuffer = vec![0u8; 64 * 64];
        let palette = Palette::black();
        let encoded = codec.frame(&framebuffer, &palette, true).unwrap();
        assert!(encoded.len() < framebuffer.len());
    }
}
