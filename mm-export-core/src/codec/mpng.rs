//! Motion-PNG codec: each frame is a standalone indexed PNG. Decoders that
//! understand the `MPNG` FourCC play this back as a normal video stream;
//! anything else at least lets a user extract individual frames as PNGs.
//! Because every frame stands alone, `uses_interframes` is always `false`.

use super::{CodecInfo, VideoCodec};
use crate::error::ExportError;
use crate::palette::{FixedPalette, Palette};
use crate::png::PngEncoder;

pub struct MotionPngCodec {
    width: u32,
    height: u32,
    compression_level: u8,
}

impl MotionPngCodec {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            compression_level: 6,
        }
    }
}

impl VideoCodec for MotionPngCodec {
    fn info(&self) -> CodecInfo {
        CodecInfo {
            id: "mpng",
            fourcc: *b"MPNG",
            avi_compression_tag: u32::from_le_bytes(*b"MPNG"),
            uses_interframes: false,
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
        palette: &Palette,
        _is_keyframe: bool,
    ) -> Result<Vec<u8>, ExportError> {
        let source = FixedPalette(*palette);
        PngEncoder::encode_indexed_to_memory(
            framebuffer,
            self.width,
            self.height,
            &source,
            self.compression_level,
        )
    }

    fn set_compression_level(&mut self, level: u8) {
        self.compression_level = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_a_png_signature_per_frame() {
        let mut codec = MotionPngCodec::new();
        codec.init(2, 2).unwrap();
        let palette = Palette::black();
        let framebuffer = [0u8, 0, 0, 0];
        let encoded = codec.frame(&framebuffer, &palette, true).unwrap();
        assert_eq!(&encoded[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }
}
