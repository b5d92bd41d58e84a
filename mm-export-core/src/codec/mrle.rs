//! Built-in run-length video codec. Each frame is encoded scanline by
//! scanline with the same marker-byte scheme as [`crate::pcx`], bottom row
//! first as AVI's MRLE/BI_RLE8 convention expects.
//!
//! Supports real inter-frame encoding: a keyframe encodes every scanline; an
//! inter-frame compares each scanline against the same row of the previous
//! committed frame and, when unchanged, emits a single `SKIP_ROW` marker byte
//! instead of re-encoding it. `SKIP_ROW` (0xC0) is never produced by
//! [`rle::encode_scanline`] on its own (runs start at length 1, so the
//! lowest marker byte it emits is `0xC1`), so the two encodings never
//! collide in the same byte stream.

use super::{CodecInfo, VideoCodec};
use crate::error::ExportError;
use crate::palette::Palette;
use crate::rle;

const SKIP_ROW: u8 = 0xC0;

pub struct RleCodec {
    width: u32,
    height: u32,
    previous: Option<Vec<u8>>,
}

impl RleCodec {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            previous: None,
        }
    }
}

impl VideoCodec for RleCodec {
    fn info(&self) -> CodecInfo {
        CodecInfo {
            id: "mrle",
            fourcc: *b"mrle",
            avi_compression_tag: u32::from_le_bytes(*b"mrle"),
            uses_interframes: true,
        }
    }

    fn init(&mut self, width: u32, height: u32) -> Result<(), ExportError> {
        self.width = width;
        self.height = height;
        self.previous = None;
        Ok(())
    }

    fn frame(
        &mut self,
        framebuffer: &[u8],
        _palette: &Palette,
        is_keyframe: bool,
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

        let mut out = Vec::with_capacity(framebuffer.len() / 2);
        let rows: Vec<&[u8]> = framebuffer.chunks(width).collect();
        let previous_rows: Option<Vec<&[u8]>> = if is_keyframe {
            None
        } else {
            self.previous.as_deref().map(|p| p.chunks(width).collect())
        };

        for (i, row) in rows.iter().enumerate().rev() {
            let unchanged = previous_rows
                .as_ref()
                .is_some_and(|prev| prev[i] == *row);
            if unchanged {
                out.push(SKIP_ROW);
            } else {
                rle::encode_scanline(row, &mut out);
            }
        }

        self.previous = Some(framebuffer.to_vec());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_bottom_up_scanlines() {
        let mut codec = RleCodec::new();
        codec.init(2, 2).unwrap();
        // top row all 1s, bottom row all 2s; codec must emit bottom row first.
        let framebuffer = [1u8, 1, 2, 2];
        let palette = Palette::black();
        let encoded = codec.frame(&framebuffer, &palette, true).unwrap();
        assert_eq!(encoded, vec![0xC2, 2, 0xC2, 1]);
    }

    #[test]
    fn rejects_mismatched_framebuffer_size() {
        let mut codec = RleCodec::new();
        codec.init(4, 4).unwrap();
        let palette = Palette::black();
        let err = codec.frame(&[0u8; 3], &palette, true).unwrap_err();
        assert!(matches!(err, ExportError::InvalidArgument(_)));
    }

    #[test]
    fn reports_interframe_support() {
        let codec = RleCodec::new();
        assert!(codec.info().uses_interframes);
    }

    #[test]
    fn inter_frame_skips_unchanged_rows() {
        let mut codec = RleCodec::new();
        codec.init(2, 2).unwrap();
        let palette = Palette::black();
        codec.frame(&[1u8, 1, 2, 2], &palette, true).unwrap();

        // Bottom row unchanged, top row changed.
        let encoded = codec.frame(&[9u8, 9, 2, 2], &palette, false).unwrap();
        assert_eq!(encoded, vec![SKIP_ROW, 0xC2, 9]);
    }

    #[test]
    fn keyframe_never_skips_rows_even_if_unchanged() {
        let mut codec = RleCodec::new();
        codec.init(2, 2).unwrap();
        let palette = Palette::black();
        codec.frame(&[1u8, 1, 2, 2], &palette, true).unwrap();
        let encoded = codec.frame(&[1u8, 1, 2, 2], &palette, true).unwrap();
        assert!(!encoded.contains(&SKIP_ROW));
    }
}
