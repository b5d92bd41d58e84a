//! PNG snapshot writer, built on the `png` crate rather than a hand-rolled
//! DEFLATE implementation.

use std::io::Write;

use crate::error::ExportError;
use crate::palette::PaletteSource;

/// A `Write` sink that accumulates into an in-memory buffer up to `limit`
/// bytes, then turns every subsequent write into an `ExportError`. Used when
/// a caller wants an encoded PNG entirely in memory (e.g. one frame of the
/// Motion-PNG codec) without risking an unbounded allocation.
pub struct SizeAccumulatingSink {
    buf: Vec<u8>,
    limit: usize,
    overflowed: bool,
}

impl SizeAccumulatingSink {
    pub fn new(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
            overflowed: false,
        }
    }

    pub fn into_inner(self) -> Result<Vec<u8>, ExportError> {
        if self.overflowed {
            Err(ExportError::BufferOverflow(
                "PNG frame exceeded the in-memory size limit",
            ))
        } else {
            Ok(self.buf)
        }
    }
}

impl Write for SizeAccumulatingSink {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        if self.overflowed || self.buf.len() + data.len() > self.limit {
            self.overflowed = true;
            return Ok(data.len());
        }
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Maps the spec's `0..=9` compression-level scale (0 fastest, 9 smallest)
/// onto the `png` crate's named presets.
fn compression_preset(level: u8) -> png::Compression {
    match level {
        0..=2 => png::Compression::Fast,
        3..=7 => png::Compression::Default,
        _ => png::Compression::Best,
    }
}

pub struct PngEncoder;

impl PngEncoder {
    pub fn encode_indexed_to_writer<W: Write>(
        framebuffer: &[u8],
        width: u32,
        height: u32,
        palette: &dyn PaletteSource,
        compression_level: u8,
        writer: W,
    ) -> Result<(), ExportError> {
        if framebuffer.len() != (width * height) as usize {
            return Err(ExportError::InvalidArgument(format!(
                "framebuffer length {} does not match {}x{}",
                framebuffer.len(),
                width,
                height
            )));
        }

        let mut png_encoder = png::Encoder::new(writer, width, height);
        png_encoder.set_color(png::ColorType::Indexed);
        png_encoder.set_depth(png::BitDepth::Eight);
        png_encoder.set_compression(compression_preset(compression_level));

        let rgb = palette.palette();
        let mut palette_bytes = Vec::with_capacity(768);
        for color in rgb.0.iter() {
            palette_bytes.extend_from_slice(&[color.r, color.g, color.b]);
        }
        png_encoder.set_palette(palette_bytes);

        let mut stream = png_encoder
            .write_header()
            .map_err(|e| ExportError::Codec(e.to_string()))?;
        stream
            .write_image_data(framebuffer)
            .map_err(|e| ExportError::Codec(e.to_string()))?;
        Ok(())
    }

    pub fn encode_indexed_to_memory(
        framebuffer: &[u8],
        width: u32,
        height: u32,
        palette: &dyn PaletteSource,
        compression_level: u8,
    ) -> Result<Vec<u8>, ExportError> {
        let mut sink = SizeAccumulatingSink::new(64 * 1024 * 1024);
        Self::encode_indexed_to_writer(
            framebuffer,
            width,
            height,
            palette,
            compression_level,
            &mut sink,
        )?;
        sink.into_inner()
    }

    /// Blends two framebuffers in RGB space the same way
    /// [`crate::pcx::PcxEncoder::encode_interlaced_to_writer`] does, writing
    /// a truecolor (non-indexed) PNG.
    pub fn encode_rgb_average_to_writer<W: Write>(
        frame_a: &[u8],
        frame_b: &[u8],
        width: u32,
        height: u32,
        palette: &dyn PaletteSource,
        writer: W,
    ) -> Result<(), ExportError> {
        let pixel_count = (width * height) as usize;
        if frame_a.len() != pixel_count || frame_b.len() != pixel_count {
            return Err(ExportError::InvalidArgument(format!(
                "framebuffer length does not match {width}x{height}"
            )));
        }

        let mut rgb = Vec::with_capacity(pixel_count * 3);
        for i in 0..pixel_count {
            let a = palette.packed_rgb(frame_a[i]);
            let b = palette.packed_rgb(frame_b[i]);
            for shift in [16u32, 8, 0] {
                let ca = (a >> shift) & 0xFF;
                let cb = (b >> shift) & 0xFF;
                rgb.push((((ca + cb) / 2) & 0xFF) as u8);
            }
        }

        let mut png_encoder = png::Encoder::new(writer, width, height);
        png_encoder.set_color(png::ColorType::Rgb);
        png_encoder.set_depth(png::BitDepth::Eight);
        let mut stream = png_encoder
            .write_header()
            .map_err(|e| ExportError::Codec(e.to_string()))?;
        stream
            .write_image_data(&rgb)
            .map_err(|e| ExportError::Codec(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{FixedPalette, Palette};
    use std::io::Cursor;

    #[test]
    fn encoded_png_starts_with_signature() {
        let framebuffer = [0u8; 16];
        let palette = FixedPalette(Palette::black());
        let mut out = Cursor::new(Vec::new());
        PngEncoder::encode_indexed_to_writer(&framebuffer, 4, 4, &palette, 6, &mut out).unwrap();
        let buf = out.into_inner();
        assert_eq!(&buf[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn rejects_mismatched_framebuffer_size() {
        let palette = FixedPalette(Palette::black());
        let mut out = Cursor::new(Vec::new());
        let err = PngEncoder::encode_indexed_to_writer(&[0u8; 3], 4, 4, &palette, 6, &mut out)
            .unwrap_err();
        assert!(matches!(err, ExportError::InvalidArgument(_)));
    }

    #[test]
    fn size_accumulating_sink_reports_overflow() {
        let mut sink = SizeAccumulatingSink::new(4);
        sink.write_all(&[0u8; 8]).unwrap();
        let err = sink.into_inner().unwrap_err();
        assert!(matches!(err, ExportError::BufferOverflow(_)));
    }

    #[test]
    fn size_accumulating_sink_under_limit_is_ok() {
        let mut sink = SizeAccumulatingSink::new(16);
        sink.write_all(&[0u8; 8]).unwrap();
        assert_eq!(sink.into_inner().unwrap().len(), 8);
    }
}
