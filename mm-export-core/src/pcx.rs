//! PCX snapshot writer.
//!
//! Two output shapes are supported: a plain 8-bit indexed image carrying a
//! 256-color VGA palette trailer, and a 24-bit truecolor image used for the
//! "interlace" blend of two consecutive framebuffers (half-height /
//! interlaced display modes render odd and even fields separately; blending
//! them into one RGB image avoids the color-fringing an indexed average
//! would introduce when two different palette indices are averaged
//! numerically instead of in RGB space).

use std::io::Write;

use crate::error::ExportError;
use crate::palette::PaletteSource;

const PCX_MANUFACTURER: u8 = 0x0A;
const PCX_VERSION: u8 = 5;
const PCX_RLE_ENCODING: u8 = 1;
const PCX_PALETTE_MARKER: u8 = 0x0C;

pub struct PcxEncoder;

impl PcxEncoder {
    pub fn encode_indexed_to_writer<W: Write>(
        framebuffer: &[u8],
        width: u32,
        height: u32,
        palette: &dyn PaletteSource,
        writer: &mut W,
    ) -> Result<(), ExportError> {
        let width = width as usize;
        let height = height as usize;
        if framebuffer.len() != width * height {
            return Err(ExportError::InvalidArgument(format!(
                "framebuffer length {} does not match {}x{}",
                framebuffer.len(),
                width,
                height
            )));
        }

        write_header(writer, width, height, 1)?;

        for row in framebuffer.chunks(width) {
            let mut encoded = Vec::new();
            crate::rle::encode_scanline(row, &mut encoded);
            writer.write_all(&encoded)?;
        }

        writer.write_all(&[PCX_PALETTE_MARKER])?;
        let rgb = palette.palette();
        for color in rgb.0.iter() {
            writer.write_all(&[color.r, color.g, color.b])?;
        }

        Ok(())
    }

    /// Blends `frame_a` and `frame_b` (both palette indices over the same
    /// palette) pixel by pixel in RGB space and writes a 24-bit, 3-plane PCX.
    pub fn encode_interlaced_to_writer<W: Write>(
        frame_a: &[u8],
        frame_b: &[u8],
        width: u32,
        height: u32,
        palette: &dyn PaletteSource,
        writer: &mut W,
    ) -> Result<(), ExportError> {
        let width = width as usize;
        let height = height as usize;
        if frame_a.len() != width * height || frame_b.len() != width * height {
            return Err(ExportError::InvalidArgument(format!(
                "framebuffer length does not match {width}x{height}"
            )));
        }

        write_header(writer, width, height, 3)?;

        let mut plane = vec![0u8; width];
        for row in 0..height {
            let base = row * width;
            for shift in [16u32, 8, 0] {
                for col in 0..width {
                    let a = palette.packed_rgb(frame_a[base + col]);
                    let b = palette.packed_rgb(frame_b[base + col]);
                    let ca = ((a >> shift) & 0xFF) as u16;
                    let cb = ((b >> shift) & 0xFF) as u16;
                    plane[col] = ((ca + cb) / 2) as u8;
                }
                let mut encoded = Vec::new();
                crate::rle::encode_scanline(&plane, &mut encoded);
                writer.write_all(&encoded)?;
            }
        }

        Ok(())
    }
}

fn write_header<W: Write>(
    writer: &mut W,
    width: usize,
    height: usize,
    nplanes: u8,
) -> Result<(), ExportError> {
    let mut header = [0u8; 128];
    header[0] = PCX_MANUFACTURER;
    header[1] = PCX_VERSION;
    header[2] = PCX_RLE_ENCODING;
    header[3] = 8; // bits per pixel per plane
    header[4..6].copy_from_slice(&0u16.to_le_bytes()); // xmin
    header[6..8].copy_from_slice(&0u16.to_le_bytes()); // ymin
    header[8..10].copy_from_slice(&((width - 1) as u16).to_le_bytes()); // xmax
    header[10..12].copy_from_slice(&((height - 1) as u16).to_le_bytes()); // ymax
    header[12..14].copy_from_slice(&0u16.to_le_bytes()); // hdpi
    header[14..16].copy_from_slice(&0u16.to_le_bytes()); // vdpi
    // header[16..64] colormap (EGA palette, unused for our output modes) stays zeroed
    header[64] = 0; // reserved
    header[65] = nplanes;
    header[66..68].copy_from_slice(&(width as u16).to_le_bytes());
    header[68..70].copy_from_slice(&1u16.to_le_bytes()); // palette info: color
    header[70..72].copy_from_slice(&(width as u16).to_le_bytes()); // h_screen_size
    header[72..74].copy_from_slice(&(height as u16).to_le_bytes()); // v_screen_size
    // header[74..128] filler stays zeroed
    writer.write_all(&header)?;
    Ok(())
}
