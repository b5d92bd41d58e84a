//! Standard 44-byte-header RIFF/WAVE writer for captured audio.
//!
//! Unlike the Sony Wave64 container this crate's teacher otherwise models
//! its chunked I/O on, WAVE's `RIFF`/`fmt `/`data` layout fits in a 32-bit
//! size field, so no GUID-keyed chunk lookup is needed: the header is
//! written once at open with placeholder sizes and backpatched in place at
//! close, the same way [`crate::avi::AviWriter`] backpatches its own
//! headers but over a much smaller region.

use std::io::{Seek, Write};

use crate::error::ExportError;
use crate::sink::ByteSink;

const MAX_RECORDING_SIZE: u64 = 0x_FFF0_0000;

pub struct WavWriter<W: Write + Seek> {
    sink: ByteSink<W>,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    data_bytes_written: u64,
    finished: bool,
}

impl<W: Write + Seek> WavWriter<W> {
    pub fn open(
        inner: W,
        channels: u16,
        sample_rate: u32,
        bits_per_sample: u16,
    ) -> Result<Self, ExportError> {
        let mut sink = ByteSink::new(inner);
        write_header(&mut sink, channels, sample_rate, bits_per_sample, 0)?;

        Ok(Self {
            sink,
            channels,
            sample_rate,
            bits_per_sample,
            data_bytes_written: 0,
            finished: false,
        })
    }

    /// `true` once the data chunk has grown close enough to the 32-bit size
    /// field's ceiling that the caller should stop writing and close this
    /// writer. Not surfaced as an error: the caller polls this between
    /// writes the same way it polls [`crate::avi::AviWriter::should_close`].
    pub fn should_close(&self) -> bool {
        self.data_bytes_written >= MAX_RECORDING_SIZE
    }

    pub fn write_samples(&mut self, buf: &[u8]) -> Result<(), ExportError> {
        let sample_width = (self.bits_per_sample / 8) as usize;
        let count = buf.len() / sample_width;
        let written = self.sink.put_samples_le(buf, sample_width, count)?;
        self.data_bytes_written += (written * sample_width) as u64;
        Ok(())
    }

    pub fn close(mut self) -> Result<W, ExportError> {
        self.finish_inner()?;
        Ok(self.sink.into_inner())
    }

    fn finish_inner(&mut self) -> Result<(), ExportError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        if self.data_bytes_written % 2 != 0 {
            self.sink.put_bytes(&[0])?;
        }

        self.sink.seek(0)?;
        write_header(
            &mut self.sink,
            self.channels,
            self.sample_rate,
            self.bits_per_sample,
            self.data_bytes_written,
        )?;
        Ok(())
    }
}

impl<W: Write + Seek> Drop for WavWriter<W> {
    fn drop(&mut self) {
        let _ = self.finish_inner();
    }
}

fn write_header<W: Write + Seek>(
    sink: &mut ByteSink<W>,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    data_bytes: u64,
) -> Result<(), ExportError> {
    let block_align = channels * (bits_per_sample / 8);
    let byte_rate = sample_rate * block_align as u32;
    let padded_data_bytes = data_bytes + (data_bytes % 2);
    let riff_size = 36 + padded_data_bytes;

    sink.put_fourcc(b"RIFF")?;
    sink.put_u32_le(riff_size as u32)?;
    sink.put_fourcc(b"WAVE")?;

    sink.put_fourcc(b"fmt ")?;
    sink.put_u32_le(16)?;
    sink.put_u16_le(1)?; // PCM
    sink.put_u16_le(channels)?;
    sink.put_u32_le(sample_rate)?;
    sink.put_u32_le(byte_rate)?;
    sink.put_u16_le(block_align)?;
    sink.put_u16_le(bits_per_sample)?;

    sink.put_fourcc(b"data")?;
    sink.put_u32_le(data_bytes as u32)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_and_backpatch_match_expected_bytes() {
        let cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::open(cursor, 1, 44100, 8).unwrap();
        writer.write_samples(&[0x10, 0x20, 0x30]).unwrap();
        let buf = writer.close().unwrap().into_inner();

        assert_eq!(&buf[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(buf[4..8].try_into().unwrap()), 0x28);
        assert_eq!(&buf[8..12], b"WAVE");
        assert_eq!(&buf[12..16], b"fmt ");
        assert_eq!(&buf[24..28], &[0x44, 0xAC, 0x00, 0x00]); // sample rate
        assert_eq!(&buf[28..32], &[0x44, 0xAC, 0x00, 0x00]); // byte rate
        assert_eq!(buf[32], 1); // block align
        assert_eq!(buf[34], 8); // bits per sample
        assert_eq!(&buf[36..40], b"data");
        assert_eq!(buf[40], 0x03);
        assert_eq!(&buf[44..47], &[0x10, 0x20, 0x30]);
        assert_eq!(buf[47], 0); // pad byte for odd data length
        assert_eq!(buf.len(), 48);
    }

    #[test]
    fn should_close_trips_past_size_ceiling() {
        let cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::open(cursor, 2, 44100, 16).unwrap();
        assert!(!writer.should_close());
        writer.data_bytes_written = MAX_RECORDING_SIZE;
        assert!(writer.should_close());
    }
}
