//! Little-endian primitive writers over a seekable byte stream.
//!
//! RIFF/AVI/WAV headers embed little-endian integers and must be writable
//! identically on any host endianness, so every write here is unconditional
//! little-endian regardless of the host's native byte order.

use std::io::{Seek, SeekFrom, Write};

use crate::error::ExportError;

pub struct ByteSink<W: Write + Seek> {
    inner: W,
}

impl<W: Write + Seek> ByteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn put_u16_le(&mut self, v: u16) -> Result<(), ExportError> {
        self.inner.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    pub fn put_u32_le(&mut self, v: u32) -> Result<(), ExportError> {
        self.inner.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    pub fn put_bytes(&mut self, b: &[u8]) -> Result<(), ExportError> {
        self.inner.write_all(b)?;
        Ok(())
    }

    pub fn put_fourcc(&mut self, tag: &[u8; 4]) -> Result<(), ExportError> {
        self.inner.write_all(tag)?;
        Ok(())
    }

    /// Writes `count` elements of `sample_width` bytes each from `buf`
    /// (native-endian in memory, as produced by the emulator's audio
    /// subsystem) as unconditional little-endian. Only widths 1 and 2 are
    /// supported.
    pub fn put_samples_le(
        &mut self,
        buf: &[u8],
        sample_width: usize,
        count: usize,
    ) -> Result<usize, ExportError> {
        match sample_width {
            1 => {
                self.inner.write_all(&buf[..count])?;
                Ok(count)
            }
            2 => {
                for i in 0..count {
                    let raw = [buf[i * 2], buf[i * 2 + 1]];
                    let sample = u16::from_ne_bytes(raw);
                    self.inner.write_all(&sample.to_le_bytes())?;
                }
                Ok(count)
            }
            other => Err(ExportError::InvalidArgument(format!(
                "unsupported sample width: {other}"
            ))),
        }
    }

    pub fn tell(&mut self) -> Result<u64, ExportError> {
        Ok(self.inner.stream_position()?)
    }

    pub fn seek(&mut self, abs: u64) -> Result<(), ExportError> {
        self.inner.seek(SeekFrom::Start(abs))?;
        Ok(())
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn primitives_round_trip_little_endian() {
        let mut sink = ByteSink::new(Cursor::new(Vec::new()));
        sink.put_u16_le(0x1234).unwrap();
        sink.put_u32_le(0xABCDEF01).unwrap();
        sink.put_fourcc(b"RIFF").unwrap();

        let buf = sink.into_inner().into_inner();
        assert_eq!(&buf[0..2], &[0x34, 0x12]);
        assert_eq!(&buf[2..6], &[0x01, 0xEF, 0xCD, 0xAB]);
        assert_eq!(&buf[6..10], b"RIFF");
    }

    #[test]
    fn tell_and_seek_round_trip() {
        let mut sink = ByteSink::new(Cursor::new(Vec::new()));
        sink.put_u32_le(0).unwrap();
        let pos = sink.tell().unwrap();
        assert_eq!(pos, 4);
        sink.seek(0).unwrap();
        sink.put_u32_le(42).unwrap();
        let buf = sink.into_inner().into_inner();
        assert_eq!(u32::from_le_bytes(buf[..4].try_into().unwrap()), 42);
    }

    #[test]
    fn put_samples_le_rejects_unsupported_width() {
        let mut sink = ByteSink::new(Cursor::new(Vec::new()));
        let err = sink.put_samples_le(&[0, 0, 0], 3, 1).unwrap_err();
        assert!(matches!(err, ExportError::InvalidArgument(_)));
    }
}
