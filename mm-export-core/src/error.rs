//! Error types returned by every writer in this crate.

/// Errors produced while encoding or writing a PCX, PNG, WAV, or AVI file.
///
/// `SizeCeiling` is deliberately absent: crossing the 32-bit recording size
/// limit is not a failure, it is a signal polled through
/// [`crate::avi::AviWriter::should_close`] and [`crate::wav::WavWriter::should_close`].
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("interleave protocol violated: {0}")]
    Protocol(&'static str),

    #[error("buffer too small: {0}")]
    BufferOverflow(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
