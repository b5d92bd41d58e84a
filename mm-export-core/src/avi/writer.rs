//! The interleaved RIFF/AVI writer.
//!
//! Header backpatching works by rebuilding the entire header region (every
//! byte from `RIFF` through the `movi` list's `LIST`/size/`movi` triplet)
//! into an in-memory buffer both at `open()` (with frame/byte counts zeroed)
//! and at `close()` (with final counts). Every field in that region is
//! fixed-width, so the two buffers are always the same length: the second
//! write can never shift where the already-written `movi` payload sits.
//!
//! Video and audio for the same logical frame may arrive through
//! [`AviWriter::add_video_frame`]/[`AviWriter::add_audio_samples`] in either
//! order. Each keeps at most one pending half; once both halves of a pair
//! are present they are committed together as one `"00dc"`/`"01wb"` chunk
//! pair. Pushing a third half of the same frame before the pair completes
//! (e.g. two video frames in a row while audio is expected) is a protocol
//! violation that latches the writer into a terminal error state.

use std::io::{Seek, SeekFrom, Write};

use crate::codec::{CodecInfo, VideoCodec};
use crate::error::ExportError;
use crate::palette::Palette;
use crate::sink::ByteSink;

use super::header::{
    AVIF_HASINDEX, AVIIF_KEYFRAME, AviMainHeader, AviStreamHeader, BitmapInfoHeader,
    PaletteEntryBgra, WaveFormatEx, to_le_bytes,
};
use super::index::FrameIndexEntry;
use super::AudioFormat;
use crate::stats::Stats;

const MAX_RECORDING_SIZE: u64 = 0x_FFF0_0000;

struct PendingVideo {
    encoded: Vec<u8>,
    is_keyframe: bool,
}

struct PendingAudio {
    payload: Vec<u8>,
    sample_width: usize,
    count: usize,
}

/// Extra margin (bytes) added on top of one video-frame-interval's worth of
/// PCM data when sizing the audio buffer ceiling (spec: "one audio buffer,
/// size `ceil(sample_rate * channels * sample_width / fps) + 1024`").
const AUDIO_BUFFER_SLACK: usize = 1024;

pub struct AviWriter<W: Write + Seek> {
    sink: ByteSink<W>,
    width: u32,
    height: u32,
    frame_rate: f64,
    keyframe_interval_ms: u32,
    video_codec: Box<dyn VideoCodec>,
    video_info: CodecInfo,
    palette: Palette,
    audio: Option<AudioFormat>,

    movi_payload_start: u64,
    /// Bytes written into the `movi` payload since the `"movi"` FourCC
    /// (exclusive of that FourCC itself).
    movi_payload_bytes: u64,
    /// Conservative running total used only for [`Self::should_close`]; each
    /// commit is over-counted by a fixed slack so the ceiling trips a little
    /// early rather than exactly at the 32-bit boundary.
    bytes_written: u64,

    total_frames: u32,
    total_audio_bytes: u64,
    index: Vec<FrameIndexEntry>,
    keyframe_residual_ms: f64,

    video_pending: Option<PendingVideo>,
    audio_pending: Option<PendingAudio>,
    /// Ceiling on one `add_audio_samples` payload, in bytes. Unused (zero)
    /// when the writer was opened without an audio stream.
    audio_buffer_capacity: usize,
    errored: bool,
    finished: bool,
    stats: Stats,
}

impl<W: Write + Seek> AviWriter<W> {
    pub fn open(
        inner: W,
        width: u32,
        height: u32,
        frame_rate: f64,
        keyframe_interval_ms: u32,
        mut video_codec: Box<dyn VideoCodec>,
        palette: Palette,
        audio: Option<AudioFormat>,
    ) -> Result<Self, ExportError> {
        video_codec.init(width, height)?;
        let video_info = video_codec.info();
        log::info!(
            "opening AVI recording: {width}x{height} @ {frame_rate} fps, codec {}",
            video_info.id
        );

        let audio_buffer_capacity = audio
            .map(|a| {
                let sample_width = (a.bits_per_sample / 8) as f64;
                let bytes_per_interval =
                    a.sample_rate as f64 * a.channels as f64 * sample_width / frame_rate;
                bytes_per_interval.ceil() as usize + AUDIO_BUFFER_SLACK
            })
            .unwrap_or(0);

        let mut writer = Self {
            sink: ByteSink::new(inner),
            width,
            height,
            frame_rate,
            keyframe_interval_ms,
            video_codec,
            video_info,
            palette,
            audio,
            movi_payload_start: 0,
            movi_payload_bytes: 0,
            bytes_written: 8,
            total_frames: 0,
            total_audio_bytes: 0,
            index: Vec::new(),
            keyframe_residual_ms: 0.0,
            video_pending: None,
            audio_pending: None,
            audio_buffer_capacity,
            errored: false,
            finished: false,
            stats: Stats::default(),
        };

        let header = writer.build_header_bytes(0, 0, 0);
        writer.sink.put_bytes(&header)?;
        writer.movi_payload_start = writer.sink.tell()?;

        Ok(writer)
    }

    pub fn should_close(&self) -> bool {
        self.bytes_written >= MAX_RECORDING_SIZE
    }

    /// Running frame/byte counters, updated on every committed chunk pair.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Pushes one video frame. See the interleave rules in the module docs:
    /// a frame already buffered and no audio stream configured flushes the
    /// previous frame alone; a frame already buffered with audio also
    /// pending flushes the completed pair; a frame already buffered with no
    /// audio pending while an audio stream IS configured is a protocol
    /// violation (it would orphan a video-only frame).
    pub fn add_video_frame(&mut self, framebuffer: &[u8]) -> Result<(), ExportError> {
        if self.errored {
            return Err(ExportError::Protocol(
                "writer is latched in an error state after a prior failure",
            ));
        }
        if self.should_close() {
            log::debug!(
                "AviWriter past size ceiling, dropping video frame {}",
                self.total_frames
            );
            return Ok(());
        }

        self.add_video_frame_inner(framebuffer).inspect_err(|_| {
            self.errored = true;
        })
    }

    fn add_video_frame_inner(&mut self, framebuffer: &[u8]) -> Result<(), ExportError> {
        if self.video_pending.is_some() {
            if self.audio_pending.is_some() {
                self.commit()?;
            } else if self.audio.is_none() {
                self.commit()?;
            } else {
                return Err(ExportError::Protocol(
                    "a second video frame arrived before the pending frame's audio half",
                ));
            }
        }

        let is_keyframe = self.next_is_keyframe();
        let encoded = self
            .video_codec
            .frame(framebuffer, &self.palette, is_keyframe)?;
        self.video_pending = Some(PendingVideo { encoded, is_keyframe });

        if self.audio_pending.is_some() {
            self.commit()?;
        }
        Ok(())
    }

    /// Pushes one buffer of interleaved PCM samples. Symmetric to
    /// [`Self::add_video_frame`]; since audio is only accepted when the
    /// writer was opened with an [`AudioFormat`] (always `num_streams == 2`
    /// in that case), a second audio buffer arriving before the pending
    /// one's video half is always a protocol violation.
    pub fn add_audio_samples(&mut self, buf: &[u8]) -> Result<(), ExportError> {
        if self.audio.is_none() {
            return Err(ExportError::Protocol(
                "writer was not opened with an audio stream",
            ));
        }

        if self.errored {
            return Err(ExportError::Protocol(
                "writer is latched in an error state after a prior failure",
            ));
        }
        if self.should_close() {
            return Ok(());
        }

        self.add_audio_samples_inner(buf).inspect_err(|_| {
            self.errored = true;
        })
    }

    fn add_audio_samples_inner(&mut self, buf: &[u8]) -> Result<(), ExportError> {
        let audio = self.audio.expect("checked by add_audio_samples");

        if buf.len() > self.audio_buffer_capacity {
            return Err(ExportError::BufferOverflow(
                "audio buffer exceeds the configured per-frame capacity",
            ));
        }

        if self.audio_pending.is_some() {
            if self.video_pending.is_some() {
                self.commit()?;
            } else {
                return Err(ExportError::Protocol(
                    "a second audio buffer arrived before the pending frame's video half",
                ));
            }
        }

        let sample_width = (audio.bits_per_sample / 8) as usize;
        let count = buf.len() / sample_width;
        self.audio_pending = Some(PendingAudio {
            payload: buf.to_vec(),
            sample_width,
            count,
        });

        if self.video_pending.is_some() {
            self.commit()?;
        }
        Ok(())
    }

    pub fn close(mut self) -> Result<W, ExportError> {
        self.finish_inner()?;
        Ok(self.sink.into_inner())
    }

    /// Writes both halves of a completed video/audio pair (or the lone
    /// video half, when no audio stream is configured) as one `"00dc"`
    /// [+ `"01wb"`] commit, clearing both pending slots.
    fn commit(&mut self) -> Result<(), ExportError> {
        let mut written = 0u64;

        if let Some(video) = self.video_pending.take() {
            let offset = self.frame_offset();
            let total = self.write_chunk(b"00dc", &video.encoded)?;
            self.index.push(FrameIndexEntry {
                ckid: *b"00dc",
                flags: if video.is_keyframe { AVIIF_KEYFRAME } else { 0 },
                offset,
                size: video.encoded.len() as u32,
            });
            self.total_frames += 1;
            self.stats.record_video_frame(video.encoded.len());
            written += total;
        }

        if let Some(audio) = self.audio_pending.take() {
            let offset = self.frame_offset();
            let total =
                self.write_samples_chunk(b"01wb", &audio.payload, audio.sample_width, audio.count)?;
            let size = (audio.count * audio.sample_width) as u32;
            self.index.push(FrameIndexEntry {
                ckid: *b"01wb",
                // PCM audio buffers are always treated as keyframes.
                flags: AVIIF_KEYFRAME,
                offset,
                size,
            });
            self.total_audio_bytes += size as u64;
            self.stats.record_audio_samples(audio.count, size as usize);
            written += total;
        }

        self.bytes_written += written + 32;
        Ok(())
    }

    /// idx1 offsets are relative to the start of the `movi` LIST's payload,
    /// which begins with the `"movi"` FourCC itself — so the first real
    /// chunk sits at offset 4, not 0.
    fn frame_offset(&self) -> u32 {
        self.movi_payload_bytes as u32 + 4
    }

    /// Finalizes the file (backpatch + index), then reports failure if the
    /// writer was already latched into an error state by a prior failed
    /// write — finalization is still attempted on a best-effort basis, but
    /// `close` must not report success for a recording that hit a protocol
    /// violation, buffer overflow, or I/O error along the way.
    fn finish_inner(&mut self) -> Result<(), ExportError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        let was_errored = self.errored;
        let result = self.finish_writes();

        if was_errored {
            result?;
            return Err(ExportError::Protocol(
                "writer closed after a prior failure; output was finalized on a best-effort basis",
            ));
        }
        result
    }

    fn finish_writes(&mut self) -> Result<(), ExportError> {
        self.video_codec.end()?;

        let complete = if self.audio.is_some() {
            self.video_pending.is_some() && self.audio_pending.is_some()
        } else {
            self.video_pending.is_some()
        };
        if complete {
            self.commit()?;
        } else if self.video_pending.is_some() || self.audio_pending.is_some() {
            log::warn!("dropping half-pending frame at close");
            self.video_pending = None;
            self.audio_pending = None;
        }

        let idx1_payload_len = 16 * self.index.len() as u64;
        self.sink
            .seek(self.movi_payload_start + self.movi_payload_bytes)?;
        self.sink.put_fourcc(b"idx1")?;
        self.sink.put_u32_le(idx1_payload_len as u32)?;
        for entry in &self.index {
            let bytes = to_le_bytes(entry);
            self.sink.put_bytes(&bytes)?;
        }

        let header = self.build_header_bytes(
            self.total_frames,
            self.movi_payload_bytes,
            8 + idx1_payload_len,
        );
        self.sink.seek(0)?;
        self.sink.put_bytes(&header)?;
        Ok(())
    }

    fn next_is_keyframe(&mut self) -> bool {
        if self.total_frames == 0 || !self.video_info.uses_interframes {
            return true;
        }
        self.keyframe_residual_ms += 1000.0 / self.frame_rate;

        // Repeated f64 addition drifts a hair off an exact period boundary
        // in either direction (fps=60, interval=1000 sums to
        // 999.9999999999991 at frame 60 instead of landing exactly on
        // 1000.0). Snapping to nanosecond granularity absorbs that drift
        // while leaving genuine fractional residuals (non-integer fps)
        // intact; comparing with `>=` rather than `>` then treats an exact
        // boundary hit as due, matching the documented "frame indices 0,
        // 60, 120, … are keyframes" behavior at fps=60/interval=1000.
        self.keyframe_residual_ms = (self.keyframe_residual_ms * 1e9).round() / 1e9;

        if self.keyframe_residual_ms >= self.keyframe_interval_ms as f64 {
            let periods = (self.keyframe_residual_ms / self.keyframe_interval_ms as f64).floor();
            self.keyframe_residual_ms -= periods * self.keyframe_interval_ms as f64;
            true
        } else {
            false
        }
    }

    fn write_chunk(&mut self, fourcc: &[u8; 4], payload: &[u8]) -> Result<u64, ExportError> {
        self.sink.put_fourcc(fourcc)?;
        self.sink.put_u32_le(payload.len() as u32)?;
        self.sink.put_bytes(payload)?;
        let mut total = 8 + payload.len() as u64;
        if payload.len() % 2 != 0 {
            self.sink.put_bytes(&[0])?;
            total += 1;
        }
        self.movi_payload_bytes += total;
        Ok(total)
    }

    fn write_samples_chunk(
        &mut self,
        fourcc: &[u8; 4],
        buf: &[u8],
        sample_width: usize,
        count: usize,
    ) -> Result<u64, ExportError> {
        let payload_len = count * sample_width;
        self.sink.put_fourcc(fourcc)?;
        self.sink.put_u32_le(payload_len as u32)?;
        self.sink.put_samples_le(buf, sample_width, count)?;
        let mut total = 8 + payload_len as u64;
        if payload_len % 2 != 0 {
            self.sink.put_bytes(&[0])?;
            total += 1;
        }
        self.movi_payload_bytes += total;
        Ok(total)
    }

    fn build_header_bytes(
        &self,
        total_frames: u32,
        movi_payload_bytes: u64,
        idx1_total: u64,
    ) -> Vec<u8> {
        let mut buf = Vec::new();

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&0u32.to_le_bytes()); // patched below
        buf.extend_from_slice(b"AVI ");

        let hdrl_start = buf.len();
        buf.extend_from_slice(b"LIST");
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(b"hdrl");

        let streams = 1 + self.audio.is_some() as u32;
        let approx_bytes_per_sec = self.width * self.height * 3;
        let main_header = AviMainHeader {
            micro_sec_per_frame: (1_000_000.0 / self.frame_rate).floor() as u32,
            max_bytes_per_sec: approx_bytes_per_sec,
            padding_granularity: 0,
            flags: AVIF_HASINDEX,
            total_frames,
            initial_frames: 0,
            streams,
            suggested_buffer_size: approx_bytes_per_sec,
            width: self.width,
            height: self.height,
            reserved: [0; 4],
        };
        write_chunk_into(&mut buf, b"avih", &to_le_bytes(&main_header));

        self.write_video_strl(&mut buf, total_frames);
        if let Some(audio) = self.audio {
            self.write_audio_strl(&mut buf, audio);
        }

        patch_u32(&mut buf, hdrl_start + 4, (buf.len() - hdrl_start - 8) as u32);

        let movi_start = buf.len();
        buf.extend_from_slice(b"LIST");
        let movi_list_size = 4 + movi_payload_bytes;
        buf.extend_from_slice(&(movi_list_size as u32).to_le_bytes());
        buf.extend_from_slice(b"movi");
        debug_assert_eq!(buf.len() - movi_start, 12);

        let riff_size = (buf.len() as u64 - 8) + movi_payload_bytes + idx1_total;
        patch_u32(&mut buf, 4, riff_size as u32);

        buf
    }

    fn write_video_strl(&self, buf: &mut Vec<u8>, total_frames: u32) {
        let strl_start = buf.len();
        buf.extend_from_slice(b"LIST");
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(b"strl");

        let strh = AviStreamHeader {
            fcc_type: *b"vids",
            fcc_handler: self.video_info.fourcc,
            flags: 0,
            priority: 0,
            language: 0,
            initial_frames: 0,
            scale: 1_000_000,
            rate: (self.frame_rate * 1_000_000.0).round() as u32,
            start: 0,
            length: total_frames,
            suggested_buffer_size: 0,
            quality: u32::MAX,
            sample_size: 0,
            frame_left: 0,
            frame_top: 0,
            frame_right: self.width as i16,
            frame_bottom: self.height as i16,
        };
        write_chunk_into(buf, b"strh", &to_le_bytes(&strh));

        let strf = BitmapInfoHeader {
            size: 40,
            width: self.width as i32,
            height: self.height as i32,
            planes: 1,
            bit_count: 8,
            compression: self.video_info.avi_compression_tag,
            size_image: self.width * self.height,
            x_pels_per_meter: 0,
            y_pels_per_meter: 0,
            clr_used: 256,
            clr_important: 0,
        };
        let mut strf_payload = to_le_bytes(&strf);
        for color in self.palette.0.iter() {
            let entry = PaletteEntryBgra {
                b: color.b,
                g: color.g,
                r: color.r,
                reserved: 0,
            };
            strf_payload.extend_from_slice(&to_le_bytes(&entry));
        }
        write_chunk_into(buf, b"strf", &strf_payload);
        write_chunk_into(buf, b"strn", b"atari800 video\0\0");

        patch_u32(buf, strl_start + 4, (buf.len() - strl_start - 8) as u32);
    }

    fn write_audio_strl(&self, buf: &mut Vec<u8>, audio: AudioFormat) {
        let strl_start = buf.len();
        buf.extend_from_slice(b"LIST");
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(b"strl");

        let block_align = audio.channels * (audio.bits_per_sample / 8);
        let avg_bytes_per_sec = audio.sample_rate * block_align as u32;
        let sample_count = if block_align == 0 {
            0
        } else {
            (self.total_audio_bytes / block_align as u64) as u32
        };

        let strh = AviStreamHeader {
            fcc_type: *b"auds",
            fcc_handler: 1u32.to_le_bytes(),
            flags: 0,
            priority: 0,
            language: 0,
            initial_frames: 0,
            scale: 1,
            rate: audio.sample_rate,
            start: 0,
            length: sample_count,
            suggested_buffer_size: 0,
            quality: u32::MAX,
            sample_size: block_align as u32,
            frame_left: 0,
            frame_top: 0,
            frame_right: 0,
            frame_bottom: 0,
        };
        write_chunk_into(buf, b"strh", &to_le_bytes(&strh));

        let strf = WaveFormatEx {
            format_tag: 1,
            channels: audio.channels,
            samples_per_sec: audio.sample_rate,
            avg_bytes_per_sec,
            block_align,
            bits_per_sample: audio.bits_per_sample,
            cb_size: 0,
        };
        write_chunk_into(buf, b"strf", &to_le_bytes(&strf));
        write_chunk_into(buf, b"strn", b"POKEY audio\0");

        patch_u32(buf, strl_start + 4, (buf.len() - strl_start - 8) as u32);
    }
}

impl<W: Write + Seek> Drop for AviWriter<W> {
    fn drop(&mut self) {
        let _ = self.finish_inner();
    }
}

fn write_chunk_into(buf: &mut Vec<u8>, fourcc: &[u8; 4], payload: &[u8]) {
    buf.extend_from_slice(fourcc);
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(payload);
    if payload.len() % 2 != 0 {
        buf.push(0);
    }
}

fn patch_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecRegistry;
    use std::io::Cursor;

    fn open_writer(
        frame_rate: f64,
        keyframe_interval_ms: u32,
        audio: Option<AudioFormat>,
    ) -> AviWriter<Cursor<Vec<u8>>> {
        open_writer_with_codec("mrle", frame_rate, keyframe_interval_ms, audio)
    }

    fn open_writer_with_codec(
        codec_id: &str,
        frame_rate: f64,
        keyframe_interval_ms: u32,
        audio: Option<AudioFormat>,
    ) -> AviWriter<Cursor<Vec<u8>>> {
        let registry = CodecRegistry::with_defaults();
        let codec = registry.resolve(codec_id).unwrap();
        AviWriter::open(
            Cursor::new(Vec::new()),
            4,
            2,
            frame_rate,
            keyframe_interval_ms,
            codec,
            Palette::black(),
            audio,
        )
        .unwrap()
    }

    fn test_audio() -> AudioFormat {
        AudioFormat {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 8,
        }
    }

    #[test]
    fn header_begins_with_riff_avi_signature() {
        let mut writer = open_writer(25.0, 200, None);
        let buf = writer.sink.get_mut().get_ref().clone();
        assert_eq!(&buf[0..4], b"RIFF");
        assert_eq!(&buf[8..12], b"AVI ");
    }

    #[test]
    fn first_frame_is_always_a_keyframe() {
        let mut writer = open_writer(25.0, 200, None);
        writer.add_video_frame(&[0u8; 8]).unwrap();
        writer.add_video_frame(&[1u8; 8]).unwrap();
        assert_eq!(writer.index[0].flags & AVIIF_KEYFRAME, AVIIF_KEYFRAME);
    }

    #[test]
    fn audio_may_arrive_before_its_paired_video_frame() {
        let mut writer = open_writer(25.0, 200, Some(test_audio()));
        // Audio first: buffered, no commit yet (nothing written to the index).
        writer.add_audio_samples(&[0u8; 4]).unwrap();
        assert!(writer.index.is_empty());

        // Video completes the pair: both halves commit together.
        writer.add_video_frame(&[0u8; 8]).unwrap();
        assert_eq!(writer.index.len(), 2);
        assert_eq!(&writer.index[0].ckid, b"00dc");
        assert_eq!(&writer.index[1].ckid, b"01wb");
        // PCM buffers are always flagged as keyframes in the index.
        assert_eq!(writer.index[1].flags & AVIIF_KEYFRAME, AVIIF_KEYFRAME);
    }

    #[test]
    fn audio_buffer_overflow_is_rejected() {
        // 44100 Hz, 1 channel, 8-bit, 25 fps: ceil(44100/25) + 1024 = 1764 + 1024 = 2788.
        let mut writer = open_writer(25.0, 200, Some(test_audio()));
        let oversized = vec![0u8; 2789];
        let err = writer.add_audio_samples(&oversized).unwrap_err();
        assert!(matches!(err, ExportError::BufferOverflow(_)));
    }

    #[test]
    fn audio_buffer_at_capacity_is_accepted() {
        let mut writer = open_writer(25.0, 200, Some(test_audio()));
        let exact = vec![0u8; 2788];
        writer.add_audio_samples(&exact).unwrap();
    }

    #[test]
    fn second_audio_buffer_before_video_is_a_protocol_error() {
        let mut writer = open_writer(25.0, 200, Some(test_audio()));
        writer.add_audio_samples(&[0u8; 4]).unwrap();
        let err = writer.add_audio_samples(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, ExportError::Protocol(_)));

        // writer is latched; even a valid video frame afterward still errors.
        let err2 = writer.add_video_frame(&[0u8; 8]).unwrap_err();
        assert!(matches!(err2, ExportError::Protocol(_)));
    }

    #[test]
    fn close_reports_failure_after_a_prior_protocol_violation() {
        let mut writer = open_writer(25.0, 200, Some(test_audio()));
        writer.add_audio_samples(&[0u8; 4]).unwrap();
        writer.add_audio_samples(&[0u8; 4]).unwrap_err();

        // close() still attempts to finalize the file, but must report
        // failure rather than silently succeeding on a latched writer.
        let err = writer.close().unwrap_err();
        assert!(matches!(err, ExportError::Protocol(_)));
    }

    #[test]
    fn second_video_frame_before_audio_is_a_protocol_error_when_audio_is_configured() {
        let mut writer = open_writer(25.0, 200, Some(test_audio()));
        writer.add_video_frame(&[0u8; 8]).unwrap();
        let err = writer.add_video_frame(&[1u8; 8]).unwrap_err();
        assert!(matches!(err, ExportError::Protocol(_)));
    }

    #[test]
    fn video_only_frames_commit_one_frame_behind() {
        let mut writer = open_writer(25.0, 200, None);
        // The first frame is only buffered, not yet committed: there is no
        // audio half to wait for, but nothing has forced a flush yet.
        writer.add_video_frame(&[0u8; 8]).unwrap();
        assert_eq!(writer.index.len(), 0);

        // Pushing the second frame flushes the first (it has no audio half
        // to wait for) and buffers the new one in its place.
        writer.add_video_frame(&[1u8; 8]).unwrap();
        assert_eq!(writer.index.len(), 1);

        // The second frame is still pending; close() flushes it too.
        let buf = writer.close().unwrap().into_inner();
        let idx1_pos = buf.windows(4).position(|w| w == b"idx1").unwrap();
        let idx1_size = u32::from_le_bytes(buf[idx1_pos + 4..idx1_pos + 8].try_into().unwrap());
        assert_eq!(idx1_size, 32); // both frames indexed
    }

    #[test]
    fn close_writes_idx1_after_movi_payload_and_rewrites_header() {
        let mut writer = open_writer(25.0, 200, None);
        writer.add_video_frame(&[0u8; 8]).unwrap();
        writer.add_video_frame(&[1u8; 8]).unwrap();
        let buf = writer.close().unwrap().into_inner();

        assert_eq!(&buf[0..4], b"RIFF");
        let total_len = buf.len() as u32;
        let riff_size = u32::from_le_bytes(buf[4..8].try_into().unwrap());
        assert_eq!(riff_size, total_len - 8);

        let idx1_pos = buf.windows(4).position(|w| w == b"idx1").unwrap();
        assert_eq!(&buf[idx1_pos..idx1_pos + 4], b"idx1");
        let idx1_size = u32::from_le_bytes(buf[idx1_pos + 4..idx1_pos + 8].try_into().unwrap());
        assert_eq!(idx1_size, 32); // two 16-byte entries
    }

    #[test]
    fn close_commits_the_last_buffered_video_only_frame() {
        let mut writer = open_writer(25.0, 200, None);
        writer.add_video_frame(&[0u8; 8]).unwrap();
        let buf = writer.close().unwrap().into_inner();
        let idx1_pos = buf.windows(4).position(|w| w == b"idx1").unwrap();
        let idx1_size = u32::from_le_bytes(buf[idx1_pos + 4..idx1_pos + 8].try_into().unwrap());
        assert_eq!(idx1_size, 16); // one entry for the flushed frame
    }

    #[test]
    fn close_drops_a_half_pending_frame_when_audio_is_configured() {
        let mut writer = open_writer(25.0, 200, Some(test_audio()));
        writer.add_video_frame(&[0u8; 8]).unwrap();
        // No audio ever arrives for this frame; close must drop it rather
        // than write a malformed video-only chunk into a 2-stream file.
        let buf = writer.close().unwrap().into_inner();
        let idx1_pos = buf.windows(4).position(|w| w == b"idx1").unwrap();
        let idx1_size = u32::from_le_bytes(buf[idx1_pos + 4..idx1_pos + 8].try_into().unwrap());
        assert_eq!(idx1_size, 0);
    }

    #[test]
    fn first_real_chunk_is_indexed_at_offset_four() {
        let mut writer = open_writer(25.0, 200, None);
        // The first push only buffers; the second flushes it, at which
        // point it is the only thing ever written to the movi payload.
        writer.add_video_frame(&[0u8; 8]).unwrap();
        writer.add_video_frame(&[1u8; 8]).unwrap();
        assert_eq!(writer.index[0].offset, 4);
    }

    #[test]
    #[cfg(feature = "mpng")]
    fn all_keyframe_codec_never_schedules_a_delta_frame() {
        // mpng reports uses_interframes = false, so every frame is a
        // keyframe regardless of the keyframe interval.
        let mut writer = open_writer_with_codec("mpng", 25.0, 40, None);
        for _ in 0..5 {
            writer.add_video_frame(&[0u8; 8]).unwrap();
            // flush to keep the index growing one-for-one with pushes
            writer.add_video_frame(&[0u8; 8]).unwrap();
        }
        assert!(writer
            .index
            .iter()
            .all(|e| e.flags & AVIIF_KEYFRAME == AVIIF_KEYFRAME));
    }

    #[test]
    fn keyframe_scheduler_lands_exactly_on_the_sixtieth_frame_at_60fps() {
        // fps=60, interval=1000ms: frame indices 0 and 60 are keyframes,
        // frames 1..59 are inter-frames. Summing 1000.0/60.0 sixty times in
        // f64 lands a hair below 1000.0 (999.9999999999991) rather than
        // exactly on it, which used to make next_is_keyframe() miss the
        // boundary at frame 60 and fire one frame late at 61 instead.
        //
        // Video-only pushes commit one frame behind: pushing frames 0..=61
        // (62 pushes) commits frames 0..=60 (index entries 0..=60), leaving
        // frame 61 buffered, so index[i] corresponds to frame i directly.
        let mut writer = open_writer_with_codec("mrle", 60.0, 1000, None);
        for _ in 0..62 {
            writer.add_video_frame(&[0u8; 8]).unwrap();
        }
        assert_eq!(writer.index.len(), 61);
        assert!(
            writer.index[0].flags & AVIIF_KEYFRAME != 0,
            "frame 0 must be a keyframe"
        );
        assert!(
            writer.index[60].flags & AVIIF_KEYFRAME != 0,
            "frame 60 must be a keyframe"
        );
        for i in 1..60 {
            assert!(
                writer.index[i].flags & AVIIF_KEYFRAME == 0,
                "frame {i} should be an inter-frame"
            );
        }
    }

    #[test]
    fn header_declares_stream_count_and_approximate_byte_rate() {
        let mut writer = open_writer(25.0, 200, Some(test_audio()));
        let bytes = writer.sink.get_mut().get_ref().clone();

        // avih payload starts after "RIFF"+size+"AVI "+"LIST"+size+"hdrl"+"avih"+size = 32 bytes.
        let avih_payload_start = 32;
        let max_bytes_per_sec = u32::from_le_bytes(
            bytes[avih_payload_start + 4..avih_payload_start + 8]
                .try_into()
                .unwrap(),
        );
        assert_eq!(max_bytes_per_sec, 4 * 2 * 3);

        let streams = u32::from_le_bytes(
            bytes[avih_payload_start + 24..avih_payload_start + 28]
                .try_into()
                .unwrap(),
        );
        assert_eq!(streams, 2);
    }
}
