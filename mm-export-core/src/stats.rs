//! Running counters surfaced to the CLI at the end of an export run.

use std::fmt;

#[derive(Debug, Clone, Copy)]
pub struct Stats {
    pub total_video_size: u64,
    pub smallest_video_frame: u32,
    pub largest_video_frame: u32,
    pub frames_written: u64,
    pub samples_written: u64,
    pub bytes_written: u64,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            total_video_size: 0,
            smallest_video_frame: u32::MAX,
            largest_video_frame: 0,
            frames_written: 0,
            samples_written: 0,
            bytes_written: 0,
        }
    }
}

impl Stats {
    pub fn record_video_frame(&mut self, encoded_bytes: usize) {
        let size = encoded_bytes as u32;
        self.total_video_size += encoded_bytes as u64;
        self.frames_written += 1;
        self.smallest_video_frame = self.smallest_video_frame.min(size);
        self.largest_video_frame = self.largest_video_frame.max(size);
    }

    pub fn record_audio_samples(&mut self, samples: usize, bytes: usize) {
        self.samples_written += samples as u64;
        self.bytes_written += bytes as u64;
    }

    pub fn average_video_frame(&self) -> f64 {
        if self.frames_written == 0 {
            0.0
        } else {
            self.total_video_size as f64 / self.frames_written as f64
        }
    }

    pub fn smallest_video_frame(&self) -> u32 {
        if self.frames_written == 0 {
            0
        } else {
            self.smallest_video_frame
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AVI stats: {} video frames ({} bytes total, avg {:.1}, min {}, max {} bytes/frame), \
             {} audio samples ({} bytes)",
            self.frames_written,
            self.total_video_size,
            self.average_video_frame(),
            self.smallest_video_frame(),
            self.largest_video_frame,
            self.samples_written,
            self.bytes_written
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_video_frame_handles_zero_frames() {
        let stats = Stats::default();
        assert_eq!(stats.average_video_frame(), 0.0);
        assert_eq!(stats.smallest_video_frame(), 0);
    }

    #[test]
    fn records_accumulate_across_calls() {
        let mut stats = Stats::default();
        stats.record_video_frame(100);
        stats.record_video_frame(50);
        stats.record_audio_samples(10, 20);

        assert_eq!(stats.frames_written, 2);
        assert_eq!(stats.total_video_size, 150);
        assert_eq!(stats.average_video_frame(), 75.0);
        assert_eq!(stats.smallest_video_frame(), 50);
        assert_eq!(stats.largest_video_frame, 100);
        assert_eq!(stats.samples_written, 10);
        assert_eq!(stats.bytes_written, 20);
    }
}
