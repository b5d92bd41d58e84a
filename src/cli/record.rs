use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, Result};
use indicatif::MultiProgress;

use mm_export_core::avi::{AudioFormat, AviWriter};
use mm_export_core::codec::CodecRegistry;
use mm_export_core::config::ExportConfig;
use mm_export_core::palette::{FixedPalette, Palette, RgbColor};

use super::command::{Cli, RecordArgs};
use super::progress::create_progress_bar;

pub fn cmd_record(args: &RecordArgs, _cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let config = if let Some(ref config_path) = args.config {
        log::info!("Loading codec settings from {}", config_path.display());
        super::config_file::load(config_path)?
    } else {
        ExportConfig {
            video_codec: args.video_codec.clone(),
            keyframe_interval_ms: args.keyframe_interval,
            compression_level: args.compression_level,
        }
    };
    config.validate()?;

    log::info!(
        "Recording {}x{} at {} fps with codec {:?} to {}",
        args.width,
        args.height,
        args.frame_rate,
        config.video_codec,
        args.output.display()
    );

    let framebuffers = std::fs::read(&args.input)
        .with_context(|| format!("reading framebuffer stream {}", args.input.display()))?;
    let palette = read_palette(&args.palette)?;

    let registry = CodecRegistry::with_defaults();
    let mut codec = registry
        .resolve(&config.video_codec)
        .context("resolving video codec")?;
    codec.set_compression_level(config.compression_level);

    let audio_format = args.audio.as_ref().map(|_| AudioFormat {
        channels: args.audio_channels,
        sample_rate: args.audio_sample_rate,
        bits_per_sample: args.audio_bits_per_sample,
    });

    let file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut writer = AviWriter::open(
        BufWriter::new(file),
        args.width,
        args.height,
        args.frame_rate,
        config.keyframe_interval_ms,
        codec,
        palette.0,
        audio_format,
    )?;

    let frame_size = (args.width * args.height) as usize;
    let frame_count = framebuffers.len() / frame_size;
    if frame_count == 0 {
        anyhow::bail!(
            "input is smaller than one {}x{} frame",
            args.width,
            args.height
        );
    }

    let audio_bytes = args
        .audio
        .as_ref()
        .map(|path| {
            std::fs::read(path).with_context(|| format!("reading audio file {}", path.display()))
        })
        .transpose()?;

    let audio_sample_width = (args.audio_bits_per_sample / 8) as usize;
    let audio_frame_bytes = audio_bytes.as_ref().map(|buf| {
        let samples_per_video_frame =
            (args.audio_sample_rate as f64 / args.frame_rate).round() as usize;
        (
            buf,
            samples_per_video_frame * args.audio_channels as usize * audio_sample_width,
        )
    });

    let pb = multi
        .map(|multi| create_progress_bar(multi, frame_count as u64))
        .transpose()?;

    for i in 0..frame_count {
        if writer.should_close() {
            log::warn!("recording reached the size ceiling after {i} frames, stopping early");
            break;
        }

        let frame = &framebuffers[i * frame_size..(i + 1) * frame_size];
        writer.add_video_frame(frame)?;

        if let Some((buf, chunk_len)) = audio_frame_bytes {
            let start = i * chunk_len;
            if start < buf.len() {
                let end = (start + chunk_len).min(buf.len());
                let chunk = &buf[start..end];
                writer.add_audio_samples(chunk)?;
            }
        }

        if let Some(ref pb) = pb {
            pb.inc(1);
        }
    }

    let stats = *writer.stats();
    writer.close()?;
    if let Some(pb) = pb {
        pb.finish_with_message(format!("done: {stats}"));
    }
    log::info!("Finished recording: {stats}");
    Ok(())
}

fn read_palette(path: &std::path::Path) -> Result<FixedPalette> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading palette {}", path.display()))?;
    anyhow::ensure!(
        bytes.len() == 768,
        "palette file must be exactly 768 bytes (256 * RGB), got {}",
        bytes.len()
    );

    let mut entries = [RgbColor::default(); 256];
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.r = bytes[i * 3];
        entry.g = bytes[i * 3 + 1];
        entry.b = bytes[i * 3 + 2];
    }
    Ok(FixedPalette(Palette(entries)))
}
