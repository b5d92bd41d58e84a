use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, Result};

use mm_export_core::palette::{FixedPalette, Palette, RgbColor};
use mm_export_core::pcx::PcxEncoder;
#[cfg(feature = "mpng")]
use mm_export_core::png::PngEncoder;

use super::command::{Cli, SnapshotArgs, SnapshotFormat};

pub fn cmd_snapshot(args: &SnapshotArgs, _cli: &Cli) -> Result<()> {
    log::info!(
        "Encoding snapshot from {} ({}x{})",
        args.input.display(),
        args.width,
        args.height
    );

    let framebuffer = std::fs::read(&args.input)
        .with_context(|| format!("reading framebuffer {}", args.input.display()))?;
    let palette = read_palette(&args.palette)?;

    let file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut writer = BufWriter::new(file);

    match args.format {
        SnapshotFormat::Pcx => {
            PcxEncoder::encode_indexed_to_writer(
                &framebuffer,
                args.width,
                args.height,
                &palette,
                &mut writer,
            )?;
        }
        #[cfg(feature = "mpng")]
        SnapshotFormat::Png => {
            PngEncoder::encode_indexed_to_writer(
                &framebuffer,
                args.width,
                args.height,
                &palette,
                args.compression_level,
                &mut writer,
            )?;
        }
        #[cfg(not(feature = "mpng"))]
        SnapshotFormat::Png => {
            anyhow::bail!("this build was compiled without the `mpng` feature");
        }
    }

    log::info!("Wrote snapshot to {}", args.output.display());
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
