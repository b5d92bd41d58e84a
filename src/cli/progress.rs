use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Builds a per-frame progress bar for a recording of known length. Unlike
/// the decoder this tool is descended from, `cmd_record` always knows the
/// total frame count up front (it is derived from the input file's size),
/// so there is no separate estimation pass.
pub fn create_progress_bar(multi: &MultiProgress, total_frames: u64) -> Result<ProgressBar> {
    let pb = multi.add(ProgressBar::new(total_frames));
    pb.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} frames ({percent}%)\n{msg} | elapsed: {elapsed_precise} | ETA: {eta_precise}",
    )?);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message("recording");
    Ok(pb)
}
