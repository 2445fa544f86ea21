// Legacy container conversion.
//
// Ogg uploads are converted to a standard PCM WAV container once, up
// front, before decoding and slicing proceed. The conversion shells out to
// ffmpeg, which must be on PATH.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::PipelineError;

/// Locate ffmpeg on PATH.
pub fn find_ffmpeg() -> Option<PathBuf> {
    let exe = if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" };
    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(exe))
            .find(|candidate| candidate.is_file())
    })
}

/// Convert an ogg file to 16-bit PCM WAV at `output`.
pub fn ogg_to_wav(input: &Path, output: &Path) -> Result<(), PipelineError> {
    let ffmpeg = find_ffmpeg()
        .ok_or_else(|| PipelineError::Convert("ffmpeg not found on PATH".to_string()))?;

    tracing::info!("Converting {} to WAV", input.display());

    let result = Command::new(&ffmpeg)
        .arg("-y")
        .arg("-i")
        .arg(input)
        .arg("-acodec")
        .arg("pcm_s16le")
        .arg(output)
        .output()
        .map_err(|e| PipelineError::Convert(format!("failed to run ffmpeg: {e}")))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(PipelineError::Convert(format!(
            "ffmpeg exited with {}: {}",
            result.status,
            stderr.trim()
        )));
    }

    Ok(())
}
