use crate::canvas::Canvas;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// `path` itself when free, otherwise `stem-1.ext`, `stem-2.ext`, ...
pub(crate) fn next_free_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());

    let mut n = 1u32;
    loop {
        let candidate = path.with_file_name(format!("{stem}-{n}.{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Writes the canvas as a PNG, never overwriting an earlier export.
pub(crate) fn save_png(canvas: &Canvas, path: &Path) -> Result<PathBuf> {
    let target = next_free_path(path);
    if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("could not create {}", dir.display()))?;
    }
    canvas
        .to_image()
        .save_with_format(&target, image::ImageFormat::Png)
        .with_context(|| format!("could not write {}", target.display()))?;
    log::info!("saved frame to {}", target.display());
    Ok(target)
}
