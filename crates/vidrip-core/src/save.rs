//! Writes a reconstructed asset to disk: `<name>.part`, fsync, rename.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::reassemble::ReconstructedAsset;

/// Suffix of the file written before the final rename.
pub const TEMP_SUFFIX: &str = ".part";

/// `final_path` with `.part` appended (`a.ts` -> `a.ts.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Saves `asset` under `dir` using its suggested file name.
///
/// Refuses to replace an existing file unless `overwrite` is set. A failed
/// write leaves no `.part` file behind.
pub fn save_asset(asset: &ReconstructedAsset, dir: &Path, overwrite: bool) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let final_path = dir.join(&asset.suggested_filename);
    if final_path.exists() && !overwrite {
        bail!("{} already exists (use --overwrite)", final_path.display());
    }

    let part = temp_path(&final_path);
    let written = write_synced(&part, &asset.bytes);
    if let Err(e) = written {
        let _ = std::fs::remove_file(&part);
        return Err(e);
    }
    std::fs::rename(&part, &final_path)
        .with_context(|| format!("failed to rename {} to {}", part.display(), final_path.display()))?;
    tracing::info!(path = %final_path.display(), bytes = asset.bytes.len(), "asset saved");
    Ok(final_path)
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = File::create(path).with_context(|| format!("failed to create temp file: {}", path.display()))?;
    f.write_all(bytes)
        .with_context(|| format!("write {}", path.display()))?;
    f.sync_all().context("storage sync failed")?;
    Ok(())
}
