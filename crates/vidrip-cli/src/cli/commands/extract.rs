//! `vidrip extract <archive>`: reassemble a tar archive already on disk.

use anyhow::{Context, Result};
use std::path::Path;
use vidrip_core::archive::extract_members;
use vidrip_core::checksum::sha256_bytes;
use vidrip_core::config::VidripConfig;
use vidrip_core::naming::AssetNaming;
use vidrip_core::reassemble::reassemble;
use vidrip_core::save::save_asset;

pub async fn run_extract(
    cfg: &VidripConfig,
    archive: &Path,
    title: Option<String>,
    label: &str,
    out_dir: &Path,
    overwrite: bool,
) -> Result<()> {
    let buf = tokio::task::spawn_blocking({
        let archive = archive.to_path_buf();
        move || std::fs::read(&archive)
    })
    .await
    .context("read task panicked")?
    .with_context(|| format!("read {}", archive.display()))?;

    let title = title.unwrap_or_else(|| {
        archive
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let naming = AssetNaming::new(title, label, cfg.max_title_chars);
    let listing = extract_members(&buf, cfg.max_archive_bytes)?;
    let mut asset = reassemble(&listing, &naming)?;
    if let Some(w) = listing.warning(&archive.display().to_string()) {
        asset.warnings.push(w);
    }

    for w in &asset.warnings {
        eprintln!("warning: {}", w);
    }
    let path = save_asset(&asset, out_dir, overwrite)?;
    println!("{}  {}", sha256_bytes(&asset.bytes), path.display());
    Ok(())
}
