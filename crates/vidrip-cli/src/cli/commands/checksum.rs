//! `vidrip checksum <path>`.

use anyhow::Result;
use std::path::Path;
use vidrip_core::checksum;

/// Print SHA-256 of the given file in `sha256sum` format.
pub async fn run_checksum(path: &Path) -> Result<()> {
    let digest = checksum::sha256_path(path)?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
