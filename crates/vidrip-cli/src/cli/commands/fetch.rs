//! `vidrip fetch <id>`: resolve, download, reassemble and save one rendition.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use vidrip_core::checksum::sha256_bytes;
use vidrip_core::config::VidripConfig;
use vidrip_core::control::CancelToken;
use vidrip_core::model::ContainerType;
use vidrip_core::pipeline::{RenditionSelector, RequestContext, RequestTracker};
use vidrip_core::save::save_asset;

use super::run_engine;

#[derive(Debug)]
pub struct FetchArgs {
    pub id: String,
    pub hints: Vec<String>,
    pub title: Option<String>,
    pub label: Option<String>,
    pub container: Option<ContainerType>,
    pub out_dir: PathBuf,
    pub overwrite: bool,
}

pub async fn run_fetch(cfg: VidripConfig, headers: HashMap<String, String>, args: FetchArgs) -> Result<()> {
    let cancel = CancelToken::new();
    let mut ctx = RequestContext::new(args.id.as_str())
        .with_hints(args.hints)
        .with_cancel(cancel.clone());
    if let Some(t) = args.title {
        ctx = ctx.with_title(t);
    }
    let selector = RenditionSelector {
        label: args.label,
        container: args.container,
    };

    let asset = run_engine(cfg, headers, cancel, move |engine, sink| {
        let mut tracker = RequestTracker::new(sink);
        engine.run(&ctx, &selector, &mut tracker)
    })
    .await?
    .with_context(|| format!("fetch {}", args.id))?;

    for w in &asset.warnings {
        eprintln!("warning: {}", w);
    }
    let path = save_asset(&asset, &args.out_dir, args.overwrite)?;
    println!("{}  {}", sha256_bytes(&asset.bytes), path.display());
    Ok(())
}
