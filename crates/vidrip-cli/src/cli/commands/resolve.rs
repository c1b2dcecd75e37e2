//! `vidrip resolve <id>`: list renditions.

use anyhow::Result;
use std::collections::HashMap;
use vidrip_core::config::VidripConfig;
use vidrip_core::control::CancelToken;
use vidrip_core::model::RenditionDescriptor;
use vidrip_core::pipeline::RequestContext;

use super::run_engine;

pub async fn run_resolve(
    cfg: VidripConfig,
    headers: HashMap<String, String>,
    id: &str,
    hints: Vec<String>,
) -> Result<()> {
    let cancel = CancelToken::new();
    let ctx = RequestContext::new(id)
        .with_hints(hints)
        .with_cancel(cancel.clone());
    let resolved = run_engine(cfg, headers, cancel, move |engine, sink| {
        engine.resolve_renditions(&ctx, &sink)
    })
    .await??;

    println!("{} ({:?}):", resolved.video_id, resolved.source);
    print_renditions(&resolved.renditions);
    Ok(())
}

pub(super) fn print_renditions(renditions: &[RenditionDescriptor]) {
    println!("{:<8} {:<6} {:>6} {:>12}  URL", "LABEL", "TYPE", "HEIGHT", "SIZE");
    for r in renditions {
        let size = r
            .size_bytes
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<8} {:<6} {:>6} {:>12}  {}", r.label, r.container, r.height, size, r.url);
    }
}
