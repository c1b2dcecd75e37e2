//! `vidrip probe <url>...`: check which synthesized candidates exist.

use anyhow::Result;
use std::collections::HashMap;
use vidrip_core::config::VidripConfig;
use vidrip_core::control::CancelToken;
use vidrip_core::model::sort_renditions;
use vidrip_core::pipeline::RequestContext;

use super::resolve::print_renditions;
use super::run_engine;

pub async fn run_probe(cfg: VidripConfig, headers: HashMap<String, String>, hints: Vec<String>) -> Result<()> {
    let cancel = CancelToken::new();
    // The identifier is not used on this path.
    let ctx = RequestContext::new("probe")
        .with_hints(hints)
        .with_cancel(cancel.clone());
    let outcome = run_engine(cfg, headers, cancel, move |engine, sink| engine.probe_hints(&ctx, &sink)).await??;

    let mut renditions = outcome.renditions();
    sort_renditions(&mut renditions);
    println!(
        "{} confirmed ({} probed, {} skipped):",
        renditions.len(),
        outcome.tried,
        outcome.skipped
    );
    print_renditions(&renditions);
    Ok(())
}
