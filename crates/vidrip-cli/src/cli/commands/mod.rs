//! CLI command handlers, one per file.

mod checksum;
mod completions;
mod extract;
mod fetch;
mod probe;
mod progress;
mod resolve;

pub use checksum::run_checksum;
pub use completions::run_completions;
pub use extract::run_extract;
pub use fetch::{run_fetch, FetchArgs};
pub use probe::run_probe;
pub use resolve::run_resolve;

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use vidrip_core::config::VidripConfig;
use vidrip_core::control::CancelToken;
use vidrip_core::pipeline::Engine;
use vidrip_core::progress::{ProgressEvent, ProgressSink};

/// Runs a blocking engine call off the async runtime, printing progress to
/// stderr and cancelling on Ctrl-C.
pub(super) async fn run_engine<T, F>(
    cfg: VidripConfig,
    headers: HashMap<String, String>,
    cancel: CancelToken,
    f: F,
) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Engine, ProgressSink) -> T + Send + 'static,
{
    let engine = Arc::new(Engine::with_curl(cfg, headers));
    let (tx, rx) = tokio::sync::mpsc::channel::<ProgressEvent>(64);
    let printer = progress::spawn_printer(rx);

    let ctrl_c_cancel = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("cancelling...");
            ctrl_c_cancel.cancel();
        }
    });

    let worker = Arc::clone(&engine);
    let out = tokio::task::spawn_blocking(move || f(&worker, ProgressSink::new(tx)))
        .await
        .context("engine task panicked")?;
    watcher.abort();
    let _ = printer.await;
    Ok(out)
}
