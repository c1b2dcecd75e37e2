//! Progress lines on stderr.

use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use vidrip_core::progress::{Progress, ProgressEvent};

/// Prints events until the sending side is dropped.
pub(super) fn spawn_printer(mut rx: Receiver<ProgressEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            let amount = match ev.progress {
                Progress::None => String::new(),
                Progress::Percent(p) => format!(" {:>3}%", p),
                Progress::Count { done, total } => format!(" {}/{}", done, total),
                Progress::Bytes(b) => format!(" {} bytes", b),
            };
            eprintln!("[{}]{} {}", ev.phase, amount, ev.status);
        }
    })
}
