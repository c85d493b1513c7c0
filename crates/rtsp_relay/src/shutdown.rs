use crate::error::{RelayError, Result};
use tokio::sync::watch;

/// Route SIGINT/SIGTERM to the relay loop of node `node_name`.
///
/// The sender lives inside the signal handler for the rest of the process,
/// so the returned receiver only changes on a signal and never reports a
/// closed channel.
pub fn install(node_name: &str) -> Result<watch::Receiver<()>> {
    let (tx, rx) = watch::channel(());
    let node_name = node_name.to_string();
    ctrlc::set_handler(move || {
        log::info!("[{}] interrupt received, stopping relay", node_name);
        let _ = tx.send(());
    })
    .map_err(|e| RelayError::Signal(e.to_string()))?;
    Ok(rx)
}
