//! Configuration file watcher for hot-reload support.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info};

use crate::error::{DaemonError, Result};

const RELOAD_SETTLE_DELAY: Duration = Duration::from_millis(100);
const CONFIG_DEBOUNCE_DURATION: Duration = Duration::from_millis(500);

/// Keeps the watch alive; dropping it stops notifications.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    _bridge_thread: std::thread::JoinHandle<()>,
}

/// Watch the directory holding `config_path` and call `on_change` after
/// the file settles.
///
/// `on_change` runs on a background thread and must only hand the event
/// off to the UI thread. Returning `false` stops the watcher thread.
///
/// # Errors
///
/// Returns an error if the path has no parent or the watch cannot be set up.
pub fn spawn_config_watcher<F>(config_path: PathBuf, on_change: F) -> Result<ConfigWatcher>
where
    F: Fn() -> bool + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<()>();
    let watcher = watch_config_file(&config_path, tx)?;

    let bridge_thread = std::thread::Builder::new()
        .name("config-watcher".to_string())
        .spawn(move || {
            while rx.recv().is_ok() {
                debug!("Config file changed, sending reload notification");
                std::thread::sleep(RELOAD_SETTLE_DELAY);
                if !on_change() {
                    debug!("Config reload receiver gone, stopping watcher");
                    break;
                }
            }
            debug!("Config watcher channel closed");
        })?;

    Ok(ConfigWatcher {
        _watcher: watcher,
        _bridge_thread: bridge_thread,
    })
}

fn watch_config_file(config_path: &Path, tx: mpsc::Sender<()>) -> Result<RecommendedWatcher> {
    let Some(parent) = config_path.parent() else {
        return Err(DaemonError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Invalid config path",
        )));
    };
    let file_name = config_path.file_name().map(ToOwned::to_owned);
    let last_event = Arc::new(Mutex::new(None::<Instant>));

    let mut watcher =
        notify::recommended_watcher(move |result: notify::Result<notify::Event>| match result {
            Ok(event) => {
                if !matches!(
                    event.kind,
                    notify::EventKind::Modify(_) | notify::EventKind::Create(_)
                ) {
                    return;
                }
                if !event.paths.iter().any(|p| p.file_name() == file_name.as_deref()) {
                    return;
                }
                let Ok(mut last) = last_event.lock() else {
                    error!("[config_watcher] Debounce mutex poisoned, skipping event");
                    return;
                };
                let now = Instant::now();
                if last.is_none_or(|at| now.duration_since(at) > CONFIG_DEBOUNCE_DURATION) {
                    *last = Some(now);
                    let _ = tx.send(());
                }
            }
            Err(e) => {
                error!("Watcher error: {e}");
            }
        })?;

    watcher.watch(parent, RecursiveMode::NonRecursive)?;
    info!("Watching config directory: {}", parent.display());
    Ok(watcher)
}
