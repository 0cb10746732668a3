//! Background bootstrap: loads and validates the dimension rulesets on a
//! worker thread while the embedding application shows a progress screen.
//!
//! The frame loop must not start until `try_finish` hands back the loaded
//! assets; a bootstrap failure is surfaced through the progress handle
//! instead of being swallowed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;

use log::{error, info};

use crate::dimension::DimensionSet;

pub struct LoadedAssets {
    pub dimensions: DimensionSet,
}

#[derive(Default)]
struct ProgressInner {
    dimensions_loaded: AtomicBool,
    error: Mutex<Option<String>>,
}

/// Shared readiness flags, readable from the progress screen while the
/// worker runs.
#[derive(Clone, Default)]
pub struct Progress {
    inner: Arc<ProgressInner>,
}

impl Progress {
    pub fn dimensions_loaded(&self) -> bool {
        self.inner.dimensions_loaded.load(Ordering::Acquire)
    }

    pub fn error(&self) -> Option<String> {
        self.inner.error.lock().ok().and_then(|e| e.clone())
    }

    fn mark_dimensions(&self) {
        self.inner.dimensions_loaded.store(true, Ordering::Release);
    }

    fn record_error(&self, message: &str) {
        if let Ok(mut slot) = self.inner.error.lock() {
            *slot = Some(message.to_string());
        }
    }
}

pub struct Bootstrap {
    progress: Progress,
    rx: mpsc::Receiver<Result<LoadedAssets, String>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Bootstrap {
    /// Spawns the worker loading the embedded dimension files.
    pub fn start() -> Self {
        Self::start_with(|progress| {
            let dimensions = DimensionSet::load_embedded()?;
            progress.mark_dimensions();
            info!("bootstrap: dimension rulesets loaded");
            Ok(LoadedAssets { dimensions })
        })
    }

    fn start_with<F>(loader: F) -> Self
    where
        F: FnOnce(&Progress) -> Result<LoadedAssets, String> + Send + 'static,
    {
        let progress = Progress::default();
        let (tx, rx) = mpsc::channel();
        let worker_progress = progress.clone();
        let handle = thread::spawn(move || {
            let result = loader(&worker_progress);
            if let Err(message) = &result {
                error!("bootstrap failed: {}", message);
                worker_progress.record_error(message);
            }
            // the receiver may already be gone on quit
            let _ = tx.send(result);
        });
        Bootstrap {
            progress,
            rx,
            handle: Some(handle),
        }
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Non-blocking poll for the worker's result. Returns `None` while it
    /// is still loading; the caller keeps driving the progress screen.
    pub fn try_finish(&mut self) -> Option<Result<LoadedAssets, String>> {
        match self.rx.try_recv() {
            Ok(result) => {
                if let Some(handle) = self.handle.take() {
                    let _ = handle.join();
                }
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Err("Bootstrap worker exited without a result".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn finish(bootstrap: &mut Bootstrap) -> Result<LoadedAssets, String> {
        for _ in 0..500 {
            if let Some(result) = bootstrap.try_finish() {
                return result;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("bootstrap did not finish in time");
    }

    #[test]
    fn test_loads_embedded_dimensions() {
        let mut bootstrap = Bootstrap::start();
        let assets = finish(&mut bootstrap).unwrap();
        assert!(bootstrap.progress().dimensions_loaded());
        assert!(bootstrap.progress().error().is_none());
        assert_eq!(assets.dimensions.first().name, "normal");
    }

    #[test]
    fn test_failure_is_surfaced_not_swallowed() {
        let mut bootstrap =
            Bootstrap::start_with(|_| Err("preset file corrupted".to_string()));
        let result = finish(&mut bootstrap);
        assert!(result.is_err());
        assert_eq!(
            bootstrap.progress().error().as_deref(),
            Some("preset file corrupted")
        );
    }
}
