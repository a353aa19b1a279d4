//! Screen brightness oscillation for the slideshow: a worker thread
//! sweeps the backlight down to zero and back in one-percent steps, and
//! the original level is restored exactly once on every exit path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use tracing::{debug, info, warn};

const SYSFS_BACKLIGHT_ROOT: &str = "/sys/class/backlight";

#[derive(Debug, thiserror::Error)]
pub enum BrightnessError {
    #[error("no backlight device under {0}")]
    NoDevice(PathBuf),
    #[error("failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unexpected value {value:?} in {path}")]
    Parse { path: PathBuf, value: String },
    #[error("failed to spawn brightness worker")]
    Spawn(#[source] io::Error),
}

/// Percentage-based backlight access. The sysfs implementation is the
/// real one; tests substitute an in-memory fake.
pub trait Backlight: Send + Sync {
    /// Current level as a percentage of the device maximum.
    fn level(&self) -> Result<u8, BrightnessError>;
    /// Sets the level; values above 100 are clamped.
    fn set_level(&self, percent: u8) -> Result<(), BrightnessError>;
}

/// Backlight driver over `/sys/class/backlight/<device>/`.
#[derive(Debug)]
pub struct SysfsBacklight {
    device: PathBuf,
    max_raw: u32,
}

impl SysfsBacklight {
    /// Picks the first device (sorted) under the standard sysfs root.
    pub fn discover() -> Result<Self, BrightnessError> {
        Self::discover_in(Path::new(SYSFS_BACKLIGHT_ROOT))
    }

    fn discover_in(root: &Path) -> Result<Self, BrightnessError> {
        let entries = fs::read_dir(root).map_err(|source| BrightnessError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let mut devices: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        devices.sort();
        let device = devices
            .into_iter()
            .next()
            .ok_or_else(|| BrightnessError::NoDevice(root.to_path_buf()))?;
        let max_raw = read_sysfs_value(&device.join("max_brightness"))?;
        if max_raw == 0 {
            return Err(BrightnessError::Parse {
                path: device.join("max_brightness"),
                value: "0".into(),
            });
        }
        debug!(device = %device.display(), max_raw, "selected backlight device");
        Ok(Self { device, max_raw })
    }

    pub fn device_path(&self) -> &Path {
        &self.device
    }
}

impl Backlight for SysfsBacklight {
    fn level(&self) -> Result<u8, BrightnessError> {
        let raw = read_sysfs_value(&self.device.join("actual_brightness"))?;
        let percent = (u64::from(raw) * 100 + u64::from(self.max_raw) / 2) / u64::from(self.max_raw);
        Ok(percent.min(100) as u8)
    }

    fn set_level(&self, percent: u8) -> Result<(), BrightnessError> {
        let percent = percent.min(100);
        let raw = (u64::from(percent) * u64::from(self.max_raw) + 50) / 100;
        let path = self.device.join("brightness");
        fs::write(&path, raw.to_string()).map_err(|source| BrightnessError::Io { path, source })
    }
}

fn read_sysfs_value(path: &Path) -> Result<u32, BrightnessError> {
    let text = fs::read_to_string(path).map_err(|source| BrightnessError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    text.trim().parse().map_err(|_| BrightnessError::Parse {
        path: path.to_path_buf(),
        value: text.trim().to_string(),
    })
}

/// Bounded triangle-wave stepper: walks the level down to 0, bounces,
/// walks back up to 100, and repeats. Never leaves [0, 100].
#[derive(Debug, Clone, Copy)]
pub struct Sweep {
    level: u8,
    rising: bool,
}

impl Sweep {
    pub fn new(start: u8) -> Self {
        Self {
            level: start.min(100),
            rising: false,
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Moves one percent along the wave and returns the new level.
    pub fn advance(&mut self) -> u8 {
        if self.rising {
            if self.level >= 100 {
                self.rising = false;
                self.level -= 1;
            } else {
                self.level += 1;
            }
        } else if self.level == 0 {
            self.rising = true;
            self.level = 1;
        } else {
            self.level -= 1;
        }
        self.level
    }
}

/// Restores the captured level the first time `restore` runs, from
/// whichever side gets there first (worker exit or handle drop).
struct RestoreGuard {
    backlight: Arc<dyn Backlight>,
    original: u8,
    done: AtomicBool,
}

impl RestoreGuard {
    fn restore(&self) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(level = self.original, "restoring startup brightness");
        if let Err(err) = self.backlight.set_level(self.original) {
            warn!(error = %err, "failed to restore startup brightness");
        }
    }
}

/// Handle to the brightness worker thread. Dropping it stops the sweep
/// and restores the startup level; `shutdown` does the same eagerly.
pub struct BrightnessCycle {
    stop_tx: Sender<()>,
    worker: Option<JoinHandle<()>>,
    guard: Arc<RestoreGuard>,
}

impl BrightnessCycle {
    /// Captures the current level and starts sweeping. The worker sleeps
    /// on the stop channel between steps, so shutdown latency is bounded
    /// by a single `step`.
    pub fn spawn(backlight: Arc<dyn Backlight>, step: Duration) -> Result<Self, BrightnessError> {
        let original = backlight.level()?;
        info!(level = original, "captured startup brightness");
        let guard = Arc::new(RestoreGuard {
            backlight: Arc::clone(&backlight),
            original,
            done: AtomicBool::new(false),
        });
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let worker_guard = Arc::clone(&guard);
        let worker = thread::Builder::new()
            .name("brightness-sweep".into())
            .spawn(move || {
                let mut sweep = Sweep::new(original);
                loop {
                    match stop_rx.recv_timeout(step) {
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {}
                    }
                    let level = sweep.advance();
                    if let Err(err) = backlight.set_level(level) {
                        warn!(error = %err, level, "failed to set brightness");
                    }
                }
                worker_guard.restore();
            })
            .map_err(BrightnessError::Spawn)?;
        Ok(Self {
            stop_tx,
            worker: Some(worker),
            guard,
        })
    }

    /// Stops the worker and restores brightness. Idempotent.
    pub fn shutdown(&mut self) {
        let _ = self.stop_tx.try_send(());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("brightness worker panicked; restoring from handle");
            }
        }
        self.guard.restore();
    }
}

impl Drop for BrightnessCycle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
