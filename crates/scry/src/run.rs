use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use brightness::{BrightnessCycle, SysfsBacklight};
use renderer::{Renderer, RendererConfig};
use slideshow::PhotoSet;

use crate::cli::Cli;
use crate::config::Settings;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let settings = resolve_settings(&cli)?;

    let photos = PhotoSet::discover(&cli.photos)
        .with_context(|| format!("cannot start slideshow from {}", cli.photos.display()))?;
    info!(
        count = photos.len(),
        dir = %cli.photos.display(),
        "discovered photo corpus"
    );

    let brightness = if settings.brightness.enabled {
        start_brightness(settings.brightness.step)
    } else {
        info!("brightness cycling disabled");
        None
    };
    let brightness = Arc::new(Mutex::new(brightness));
    install_interrupt_handler(Arc::clone(&brightness));

    let config = RendererConfig {
        display_duration: settings.slideshow.display,
        fade_duration: settings.slideshow.fade,
        target_fps: settings.slideshow.fps.filter(|fps| *fps > 0.0),
        fullscreen: !cli.windowed,
        show_cursor: cli.cursor,
    };
    let result = Renderer::new(photos, config).run();

    // Restore the backlight before reporting how the run ended; the
    // handle's Drop covers panics and early returns above.
    shutdown_brightness(&brightness);
    result
}

/// Stops the brightness worker and restores the backlight. Both the
/// normal exit path and the interrupt handler funnel through here; the
/// slot empties on first use so whoever comes second is a no-op.
fn shutdown_brightness(slot: &Mutex<Option<BrightnessCycle>>) {
    if let Some(mut cycle) = slot.lock().unwrap().take() {
        cycle.shutdown();
    }
}

/// A SIGINT would otherwise kill the process with the backlight stuck
/// mid-sweep. The handler runs on its own thread, so taking the mutex
/// is safe.
fn install_interrupt_handler(slot: Arc<Mutex<Option<BrightnessCycle>>>) {
    let result = ctrlc::set_handler(move || {
        info!("interrupt received; restoring brightness");
        shutdown_brightness(&slot);
        std::process::exit(130);
    });
    if let Err(err) = result {
        warn!(error = %err, "failed to install interrupt handler");
    }
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("invalid settings file {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(display) = cli.display {
        settings.slideshow.display = display;
    }
    if let Some(fade) = cli.fade {
        settings.slideshow.fade = fade;
    }
    if let Some(fps) = cli.fps {
        settings.slideshow.fps = Some(fps);
    }
    if cli.no_brightness {
        settings.brightness.enabled = false;
    }
    if let Some(step) = cli.step {
        settings.brightness.step = step;
    }
    Ok(settings)
}

fn start_brightness(step: Duration) -> Option<BrightnessCycle> {
    let backlight = match SysfsBacklight::discover() {
        Ok(backlight) => backlight,
        Err(err) => {
            warn!(error = %err, "no usable backlight; brightness cycling disabled");
            return None;
        }
    };
    info!(device = %backlight.device_path().display(), "brightness cycling enabled");
    match BrightnessCycle::spawn(Arc::new(backlight), step) {
        Ok(cycle) => Some(cycle),
        Err(err) => {
            warn!(error = %err, "failed to start brightness worker");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brightness::{Backlight, BrightnessError};
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("scry").chain(args.iter().copied()))
    }

    #[test]
    fn cli_overrides_settings_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scry.toml");
        std::fs::write(&path, "[slideshow]\ndisplay = 60\nfade = 5\n").unwrap();

        let cli = cli(&[
            "/photos",
            "--config",
            path.to_str().unwrap(),
            "--display",
            "20s",
        ]);
        let settings = resolve_settings(&cli).expect("resolve");
        assert_eq!(settings.slideshow.display, Duration::from_secs(20));
        assert_eq!(settings.slideshow.fade, Duration::from_secs(5));
    }

    #[test]
    fn no_brightness_flag_wins_over_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scry.toml");
        std::fs::write(&path, "[brightness]\nenabled = true\n").unwrap();

        let cli = cli(&["/photos", "--config", path.to_str().unwrap(), "--no-brightness"]);
        let settings = resolve_settings(&cli).expect("resolve");
        assert!(!settings.brightness.enabled);
    }

    #[test]
    fn defaults_apply_without_a_settings_file() {
        let settings = resolve_settings(&cli(&["/photos"])).expect("resolve");
        assert_eq!(settings.slideshow.display, Duration::from_secs(15));
        assert!(settings.brightness.enabled);
    }

    #[derive(Debug)]
    struct RecordingBacklight {
        level: Mutex<u8>,
        history: Mutex<Vec<u8>>,
    }

    impl RecordingBacklight {
        fn new(level: u8) -> Self {
            Self {
                level: Mutex::new(level),
                history: Mutex::new(Vec::new()),
            }
        }
    }

    impl Backlight for RecordingBacklight {
        fn level(&self) -> Result<u8, BrightnessError> {
            Ok(*self.level.lock().unwrap())
        }

        fn set_level(&self, percent: u8) -> Result<(), BrightnessError> {
            *self.level.lock().unwrap() = percent;
            self.history.lock().unwrap().push(percent);
            Ok(())
        }
    }

    #[test]
    fn interrupt_and_normal_shutdown_restore_brightness_once() {
        let backlight = Arc::new(RecordingBacklight::new(70));
        let cycle = brightness::BrightnessCycle::spawn(
            Arc::clone(&backlight) as Arc<dyn Backlight>,
            Duration::from_millis(1),
        )
        .expect("spawn cycle");
        let slot = Arc::new(Mutex::new(Some(cycle)));

        // First call stands in for the interrupt handler, second for the
        // normal exit path that also runs on the way out of run().
        shutdown_brightness(&slot);
        assert_eq!(*backlight.level.lock().unwrap(), 70);
        let writes = backlight.history.lock().unwrap().len();
        assert!(writes >= 1, "sweep should have written at least the restore");

        shutdown_brightness(&slot);
        assert_eq!(
            backlight.history.lock().unwrap().len(),
            writes,
            "second shutdown must not write again"
        );
        assert_eq!(*backlight.level.lock().unwrap(), 70);
    }
}
