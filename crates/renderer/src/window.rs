use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowBuilder};

use slideshow::{
    lens_at, CrossfadeScheduler, PauseClock, PhotoSet, SlideDirection, SlideEvent,
};

use crate::gpu::GpuState;
use crate::loader::{CanvasImage, ImageLoader};
use crate::RendererConfig;

pub(crate) fn run(photos: PhotoSet, config: RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;

    let mut builder = WindowBuilder::new().with_title("scry");
    if config.fullscreen {
        builder = builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
    } else {
        builder = builder.with_inner_size(PhysicalSize::new(1280, 720));
    }
    let window = Arc::new(
        builder
            .build(&event_loop)
            .context("failed to create window")?,
    );
    window.set_cursor_visible(config.show_cursor);

    let mut driver = FrameDriver::new(Arc::clone(&window), photos, &config)?;
    let mut fatal: Option<anyhow::Error> = None;

    let run_result = event_loop.run(|event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                info!("window closed; shutting down");
                elwt.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                driver.handle_key(&event, elwt);
            }
            WindowEvent::Resized(new_size) => {
                driver.resize(new_size);
            }
            WindowEvent::RedrawRequested => match driver.render_frame() {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                    debug!("surface lost or outdated; reconfiguring");
                    driver.reconfigure();
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    fatal = Some(anyhow!("GPU surface reported out of memory"));
                    elwt.exit();
                }
                Err(err) => {
                    warn!(error = %err, "surface error; retrying next frame");
                }
            },
            _ => {}
        },
        Event::AboutToWait => {
            let now = Instant::now();
            if driver.frame_due(now) {
                window.request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            } else if let Some(deadline) = driver.next_frame_deadline() {
                elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
            }
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))?;
    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Optional frame cap on top of vsync. With no target interval every
/// `AboutToWait` is render-ready.
struct FramePacer {
    interval: Option<Duration>,
    next_due: Instant,
}

impl FramePacer {
    fn new(target_fps: Option<f32>, now: Instant) -> Self {
        let interval = target_fps
            .filter(|fps| *fps > 0.0)
            .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)));
        Self {
            interval,
            next_due: now,
        }
    }

    fn frame_due(&self, now: Instant) -> bool {
        self.interval.is_none() || now >= self.next_due
    }

    fn deadline(&self) -> Option<Instant> {
        self.interval.map(|_| self.next_due)
    }

    fn mark_rendered(&mut self, now: Instant) {
        if let Some(interval) = self.interval {
            self.next_due = now + interval;
        }
    }
}

/// Per-frame telemetry folded into the window title once a second.
struct TitleStats {
    window_start: Instant,
    frames: u32,
    fps: f32,
}

impl TitleStats {
    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Returns true once per second, when the title should refresh.
    fn record_frame(&mut self, now: Instant) -> bool {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed >= Duration::from_secs(1) {
            self.fps = self.frames as f32 / elapsed.as_secs_f32();
            self.frames = 0;
            self.window_start = now;
            return true;
        }
        false
    }
}

/// Ties the scheduler, loader and GPU state together and drives one
/// frame at a time.
struct FrameDriver {
    window: Arc<Window>,
    gpu: GpuState,
    photos: PhotoSet,
    loader: ImageLoader,
    schedule: CrossfadeScheduler,
    clock: PauseClock,
    pacer: FramePacer,
    stats: TitleStats,
}

impl FrameDriver {
    fn new(window: Arc<Window>, photos: PhotoSet, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuState::new(window.as_ref(), size)?;
        let size = gpu.size();
        let loader = ImageLoader::new(size.width, size.height);

        let now = Instant::now();
        let schedule = CrossfadeScheduler::new(
            photos.len(),
            config.display_duration,
            config.fade_duration,
            now,
        );

        // The very first photo must decode; without it there is nothing
        // to show at all.
        let first = loader
            .load(photos.path(schedule.current()))
            .with_context(|| format!("failed to load first photo {}", photos.name(0)))?;
        gpu.upload_front(&first);
        if schedule.next() == schedule.current() {
            gpu.upload_back(&first);
        } else {
            match loader.load(photos.path(schedule.next())) {
                Ok(image) => gpu.upload_back(&image),
                Err(err) => {
                    warn!(error = %err, "failed to preload second photo; reusing first");
                    gpu.upload_back(&first);
                }
            }
        }
        info!(
            photos = photos.len(),
            width = size.width,
            height = size.height,
            "slideshow started"
        );

        Ok(Self {
            window,
            gpu,
            photos,
            loader,
            schedule,
            clock: PauseClock::new(now),
            pacer: FramePacer::new(config.target_fps, now),
            stats: TitleStats::new(now),
        })
    }

    fn frame_due(&self, now: Instant) -> bool {
        self.pacer.frame_due(now)
    }

    fn next_frame_deadline(&self) -> Option<Instant> {
        self.pacer.deadline()
    }

    fn reconfigure(&mut self) {
        self.gpu.reconfigure();
    }

    fn handle_key(&mut self, event: &KeyEvent, elwt: &EventLoopWindowTarget<()>) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match event.logical_key {
            Key::Named(NamedKey::Escape) => {
                info!("escape pressed; shutting down");
                elwt.exit();
            }
            Key::Named(NamedKey::Space) => {
                let paused = self.clock.toggle(Instant::now());
                info!(paused, "lens motion toggled");
            }
            Key::Named(NamedKey::ArrowRight) => self.navigate(SlideDirection::Forward),
            Key::Named(NamedKey::ArrowLeft) => self.navigate(SlideDirection::Backward),
            _ => {}
        }
    }

    fn navigate(&mut self, direction: SlideDirection) {
        let event = self.schedule.navigate(direction, Instant::now());
        if let SlideEvent::Retargeted { target } = event {
            debug!(photo = %self.photos.name(target), ?direction, "manual navigation");
            self.stage_back(target);
        }
    }

    /// Decodes `index` into the back slot. Decode failures mid-run are
    /// not fatal; the slot keeps whatever it held before.
    fn stage_back(&mut self, index: usize) {
        match self.loader.load(self.photos.path(index)) {
            Ok(image) => self.gpu.upload_back(&image),
            Err(err) => {
                warn!(
                    error = %err,
                    photo = %self.photos.name(index),
                    "failed to decode photo; keeping previous slot contents"
                );
            }
        }
    }

    /// Re-stages `index` into the front slot after a resize recreated
    /// both textures. A failed decode leaves a black canvas.
    fn stage_front(&mut self, index: usize) {
        match self.loader.load(self.photos.path(index)) {
            Ok(image) => self.gpu.upload_front(&image),
            Err(err) => {
                let size = self.gpu.size();
                warn!(
                    error = %err,
                    photo = %self.photos.name(index),
                    "failed to re-decode visible photo after resize"
                );
                self.gpu
                    .upload_front(&CanvasImage::black(size.width, size.height));
            }
        }
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.gpu.resize(new_size);
        let size = self.gpu.size();
        self.loader.set_canvas(size.width, size.height);
        self.stage_front(self.schedule.current());
        self.stage_back(self.schedule.next());
        debug!(width = size.width, height = size.height, "canvas resized");
    }

    fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        match self.schedule.tick(now) {
            Some(SlideEvent::FadeStarted { target }) => {
                debug!(photo = %self.photos.name(target), "dissolve started");
            }
            Some(SlideEvent::Committed { revealed, preload }) => {
                self.gpu.swap_slots();
                self.stage_back(preload);
                debug!(
                    photo = %self.photos.name(revealed),
                    preloading = %self.photos.name(preload),
                    "dissolve committed"
                );
            }
            Some(SlideEvent::Retargeted { .. }) | None => {}
        }

        let seconds = self.clock.elapsed(now).as_secs_f32();
        let size = self.gpu.size();
        let lens = lens_at(seconds, size.width as f32, size.height as f32);
        let fade = self.schedule.fade_progress(now);
        self.gpu.render(&lens, fade)?;
        self.pacer.mark_rendered(now);

        if self.stats.record_frame(now) {
            self.refresh_title(now, fade);
        }
        Ok(())
    }

    fn refresh_title(&self, now: Instant, fade: f32) {
        let name = self.photos.name(self.schedule.current());
        let title = if self.schedule.is_dissolving() {
            format!(
                "scry | {name} | {fps:.0} fps | fade {pct:.0}%",
                fps = self.stats.fps,
                pct = fade * 100.0
            )
        } else {
            let remaining = self.schedule.hold_remaining(now).as_secs();
            let paused = if self.clock.is_paused() { " | paused" } else { "" };
            format!(
                "scry | {name} | {fps:.0} fps | next in {remaining}s{paused}",
                fps = self.stats.fps
            )
        };
        self.window.set_title(&title);
    }
}
