#[cfg(not(target_arch = "wasm32"))]
use native::run;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    run()
}

// The browser build enters through the library's start function
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    use anyhow::{anyhow, Context, Result};
    use clap::Parser;
    use log::{error, info};
    use winit::{
        application::ApplicationHandler,
        dpi::LogicalSize,
        event::WindowEvent,
        event_loop::{ActiveEventLoop, EventLoop},
        window::{Window, WindowId},
    };

    use frame_bridge::cli::Cli;
    use frame_bridge::config::SurfaceConfig;
    use frame_bridge::core::{GpuSurface, MemorySurface, PresentationBridge, Presenter};
    use frame_bridge::demo::PatternProducer;
    use frame_bridge::{DisplaySurface, SurfaceSize};

    // === Constants ===

    const FPS_UPDATE_INTERVAL: f32 = 1.0;
    const HEADLESS_FRAME_STEP: f32 = 1.0 / 60.0;

    pub fn run() -> Result<()> {
        env_logger::init();

        let cli = Cli::parse();
        let config = cli.surface_config()?;

        if let Some(frames) = cli.headless {
            return run_headless(&cli, &config, frames);
        }

        let event_loop = EventLoop::new().context("Failed to create event loop")?;
        let mut app = App::new(config, PatternProducer::new(cli.pattern));
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Produce frames on this thread while a presenter thread owns the surface
    fn run_headless(cli: &Cli, config: &SurfaceConfig, frames: u64) -> Result<()> {
        let surface = MemorySurface::new(0, 0).with_device_pixel_ratio(cli.scale);
        let mut bridge = PresentationBridge::new(surface);
        let size = bridge.fit_logical(config.width as f64, config.height as f64);
        info!(
            "Headless: {}x{} logical at {}x -> {}x{} physical",
            config.width,
            config.height,
            bridge.device_pixel_ratio(),
            size.width,
            size.height
        );

        let (presenter, handle) = Presenter::new(bridge);
        let owner = thread::spawn(move || presenter.run());

        let mut producer = PatternProducer::new(cli.pattern);
        let started = Instant::now();
        for i in 0..frames {
            if let Some(frame) = producer.render(size, i as f32 * HEADLESS_FRAME_STEP) {
                handle.submit(frame)?;
            }
        }
        handle.close()?;

        let bridge = owner
            .join()
            .map_err(|_| anyhow!("Presenter thread panicked"))?;
        let surface = bridge.surface();

        info!(
            "Headless: presented {} frames in {:.1?}, surface {:?}, origin pixel {:?}",
            surface.blit_count(),
            started.elapsed(),
            surface.size(),
            surface.pixel(0, 0)
        );
        Ok(())
    }

    // === Application ===

    struct App {
        config: SurfaceConfig,
        producer: PatternProducer,
        bridge: Option<PresentationBridge<GpuSurface>>,
        logical: LogicalSize<f64>,
        started: Instant,
        last_report: Instant,
        frames_since_report: u32,
        error: Option<anyhow::Error>,
    }

    impl App {
        fn new(config: SurfaceConfig, producer: PatternProducer) -> Self {
            let now = Instant::now();
            let logical = LogicalSize::new(config.width as f64, config.height as f64);
            Self {
                config,
                producer,
                bridge: None,
                logical,
                started: now,
                last_report: now,
                frames_since_report: 0,
                error: None,
            }
        }

        fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
            let window = event_loop
                .create_window(
                    Window::default_attributes()
                        .with_title(self.config.title.clone())
                        .with_inner_size(winit::dpi::LogicalSize::new(
                            self.config.width,
                            self.config.height,
                        )),
                )
                .context("Failed to create window")?;

            let surface = GpuSurface::new(Arc::new(window), &self.config)
                .context("Failed to initialize display surface")?;
            let bridge = PresentationBridge::new(surface);

            info!(
                "Presenting {:?} at {:?}, device pixel ratio {}",
                self.producer.pattern(),
                bridge.surface().size(),
                bridge.device_pixel_ratio()
            );

            self.bridge = Some(bridge);
            Ok(())
        }

        fn redraw(&mut self) {
            let Some(bridge) = &mut self.bridge else {
                return;
            };

            let time = self.started.elapsed().as_secs_f32();
            let size = bridge.surface().size();

            // A collapsed window yields no frame and nothing is presented
            if let Some(frame) = self.producer.render(size, time) {
                if let Err(e) = bridge.present(frame.pixels(), frame.width()) {
                    error!("Present error: {}", e);
                }
            }

            self.frames_since_report += 1;
            let since = self.last_report.elapsed().as_secs_f32();
            if since >= FPS_UPDATE_INTERVAL {
                info!(
                    "FPS: {:.1} ({:?})",
                    self.frames_since_report as f32 / since,
                    bridge.surface().present_mode()
                );
                self.frames_since_report = 0;
                self.last_report = Instant::now();
            }
        }
    }

    impl ApplicationHandler for App {
        fn resumed(&mut self, event_loop: &ActiveEventLoop) {
            if self.bridge.is_some() {
                return;
            }
            if let Err(e) = self.init(event_loop) {
                error!("{:#}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }

        fn window_event(
            &mut self,
            event_loop: &ActiveEventLoop,
            _window_id: WindowId,
            event: WindowEvent,
        ) {
            match event {
                WindowEvent::CloseRequested => event_loop.exit(),
                WindowEvent::Resized(physical) => {
                    if let Some(bridge) = &mut self.bridge {
                        self.logical = physical.to_logical(bridge.device_pixel_ratio());
                        bridge.resize(physical.width, physical.height);
                    }
                }
                WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                    info!("Device pixel ratio changed to {}", scale_factor);
                    // Same logical area, new physical resolution
                    if let Some(bridge) = &mut self.bridge {
                        let size = SurfaceSize::from_logical(
                            self.logical.width,
                            self.logical.height,
                            scale_factor,
                        );
                        bridge.resize(size.width, size.height);
                    }
                }
                WindowEvent::RedrawRequested => self.redraw(),
                _ => {}
            }
        }

        fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
            if let Some(bridge) = &self.bridge {
                bridge.surface().window().request_redraw();
            }
        }
    }
}
