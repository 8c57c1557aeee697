//! Windowed playback of a raw 4:2:0 stream.
//!
//! [`play`] opens a window, builds a [`FrameRenderer`] on a [`WgpuBackend`],
//! and starts a [frame source](crate::source) thread when the event loop
//! resumes. Each redraw drains the frame queue and renders the newest frame.
//! Per-frame failures are logged and playback continues; once the source
//! finishes, the last frame stays on screen until the window is closed.

use std::io::Read;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use crate::config::PlayerConfig;
use crate::error::{Error, Result};
use crate::render::{FrameRenderer, WgpuBackend};
use crate::source::{SourceConfig, SourceEvent, SourceHandle, spawn_source};

/// Play `reader` in a new window until the window is closed.
pub fn play<R>(config: PlayerConfig, reader: R) -> Result<()>
where
    R: Read + Send + 'static,
{
    config.validate()?;
    let event_loop = EventLoop::new().map_err(|e| Error::UnsupportedContext(e.to_string()))?;

    let mut player = Player::new(config, reader);
    event_loop
        .run_app(&mut player)
        .map_err(|e| Error::UnsupportedContext(e.to_string()))?;

    match player.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// The application state winit drives.
struct Player<R> {
    config: PlayerConfig,
    reader: Option<R>,
    window: Option<Arc<Window>>,
    renderer: Option<FrameRenderer<WgpuBackend>>,
    frames: Option<Receiver<SourceEvent>>,
    source: Option<SourceHandle>,
    finished: bool,
    rendered: u64,
    error: Option<Error>,
}

impl<R: Read + Send + 'static> Player<R> {
    fn new(config: PlayerConfig, reader: R) -> Self {
        Self {
            config,
            reader: Some(reader),
            window: None,
            renderer: None,
            frames: None,
            source: None,
            finished: false,
            rendered: 0,
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let size = self.config.surface_size;
        let format = self.config.renderer.pixfmt.resolve()?;
        let attrs = Window::default_attributes()
            .with_title(format!("yuvplay: {} {format}", self.config.resolution))
            .with_inner_size(PhysicalSize::new(size.width, size.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| Error::UnsupportedContext(e.to_string()))?,
        );

        let backend = WgpuBackend::new(window.clone())?;
        let renderer = FrameRenderer::new(backend, self.config.renderer.clone())?;

        if let Some(reader) = self.reader.take() {
            let (tx, rx) = mpsc::sync_channel(self.config.queue_depth);
            let source = spawn_source(reader, SourceConfig::for_player(&self.config)?, tx)?;
            self.frames = Some(rx);
            self.source = Some(source);
        }

        window.request_redraw();
        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }

    /// Drain the queue and return the newest frame, if any.
    fn next_frame(&mut self) -> Option<Vec<u8>> {
        let frames = self.frames.as_ref()?;
        let mut newest = None;
        while let Ok(event) = frames.try_recv() {
            match event {
                SourceEvent::Data(frame) => newest = Some(frame),
                SourceEvent::Finish(stats) => {
                    log::info!(
                        "source finished: {} chunks, {} bytes in {:.2}s",
                        stats.chunk_count,
                        stats.total_size,
                        stats.time_cost.as_secs_f64()
                    );
                    self.finished = true;
                }
                SourceEvent::Error(e) => {
                    log::error!("source failed: {e}");
                    self.finished = true;
                }
                SourceEvent::Abort => self.finished = true,
            }
        }
        newest
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let frame = self.next_frame();
        let resolution = self.config.resolution;

        if let (Some(renderer), Some(frame)) = (self.renderer.as_mut(), frame) {
            match renderer.render(resolution.width, resolution.height, &frame) {
                Ok(()) => self.rendered += 1,
                Err(e @ (Error::FrameSize { .. } | Error::Surface(_))) => {
                    log::warn!("frame {} skipped: {e}", self.rendered);
                }
                Err(e) => {
                    log::error!("render failed: {e}");
                    self.error = Some(e);
                    self.shutdown(event_loop);
                    return;
                }
            }
        }

        if !self.finished
            && let Some(window) = &self.window
        {
            window.request_redraw();
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(source) = self.source.take() {
            source.abort();
            // Unblock a producer waiting on a full queue.
            self.frames = None;
            source.join();
        }
        if let Some(mut renderer) = self.renderer.take() {
            renderer.destroy();
        }
        log::info!("rendered {} frames", self.rendered);
        event_loop.exit();
    }
}

impl<R: Read + Send + 'static> ApplicationHandler for Player<R> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            log::error!("player start failed: {e}");
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("window close requested, exiting");
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.set_size(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}
