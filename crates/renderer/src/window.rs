//! Interactive preview window.
//!
//! The winit event loop owns a [`GrainRenderer`] bound to the window surface
//! and an [`AnimationDriver`] whose frame requests become `request_redraw`
//! calls. Space toggles pause, Escape closes the window.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use scheduler::{AnimationDriver, FrameScheduler, FrameToken};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::error::RenderError;
use crate::grain::GrainRenderer;
use crate::types::{Callbacks, GradientSource, RenderOptions, Size};

pub struct PreviewConfig {
    pub title: String,
    pub size: Size,
    pub source: GradientSource,
    pub options: RenderOptions,
    pub callbacks: Callbacks,
}

impl PreviewConfig {
    pub fn new(source: impl Into<GradientSource>, options: RenderOptions) -> Self {
        Self {
            title: "Grainy Gradient Preview".to_string(),
            size: Size::new(960, 540),
            source: source.into(),
            options,
            callbacks: Callbacks::default(),
        }
    }
}

/// Maps frame requests onto `Window::request_redraw`.
///
/// winit cannot withdraw a redraw, so cancelling only forgets the token; a
/// redraw that arrives without a live token is treated as an invalidation.
pub struct RedrawScheduler {
    window: Arc<Window>,
    next_id: u64,
    outstanding: Option<FrameToken>,
}

impl RedrawScheduler {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next_id: 0,
            outstanding: None,
        }
    }

    /// Claims the token of the request a `RedrawRequested` answers.
    pub fn take_fired(&mut self) -> Option<FrameToken> {
        self.outstanding.take()
    }
}

impl FrameScheduler for RedrawScheduler {
    fn request_frame(&mut self) -> FrameToken {
        self.next_id += 1;
        let token = FrameToken::new(self.next_id);
        self.outstanding = Some(token);
        self.window.request_redraw();
        token
    }

    fn cancel(&mut self, token: FrameToken) {
        if self.outstanding == Some(token) {
            self.outstanding = None;
        }
    }
}

/// Opens the preview window and blocks until it closes.
pub fn run_preview(config: PreviewConfig) -> Result<()> {
    let PreviewConfig {
        title,
        size,
        source,
        options,
        callbacks,
    } = config;

    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window = WindowBuilder::new()
        .with_title(title)
        .with_inner_size(PhysicalSize::new(size.width, size.height))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create preview window: {err}"))?;
    let window = Arc::new(window);

    let mut renderer = GrainRenderer::for_window(window.clone(), source, options, callbacks);
    if let Some(profile) = renderer.adapter() {
        tracing::info!(
            adapter = %profile.name,
            backend = ?profile.backend,
            software = profile.is_software(),
            "preview window ready"
        );
    }
    let mut driver = AnimationDriver::new(
        RedrawScheduler::new(window.clone()),
        renderer.driver_inputs(),
    );
    let mut started = false;

    event_loop.set_control_flow(ControlFlow::Wait);
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    driver.stop();
                    elwt.exit();
                }
                WindowEvent::Resized(new_size) => {
                    renderer.resize(Size::new(new_size.width, new_size.height));
                    if started {
                        let result = driver.invalidate(&mut renderer);
                        if !report_frame(result) {
                            elwt.exit();
                        }
                    }
                }
                WindowEvent::KeyboardInput { event, .. }
                    if event.state == ElementState::Pressed && !event.repeat =>
                {
                    match event.logical_key {
                        Key::Named(NamedKey::Escape) => {
                            driver.stop();
                            elwt.exit();
                        }
                        Key::Named(NamedKey::Space) => {
                            let mut options = renderer.options().clone();
                            options.paused = !options.paused;
                            tracing::info!(paused = options.paused, "toggled pause");
                            renderer.set_options(options);
                            let result = driver.update(renderer.driver_inputs(), &mut renderer);
                            if !report_frame(result) {
                                elwt.exit();
                            }
                        }
                        _ => {}
                    }
                }
                WindowEvent::RedrawRequested => {
                    let result = if !started {
                        started = true;
                        driver.start(&mut renderer)
                    } else if let Some(token) = driver.scheduler_mut().take_fired() {
                        driver.on_frame(token, &mut renderer).map(|_| ())
                    } else {
                        driver.invalidate(&mut renderer)
                    };
                    if !report_frame(result) {
                        elwt.exit();
                    }
                }
                _ => {}
            },
            Event::LoopExiting => driver.stop(),
            _ => {}
        })
        .map_err(|err| anyhow!("preview event loop failed: {err}"))
}

/// Logs a failed frame. Returns `false` when the preview cannot continue.
fn report_frame(result: Result<(), RenderError>) -> bool {
    match result {
        Ok(()) => true,
        Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
            tracing::error!("surface out of memory; closing preview");
            false
        }
        Err(RenderError::Surface(err)) => {
            tracing::warn!(error = %err, "surface error; retrying next frame");
            true
        }
        Err(err) => {
            tracing::warn!(error = %err, "frame skipped");
            true
        }
    }
}
