use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{FrameCtx, InitCtx, ResizeCtx, Scene, SceneControl};
use crate::device::{Gpu, GpuInit};
use crate::input::{platform, InputEvent, InputState};
use crate::time::GameClock;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Stop the game clock while the window is unfocused.
    pub pause_on_focus_loss: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "ripple".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            pause_on_focus_loss: true,
        }
    }
}

/// Entry point for the frame loop.
pub struct Runtime;

impl Runtime {
    /// Opens the window, initialises `scene` and drives it until exit.
    ///
    /// Returns the error that ended the loop, if any.
    pub fn run<S>(config: RuntimeConfig, gpu_init: GpuInit, scene: S) -> Result<()>
    where
        S: Scene + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = RuntimeState::new(config, gpu_init, scene);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct RuntimeState<S: Scene + 'static> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    scene: S,

    entry: Option<WindowEntry>,
    clock: GameClock,
    input: InputState,

    user_paused: bool,
    focus_paused: bool,

    failure: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<S: Scene + 'static> RuntimeState<S> {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, scene: S) -> Self {
        Self {
            config,
            gpu_init,
            scene,
            entry: None,
            clock: GameClock::new(),
            input: InputState::default(),
            user_paused: false,
            focus_paused: false,
            failure: None,
            exit_requested: false,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        log::error!("frame loop terminated: {e:#}");
        self.failure = Some(e);
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let mut entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")?;

        let scene = &mut self.scene;
        entry
            .with_mut(|fields| {
                scene.init(&mut InitCtx {
                    window: fields.window,
                    gpu: fields.gpu,
                })
            })
            .context("scene initialization failed")?;

        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
        self.clock.reset();
        Ok(())
    }

    /// Applies the combined pause state to the clock.
    fn sync_clock(&mut self) {
        let paused = self.user_paused || self.focus_paused;
        if paused && !self.clock.is_stopped() {
            self.clock.stop();
            log::debug!("clock paused");
        } else if !paused && self.clock.is_stopped() {
            self.clock.start();
            log::debug!("clock resumed");
        }
    }

    fn apply_control(&mut self, event_loop: &ActiveEventLoop, control: SceneControl) {
        match control {
            SceneControl::Continue => {}
            SceneControl::Exit => {
                self.exit_requested = true;
                event_loop.exit();
            }
            SceneControl::TogglePause => {
                self.user_paused = !self.user_paused;
                log::info!("{}", if self.user_paused { "paused" } else { "resumed" });
                self.sync_clock();
            }
        }
    }

    fn handle_input(&mut self, event_loop: &ActiveEventLoop, ev: InputEvent) {
        self.input.apply(&ev);

        if let InputEvent::Focused(focused) = ev {
            if self.config.pause_on_focus_loss {
                self.focus_paused = !focused;
                self.sync_clock();
            }
        }

        let control = self.scene.handle_input(&ev);
        self.apply_control(event_loop, control);
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        entry.with_gpu_mut(|gpu| gpu.resize(size));
        if size.width == 0 || size.height == 0 {
            return;
        }

        let scene = &mut self.scene;
        entry.with_gpu(|gpu| {
            let actual = gpu.size();
            log::info!("resized to {}x{}", actual.width, actual.height);
            scene.resize(&ResizeCtx {
                device: gpu.device(),
                queue: gpu.queue(),
                width: actual.width,
                height: actual.height,
            });
        });
        entry.with_window(|w| w.request_redraw());
    }

    /// Drives one frame: tick, update, draw.
    fn redraw(&mut self) -> Result<SceneControl> {
        let Some(entry) = self.entry.as_mut() else {
            return Ok(SceneControl::Continue);
        };

        // Minimised; nothing to present into.
        let size = entry.with_window(|w| w.inner_size());
        if size.width == 0 || size.height == 0 {
            return Ok(SceneControl::Continue);
        }

        self.clock.tick();

        let (scene, clock, input) = (&mut self.scene, &self.clock, &self.input);
        let result = entry.with_mut(|fields| -> Result<SceneControl> {
            let mut ctx = FrameCtx {
                window: fields.window,
                gpu: fields.gpu,
                input,
                clock,
            };
            let control = scene.update(&mut ctx)?;
            scene.draw(&mut ctx)?;
            Ok(control)
        });

        self.input.end_frame();
        result
    }
}

impl<S: Scene + 'static> ApplicationHandler for RuntimeState<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        if let Err(e) = self.create_window(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Continuous redraw; the wave simulation runs every frame.
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let translated = self
            .entry
            .as_ref()
            .and_then(|entry| entry.with_window(|w| platform::translate_window_event(w, &event)));
        if let Some(ev) = translated {
            self.handle_input(event_loop, ev);
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.exit_requested = true;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => self.resize(*new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.entry.as_ref().map(|e| e.with_window(|w| w.inner_size())) {
                    self.resize(size);
                }
            }

            WindowEvent::RedrawRequested => match self.redraw() {
                Ok(control) => self.apply_control(event_loop, control),
                Err(e) => self.fail(event_loop, e),
            },

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Release the surface while the event loop is still alive.
        self.entry = None;
    }
}
