use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use experience::{ExperienceConfig, ExperienceSlot, SceneRoot};
use experience_common::Size;
use experience_kernel::{FrameScheduler, FrameToken, HostPlatform, TimeSource};
use experience_render::DebugTextRenderer;
use experience_tools::DebugPanel;

/// Frames between window title refreshes.
const TITLE_INTERVAL: u64 = 120;

#[derive(Parser)]
#[command(name = "experience-desktop", about = "Run the experience in a native window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[arg(short, long, default_value = "config/experience.yaml")]
    config: PathBuf,

    /// Location fragment; `#debug` enables the debug panel
    #[arg(long)]
    fragment: Option<String>,
}

/// Host platform backed by a winit window. A frame request is a redraw
/// request; the matching `RedrawRequested` event delivers the token.
struct WinitHost {
    window: Arc<Window>,
    origin: Instant,
    next_token: u64,
    pending: Option<FrameToken>,
}

impl WinitHost {
    fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            origin: Instant::now(),
            next_token: 0,
            pending: None,
        }
    }

    fn take_pending(&mut self) -> Option<FrameToken> {
        self.pending.take()
    }
}

impl FrameScheduler for WinitHost {
    fn request_frame(&mut self) -> FrameToken {
        self.next_token += 1;
        let token = FrameToken(self.next_token);
        self.pending = Some(token);
        self.window.request_redraw();
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.pending == Some(token) {
            self.pending = None;
        }
    }
}

impl TimeSource for WinitHost {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

impl HostPlatform for WinitHost {
    fn surface_size(&self) -> Size {
        let size = self.window.inner_size();
        Size::new(size.width, size.height)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window.scale_factor()
    }
}

struct App {
    config: ExperienceConfig,
    slot: ExperienceSlot<WinitHost, DebugTextRenderer>,
    dragging: bool,
}

impl App {
    fn new(config: ExperienceConfig) -> Self {
        Self {
            config,
            slot: ExperienceSlot::new(),
            dragging: false,
        }
    }

    fn teardown(&mut self) {
        if let Some(report) = self.slot.destroy() {
            tracing::info!(%report, "experience torn down");
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.slot.is_live() {
            return;
        }
        let attributes = Window::default_attributes()
            .with_title("experience")
            .with_inner_size(LogicalSize::new(self.config.viewport.width, self.config.viewport.height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                tracing::error!(%err, "cannot create window");
                event_loop.exit();
                return;
            }
        };

        let config = &self.config;
        let built = self.slot.try_get_or_create(|| {
            SceneRoot::from_config(
                config,
                WinitHost::new(window),
                DebugTextRenderer::new(config.renderer.clone()),
            )
        });
        if let Err(err) = built {
            tracing::error!(%err, "cannot start experience");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(root) = self.slot.get_mut() else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => {
                self.teardown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                root.resize(size.width, size.height);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                root.set_device_pixel_ratio(scale_factor);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }
            WindowEvent::RedrawRequested => {
                let Some(token) = root.host_mut().take_pending() else {
                    return;
                };
                let Some(tick) = root.frame(token) else {
                    return;
                };
                let renderer = &root.stage().renderer;
                tracing::trace!(frame = tick.frame, "\n{}", renderer.last_frame());
                if tick.frame % TITLE_INTERVAL == 0 {
                    let fps = root.clock().stats().fps();
                    let title = format!("experience - {fps:.0} fps - {}", renderer.header());
                    root.host().window.set_title(&title);
                    tracing::debug!(frame = tick.frame, fps, "frame stats");
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if !self.dragging {
                return;
            }
            if let Some(root) = self.slot.get_mut() {
                root.stage_mut()
                    .camera
                    .controls_mut()
                    .rotate(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let mut config = if cli.config.exists() {
        ExperienceConfig::load(&cli.config)?
    } else {
        tracing::warn!(path = %cli.config.display(), "config not found, using defaults");
        ExperienceConfig::default()
    };
    if let Some(fragment) = cli.fragment {
        config.debug = DebugPanel::from_fragment(&fragment).is_active();
    }

    tracing::info!("experience-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
