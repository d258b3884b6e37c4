use experience_assets::{
    AssetKind, FileLoader, LoadProgress, LoaderSet, Manifest, PROGRESS, READY, ResourceRegistry,
};
use experience_common::ReleaseReport;
use experience_kernel::{Clock, FrameToken, HostPlatform, RESIZE, TICK, Tick, ViewportState};
use experience_render::{OrbitCamera, Renderer};
use experience_tools::DebugPanel;
use experience_world::WorldContent;

use crate::config::ExperienceConfig;
use crate::error::ExperienceError;
use crate::stage::Stage;

/// A `FileLoader` rooted at `root` for every asset kind.
pub fn file_loaders(root: impl Into<std::path::PathBuf>) -> LoaderSet {
    let loader = FileLoader::new(root);
    let mut set = LoaderSet::new();
    for kind in [
        AssetKind::Texture,
        AssetKind::Model,
        AssetKind::EnvironmentMap,
        AssetKind::CompressedGeometry,
    ] {
        set.insert(kind, loader.clone());
    }
    set
}

/// Composition root. Owns the host, clock, viewport, asset registry and the
/// stage, and wires them through event hubs:
///
/// - `resize` reconfigures the camera projection and the renderer surface;
/// - `tick` updates the camera and world, then renders;
/// - `ready` builds the world from the loaded items.
///
/// The host delivers frames by calling [`SceneRoot::frame`] with the token it
/// handed out, and surface changes by calling [`SceneRoot::resize`].
pub struct SceneRoot<H, R> {
    host: H,
    clock: Clock<Stage<R>>,
    viewport: ViewportState<Stage<R>>,
    registry: ResourceRegistry<Stage<R>>,
    stage: Stage<R>,
    destroyed: bool,
}

impl<H, R> SceneRoot<H, R>
where
    H: HostPlatform,
    R: Renderer + 'static,
{
    pub fn new(config: &ExperienceConfig, manifest: Manifest, loaders: LoaderSet, mut host: H, mut renderer: R) -> Self {
        let mut viewport = ViewportState::from_host(&host, config.viewport.max_pixel_ratio);
        let mut camera = OrbitCamera::new(
            config.camera.fov,
            viewport.aspect(),
            config.camera.near,
            config.camera.far,
            config.camera.position(),
        );
        camera.controls_mut().damping = config.camera.damping;
        renderer.resize(viewport.size(), viewport.pixel_ratio() as f32);

        let debug = DebugPanel::new(config.debug);
        let stage = Stage::new(camera, renderer, debug);

        let mut registry = ResourceRegistry::new(manifest, loaders, config.assets.policy(), host.now());
        let mut clock = Clock::new(&mut host);

        viewport.events().on(RESIZE, Stage::on_resize);
        clock.events().on(TICK, Stage::on_tick);
        registry.ready_events().on(READY, Stage::on_ready);
        registry
            .progress_events()
            .on(PROGRESS, |_: &mut Stage<R>, p: &LoadProgress| {
                tracing::debug!(name = %p.name, loaded = p.loaded, resolved = p.resolved, total = p.total, "asset resolved");
            });

        tracing::info!(
            size = %viewport.size(),
            pixel_ratio = viewport.pixel_ratio(),
            assets = registry.total(),
            debug = config.debug,
            "experience created"
        );
        Self {
            host,
            clock,
            viewport,
            registry,
            stage,
            destroyed: false,
        }
    }

    /// Build from config: load the manifest it names and read assets from disk.
    pub fn from_config(config: &ExperienceConfig, host: H, renderer: R) -> Result<Self, ExperienceError> {
        let manifest = Manifest::load(&config.assets.manifest)?;
        let loaders = file_loaders(&config.assets.root);
        Ok(Self::new(config, manifest, loaders, host, renderer))
    }

    /// Handle a host frame: apply finished loads (possibly building the
    /// world), then tick. Ignored once destroyed or for a stale token.
    pub fn frame(&mut self, token: FrameToken) -> Option<Tick> {
        if self.destroyed {
            return None;
        }
        let _span = tracing::trace_span!("frame", token = token.0).entered();
        let now = self.host.now();
        self.registry.poll(now, &mut self.stage);
        self.clock.on_frame(token, &mut self.stage, &mut self.host)
    }

    /// Surface size changed. Reconfigures camera and renderer before returning.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if self.destroyed {
            return false;
        }
        self.viewport.resize(width, height, &mut self.stage)
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f64) -> bool {
        if self.destroyed {
            return false;
        }
        self.viewport.set_device_pixel_ratio(ratio, &mut self.stage)
    }

    /// Unsubscribe, cancel the pending frame and release every resource.
    /// A second call releases nothing and returns an empty report.
    pub fn destroy(&mut self) -> ReleaseReport {
        if self.destroyed {
            return ReleaseReport::default();
        }
        self.destroyed = true;
        self.viewport.events().off(RESIZE);
        self.clock.events().off(TICK);
        self.registry.ready_events().off(READY);
        self.registry.progress_events().off(PROGRESS);
        self.clock.cancel(&mut self.host);

        let report = self.stage.release();
        tracing::info!(%report, frames = self.clock.frame(), "experience destroyed");
        report
    }

    pub fn world(&self) -> Result<&WorldContent, ExperienceError> {
        if self.destroyed {
            return Err(ExperienceError::Destroyed);
        }
        match (self.stage.world(), self.stage.world_error()) {
            (Some(world), _) => Ok(world),
            (None, Some(err)) => Err(err.clone().into()),
            (None, None) => Err(ExperienceError::PrematureAccess("world")),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.registry.is_ready()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn stage(&self) -> &Stage<R> {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage<R> {
        &mut self.stage
    }

    pub fn clock(&self) -> &Clock<Stage<R>> {
        &self.clock
    }

    pub fn viewport(&self) -> &ViewportState<Stage<R>> {
        &self.viewport
    }

    pub fn registry(&self) -> &ResourceRegistry<Stage<R>> {
        &self.registry
    }
}
