use experience_assets::AssetItems;
use experience_common::{Disposable, ReleaseReport};
use experience_kernel::{Tick, ViewportMetrics};
use experience_render::{Camera, OrbitCamera, Renderer, SceneGraph};
use experience_tools::DebugPanel;
use experience_world::{FrameContext, WorldContent, WorldError};

/// Everything event handlers reconfigure: the context the root's hubs are
/// triggered with.
pub struct Stage<R> {
    pub scene: SceneGraph,
    pub camera: OrbitCamera,
    pub renderer: R,
    pub debug: DebugPanel,
    world: Option<WorldContent>,
    world_error: Option<WorldError>,
}

impl<R: Renderer> Stage<R> {
    pub fn new(camera: OrbitCamera, renderer: R, debug: DebugPanel) -> Self {
        Self {
            scene: SceneGraph::new(),
            camera,
            renderer,
            debug,
            world: None,
            world_error: None,
        }
    }

    pub fn world(&self) -> Option<&WorldContent> {
        self.world.as_ref()
    }

    pub fn world_mut(&mut self) -> Option<&mut WorldContent> {
        self.world.as_mut()
    }

    pub fn world_error(&self) -> Option<&WorldError> {
        self.world_error.as_ref()
    }

    /// `resize`: camera projection first, then the renderer surface.
    pub(crate) fn on_resize(&mut self, metrics: &ViewportMetrics) {
        self.camera.resize(metrics.aspect());
        self.renderer.resize(metrics.size, metrics.pixel_ratio as f32);
    }

    /// `tick`: camera, then world, then render.
    pub(crate) fn on_tick(&mut self, tick: &Tick) {
        let _span = tracing::trace_span!("tick", frame = tick.frame).entered();
        self.camera.update(tick.delta_secs());
        if let Some(world) = self.world.as_mut() {
            world.update(&mut FrameContext {
                tick: *tick,
                scene: &mut self.scene,
                debug: &mut self.debug,
            });
        }
        self.renderer.render(&self.scene, &self.camera);
    }

    /// `ready`: build the world once. A failed build is kept for `world()`
    /// callers and the scene keeps rendering without content.
    pub(crate) fn on_ready(&mut self, items: &AssetItems) {
        if self.world.is_some() || self.world_error.is_some() {
            return;
        }
        for (name, err) in items.failed() {
            tracing::warn!(%name, %err, "asset unavailable at ready");
        }
        match WorldContent::build(items, &mut self.scene, &mut self.debug) {
            Ok(world) => self.world = Some(world),
            Err(err) => {
                tracing::error!(%err, "world build failed");
                self.world_error = Some(err);
            }
        }
    }

    /// Release every GPU-side resource the stage owns.
    pub(crate) fn release(&mut self) -> ReleaseReport {
        let mut report = self.scene.release_resources();
        if self.camera.controls_mut().release() {
            report.controls += 1;
        }
        if self.renderer.release() {
            report.renderers += 1;
        }
        if self.debug.release() {
            report.panels += 1;
        }
        report
    }
}
