//! Rendering adapter: renderer-agnostic scene graph, camera and renderer traits.
//!
//! # Invariants
//! - Every GPU-side resource (geometry, material, texture binding, controls,
//!   renderer) implements `Disposable`; releasing twice is a no-op.
//! - Renderers read the scene graph; they never mutate it.
//!
//! The engine that actually draws lives behind [`Renderer`]. A text renderer
//! is provided for headless runs and tests.

mod camera;
mod renderer;
mod scene;

pub use camera::{Camera, OrbitCamera, OrbitControls, Projection};
pub use renderer::{DebugTextRenderer, Renderer, RendererSettings, ToneMapping};
pub use scene::{
    ColorSpace, DirectionalLight, Geometry, Material, MaterialKind, Mesh, NodeKind, SceneGraph,
    SceneNode, ShadowSettings, TextureBinding, TextureSlot,
};

pub fn crate_info() -> &'static str {
    "experience-render v0.1.0"
}
