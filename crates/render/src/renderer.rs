use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use experience_common::{Disposable, Size};

use crate::camera::Camera;
use crate::scene::{NodeKind, SceneGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneMapping {
    None,
    Linear,
    Reinhard,
    #[default]
    Cineon,
    AcesFilmic,
}

/// Output settings applied by a renderer at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Clear colour as `#rrggbb`.
    pub clear_color: String,
    pub tone_mapping: ToneMapping,
    pub exposure: f32,
    pub shadows: bool,
    pub antialias: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            clear_color: "#211d20".into(),
            tone_mapping: ToneMapping::Cineon,
            exposure: 1.75,
            shadows: true,
            antialias: true,
        }
    }
}

impl RendererSettings {
    /// Parse `clear_color` into 0..1 RGB. `None` if malformed.
    pub fn clear_rgb(&self) -> Option<[f32; 3]> {
        let hex = self.clear_color.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|c| u8::from_str_radix(c, 16).ok())
                .map(|v| f32::from(v) / 255.0)
        };
        Some([channel(0)?, channel(2)?, channel(4)?])
    }
}

/// Renderer-agnostic interface. The engine that draws sits behind this trait.
///
/// The renderer reads the scene graph and camera; it never mutates the scene.
pub trait Renderer: Disposable {
    /// Reconfigure the output surface. Called synchronously on resize.
    fn resize(&mut self, size: Size, pixel_ratio: f32);

    /// Draw one frame.
    fn render(&mut self, scene: &SceneGraph, camera: &dyn Camera);
}

/// Text renderer for headless runs and tests.
///
/// Produces a human-readable description of each frame instead of pixels.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    settings: RendererSettings,
    size: Size,
    pixel_ratio: f32,
    frames: u64,
    last_frame: String,
    released: bool,
}

impl DebugTextRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        Self {
            settings,
            pixel_ratio: 1.0,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_frame(&self) -> &str {
        &self.last_frame
    }

    /// Header line of the last frame without its `===` rule, or `""` before
    /// the first frame.
    pub fn header(&self) -> &str {
        self.last_frame
            .lines()
            .next()
            .map_or("", |line| line.trim_matches(|c| c == '=' || c == ' '))
    }
}

impl Renderer for DebugTextRenderer {
    fn resize(&mut self, size: Size, pixel_ratio: f32) {
        if self.released {
            return;
        }
        self.size = size;
        self.pixel_ratio = pixel_ratio;
        tracing::debug!(%size, pixel_ratio, "renderer surface resized");
    }

    fn render(&mut self, scene: &SceneGraph, camera: &dyn Camera) {
        if self.released {
            return;
        }
        self.frames += 1;
        let mut out = String::new();
        let p = camera.position();
        let proj = camera.projection();
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "=== Frame {} ({} @{:.2}x, clear={}, tone={:?}, exposure={:.2}) ===",
            self.frames,
            self.size,
            self.pixel_ratio,
            self.settings.clear_color,
            self.settings.tone_mapping,
            self.settings.exposure
        );
        let _ = writeln!(
            out,
            "Camera: pos=({:.2}, {:.2}, {:.2}) fov={:.0} aspect={:.3}",
            p.x, p.y, p.z, proj.fov, proj.aspect
        );
        let _ = writeln!(out, "Nodes: {}", scene.len());
        scene.traverse(|node| {
            let pos = node.transform.position;
            let kind = match &node.kind {
                NodeKind::Group => "group".to_string(),
                NodeKind::Mesh(mesh) => format!("mesh[{}]", mesh.geometry.label),
                NodeKind::Light(light) => format!("light[intensity={:.2}]", light.intensity),
            };
            let _ = writeln!(
                out,
                "  [{}] {} {} pos=({:.2}, {:.2}, {:.2})",
                node.id.short(),
                node.name,
                kind,
                pos.x,
                pos.y,
                pos.z
            );
        });
        tracing::trace!(frame = self.frames, nodes = scene.len(), "frame rendered");
        self.last_frame = out;
    }
}

impl Disposable for DebugTextRenderer {
    fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.last_frame.clear();
        true
    }

    fn is_released(&self) -> bool {
        self.released
    }
}
