use glam::Quat;

use experience_assets::AssetItems;
use experience_common::{NodeId, Transform};
use experience_render::{Geometry, Material, Mesh, NodeKind, SceneGraph, TextureBinding, TextureSlot};

use crate::content::{FrameContext, WorldObject};
use crate::error::WorldError;

pub const GRASS_COLOR: &str = "grassColorTexture";
pub const GRASS_NORMAL: &str = "grassNormalTexture";

const RADIUS: f32 = 5.0;
const SEGMENTS: u32 = 64;
const REPEAT: f32 = 1.5;

/// Grass disc lying flat under the fox. Receives shadows.
#[derive(Debug)]
pub struct Floor {
    node: NodeId,
}

impl Floor {
    pub fn new(items: &AssetItems, scene: &mut SceneGraph) -> Result<Self, WorldError> {
        let color = items.get(GRASS_COLOR)?;
        let normal = items.get(GRASS_NORMAL)?;

        let material = Material::standard("floor")
            .with_map(
                TextureSlot::Color,
                TextureBinding::new(color.id).srgb().repeat(REPEAT, REPEAT),
            )
            .with_map(
                TextureSlot::Normal,
                TextureBinding::new(normal.id).repeat(REPEAT, REPEAT),
            );
        let mut mesh = Mesh::new(Geometry::circle(RADIUS, SEGMENTS), material);
        mesh.receive_shadow = true;

        let transform =
            Transform::default().with_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2));
        let node = scene.add("floor", transform, NodeKind::Mesh(mesh));
        tracing::debug!(node = %node.short(), "floor added");
        Ok(Self { node })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl WorldObject for Floor {
    fn name(&self) -> &str {
        "floor"
    }

    fn update(&mut self, _frame: &mut FrameContext<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::items;
    use experience_render::ColorSpace;

    #[test]
    fn floor_is_textured_disc() {
        let mut scene = SceneGraph::new();
        let floor = Floor::new(&items(), &mut scene).unwrap();
        let mesh = scene.get(floor.node()).and_then(|n| n.mesh()).unwrap();
        assert!(mesh.receive_shadow);
        assert!(!mesh.cast_shadow);
        assert_eq!(mesh.geometry.vertex_count, SEGMENTS + 2);
        let color = mesh.material.map(TextureSlot::Color).unwrap();
        assert_eq!(color.color_space, ColorSpace::Srgb);
        assert_eq!(color.repeat.x, 1.5);
        assert_eq!(
            mesh.material.map(TextureSlot::Normal).unwrap().color_space,
            ColorSpace::Linear
        );
    }
}
