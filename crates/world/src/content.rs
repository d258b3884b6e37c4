use experience_assets::AssetItems;
use experience_kernel::Tick;
use experience_render::SceneGraph;
use experience_tools::DebugPanel;

use crate::environment::Environment;
use crate::error::WorldError;
use crate::floor::Floor;
use crate::fox::Fox;
use crate::REQUIRED_ASSETS;

/// Everything a world object may touch during one frame.
pub struct FrameContext<'a> {
    pub tick: Tick,
    pub scene: &'a mut SceneGraph,
    pub debug: &'a mut DebugPanel,
}

/// A named piece of world content updated once per frame.
pub trait WorldObject {
    fn name(&self) -> &str;

    fn update(&mut self, frame: &mut FrameContext<'_>);
}

/// The world: floor, fox and environment, in that order.
#[derive(Debug)]
pub struct WorldContent {
    floor: Floor,
    fox: Fox,
    environment: Environment,
}

impl WorldContent {
    /// Build the world into `scene` from the ready item table.
    ///
    /// Every required item is checked first, so a failed build leaves the
    /// scene untouched.
    pub fn build(items: &AssetItems, scene: &mut SceneGraph, debug: &mut DebugPanel) -> Result<Self, WorldError> {
        for name in REQUIRED_ASSETS {
            items.get(name)?;
        }
        Fox::check(items)?;

        let floor = Floor::new(items, scene)?;
        let fox = Fox::new(items, scene, debug)?;
        // Last, so the environment map reaches the floor and fox materials.
        let environment = Environment::new(items, scene, debug)?;
        tracing::info!(nodes = scene.len(), "world built");
        Ok(Self {
            floor,
            fox,
            environment,
        })
    }

    pub fn update(&mut self, frame: &mut FrameContext<'_>) {
        for object in self.objects_mut() {
            object.update(frame);
        }
    }

    pub fn objects_mut(&mut self) -> [&mut dyn WorldObject; 3] {
        [&mut self.floor, &mut self.fox, &mut self.environment]
    }

    pub fn names(&self) -> [&str; 3] {
        [self.floor.name(), self.fox.name(), self.environment.name()]
    }

    pub fn floor(&self) -> &Floor {
        &self.floor
    }

    pub fn fox(&self) -> &Fox {
        &self.fox
    }

    pub fn fox_mut(&mut self) -> &mut Fox {
        &mut self.fox
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fox_handle, items};
    use crate::{FOX_MODEL, GRASS_NORMAL};
    use experience_assets::{AssetError, AssetHandle};
    use experience_render::{MaterialKind, TextureSlot};
    use std::time::Duration;

    fn tick(frame: u64) -> Tick {
        Tick {
            frame,
            delta: Duration::from_millis(16),
            elapsed: Duration::from_millis(16 * frame),
        }
    }

    #[test]
    fn builds_in_declaration_order() {
        let mut scene = SceneGraph::new();
        let mut debug = DebugPanel::new(false);
        let world = WorldContent::build(&items(), &mut scene, &mut debug).unwrap();
        assert_eq!(world.names(), ["floor", "fox", "environment"]);
        assert!(scene.find("floor").is_some());
        assert!(scene.find("fox").is_some());
        assert!(scene.find("sunLight").is_some());
        assert!(scene.environment().is_some());
    }

    #[test]
    fn environment_map_reaches_every_standard_material() {
        let mut scene = SceneGraph::new();
        let mut debug = DebugPanel::new(false);
        WorldContent::build(&items(), &mut scene, &mut debug).unwrap();
        let mut standard = 0;
        scene.traverse(|node| {
            if let Some(mesh) = node.mesh() {
                if mesh.material.kind == MaterialKind::Standard {
                    standard += 1;
                    assert!(mesh.material.map(TextureSlot::Environment).is_some());
                    assert_eq!(mesh.material.env_map_intensity, 0.4);
                }
            }
        });
        assert_eq!(standard, 2);
    }

    fn items_with(name: &str, outcome: Result<AssetHandle, AssetError>) -> AssetItems {
        let mut outcomes: Vec<(String, Result<AssetHandle, AssetError>)> = items()
            .loaded()
            .map(|(n, h)| (n.to_string(), Ok(h.clone())))
            .collect();
        for (n, o) in &mut outcomes {
            if n == name {
                *o = outcome.clone();
            }
        }
        AssetItems::from_outcomes(outcomes)
    }

    #[test]
    fn failed_asset_fails_build_and_leaves_scene_empty() {
        let failed = Err(AssetError::LoadFailed {
            name: GRASS_NORMAL.into(),
            attempts: 2,
            reason: "404".into(),
        });
        let mut scene = SceneGraph::new();
        let err = WorldContent::build(&items_with(GRASS_NORMAL, failed), &mut scene, &mut DebugPanel::new(false))
            .unwrap_err();
        assert!(matches!(err, WorldError::Asset(AssetError::LoadFailed { .. })));
        assert!(scene.is_empty());
    }

    #[test]
    fn model_without_clips_fails_build() {
        let items = items_with(FOX_MODEL, Ok(fox_handle(&["Survey"])));
        let mut scene = SceneGraph::new();
        let err = WorldContent::build(&items, &mut scene, &mut DebugPanel::new(false)).unwrap_err();
        assert!(matches!(err, WorldError::MissingAnimations { found: 1, .. }));
        assert!(scene.is_empty());
    }

    #[test]
    fn update_advances_fox_mixer() {
        let mut scene = SceneGraph::new();
        let mut debug = DebugPanel::new(false);
        let mut world = WorldContent::build(&items(), &mut scene, &mut debug).unwrap();
        for frame in 1..=3 {
            world.update(&mut FrameContext {
                tick: tick(frame),
                scene: &mut scene,
                debug: &mut debug,
            });
        }
        assert!((world.fox().mixer().time() - 0.048).abs() < 1e-5);
    }
}
