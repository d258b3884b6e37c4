use glam::Vec3;

use experience_assets::AssetItems;
use experience_common::{NodeId, Transform};
use experience_render::{DirectionalLight, NodeKind, SceneGraph, ShadowSettings, TextureBinding, TextureSlot};
use experience_tools::{ControlId, DebugPanel};

use crate::content::{FrameContext, WorldObject};
use crate::error::WorldError;

pub const ENVIRONMENT_MAP: &str = "environmentMapTexture";

const SUN_INTENSITY: f32 = 4.0;
const SUN_POSITION: Vec3 = Vec3::new(3.5, 2.0, -1.25);
const ENV_INTENSITY: f32 = 0.4;

#[derive(Debug, Clone, Copy)]
struct Controls {
    intensity: ControlId,
    x: ControlId,
    y: ControlId,
    z: ControlId,
    env_intensity: ControlId,
}

/// Sunlight plus the scene environment map.
#[derive(Debug)]
pub struct Environment {
    sunlight: NodeId,
    env_map: TextureBinding,
    env_intensity: f32,
    controls: Option<Controls>,
}

impl Environment {
    pub fn new(items: &AssetItems, scene: &mut SceneGraph, debug: &mut DebugPanel) -> Result<Self, WorldError> {
        let texture = items.get(ENVIRONMENT_MAP)?;
        let env_map = TextureBinding::new(texture.id).srgb();

        let mut light = DirectionalLight::new(Vec3::ONE, SUN_INTENSITY);
        light.cast_shadow = true;
        light.shadow = ShadowSettings {
            far: 15.0,
            map_size: 1024,
            normal_bias: 0.05,
        };
        let sunlight = scene.add("sunLight", Transform::from_position(SUN_POSITION), NodeKind::Light(light));

        scene.set_environment(env_map.clone());
        let mut environment = Self {
            sunlight,
            env_map,
            env_intensity: ENV_INTENSITY,
            controls: None,
        };
        let updated = environment.update_materials(scene);
        environment.controls = Self::add_controls(debug);
        tracing::debug!(materials = updated, "environment map applied");
        Ok(environment)
    }

    fn add_controls(debug: &mut DebugPanel) -> Option<Controls> {
        let folder = debug.add_folder("environment")?;
        let mut ranged = |name: &str, value: f32, min: f32, max: f32| {
            debug.add_control(folder, name, value, min, max, 0.001)
        };
        Some(Controls {
            intensity: ranged("sunlightIntensity", SUN_INTENSITY, 0.0, 10.0)?,
            x: ranged("sunlightX", SUN_POSITION.x, -5.0, 5.0)?,
            y: ranged("sunlightY", SUN_POSITION.y, -5.0, 5.0)?,
            z: ranged("sunlightZ", SUN_POSITION.z, -5.0, 5.0)?,
            env_intensity: ranged("envMapIntensity", ENV_INTENSITY, 0.0, 4.0)?,
        })
    }

    /// Bind the environment map to every standard material in the scene.
    /// Returns how many materials were touched.
    pub fn update_materials(&self, scene: &mut SceneGraph) -> usize {
        let mut touched = 0;
        for mesh in scene.meshes_mut() {
            if mesh.material.is_standard() {
                mesh.material.set_map(TextureSlot::Environment, self.env_map.clone());
                mesh.material.env_map_intensity = self.env_intensity;
                touched += 1;
            }
        }
        touched
    }

    pub fn set_env_intensity(&mut self, intensity: f32, scene: &mut SceneGraph) {
        self.env_intensity = intensity;
        self.update_materials(scene);
    }

    pub fn env_intensity(&self) -> f32 {
        self.env_intensity
    }

    pub fn sunlight(&self) -> NodeId {
        self.sunlight
    }
}

impl WorldObject for Environment {
    fn name(&self) -> &str {
        "environment"
    }

    fn update(&mut self, frame: &mut FrameContext<'_>) {
        let Some(controls) = self.controls else {
            return;
        };
        let debug = &mut *frame.debug;
        if let Some(node) = frame.scene.get_mut(self.sunlight) {
            if let Some(v) = debug.take_change(controls.x) {
                node.transform.position.x = v;
            }
            if let Some(v) = debug.take_change(controls.y) {
                node.transform.position.y = v;
            }
            if let Some(v) = debug.take_change(controls.z) {
                node.transform.position.z = v;
            }
            if let (Some(v), Some(light)) = (debug.take_change(controls.intensity), node.light_mut()) {
                light.intensity = v;
            }
        }
        if let Some(v) = debug.take_change(controls.env_intensity) {
            self.set_env_intensity(v, frame.scene);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::items;
    use experience_kernel::Tick;
    use experience_render::{Geometry, Material, Mesh};
    use std::time::Duration;

    fn scene_with_materials() -> SceneGraph {
        let mut scene = SceneGraph::new();
        scene.add(
            "pbr",
            Transform::default(),
            NodeKind::Mesh(Mesh::new(Geometry::new("box", 24), Material::standard("pbr"))),
        );
        scene.add(
            "unlit",
            Transform::default(),
            NodeKind::Mesh(Mesh::new(Geometry::new("box", 24), Material::basic("unlit"))),
        );
        scene
    }

    fn frame<'a>(scene: &'a mut SceneGraph, debug: &'a mut DebugPanel) -> FrameContext<'a> {
        FrameContext {
            tick: Tick {
                frame: 1,
                delta: Duration::from_millis(16),
                elapsed: Duration::from_millis(16),
            },
            scene,
            debug,
        }
    }

    #[test]
    fn sunlight_settings() {
        let mut scene = SceneGraph::new();
        let env = Environment::new(&items(), &mut scene, &mut DebugPanel::new(false)).unwrap();
        let node = scene.get_mut(env.sunlight()).unwrap();
        assert_eq!(node.transform.position, SUN_POSITION);
        let light = node.light_mut().unwrap();
        assert_eq!(light.intensity, 4.0);
        assert!(light.cast_shadow);
        assert_eq!(light.shadow.map_size, 1024);
        assert_eq!(light.shadow.far, 15.0);
        assert_eq!(light.shadow.normal_bias, 0.05);
    }

    #[test]
    fn only_standard_materials_get_env_map() {
        let mut scene = scene_with_materials();
        Environment::new(&items(), &mut scene, &mut DebugPanel::new(false)).unwrap();
        let pbr = scene.find("pbr").and_then(|n| n.mesh()).unwrap();
        assert!(pbr.material.map(TextureSlot::Environment).is_some());
        let unlit = scene.find("unlit").and_then(|n| n.mesh()).unwrap();
        assert!(unlit.material.map(TextureSlot::Environment).is_none());
    }

    #[test]
    fn debug_controls_apply_on_update() {
        let mut scene = scene_with_materials();
        let mut debug = DebugPanel::new(true);
        let mut env = Environment::new(&items(), &mut scene, &mut debug).unwrap();
        assert_eq!(debug.controls().len(), 5);

        let intensity = debug.find("environment", "sunlightIntensity").unwrap();
        let x = debug.find("environment", "sunlightX").unwrap();
        let env_map = debug.find("environment", "envMapIntensity").unwrap();
        debug.set(intensity, 7.5);
        debug.set(x, 12.0);
        debug.set(env_map, 2.0);

        env.update(&mut frame(&mut scene, &mut debug));

        let node = scene.get_mut(env.sunlight()).unwrap();
        assert_eq!(node.transform.position.x, 5.0);
        assert_eq!(node.light_mut().unwrap().intensity, 7.5);
        assert_eq!(env.env_intensity(), 2.0);
        let pbr = scene.find("pbr").and_then(|n| n.mesh()).unwrap();
        assert_eq!(pbr.material.env_map_intensity, 2.0);
    }

    #[test]
    fn inactive_panel_adds_no_controls() {
        let mut scene = SceneGraph::new();
        let mut debug = DebugPanel::new(false);
        let mut env = Environment::new(&items(), &mut scene, &mut debug).unwrap();
        env.update(&mut frame(&mut scene, &mut debug));
        assert!(debug.controls().is_empty());
    }
}
