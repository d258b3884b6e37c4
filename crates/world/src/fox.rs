use experience_assets::{AssetDetail, AssetItems};
use experience_common::{NodeId, Transform};
use experience_render::{Geometry, Material, Mesh, NodeKind, SceneGraph};
use experience_tools::{ControlId, DebugPanel};

use crate::animation::AnimationMixer;
use crate::content::{FrameContext, WorldObject};
use crate::error::WorldError;

pub const FOX_MODEL: &str = "foxModel";

/// Action labels, bound in order to the model's first clips.
pub const FOX_CLIPS: [&str; 3] = ["idle", "walking", "running"];

const SCALE: f32 = 0.02;

/// Animated fox model. Casts shadows; the mixer advances with the frame delta.
#[derive(Debug)]
pub struct Fox {
    root: NodeId,
    parts: Vec<NodeId>,
    mixer: AnimationMixer,
    selector: Option<ControlId>,
}

impl Fox {
    /// Fail early if the model cannot drive every action.
    pub fn check(items: &AssetItems) -> Result<(), WorldError> {
        let found = items.get(FOX_MODEL)?.animations().len();
        if found < FOX_CLIPS.len() {
            return Err(WorldError::MissingAnimations {
                name: FOX_MODEL.into(),
                expected: FOX_CLIPS.len(),
                found,
            });
        }
        Ok(())
    }

    pub fn new(items: &AssetItems, scene: &mut SceneGraph, debug: &mut DebugPanel) -> Result<Self, WorldError> {
        Self::check(items)?;
        let model = items.get(FOX_MODEL)?;
        let meshes = match model.detail {
            AssetDetail::Model { meshes, .. } => meshes.max(1),
            _ => 1,
        };

        let root = scene.add("fox", Transform::default().with_scale(SCALE), NodeKind::Group);
        let parts: Vec<NodeId> = (0..meshes)
            .filter_map(|i| {
                let mut mesh = Mesh::new(
                    Geometry::new(format!("fox-{i}@{}", model.id), 0),
                    Material::standard(format!("fox-{i}")),
                );
                mesh.cast_shadow = true;
                scene.add_child(root, format!("fox/mesh{i}"), Transform::default(), NodeKind::Mesh(mesh))
            })
            .collect();

        let actions = FOX_CLIPS
            .iter()
            .zip(model.animations())
            .map(|(label, clip)| (label.to_string(), clip.clone()));
        let mixer = AnimationMixer::new(actions).ok_or_else(|| WorldError::MissingAnimations {
            name: FOX_MODEL.into(),
            expected: FOX_CLIPS.len(),
            found: 0,
        })?;

        let selector = debug.add_folder("fox").and_then(|folder| {
            debug.add_choice(folder, "animation", FOX_CLIPS.map(String::from).to_vec(), 0)
        });
        tracing::debug!(meshes = parts.len(), clips = model.animations().len(), "fox added");
        Ok(Self {
            root,
            parts,
            mixer,
            selector,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Mesh nodes under the root, one per model mesh.
    pub fn parts(&self) -> &[NodeId] {
        &self.parts
    }

    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    /// Switch to `idle`, `walking` or `running`.
    pub fn play(&mut self, label: &str) -> bool {
        self.mixer.play_label(label)
    }
}

impl WorldObject for Fox {
    fn name(&self) -> &str {
        "fox"
    }

    fn update(&mut self, frame: &mut FrameContext<'_>) {
        if let Some(choice) = self.selector.and_then(|id| frame.debug.take_change(id)) {
            self.mixer.play(choice as usize);
        }
        self.mixer.update(frame.tick.delta_secs());
    }
}
