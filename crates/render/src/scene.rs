use glam::{Vec2, Vec3};
use std::collections::BTreeMap;

use experience_assets::AssetId;
use experience_common::{Disposable, NodeId, ReleaseReport, Transform};

/// Vertex buffer handle owned by a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub label: String,
    pub vertex_count: u32,
    released: bool,
}

impl Geometry {
    pub fn new(label: impl Into<String>, vertex_count: u32) -> Self {
        Self {
            label: label.into(),
            vertex_count,
            released: false,
        }
    }

    /// Flat disc in the XY plane: one centre vertex plus a closed rim.
    pub fn circle(radius: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        Self::new(format!("circle(r={radius}, segments={segments})"), segments + 2)
    }
}

impl Disposable for Geometry {
    fn release(&mut self) -> bool {
        !std::mem::replace(&mut self.released, true)
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureSlot {
    Color,
    Normal,
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Linear,
    Srgb,
}

/// A material's reference to a loaded texture asset.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureBinding {
    pub asset: AssetId,
    pub color_space: ColorSpace,
    pub repeat: Vec2,
    released: bool,
}

impl TextureBinding {
    pub fn new(asset: AssetId) -> Self {
        Self {
            asset,
            color_space: ColorSpace::Linear,
            repeat: Vec2::ONE,
            released: false,
        }
    }

    pub fn srgb(mut self) -> Self {
        self.color_space = ColorSpace::Srgb;
        self
    }

    pub fn repeat(mut self, x: f32, y: f32) -> Self {
        self.repeat = Vec2::new(x, y);
        self
    }
}

impl Disposable for TextureBinding {
    fn release(&mut self) -> bool {
        !std::mem::replace(&mut self.released, true)
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    Basic,
    Standard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub label: String,
    pub kind: MaterialKind,
    pub color: Vec3,
    pub env_map_intensity: f32,
    maps: BTreeMap<TextureSlot, TextureBinding>,
    released: bool,
}

impl Material {
    pub fn standard(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: MaterialKind::Standard,
            color: Vec3::ONE,
            env_map_intensity: 1.0,
            maps: BTreeMap::new(),
            released: false,
        }
    }

    pub fn basic(label: impl Into<String>) -> Self {
        Self {
            kind: MaterialKind::Basic,
            ..Self::standard(label)
        }
    }

    pub fn with_map(mut self, slot: TextureSlot, binding: TextureBinding) -> Self {
        self.set_map(slot, binding);
        self
    }

    pub fn set_map(&mut self, slot: TextureSlot, binding: TextureBinding) {
        self.maps.insert(slot, binding);
    }

    pub fn map(&self, slot: TextureSlot) -> Option<&TextureBinding> {
        self.maps.get(&slot)
    }

    pub fn maps(&self) -> impl Iterator<Item = (TextureSlot, &TextureBinding)> {
        self.maps.iter().map(|(slot, b)| (*slot, b))
    }

    pub fn is_standard(&self) -> bool {
        self.kind == MaterialKind::Standard
    }

    /// Release every texture binding, returning how many were freed now.
    pub fn release_maps(&mut self) -> usize {
        self.maps.values_mut().filter_map(|b| b.release().then_some(())).count()
    }
}

impl Disposable for Material {
    fn release(&mut self) -> bool {
        !std::mem::replace(&mut self.released, true)
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Mesh {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self {
            geometry,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    pub far: f32,
    pub map_size: u32,
    pub normal_bias: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            far: 500.0,
            map_size: 512,
            normal_bias: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
    pub cast_shadow: bool,
    pub shadow: ShadowSettings,
}

impl DirectionalLight {
    pub fn new(color: Vec3, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            cast_shadow: false,
            shadow: ShadowSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh(Mesh),
    Light(DirectionalLight),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub parent: Option<NodeId>,
    pub transform: Transform,
    pub kind: NodeKind,
}

impl SceneNode {
    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn light_mut(&mut self) -> Option<&mut DirectionalLight> {
        match &mut self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }
}

/// Scene graph: nodes kept in insertion order so traversal is deterministic.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    environment: Option<TextureBinding>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, transform: Transform, kind: NodeKind) -> NodeId {
        self.insert(None, name.into(), transform, kind)
    }

    /// Add a node under `parent`. Returns `None` if the parent does not exist.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
        kind: NodeKind,
    ) -> Option<NodeId> {
        self.get(parent)?;
        Some(self.insert(Some(parent), name.into(), transform, kind))
    }

    fn insert(&mut self, parent: Option<NodeId>, name: String, transform: Transform, kind: NodeKind) -> NodeId {
        let id = NodeId::new();
        tracing::trace!(node = %id.short(), %name, "scene node added");
        self.nodes.push(SceneNode {
            id,
            name,
            parent,
            transform,
            kind,
        });
        id
    }

    /// Detach a node and all of its descendants. Returns the removed nodes.
    ///
    /// Removed nodes keep their resources; callers release them.
    pub fn remove(&mut self, id: NodeId) -> Vec<SceneNode> {
        let mut doomed = vec![id];
        let mut i = 0;
        while i < doomed.len() {
            let current = doomed[i];
            doomed.extend(
                self.nodes
                    .iter()
                    .filter(|n| n.parent == Some(current))
                    .map(|n| n.id),
            );
            i += 1;
        }
        let (removed, kept): (Vec<SceneNode>, Vec<SceneNode>) = std::mem::take(&mut self.nodes)
            .into_iter()
            .partition(|n| doomed.contains(&n.id));
        self.nodes = kept;
        removed
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn children(&self, parent: NodeId) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter().filter(move |n| n.parent == Some(parent))
    }

    pub fn traverse(&self, mut visit: impl FnMut(&SceneNode)) {
        self.nodes.iter().for_each(|n| visit(n));
    }

    pub fn traverse_mut(&mut self, mut visit: impl FnMut(&mut SceneNode)) {
        self.nodes.iter_mut().for_each(|n| visit(n));
    }

    pub fn meshes_mut(&mut self) -> impl Iterator<Item = &mut Mesh> {
        self.nodes.iter_mut().filter_map(SceneNode::mesh_mut)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn set_environment(&mut self, binding: TextureBinding) {
        self.environment = Some(binding);
    }

    pub fn environment(&self) -> Option<&TextureBinding> {
        self.environment.as_ref()
    }

    /// Release every mesh's geometry, material and texture bindings, plus
    /// the scene environment map. Already released resources are skipped.
    pub fn release_resources(&mut self) -> ReleaseReport {
        let mut report = ReleaseReport::default();
        for mesh in self.meshes_mut() {
            if mesh.geometry.release() {
                report.geometries += 1;
            }
            report.textures += mesh.material.release_maps();
            if mesh.material.release() {
                report.materials += 1;
            }
        }
        if let Some(env) = self.environment.as_mut() {
            if env.release() {
                report.textures += 1;
            }
        }
        tracing::debug!(%report, "scene resources released");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textured_mesh(tag: &[u8]) -> NodeKind {
        NodeKind::Mesh(Mesh::new(
            Geometry::circle(5.0, 64),
            Material::standard("grass")
                .with_map(TextureSlot::Color, TextureBinding::new(AssetId::from_bytes(tag)).srgb())
                .with_map(TextureSlot::Normal, TextureBinding::new(AssetId::from_bytes(b"n"))),
        ))
    }

    #[test]
    fn add_and_find() {
        let mut scene = SceneGraph::new();
        let id = scene.add("floor", Transform::default(), textured_mesh(b"c"));
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.find("floor").unwrap().id, id);
        assert!(scene.get(id).unwrap().mesh().is_some());
    }

    #[test]
    fn traversal_is_insertion_ordered() {
        let mut scene = SceneGraph::new();
        for name in ["a", "b", "c"] {
            scene.add(name, Transform::default(), NodeKind::Group);
        }
        let mut seen = Vec::new();
        scene.traverse(|n| seen.push(n.name.clone()));
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[test]
    fn remove_takes_descendants() {
        let mut scene = SceneGraph::new();
        let root = scene.add("fox", Transform::default(), NodeKind::Group);
        let child = scene
            .add_child(root, "fox/body", Transform::default(), textured_mesh(b"c"))
            .unwrap();
        scene.add_child(child, "fox/tail", Transform::default(), NodeKind::Group);
        scene.add("floor", Transform::default(), NodeKind::Group);

        let removed = scene.remove(root);
        assert_eq!(removed.len(), 3);
        assert_eq!(scene.len(), 1);
        assert!(scene.add_child(root, "orphan", Transform::default(), NodeKind::Group).is_none());
    }

    #[test]
    fn release_counts_each_resource_once() {
        let mut scene = SceneGraph::new();
        scene.add("floor", Transform::default(), textured_mesh(b"c"));
        scene.add("sun", Transform::default(), NodeKind::Light(DirectionalLight::new(Vec3::ONE, 4.0)));
        scene.set_environment(TextureBinding::new(AssetId::from_bytes(b"env")));

        let first = scene.release_resources();
        assert_eq!(first.geometries, 1);
        assert_eq!(first.materials, 1);
        assert_eq!(first.textures, 3);

        let second = scene.release_resources();
        assert!(second.is_empty());
        assert!(scene.environment().unwrap().is_released());
    }

    #[test]
    fn circle_geometry_vertex_count() {
        let g = Geometry::circle(5.0, 64);
        assert_eq!(g.vertex_count, 66);
        assert_eq!(Geometry::circle(1.0, 1).vertex_count, 5);
    }

    #[test]
    fn basic_material_is_not_standard() {
        assert!(!Material::basic("debug").is_standard());
        assert!(Material::standard("pbr").is_standard());
    }
}
