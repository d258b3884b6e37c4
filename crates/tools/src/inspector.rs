use experience_common::{Disposable, NodeId};
use experience_render::{NodeKind, SceneGraph};

/// Scene inspector for developer tooling.
///
/// Read-only queries against the scene graph for debugging and the CLI.
pub struct SceneInspector;

impl SceneInspector {
    /// Count nodes by kind and how many meshes already released their GPU data.
    pub fn summary(scene: &SceneGraph) -> SceneSummary {
        let mut summary = SceneSummary {
            nodes: scene.len(),
            has_environment: scene.environment().is_some(),
            ..Default::default()
        };
        scene.traverse(|node| match &node.kind {
            NodeKind::Mesh(mesh) => {
                summary.meshes += 1;
                if mesh.geometry.is_released() && mesh.material.is_released() {
                    summary.released += 1;
                }
            }
            NodeKind::Light(_) => summary.lights += 1,
            NodeKind::Group => summary.groups += 1,
        });
        summary
    }

    pub fn inspect_node(scene: &SceneGraph, id: NodeId) -> Option<NodeInfo> {
        scene.get(id).map(|node| {
            let p = node.transform.position;
            let s = node.transform.scale;
            NodeInfo {
                id,
                name: node.name.clone(),
                position: [p.x, p.y, p.z],
                scale: [s.x, s.y, s.z],
            }
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneSummary {
    pub nodes: usize,
    pub meshes: usize,
    pub lights: usize,
    pub groups: usize,
    pub released: usize,
    pub has_environment: bool,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: nodes={} meshes={} lights={} groups={} released={} environment={}",
            self.nodes, self.meshes, self.lights, self.groups, self.released, self.has_environment
        )
    }
}

#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub position: [f32; 3],
    pub scale: [f32; 3],
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Node [{}] {} pos=({:.2}, {:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2})",
            self.id.short(),
            self.name,
            self.position[0],
            self.position[1],
            self.position[2],
            self.scale[0],
            self.scale[1],
            self.scale[2],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use experience_common::Transform;
    use experience_render::{DirectionalLight, Geometry, Material, Mesh};
    use glam::Vec3;

    fn scene() -> (SceneGraph, NodeId) {
        let mut scene = SceneGraph::new();
        let floor = scene.add(
            "floor",
            Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
            NodeKind::Mesh(Mesh::new(Geometry::circle(5.0, 64), Material::standard("grass"))),
        );
        scene.add(
            "sunLight",
            Transform::default(),
            NodeKind::Light(DirectionalLight::new(Vec3::ONE, 4.0)),
        );
        scene.add("fox", Transform::default(), NodeKind::Group);
        (scene, floor)
    }

    #[test]
    fn summary_counts_kinds() {
        let (scene, _) = scene();
        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.nodes, 3);
        assert_eq!(summary.meshes, 1);
        assert_eq!(summary.lights, 1);
        assert_eq!(summary.groups, 1);
        assert_eq!(summary.released, 0);
    }

    #[test]
    fn summary_tracks_release() {
        let (mut scene, _) = scene();
        scene.release_resources();
        assert_eq!(SceneInspector::summary(&scene).released, 1);
    }

    #[test]
    fn inspect_node_found() {
        let (scene, floor) = scene();
        let info = SceneInspector::inspect_node(&scene, floor).unwrap();
        assert_eq!(info.position, [1.0, 2.0, 3.0]);
        assert!(info.to_string().contains("floor"));
        assert!(SceneInspector::inspect_node(&scene, NodeId::new()).is_none());
    }

    #[test]
    fn summary_display() {
        let s = SceneInspector::summary(&SceneGraph::new()).to_string();
        assert!(s.contains("nodes=0"));
    }
}
