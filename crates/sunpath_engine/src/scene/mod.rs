//! # Scene Graph
//!
//! A mutable hierarchy of nodes owned by the application and read by the
//! scene capture pass once per frame. No versioning is kept: the pass sees
//! whatever the scene contains when `render()` runs.
//!
//! Nodes live in a slot map, so removing a subtree never invalidates the
//! handles of unrelated nodes.

pub mod intersect;
pub mod loader;
pub mod node;

pub use intersect::Ray;
pub use loader::{LoadedScene, SceneLoader};
pub use node::{DirectionalLight, Material, MeshNode, Node, NodeKind, Shape};

use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use crate::foundation::math::{Mat4, Vec3};
use crate::sky::SkyUniforms;

new_key_type! {
    /// Handle of a node in a [`Scene`]
    pub struct NodeId;
}

/// Scene graph errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The handle does not resolve to a node
    #[error("Unknown scene node: {0}")]
    UnknownNode(String),

    /// The requested parent/child relation is not a tree
    #[error("Invalid scene hierarchy: {0}")]
    InvalidHierarchy(String),
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;

/// Collection of renderable nodes and lights
#[derive(Debug, Default)]
pub struct Scene {
    nodes: SlotMap<NodeId, Node>,
    roots: Vec<NodeId>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node at the top level
    pub fn add(&mut self, mut node: Node) -> NodeId {
        node.parent = None;
        node.children.clear();
        let id = self.nodes.insert(node);
        self.roots.push(id);
        id
    }

    /// Add a node as the last child of `parent`
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> SceneResult<NodeId> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::UnknownNode(format!("parent {parent:?}")));
        }

        node.parent = Some(parent);
        node.children.clear();
        let id = self.nodes.insert(node);
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(id);
        }
        Ok(id)
    }

    /// Move `id` (and its subtree) under `parent`
    pub fn reparent(&mut self, id: NodeId, parent: NodeId) -> SceneResult<()> {
        self.node(id)?;
        self.node(parent)?;

        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == id {
                return Err(SceneError::InvalidHierarchy(format!("{id:?} cannot become its own descendant")));
            }
            cursor = self.nodes.get(current).and_then(Node::parent);
        }

        self.detach(id);
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = Some(parent);
        }
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(id);
        }
        Ok(())
    }

    /// Remove a node and its whole subtree
    pub fn remove(&mut self, id: NodeId) -> SceneResult<Node> {
        self.node(id)?;
        self.detach(id);

        let mut pending: Vec<NodeId> = self.nodes.get(id).map(|n| n.children.clone()).unwrap_or_default();
        while let Some(child) = pending.pop() {
            if let Some(removed) = self.nodes.remove(child) {
                pending.extend(removed.children);
            }
        }

        self.nodes
            .remove(id)
            .ok_or_else(|| SceneError::UnknownNode(format!("{id:?}")))
    }

    fn detach(&mut self, id: NodeId) {
        match self.nodes.get(id).and_then(Node::parent) {
            Some(parent) => {
                if let Some(parent_node) = self.nodes.get_mut(parent) {
                    parent_node.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }
    }

    /// Borrow a node
    pub fn node(&self, id: NodeId) -> SceneResult<&Node> {
        self.nodes.get(id).ok_or_else(|| SceneError::UnknownNode(format!("{id:?}")))
    }

    /// Mutably borrow a node
    pub fn node_mut(&mut self, id: NodeId) -> SceneResult<&mut Node> {
        self.nodes.get_mut(id).ok_or_else(|| SceneError::UnknownNode(format!("{id:?}")))
    }

    /// Whether `id` resolves
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level nodes in insertion order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Set local visibility
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> SceneResult<()> {
        self.node_mut(id)?.visible = visible;
        Ok(())
    }

    /// Set local position
    pub fn set_position(&mut self, id: NodeId, position: Vec3) -> SceneResult<()> {
        self.node_mut(id)?.transform.position = position;
        Ok(())
    }

    /// World matrix through the whole parent chain
    pub fn world_matrix(&self, id: NodeId) -> SceneResult<Mat4> {
        let mut matrix = self.node(id)?.transform.to_matrix();
        let mut cursor = self.node(id)?.parent;
        while let Some(parent) = cursor {
            let node = self.node(parent)?;
            matrix = node.transform.to_matrix() * matrix;
            cursor = node.parent;
        }
        Ok(matrix)
    }

    /// World position of a node's origin
    pub fn world_position(&self, id: NodeId) -> SceneResult<Vec3> {
        let matrix = self.world_matrix(id)?;
        Ok(Vec3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]))
    }

    /// Visible when the node and all its ancestors are visible
    pub fn is_effectively_visible(&self, id: NodeId) -> SceneResult<bool> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current)?;
            if !node.visible {
                return Ok(false);
            }
            cursor = node.parent;
        }
        Ok(true)
    }

    /// Find the first node with `name`
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().find(|(_, node)| node.name == name).map(|(id, _)| id)
    }

    /// Flatten the visible part of the graph for one frame
    pub fn render_view(&self) -> SceneView {
        let mut view = SceneView::default();
        let mut stack: Vec<(NodeId, Mat4)> = self.roots.iter().rev().map(|id| (*id, Mat4::identity())).collect();

        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(id) else { continue };
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform.to_matrix();

            match &node.kind {
                NodeKind::Group => {}
                NodeKind::Mesh(mesh) => {
                    if let Some(inverse) = world.try_inverse() {
                        view.meshes.push(PlacedMesh {
                            node: id,
                            inverse,
                            shape: mesh.shape,
                            material: mesh.material.clone(),
                        });
                    }
                }
                NodeKind::DirectionalLight(light) => {
                    let position = Vec3::new(world[(0, 3)], world[(1, 3)], world[(2, 3)]);
                    let to_light = position - light.target;
                    if to_light.norm_squared() > f32::EPSILON {
                        view.lights.push(PlacedLight {
                            to_light: to_light.normalize(),
                            radiance: light.color * light.intensity,
                            cast_shadow: light.cast_shadow,
                        });
                    }
                }
                NodeKind::AmbientLight { color, intensity } => view.ambient += color * *intensity,
                NodeKind::Sky(uniforms) => {
                    if view.sky.is_none() {
                        view.sky = Some(uniforms.clone());
                    }
                }
            }

            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }

        view
    }
}

/// Mesh flattened into world space
#[derive(Debug, Clone)]
pub struct PlacedMesh {
    /// Source node
    pub node: NodeId,
    /// Inverse of the world matrix
    pub inverse: Mat4,
    /// Local-space geometry
    pub shape: Shape,
    /// Surface
    pub material: Material,
}

/// Directional light flattened into world space
#[derive(Debug, Clone)]
pub struct PlacedLight {
    /// Unit direction from a surface towards the light
    pub to_light: Vec3,
    /// Colour times intensity
    pub radiance: Vec3,
    /// Whether the light is blocked by shadow casters
    pub cast_shadow: bool,
}

/// Nearest intersection of a ray with a [`SceneView`]
#[derive(Debug, Clone, Copy)]
pub struct SceneHit {
    /// Ray parameter
    pub t: f32,
    /// World-space normal facing the ray
    pub normal: Vec3,
    /// Index into [`SceneView::meshes`]
    pub mesh: usize,
}

/// Everything the capture pass needs from the scene for one frame
#[derive(Debug, Clone, Default)]
pub struct SceneView {
    /// Visible meshes
    pub meshes: Vec<PlacedMesh>,
    /// Visible directional lights
    pub lights: Vec<PlacedLight>,
    /// Sum of visible ambient lights
    pub ambient: Vec3,
    /// Uniforms of the first visible sky
    pub sky: Option<SkyUniforms>,
}

impl SceneView {
    /// Nearest hit along `ray`
    pub fn trace(&self, ray: &Ray, t_max: f32) -> Option<SceneHit> {
        let mut best: Option<SceneHit> = None;
        for (index, mesh) in self.meshes.iter().enumerate() {
            let limit = best.map_or(t_max, |hit| hit.t);
            if let Some((t, normal)) = intersect::intersect_shape(&mesh.shape, &mesh.inverse, ray, limit) {
                best = Some(SceneHit { t, normal, mesh: index });
            }
        }
        best
    }

    /// Whether any shadow caster blocks `ray` before `t_max`
    pub fn occluded(&self, ray: &Ray, t_max: f32) -> bool {
        self.meshes
            .iter()
            .filter(|mesh| mesh.material.casts_shadow)
            .any(|mesh| intersect::intersect_shape(&mesh.shape, &mesh.inverse, ray, t_max).is_some())
    }
}
