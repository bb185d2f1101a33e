//! Scene graph nodes

use crate::foundation::math::{Transform, Vec2, Vec3};
use crate::sky::SkyUniforms;

use super::NodeId;

/// Surface description of a mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Diffuse reflectance in linear RGB
    pub albedo: Vec3,
    /// Emitted radiance in linear RGB
    pub emissive: Vec3,
    /// Whether the mesh blocks directional light
    pub casts_shadow: bool,
}

impl Material {
    /// Diffuse material that casts shadows
    pub fn diffuse(albedo: Vec3) -> Self {
        Self {
            albedo,
            emissive: Vec3::zeros(),
            casts_shadow: true,
        }
    }

    /// Unlit emitter that casts no shadow
    pub fn emissive(color: Vec3) -> Self {
        Self {
            albedo: Vec3::zeros(),
            emissive: color,
            casts_shadow: false,
        }
    }

    /// Builder-style shadow flag override
    #[must_use]
    pub fn with_shadow(mut self, casts_shadow: bool) -> Self {
        self.casts_shadow = casts_shadow;
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse(Vec3::new(0.8, 0.8, 0.8))
    }
}

/// Analytic shape of a mesh in its local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Rectangle in the local XZ plane facing +Y
    Plane {
        /// Half width along X and half depth along Z
        half_size: Vec2,
    },
    /// Axis-aligned box centred on the origin
    Cuboid {
        /// Half extents along each axis
        half_extents: Vec3,
    },
    /// Sphere centred on the origin
    Sphere {
        /// Sphere radius
        radius: f32,
    },
}

/// Renderable mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    /// Geometry
    pub shape: Shape,
    /// Surface
    pub material: Material,
}

/// Directional light shining from the node's world position towards `target`
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    /// Light colour in linear RGB
    pub color: Vec3,
    /// Scalar intensity
    pub intensity: f32,
    /// World-space point the light aims at
    pub target: Vec3,
    /// Whether the light casts shadows
    pub cast_shadow: bool,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            target: Vec3::zeros(),
            cast_shadow: true,
        }
    }
}

/// What a node is
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Pure transform node
    Group,
    /// Renderable geometry
    Mesh(MeshNode),
    /// Sun-like light
    DirectionalLight(DirectionalLight),
    /// Uniform fill light
    AmbientLight {
        /// Light colour in linear RGB
        color: Vec3,
        /// Scalar intensity
        intensity: f32,
    },
    /// Sky dome rendered behind all geometry
    Sky(SkyUniforms),
}

/// One node of the scene graph
#[derive(Debug, Clone)]
pub struct Node {
    /// Debug name
    pub name: String,
    /// Transform relative to the parent
    pub transform: Transform,
    /// Local visibility; hidden nodes hide their whole subtree
    pub visible: bool,
    /// Node payload
    pub kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    /// Create a visible node at the origin
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            visible: true,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Empty group node
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    /// Mesh node
    pub fn mesh(name: impl Into<String>, shape: Shape, material: Material) -> Self {
        Self::new(name, NodeKind::Mesh(MeshNode { shape, material }))
    }

    /// Builder-style transform override
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Builder-style position override
    #[must_use]
    pub fn at(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Parent node, if any
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}
