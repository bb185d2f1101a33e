//! Procedural house, ground base and flock of birds

use rand::prelude::*;
use rand::rngs::StdRng;

use sunpath_engine::foundation::math::{Quat, Transform, Vec2, Vec3};
use sunpath_engine::scene::{LoadedScene, Material, Node, NodeId, Scene, SceneError, SceneLoader, Shape};

/// Names of the two wing pivots under every bird
pub const WING_NAMES: [&str; 2] = ["wing-left", "wing-right"];

const BASE_HALF_SIZE: f32 = 40.0;
const ROOF_PITCH_DEG: f32 = 32.0;

/// Builds the demo scene without touching the filesystem
#[derive(Debug, Clone)]
pub struct HouseLoader {
    seed: u64,
    bird_count: usize,
    base_y: f32,
}

impl HouseLoader {
    /// Loader placing `bird_count` birds with a deterministic layout
    pub fn new(seed: u64, bird_count: usize) -> Self {
        Self {
            seed,
            bird_count,
            base_y: 0.0,
        }
    }

    /// Height of the ground base
    #[must_use]
    pub fn with_base_y(mut self, base_y: f32) -> Self {
        self.base_y = base_y;
        self
    }

    fn build_house(&self, scene: &mut Scene) -> Result<NodeId, SceneError> {
        let house = scene.add(Node::group("house"));

        scene.add_child(
            house,
            Node::mesh(
                "base",
                Shape::Plane { half_size: Vec2::new(BASE_HALF_SIZE, BASE_HALF_SIZE) },
                Material::diffuse(Vec3::new(0.35, 0.45, 0.25)),
            )
            .at(Vec3::new(0.0, self.base_y, 0.0)),
        )?;

        let walls = Material::diffuse(Vec3::new(0.85, 0.8, 0.7));
        let floor_y = self.base_y;
        // Four walls around a 8 x 6 footprint, 3 units tall
        let wall_specs = [
            ("wall-north", Vec3::new(0.0, 1.5, -3.0), Vec3::new(4.0, 1.5, 0.1)),
            ("wall-south", Vec3::new(0.0, 1.5, 3.0), Vec3::new(4.0, 1.5, 0.1)),
            ("wall-east", Vec3::new(4.0, 1.5, 0.0), Vec3::new(0.1, 1.5, 3.0)),
            ("wall-west", Vec3::new(-4.0, 1.5, 0.0), Vec3::new(0.1, 1.5, 3.0)),
        ];
        for (name, center, half_extents) in wall_specs {
            scene.add_child(
                house,
                Node::mesh(name, Shape::Cuboid { half_extents }, walls.clone())
                    .at(center + Vec3::new(0.0, floor_y, 0.0)),
            )?;
        }

        let roof = Material::diffuse(Vec3::new(0.55, 0.2, 0.15));
        let pitch = ROOF_PITCH_DEG.to_radians();
        let slope_half_width = 3.4 / pitch.cos() / 2.0 + 0.2;
        for (name, side) in [("roof-north", -1.0_f32), ("roof-south", 1.0)] {
            let rotation = Quat::from_axis_angle(&Vec3::x_axis(), side * pitch);
            let center = Vec3::new(0.0, floor_y + 3.0 + 0.9, side * 1.5);
            scene.add_child(
                house,
                Node::mesh(
                    name,
                    Shape::Cuboid { half_extents: Vec3::new(4.4, 0.08, slope_half_width) },
                    roof.clone(),
                )
                .with_transform(Transform::from_position(center).with_rotation(rotation)),
            )?;
        }

        scene.add_child(
            house,
            Node::mesh(
                "chimney",
                Shape::Cuboid { half_extents: Vec3::new(0.3, 0.8, 0.3) },
                Material::diffuse(Vec3::new(0.4, 0.35, 0.3)),
            )
            .at(Vec3::new(2.2, floor_y + 4.6, -1.2)),
        )?;

        Ok(house)
    }

    fn build_bird(scene: &mut Scene, flock: NodeId, index: usize, position: Vec3) -> Result<NodeId, SceneError> {
        let feathers = Material::diffuse(Vec3::new(0.12, 0.12, 0.14));
        let bird = scene.add_child(flock, Node::group(format!("bird-{index}")).at(position))?;

        scene.add_child(
            bird,
            Node::mesh(
                "body",
                Shape::Cuboid { half_extents: Vec3::new(0.12, 0.1, 0.3) },
                feathers.clone(),
            ),
        )?;

        for (name, side) in WING_NAMES.iter().zip([-1.0_f32, 1.0]) {
            let pivot = scene.add_child(bird, Node::group(*name).at(Vec3::new(side * 0.12, 0.05, 0.0)))?;
            scene.add_child(
                pivot,
                Node::mesh(
                    "feathers",
                    Shape::Cuboid { half_extents: Vec3::new(0.35, 0.02, 0.15) },
                    feathers.clone(),
                )
                .at(Vec3::new(side * 0.35, 0.0, 0.0)),
            )?;
        }

        Ok(bird)
    }
}

impl SceneLoader for HouseLoader {
    fn load(&mut self, scene: &mut Scene) -> Result<LoadedScene, SceneError> {
        let house = self.build_house(scene)?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let flock = scene.add(Node::group("flock"));
        let birds = (0..self.bird_count)
            .map(|index| {
                let position = Vec3::new(
                    rng.gen_range(-15.0..15.0),
                    self.base_y + rng.gen_range(12.0..20.0),
                    rng.gen_range(-15.0..15.0),
                );
                Self::build_bird(scene, flock, index, position)
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("House built with {} birds (seed {})", birds.len(), self.seed);
        Ok(LoadedScene { house, flock, birds })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_birds_are_children_of_the_flock() {
        let mut scene = Scene::new();
        let loaded = HouseLoader::new(7, 5).load(&mut scene).unwrap();

        assert_eq!(loaded.birds.len(), 5);
        let flock = scene.node(loaded.flock).unwrap();
        assert_eq!(flock.children(), loaded.birds.as_slice());
        for bird in &loaded.birds {
            let names: Vec<_> = scene
                .node(*bird)
                .unwrap()
                .children()
                .iter()
                .map(|child| scene.node(*child).unwrap().name.clone())
                .collect();
            assert_eq!(names, ["body", "wing-left", "wing-right"]);
        }
    }

    #[test]
    fn test_same_seed_gives_same_layout() {
        let mut a = Scene::new();
        let mut b = Scene::new();
        let first = HouseLoader::new(42, 3).load(&mut a).unwrap();
        let second = HouseLoader::new(42, 3).load(&mut b).unwrap();

        for (x, y) in first.birds.iter().zip(&second.birds) {
            assert_eq!(a.world_position(*x).unwrap(), b.world_position(*y).unwrap());
        }
    }

    #[test]
    fn test_birds_fly_above_the_roof() {
        let mut scene = Scene::new();
        let loaded = HouseLoader::new(1, 8).with_base_y(-2.0).load(&mut scene).unwrap();

        let base = scene.find_by_name("base").unwrap();
        assert_eq!(scene.world_position(base).unwrap().y, -2.0);
        assert!(loaded
            .birds
            .iter()
            .all(|bird| scene.world_position(*bird).unwrap().y >= 10.0));
    }
}
