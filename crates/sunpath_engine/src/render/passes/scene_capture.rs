//! Scene capture pass
//!
//! Renders the scene once per frame into three targets at the same time:
//! lit HDR colour, normalized linear depth and view-space normals. Pixels
//! without geometry get the sky radiance, a depth of exactly
//! [`FAR_DEPTH`](crate::render::targets::FAR_DEPTH) and a zero normal.

use crate::foundation::math::Vec3;
use crate::render::graph::{Pass, PassContext};
use crate::render::targets::{RenderTargets, TargetSlot, FAR_DEPTH};
use crate::render::RenderResult;
use crate::scene::intersect::RAY_EPSILON;
use crate::scene::{Ray, SceneView};

/// Multi-target scene render
#[derive(Debug, Default)]
pub struct SceneCapturePass;

impl SceneCapturePass {
    /// Create the pass
    pub fn new() -> Self {
        Self
    }
}

impl Pass for SceneCapturePass {
    fn name(&self) -> &'static str {
        "scene-capture"
    }

    fn reads(&self) -> &'static [TargetSlot] {
        &[]
    }

    fn writes(&self) -> &'static [TargetSlot] {
        &[TargetSlot::Color, TargetSlot::Depth, TargetSlot::Normal]
    }

    fn execute(&mut self, ctx: &PassContext<'_>, targets: &mut RenderTargets) -> RenderResult<()> {
        let view = ctx.scene.render_view();
        let camera = ctx.camera;
        let extent = targets.extent();
        let shadows = ctx.settings.shadows;

        let color = targets.color.texels_mut();
        let depth = targets.depth.texels_mut();
        let normal = targets.normal.texels_mut();

        for y in 0..extent.height {
            for x in 0..extent.width {
                let index = y as usize * extent.width as usize + x as usize;
                let direction = camera.world_ray(x, y, extent);
                let ray = Ray::new(camera.position, direction);

                let hit = view.trace(&ray, f32::INFINITY).and_then(|hit| {
                    let point = ray.at(hit.t);
                    let view_depth = -camera.to_view(&point).z;
                    (view_depth <= camera.far).then_some((hit, point, view_depth))
                });

                match hit {
                    Some((hit, point, view_depth)) => {
                        let radiance = shade(&view, hit.mesh, &point, &hit.normal, shadows);
                        let view_normal = camera.to_view_dir(&hit.normal).normalize();

                        color[index] = [radiance.x, radiance.y, radiance.z, 1.0];
                        depth[index] = [(view_depth / camera.far).min(FAR_DEPTH), 0.0, 0.0, 1.0];
                        normal[index] = [view_normal.x, view_normal.y, view_normal.z, 1.0];
                    }
                    None => {
                        let sky = view.sky.as_ref().map_or_else(Vec3::zeros, |sky| sky.radiance(&direction));

                        color[index] = [sky.x, sky.y, sky.z, 1.0];
                        depth[index] = [FAR_DEPTH, 0.0, 0.0, 0.0];
                        normal[index] = [0.0; 4];
                    }
                }
            }
        }

        Ok(())
    }
}

/// Lambert shading with ambient fill, shadowed directional lights and emission
fn shade(view: &SceneView, mesh: usize, point: &Vec3, normal: &Vec3, shadows: bool) -> Vec3 {
    let material = &view.meshes[mesh].material;
    let mut irradiance = view.ambient;

    for light in &view.lights {
        let n_dot_l = normal.dot(&light.to_light);
        if n_dot_l <= 0.0 {
            continue;
        }
        if shadows && light.cast_shadow {
            let shadow_ray = Ray::new(point + normal * RAY_EPSILON, light.to_light);
            if view.occluded(&shadow_ray, f32::INFINITY) {
                continue;
            }
        }
        irradiance += light.radiance * n_dot_l;
    }

    material.albedo.component_mul(&irradiance) + material.emissive
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Vec2, Vec3};
    use crate::render::passes::{DenoiseParams, SsgiParams};
    use crate::render::primitives::{Camera, CameraStore, FrameCamera};
    use crate::render::settings::RenderSettings;
    use crate::render::targets::Extent;
    use crate::scene::{DirectionalLight, Material, Node, NodeKind, Scene, Shape};

    fn capture(scene: &Scene, camera: Camera, extent: Extent) -> RenderTargets {
        let mut store = CameraStore::new();
        let handle = store.insert(camera);
        let snapshot = FrameCamera::capture(handle, store.get(handle).unwrap());
        let settings = RenderSettings::new();
        let ssgi = SsgiParams::default();
        let denoise = DenoiseParams::default();
        let ctx = PassContext {
            camera: &snapshot,
            scene,
            settings: &settings,
            ssgi: &ssgi,
            denoise: &denoise,
            frame_index: 0,
        };

        let mut targets = RenderTargets::new(extent);
        SceneCapturePass::new().execute(&ctx, &mut targets).unwrap();
        targets
    }

    fn looking_down() -> Camera {
        let mut camera = Camera::perspective(Vec3::new(0.0, 10.0, 0.001), 60.0, 1.0, 0.1, 100.0);
        camera.look_at(Vec3::zeros(), Vec3::y());
        camera
    }

    #[test]
    fn test_empty_scene_is_far_depth_everywhere() {
        let targets = capture(&Scene::new(), Camera::default(), Extent::new(8, 6));

        assert!(targets.get(TargetSlot::Depth).texels().iter().all(|t| t[0] == FAR_DEPTH));
        assert!(targets.get(TargetSlot::Color).texels().iter().all(|t| t[..3] == [0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_ground_plane_depth_and_normal() {
        let mut scene = Scene::new();
        scene.add(Node::mesh("ground", Shape::Plane { half_size: Vec2::new(50.0, 50.0) }, Material::default()));
        scene.add(Node::new("sun", NodeKind::DirectionalLight(DirectionalLight::default())).at(Vec3::new(0.0, 20.0, 0.0)));

        let targets = capture(&scene, looking_down(), Extent::new(9, 9));
        let depth = targets.get(TargetSlot::Depth).get(4, 4)[0];
        let normal = targets.get(TargetSlot::Normal).get(4, 4);
        let color = targets.get(TargetSlot::Color).get(4, 4);

        assert!((depth - 0.1).abs() < 1e-3, "depth {depth}");
        // Ground faces the camera: view-space normal points towards +Z
        assert!(normal[2] > 0.99);
        assert!(color[0] > 0.5);
    }

    #[test]
    fn test_cube_shadows_ground() {
        let mut scene = Scene::new();
        scene.add(Node::mesh("ground", Shape::Plane { half_size: Vec2::new(50.0, 50.0) }, Material::default()));
        scene.add(
            Node::mesh("roof", Shape::Cuboid { half_extents: Vec3::new(20.0, 0.1, 20.0) }, Material::default())
                .at(Vec3::new(0.0, 5.0, 0.0)),
        );
        scene.add(Node::new("sun", NodeKind::DirectionalLight(DirectionalLight::default())).at(Vec3::new(0.0, 20.0, 0.0)));

        // Camera below the roof sees the shadowed ground
        let mut camera = Camera::perspective(Vec3::new(0.0, 2.0, 0.001), 60.0, 1.0, 0.1, 100.0);
        camera.look_at(Vec3::zeros(), Vec3::y());
        let targets = capture(&scene, camera, Extent::new(5, 5));

        assert_eq!(targets.get(TargetSlot::Color).get(2, 2)[0], 0.0);
    }
}
