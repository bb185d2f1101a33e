//! Ray queries against analytic shapes
//!
//! Rays are transformed into each mesh's local space with the inverse world
//! matrix. The direction is not renormalized there, so the hit parameter `t`
//! is the same in world and local space.

use crate::foundation::math::{Mat4, Point3, Vec3};

use super::node::Shape;

/// Offset applied along the normal when spawning secondary rays
pub const RAY_EPSILON: f32 = 1e-3;

/// Half-line in world space
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Start point
    pub origin: Vec3,
    /// Direction (normalized for world rays)
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t`
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Local-space hit: parameter and unnormalized local normal
#[derive(Debug, Clone, Copy)]
struct LocalHit {
    t: f32,
    normal: Vec3,
}

/// Intersect a world ray with `shape` whose inverse world matrix is `inverse`
///
/// Returns the hit parameter and the world-space normal facing the ray.
pub fn intersect_shape(shape: &Shape, inverse: &Mat4, ray: &Ray, t_max: f32) -> Option<(f32, Vec3)> {
    let origin = inverse.transform_point(&Point3::from(ray.origin)).coords;
    let direction = inverse.transform_vector(&ray.direction);

    let hit = match *shape {
        Shape::Plane { half_size } => {
            if direction.y.abs() < f32::EPSILON {
                return None;
            }
            let t = -origin.y / direction.y;
            let p = origin + direction * t;
            (p.x.abs() <= half_size.x && p.z.abs() <= half_size.y).then_some(LocalHit {
                t,
                normal: Vec3::y(),
            })
        }
        Shape::Sphere { radius } => sphere(origin, direction, radius),
        Shape::Cuboid { half_extents } => cuboid(origin, direction, half_extents),
    }?;

    if hit.t <= RAY_EPSILON || hit.t >= t_max {
        return None;
    }

    // Normals transform with the inverse transpose.
    let mut normal = inverse.transpose().transform_vector(&hit.normal);
    if normal.norm_squared() <= f32::EPSILON {
        return None;
    }
    normal.normalize_mut();
    if normal.dot(&ray.direction) > 0.0 {
        normal = -normal;
    }

    Some((hit.t, normal))
}

fn sphere(origin: Vec3, direction: Vec3, radius: f32) -> Option<LocalHit> {
    let a = direction.dot(&direction);
    let half_b = origin.dot(&direction);
    let c = origin.dot(&origin) - radius * radius;
    let discriminant = half_b * half_b - a * c;
    if discriminant < 0.0 || a <= 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let near = (-half_b - root) / a;
    let t = if near > RAY_EPSILON { near } else { (-half_b + root) / a };
    Some(LocalHit {
        t,
        normal: origin + direction * t,
    })
}

fn cuboid(origin: Vec3, direction: Vec3, half: Vec3) -> Option<LocalHit> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;
    let mut near_axis = 0;
    let mut far_axis = 0;

    for axis in 0..3 {
        if direction[axis].abs() < f32::EPSILON {
            if origin[axis].abs() > half[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / direction[axis];
        let mut t0 = (-half[axis] - origin[axis]) * inv;
        let mut t1 = (half[axis] - origin[axis]) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        if t0 > t_near {
            t_near = t0;
            near_axis = axis;
        }
        if t1 < t_far {
            t_far = t1;
            far_axis = axis;
        }
    }

    if t_near > t_far || t_far <= RAY_EPSILON {
        return None;
    }

    let (t, axis) = if t_near > RAY_EPSILON { (t_near, near_axis) } else { (t_far, far_axis) };
    let mut normal = Vec3::zeros();
    normal[axis] = (origin[axis] + direction[axis] * t).signum();
    Some(LocalHit { t, normal })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Transform, Vec2};
    use approx::assert_relative_eq;

    fn placed(transform: &Transform) -> Mat4 {
        transform.to_matrix().try_inverse().unwrap()
    }

    #[test]
    fn test_ray_hits_scaled_cube_top() {
        let inverse = placed(&Transform::from_position_scale(Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 2.0, 2.0)));
        let shape = Shape::Cuboid { half_extents: Vec3::new(0.5, 0.5, 0.5) };
        let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, -1.0, 0.0));

        let (t, normal) = intersect_shape(&shape, &inverse, &ray, f32::INFINITY).unwrap();
        assert_relative_eq!(t, 8.0, epsilon = 1e-4);
        assert_relative_eq!(normal, Vec3::y(), epsilon = 1e-5);
    }

    #[test]
    fn test_plane_is_bounded() {
        let inverse = placed(&Transform::identity());
        let shape = Shape::Plane { half_size: Vec2::new(1.0, 1.0) };

        let inside = Ray::new(Vec3::new(0.5, 1.0, 0.5), Vec3::new(0.0, -1.0, 0.0));
        let outside = Ray::new(Vec3::new(3.0, 1.0, 0.0), Vec3::new(0.0, -1.0, 0.0));

        assert!(intersect_shape(&shape, &inverse, &inside, f32::INFINITY).is_some());
        assert!(intersect_shape(&shape, &inverse, &outside, f32::INFINITY).is_none());
    }

    #[test]
    fn test_plane_normal_faces_ray_from_below() {
        let inverse = placed(&Transform::identity());
        let shape = Shape::Plane { half_size: Vec2::new(1.0, 1.0) };
        let ray = Ray::new(Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0));

        let (_, normal) = intersect_shape(&shape, &inverse, &ray, f32::INFINITY).unwrap();
        assert_relative_eq!(normal.y, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_sphere_respects_t_max() {
        let inverse = placed(&Transform::from_position(Vec3::new(0.0, 0.0, -5.0)));
        let shape = Shape::Sphere { radius: 1.0 };
        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0));

        assert!(intersect_shape(&shape, &inverse, &ray, 3.0).is_none());
        let (t, _) = intersect_shape(&shape, &inverse, &ray, 10.0).unwrap();
        assert_relative_eq!(t, 4.0, epsilon = 1e-4);
    }
}
