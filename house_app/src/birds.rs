//! Bird flapping and the flock flight

use std::f32::consts::TAU;

use sunpath_engine::animation::{Animatable, TickContext, TickError};
use sunpath_engine::foundation::math::{Quat, Vec3};
use sunpath_engine::scene::{NodeId, Scene, SceneError};

use crate::house::WING_NAMES;

/// Peak wing angle in radians
const FLAP_ANGLE: f32 = 0.7;
/// Vertical bob amplitude in world units
const BOB_AMPLITUDE: f32 = 0.15;

/// Delay before the flock starts moving, in seconds
pub const FLIGHT_DELAY: f32 = 1.0;
/// Duration of one flight, in seconds
pub const FLIGHT_DURATION: f32 = 60.0;

/// One bird flapping its wings in place
///
/// The bird's position inside the flock only bobs; travel comes from the
/// [`FlockTween`] moving the whole group.
#[derive(Debug, Clone)]
pub struct Bird {
    node: NodeId,
    wings: [NodeId; 2],
    rest: Vec3,
    phase: f32,
    flaps_per_second: f32,
    elapsed: f32,
}

impl Bird {
    /// Bind to a bird node built by the house loader
    pub fn new(scene: &Scene, node: NodeId, phase: f32, flaps_per_second: f32) -> Result<Self, SceneError> {
        let bird = scene.node(node)?;
        let find_wing = |name: &str| {
            bird.children()
                .iter()
                .copied()
                .find(|child| scene.node(*child).is_ok_and(|n| n.name == name))
                .ok_or_else(|| SceneError::UnknownNode(format!("{name} of bird {node:?}")))
        };

        Ok(Self {
            node,
            wings: [find_wing(WING_NAMES[0])?, find_wing(WING_NAMES[1])?],
            rest: bird.transform.position,
            phase,
            flaps_per_second: flaps_per_second.max(0.0),
            elapsed: 0.0,
        })
    }

    fn wing_angle(&self) -> f32 {
        (self.elapsed * self.flaps_per_second * TAU + self.phase).sin() * FLAP_ANGLE
    }
}

impl Animatable for Bird {
    fn name(&self) -> &str {
        "bird"
    }

    fn tick(&mut self, delta: f32, ctx: &mut TickContext<'_>) -> Result<(), TickError> {
        self.elapsed += delta;
        let angle = self.wing_angle();

        for (wing, side) in self.wings.iter().zip([1.0_f32, -1.0]) {
            ctx.scene.node_mut(*wing)?.transform.rotation = Quat::from_axis_angle(&Vec3::z_axis(), side * angle);
        }

        // Wings down push the body up
        let lift = -angle / FLAP_ANGLE * BOB_AMPLITUDE;
        ctx.scene.set_position(self.node, self.rest + Vec3::new(0.0, lift, 0.0))?;
        Ok(())
    }
}

/// Moves the flock group towards a destination, restarting after each flight
///
/// Only the horizontal coordinates travel. Progress eases out quadratically.
#[derive(Debug, Clone)]
pub struct FlockTween {
    flock: NodeId,
    from: Vec3,
    to: Vec3,
    elapsed: f32,
}

impl FlockTween {
    /// Tween from the flock's current position to `(x, z)`
    pub fn new(scene: &Scene, flock: NodeId, x: f32, z: f32) -> Result<Self, SceneError> {
        let from = scene.node(flock)?.transform.position;
        Ok(Self {
            flock,
            from,
            to: Vec3::new(x, from.y, z),
            elapsed: 0.0,
        })
    }

    /// Eased progress of the current flight in `[0, 1]`
    pub fn progress(&self) -> f32 {
        let local = self.elapsed % (FLIGHT_DELAY + FLIGHT_DURATION);
        if local < FLIGHT_DELAY {
            return 0.0;
        }
        let t = ((local - FLIGHT_DELAY) / FLIGHT_DURATION).min(1.0);
        1.0 - (1.0 - t) * (1.0 - t)
    }

    /// Where the flock is right now
    pub fn position(&self) -> Vec3 {
        self.from.lerp(&self.to, self.progress())
    }
}

impl Animatable for FlockTween {
    fn name(&self) -> &str {
        "flock-tween"
    }

    fn tick(&mut self, delta: f32, ctx: &mut TickContext<'_>) -> Result<(), TickError> {
        let before = self.elapsed;
        self.elapsed += delta;
        let period = FLIGHT_DELAY + FLIGHT_DURATION;
        if (self.elapsed / period).floor() > (before / period).floor() {
            log::debug!("Flock flight restarting");
        }

        ctx.scene.set_position(self.flock, self.position())?;
        Ok(())
    }
}
