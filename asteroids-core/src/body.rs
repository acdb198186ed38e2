use core::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::{
    geometry::{from_angle, wrap_coordinate, Rect, Vec2, WorldSize},
    hit_area::HitArea,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrapMode {
    None,
    Horizontal,
    Vertical,
    Both,
}

impl WrapMode {
    pub fn horizontal(self) -> bool {
        matches!(self, Self::Horizontal | Self::Both)
    }

    pub fn vertical(self) -> bool {
        matches!(self, Self::Vertical | Self::Both)
    }
}

/// Kinematic state and collision shape shared by every entity.
#[derive(Clone, Debug)]
pub struct Body {
    position: Vec2,
    rotation: f64,
    velocity: Vec2,
    rotation_speed: f64,
    wrap: WrapMode,
    priority: i32,
    hit_area: HitArea,
    bounds: Rect,
    bounds_key: (f64, Vec2),
}

impl Body {
    pub fn new(position: Vec2, mut hit_area: HitArea, wrap: WrapMode, priority: i32) -> Self {
        hit_area.sync(0.0, position);
        let bounds = hit_area.bounds_at(0.0, position);
        Self {
            position,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            rotation_speed: 0.0,
            wrap,
            priority,
            hit_area,
            bounds,
            bounds_key: (0.0, position),
        }
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_rotation_speed(mut self, rotation_speed: f64) -> Self {
        self.rotation_speed = rotation_speed;
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn rotation_speed(&self) -> f64 {
        self.rotation_speed
    }

    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn hit_area(&self) -> &HitArea {
        &self.hit_area
    }

    pub fn heading(&self) -> Vec2 {
        from_angle(self.rotation)
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn set_rotation(&mut self, rotation: f64) {
        self.rotation = rotation;
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn set_rotation_speed(&mut self, rotation_speed: f64) {
        self.rotation_speed = rotation_speed;
    }

    fn is_fresh(&self) -> bool {
        self.bounds_key == (self.rotation, self.position)
    }

    /// Brings the bounding box and polygon cache up to date with the
    /// current transform.
    pub fn refresh(&mut self) {
        if self.is_fresh() {
            return;
        }
        self.hit_area.sync(self.rotation, self.position);
        self.bounds = self.hit_area.bounds_at(self.rotation, self.position);
        self.bounds_key = (self.rotation, self.position);
    }

    pub fn bounds(&mut self) -> Rect {
        self.refresh();
        self.bounds
    }

    /// Same as [`Body::bounds`] for read-only callers; recomputes into a
    /// temporary if the cache is stale.
    pub fn current_bounds(&self) -> Rect {
        if self.is_fresh() {
            self.bounds
        } else {
            self.hit_area.bounds_at(self.rotation, self.position)
        }
    }

    /// Advances position and rotation by `elapsed` seconds, then wraps.
    pub fn integrate(&mut self, elapsed: f64, world: WorldSize) {
        self.position += self.velocity * elapsed;
        self.rotation = (self.rotation + self.rotation_speed * elapsed).rem_euclid(TAU);
        self.wrap_into(world);
    }

    pub fn wrap_into(&mut self, world: WorldSize) {
        if self.wrap == WrapMode::None {
            return;
        }
        let margin = self.bounds().size() * 0.5;
        if self.wrap.horizontal() {
            self.position.x = wrap_coordinate(self.position.x, world.width, margin.x);
        }
        if self.wrap.vertical() {
            self.position.y = wrap_coordinate(self.position.y, world.height, margin.y);
        }
    }

    pub fn collides_with(&mut self, other: &mut Body) -> bool {
        if !self.bounds().intersects(&other.bounds()) {
            return false;
        }
        self.hit_area
            .intersects(self.position, &other.hit_area, other.position)
    }
}

/// Powered movement: thrust along the heading, friction, speed caps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motor {
    pub acceleration: f64,
    pub rotation_acceleration: f64,
    pub friction: f64,
    pub rotation_friction: f64,
    pub max_speed: f64,
    pub max_rotation_speed: f64,
    /// Friction only opposes each axis in proportion to how much the heading
    /// points along it.
    pub directional_friction: bool,
}

fn approach_zero(value: f64, amount: f64) -> f64 {
    if value > 0.0 {
        (value - amount).max(0.0)
    } else {
        (value + amount).min(0.0)
    }
}

impl Motor {
    /// `thrust` and `turn` are the input amounts, `[0, 1]` and `[-1, 1]`.
    pub fn drive(&self, body: &mut Body, thrust: f64, turn: f64, elapsed: f64) {
        let heading = body.heading();
        let mut velocity = body.velocity() + heading * (self.acceleration * thrust * elapsed);

        let drag = self.friction * elapsed;
        if self.directional_friction {
            velocity.x = approach_zero(velocity.x, drag * heading.x.abs());
            velocity.y = approach_zero(velocity.y, drag * heading.y.abs());
        } else {
            let speed = velocity.length();
            if speed > 0.0 {
                velocity *= (speed - drag).max(0.0) / speed;
            }
        }
        body.set_velocity(velocity.clamp_length_max(self.max_speed));

        let mut spin = body.rotation_speed() + self.rotation_acceleration * turn * elapsed;
        spin = approach_zero(spin, self.rotation_friction * elapsed);
        body.set_rotation_speed(spin.clamp(-self.max_rotation_speed, self.max_rotation_speed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD: WorldSize = WorldSize::new(800.0, 600.0);

    fn motor() -> Motor {
        Motor {
            acceleration: 100.0,
            rotation_acceleration: 10.0,
            friction: 20.0,
            rotation_friction: 5.0,
            max_speed: 50.0,
            max_rotation_speed: 2.0,
            directional_friction: true,
        }
    }

    #[test]
    fn integrate_moves_and_wraps_both_axes() {
        let mut body = Body::new(Vec2::new(795.0, 300.0), HitArea::circle(5.0), WrapMode::Both, 0)
            .with_velocity(Vec2::new(100.0, 0.0));
        body.integrate(0.125, WORLD);
        assert_eq!(body.position(), Vec2::new(-2.5, 300.0));
        assert_eq!(body.velocity(), Vec2::new(100.0, 0.0));
    }

    #[test]
    fn vertical_wrap_leaves_x_alone() {
        let mut body = Body::new(
            Vec2::new(-50.0, -20.0),
            HitArea::circle(5.0),
            WrapMode::Vertical,
            0,
        );
        body.integrate(0.016, WORLD);
        assert_eq!(body.position().x, -50.0);
        assert_eq!(body.position().y, 590.0);
    }

    #[test]
    fn bounds_follow_the_transform() {
        let mut body = Body::new(
            Vec2::new(10.0, 10.0),
            HitArea::regular_polygon(4, 5.0),
            WrapMode::None,
            0,
        );
        let before = body.bounds();
        body.set_position(Vec2::new(30.0, 10.0));
        assert_eq!(body.current_bounds().center(), Vec2::new(30.0, 10.0));
        let after = body.bounds();
        assert_eq!(after.size(), before.size());
        assert_eq!(after.center(), Vec2::new(30.0, 10.0));
    }

    #[test]
    fn collision_is_symmetric_for_mixed_shapes() {
        let mut circle = Body::new(Vec2::new(0.0, 0.0), HitArea::circle(4.0), WrapMode::None, 0);
        let mut polygon = Body::new(
            Vec2::new(8.0, 0.0),
            HitArea::regular_polygon(6, 5.0),
            WrapMode::None,
            0,
        );
        assert!(circle.collides_with(&mut polygon));
        assert!(polygon.collides_with(&mut circle));
        polygon.set_position(Vec2::new(20.0, 0.0));
        assert!(!circle.collides_with(&mut polygon));
        assert!(!polygon.collides_with(&mut circle));
    }

    #[test]
    fn heading_uses_portable_trig() {
        for step in 0..32 {
            let rotation = f64::from(step) * 0.37 - 5.0;
            let body = Body::new(Vec2::ZERO, HitArea::circle(1.0), WrapMode::None, 0)
                .with_rotation(rotation);
            let expected = Vec2::new(libm::cos(rotation), libm::sin(rotation));
            assert_eq!(body.heading().x.to_bits(), expected.x.to_bits());
            assert_eq!(body.heading().y.to_bits(), expected.y.to_bits());
        }
    }

    #[test]
    fn motor_caps_speed() {
        let mut body = Body::new(Vec2::ZERO, HitArea::circle(1.0), WrapMode::None, 0);
        for _ in 0..200 {
            motor().drive(&mut body, 1.0, 0.0, 0.05);
        }
        assert!(body.velocity().length() <= 50.0 + 1e-9);
        assert!(body.velocity().x > 0.0);
    }

    #[test]
    fn directional_friction_ignores_perpendicular_axis() {
        let mut body = Body::new(Vec2::ZERO, HitArea::circle(1.0), WrapMode::None, 0)
            .with_velocity(Vec2::new(0.0, 30.0));
        motor().drive(&mut body, 0.0, 0.0, 0.1);
        assert_eq!(body.velocity().y, 30.0);
    }

    #[test]
    fn rotation_decays_without_turn_input() {
        let mut body = Body::new(Vec2::ZERO, HitArea::circle(1.0), WrapMode::None, 0)
            .with_rotation_speed(1.0);
        motor().drive(&mut body, 0.0, 0.0, 0.1);
        assert!((body.rotation_speed() - 0.5).abs() < 1e-12);
        for _ in 0..10 {
            motor().drive(&mut body, 0.0, 0.0, 0.1);
        }
        assert_eq!(body.rotation_speed(), 0.0);
    }
}
