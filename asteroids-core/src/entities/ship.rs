use serde::{Deserialize, Serialize};

use super::{find_open_position, Entity, Projectile, ProjectileSource, SourceKind, TickContext};
use crate::{
    body::{Body, Motor, WrapMode},
    constants::{
        PROJECTILE_SPEED, SHIP_ACCELERATION, SHIP_FIRE_COOLDOWN, SHIP_FRICTION, SHIP_GUN_OFFSET,
        SHIP_HULL, SHIP_HYPERSPACE_TIME, SHIP_INVULNERABLE_TIME, SHIP_MAX_ROTATION_SPEED,
        SHIP_MAX_SPEED, SHIP_PROJECTILE_SPEED_FACTOR, SHIP_RECOIL, SHIP_ROTATION_ACCELERATION,
        SHIP_ROTATION_FRICTION, SHIP_START_ROTATION,
    },
    geometry::Vec2,
    hit_area::HitArea,
    input::{Control, InputState},
    tick_queue::priority,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipMode {
    Normal,
    Invulnerable,
    Hyperspacing,
}

#[derive(Clone, Copy, Debug)]
struct Hyperspace {
    remaining: f64,
    jumped: bool,
}

#[derive(Clone, Debug)]
pub struct Ship {
    pub body: Body,
    motor: Motor,
    thrust: f64,
    turn: f64,
    fire_cooldown: f64,
    invulnerable: f64,
    hyperspace: Option<Hyperspace>,
}

impl Ship {
    pub fn new(position: Vec2, invulnerable: bool) -> Self {
        Self {
            body: Body::new(
                position,
                HitArea::from_points(&SHIP_HULL, 1.0),
                WrapMode::Both,
                priority::SHIP,
            )
            .with_rotation(SHIP_START_ROTATION),
            motor: Motor {
                acceleration: SHIP_ACCELERATION,
                rotation_acceleration: SHIP_ROTATION_ACCELERATION,
                friction: SHIP_FRICTION,
                rotation_friction: SHIP_ROTATION_FRICTION,
                max_speed: SHIP_MAX_SPEED,
                max_rotation_speed: SHIP_MAX_ROTATION_SPEED,
                directional_friction: true,
            },
            thrust: 0.0,
            turn: 0.0,
            fire_cooldown: 0.0,
            invulnerable: if invulnerable { SHIP_INVULNERABLE_TIME } else { 0.0 },
            hyperspace: None,
        }
    }

    pub fn mode(&self) -> ShipMode {
        if self.hyperspace.is_some() {
            ShipMode::Hyperspacing
        } else if self.invulnerable > 0.0 {
            ShipMode::Invulnerable
        } else {
            ShipMode::Normal
        }
    }

    /// Whether anything can hit the ship right now.
    pub fn is_vulnerable(&self) -> bool {
        self.mode() == ShipMode::Normal
    }

    /// Speed along the current heading; negative when drifting backwards.
    pub fn forward_speed(&self) -> f64 {
        self.body.velocity().dot(self.body.heading())
    }

    fn hyperspace_progress(&self) -> Option<f64> {
        self.hyperspace
            .map(|jump| 1.0 - (jump.remaining / SHIP_HYPERSPACE_TIME).clamp(0.0, 1.0))
    }

    /// Fades out to the jump midpoint and back in.
    pub fn alpha(&self) -> f64 {
        self.hyperspace_progress()
            .map_or(1.0, |progress| (1.0 - 2.0 * progress).abs())
    }

    pub fn scale(&self) -> f64 {
        0.5 + 0.5 * self.alpha()
    }

    /// Latches this frame's controls. Firing and hyperspace take effect here;
    /// movement is applied on the ship's tick.
    pub fn apply_input(&mut self, input: &InputState, ctx: &mut TickContext<'_>) {
        if self.hyperspace.is_some() {
            self.thrust = 0.0;
            self.turn = 0.0;
            return;
        }
        self.thrust = input.thrust();
        self.turn = input.turn();

        if input.pressed(Control::Hyperspace) {
            self.hyperspace = Some(Hyperspace {
                remaining: SHIP_HYPERSPACE_TIME,
                jumped: false,
            });
            self.thrust = 0.0;
            self.turn = 0.0;
            return;
        }
        if input.pressed(Control::Fire) && self.fire_cooldown <= 0.0 {
            self.fire(ctx);
        }
    }

    fn fire(&mut self, ctx: &mut TickContext<'_>) {
        let heading = self.body.heading();
        let speed = PROJECTILE_SPEED + self.forward_speed().max(0.0) * SHIP_PROJECTILE_SPEED_FACTOR;
        ctx.spawn(Entity::Projectile(Projectile::new(
            self.body.position() + heading * SHIP_GUN_OFFSET,
            heading * speed,
            ProjectileSource {
                id: ctx.id,
                kind: SourceKind::Ship,
            },
        )));
        self.body.set_velocity(self.body.velocity() - heading * SHIP_RECOIL);
        self.fire_cooldown = SHIP_FIRE_COOLDOWN;
    }

    pub fn tick(&mut self, ctx: &mut TickContext<'_>) {
        let elapsed = ctx.elapsed;
        self.fire_cooldown = (self.fire_cooldown - elapsed).max(0.0);
        self.invulnerable = (self.invulnerable - elapsed).max(0.0);

        if let Some(mut jump) = self.hyperspace {
            jump.remaining -= elapsed;
            if !jump.jumped && jump.remaining <= SHIP_HYPERSPACE_TIME * 0.5 {
                self.jump(ctx);
                jump.jumped = true;
            }
            self.hyperspace = (jump.remaining > 0.0).then_some(jump);
        }

        self.motor.drive(&mut self.body, self.thrust, self.turn, elapsed);
        self.body.integrate(elapsed, ctx.world);
    }

    fn jump(&mut self, ctx: &mut TickContext<'_>) {
        let half_extent = self.body.bounds().size() * 0.5;
        let hazards = ctx.hazard_bounds();
        let destination = find_open_position(ctx.rng, ctx.world, half_extent, 0.0, &hazards);
        tracing::trace!(x = destination.x, y = destination.y, "hyperspace jump");
        self.body.set_position(destination);
        self.body.set_velocity(Vec2::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{harness::Harness, Command};

    #[test]
    fn starts_facing_up() {
        let ship = Ship::new(Vec2::new(400.0, 300.0), false);
        assert!((ship.body.heading() - Vec2::new(0.0, -1.0)).length() < 1e-12);
        assert_eq!(ship.mode(), ShipMode::Normal);
    }

    #[test]
    fn firing_spawns_projectile_and_recoils() {
        let mut harness = Harness::new();
        let mut ship = Ship::new(Vec2::new(400.0, 300.0), false);
        let fire = InputState::new().with(Control::Fire, 1.0);

        ship.apply_input(&fire, &mut harness.ctx(0.016));
        ship.apply_input(&fire, &mut harness.ctx(0.016));

        assert_eq!(harness.commands.len(), 1, "cooldown blocks the second shot");
        let Command::Spawn(Entity::Projectile(shot)) = &harness.commands[0] else {
            panic!("expected a projectile spawn");
        };
        assert!(shot.body.position().y < 300.0);
        assert!(shot.body.velocity().y <= -PROJECTILE_SPEED + 1e-9);
        assert!(ship.body.velocity().y > 0.0);
    }

    #[test]
    fn invulnerability_wears_off() {
        let mut harness = Harness::new();
        let mut ship = Ship::new(Vec2::new(400.0, 300.0), true);
        assert_eq!(ship.mode(), ShipMode::Invulnerable);
        for _ in 0..((SHIP_INVULNERABLE_TIME / 0.05) as usize + 1) {
            ship.tick(&mut harness.ctx(0.05));
        }
        assert_eq!(ship.mode(), ShipMode::Normal);
    }

    #[test]
    fn hyperspace_fades_jumps_and_returns() {
        let mut harness = Harness::new();
        let start = Vec2::new(400.0, 300.0);
        let mut ship = Ship::new(start, false);
        ship.apply_input(
            &InputState::new().with(Control::Hyperspace, 1.0),
            &mut harness.ctx(0.125),
        );
        assert_eq!(ship.mode(), ShipMode::Hyperspacing);
        assert_eq!(ship.alpha(), 1.0);

        for _ in 0..3 {
            ship.tick(&mut harness.ctx(0.125));
        }
        assert!(ship.alpha() < 0.5);
        assert_eq!(ship.body.position(), start);

        ship.tick(&mut harness.ctx(0.125));
        assert_ne!(ship.body.position(), start);

        for _ in 0..4 {
            ship.tick(&mut harness.ctx(0.125));
        }
        assert_eq!(ship.mode(), ShipMode::Normal);
        assert_eq!(ship.alpha(), 1.0);
    }

    #[test]
    fn hyperspacing_ship_ignores_input() {
        let mut harness = Harness::new();
        let mut ship = Ship::new(Vec2::new(400.0, 300.0), false);
        ship.apply_input(
            &InputState::new().with(Control::Hyperspace, 1.0),
            &mut harness.ctx(0.016),
        );
        ship.apply_input(
            &InputState::new().with(Control::Fire, 1.0),
            &mut harness.ctx(0.016),
        );
        assert!(harness.commands.is_empty());
        assert!(!ship.is_vulnerable());
    }
}
