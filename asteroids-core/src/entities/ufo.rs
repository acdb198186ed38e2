use serde::{Deserialize, Serialize};

use super::{Entity, Projectile, ProjectileSource, ShipMode, SourceKind, TickContext};
use crate::{
    body::{Body, WrapMode},
    constants::{
        UFO_DIFFICULTY_SCORE, UFO_HULL, UFO_INACCURACY, UFO_LARGE_FIRE_INTERVAL,
        UFO_LARGE_HALF_WIDTH, UFO_LARGE_SCORE, UFO_LARGE_SPEED, UFO_LARGE_WEIGHT,
        UFO_PROJECTILE_SPEED, UFO_SHIFT_DURATION, UFO_SHIFT_EDGE_MARGIN, UFO_SHIFT_INTERVAL,
        UFO_SHIFT_SPEED_FACTOR, UFO_SMALL_FIRE_INTERVAL, UFO_SMALL_HALF_WIDTH, UFO_SMALL_SCORE,
        UFO_SMALL_SPEED, UFO_SMALL_WEIGHT, UFO_SPAWN_EDGE_MARGIN,
    },
    geometry::{angle_of, from_angle, lerp, shortest_offset, Vec2, WorldSize},
    hit_area::HitArea,
    rng::RandomSource,
    tick_queue::priority,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UfoKind {
    Large,
    Small,
}

impl UfoKind {
    pub fn speed(self) -> f64 {
        match self {
            Self::Large => UFO_LARGE_SPEED,
            Self::Small => UFO_SMALL_SPEED,
        }
    }

    pub fn score(self) -> u32 {
        match self {
            Self::Large => UFO_LARGE_SCORE,
            Self::Small => UFO_SMALL_SCORE,
        }
    }

    pub fn half_width(self) -> f64 {
        match self {
            Self::Large => UFO_LARGE_HALF_WIDTH,
            Self::Small => UFO_SMALL_HALF_WIDTH,
        }
    }

    fn fire_interval(self) -> (f64, f64) {
        match self {
            Self::Large => UFO_LARGE_FIRE_INTERVAL,
            Self::Small => UFO_SMALL_FIRE_INTERVAL,
        }
    }
}

fn difficulty(score: u32) -> f64 {
    f64::from(score.min(UFO_DIFFICULTY_SCORE)) / f64::from(UFO_DIFFICULTY_SCORE)
}

/// Weighted pick; small saucers get likelier as the score climbs.
pub fn choose_kind(score: u32, rng: &mut dyn RandomSource) -> UfoKind {
    let t = difficulty(score);
    let small = lerp(UFO_SMALL_WEIGHT.0, UFO_SMALL_WEIGHT.1, t);
    let large = lerp(UFO_LARGE_WEIGHT.0, UFO_LARGE_WEIGHT.1, t);
    if rng.float(0.0, small + large) < small {
        UfoKind::Small
    } else {
        UfoKind::Large
    }
}

/// Aim error half-range in radians; shrinks as the score climbs.
pub fn inaccuracy(score: u32) -> f64 {
    lerp(UFO_INACCURACY.0, UFO_INACCURACY.1, difficulty(score))
}

/// Firing angle that makes a projectile of `speed` meet a target moving at
/// constant `target_velocity`. Solves `|D + V t| = s t` for the smallest
/// positive `t`, with `D` the wrapped shortest offset. `None` when the shot
/// can never catch up.
pub fn intercept_angle(
    shooter: Vec2,
    target: Vec2,
    target_velocity: Vec2,
    speed: f64,
    world: WorldSize,
) -> Option<f64> {
    let delta = shortest_offset(shooter, target, world);
    let a = target_velocity.length_squared() - speed * speed;
    let b = 2.0 * delta.dot(target_velocity);
    let c = delta.length_squared();

    let time = if a.abs() < 1e-9 {
        if b >= 0.0 {
            return None;
        }
        -c / b
    } else {
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let t1 = (-b - root) / (2.0 * a);
        let t2 = (-b + root) / (2.0 * a);
        match (t1 > 0.0, t2 > 0.0) {
            (true, true) => t1.min(t2),
            (true, false) => t1,
            (false, true) => t2,
            (false, false) => return None,
        }
    };
    if !time.is_finite() || time <= 0.0 {
        return None;
    }
    let aim = delta + target_velocity * time;
    Some(angle_of(aim))
}

#[derive(Clone, Debug)]
pub struct Ufo {
    pub body: Body,
    kind: UfoKind,
    direction: f64,
    fire_timer: f64,
    shift_timer: f64,
    shift_remaining: Option<f64>,
}

impl Ufo {
    /// Enters just off a random side edge at a random height.
    pub fn spawn(kind: UfoKind, world: WorldSize, rng: &mut dyn RandomSource) -> Self {
        let direction = rng.sign();
        let half_width = kind.half_width();
        let x = if direction > 0.0 {
            -half_width
        } else {
            world.width + half_width
        };
        let y = if world.height > UFO_SPAWN_EDGE_MARGIN * 2.0 {
            rng.float(UFO_SPAWN_EDGE_MARGIN, world.height - UFO_SPAWN_EDGE_MARGIN)
        } else {
            world.height * 0.5
        };
        let (fire_min, fire_max) = kind.fire_interval();
        let fire_timer = rng.float(fire_min, fire_max);
        let shift_timer = rng.float(UFO_SHIFT_INTERVAL.0, UFO_SHIFT_INTERVAL.1);
        Self {
            body: Body::new(
                Vec2::new(x, y),
                HitArea::from_points(&UFO_HULL, half_width),
                WrapMode::Vertical,
                priority::UFO,
            )
            .with_velocity(Vec2::new(direction * kind.speed(), 0.0)),
            kind,
            direction,
            fire_timer,
            shift_timer,
            shift_remaining: None,
        }
    }

    pub fn kind(&self) -> UfoKind {
        self.kind
    }

    pub fn score(&self) -> u32 {
        self.kind.score()
    }

    pub fn is_shifting(&self) -> bool {
        self.shift_remaining.is_some()
    }

    /// Fully past the edge opposite to the one it entered from.
    pub fn has_exited(&self, world: WorldSize) -> bool {
        let bounds = self.body.current_bounds();
        if self.direction > 0.0 {
            bounds.min.x > world.width
        } else {
            bounds.max.x < 0.0
        }
    }

    pub fn tick(&mut self, ctx: &mut TickContext<'_>) {
        self.body.integrate(ctx.elapsed, ctx.world);
        if self.has_exited(ctx.world) {
            ctx.despawn(ctx.id);
            return;
        }

        self.fire_timer -= ctx.elapsed;
        if self.fire_timer <= 0.0 {
            self.fire(ctx);
            let (fire_min, fire_max) = self.kind.fire_interval();
            self.fire_timer = ctx.rng.float(fire_min, fire_max);
        }
        self.update_shift(ctx);
    }

    fn update_shift(&mut self, ctx: &mut TickContext<'_>) {
        let speed = self.kind.speed();
        if let Some(remaining) = self.shift_remaining {
            let remaining = remaining - ctx.elapsed;
            if remaining > 0.0 {
                self.shift_remaining = Some(remaining);
                return;
            }
            self.shift_remaining = None;
            self.body.set_velocity(Vec2::new(self.direction * speed, 0.0));
            self.shift_timer = ctx.rng.float(UFO_SHIFT_INTERVAL.0, UFO_SHIFT_INTERVAL.1);
            return;
        }

        self.shift_timer -= ctx.elapsed;
        if self.shift_timer > 0.0 {
            return;
        }
        let y = self.body.position().y;
        if y < UFO_SHIFT_EDGE_MARGIN || y > ctx.world.height - UFO_SHIFT_EDGE_MARGIN {
            self.shift_timer = ctx.rng.float(UFO_SHIFT_INTERVAL.0, UFO_SHIFT_INTERVAL.1);
            return;
        }
        let vertical = ctx.rng.sign() * speed * UFO_SHIFT_SPEED_FACTOR;
        self.body.set_velocity(Vec2::new(self.direction * speed, vertical));
        self.shift_remaining = Some(ctx.rng.float(UFO_SHIFT_DURATION.0, UFO_SHIFT_DURATION.1));
    }

    fn aim(&self, ctx: &mut TickContext<'_>) -> f64 {
        if self.kind == UfoKind::Large {
            return ctx.rng.angle();
        }
        let origin = self.body.position();
        let at_ship = ctx
            .ship()
            .filter(|ship| ship.mode() != ShipMode::Hyperspacing)
            .and_then(|ship| {
                intercept_angle(
                    origin,
                    ship.body.position(),
                    ship.body.velocity(),
                    UFO_PROJECTILE_SPEED,
                    ctx.world,
                )
            });
        let base = match at_ship {
            Some(angle) => angle,
            None => {
                let target = ctx
                    .rng
                    .pick(ctx.state.asteroids.len())
                    .map(|index| ctx.state.asteroids[index]);
                let at_asteroid = target.and_then(|id| ctx.asteroid(id)).and_then(|asteroid| {
                    intercept_angle(
                        origin,
                        asteroid.body.position(),
                        asteroid.body.velocity(),
                        UFO_PROJECTILE_SPEED,
                        ctx.world,
                    )
                });
                match at_asteroid {
                    Some(angle) => angle,
                    None => ctx.rng.angle(),
                }
            }
        };
        let spread = inaccuracy(ctx.state.score);
        base + ctx.rng.float(-spread, spread)
    }

    fn fire(&mut self, ctx: &mut TickContext<'_>) {
        let angle = self.aim(ctx);
        let heading = from_angle(angle);
        ctx.spawn(Entity::Projectile(Projectile::new(
            self.body.position() + heading * (self.kind.half_width() + 4.0),
            heading * UFO_PROJECTILE_SPEED,
            ProjectileSource {
                id: ctx.id,
                kind: SourceKind::Ufo,
            },
        )));
    }
}
