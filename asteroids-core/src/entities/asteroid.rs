use core::f64::consts::TAU;

use super::{find_open_position, TickContext};
use crate::{
    body::{Body, WrapMode},
    constants::{
        ASTEROID_CHILDREN_COUNT, ASTEROID_CHILD_MIN_SEPARATION, ASTEROID_CHILD_OFFSET,
        ASTEROID_GENERATIONS, ASTEROID_HULL_VERTICES, ASTEROID_INCREASE_PER_LEVEL,
        ASTEROID_INITIAL, ASTEROID_MAX_INITIAL, ASTEROID_MAX_ROTATION_SPEED, ASTEROID_MODEL_COUNT,
        ASTEROID_RADIUS, ASTEROID_SCORE, ASTEROID_SPEED, SPAWN_SEARCH_ATTEMPTS,
    },
    geometry::{angle_distance, from_angle, Rect, Vec2, WorldSize},
    hit_area::HitArea,
    rng::RandomSource,
    tick_queue::priority,
};

#[derive(Clone, Debug)]
pub struct Asteroid {
    pub body: Body,
    generation: u8,
    model: u8,
}

impl Asteroid {
    pub fn new(
        position: Vec2,
        velocity: Vec2,
        rotation_speed: f64,
        generation: u8,
        model: u8,
    ) -> Self {
        assert!(
            generation < ASTEROID_GENERATIONS,
            "asteroid generation {generation} out of range"
        );
        let radius = ASTEROID_RADIUS[generation as usize];
        Self {
            body: Body::new(
                position,
                HitArea::regular_polygon(ASTEROID_HULL_VERTICES, radius),
                WrapMode::Both,
                priority::ASTEROID,
            )
            .with_velocity(velocity)
            .with_rotation_speed(rotation_speed),
            generation,
            model,
        }
    }

    /// Random heading, speed and spin for `generation`. The model index is
    /// cosmetic and comes from the cosmetic source.
    fn launch(
        position: Vec2,
        angle: f64,
        generation: u8,
        rng: &mut dyn RandomSource,
        cosmetic: &mut dyn RandomSource,
    ) -> Self {
        let (min_speed, max_speed) = ASTEROID_SPEED[generation as usize];
        let speed = rng.float(min_speed, max_speed);
        let rotation_speed = rng.float(-ASTEROID_MAX_ROTATION_SPEED, ASTEROID_MAX_ROTATION_SPEED);
        let model = cosmetic.int(0, ASTEROID_MODEL_COUNT - 1) as u8;
        Self::new(
            position,
            from_angle(angle) * speed,
            rotation_speed,
            generation,
            model,
        )
    }

    pub fn generation(&self) -> u8 {
        self.generation
    }

    pub fn model(&self) -> u8 {
        self.model
    }

    pub fn score(&self) -> u32 {
        ASTEROID_SCORE[self.generation as usize]
    }

    pub fn can_split(&self) -> bool {
        self.generation + 1 < ASTEROID_GENERATIONS
    }

    /// Fragments left behind when this asteroid is shot apart.
    pub fn split(
        &self,
        rng: &mut dyn RandomSource,
        cosmetic: &mut dyn RandomSource,
    ) -> Vec<Asteroid> {
        if !self.can_split() {
            return Vec::new();
        }
        let origin = self.body.position();
        split_angles(rng, ASTEROID_CHILDREN_COUNT)
            .into_iter()
            .map(|angle| {
                let offset = from_angle(angle) * rng.float(0.0, ASTEROID_CHILD_OFFSET);
                Self::launch(origin + offset, angle, self.generation + 1, rng, cosmetic)
            })
            .collect()
    }

    pub fn tick(&mut self, ctx: &mut TickContext<'_>) {
        self.body.integrate(ctx.elapsed, ctx.world);
    }
}

pub fn initial_count(level: u32) -> u32 {
    let extra = ASTEROID_INCREASE_PER_LEVEL.saturating_mul(level.saturating_sub(1));
    ASTEROID_INITIAL.saturating_add(extra).min(ASTEROID_MAX_INITIAL)
}

/// A level's opening batch. `obstacles` should already hold the ship's
/// inflated footprint; each placed asteroid is appended to it.
pub fn create_initial(
    level: u32,
    world: WorldSize,
    obstacles: &mut Vec<Rect>,
    rng: &mut dyn RandomSource,
    cosmetic: &mut dyn RandomSource,
) -> Vec<Asteroid> {
    let radius = ASTEROID_RADIUS[0];
    (0..initial_count(level))
        .map(|_| {
            let position = find_open_position(rng, world, Vec2::splat(radius), 0.0, obstacles);
            let angle = rng.angle();
            let mut asteroid = Asteroid::launch(position, angle, 0, rng, cosmetic);
            obstacles.push(asteroid.body.bounds());
            asteroid
        })
        .collect()
}

/// `count` launch angles, every pair at least the minimum separation apart.
pub fn split_angles(rng: &mut dyn RandomSource, count: usize) -> Vec<f64> {
    let clear = |angles: &[f64], candidate: f64| {
        angles
            .iter()
            .all(|other| angle_distance(candidate, *other) >= ASTEROID_CHILD_MIN_SEPARATION)
    };

    let mut angles: Vec<f64> = Vec::with_capacity(count);
    while angles.len() < count {
        let mut candidate = rng.angle();
        let mut attempts = 1;
        while !clear(&angles, candidate) && attempts < SPAWN_SEARCH_ATTEMPTS {
            candidate = rng.angle();
            attempts += 1;
        }
        if !clear(&angles, candidate) {
            // Walk evenly spaced slots around the first angle.
            let slots = (count * 4).max(1);
            let base = angles[0];
            candidate = (1..slots)
                .map(|slot| (base + TAU * slot as f64 / slots as f64).rem_euclid(TAU))
                .find(|slot| clear(&angles, *slot))
                .unwrap_or(candidate);
        }
        angles.push(candidate);
    }
    angles
}
