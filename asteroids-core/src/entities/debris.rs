use super::TickContext;
use crate::{
    body::{Body, WrapMode},
    constants::{DEBRIS_COUNT, DEBRIS_LIFETIME, DEBRIS_SPEED},
    geometry::{from_angle, Vec2},
    hit_area::HitArea,
    rng::RandomSource,
    tick_queue::priority,
};

/// Explosion particle. Purely visual: driven by the cosmetic source, never
/// collides, never counted in gameplay state.
#[derive(Clone, Debug)]
pub struct Debris {
    pub body: Body,
    remaining: f64,
    lifetime: f64,
}

impl Debris {
    pub fn burst(center: Vec2, cosmetic: &mut dyn RandomSource) -> Vec<Debris> {
        (0..DEBRIS_COUNT)
            .map(|_| {
                let direction = from_angle(cosmetic.angle());
                let speed = cosmetic.float(DEBRIS_SPEED.0, DEBRIS_SPEED.1);
                let lifetime = cosmetic.float(DEBRIS_LIFETIME.0, DEBRIS_LIFETIME.1);
                Debris {
                    body: Body::new(
                        center,
                        HitArea::circle(1.0),
                        WrapMode::None,
                        priority::COSMETIC,
                    )
                    .with_velocity(direction * speed),
                    remaining: lifetime,
                    lifetime,
                }
            })
            .collect()
    }

    pub fn alpha(&self) -> f64 {
        (self.remaining / self.lifetime).clamp(0.0, 1.0)
    }

    pub fn tick(&mut self, ctx: &mut TickContext<'_>) {
        self.body.integrate(ctx.elapsed, ctx.world);
        self.remaining -= ctx.elapsed;
        if self.remaining <= 0.0 {
            ctx.despawn(ctx.id);
        }
    }
}
