use serde::{Deserialize, Serialize};

use super::{EntityId, TickContext};
use crate::{
    body::{Body, WrapMode},
    constants::{PROJECTILE_MAX_DISTANCE, PROJECTILE_RADIUS, UFO_PROJECTILE_MAX_DISTANCE},
    geometry::Vec2,
    hit_area::HitArea,
    tick_queue::priority,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Ship,
    Ufo,
}

/// Who fired a projectile. The id may outlive its entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectileSource {
    pub id: EntityId,
    pub kind: SourceKind,
}

#[derive(Clone, Debug)]
pub struct Projectile {
    pub body: Body,
    source: ProjectileSource,
    travelled: f64,
    max_distance: f64,
}

impl Projectile {
    pub fn new(position: Vec2, velocity: Vec2, source: ProjectileSource) -> Self {
        let max_distance = match source.kind {
            SourceKind::Ship => PROJECTILE_MAX_DISTANCE,
            SourceKind::Ufo => UFO_PROJECTILE_MAX_DISTANCE,
        };
        Self {
            body: Body::new(
                position,
                HitArea::circle(PROJECTILE_RADIUS),
                WrapMode::Both,
                priority::PROJECTILE,
            )
            .with_velocity(velocity),
            source,
            travelled: 0.0,
            max_distance,
        }
    }

    pub fn source(&self) -> ProjectileSource {
        self.source
    }

    pub fn fired_by_ship(&self) -> bool {
        self.source.kind == SourceKind::Ship
    }

    pub fn travelled(&self) -> f64 {
        self.travelled
    }

    pub fn tick(&mut self, ctx: &mut TickContext<'_>) {
        self.body.integrate(ctx.elapsed, ctx.world);
        self.travelled += self.body.velocity().length() * ctx.elapsed;
        if self.travelled >= self.max_distance {
            ctx.despawn(ctx.id);
        }
    }
}
