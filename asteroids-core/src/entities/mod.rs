mod asteroid;
mod debris;
mod projectile;
mod ship;
mod ufo;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use asteroid::{create_initial, initial_count, split_angles, Asteroid};
pub use debris::Debris;
pub use projectile::{Projectile, ProjectileSource, SourceKind};
pub use ship::{Ship, ShipMode};
pub use ufo::{choose_kind, inaccuracy, intercept_angle, Ufo, UfoKind};

use crate::{
    body::Body,
    constants::SPAWN_SEARCH_ATTEMPTS,
    geometry::{Rect, Vec2, WorldSize},
    rng::RandomSource,
    session::GameState,
};

/// Stable handle into the session arena. Allocated in increasing order and
/// never reused until the session is reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub(crate) u32);

impl EntityId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Ship,
    Asteroid,
    Ufo,
    Projectile,
    Debris,
}

#[derive(Clone, Debug)]
pub enum Entity {
    Ship(Ship),
    Asteroid(Asteroid),
    Ufo(Ufo),
    Projectile(Projectile),
    Debris(Debris),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Ship(_) => EntityKind::Ship,
            Self::Asteroid(_) => EntityKind::Asteroid,
            Self::Ufo(_) => EntityKind::Ufo,
            Self::Projectile(_) => EntityKind::Projectile,
            Self::Debris(_) => EntityKind::Debris,
        }
    }

    pub fn body(&self) -> &Body {
        match self {
            Self::Ship(ship) => &ship.body,
            Self::Asteroid(asteroid) => &asteroid.body,
            Self::Ufo(ufo) => &ufo.body,
            Self::Projectile(projectile) => &projectile.body,
            Self::Debris(debris) => &debris.body,
        }
    }

    pub fn body_mut(&mut self) -> &mut Body {
        match self {
            Self::Ship(ship) => &mut ship.body,
            Self::Asteroid(asteroid) => &mut asteroid.body,
            Self::Ufo(ufo) => &mut ufo.body,
            Self::Projectile(projectile) => &mut projectile.body,
            Self::Debris(debris) => &mut debris.body,
        }
    }

    pub fn priority(&self) -> i32 {
        self.body().priority()
    }

    pub fn tick(&mut self, ctx: &mut TickContext<'_>) {
        match self {
            Self::Ship(ship) => ship.tick(ctx),
            Self::Asteroid(asteroid) => asteroid.tick(ctx),
            Self::Ufo(ufo) => ufo.tick(ctx),
            Self::Projectile(projectile) => projectile.tick(ctx),
            Self::Debris(debris) => debris.tick(ctx),
        }
    }

    pub fn as_ship(&self) -> Option<&Ship> {
        match self {
            Self::Ship(ship) => Some(ship),
            _ => None,
        }
    }

    pub fn as_asteroid(&self) -> Option<&Asteroid> {
        match self {
            Self::Asteroid(asteroid) => Some(asteroid),
            _ => None,
        }
    }

    pub fn as_ufo(&self) -> Option<&Ufo> {
        match self {
            Self::Ufo(ufo) => Some(ufo),
            _ => None,
        }
    }

    pub fn as_projectile(&self) -> Option<&Projectile> {
        match self {
            Self::Projectile(projectile) => Some(projectile),
            _ => None,
        }
    }
}

/// Owner of every live entity, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct Arena {
    entities: BTreeMap<EntityId, Entity>,
    next_id: u32,
}

impl Arena {
    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, entity);
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Puts back an entity previously taken out with [`Arena::remove`]
    /// under the same id.
    pub(crate) fn restore(&mut self, id: EntityId, entity: Entity) {
        debug_assert!(id.0 < self.next_id, "restoring unallocated id {id}");
        self.entities.insert(id, entity);
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Live ids in registration order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().map(|(id, entity)| (*id, entity))
    }

    /// Runs `f` with mutable access to two distinct entities.
    pub fn with_pair<R>(
        &mut self,
        a: EntityId,
        b: EntityId,
        f: impl FnOnce(&mut Entity, &mut Entity) -> R,
    ) -> Option<R> {
        if a == b {
            return None;
        }
        let mut first = self.entities.remove(&a)?;
        let result = self.entities.get_mut(&b).map(|second| f(&mut first, second));
        self.entities.insert(a, first);
        result
    }

    /// Drops everything and restarts id allocation.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.next_id = 0;
    }
}

/// Requests an entity makes of the session during its tick.
#[derive(Debug)]
pub enum Command {
    Spawn(Entity),
    /// Quiet removal: expiry or leaving the playfield.
    Despawn(EntityId),
}

/// What an entity may see and do while it is being ticked. The entity itself
/// is out of the arena for the duration.
pub struct TickContext<'a> {
    pub id: EntityId,
    pub timestamp: f64,
    pub elapsed: f64,
    pub world: WorldSize,
    pub state: &'a GameState,
    pub arena: &'a Arena,
    pub rng: &'a mut dyn RandomSource,
    pub cosmetic: &'a mut dyn RandomSource,
    pub commands: &'a mut Vec<Command>,
}

impl TickContext<'_> {
    pub fn spawn(&mut self, entity: Entity) {
        self.commands.push(Command::Spawn(entity));
    }

    pub fn despawn(&mut self, id: EntityId) {
        self.commands.push(Command::Despawn(id));
    }

    pub fn ship(&self) -> Option<&Ship> {
        self.state
            .ship
            .and_then(|id| self.arena.get(id))
            .and_then(Entity::as_ship)
    }

    pub fn asteroid(&self, id: EntityId) -> Option<&Asteroid> {
        self.arena.get(id).and_then(Entity::as_asteroid)
    }

    /// Bounding boxes of every asteroid and UFO.
    pub fn hazard_bounds(&self) -> Vec<Rect> {
        hazard_bounds(self.state, self.arena)
    }
}

pub(crate) fn hazard_bounds(state: &GameState, arena: &Arena) -> Vec<Rect> {
    state
        .asteroids
        .iter()
        .chain(&state.ufos)
        .filter_map(|id| arena.get(*id))
        .map(|entity| entity.body().current_bounds())
        .collect()
}

/// Seeded search for a spot whose footprint (`half_extent` around the
/// candidate, grown by `padding`) touches none of `obstacles`. Falls back to
/// the last candidate tried.
pub fn find_open_position(
    rng: &mut dyn RandomSource,
    world: WorldSize,
    half_extent: Vec2,
    padding: f64,
    obstacles: &[Rect],
) -> Vec2 {
    let mut candidate = world.center();
    for _ in 0..SPAWN_SEARCH_ATTEMPTS {
        candidate = Vec2::new(rng.float(0.0, world.width), rng.float(0.0, world.height));
        let footprint = Rect::from_center(candidate, half_extent).inflate(padding);
        if !obstacles.iter().any(|obstacle| obstacle.intersects(&footprint)) {
            break;
        }
    }
    candidate
}

#[cfg(test)]
pub(crate) mod harness {
    use super::{Arena, Command, EntityId, TickContext};
    use crate::{geometry::WorldSize, rng::SeededRng, session::GameState};

    pub const WORLD: WorldSize = WorldSize::new(800.0, 600.0);

    /// Everything a lone entity needs to be ticked outside a session.
    pub struct Harness {
        pub state: GameState,
        pub arena: Arena,
        pub rng: SeededRng,
        pub cosmetic: SeededRng,
        pub commands: Vec<Command>,
    }

    impl Harness {
        pub fn new() -> Self {
            Self {
                state: GameState::new(3, 0),
                arena: Arena::default(),
                rng: SeededRng::new(5),
                cosmetic: SeededRng::new(6),
                commands: Vec::new(),
            }
        }

        pub fn ctx(&mut self, elapsed: f64) -> TickContext<'_> {
            TickContext {
                id: EntityId(0),
                timestamp: 0.0,
                elapsed,
                world: WORLD,
                state: &self.state,
                arena: &self.arena,
                rng: &mut self.rng,
                cosmetic: &mut self.cosmetic,
                commands: &mut self.commands,
            }
        }

        pub fn despawned(&self) -> bool {
            self.commands
                .iter()
                .any(|command| matches!(command, Command::Despawn(id) if *id == EntityId(0)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeededRng;

    fn projectile() -> Entity {
        Entity::Projectile(Projectile::new(
            Vec2::new(10.0, 10.0),
            Vec2::new(100.0, 0.0),
            ProjectileSource {
                id: EntityId(99),
                kind: SourceKind::Ship,
            },
        ))
    }

    #[test]
    fn arena_allocates_monotonic_ids() {
        let mut arena = Arena::default();
        let a = arena.insert(projectile());
        let b = arena.insert(projectile());
        arena.remove(a);
        let c = arena.insert(projectile());
        assert!(a < b && b < c);
        assert_eq!(arena.ids(), vec![b, c]);

        arena.clear();
        assert_eq!(arena.insert(projectile()), EntityId(0));
    }

    #[test]
    fn with_pair_rejects_same_or_missing_ids() {
        let mut arena = Arena::default();
        let a = arena.insert(projectile());
        let b = arena.insert(projectile());
        assert_eq!(arena.with_pair(a, a, |_, _| ()), None);
        assert_eq!(arena.with_pair(a, EntityId(77), |_, _| ()), None);
        assert_eq!(
            arena.with_pair(a, b, |x, y| (x.kind(), y.kind())),
            Some((EntityKind::Projectile, EntityKind::Projectile))
        );
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn open_position_avoids_obstacles() {
        let world = WorldSize::new(800.0, 600.0);
        let blocked = Rect::new(Vec2::ZERO, Vec2::new(400.0, 600.0));
        let mut rng = SeededRng::new(11);
        for _ in 0..50 {
            let spot = find_open_position(&mut rng, world, Vec2::splat(10.0), 5.0, &[blocked]);
            assert!(spot.x > 400.0 + 15.0);
        }
    }
}
