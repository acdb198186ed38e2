//! Game session: lifecycle, entity bookkeeping and the per-frame step.
//!
//! The session owns every entity in a single [`Arena`] and mirrors live ids
//! into the per-kind collections of [`GameState`]. Entities never touch the
//! arena directly; they push [`Command`]s that the session applies after
//! each entity tick.

mod collisions;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::{
    config::SessionConfig,
    constants::{
        LEVEL_ADVANCE_DELAY, SHIP_GUN_OFFSET, SHIP_RESPAWN_DELAY, SHIP_SAFE_DISTANCE, THEME_COUNT,
        UFO_SPAWN_INTERVAL,
    },
    entities::{
        choose_kind, create_initial, hazard_bounds, Arena, Asteroid, Command, Debris, Entity,
        EntityId, EntityKind, Ship, TickContext, Ufo,
    },
    events::{EventBus, GameEvent, Subscription, TopicSet},
    geometry::{Rect, Vec2, WorldSize},
    input::InputState,
    input_log::LogFrame,
    rng::{CosmeticRng, RandomSource, SeededRng},
    tick_queue::{TickQueue, Tickable},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Init,
    Running,
    Paused,
    Finished,
}

/// Mutable session state. The id collections mirror the arena and exclude
/// debris.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameState {
    pub level: u32,
    pub score: u32,
    pub lives: u32,
    pub status: GameStatus,
    /// Milliseconds of simulated time since start.
    pub timestamp: f64,
    pub theme: u8,
    pub ship: Option<EntityId>,
    pub asteroids: Vec<EntityId>,
    pub projectiles: Vec<EntityId>,
    pub ufos: Vec<EntityId>,
}

impl GameState {
    pub fn new(lives: u32, theme: u8) -> Self {
        Self {
            level: 1,
            score: 0,
            lives,
            status: GameStatus::Init,
            timestamp: 0.0,
            theme,
            ship: None,
            asteroids: Vec::new(),
            projectiles: Vec::new(),
            ufos: Vec::new(),
        }
    }

    /// No gameplay entity is tracked.
    pub fn is_clear(&self) -> bool {
        self.ship.is_none()
            && self.asteroids.is_empty()
            && self.projectiles.is_empty()
            && self.ufos.is_empty()
    }
}

/// Plain-data summary of a session, suitable for logs and JSON output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    pub level: u32,
    pub score: u32,
    pub lives: u32,
    pub status: GameStatus,
    pub timestamp: f64,
    pub frames: u64,
    pub ship_alive: bool,
    pub asteroids: usize,
    pub projectiles: usize,
    pub ufos: usize,
    pub fingerprint: u64,
}

const FINGERPRINT_OFFSET: u64 = 0xCBF2_9CE4_8422_2325;

fn mix_u64(hash: u64, value: u64) -> u64 {
    hash.wrapping_mul(0x0000_0100_0000_01B3) ^ value
}

pub struct Session {
    config: SessionConfig,
    world: WorldSize,
    state: GameState,
    arena: Arena,
    queue: TickQueue<EntityId>,
    events: EventBus,
    rng: Box<dyn RandomSource>,
    cosmetic: Box<dyn RandomSource>,
    commands: Vec<Command>,
    debris: Vec<EntityId>,
    next_ufo_at: f64,
    level_countdown: Option<f64>,
    respawn_countdown: Option<f64>,
    frames: u64,
}

impl Session {
    /// `rng` drives every gameplay decision; `cosmetic` only visuals.
    pub fn new(
        world: WorldSize,
        config: SessionConfig,
        rng: Box<dyn RandomSource>,
        mut cosmetic: Box<dyn RandomSource>,
    ) -> Self {
        assert!(
            world.width > 0.0 && world.height > 0.0,
            "world size must be positive, got {}x{}",
            world.width,
            world.height
        );
        let theme = cosmetic.int(0, i32::from(THEME_COUNT) - 1) as u8;
        Self {
            state: GameState::new(config.starting_lives, theme),
            config,
            world,
            arena: Arena::default(),
            queue: TickQueue::new(),
            events: EventBus::new(),
            rng,
            cosmetic,
            commands: Vec::new(),
            debris: Vec::new(),
            next_ufo_at: 0.0,
            level_countdown: None,
            respawn_countdown: None,
            frames: 0,
        }
    }

    /// Replayable session: gameplay draws come from the seed.
    pub fn seeded(seed: &str, world: WorldSize, config: SessionConfig) -> Self {
        Self::new(
            world,
            config,
            Box::new(SeededRng::from_seed_str(seed)),
            Box::new(CosmeticRng::new()),
        )
    }

    /// Casual session with no replay guarantees.
    pub fn unseeded(world: WorldSize, config: SessionConfig) -> Self {
        Self::new(
            world,
            config,
            Box::new(CosmeticRng::new()),
            Box::new(CosmeticRng::new()),
        )
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn world(&self) -> WorldSize {
        self.world
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn status(&self) -> GameStatus {
        self.state.status
    }

    /// Frames stepped since start, including frames after the session
    /// finished.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.arena.get(id)
    }

    pub fn ship(&self) -> Option<&Ship> {
        self.state
            .ship
            .and_then(|id| self.arena.get(id))
            .and_then(Entity::as_ship)
    }

    pub fn debris(&self) -> &[EntityId] {
        &self.debris
    }

    /// Entities currently scheduled on the tick queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn subscribe(&mut self, topics: TopicSet) -> Subscription {
        self.events.subscribe(topics)
    }

    /// Takes effect from the next entity tick.
    pub fn set_world_size(&mut self, world: WorldSize) {
        assert!(
            world.width > 0.0 && world.height > 0.0,
            "world size must be positive, got {}x{}",
            world.width,
            world.height
        );
        if world != self.world {
            trace!(width = world.width, height = world.height, "world resized");
            self.world = world;
        }
    }

    pub fn snapshot(&self) -> GameStateSnapshot {
        GameStateSnapshot {
            level: self.state.level,
            score: self.state.score,
            lives: self.state.lives,
            status: self.state.status,
            timestamp: self.state.timestamp,
            frames: self.frames,
            ship_alive: self.state.ship.is_some(),
            asteroids: self.state.asteroids.len(),
            projectiles: self.state.projectiles.len(),
            ufos: self.state.ufos.len(),
            fingerprint: self.fingerprint(),
        }
    }

    /// Hash of every gameplay-relevant value. Two sessions that agree on
    /// this have evolved identically.
    pub fn fingerprint(&self) -> u64 {
        let mut hash = FINGERPRINT_OFFSET;
        hash = mix_u64(hash, u64::from(self.state.level));
        hash = mix_u64(hash, u64::from(self.state.score));
        hash = mix_u64(hash, u64::from(self.state.lives));
        hash = mix_u64(hash, self.state.status as u64);
        hash = mix_u64(hash, self.state.timestamp.to_bits());

        for (id, entity) in self.arena.iter() {
            if entity.kind() == EntityKind::Debris {
                continue;
            }
            let body = entity.body();
            hash = mix_u64(hash, u64::from(id.get()));
            hash = mix_u64(hash, entity.kind() as u64);
            hash = mix_u64(hash, body.position().x.to_bits());
            hash = mix_u64(hash, body.position().y.to_bits());
            hash = mix_u64(hash, body.velocity().x.to_bits());
            hash = mix_u64(hash, body.velocity().y.to_bits());
            hash = mix_u64(hash, body.rotation().to_bits());
        }

        hash
    }

    pub fn start(&mut self) {
        if self.state.status != GameStatus::Init {
            warn!(status = ?self.state.status, "start ignored");
            return;
        }
        self.state.status = GameStatus::Running;
        self.events.publish(GameEvent::SessionStarted);

        self.spawn_ship(false);
        self.spawn_level();
        self.schedule_next_ufo();
        debug!(
            level = self.state.level,
            asteroids = self.state.asteroids.len(),
            "session started"
        );
    }

    pub fn pause(&mut self) {
        if self.state.status != GameStatus::Running {
            return;
        }
        self.state.status = GameStatus::Paused;
        debug!(frame = self.frames, "session paused");
        self.events.publish(GameEvent::SessionPaused);
    }

    pub fn resume(&mut self) {
        if self.state.status != GameStatus::Paused {
            return;
        }
        self.state.status = GameStatus::Running;
        debug!(frame = self.frames, "session resumed");
        self.events.publish(GameEvent::SessionResumed);
    }

    /// Tears everything down back to a fresh `Init` session. Subscriptions
    /// survive.
    pub fn reset(&mut self, reroll_theme: bool) {
        if self.state.status == GameStatus::Init && self.arena.is_empty() {
            return;
        }
        let previous = self.state.status;

        for id in self.arena.ids().into_iter().rev() {
            self.remove_entity(id, false);
        }
        assert!(
            self.state.is_clear() && self.debris.is_empty(),
            "entities left after reset: ship={:?} asteroids={} projectiles={} ufos={} debris={}",
            self.state.ship,
            self.state.asteroids.len(),
            self.state.projectiles.len(),
            self.state.ufos.len(),
            self.debris.len()
        );

        self.queue.clear();
        self.arena.clear();
        self.commands.clear();

        let theme = if reroll_theme {
            self.reroll_theme()
        } else {
            self.state.theme
        };
        self.state = GameState::new(self.config.starting_lives, theme);
        self.next_ufo_at = 0.0;
        self.level_countdown = None;
        self.respawn_countdown = None;
        self.frames = 0;

        debug!(?previous, theme, "session reset");
        self.events.publish(GameEvent::SessionReset { previous });
    }

    /// Advances the simulation by `elapsed` seconds.
    pub fn tick(&mut self, elapsed: f64, input: &InputState) {
        if matches!(self.state.status, GameStatus::Init | GameStatus::Paused) {
            return;
        }
        self.frames += 1;
        self.state.timestamp += elapsed * 1000.0;

        let mut input = *input;
        input.apply_deadzone(self.config.input_deadzone);
        self.apply_input(&input, elapsed);

        let timestamp = self.state.timestamp;
        let ticked = TickQueue::<EntityId>::tick(self, timestamp, elapsed);
        trace!(frame = self.frames, ticked, "entities ticked");

        self.resolve_collisions();
        self.spawn_ufo_when_due();

        if self.state.lives == 0 && self.state.status == GameStatus::Running {
            self.finish();
        }

        self.advance_level(elapsed);
        self.advance_respawn(elapsed);

        debug_assert!(
            self.collections_match_arena(),
            "entity collections out of sync with arena at frame {}",
            self.frames
        );
    }

    /// Steps one recorded frame, adopting its world size first.
    pub fn tick_frame(&mut self, frame: &LogFrame) {
        self.set_world_size(frame.world_size());
        self.tick(frame.elapsed_seconds(), &frame.input);
    }

    fn apply_input(&mut self, input: &InputState, elapsed: f64) {
        let Some(id) = self.state.ship else {
            return;
        };
        self.with_entity(id, elapsed, |entity, ctx| {
            if let Entity::Ship(ship) = entity {
                ship.apply_input(input, ctx);
            }
        });
    }

    /// Lends `id` out of the arena for `f`, then applies whatever it asked
    /// for.
    fn with_entity(
        &mut self,
        id: EntityId,
        elapsed: f64,
        f: impl FnOnce(&mut Entity, &mut TickContext<'_>),
    ) {
        let Some(mut entity) = self.arena.remove(id) else {
            return;
        };
        let mut ctx = TickContext {
            id,
            timestamp: self.state.timestamp,
            elapsed,
            world: self.world,
            state: &self.state,
            arena: &self.arena,
            rng: self.rng.as_mut(),
            cosmetic: self.cosmetic.as_mut(),
            commands: &mut self.commands,
        };
        f(&mut entity, &mut ctx);
        self.arena.restore(id, entity);
        self.apply_commands();
    }

    fn apply_commands(&mut self) {
        for command in std::mem::take(&mut self.commands) {
            match command {
                Command::Spawn(entity) => {
                    self.insert(entity);
                }
                Command::Despawn(id) => {
                    self.remove_entity(id, false);
                }
            }
        }
    }

    /// Registers a new entity. Asteroids are announced by the caller as a
    /// batch.
    fn insert(&mut self, entity: Entity) -> EntityId {
        let kind = entity.kind();
        if kind == EntityKind::Ship {
            assert!(
                self.state.ship.is_none(),
                "second ship spawned while {:?} is alive",
                self.state.ship
            );
        }
        let priority = entity.priority();
        let id = self.arena.insert(entity);
        self.queue.add(priority, id);

        match kind {
            EntityKind::Ship => {
                self.state.ship = Some(id);
                self.events.publish(GameEvent::ShipCreated { id });
            }
            EntityKind::Asteroid => self.state.asteroids.push(id),
            EntityKind::Ufo => {
                self.state.ufos.push(id);
                self.events.publish(GameEvent::UfoCreated { id });
            }
            EntityKind::Projectile => {
                self.state.projectiles.push(id);
                self.events.publish(GameEvent::ProjectileCreated { id });
            }
            EntityKind::Debris => self.debris.push(id),
        }
        id
    }

    fn spawn_asteroids(&mut self, batch: Vec<Asteroid>) {
        let ids: Vec<EntityId> = batch
            .into_iter()
            .map(|asteroid| self.insert(Entity::Asteroid(asteroid)))
            .collect();
        if !ids.is_empty() {
            self.events.publish(GameEvent::AsteroidsCreated { ids });
        }
    }

    /// Unregisters `id` everywhere. A `hit` ship costs a life; a `hit`
    /// ship, asteroid or UFO leaves debris behind.
    fn remove_entity(&mut self, id: EntityId, hit: bool) -> Option<Entity> {
        let entity = self.arena.remove(id)?;
        self.queue.remove(entity.priority(), id);

        let event = match &entity {
            Entity::Ship(_) => {
                self.state.ship = None;
                if hit {
                    self.state.lives = self.state.lives.saturating_sub(1);
                    debug!(%id, lives = self.state.lives, "ship destroyed");
                }
                Some(GameEvent::ShipDestroyed { id, hit })
            }
            Entity::Asteroid(asteroid) => {
                self.state.asteroids.retain(|other| *other != id);
                Some(GameEvent::AsteroidDestroyed {
                    id,
                    generation: asteroid.generation(),
                    hit,
                })
            }
            Entity::Ufo(_) => {
                self.state.ufos.retain(|other| *other != id);
                Some(GameEvent::UfoDestroyed { id, hit })
            }
            Entity::Projectile(_) => {
                self.state.projectiles.retain(|other| *other != id);
                Some(GameEvent::ProjectileDestroyed { id, hit })
            }
            Entity::Debris(_) => {
                self.debris.retain(|other| *other != id);
                None
            }
        };
        if let Some(event) = event {
            self.events.publish(event);
        }

        let combatant = matches!(
            entity.kind(),
            EntityKind::Ship | EntityKind::Asteroid | EntityKind::Ufo
        );
        if hit && combatant {
            self.spawn_debris(entity.body().position());
        }
        Some(entity)
    }

    /// Returns the asteroid's score value, or 0 if it was already gone.
    fn destroy_asteroid(&mut self, id: EntityId, hit: bool, split: bool) -> u32 {
        let Some(Entity::Asteroid(asteroid)) = self.remove_entity(id, hit) else {
            return 0;
        };
        if split {
            let children = asteroid.split(self.rng.as_mut(), self.cosmetic.as_mut());
            self.spawn_asteroids(children);
        }
        asteroid.score()
    }

    fn spawn_debris(&mut self, center: Vec2) {
        for debris in Debris::burst(center, self.cosmetic.as_mut()) {
            self.insert(Entity::Debris(debris));
        }
    }

    fn spawn_ship(&mut self, invulnerable: bool) {
        let ship = Ship::new(self.world.center(), invulnerable);
        self.insert(Entity::Ship(ship));
    }

    /// Opening batch for the current level, kept clear of the ship (or of
    /// its respawn point) and of every live hazard.
    fn spawn_level(&mut self) {
        let guard = self
            .ship()
            .map(|ship| ship.body.current_bounds())
            .unwrap_or_else(|| {
                Rect::from_center(self.world.center(), Vec2::splat(SHIP_GUN_OFFSET))
            })
            .inflate(SHIP_SAFE_DISTANCE);
        let mut obstacles = vec![guard];
        obstacles.extend(hazard_bounds(&self.state, &self.arena));

        let batch = create_initial(
            self.state.level,
            self.world,
            &mut obstacles,
            self.rng.as_mut(),
            self.cosmetic.as_mut(),
        );
        self.spawn_asteroids(batch);
    }

    fn schedule_next_ufo(&mut self) {
        let (min, max) = UFO_SPAWN_INTERVAL;
        self.next_ufo_at = self.state.timestamp + self.rng.float(min, max) * 1000.0;
    }

    fn spawn_ufo_when_due(&mut self) {
        if !self.config.ufos_enabled
            || self.state.status != GameStatus::Running
            || self.state.timestamp < self.next_ufo_at
        {
            return;
        }
        let kind = choose_kind(self.state.score, self.rng.as_mut());
        let ufo = Ufo::spawn(kind, self.world, self.rng.as_mut());
        let id = self.insert(Entity::Ufo(ufo));
        debug!(%id, ?kind, "ufo spawned");
        self.schedule_next_ufo();
    }

    /// Adds `points` (and any extra lives they earn) unless the session is
    /// over.
    fn award(&mut self, points: u32) {
        if points == 0 || self.state.status == GameStatus::Finished {
            return;
        }
        let before = self.state.score;
        self.state.score = before.saturating_add(points);
        let extra = self.config.extra_life.lives_awarded(before, self.state.score);
        if extra > 0 {
            self.state.lives = self.state.lives.saturating_add(extra);
            debug!(extra, lives = self.state.lives, "extra life");
        }
        self.events.publish(GameEvent::ScoreChanged {
            score: self.state.score,
            lives: self.state.lives,
        });
    }

    fn finish(&mut self) {
        self.state.status = GameStatus::Finished;
        info!(
            score = self.state.score,
            level = self.state.level,
            frames = self.frames,
            "session finished"
        );
        self.events.publish(GameEvent::SessionFinished {
            score: self.state.score,
            level: self.state.level,
        });
    }

    fn advance_level(&mut self, elapsed: f64) {
        if !self.state.asteroids.is_empty() {
            self.level_countdown = None;
            return;
        }
        let remaining = self.level_countdown.get_or_insert(LEVEL_ADVANCE_DELAY);
        *remaining -= elapsed;
        if *remaining > 0.0 {
            return;
        }
        self.level_countdown = None;

        if self.state.status != GameStatus::Finished {
            self.state.level += 1;
            debug!(level = self.state.level, "level advanced");
            self.events.publish(GameEvent::LevelAdvanced {
                level: self.state.level,
            });
        }
        self.spawn_level();
    }

    fn advance_respawn(&mut self, elapsed: f64) {
        if self.state.ship.is_some() || self.state.lives == 0 {
            self.respawn_countdown = None;
            return;
        }
        let remaining = self.respawn_countdown.get_or_insert(SHIP_RESPAWN_DELAY);
        *remaining -= elapsed;
        if *remaining > 0.0 {
            return;
        }
        self.respawn_countdown = None;
        self.spawn_ship(true);
    }

    /// Any theme but the current one.
    fn reroll_theme(&mut self) -> u8 {
        let current = i32::from(self.state.theme);
        let mut next = self.cosmetic.int(0, i32::from(THEME_COUNT) - 2);
        if next >= current {
            next += 1;
        }
        next as u8
    }

    fn collections_match_arena(&self) -> bool {
        let mut tracked: Vec<EntityId> = self
            .state
            .ship
            .iter()
            .chain(&self.state.asteroids)
            .chain(&self.state.projectiles)
            .chain(&self.state.ufos)
            .chain(&self.debris)
            .copied()
            .collect();
        tracked.sort_unstable();
        tracked == self.arena.ids() && self.queue.len() == self.arena.len()
    }
}

impl Tickable<EntityId> for Session {
    fn tick_queue(&self) -> &TickQueue<EntityId> {
        &self.queue
    }

    fn tick_item(&mut self, item: EntityId, _timestamp: f64, elapsed: f64) {
        self.with_entity(item, elapsed, |entity, ctx| entity.tick(ctx));
    }
}
