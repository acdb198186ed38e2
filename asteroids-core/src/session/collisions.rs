use super::Session;
use crate::entities::{Entity, EntityId, Ship};

impl Session {
    /// Runs every collision pass in its fixed order. Each pass works on a
    /// copy of the id lists and skips ids destroyed earlier in the frame.
    pub(super) fn resolve_collisions(&mut self) {
        self.collide_ship();
        self.collide_ufos_with_each_other();
        self.collide_asteroids_with_ufos();
        self.collide_ufos_with_projectiles();
        self.collide_asteroids_with_projectiles();
    }

    /// False when either entity is gone.
    fn touching(&mut self, a: EntityId, b: EntityId) -> bool {
        self.arena
            .with_pair(a, b, |a, b| a.body_mut().collides_with(b.body_mut()))
            .unwrap_or(false)
    }

    fn projectile_source(&self, id: EntityId) -> Option<(EntityId, bool)> {
        self.arena
            .get(id)
            .and_then(Entity::as_projectile)
            .map(|projectile| (projectile.source().id, projectile.fired_by_ship()))
    }

    /// First hit wins; the ship cannot be hit while invulnerable or in
    /// hyperspace, nor by its own shots.
    fn collide_ship(&mut self) {
        let Some(ship_id) = self.state.ship else {
            return;
        };
        if !self.ship().is_some_and(Ship::is_vulnerable) {
            return;
        }

        let hostile_shots = self
            .state
            .projectiles
            .iter()
            .copied()
            .filter(|id| self.projectile_source(*id).is_some_and(|(_, by_ship)| !by_ship));
        let candidates: Vec<EntityId> = self
            .state
            .ufos
            .iter()
            .chain(&self.state.asteroids)
            .copied()
            .chain(hostile_shots)
            .collect();

        for other in candidates {
            if !self.touching(ship_id, other) {
                continue;
            }
            self.remove_entity(ship_id, true);
            if self.arena.get(other).and_then(Entity::as_asteroid).is_some() {
                self.destroy_asteroid(other, true, true);
            } else {
                self.remove_entity(other, true);
            }
            return;
        }
    }

    fn collide_ufos_with_each_other(&mut self) {
        let ufos = self.state.ufos.clone();
        let mut i = 0;
        while i < ufos.len() {
            let mut next = i + 1;
            for j in i + 1..ufos.len() {
                if self.touching(ufos[i], ufos[j]) {
                    self.remove_entity(ufos[i], true);
                    self.remove_entity(ufos[j], true);
                    next = j + 1;
                    break;
                }
            }
            i = next;
        }
    }

    fn collide_asteroids_with_ufos(&mut self) {
        for ufo in self.state.ufos.clone() {
            for asteroid in self.state.asteroids.clone() {
                if self.touching(ufo, asteroid) {
                    self.destroy_asteroid(asteroid, true, true);
                    self.remove_entity(ufo, true);
                    break;
                }
            }
        }
    }

    fn collide_ufos_with_projectiles(&mut self) {
        for projectile in self.state.projectiles.clone() {
            let Some((source, by_ship)) = self.projectile_source(projectile) else {
                continue;
            };
            for ufo in self.state.ufos.clone() {
                if ufo == source || !self.touching(ufo, projectile) {
                    continue;
                }
                let points = self
                    .arena
                    .get(ufo)
                    .and_then(Entity::as_ufo)
                    .map_or(0, |ufo| ufo.score());
                self.remove_entity(ufo, true);
                self.remove_entity(projectile, true);
                if by_ship {
                    self.award(points);
                }
                break;
            }
        }
    }

    fn collide_asteroids_with_projectiles(&mut self) {
        for projectile in self.state.projectiles.clone() {
            let Some((_, by_ship)) = self.projectile_source(projectile) else {
                continue;
            };
            for asteroid in self.state.asteroids.clone() {
                if !self.touching(asteroid, projectile) {
                    continue;
                }
                let points = self.destroy_asteroid(asteroid, true, true);
                self.remove_entity(projectile, true);
                if by_ship {
                    self.award(points);
                }
                break;
            }
        }
    }
}
