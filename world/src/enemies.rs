//! Authoritative enemy state and path following.

use std::time::Duration;

use glam::Vec2;
use rocket_td_core::{
    EnemyId, EnemyKind, EnemySnapshot, Event, Gold, Health, TileCoord, ARRIVAL_THRESHOLD,
};

use crate::{tile_center, to_point};

/// Enemy walking the level path.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    kind: EnemyKind,
    pub(crate) position: Vec2,
    rotation: f32,
    speed: f32,
    health: Health,
    max_health: Health,
    kill_bonus: Gold,
    path_index: usize,
    destroyed: bool,
    finished_path: bool,
}

impl Enemy {
    /// Places a new enemy on the first path tile, heading for the second.
    pub(crate) fn spawn(
        id: EnemyId,
        kind: EnemyKind,
        health: Health,
        speed: f32,
        kill_bonus: Gold,
        path: &[TileCoord],
    ) -> Self {
        let position = path.first().copied().map_or(Vec2::ZERO, tile_center);
        Self {
            id,
            kind,
            position,
            rotation: 0.0,
            speed: speed.max(0.0),
            health,
            max_health: health,
            kill_bonus,
            path_index: 1,
            destroyed: false,
            finished_path: false,
        }
    }

    /// Whether towers may engage the enemy.
    pub(crate) fn is_targetable(&self) -> bool {
        !self.destroyed && !self.finished_path
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Moves the enemy toward its next waypoint.
    ///
    /// A finished enemy is destroyed on the tick after it walked past the last
    /// waypoint and damages the base instead of awarding its kill bonus.
    pub(crate) fn advance(
        &mut self,
        path: &[TileCoord],
        dt: Duration,
        base_damage: u32,
        out_events: &mut Vec<Event>,
    ) {
        if self.destroyed {
            return;
        }

        if self.finished_path {
            self.destroyed = true;
            out_events.push(Event::EnemyReachedBase {
                enemy: self.id,
                damage: base_damage,
            });
            return;
        }

        let Some(waypoint) = path.get(self.path_index).copied().map(tile_center) else {
            self.finish(out_events);
            return;
        };

        let offset = waypoint - self.position;
        let distance = offset.length();
        if distance > f32::EPSILON {
            self.rotation = offset.y.atan2(offset.x);
            let step = (self.speed * dt.as_secs_f32()).min(distance);
            self.position += offset / distance * step;
        }

        if self.position.distance(waypoint) < ARRIVAL_THRESHOLD {
            self.path_index += 1;
            if self.path_index >= path.len() {
                self.finish(out_events);
            }
        }
    }

    /// Applies damage, destroying the enemy once its health is exhausted.
    pub(crate) fn hit(&mut self, damage: u32, out_events: &mut Vec<Event>) {
        if self.destroyed {
            return;
        }

        if damage >= self.health.get() {
            self.health = Health::ZERO;
            self.destroyed = true;
            out_events.push(Event::EnemyKilled {
                enemy: self.id,
                damage,
                kill_bonus: self.kill_bonus,
            });
        } else {
            self.health = self.health.saturating_sub(damage);
            out_events.push(Event::EnemyHit {
                enemy: self.id,
                damage,
                remaining: self.health,
            });
        }
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            position: to_point(self.position),
            rotation: self.rotation,
            health: self.health,
            max_health: self.max_health,
            kill_bonus: self.kill_bonus,
            path_index: self.path_index,
            destroyed: self.destroyed,
            finished_path: self.finished_path,
        }
    }

    fn finish(&mut self, out_events: &mut Vec<Event>) {
        self.finished_path = true;
        out_events.push(Event::EnemyFinishedPath { enemy: self.id });
    }
}

/// Live enemies kept in spawn order.
#[derive(Debug)]
pub(crate) struct EnemyRoster {
    entries: Vec<Enemy>,
    next_enemy_id: EnemyId,
}

impl EnemyRoster {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_enemy_id: EnemyId::new(0),
        }
    }

    pub(crate) fn spawn(
        &mut self,
        kind: EnemyKind,
        health: Health,
        speed: f32,
        kill_bonus: Gold,
        path: &[TileCoord],
    ) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
        self.entries
            .push(Enemy::spawn(id, kind, health, speed, kill_bonus, path));
        id
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&Enemy> {
        let index = self.position(id)?;
        self.entries.get(index)
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        let index = self.position(id)?;
        self.entries.get_mut(index)
    }

    fn position(&self, id: EnemyId) -> Option<usize> {
        self.entries
            .binary_search_by_key(&id, |enemy| enemy.id)
            .ok()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.entries.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Advances every enemy and drops the destroyed ones afterwards.
    pub(crate) fn advance_all(
        &mut self,
        path: &[TileCoord],
        dt: Duration,
        base_damage: u32,
        out_events: &mut Vec<Event>,
    ) {
        for enemy in &mut self.entries {
            enemy.advance(path, dt, base_damage, out_events);
        }

        self.entries.retain(|enemy| {
            if enemy.is_destroyed() {
                out_events.push(Event::EnemyRemoved { enemy: enemy.id });
                false
            } else {
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_path(length: u32) -> Vec<TileCoord> {
        (0..length).map(|column| TileCoord::new(column, 0)).collect()
    }

    fn enemy(health: u32, speed: f32, path: &[TileCoord]) -> Enemy {
        Enemy::spawn(
            EnemyId::new(0),
            EnemyKind::Basic,
            Health::new(health),
            speed,
            Gold::new(10),
            path,
        )
    }

    #[test]
    fn spawned_enemy_starts_on_first_tile_centre() {
        let path = straight_path(3);
        let enemy = enemy(10, 1.0, &path);
        assert_eq!(enemy.position, Vec2::new(0.5, 0.5));
        assert!(enemy.is_targetable());
        assert_eq!(enemy.snapshot().path_index, 1);
    }

    #[test]
    fn lethal_hit_destroys_without_finishing() {
        let path = straight_path(3);
        let mut enemy = enemy(50, 1.0, &path);
        let mut events = Vec::new();

        enemy.hit(60, &mut events);

        let snapshot = enemy.snapshot();
        assert!(snapshot.destroyed);
        assert!(!snapshot.finished_path);
        assert_eq!(snapshot.health, Health::ZERO);
        assert_eq!(
            events,
            vec![Event::EnemyKilled {
                enemy: EnemyId::new(0),
                damage: 60,
                kill_bonus: Gold::new(10),
            }]
        );

        events.clear();
        enemy.hit(5, &mut events);
        assert!(events.is_empty(), "destroyed enemies ignore further hits");
    }

    #[test]
    fn partial_hit_subtracts_health() {
        let path = straight_path(3);
        let mut enemy = enemy(50, 1.0, &path);
        let mut events = Vec::new();
        enemy.hit(20, &mut events);
        assert_eq!(enemy.snapshot().health, Health::new(30));
        assert!(enemy.is_targetable());
    }

    #[test]
    fn step_is_clamped_at_the_waypoint() {
        let path = straight_path(3);
        let mut enemy = enemy(10, 100.0, &path);
        let mut events = Vec::new();

        enemy.advance(&path, Duration::from_secs(1), 1, &mut events);

        assert_eq!(enemy.position, Vec2::new(1.5, 0.5));
        assert_eq!(enemy.snapshot().path_index, 2);
        assert!(events.is_empty());
    }

    #[test]
    fn finishing_enemy_is_destroyed_one_tick_later() {
        let path = straight_path(2);
        let mut enemy = enemy(10, 10.0, &path);
        let mut events = Vec::new();

        enemy.advance(&path, Duration::from_millis(200), 1, &mut events);
        let snapshot = enemy.snapshot();
        assert!(snapshot.finished_path);
        assert!(!snapshot.destroyed);
        assert!(!enemy.is_targetable());
        assert_eq!(
            events,
            vec![Event::EnemyFinishedPath {
                enemy: EnemyId::new(0)
            }]
        );

        events.clear();
        enemy.advance(&path, Duration::from_millis(200), 3, &mut events);
        assert!(enemy.snapshot().destroyed);
        assert_eq!(
            events,
            vec![Event::EnemyReachedBase {
                enemy: EnemyId::new(0),
                damage: 3,
            }]
        );
    }

    #[test]
    fn roster_removes_destroyed_enemies_after_moving() {
        let path = straight_path(4);
        let mut roster = EnemyRoster::new();
        let first = roster.spawn(EnemyKind::Basic, Health::new(5), 1.0, Gold::new(1), &path);
        let second = roster.spawn(EnemyKind::TankGreen, Health::new(5), 1.0, Gold::new(1), &path);
        let mut events = Vec::new();

        roster
            .get_mut(first)
            .expect("first enemy")
            .hit(10, &mut events);
        events.clear();
        roster.advance_all(&path, Duration::from_millis(100), 1, &mut events);

        assert_eq!(events, vec![Event::EnemyRemoved { enemy: first }]);
        assert_eq!(roster.len(), 1);
        assert!(roster.get(first).is_none());
        assert!(roster.get(second).is_some());
    }
}
