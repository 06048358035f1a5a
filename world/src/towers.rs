//! Authoritative tower state management utilities.

use std::{
    collections::{BTreeMap, HashMap},
    time::Duration,
};

use glam::Vec2;
use rocket_td_core::{
    EnemyId, Event, ProjectileSnapshot, TargetingStrategy, TileCoord, TowerId, TowerKind,
    TowerSnapshot, TowerUpgrades, UpgradeError, UpgradeKind, ARRIVAL_THRESHOLD,
};

use crate::{enemies::EnemyRoster, tile_center, to_point};

/// Homing projectile owned by the tower that launched it.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    tower: TowerId,
    target: EnemyId,
    position: Vec2,
    rotation: f32,
    speed: f32,
    damage: u32,
    time_to_live: Duration,
}

impl Projectile {
    /// Advances the projectile and reports whether it is still in flight.
    ///
    /// The projectile expires without dealing damage once its target is no
    /// longer targetable or its time to live ran out.
    fn advance(
        &mut self,
        dt: Duration,
        enemies: &mut EnemyRoster,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let Some(enemy) = enemies
            .get_mut(self.target)
            .filter(|enemy| enemy.is_targetable())
        else {
            self.expire(out_events);
            return false;
        };

        if self.time_to_live.is_zero() {
            self.expire(out_events);
            return false;
        }
        self.time_to_live = self.time_to_live.saturating_sub(dt);

        let offset = enemy.position - self.position;
        let distance = offset.length();
        if distance > f32::EPSILON {
            self.rotation = offset.y.atan2(offset.x);
            let step = (self.speed * dt.as_secs_f32()).min(distance);
            self.position += offset / distance * step;
        }

        if self.position.distance(enemy.position) < ARRIVAL_THRESHOLD {
            enemy.hit(self.damage, out_events);
            return false;
        }

        true
    }

    fn expire(&self, out_events: &mut Vec<Event>) {
        out_events.push(Event::ProjectileExpired {
            tower: self.tower,
            enemy: self.target,
        });
    }

    fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            tower: self.tower,
            target: self.target,
            position: to_point(self.position),
            rotation: self.rotation,
            time_to_live: self.time_to_live,
        }
    }
}

/// Tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Tower {
    id: TowerId,
    kind: TowerKind,
    tile: TileCoord,
    strategy: TargetingStrategy,
    upgrades: TowerUpgrades,
    target: Option<EnemyId>,
    reload_left: Duration,
    rotation: f32,
    projectiles: Vec<Projectile>,
}

impl Tower {
    fn new(
        id: TowerId,
        kind: TowerKind,
        tile: TileCoord,
        strategy: TargetingStrategy,
        upgrades: TowerUpgrades,
    ) -> Self {
        Self {
            id,
            kind,
            tile,
            strategy,
            upgrades,
            target: None,
            reload_left: upgrades.reload_time(),
            rotation: 0.0,
            projectiles: Vec::new(),
        }
    }

    pub(crate) fn upgrades(&self) -> &TowerUpgrades {
        &self.upgrades
    }

    /// Buys one level of the provided upgrade track.
    pub(crate) fn upgrade(&mut self, kind: UpgradeKind) -> Result<u32, UpgradeError> {
        self.upgrades.get_mut(kind).upgrade()
    }

    pub(crate) fn assign_target(&mut self, enemy: EnemyId) {
        self.target = Some(enemy);
    }

    /// Aims, reloads, fires and advances the projectiles of the tower.
    ///
    /// The reload timer runs down even without a target. Firing clears the
    /// target, so the next shot requires a fresh acquisition.
    pub(crate) fn update(
        &mut self,
        dt: Duration,
        enemies: &mut EnemyRoster,
        projectile_time_to_live: Duration,
        out_events: &mut Vec<Event>,
    ) {
        let center = tile_center(self.tile);
        let aim = self
            .target
            .and_then(|target| enemies.get(target))
            .filter(|enemy| enemy.is_targetable())
            .map(|enemy| enemy.position);
        if aim.is_none() {
            self.target = None;
        }

        if let Some(position) = aim {
            let offset = position - center;
            if offset.length_squared() > 0.0 {
                self.rotation = offset.y.atan2(offset.x);
            }
        }

        self.reload_left = self.reload_left.saturating_sub(dt);
        if self.reload_left.is_zero() {
            if let Some(target) = self.target.take() {
                self.projectiles.push(Projectile {
                    tower: self.id,
                    target,
                    position: center,
                    rotation: self.rotation,
                    speed: self.upgrades.projectile_speed(),
                    damage: self.upgrades.damage(),
                    time_to_live: projectile_time_to_live,
                });
                self.reload_left = self.upgrades.reload_time();
                out_events.push(Event::ProjectileFired {
                    tower: self.id,
                    enemy: target,
                });
            }
        }

        self.projectiles
            .retain_mut(|projectile| projectile.advance(dt, enemies, out_events));
    }

    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            tile: self.tile,
            strategy: self.strategy,
            target: self.target,
            rotation: self.rotation,
            reload_left: self.reload_left,
            upgrades: self.upgrades,
        }
    }

    pub(crate) fn projectile_snapshots(&self) -> impl Iterator<Item = ProjectileSnapshot> + '_ {
        self.projectiles.iter().map(Projectile::snapshot)
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, Tower>,
    by_tile: HashMap<TileCoord, TowerId>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            by_tile: HashMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    pub(crate) fn insert(
        &mut self,
        kind: TowerKind,
        tile: TileCoord,
        strategy: TargetingStrategy,
        upgrades: TowerUpgrades,
    ) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        let _ = self
            .entries
            .insert(id, Tower::new(id, kind, tile, strategy, upgrades));
        let _ = self.by_tile.insert(tile, id);
        id
    }

    pub(crate) fn is_occupied(&self, tile: TileCoord) -> bool {
        self.by_tile.contains_key(&tile)
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&Tower> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Tower> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket_td_core::{EnemyKind, Gold, Health, TowerBlueprint};

    const TICK: Duration = Duration::from_millis(100);
    const TIME_TO_LIVE: Duration = Duration::from_secs(5);

    fn stationary_enemy(roster: &mut EnemyRoster, column: u32, health: u32) -> EnemyId {
        let path = [TileCoord::new(column, 0), TileCoord::new(column + 1, 0)];
        roster.spawn(EnemyKind::Basic, Health::new(health), 0.0, Gold::new(5), &path)
    }

    fn rocket_at(tile: TileCoord) -> Tower {
        Tower::new(
            TowerId::new(0),
            TowerKind::Rocket,
            tile,
            TargetingStrategy::InsertionOrder,
            TowerBlueprint::rocket().upgrades,
        )
    }

    #[test]
    fn tower_fires_once_per_reload() {
        let mut roster = EnemyRoster::new();
        let enemy = stationary_enemy(&mut roster, 1, 1_000);
        let mut tower = rocket_at(TileCoord::new(0, 0));
        let mut events = Vec::new();

        for _ in 0..5 {
            if tower.snapshot().target.is_none() {
                tower.assign_target(enemy);
            }
            tower.update(TICK, &mut roster, TIME_TO_LIVE, &mut events);
        }

        let fired = events
            .iter()
            .filter(|event| matches!(event, Event::ProjectileFired { .. }))
            .count();
        assert_eq!(fired, 1);
        assert_eq!(tower.snapshot().reload_left, Duration::from_millis(500));
        assert_eq!(tower.snapshot().target, None);
    }

    #[test]
    fn tower_rotates_toward_target_while_reloading() {
        let mut roster = EnemyRoster::new();
        let enemy = stationary_enemy(&mut roster, 3, 10);
        let mut tower = rocket_at(TileCoord::new(3, 2));
        let mut events = Vec::new();

        tower.assign_target(enemy);
        tower.update(TICK, &mut roster, TIME_TO_LIVE, &mut events);

        let rotation = tower.snapshot().rotation;
        assert!((rotation + std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!(events.is_empty());
    }

    #[test]
    fn homing_projectile_hits_exactly_once() {
        let mut roster = EnemyRoster::new();
        let enemy = stationary_enemy(&mut roster, 3, 1_000);
        let mut projectile = Projectile {
            tower: TowerId::new(0),
            target: enemy,
            position: Vec2::new(0.5, 0.5),
            rotation: 0.0,
            speed: 5.0,
            damage: 20,
            time_to_live: TIME_TO_LIVE,
        };
        let mut events = Vec::new();

        let mut ticks = 0;
        while projectile.advance(TICK, &mut roster, &mut events) {
            ticks += 1;
            assert!(ticks < 100, "projectile never arrived");
        }

        assert_eq!(
            events,
            vec![Event::EnemyHit {
                enemy,
                damage: 20,
                remaining: Health::new(980),
            }]
        );
    }

    #[test]
    fn projectile_follows_a_moving_target() {
        let mut roster = EnemyRoster::new();
        let path: Vec<TileCoord> = (3..10).map(|column| TileCoord::new(column, 0)).collect();
        let enemy = roster.spawn(
            EnemyKind::Basic,
            Health::new(100),
            1.0,
            Gold::new(5),
            &path,
        );
        let mut projectile = Projectile {
            tower: TowerId::new(0),
            target: enemy,
            position: Vec2::new(0.5, 0.5),
            rotation: 0.0,
            speed: 5.0,
            damage: 20,
            time_to_live: TIME_TO_LIVE,
        };
        let mut events = Vec::new();

        let mut ticks = 0;
        while projectile.advance(TICK, &mut roster, &mut events) {
            roster.advance_all(&path, TICK, 1, &mut events);
            ticks += 1;
            assert!(ticks < 100, "projectile never caught up");
        }

        let position = roster
            .get(enemy)
            .map(|enemy| enemy.snapshot().position)
            .expect("enemy still on the path");
        assert!(position.column() > 4.0);
        assert!((projectile.position.x - position.column()).abs() < ARRIVAL_THRESHOLD);
        assert_eq!(
            events,
            vec![Event::EnemyHit {
                enemy,
                damage: 20,
                remaining: Health::new(80),
            }]
        );
    }

    #[test]
    fn projectile_expires_when_target_is_gone() {
        let mut roster = EnemyRoster::new();
        let enemy = stationary_enemy(&mut roster, 4, 10);
        let mut events = Vec::new();
        roster
            .get_mut(enemy)
            .expect("enemy")
            .hit(10, &mut events);
        events.clear();

        let mut projectile = Projectile {
            tower: TowerId::new(2),
            target: enemy,
            position: Vec2::new(0.5, 0.5),
            rotation: 0.0,
            speed: 5.0,
            damage: 20,
            time_to_live: TIME_TO_LIVE,
        };

        assert!(!projectile.advance(TICK, &mut roster, &mut events));
        assert_eq!(
            events,
            vec![Event::ProjectileExpired {
                tower: TowerId::new(2),
                enemy,
            }]
        );
    }

    #[test]
    fn projectile_expires_after_time_to_live() {
        let mut roster = EnemyRoster::new();
        let enemy = stationary_enemy(&mut roster, 20, 10);
        let mut projectile = Projectile {
            tower: TowerId::new(0),
            target: enemy,
            position: Vec2::new(0.5, 0.5),
            rotation: 0.0,
            speed: 1.0,
            damage: 20,
            time_to_live: Duration::from_millis(250),
        };
        let mut events = Vec::new();

        let mut ticks = 0;
        while projectile.advance(TICK, &mut roster, &mut events) {
            ticks += 1;
        }

        assert_eq!(ticks, 3);
        assert!(matches!(events.as_slice(), [Event::ProjectileExpired { .. }]));
        assert_eq!(
            roster.get(enemy).map(|enemy| enemy.snapshot().health),
            Some(Health::new(10))
        );
    }

    #[test]
    fn registry_tracks_occupied_tiles() {
        let mut registry = TowerRegistry::new();
        let tile = TileCoord::new(2, 3);
        let first = registry.insert(
            TowerKind::Rocket,
            tile,
            TargetingStrategy::Random,
            TowerBlueprint::rocket().upgrades,
        );
        let second = registry.insert(
            TowerKind::Rocket,
            TileCoord::new(4, 3),
            TargetingStrategy::Random,
            TowerBlueprint::rocket().upgrades,
        );

        assert_eq!(first, TowerId::new(0));
        assert_eq!(second, TowerId::new(1));
        assert!(registry.is_occupied(tile));
        assert!(!registry.is_occupied(TileCoord::new(0, 0)));
        assert_eq!(registry.iter().count(), 2);
    }
}
