#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Rocket TD.
//!
//! The world owns the level layout, the live enemies and the towers with
//! their projectiles. Every mutation flows through [`apply`]; adapters and
//! systems observe the state through the [`query`] module.

mod enemies;
mod level;
mod towers;

use std::time::Duration;

use glam::Vec2;
use rocket_td_core::{
    duration_millis, BuildError, Command, Event, TileCoord, TileKind, TilePoint, TowerBlueprint,
    TowerKind, UpgradeError,
};
use serde::{Deserialize, Serialize};

use enemies::EnemyRoster;
use towers::TowerRegistry;

pub use level::{DecorationWeight, LayoutError, LayoutParams, Level};

/// Tunables shared by every entity of the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Build cost and upgrade tracks of the rocket tower.
    pub tower_blueprint: TowerBlueprint,
    /// Damage an enemy deals to the base when it finishes the path.
    pub base_damage: u32,
    /// Flight time after which a projectile expires without a hit.
    #[serde(with = "duration_millis")]
    pub projectile_time_to_live: Duration,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tower_blueprint: TowerBlueprint::rocket(),
            base_damage: 1,
            projectile_time_to_live: Duration::from_millis(5_000),
        }
    }
}

/// Represents the authoritative Rocket TD world state.
#[derive(Debug)]
pub struct World {
    level: Level,
    config: WorldConfig,
    enemies: EnemyRoster,
    towers: TowerRegistry,
    elapsed: Duration,
}

impl World {
    /// Creates an empty world on top of the provided level.
    #[must_use]
    pub fn new(level: Level, config: WorldConfig) -> Self {
        Self {
            level,
            config,
            enemies: EnemyRoster::new(),
            towers: TowerRegistry::new(),
            elapsed: Duration::ZERO,
        }
    }

    fn blueprint(&self, kind: TowerKind) -> &TowerBlueprint {
        match kind {
            TowerKind::Rocket => &self.config.tower_blueprint,
        }
    }

    fn check_build_site(&self, tile: TileCoord) -> Result<(), BuildError> {
        match self.level.tile(tile) {
            None => Err(BuildError::OutOfBounds),
            Some(TileKind::Buildable) if self.towers.is_occupied(tile) => {
                Err(BuildError::Occupied)
            }
            Some(TileKind::Buildable) => Ok(()),
            Some(_) => Err(BuildError::NotBuildable),
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::SpawnEnemy {
            kind,
            health,
            speed,
            kill_bonus,
        } => {
            let path = world.level.path();
            let enemy = world
                .enemies
                .spawn(kind, health, speed, kill_bonus, path);
            tracing::debug!(enemy = enemy.get(), ?kind, health = health.get(), "enemy spawned");
            out_events.push(Event::EnemySpawned {
                enemy,
                kind,
                tile: world.level.spawn(),
                health,
            });
        }
        Command::BuildTower {
            kind,
            tile,
            strategy,
        } => {
            if let Err(reason) = world.check_build_site(tile) {
                tracing::warn!(?kind, ?tile, ?reason, "tower build rejected");
                out_events.push(Event::TowerBuildRejected { kind, tile, reason });
                return;
            }

            let upgrades = world.blueprint(kind).upgrades;
            let tower = world.towers.insert(kind, tile, strategy, upgrades);
            tracing::debug!(tower = tower.get(), ?kind, ?tile, ?strategy, "tower built");
            out_events.push(Event::TowerBuilt { tower, kind, tile });
        }
        Command::UpgradeTower { tower, upgrade } => {
            let outcome = world
                .towers
                .get_mut(tower)
                .ok_or(UpgradeError::UnknownTower)
                .and_then(|state| state.upgrade(upgrade));
            match outcome {
                Ok(level) => out_events.push(Event::TowerUpgraded {
                    tower,
                    upgrade,
                    level,
                }),
                Err(reason) => {
                    tracing::warn!(tower = tower.get(), ?upgrade, ?reason, "tower upgrade rejected");
                    out_events.push(Event::TowerUpgradeRejected {
                        tower,
                        upgrade,
                        reason,
                    });
                }
            }
        }
        Command::AssignTarget { tower, enemy } => {
            let targetable = world
                .enemies
                .get(enemy)
                .is_some_and(|state| state.is_targetable());
            if !targetable {
                return;
            }
            if let Some(state) = world.towers.get_mut(tower) {
                state.assign_target(enemy);
                out_events.push(Event::TargetAcquired { tower, enemy });
            }
        }
        Command::UpdateTower { tower, dt } => {
            let time_to_live = world.config.projectile_time_to_live;
            if let Some(state) = world.towers.get_mut(tower) {
                state.update(dt, &mut world.enemies, time_to_live, out_events);
            }
        }
        Command::AdvanceEnemies { dt } => {
            world.enemies.advance_all(
                world.level.path(),
                dt,
                world.config.base_damage,
                out_events,
            );
        }
    }
}

pub(crate) fn tile_center(coord: TileCoord) -> Vec2 {
    Vec2::new(coord.column() as f32 + 0.5, coord.row() as f32 + 0.5)
}

pub(crate) fn to_point(position: Vec2) -> TilePoint {
    TilePoint::new(position.x, position.y)
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use rocket_td_core::{
        EnemyView, Gold, ProjectileSnapshot, TowerId, TowerKind, TowerSnapshot, TowerUpgrades,
        TowerView,
    };

    use super::{Level, World, WorldConfig};

    /// Provides read-only access to the level layout and its path.
    #[must_use]
    pub fn level(world: &World) -> &Level {
        &world.level
    }

    /// Tunables the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Captures a read-only view of the live enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.iter().map(|enemy| enemy.snapshot()).collect())
    }

    /// Number of enemies that have not been removed yet.
    #[must_use]
    pub fn live_enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Captures a read-only view of every tower.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Snapshot of a single tower.
    #[must_use]
    pub fn tower(world: &World, tower: TowerId) -> Option<TowerSnapshot> {
        world.towers.get(tower).map(|state| state.snapshot())
    }

    /// Upgrade tracks of a tower, including levels and next costs.
    #[must_use]
    pub fn tower_upgrade_options(world: &World, tower: TowerId) -> Option<TowerUpgrades> {
        world.towers.get(tower).map(|state| *state.upgrades())
    }

    /// Currency required to build a tower of the provided kind.
    #[must_use]
    pub fn tower_build_cost(world: &World, kind: TowerKind) -> Gold {
        world.blueprint(kind).build_cost
    }

    /// Every projectile in flight, grouped by tower in identifier order.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .towers
            .iter()
            .flat_map(|tower| tower.projectile_snapshots())
            .collect()
    }

    /// Total simulated time.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket_td_core::{EnemyId, EnemyKind, Gold, Health, TargetingStrategy, TowerId, UpgradeKind};

    fn corridor_world() -> World {
        let path = (0..5).map(|column| TileCoord::new(column, 1)).collect();
        let buildable = [TileCoord::new(1, 0), TileCoord::new(2, 0), TileCoord::new(3, 2)];
        let level = Level::from_path(5, 3, path, &buildable).expect("corridor level");
        World::new(level, WorldConfig::default())
    }

    fn build(world: &mut World, tile: TileCoord) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::BuildTower {
                kind: TowerKind::Rocket,
                tile,
                strategy: TargetingStrategy::InsertionOrder,
            },
            &mut events,
        );
        events
    }

    #[test]
    fn tick_accumulates_elapsed_time() {
        let mut world = corridor_world();
        let mut events = Vec::new();
        let dt = Duration::from_millis(16);

        apply(&mut world, Command::Tick { dt }, &mut events);
        apply(&mut world, Command::Tick { dt }, &mut events);

        assert_eq!(query::elapsed(&world), Duration::from_millis(32));
        assert_eq!(events, vec![Event::TimeAdvanced { dt }, Event::TimeAdvanced { dt }]);
    }

    #[test]
    fn spawned_enemies_start_at_the_spawn_tile() {
        let mut world = corridor_world();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::TankGreen,
                health: Health::new(500),
                speed: 0.5,
                kill_bonus: Gold::new(50),
            },
            &mut events,
        );

        let view = query::enemy_view(&world);
        let enemy = view.iter().next().expect("spawned enemy");
        assert_eq!(enemy.position, TileCoord::new(0, 1).center());
        assert_eq!(enemy.path_index, 1);
        assert_eq!(
            events,
            vec![Event::EnemySpawned {
                enemy: enemy.id,
                kind: EnemyKind::TankGreen,
                tile: TileCoord::new(0, 1),
                health: Health::new(500),
            }]
        );
    }

    #[test]
    fn build_requests_are_validated() {
        let mut world = corridor_world();

        let built = build(&mut world, TileCoord::new(1, 0));
        assert_eq!(
            built,
            vec![Event::TowerBuilt {
                tower: TowerId::new(0),
                kind: TowerKind::Rocket,
                tile: TileCoord::new(1, 0),
            }]
        );

        let rejected = |tile: TileCoord, reason: BuildError| {
            vec![Event::TowerBuildRejected {
                kind: TowerKind::Rocket,
                tile,
                reason,
            }]
        };
        assert_eq!(
            build(&mut world, TileCoord::new(1, 0)),
            rejected(TileCoord::new(1, 0), BuildError::Occupied)
        );
        assert_eq!(
            build(&mut world, TileCoord::new(2, 1)),
            rejected(TileCoord::new(2, 1), BuildError::NotBuildable)
        );
        assert_eq!(
            build(&mut world, TileCoord::new(9, 9)),
            rejected(TileCoord::new(9, 9), BuildError::OutOfBounds)
        );
        assert_eq!(query::tower_view(&world).iter().count(), 1);
    }

    #[test]
    fn upgrades_advance_one_level_until_maxed() {
        let mut world = corridor_world();
        let _ = build(&mut world, TileCoord::new(2, 0));
        let tower = TowerId::new(0);
        let max_level = query::tower_upgrade_options(&world, tower)
            .expect("tower")
            .range
            .max_level();

        for expected in 1..=max_level {
            let before = query::tower_upgrade_options(&world, tower).expect("tower");
            let mut events = Vec::new();
            apply(
                &mut world,
                Command::UpgradeTower {
                    tower,
                    upgrade: UpgradeKind::Range,
                },
                &mut events,
            );
            let after = query::tower_upgrade_options(&world, tower).expect("tower");

            assert_eq!(after.range.current_level(), before.range.current_level() + 1);
            assert!(after.range() > before.range());
            assert_eq!(
                events,
                vec![Event::TowerUpgraded {
                    tower,
                    upgrade: UpgradeKind::Range,
                    level: expected,
                }]
            );
        }

        let before = query::tower_upgrade_options(&world, tower).expect("tower");
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::UpgradeTower {
                tower,
                upgrade: UpgradeKind::Range,
            },
            &mut events,
        );
        assert_eq!(query::tower_upgrade_options(&world, tower), Some(before));
        assert_eq!(
            events,
            vec![Event::TowerUpgradeRejected {
                tower,
                upgrade: UpgradeKind::Range,
                reason: UpgradeError::MaxLevelReached,
            }]
        );
    }

    #[test]
    fn upgrading_an_unknown_tower_is_rejected() {
        let mut world = corridor_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::UpgradeTower {
                tower: TowerId::new(7),
                upgrade: UpgradeKind::Damage,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::TowerUpgradeRejected {
                tower: TowerId::new(7),
                upgrade: UpgradeKind::Damage,
                reason: UpgradeError::UnknownTower,
            }]
        );
    }

    #[test]
    fn targets_that_left_the_level_are_not_assigned() {
        let mut world = corridor_world();
        let _ = build(&mut world, TileCoord::new(1, 0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AssignTarget {
                tower: TowerId::new(0),
                enemy: EnemyId::new(3),
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert_eq!(
            query::tower(&world, TowerId::new(0)).and_then(|tower| tower.target),
            None
        );
    }

    #[test]
    fn enemy_walking_the_whole_path_damages_the_base() {
        let mut world = World::new(
            Level::from_path(
                3,
                1,
                (0..3).map(|column| TileCoord::new(column, 0)).collect(),
                &[],
            )
            .expect("level"),
            WorldConfig {
                base_damage: 4,
                ..WorldConfig::default()
            },
        );
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Basic,
                health: Health::new(100),
                speed: 1.0,
                kill_bonus: Gold::new(10),
            },
            &mut events,
        );

        for _ in 0..40 {
            apply(
                &mut world,
                Command::AdvanceEnemies {
                    dt: Duration::from_millis(100),
                },
                &mut events,
            );
        }

        assert_eq!(query::live_enemy_count(&world), 0);
        assert!(events.contains(&Event::EnemyReachedBase {
            enemy: EnemyId::new(0),
            damage: 4,
        }));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::EnemyKilled { .. })));
    }
}
