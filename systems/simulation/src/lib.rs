#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame-driven orchestration of the Rocket TD systems.
//!
//! A [`Simulation`] owns the world, the wave scheduler and the targeting
//! system. [`Simulation::calculate`] advances all of them by one frame in a
//! fixed order, so a seed plus a sequence of frame durations and player
//! actions always replays to the same event log.

mod config;

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rocket_td_core::{
    Command, EnemyKind, Event, Gold, Health, TargetingStrategy, TileCoord, TowerId, TowerKind,
    UpgradeKind,
};
use rocket_td_system_tower_targeting::{Config as TargetingConfig, TowerTargeting};
use rocket_td_system_waves::WaveScheduler;
use rocket_td_world::{self as world, query, Level, World};

pub use config::{
    derive_labeled_seed, ConfigError, GameConfig, WaveSource, RNG_STREAM_LAYOUT,
    RNG_STREAM_TARGETING,
};

/// Explicit context object holding every piece of game state.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    waves: WaveScheduler,
    targeting: TowerTargeting,
    commands: Vec<Command>,
    tower_ids: Vec<TowerId>,
}

impl Simulation {
    /// Lays out a fresh level and prepares the configured waves.
    pub fn new(config: &GameConfig) -> Result<Self, ConfigError> {
        let mut layout_rng = ChaCha8Rng::seed_from_u64(config.stream_seed(RNG_STREAM_LAYOUT));
        let level = Level::build(&config.layout, &mut layout_rng)?;
        Ok(Self::with_level(level, config))
    }

    /// Starts a game on a level that was laid out elsewhere.
    #[must_use]
    pub fn with_level(level: Level, config: &GameConfig) -> Self {
        let waves = WaveScheduler::new(config.waves.resolve());
        tracing::info!(
            seed = config.seed,
            waves = waves.wave_count(),
            path_length = level.path().len(),
            "simulation ready"
        );
        Self {
            world: World::new(level, config.world.clone()),
            waves,
            targeting: TowerTargeting::new(TargetingConfig::new(
                config.stream_seed(RNG_STREAM_TARGETING),
            )),
            commands: Vec::new(),
            tower_ids: Vec::new(),
        }
    }

    /// Read-only access to the world for queries and rendering.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Read-only access to the wave scheduler.
    #[must_use]
    pub fn waves(&self) -> &WaveScheduler {
        &self.waves
    }

    /// Reports whether every wave was released and every enemy is gone.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.waves.is_finished() && query::live_enemy_count(&self.world) == 0
    }

    /// Advances the whole game by one frame.
    ///
    /// The scheduler spawns first, then every tower in identifier order
    /// acquires a target unless it is engaged with a live one and updates,
    /// then the enemies move.
    /// Once no enemy is left the scheduler is told to begin the next wave.
    pub fn calculate(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        world::apply(&mut self.world, Command::Tick { dt }, out_events);

        self.commands.clear();
        self.waves.tick(dt, &mut self.commands);
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, out_events);
        }

        self.tower_ids.clear();
        self.tower_ids
            .extend(query::tower_view(&self.world).iter().map(|tower| tower.id));
        for &tower_id in &self.tower_ids {
            let Some(tower) = query::tower(&self.world, tower_id) else {
                continue;
            };

            self.commands.clear();
            self.targeting
                .handle(&tower, &query::enemy_view(&self.world), &mut self.commands);
            for command in self.commands.drain(..) {
                world::apply(&mut self.world, command, out_events);
            }

            world::apply(
                &mut self.world,
                Command::UpdateTower { tower: tower_id, dt },
                out_events,
            );
        }

        world::apply(&mut self.world, Command::AdvanceEnemies { dt }, out_events);

        if query::live_enemy_count(&self.world) == 0 {
            self.waves.begin_next_wave();
        }
    }

    /// Places an enemy at the spawn tile outside of the wave schedule.
    pub fn add_enemy(
        &mut self,
        kind: EnemyKind,
        health: Health,
        speed: f32,
        kill_bonus: Gold,
        out_events: &mut Vec<Event>,
    ) {
        world::apply(
            &mut self.world,
            Command::SpawnEnemy {
                kind,
                health,
                speed,
                kill_bonus,
            },
            out_events,
        );
    }

    /// Requests a tower on the provided tile.
    ///
    /// Currency is not checked; callers compare
    /// [`query::tower_build_cost`] against their own balance first.
    pub fn on_build_tower(
        &mut self,
        kind: TowerKind,
        tile: TileCoord,
        strategy: TargetingStrategy,
        out_events: &mut Vec<Event>,
    ) {
        world::apply(
            &mut self.world,
            Command::BuildTower {
                kind,
                tile,
                strategy,
            },
            out_events,
        );
    }

    /// Requests one more level of an upgrade track.
    pub fn on_upgrade_tower(
        &mut self,
        tower: TowerId,
        upgrade: UpgradeKind,
        out_events: &mut Vec<Event>,
    ) {
        world::apply(
            &mut self.world,
            Command::UpgradeTower { tower, upgrade },
            out_events,
        );
    }
}
