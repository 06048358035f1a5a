#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Rocket TD adapters.
//!
//! Game state is turned into a flat list of [`SpriteInstance`] values pushed
//! into a [`DisplaySink`]. Front ends decide how to present them; the
//! [`AsciiSink`] prints them as text.

mod ascii;
mod assets;

use glam::Vec2;
use rocket_td_core::{EnemySnapshot, ProjectileSnapshot, TilePoint, TowerSnapshot};
use rocket_td_world::{query, Level, World};

pub use ascii::AsciiSink;
pub use assets::{AssetKind, ManifestSink, SpriteManifest};

/// Single sprite positioned in tile units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteInstance {
    /// Asset to draw.
    pub asset: AssetKind,
    /// Centre of the sprite in tile units.
    pub position: Vec2,
    /// Heading in radians.
    pub rotation: f32,
    /// Remaining health in `0.0..=1.0` for sprites that carry a health bar.
    pub health_fraction: Option<f32>,
}

impl SpriteInstance {
    /// Creates an unrotated sprite without a health bar.
    #[must_use]
    pub fn new(asset: AssetKind, position: TilePoint) -> Self {
        Self {
            asset,
            position: Vec2::new(position.column(), position.row()),
            rotation: 0.0,
            health_fraction: None,
        }
    }

    /// Overrides the heading of the sprite.
    #[must_use]
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Attaches a health bar to the sprite.
    #[must_use]
    pub fn with_health_fraction(mut self, fraction: f32) -> Self {
        self.health_fraction = Some(fraction.clamp(0.0, 1.0));
        self
    }
}

/// Receiver of the sprites produced by [`Renderable`] values.
pub trait DisplaySink {
    /// Draws a sprite on top of everything drawn before it.
    fn draw(&mut self, sprite: SpriteInstance);
}

/// Anything that can describe itself as sprites.
pub trait Renderable {
    /// Pushes the sprites representing `self` into the sink.
    fn display(&self, sink: &mut dyn DisplaySink);
}

impl Renderable for Level {
    fn display(&self, sink: &mut dyn DisplaySink) {
        for (coord, tile) in self.tiles() {
            if let Some(asset) = AssetKind::for_tile(tile) {
                sink.draw(SpriteInstance::new(asset, coord.center()));
            }
        }
    }
}

impl Renderable for EnemySnapshot {
    fn display(&self, sink: &mut dyn DisplaySink) {
        if !self.is_targetable() {
            return;
        }
        sink.draw(
            SpriteInstance::new(AssetKind::Enemy(self.kind), self.position)
                .with_rotation(self.rotation)
                .with_health_fraction(self.health_fraction()),
        );
    }
}

impl Renderable for TowerSnapshot {
    fn display(&self, sink: &mut dyn DisplaySink) {
        sink.draw(
            SpriteInstance::new(AssetKind::Tower(self.kind), self.center())
                .with_rotation(self.rotation),
        );
    }
}

impl Renderable for ProjectileSnapshot {
    fn display(&self, sink: &mut dyn DisplaySink) {
        sink.draw(
            SpriteInstance::new(AssetKind::Rocket, self.position).with_rotation(self.rotation),
        );
    }
}

/// Draws the level, then towers, enemies and projectiles.
impl Renderable for World {
    fn display(&self, sink: &mut dyn DisplaySink) {
        query::level(self).display(sink);
        for tower in query::tower_view(self).iter() {
            tower.display(sink);
        }
        for enemy in query::enemy_view(self).iter() {
            enemy.display(sink);
        }
        for projectile in query::projectiles(self) {
            projectile.display(sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket_td_core::{
        Command, EnemyKind, Gold, Health, TargetingStrategy, TileCoord, TileKind, TowerKind,
    };
    use rocket_td_world::{apply, WorldConfig};

    #[derive(Default)]
    struct Recorder {
        sprites: Vec<SpriteInstance>,
    }

    impl DisplaySink for Recorder {
        fn draw(&mut self, sprite: SpriteInstance) {
            self.sprites.push(sprite);
        }
    }

    fn corridor() -> Level {
        Level::from_path(
            4,
            2,
            (0..4).map(|column| TileCoord::new(column, 1)).collect(),
            &[TileCoord::new(1, 0)],
        )
        .expect("corridor level")
    }

    #[test]
    fn level_skips_empty_ground() {
        let level = corridor();
        let mut recorder = Recorder::default();

        level.display(&mut recorder);

        let empty = level
            .tiles()
            .filter(|(_, tile)| *tile == TileKind::Empty)
            .count();
        assert_eq!(recorder.sprites.len(), 8 - empty);
        let spawn = recorder
            .sprites
            .iter()
            .find(|sprite| sprite.asset == AssetKind::Spawn)
            .expect("spawn sprite");
        assert_eq!(spawn.position, Vec2::new(0.5, 1.5));
    }

    #[test]
    fn world_draws_entities_above_the_level() {
        let mut world = World::new(corridor(), WorldConfig::default());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::BuildTower {
                kind: TowerKind::Rocket,
                tile: TileCoord::new(1, 0),
                strategy: TargetingStrategy::InsertionOrder,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::TankGreen,
                health: Health::new(40),
                speed: 1.0,
                kill_bonus: Gold::new(5),
            },
            &mut events,
        );
        let mut recorder = Recorder::default();

        world.display(&mut recorder);

        let entities: Vec<AssetKind> = recorder
            .sprites
            .iter()
            .map(|sprite| sprite.asset)
            .skip_while(|asset| !matches!(asset, AssetKind::Tower(_)))
            .collect();
        assert_eq!(
            entities,
            vec![
                AssetKind::Tower(TowerKind::Rocket),
                AssetKind::Enemy(EnemyKind::TankGreen),
            ]
        );
        let enemy = recorder.sprites.last().expect("enemy sprite");
        assert_eq!(enemy.health_fraction, Some(1.0));
    }
}
