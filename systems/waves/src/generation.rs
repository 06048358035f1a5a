//! Built-in wave tables.

use std::time::Duration;

use rocket_td_core::{duration_millis, EnemyKind, Gold, Health, SpawnBlock, WaveSpec};
use serde::{Deserialize, Serialize};

const DEFAULT_COOLDOWN: Duration = Duration::from_millis(3_000);

/// Growth curve and stats of one enemy archetype in generated waves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeParams {
    /// Variant released by the archetype's blocks.
    pub kind: EnemyKind,
    /// Movement speed in tiles per second.
    pub speed: f32,
    /// Starting health of each enemy.
    pub health: Health,
    /// Currency awarded per kill.
    pub kill_bonus: Gold,
    /// Enemy count of the first wave.
    pub begin_count: f64,
    /// Linear growth of the count per wave.
    pub count_delta: f64,
    /// Quadratic growth of the count per wave.
    pub count_accel: f64,
    /// Delay preceding every spawn of the archetype's blocks.
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
}

impl ArchetypeParams {
    /// Number of enemies released in wave `index`:
    /// `floor(begin + delta * t + accel * t^2 / 2)`, never negative.
    #[must_use]
    pub fn count_at(&self, index: u32) -> u32 {
        let t = f64::from(index);
        let count = self.begin_count + self.count_delta * t + self.count_accel * t * t / 2.0;
        if count.is_finite() && count > 0.0 {
            count.floor().min(f64::from(u32::MAX)) as u32
        } else {
            0
        }
    }

    fn block(&self, count: u32) -> SpawnBlock {
        SpawnBlock {
            kind: self.kind,
            speed: self.speed,
            health: self.health,
            count,
            kill_bonus: self.kill_bonus,
            timeout: self.timeout,
        }
    }
}

/// Parameters of the procedural wave table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveGenerationParams {
    /// Number of waves to generate.
    pub wave_count: u32,
    /// Cooldown preceding every wave.
    #[serde(with = "duration_millis")]
    pub cooldown: Duration,
    /// Basic enemies.
    pub regular: ArchetypeParams,
    /// Fast basic enemies.
    pub fast_regular: ArchetypeParams,
    /// Slow armoured enemies.
    pub tank: ArchetypeParams,
    /// Fast armoured enemies.
    pub fast_tank: ArchetypeParams,
}

impl Default for WaveGenerationParams {
    fn default() -> Self {
        Self {
            wave_count: 100,
            cooldown: DEFAULT_COOLDOWN,
            regular: ArchetypeParams {
                kind: EnemyKind::Basic,
                speed: 1.0,
                health: Health::new(100),
                kill_bonus: Gold::new(10),
                begin_count: 5.0,
                count_delta: 5.0,
                count_accel: 5.0,
                timeout: Duration::from_millis(300),
            },
            fast_regular: ArchetypeParams {
                kind: EnemyKind::BasicFast,
                speed: 2.0,
                health: Health::new(100),
                kill_bonus: Gold::new(20),
                begin_count: 0.0,
                count_delta: 1.0,
                count_accel: 2.0,
                timeout: Duration::from_millis(500),
            },
            tank: ArchetypeParams {
                kind: EnemyKind::TankGreen,
                speed: 0.5,
                health: Health::new(500),
                kill_bonus: Gold::new(50),
                begin_count: 1.0,
                count_delta: 2.0,
                count_accel: 2.0,
                timeout: Duration::from_millis(1_000),
            },
            fast_tank: ArchetypeParams {
                kind: EnemyKind::TankWhite,
                speed: 1.0,
                health: Health::new(500),
                kill_bonus: Gold::new(100),
                begin_count: 0.0,
                count_delta: 1.0,
                count_accel: 2.0,
                timeout: Duration::from_millis(500),
            },
        }
    }
}

/// Generates a wave table whose enemy counts grow quadratically.
///
/// Each wave holds one block per archetype in the order regular, fast
/// regular, tank, fast tank; archetypes with a zero count are left out.
#[must_use]
pub fn generate_waves(params: &WaveGenerationParams) -> Vec<WaveSpec> {
    let archetypes = [
        &params.regular,
        &params.fast_regular,
        &params.tank,
        &params.fast_tank,
    ];

    (0..params.wave_count)
        .map(|index| WaveSpec {
            cooldown: params.cooldown,
            blocks: archetypes
                .iter()
                .filter_map(|archetype| {
                    let count = archetype.count_at(index);
                    (count > 0).then(|| archetype.block(count))
                })
                .collect(),
        })
        .collect()
}

/// The five hand-authored waves played when no other table is configured.
#[must_use]
pub fn default_waves() -> Vec<WaveSpec> {
    let block = |kind, speed, health, count, kill_bonus, timeout_ms| SpawnBlock {
        kind,
        speed,
        health: Health::new(health),
        count,
        kill_bonus: Gold::new(kill_bonus),
        timeout: Duration::from_millis(timeout_ms),
    };
    let wave = |blocks| WaveSpec {
        cooldown: DEFAULT_COOLDOWN,
        blocks,
    };

    vec![
        wave(vec![
            block(EnemyKind::Basic, 1.0, 50, 5, 10, 1_000),
            block(EnemyKind::TankGreen, 0.5, 100, 1, 20, 0),
        ]),
        wave(vec![
            block(EnemyKind::Basic, 2.0, 50, 10, 10, 300),
            block(EnemyKind::TankGreen, 1.0, 50, 5, 10, 1_000),
        ]),
        wave(vec![
            block(EnemyKind::Basic, 2.0, 50, 10, 15, 200),
            block(EnemyKind::TankGreen, 1.0, 50, 5, 10, 2_000),
            block(EnemyKind::Basic, 2.0, 50, 10, 15, 200),
        ]),
        wave(vec![
            block(EnemyKind::TankWhite, 2.0, 50, 5, 10, 2_000),
            block(EnemyKind::Basic, 2.0, 50, 50, 15, 200),
            block(EnemyKind::TankGreen, 1.0, 500, 2, 100, 8_000),
        ]),
        wave(vec![
            block(EnemyKind::TankWhite, 2.0, 500, 3, 10, 2_000),
            block(EnemyKind::Basic, 2.0, 50, 50, 15, 200),
            block(EnemyKind::TankGreen, 1.0, 100, 50, 100, 8_000),
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_follow_the_quadratic_curve() {
        let regular = WaveGenerationParams::default().regular;
        assert_eq!(regular.count_at(0), 5);
        assert_eq!(regular.count_at(1), 12);
        assert_eq!(regular.count_at(2), 25);
    }

    #[test]
    fn negative_counts_clamp_to_zero() {
        let archetype = ArchetypeParams {
            begin_count: -3.0,
            ..WaveGenerationParams::default().fast_tank
        };
        assert_eq!(archetype.count_at(0), 0);
        assert_eq!(archetype.count_at(1), 0);
        assert_eq!(archetype.count_at(2), 3);
    }

    #[test]
    fn default_table_has_five_waves() {
        let waves = default_waves();
        assert_eq!(waves.len(), 5);
        assert_eq!(waves[0].enemy_count(), 6);
        assert!(waves
            .iter()
            .all(|wave| wave.cooldown == Duration::from_secs(3)));
    }
}
