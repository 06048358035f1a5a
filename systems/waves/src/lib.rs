#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduler that paces enemy spawns and wave transitions.
//!
//! The scheduler is a pure state machine: it consumes elapsed time and emits
//! [`Command::SpawnEnemy`] values, at most one per tick. Advancing past a
//! finished wave requires an external [`WaveScheduler::begin_next_wave`]
//! signal, which the simulation sends once the level is clear.

mod generation;

use std::time::Duration;

use rocket_td_core::{Command, SpawnBlock, WaveSpec};

pub use generation::{default_waves, generate_waves, ArchetypeParams, WaveGenerationParams};

/// Phase of the wave state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WavePhase {
    /// Counting down the cooldown that precedes the current wave.
    AwaitingWaveCooldown,
    /// Releasing the enemies of the current spawn block.
    SpawningBlock,
    /// Every enemy of the current wave was released; waiting for the signal
    /// to begin the next wave.
    WaveComplete,
    /// The final wave was released.
    AllWavesFinished,
}

/// Deterministic scheduler walking through an ordered list of waves.
#[derive(Clone, Debug)]
pub struct WaveScheduler {
    waves: Vec<WaveSpec>,
    phase: WavePhase,
    wave_index: usize,
    block_index: usize,
    spawned_in_block: u32,
    cooldown_left: Duration,
    spawn_timer: Duration,
}

impl WaveScheduler {
    /// Creates a scheduler waiting for the cooldown of the first wave.
    #[must_use]
    pub fn new(waves: Vec<WaveSpec>) -> Self {
        let (phase, cooldown_left) = match waves.first() {
            Some(wave) => (WavePhase::AwaitingWaveCooldown, wave.cooldown),
            None => (WavePhase::AllWavesFinished, Duration::ZERO),
        };
        Self {
            waves,
            phase,
            wave_index: 0,
            block_index: 0,
            spawned_in_block: 0,
            cooldown_left,
            spawn_timer: Duration::ZERO,
        }
    }

    /// Current phase of the state machine.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Zero-based index of the wave being played or awaited.
    #[must_use]
    pub const fn current_wave(&self) -> usize {
        self.wave_index
    }

    /// Number of waves in the schedule.
    #[must_use]
    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    /// Description of the wave being played or awaited.
    #[must_use]
    pub fn current_wave_spec(&self) -> Option<&WaveSpec> {
        self.waves.get(self.wave_index)
    }

    /// Reports whether the final wave was released.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == WavePhase::AllWavesFinished
    }

    /// Advances the schedule by `dt`, emitting at most one spawn command.
    ///
    /// Time left over after a spawn is discarded, so a large `dt` never
    /// releases more than one enemy.
    pub fn tick(&mut self, dt: Duration, out: &mut Vec<Command>) {
        match self.phase {
            WavePhase::WaveComplete | WavePhase::AllWavesFinished => return,
            WavePhase::AwaitingWaveCooldown => {
                if !self.cooldown_left.is_zero() {
                    self.cooldown_left = self.cooldown_left.saturating_sub(dt);
                    return;
                }
                if !self.enter_block(0) {
                    self.finish_wave();
                    return;
                }
                self.phase = WavePhase::SpawningBlock;
                tracing::info!(
                    wave = self.wave_index + 1,
                    waves = self.waves.len(),
                    "wave started"
                );
            }
            WavePhase::SpawningBlock => {}
        }

        self.spawn_timer = self.spawn_timer.saturating_sub(dt);
        if !self.spawn_timer.is_zero() {
            return;
        }

        let Some(block) = self.current_block().cloned() else {
            self.finish_wave();
            return;
        };
        out.push(Command::SpawnEnemy {
            kind: block.kind,
            health: block.health,
            speed: block.speed,
            kill_bonus: block.kill_bonus,
        });
        tracing::debug!(
            wave = self.wave_index + 1,
            block = self.block_index,
            kind = ?block.kind,
            "enemy released"
        );
        self.spawn_timer = block.timeout;
        self.spawned_in_block = self.spawned_in_block.saturating_add(1);

        if self.spawned_in_block >= block.count && !self.enter_block(self.block_index + 1) {
            self.finish_wave();
        }
    }

    /// Leaves [`WavePhase::WaveComplete`] for the cooldown of the next wave.
    ///
    /// Has no effect in every other phase.
    pub fn begin_next_wave(&mut self) {
        if self.phase != WavePhase::WaveComplete {
            return;
        }
        let Some(cooldown) = self
            .waves
            .get(self.wave_index + 1)
            .map(|wave| wave.cooldown)
        else {
            self.phase = WavePhase::AllWavesFinished;
            return;
        };

        self.cooldown_left = cooldown;
        self.wave_index += 1;
        self.block_index = 0;
        self.spawned_in_block = 0;
        self.phase = WavePhase::AwaitingWaveCooldown;
        tracing::debug!(wave = self.wave_index + 1, "awaiting wave cooldown");
    }

    fn current_block(&self) -> Option<&SpawnBlock> {
        self.waves
            .get(self.wave_index)
            .and_then(|wave| wave.blocks.get(self.block_index))
    }

    /// Moves to the first block at or after `from` that releases any enemy.
    fn enter_block(&mut self, from: usize) -> bool {
        let Some(wave) = self.waves.get(self.wave_index) else {
            return false;
        };
        let Some((index, timeout)) = wave
            .blocks
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, block)| block.count > 0)
            .map(|(index, block)| (index, block.timeout))
        else {
            return false;
        };

        self.block_index = index;
        self.spawned_in_block = 0;
        self.spawn_timer = timeout;
        true
    }

    fn finish_wave(&mut self) {
        if self.wave_index + 1 >= self.waves.len() {
            self.phase = WavePhase::AllWavesFinished;
            tracing::info!(waves = self.waves.len(), "all waves released");
        } else {
            self.phase = WavePhase::WaveComplete;
            tracing::debug!(wave = self.wave_index + 1, "wave released");
        }
    }
}
