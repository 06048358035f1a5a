//! Game configuration and deterministic seed derivation.

use rocket_td_core::WaveSpec;
use rocket_td_system_waves::{default_waves, generate_waves, WaveGenerationParams};
use rocket_td_world::{LayoutError, LayoutParams, WorldConfig};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Label of the random stream that lays out the level.
pub const RNG_STREAM_LAYOUT: &str = "layout";
/// Label of the random stream that shuffles random targeting orders.
pub const RNG_STREAM_TARGETING: &str = "targeting";

/// Failures reported while loading a configuration or setting up a game.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("failed to parse game configuration")]
    Parse(#[from] toml::de::Error),
    /// The level could not be laid out.
    #[error("failed to lay out the level")]
    Layout(#[from] LayoutError),
}

/// Source of the wave table played by a game.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum WaveSource {
    /// The five hand-authored waves.
    #[default]
    Default,
    /// Waves with quadratically growing enemy counts.
    Generated(WaveGenerationParams),
    /// An explicit wave table.
    Custom {
        /// Waves played in order.
        waves: Vec<WaveSpec>,
    },
}

impl WaveSource {
    /// Resolves the wave table described by the source.
    #[must_use]
    pub fn resolve(&self) -> Vec<WaveSpec> {
        match self {
            Self::Default => default_waves(),
            Self::Generated(params) => generate_waves(params),
            Self::Custom { waves } => waves.clone(),
        }
    }
}

/// Complete description of a game session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Global seed from which every random stream is derived.
    pub seed: u64,
    /// Maze and decoration parameters of the level.
    pub layout: LayoutParams,
    /// Base damage, projectile lifetime and tower blueprint.
    pub world: WorldConfig,
    /// Wave table played during the session.
    pub waves: WaveSource,
}

impl GameConfig {
    /// Parses a configuration document; missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.layout.validate()?;
        Ok(config)
    }

    /// Seed of the random stream identified by `label`.
    #[must_use]
    pub fn stream_seed(&self, label: &str) -> u64 {
        derive_labeled_seed(self.seed, label)
    }
}

/// Derives an independent seed for a labelled random stream.
#[must_use]
pub fn derive_labeled_seed(base: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
