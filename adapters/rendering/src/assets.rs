use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use rocket_td_core::{DecorationKind, EnemyKind, TileKind, TowerKind};

use crate::{DisplaySink, SpriteInstance};

const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Every drawable asset known to the front ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Path tile.
    Road,
    /// Tile that accepts a tower.
    Buildable,
    /// First path tile.
    Spawn,
    /// Last path tile.
    Base,
    /// Decorative prop.
    Decoration(DecorationKind),
    /// Enemy body.
    Enemy(EnemyKind),
    /// Tower turret.
    Tower(TowerKind),
    /// Projectile in flight.
    Rocket,
    /// Placeholder drawn for assets the manifest does not provide.
    Missing,
}

impl AssetKind {
    /// Every asset a complete manifest provides, in canonical order.
    pub const ALL: [AssetKind; 14] = [
        AssetKind::Road,
        AssetKind::Buildable,
        AssetKind::Spawn,
        AssetKind::Base,
        AssetKind::Decoration(DecorationKind::Stone),
        AssetKind::Decoration(DecorationKind::Bush),
        AssetKind::Decoration(DecorationKind::LargeBush),
        AssetKind::Enemy(EnemyKind::Basic),
        AssetKind::Enemy(EnemyKind::BasicFast),
        AssetKind::Enemy(EnemyKind::TankGreen),
        AssetKind::Enemy(EnemyKind::TankWhite),
        AssetKind::Tower(TowerKind::Rocket),
        AssetKind::Rocket,
        AssetKind::Missing,
    ];

    /// Asset drawn for a floor tile; empty ground has none.
    #[must_use]
    pub const fn for_tile(tile: TileKind) -> Option<Self> {
        match tile {
            TileKind::Empty => None,
            TileKind::Road => Some(Self::Road),
            TileKind::Buildable => Some(Self::Buildable),
            TileKind::Spawn => Some(Self::Spawn),
            TileKind::Base => Some(Self::Base),
            TileKind::Decoration(decoration) => Some(Self::Decoration(decoration)),
        }
    }

    /// Key used for the asset in sprite manifests.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Road => "road",
            Self::Buildable => "buildable",
            Self::Spawn => "spawn",
            Self::Base => "base",
            Self::Decoration(DecorationKind::Stone) => "stone",
            Self::Decoration(DecorationKind::Bush) => "bush",
            Self::Decoration(DecorationKind::LargeBush) => "large_bush",
            Self::Enemy(EnemyKind::Basic) => "enemy_basic",
            Self::Enemy(EnemyKind::BasicFast) => "enemy_basic_fast",
            Self::Enemy(EnemyKind::TankGreen) => "enemy_tank_green",
            Self::Enemy(EnemyKind::TankWhite) => "enemy_tank_white",
            Self::Tower(TowerKind::Rocket) => "tower_rocket",
            Self::Rocket => "rocket",
            Self::Missing => "missing",
        }
    }

    /// Resolves a manifest key.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|asset| asset.name() == name)
    }

    /// Character used by text front ends.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Road => '.',
            Self::Buildable => '+',
            Self::Spawn => 'S',
            Self::Base => 'B',
            Self::Decoration(DecorationKind::Stone) => 'o',
            Self::Decoration(DecorationKind::Bush) => '"',
            Self::Decoration(DecorationKind::LargeBush) => '%',
            Self::Enemy(EnemyKind::Basic) => 'e',
            Self::Enemy(EnemyKind::BasicFast) => 'f',
            Self::Enemy(EnemyKind::TankGreen) => 't',
            Self::Enemy(EnemyKind::TankWhite) => 'T',
            Self::Tower(TowerKind::Rocket) => 'R',
            Self::Rocket => '*',
            Self::Missing => '?',
        }
    }
}

/// Image files backing each asset, resolved from a TOML manifest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpriteManifest {
    sprites: HashMap<AssetKind, PathBuf>,
}

impl SpriteManifest {
    /// Loads the manifest stored at the provided path.
    ///
    /// Sprite paths are resolved relative to the manifest's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let manifest_path = path.as_ref();
        let contents = fs::read_to_string(manifest_path).with_context(|| {
            format!(
                "failed to read sprite manifest at {}",
                manifest_path.display()
            )
        })?;
        let base = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::parse(&contents, &base)
    }

    /// Parses manifest contents, resolving sprite paths against `base_path`.
    ///
    /// Unknown keys are logged and skipped.
    pub fn parse(contents: &str, base_path: &Path) -> Result<Self> {
        let manifest: Manifest =
            toml::from_str(contents).context("failed to parse sprite manifest toml contents")?;
        if manifest.version != SUPPORTED_MANIFEST_VERSION {
            bail!(
                "unsupported sprite manifest version {}; expected {}",
                manifest.version,
                SUPPORTED_MANIFEST_VERSION
            );
        }

        let mut sprites = HashMap::with_capacity(manifest.sprites.len());
        for (name, relative_path) in manifest.sprites {
            let Some(asset) = AssetKind::from_name(&name) else {
                tracing::error!(key = %name, "unknown sprite key in manifest");
                continue;
            };
            let _ = sprites.insert(asset, base_path.join(relative_path));
        }
        Ok(Self { sprites })
    }

    /// Image backing the asset, if the manifest lists one.
    #[must_use]
    pub fn path(&self, asset: AssetKind) -> Option<&Path> {
        self.sprites.get(&asset).map(PathBuf::as_path)
    }

    /// Asset to draw in place of `asset`, falling back to
    /// [`AssetKind::Missing`] when the manifest lacks it.
    #[must_use]
    pub fn resolve(&self, asset: AssetKind) -> AssetKind {
        if self.sprites.contains_key(&asset) {
            asset
        } else {
            AssetKind::Missing
        }
    }

    /// Assets of [`AssetKind::ALL`] the manifest does not provide.
    pub fn missing(&self) -> impl Iterator<Item = AssetKind> + '_ {
        AssetKind::ALL
            .into_iter()
            .filter(|asset| !self.sprites.contains_key(asset))
    }
}

/// Sink adapter that draws [`AssetKind::Missing`] for assets the manifest lacks.
pub struct ManifestSink<'a> {
    manifest: &'a SpriteManifest,
    inner: &'a mut dyn DisplaySink,
}

impl<'a> ManifestSink<'a> {
    /// Wraps `inner`, resolving every sprite through `manifest` first.
    pub fn new(manifest: &'a SpriteManifest, inner: &'a mut dyn DisplaySink) -> Self {
        Self { manifest, inner }
    }
}

impl DisplaySink for ManifestSink<'_> {
    fn draw(&mut self, mut sprite: SpriteInstance) {
        sprite.asset = self.manifest.resolve(sprite.asset);
        self.inner.draw(sprite);
    }
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    #[serde(default)]
    sprites: HashMap<String, String>,
}
