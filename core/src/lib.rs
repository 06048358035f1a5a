#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Rocket TD engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what happened. Systems read immutable snapshots such as
//! [`EnemyView`] and [`TowerView`] and respond exclusively with new command
//! batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Distance below which a moving entity counts as having reached its goal.
pub const ARRIVAL_THRESHOLD: f32 = 0.2;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a new enemy enters the level at the spawn tile.
    SpawnEnemy {
        /// Variant of enemy to create.
        kind: EnemyKind,
        /// Starting and maximum health of the enemy.
        health: Health,
        /// Movement speed measured in tiles per second.
        speed: f32,
        /// Currency awarded when the enemy is killed by damage.
        kill_bonus: Gold,
    },
    /// Requests construction of a tower on the provided tile.
    BuildTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Tile that should host the tower.
        tile: TileCoord,
        /// Policy the tower uses when choosing a target.
        strategy: TargetingStrategy,
    },
    /// Requests purchase of a single upgrade level for a tower.
    UpgradeTower {
        /// Identifier of the tower being upgraded.
        tower: TowerId,
        /// Upgrade track that should advance by one level.
        upgrade: UpgradeKind,
    },
    /// Assigns the enemy a tower should engage next.
    AssignTarget {
        /// Tower receiving the assignment.
        tower: TowerId,
        /// Enemy the tower should aim at.
        enemy: EnemyId,
    },
    /// Advances a single tower: aiming, reloading, firing and projectile flight.
    UpdateTower {
        /// Tower to update.
        tower: TowerId,
        /// Duration of simulated time the tower should advance by.
        dt: Duration,
    },
    /// Moves every live enemy along the level path.
    AdvanceEnemies {
        /// Duration of simulated time the enemies should advance by.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy entered the level.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Variant of the spawned enemy.
        kind: EnemyKind,
        /// Tile the enemy appeared on.
        tile: TileCoord,
        /// Health the enemy starts with.
        health: Health,
    },
    /// Confirms that a tower was built.
    TowerBuilt {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Type of tower that was built.
        kind: TowerKind,
        /// Tile occupied by the tower.
        tile: TileCoord,
    },
    /// Reports that a build request was rejected without changing state.
    TowerBuildRejected {
        /// Type of tower requested.
        kind: TowerKind,
        /// Tile provided in the request.
        tile: TileCoord,
        /// Specific reason the build failed.
        reason: BuildError,
    },
    /// Confirms that a tower upgrade track advanced by one level.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Upgrade track that advanced.
        upgrade: UpgradeKind,
        /// Level of the track after the purchase.
        level: u32,
    },
    /// Reports that an upgrade request was rejected without changing state.
    TowerUpgradeRejected {
        /// Identifier supplied in the request.
        tower: TowerId,
        /// Upgrade track supplied in the request.
        upgrade: UpgradeKind,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Announces that a tower locked onto an enemy.
    TargetAcquired {
        /// Tower that acquired the target.
        tower: TowerId,
        /// Enemy that became the tower's target.
        enemy: EnemyId,
    },
    /// Announces that a tower launched a projectile.
    ProjectileFired {
        /// Tower that owns the projectile.
        tower: TowerId,
        /// Enemy the projectile is homing toward.
        enemy: EnemyId,
    },
    /// Reports that a projectile disappeared without dealing damage.
    ProjectileExpired {
        /// Tower that owned the projectile.
        tower: TowerId,
        /// Enemy the projectile was homing toward.
        enemy: EnemyId,
    },
    /// Reports that a projectile damaged an enemy that survived the hit.
    EnemyHit {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Damage applied by the hit.
        damage: u32,
        /// Health left after the hit.
        remaining: Health,
    },
    /// Reports that an enemy was destroyed by damage.
    EnemyKilled {
        /// Enemy that was destroyed.
        enemy: EnemyId,
        /// Damage applied by the final hit.
        damage: u32,
        /// Currency awarded for the kill.
        kill_bonus: Gold,
    },
    /// Reports that an enemy walked past the final path waypoint.
    EnemyFinishedPath {
        /// Enemy that finished its path.
        enemy: EnemyId,
    },
    /// Reports that a finished enemy was consumed by the base.
    EnemyReachedBase {
        /// Enemy that reached the base.
        enemy: EnemyId,
        /// Damage dealt to the player's base.
        damage: u32,
    },
    /// Confirms that a destroyed enemy left the live enemy list.
    EnemyRemoved {
        /// Enemy that was removed.
        enemy: EnemyId,
    },
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Hit points carried by an enemy.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Health(u32);

impl Health {
    /// Health value of a destroyed enemy.
    pub const ZERO: Self = Self(0);

    /// Creates a new health value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the health value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Reports whether no health remains.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtracts damage, clamping at zero.
    #[must_use]
    pub const fn saturating_sub(self, damage: u32) -> Self {
        Self(self.0.saturating_sub(damage))
    }
}

/// Amount of in-game currency.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Gold(u32);

impl Gold {
    /// Creates a new currency amount.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the amount.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Continuous point located at the centre of the tile.
    #[must_use]
    pub fn center(self) -> TilePoint {
        TilePoint::new(self.column as f32 + 0.5, self.row as f32 + 0.5)
    }
}

/// Continuous position measured in tile units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TilePoint {
    column: f32,
    row: f32,
}

impl TilePoint {
    /// Creates a new point from column and row components.
    #[must_use]
    pub const fn new(column: f32, row: f32) -> Self {
        Self { column, row }
    }

    /// Horizontal component measured in tiles.
    #[must_use]
    pub const fn column(&self) -> f32 {
        self.column
    }

    /// Vertical component measured in tiles.
    #[must_use]
    pub const fn row(&self) -> f32 {
        self.row
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: TilePoint) -> f32 {
        (self.column - other.column).hypot(self.row - other.row)
    }
}

/// Floor tile variants that compose a level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Unused ground.
    #[default]
    Empty,
    /// Tile along the enemy path.
    Road,
    /// Tile that accepts a tower.
    Buildable,
    /// First tile of the path where enemies appear.
    Spawn,
    /// Last tile of the path guarded by the player.
    Base,
    /// Purely visual prop.
    Decoration(DecorationKind),
}

impl TileKind {
    /// Reports whether enemies travel over the tile.
    #[must_use]
    pub const fn is_path(self) -> bool {
        matches!(self, Self::Road | Self::Spawn | Self::Base)
    }
}

/// Props scattered over empty tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecorationKind {
    /// Small rock.
    Stone,
    /// Single bush.
    Bush,
    /// Cluster of bushes.
    LargeBush,
}

/// Read-only view into a dense, row-major tile map.
#[derive(Clone, Copy, Debug)]
pub struct TileMapView<'a> {
    tiles: &'a [TileKind],
    columns: u32,
    rows: u32,
}

impl<'a> TileMapView<'a> {
    /// Captures a new view backed by the provided tile slice.
    #[must_use]
    pub fn new(tiles: &'a [TileKind], columns: u32, rows: u32) -> Self {
        Self {
            tiles,
            columns,
            rows,
        }
    }

    /// Returns the tile stored at the provided coordinate.
    #[must_use]
    pub fn tile(&self, coord: TileCoord) -> Option<TileKind> {
        if coord.column() >= self.columns || coord.row() >= self.rows {
            return None;
        }
        let row = usize::try_from(coord.row()).ok()?;
        let column = usize::try_from(coord.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        self.tiles.get(row * width + column).copied()
    }

    /// Iterates over every tile together with its coordinate in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, TileKind)> + 'a {
        let columns = self.columns.max(1);
        self.tiles.iter().enumerate().map(move |(index, kind)| {
            let index = index as u32;
            (TileCoord::new(index % columns, index / columns), *kind)
        })
    }

    /// Provides the dimensions of the underlying tile map.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }
}

/// Enemy variants that may appear in a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Regular soldier.
    Basic,
    /// Faster variant of the regular soldier.
    BasicFast,
    /// Slow armoured tank.
    TankGreen,
    /// Armoured tank with doubled speed.
    TankWhite,
}

/// Types of towers that can be constructed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TowerKind {
    /// Tower launching homing rockets.
    #[default]
    Rocket,
}

impl TowerKind {
    /// Resolves a tower kind from its configuration name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rocket" => Some(Self::Rocket),
            _ => None,
        }
    }
}

/// Upgrade tracks available on a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    /// Damage dealt by each projectile.
    Damage,
    /// Radius within which targets are acquired.
    Range,
    /// Time between consecutive shots.
    ReloadTime,
    /// Flight speed of projectiles.
    ProjectileSpeed,
}

impl UpgradeKind {
    /// Every upgrade track in presentation order.
    pub const ALL: [UpgradeKind; 4] = [
        Self::Damage,
        Self::Range,
        Self::ReloadTime,
        Self::ProjectileSpeed,
    ];
}

/// Policy a tower uses to order in-range enemies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetingStrategy {
    /// Engage the enemy with the least health first.
    LowestHealth,
    /// Engage the enemy with the most health first.
    HighestHealth,
    /// Engage enemies in a uniformly shuffled order.
    Random,
    /// Engage enemies in the order they entered the level.
    #[default]
    InsertionOrder,
}

impl TargetingStrategy {
    /// Resolves a strategy from its configuration name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lowest-health" => Some(Self::LowestHealth),
            "highest-health" => Some(Self::HighestHealth),
            "random" => Some(Self::Random),
            "insertion-order" => Some(Self::InsertionOrder),
            _ => None,
        }
    }
}

/// Reasons a tower build request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildError {
    /// The requested tile lies outside the level.
    OutOfBounds,
    /// The requested tile is not a buildable tile.
    NotBuildable,
    /// Another tower already occupies the tile.
    Occupied,
}

/// Reasons a tower upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeError {
    /// No tower with the provided identifier exists.
    UnknownTower,
    /// The upgrade track already sits at its maximum level.
    MaxLevelReached,
}

/// Value that grows linearly with the upgrade level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearCurve {
    /// Value at level zero.
    pub base: f32,
    /// Change applied per purchased level.
    pub step: f32,
}

impl LinearCurve {
    /// Creates a new curve.
    #[must_use]
    pub const fn new(base: f32, step: f32) -> Self {
        Self { base, step }
    }

    /// Evaluates the curve at the provided level.
    #[must_use]
    pub fn at(&self, level: u32) -> f32 {
        self.base + self.step * level as f32
    }
}

/// Currency cost that grows linearly with the upgrade level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCurve {
    /// Cost of the first purchase.
    pub base: Gold,
    /// Additional cost for every level already purchased.
    pub step: Gold,
}

impl CostCurve {
    /// Creates a new cost curve.
    #[must_use]
    pub const fn new(base: Gold, step: Gold) -> Self {
        Self { base, step }
    }

    /// Cost of buying the level that follows `level`.
    #[must_use]
    pub fn at(&self, level: u32) -> Gold {
        Gold::new(
            self.base
                .get()
                .saturating_add(self.step.get().saturating_mul(level)),
        )
    }
}

/// Single upgrade track of a tower.
///
/// The level only ever increases, by exactly one per purchase, and never
/// exceeds `max_level`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeOption {
    level: u32,
    max_level: u32,
    cost: CostCurve,
    value: LinearCurve,
}

impl UpgradeOption {
    /// Creates a track at level zero.
    #[must_use]
    pub const fn new(max_level: u32, cost: CostCurve, value: LinearCurve) -> Self {
        Self {
            level: 0,
            max_level,
            cost,
            value,
        }
    }

    /// Number of purchased levels.
    #[must_use]
    pub const fn current_level(&self) -> u32 {
        self.level
    }

    /// Highest level the track may reach.
    #[must_use]
    pub const fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Reports whether no further purchase is possible.
    #[must_use]
    pub const fn is_maxed(&self) -> bool {
        self.level >= self.max_level
    }

    /// Value of the track at the current level.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.value.at(self.level)
    }

    /// Cost of the next purchase, or `None` once the track is maxed.
    #[must_use]
    pub fn next_cost(&self) -> Option<Gold> {
        if self.is_maxed() {
            None
        } else {
            Some(self.cost.at(self.level))
        }
    }

    /// Advances the track by one level.
    pub fn upgrade(&mut self) -> Result<u32, UpgradeError> {
        if self.is_maxed() {
            return Err(UpgradeError::MaxLevelReached);
        }
        self.level += 1;
        Ok(self.level)
    }
}

/// Complete set of upgrade tracks carried by a tower.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerUpgrades {
    /// Damage dealt per projectile.
    pub damage: UpgradeOption,
    /// Acquisition radius in tiles.
    pub range: UpgradeOption,
    /// Time between shots in milliseconds.
    pub reload_time: UpgradeOption,
    /// Projectile speed in tiles per second.
    pub projectile_speed: UpgradeOption,
}

impl TowerUpgrades {
    /// Retrieves the track associated with the upgrade kind.
    #[must_use]
    pub const fn get(&self, kind: UpgradeKind) -> &UpgradeOption {
        match kind {
            UpgradeKind::Damage => &self.damage,
            UpgradeKind::Range => &self.range,
            UpgradeKind::ReloadTime => &self.reload_time,
            UpgradeKind::ProjectileSpeed => &self.projectile_speed,
        }
    }

    /// Retrieves a mutable track associated with the upgrade kind.
    pub fn get_mut(&mut self, kind: UpgradeKind) -> &mut UpgradeOption {
        match kind {
            UpgradeKind::Damage => &mut self.damage,
            UpgradeKind::Range => &mut self.range,
            UpgradeKind::ReloadTime => &mut self.reload_time,
            UpgradeKind::ProjectileSpeed => &mut self.projectile_speed,
        }
    }

    /// Damage dealt per projectile at the current level.
    #[must_use]
    pub fn damage(&self) -> u32 {
        self.damage.value().round().max(0.0) as u32
    }

    /// Acquisition radius in tiles at the current level.
    #[must_use]
    pub fn range(&self) -> f32 {
        self.range.value().max(0.0)
    }

    /// Time between shots at the current level.
    #[must_use]
    pub fn reload_time(&self) -> Duration {
        Duration::from_micros((self.reload_time.value().max(0.0) * 1000.0).round() as u64)
    }

    /// Projectile speed in tiles per second at the current level.
    #[must_use]
    pub fn projectile_speed(&self) -> f32 {
        self.projectile_speed.value().max(0.0)
    }
}

/// Build cost and starting upgrade tracks of a tower kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerBlueprint {
    /// Currency required to build the tower.
    pub build_cost: Gold,
    /// Upgrade tracks a freshly built tower starts with.
    pub upgrades: TowerUpgrades,
}

impl TowerBlueprint {
    /// Default blueprint of the rocket tower.
    #[must_use]
    pub const fn rocket() -> Self {
        const MAX_LEVEL: u32 = 5;
        const COST: CostCurve = CostCurve::new(Gold::new(50), Gold::new(50));
        Self {
            build_cost: Gold::new(10),
            upgrades: TowerUpgrades {
                damage: UpgradeOption::new(MAX_LEVEL, COST, LinearCurve::new(20.0, 10.0)),
                range: UpgradeOption::new(MAX_LEVEL, COST, LinearCurve::new(3.0, 0.5)),
                reload_time: UpgradeOption::new(MAX_LEVEL, COST, LinearCurve::new(500.0, -50.0)),
                projectile_speed: UpgradeOption::new(MAX_LEVEL, COST, LinearCurve::new(5.0, 1.0)),
            },
        }
    }
}

impl Default for TowerBlueprint {
    fn default() -> Self {
        Self::rocket()
    }
}

/// Batch of identical enemies released one after another.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnBlock {
    /// Variant of the released enemies.
    pub kind: EnemyKind,
    /// Movement speed in tiles per second.
    pub speed: f32,
    /// Starting health of each enemy.
    pub health: Health,
    /// Number of enemies in the block.
    pub count: u32,
    /// Currency awarded per kill.
    pub kill_bonus: Gold,
    /// Delay preceding every spawn of the block.
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
}

/// Single wave: a cooldown followed by an ordered list of spawn blocks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveSpec {
    /// Pause preceding the first spawn block.
    #[serde(with = "duration_millis")]
    pub cooldown: Duration,
    /// Spawn blocks released in order.
    pub blocks: Vec<SpawnBlock>,
}

impl WaveSpec {
    /// Total number of enemies released by the wave.
    #[must_use]
    pub fn enemy_count(&self) -> u32 {
        self.blocks
            .iter()
            .fold(0u32, |total, block| total.saturating_add(block.count))
    }
}

/// Serde adapter storing a [`Duration`] as whole milliseconds.
pub mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes the duration as milliseconds.
    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    /// Deserializes a duration from milliseconds.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Variant of the enemy.
    pub kind: EnemyKind,
    /// Continuous position in tile units.
    pub position: TilePoint,
    /// Heading in radians.
    pub rotation: f32,
    /// Health left.
    pub health: Health,
    /// Health the enemy spawned with.
    pub max_health: Health,
    /// Currency awarded when the enemy is killed.
    pub kill_bonus: Gold,
    /// Index of the path waypoint the enemy walks toward.
    pub path_index: usize,
    /// Whether the enemy has been destroyed.
    pub destroyed: bool,
    /// Whether the enemy walked past the final waypoint.
    pub finished_path: bool,
}

impl EnemySnapshot {
    /// Reports whether towers may still engage the enemy.
    #[must_use]
    pub const fn is_targetable(&self) -> bool {
        !self.destroyed && !self.finished_path
    }

    /// Remaining health as a fraction of the starting health.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health.is_zero() {
            return 0.0;
        }
        self.health.get() as f32 / self.max_health.get() as f32
    }
}

/// Read-only snapshot describing all enemies in the level.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a specific enemy.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Number of captured enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Tile occupied by the tower.
    pub tile: TileCoord,
    /// Target ordering policy of the tower.
    pub strategy: TargetingStrategy,
    /// Live enemy the tower currently aims at.
    pub target: Option<EnemyId>,
    /// Turret heading in radians.
    pub rotation: f32,
    /// Time left until the tower may fire again.
    pub reload_left: Duration,
    /// Current upgrade tracks.
    pub upgrades: TowerUpgrades,
}

impl TowerSnapshot {
    /// Continuous point in the middle of the tower's tile.
    #[must_use]
    pub fn center(&self) -> TilePoint {
        self.tile.center()
    }
}

/// Read-only snapshot describing all towers in the level.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Tower that launched the projectile.
    pub tower: TowerId,
    /// Enemy the projectile homes toward.
    pub target: EnemyId,
    /// Continuous position in tile units.
    pub position: TilePoint,
    /// Heading in radians.
    pub rotation: f32,
    /// Flight time left before the projectile expires.
    pub time_to_live: Duration,
}
