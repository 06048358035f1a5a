//! Floor layout derived from a generated maze.

use rand::{
    distributions::{Distribution, WeightedError, WeightedIndex},
    Rng,
};
use rocket_td_core::{DecorationKind, TileCoord, TileKind, TileMapView};
use rocket_td_system_maze::{Maze, MazeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Failures reported while laying out a level.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LayoutError {
    /// Maze generation or path search failed.
    #[error(transparent)]
    Maze(#[from] MazeError),
    /// The buildable tile probability lies outside `0.0..=1.0`.
    #[error("tower tile fill factor must lie within 0..=1, got {0}")]
    InvalidFillFactor(f64),
    /// The decoration table is empty.
    #[error("decoration table must contain at least one entry")]
    EmptyDecorations,
    /// A decoration weight is negative or not finite.
    #[error("decoration weight {0} is not a finite non-negative number")]
    InvalidWeight(f64),
    /// The decoration weights do not add up to one.
    #[error("decoration weights must sum to 1, got {0}")]
    WeightsDoNotSumToOne(f64),
    /// The decoration table could not be turned into a weighted draw.
    #[error("decoration table cannot be sampled: {0}")]
    Sampling(#[from] WeightedError),
    /// A hand-authored path has fewer than two tiles.
    #[error("path must contain at least a spawn and a base tile")]
    PathTooShort,
    /// A hand-authored tile lies outside the level.
    #[error("tile {0:?} lies outside the level")]
    OutOfBounds(TileCoord),
    /// Two consecutive path tiles are not orthogonal neighbours.
    #[error("path tiles {from:?} and {to:?} are not adjacent")]
    DisconnectedPath {
        /// Earlier of the two tiles.
        from: TileCoord,
        /// Later of the two tiles.
        to: TileCoord,
    },
}

/// Probability of a decoration being painted on an empty tile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecorationWeight {
    /// Decoration to paint, or `None` to leave the tile empty.
    pub decoration: Option<DecorationKind>,
    /// Probability of this entry being chosen.
    pub weight: f64,
}

impl DecorationWeight {
    /// Creates a new table entry.
    #[must_use]
    pub const fn new(decoration: Option<DecorationKind>, weight: f64) -> Self {
        Self { decoration, weight }
    }
}

/// Parameters controlling level generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Number of maze cells along the horizontal axis.
    pub maze_columns: u32,
    /// Number of maze cells along the vertical axis.
    pub maze_rows: u32,
    /// Probability that an empty tile next to the road becomes buildable.
    pub tower_tiles_fill_factor: f64,
    /// Weighted decoration table; weights must sum to one.
    pub decorations: Vec<DecorationWeight>,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            maze_columns: 8,
            maze_rows: 4,
            tower_tiles_fill_factor: 0.6,
            decorations: vec![
                DecorationWeight::new(Some(DecorationKind::Stone), 0.1),
                DecorationWeight::new(Some(DecorationKind::Bush), 0.2),
                DecorationWeight::new(Some(DecorationKind::LargeBush), 0.1),
                DecorationWeight::new(None, 0.6),
            ],
        }
    }
}

impl LayoutParams {
    /// Checks the probabilities before any generation work starts.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let fill = self.tower_tiles_fill_factor;
        if !(0.0..=1.0).contains(&fill) {
            return Err(LayoutError::InvalidFillFactor(fill));
        }

        if self.decorations.is_empty() {
            return Err(LayoutError::EmptyDecorations);
        }

        let mut total = 0.0;
        for entry in &self.decorations {
            if !entry.weight.is_finite() || entry.weight < 0.0 {
                return Err(LayoutError::InvalidWeight(entry.weight));
            }
            total += entry.weight;
        }

        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(LayoutError::WeightsDoNotSumToOne(total));
        }

        Ok(())
    }
}

/// Immutable floor layout of a level together with the enemy path.
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    columns: u32,
    rows: u32,
    tiles: Vec<TileKind>,
    path: Vec<TileCoord>,
}

impl Level {
    /// Generates a level from a fresh maze.
    ///
    /// The road follows the longest solution path of the rasterized maze.
    /// Every empty tile touching the road becomes buildable with probability
    /// `tower_tiles_fill_factor`, the remaining empty tiles are decorated by a
    /// weighted draw, and the first and last path tiles become the spawn and
    /// the base.
    pub fn build<R: Rng>(params: &LayoutParams, rng: &mut R) -> Result<Self, LayoutError> {
        params.validate()?;

        let maze = Maze::generate(params.maze_columns, params.maze_rows, rng)?;
        let mut pixels = maze.rasterize(true);
        let _ = pixels.attach_entrance_and_exit(rng)?;
        let path = pixels.find_longest_solution_path(false, rng)?;

        let mut level = Self {
            columns: pixels.columns(),
            rows: pixels.rows(),
            tiles: vec![TileKind::Empty; pixels.columns() as usize * pixels.rows() as usize],
            path,
        };

        for index in 0..level.path.len() {
            let coord = level.path[index];
            level.set(coord, TileKind::Road);
        }

        level.add_tower_tiles(params.tower_tiles_fill_factor, rng);
        level.add_decorations(&params.decorations, rng)?;

        let spawn = level.spawn();
        let base = level.base();
        level.set(spawn, TileKind::Spawn);
        level.set(base, TileKind::Base);

        tracing::info!(
            columns = level.columns,
            rows = level.rows,
            path_length = level.path.len(),
            buildable = level.tiles.iter().filter(|tile| **tile == TileKind::Buildable).count(),
            "generated level"
        );
        Ok(level)
    }

    /// Lays out a hand-authored level.
    ///
    /// The path is painted as road with spawn and base at its ends, the
    /// listed tiles become buildable unless the road claims them, and every
    /// other tile stays empty.
    pub fn from_path(
        columns: u32,
        rows: u32,
        path: Vec<TileCoord>,
        buildable: &[TileCoord],
    ) -> Result<Self, LayoutError> {
        if path.len() < 2 {
            return Err(LayoutError::PathTooShort);
        }

        let mut level = Self {
            columns,
            rows,
            tiles: vec![TileKind::Empty; columns as usize * rows as usize],
            path,
        };

        for coord in level.path.iter().chain(buildable) {
            if level.index(*coord).is_none() {
                return Err(LayoutError::OutOfBounds(*coord));
            }
        }
        for pair in level.path.windows(2) {
            if pair[0].manhattan_distance(pair[1]) != 1 {
                return Err(LayoutError::DisconnectedPath {
                    from: pair[0],
                    to: pair[1],
                });
            }
        }

        for coord in buildable {
            level.set(*coord, TileKind::Buildable);
        }
        for index in 0..level.path.len() {
            let coord = level.path[index];
            level.set(coord, TileKind::Road);
        }
        let spawn = level.spawn();
        let base = level.base();
        level.set(spawn, TileKind::Spawn);
        level.set(base, TileKind::Base);

        Ok(level)
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Tile stored at the provided coordinate.
    #[must_use]
    pub fn tile(&self, coord: TileCoord) -> Option<TileKind> {
        self.index(coord).map(|index| self.tiles[index])
    }

    /// Reports whether a tower may be built on the tile.
    #[must_use]
    pub fn is_buildable(&self, coord: TileCoord) -> bool {
        self.tile(coord) == Some(TileKind::Buildable)
    }

    /// Ordered path from spawn to base.
    #[must_use]
    pub fn path(&self) -> &[TileCoord] {
        &self.path
    }

    /// Tile where enemies appear.
    #[must_use]
    pub fn spawn(&self) -> TileCoord {
        self.path[0]
    }

    /// Tile guarded by the player.
    #[must_use]
    pub fn base(&self) -> TileCoord {
        self.path[self.path.len() - 1]
    }

    /// Every tile in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = (TileCoord, TileKind)> + '_ {
        self.view().iter()
    }

    /// Read-only view over every tile.
    #[must_use]
    pub fn view(&self) -> TileMapView<'_> {
        TileMapView::new(&self.tiles, self.columns, self.rows)
    }

    fn add_tower_tiles<R: Rng>(&mut self, fill_factor: f64, rng: &mut R) {
        for row in 0..self.rows {
            for column in 0..self.columns {
                let coord = TileCoord::new(column, row);
                if self.tile(coord) != Some(TileKind::Empty) {
                    continue;
                }

                let near_road = self
                    .neighbours(coord)
                    .any(|next| self.tile(next) == Some(TileKind::Road));
                if near_road && rng.gen_bool(fill_factor) {
                    self.set(coord, TileKind::Buildable);
                }
            }
        }
    }

    fn add_decorations<R: Rng>(
        &mut self,
        table: &[DecorationWeight],
        rng: &mut R,
    ) -> Result<(), LayoutError> {
        let distribution = WeightedIndex::new(table.iter().map(|entry| entry.weight))?;

        for tile in &mut self.tiles {
            if *tile != TileKind::Empty {
                continue;
            }
            if let Some(decoration) = table[distribution.sample(rng)].decoration {
                *tile = TileKind::Decoration(decoration);
            }
        }
        Ok(())
    }

    fn neighbours(&self, coord: TileCoord) -> impl Iterator<Item = TileCoord> {
        let (column, row) = (coord.column(), coord.row());
        [
            column.checked_sub(1).map(|c| TileCoord::new(c, row)),
            (column + 1 < self.columns).then(|| TileCoord::new(column + 1, row)),
            row.checked_sub(1).map(|r| TileCoord::new(column, r)),
            (row + 1 < self.rows).then(|| TileCoord::new(column, row + 1)),
        ]
        .into_iter()
        .flatten()
    }

    fn set(&mut self, coord: TileCoord, kind: TileKind) {
        if let Some(index) = self.index(coord) {
            self.tiles[index] = kind;
        }
    }

    fn index(&self, coord: TileCoord) -> Option<usize> {
        if coord.column() < self.columns && coord.row() < self.rows {
            Some(coord.row() as usize * self.columns as usize + coord.column() as usize)
        } else {
            None
        }
    }
}
