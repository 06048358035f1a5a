#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural maze generation for Rocket TD levels.
//!
//! A [`Maze`] is carved as a random spanning tree over a coarse cell grid and
//! then rasterized into a [`PixelGrid`] four times finer. Levels attach an
//! entrance and exit to the pixel grid and walk a long solution path between
//! them that enemies later follow.

mod pixels;

use rand::{seq::SliceRandom, Rng};
use rocket_td_core::TileCoord;
use thiserror::Error;

pub use pixels::{PixelGrid, PixelTile};

/// Number of pixel tiles spanned by a single maze cell along each axis.
pub const PIXELS_PER_CELL: u32 = 4;

/// Failures reported while generating or searching a maze.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MazeError {
    /// The requested grid has fewer than one column or row.
    #[error("maze dimensions must be at least 1x1, got {columns}x{rows}")]
    InvalidDimensions {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// No pixel on the left boundary borders a corridor.
    #[error("no entrance candidate on the left boundary")]
    NoEntrance,
    /// No pixel on the right boundary borders a corridor.
    #[error("no exit candidate on the right boundary")]
    NoExit,
    /// A path search was requested before entrance and exit were attached.
    #[error("entrance and exit must be attached before searching for a path")]
    MissingEndpoints,
    /// The solution walk reached a pixel with no unexplored corridor around it.
    #[error("solution walk stalled at {at:?}")]
    DeadEnd {
        /// Pixel where the walk stalled.
        at: TileCoord,
    },
}

/// Side of a maze cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Side facing decreasing columns.
    Left,
    /// Side facing increasing columns.
    Right,
    /// Side facing increasing rows.
    Bottom,
    /// Side facing decreasing rows.
    Top,
}

impl Side {
    /// Sides in the order neighbours are considered while carving.
    pub const CARVE_ORDER: [Side; 4] = [Self::Right, Self::Left, Self::Bottom, Self::Top];

    /// Side of the neighbouring cell that shares this wall.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Bottom => Self::Top,
            Self::Top => Self::Bottom,
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Left => 0b0001,
            Self::Right => 0b0010,
            Self::Bottom => 0b0100,
            Self::Top => 0b1000,
        }
    }
}

/// Bitmask of the walls still standing around a maze cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Walls(u8);

impl Walls {
    /// Cell enclosed on every side.
    pub const ALL: Self = Self(0b1111);

    /// Reports whether the wall on the provided side still stands.
    #[must_use]
    pub const fn contains(self, side: Side) -> bool {
        self.0 & side.bit() != 0
    }

    /// Number of walls still standing.
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    fn remove(&mut self, side: Side) {
        self.0 &= !side.bit();
    }
}

/// Single coarse unit of the maze.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MazeCell {
    walls: Walls,
    visited: bool,
}

impl MazeCell {
    const fn enclosed() -> Self {
        Self {
            walls: Walls::ALL,
            visited: false,
        }
    }

    /// Walls still standing around the cell.
    #[must_use]
    pub const fn walls(&self) -> Walls {
        self.walls
    }

    /// Whether carving reached the cell.
    #[must_use]
    pub const fn visited(&self) -> bool {
        self.visited
    }
}

/// Perfect maze carved over a grid of cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze {
    columns: u32,
    rows: u32,
    cells: Vec<MazeCell>,
}

impl Maze {
    /// Carves a random spanning tree using an explicit depth-first stack.
    ///
    /// Carving starts from a uniformly chosen cell. At each step the cell on
    /// top of the stack either opens a wall toward a random unvisited
    /// neighbour and pushes it, or is popped once no unvisited neighbour is
    /// left.
    pub fn generate<R: Rng>(columns: u32, rows: u32, rng: &mut R) -> Result<Self, MazeError> {
        if columns < 1 || rows < 1 {
            return Err(MazeError::InvalidDimensions { columns, rows });
        }

        let cell_count = columns as usize * rows as usize;
        let mut maze = Self {
            columns,
            rows,
            cells: vec![MazeCell::enclosed(); cell_count],
        };

        let start = (rng.gen_range(0..columns), rng.gen_range(0..rows));
        maze.cell_mut(start).visited = true;

        let mut stack = vec![start];
        let mut candidates: Vec<(Side, (u32, u32))> = Vec::with_capacity(4);
        while let Some(&current) = stack.last() {
            candidates.clear();
            for side in Side::CARVE_ORDER {
                let Some(next) = maze.neighbour(current, side) else {
                    continue;
                };
                if !maze.cell(next).visited {
                    candidates.push((side, next));
                }
            }

            let Some(&(side, next)) = candidates.choose(rng) else {
                let _ = stack.pop();
                continue;
            };

            maze.cell_mut(current).walls.remove(side);
            let neighbour = maze.cell_mut(next);
            neighbour.walls.remove(side.opposite());
            neighbour.visited = true;
            stack.push(next);
        }

        tracing::debug!(columns, rows, "carved maze");
        Ok(maze)
    }

    /// Number of cell columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of cell rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Cell stored at the provided column and row.
    #[must_use]
    pub fn cell_at(&self, column: u32, row: u32) -> Option<&MazeCell> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.cells.get(self.index((column, row)))
    }

    /// Reports whether the wall on `side` of the cell has been carved away.
    #[must_use]
    pub fn is_open(&self, column: u32, row: u32, side: Side) -> bool {
        self.cell_at(column, row)
            .is_some_and(|cell| !cell.walls.contains(side))
    }

    /// Paints the maze into a pixel grid with five pixels per cell edge.
    ///
    /// Cell `(i, j)` is centred on pixel `(2 + 4i, 2 + 4j)`. Standing walls are
    /// painted as a solid five pixel segment. With `add_internal_wall` the
    /// cell centre and the half-arm toward every open side are painted solid
    /// as well, which turns the corridors into a single one pixel wide loop
    /// around the spanning tree.
    #[must_use]
    pub fn rasterize(&self, add_internal_wall: bool) -> PixelGrid {
        let mut grid = PixelGrid::filled(
            self.columns * PIXELS_PER_CELL + 1,
            self.rows * PIXELS_PER_CELL + 1,
            PixelTile::Path,
        );

        for row in 0..self.rows {
            for column in 0..self.columns {
                let walls = self.cell((column, row)).walls;
                let cx = 2 + PIXELS_PER_CELL * column;
                let cy = 2 + PIXELS_PER_CELL * row;

                if add_internal_wall {
                    grid.set(TileCoord::new(cx, cy), PixelTile::Wall);
                }

                for side in Side::CARVE_ORDER {
                    let (dx, dy) = side_offset(side);
                    if walls.contains(side) {
                        for along in -2i64..=2 {
                            let (x, y) = if dx != 0 {
                                (i64::from(cx) + 2 * dx, i64::from(cy) + along)
                            } else {
                                (i64::from(cx) + along, i64::from(cy) + 2 * dy)
                            };
                            grid.set(pixel(x, y), PixelTile::Wall);
                        }
                    } else if add_internal_wall {
                        for reach in 1..=2 {
                            let x = i64::from(cx) + reach * dx;
                            let y = i64::from(cy) + reach * dy;
                            grid.set(pixel(x, y), PixelTile::Wall);
                        }
                    }
                }
            }
        }

        grid
    }

    fn cell(&self, coord: (u32, u32)) -> &MazeCell {
        &self.cells[self.index(coord)]
    }

    fn cell_mut(&mut self, coord: (u32, u32)) -> &mut MazeCell {
        let index = self.index(coord);
        &mut self.cells[index]
    }

    fn index(&self, (column, row): (u32, u32)) -> usize {
        row as usize * self.columns as usize + column as usize
    }

    fn neighbour(&self, (column, row): (u32, u32), side: Side) -> Option<(u32, u32)> {
        match side {
            Side::Left => column.checked_sub(1).map(|column| (column, row)),
            Side::Right => (column + 1 < self.columns).then_some((column + 1, row)),
            Side::Top => row.checked_sub(1).map(|row| (column, row)),
            Side::Bottom => (row + 1 < self.rows).then_some((column, row + 1)),
        }
    }
}

const fn side_offset(side: Side) -> (i64, i64) {
    match side {
        Side::Left => (-1, 0),
        Side::Right => (1, 0),
        Side::Bottom => (0, 1),
        Side::Top => (0, -1),
    }
}

// Offsets used while painting never leave the cell's own 5x5 block.
fn pixel(x: i64, y: i64) -> TileCoord {
    TileCoord::new(x as u32, y as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn zero_dimensions_are_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            Maze::generate(0, 3, &mut rng),
            Err(MazeError::InvalidDimensions {
                columns: 0,
                rows: 3
            })
        );
        assert!(Maze::generate(3, 0, &mut rng).is_err());
    }

    #[test]
    fn single_cell_keeps_every_wall() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let maze = Maze::generate(1, 1, &mut rng).expect("1x1 maze");
        let cell = maze.cell_at(0, 0).expect("cell exists");
        assert_eq!(cell.walls(), Walls::ALL);
        assert!(cell.visited());
    }

    #[test]
    fn carving_opens_walls_symmetrically() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let maze = Maze::generate(6, 4, &mut rng).expect("maze");
        for row in 0..maze.rows() {
            for column in 0..maze.columns() {
                if maze.is_open(column, row, Side::Right) {
                    assert!(maze.is_open(column + 1, row, Side::Left));
                }
                if maze.is_open(column, row, Side::Bottom) {
                    assert!(maze.is_open(column, row + 1, Side::Top));
                }
            }
        }
        assert!(!maze.is_open(0, 0, Side::Left));
        assert!(!maze.is_open(0, 0, Side::Top));
    }

    #[test]
    fn rasterized_grid_has_four_pixels_per_cell_plus_border() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let maze = Maze::generate(3, 2, &mut rng).expect("maze");
        let grid = maze.rasterize(true);
        assert_eq!(grid.columns(), 13);
        assert_eq!(grid.rows(), 9);
        for row in 0..grid.rows() {
            assert_eq!(grid.tile(TileCoord::new(0, row)), Some(PixelTile::Wall));
            assert_eq!(
                grid.tile(TileCoord::new(grid.columns() - 1, row)),
                Some(PixelTile::Wall)
            );
        }
        assert_eq!(grid.tile(TileCoord::new(2, 2)), Some(PixelTile::Wall));
    }

    #[test]
    fn rasterizing_without_internal_wall_keeps_cell_centres_open() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let maze = Maze::generate(2, 2, &mut rng).expect("maze");
        let grid = maze.rasterize(false);
        for (column, row) in [(2, 2), (6, 2), (2, 6), (6, 6)] {
            assert_eq!(
                grid.tile(TileCoord::new(column, row)),
                Some(PixelTile::Path)
            );
        }
    }

    #[test]
    fn internal_wall_leaves_every_corridor_pixel_with_two_exits() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let maze = Maze::generate(5, 4, &mut rng).expect("maze");
        let grid = maze.rasterize(true);
        for row in 0..grid.rows() {
            for column in 0..grid.columns() {
                let coord = TileCoord::new(column, row);
                if grid.tile(coord) != Some(PixelTile::Path) {
                    continue;
                }
                let open = grid
                    .neighbours(coord)
                    .filter(|next| grid.tile(*next) == Some(PixelTile::Path))
                    .count();
                assert_eq!(open, 2, "pixel {coord:?} is not part of a simple loop");
            }
        }
    }
}
