//! Fine-grained pixel representation of a rasterized maze.

use rand::{seq::SliceRandom, Rng};
use rocket_td_core::TileCoord;

use crate::MazeError;

/// State of a single pixel of the rasterized maze.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelTile {
    /// Solid pixel that cannot be walked.
    Wall,
    /// Walkable corridor pixel.
    Path,
    /// Entrance pixel on the left boundary.
    Spawn,
    /// Exit pixel on the right boundary.
    Base,
    /// Corridor pixel claimed by the current solution walk.
    Solution,
    /// Corridor pixel claimed by a rejected solution walk.
    RemovedPath,
}

impl PixelTile {
    const fn glyph(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Path => ' ',
            Self::Spawn => 'S',
            Self::Base => 'B',
            Self::Solution => '+',
            Self::RemovedPath => 'x',
        }
    }
}

/// Row-major grid of pixel tiles produced by [`crate::Maze::rasterize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    columns: u32,
    rows: u32,
    tiles: Vec<PixelTile>,
    entrance: Option<TileCoord>,
    exit: Option<TileCoord>,
}

impl PixelGrid {
    pub(crate) fn filled(columns: u32, rows: u32, tile: PixelTile) -> Self {
        Self {
            columns,
            rows,
            tiles: vec![tile; columns as usize * rows as usize],
            entrance: None,
            exit: None,
        }
    }

    /// Number of pixel columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of pixel rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Pixel stored at the provided coordinate.
    #[must_use]
    pub fn tile(&self, coord: TileCoord) -> Option<PixelTile> {
        self.index(coord).map(|index| self.tiles[index])
    }

    /// Entrance pixel, once attached.
    #[must_use]
    pub const fn entrance(&self) -> Option<TileCoord> {
        self.entrance
    }

    /// Exit pixel, once attached.
    #[must_use]
    pub const fn exit(&self) -> Option<TileCoord> {
        self.exit
    }

    /// In-bounds orthogonal neighbours ordered left, right, up, down.
    pub fn neighbours(&self, coord: TileCoord) -> impl Iterator<Item = TileCoord> {
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

    /// Number of pixels still marked as walkable corridor.
    #[must_use]
    pub fn path_pixel_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|tile| **tile == PixelTile::Path)
            .count()
    }

    /// Chooses an entrance on the left boundary and an exit on the right one.
    ///
    /// A boundary pixel qualifies when its inward neighbour is a corridor
    /// pixel. Each endpoint is chosen uniformly among the qualifying pixels and
    /// marked as [`PixelTile::Spawn`] or [`PixelTile::Base`].
    pub fn attach_entrance_and_exit<R: Rng>(
        &mut self,
        rng: &mut R,
    ) -> Result<(TileCoord, TileCoord), MazeError> {
        let entrance = self
            .boundary_candidates(0, 1)
            .choose(rng)
            .copied()
            .ok_or(MazeError::NoEntrance)?;
        self.set(entrance, PixelTile::Spawn);

        let last = self.columns - 1;
        let exit = self
            .boundary_candidates(last, last - 1)
            .choose(rng)
            .copied()
            .ok_or(MazeError::NoExit)?;
        self.set(exit, PixelTile::Base);

        self.entrance = Some(entrance);
        self.exit = Some(exit);
        Ok((entrance, exit))
    }

    /// Walks randomly from the entrance over unclaimed corridor pixels until
    /// the exit is adjacent.
    ///
    /// Every visited pixel is marked [`PixelTile::Solution`]. The returned path
    /// starts at the entrance and ends at the exit. With `cleanup` the markers
    /// are reset to [`PixelTile::Path`] afterwards.
    pub fn find_solution_path<R: Rng>(
        &mut self,
        cleanup: bool,
        rng: &mut R,
    ) -> Result<Vec<TileCoord>, MazeError> {
        let path = self.walk(rng)?;
        if cleanup {
            self.clear_markers();
        }
        Ok(path)
    }

    /// Finds a path covering at least half of the corridor pixels.
    ///
    /// The first walk is accepted when `(len - 2) * 2` reaches the number of
    /// corridor pixels counted beforehand. Otherwise the walk is marked
    /// [`PixelTile::RemovedPath`], the pixels next to the entrance and exit are
    /// reopened and a second walk is taken, which is returned as is. With the
    /// internal wall the corridors form a single loop, so the second walk
    /// follows the other, longer arc.
    pub fn find_longest_solution_path<R: Rng>(
        &mut self,
        cleanup: bool,
        rng: &mut R,
    ) -> Result<Vec<TileCoord>, MazeError> {
        let path_pixels = self.path_pixel_count();
        let first = self.walk(rng)?;

        let path = if first.len().saturating_sub(2) * 2 >= path_pixels {
            first
        } else {
            tracing::debug!(
                walked = first.len(),
                path_pixels,
                "first solution walk too short, retrying along the remaining corridor"
            );
            self.remove_solution_path()?;
            self.walk(rng)?
        };

        if cleanup {
            self.clear_markers();
        }
        Ok(path)
    }

    /// Renders the grid as text, one line per pixel row.
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let width = self.columns as usize;
        let mut out = String::with_capacity((width + 1) * self.rows as usize);
        for row in self.tiles.chunks(width.max(1)) {
            out.extend(row.iter().map(|tile| tile.glyph()));
            out.push('\n');
        }
        out
    }

    pub(crate) fn set(&mut self, coord: TileCoord, tile: PixelTile) {
        if let Some(index) = self.index(coord) {
            self.tiles[index] = tile;
        }
    }

    fn walk<R: Rng>(&mut self, rng: &mut R) -> Result<Vec<TileCoord>, MazeError> {
        let (Some(entrance), Some(exit)) = (self.entrance, self.exit) else {
            return Err(MazeError::MissingEndpoints);
        };

        let mut path = vec![entrance];
        let mut candidates = Vec::with_capacity(4);
        let mut current = entrance;
        loop {
            if self.neighbours(current).any(|next| next == exit) {
                break;
            }

            candidates.clear();
            candidates.extend(
                self.neighbours(current)
                    .filter(|next| self.tile(*next) == Some(PixelTile::Path)),
            );
            let Some(&next) = candidates.choose(rng) else {
                return Err(MazeError::DeadEnd { at: current });
            };

            self.set(next, PixelTile::Solution);
            path.push(next);
            current = next;
        }

        path.push(exit);
        Ok(path)
    }

    fn remove_solution_path(&mut self) -> Result<(), MazeError> {
        let (Some(entrance), Some(exit)) = (self.entrance, self.exit) else {
            return Err(MazeError::MissingEndpoints);
        };

        for tile in &mut self.tiles {
            if *tile == PixelTile::Solution {
                *tile = PixelTile::RemovedPath;
            }
        }

        self.set(
            TileCoord::new(entrance.column() + 1, entrance.row()),
            PixelTile::Path,
        );
        self.set(
            TileCoord::new(exit.column().saturating_sub(1), exit.row()),
            PixelTile::Path,
        );
        Ok(())
    }

    fn clear_markers(&mut self) {
        for tile in &mut self.tiles {
            if matches!(*tile, PixelTile::Solution | PixelTile::RemovedPath) {
                *tile = PixelTile::Path;
            }
        }
    }

    fn boundary_candidates(&self, column: u32, inward: u32) -> Vec<TileCoord> {
        (0..self.rows)
            .filter(|row| self.tile(TileCoord::new(inward, *row)) == Some(PixelTile::Path))
            .map(|row| TileCoord::new(column, row))
            .collect()
    }

    fn index(&self, coord: TileCoord) -> Option<usize> {
        if coord.column() < self.columns && coord.row() < self.rows {
            Some(coord.row() as usize * self.columns as usize + coord.column() as usize)
        } else {
            None
        }
    }
}
