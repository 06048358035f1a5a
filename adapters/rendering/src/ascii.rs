use rocket_td_world::Level;

use crate::{DisplaySink, SpriteInstance};

/// Text sink that prints one glyph per tile.
///
/// A tile shows the glyph of the last sprite drawn onto it.
#[derive(Clone, Debug)]
pub struct AsciiSink {
    columns: u32,
    rows: u32,
    glyphs: Vec<char>,
}

impl AsciiSink {
    /// Creates a blank canvas of the provided size.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            glyphs: vec![' '; columns as usize * rows as usize],
        }
    }

    /// Creates a blank canvas covering the level.
    #[must_use]
    pub fn for_level(level: &Level) -> Self {
        Self::new(level.columns(), level.rows())
    }

    /// Renders the canvas, one line per row.
    #[must_use]
    pub fn render(&self) -> String {
        let mut output = String::with_capacity(self.glyphs.len() + self.rows as usize);
        for row in self.glyphs.chunks(self.columns.max(1) as usize) {
            output.extend(row.iter());
            output.push('\n');
        }
        output
    }
}

impl DisplaySink for AsciiSink {
    fn draw(&mut self, sprite: SpriteInstance) {
        let position = sprite.position.floor();
        if position.x < 0.0 || position.y < 0.0 {
            return;
        }
        let (column, row) = (position.x as u32, position.y as u32);
        if column >= self.columns || row >= self.rows {
            return;
        }
        let index = row as usize * self.columns as usize + column as usize;
        if let Some(glyph) = self.glyphs.get_mut(index) {
            *glyph = sprite.asset.glyph();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AssetKind, Renderable};
    use rocket_td_core::{EnemyKind, TileCoord, TilePoint};

    #[test]
    fn level_prints_path_and_build_sites() {
        let level = Level::from_path(
            3,
            2,
            vec![
                TileCoord::new(0, 1),
                TileCoord::new(1, 1),
                TileCoord::new(2, 1),
            ],
            &[TileCoord::new(2, 0)],
        )
        .expect("corridor level");
        let mut sink = AsciiSink::for_level(&level);

        level.display(&mut sink);

        assert_eq!(sink.render(), "  +\nS.B\n");
    }

    #[test]
    fn sprites_outside_the_canvas_are_ignored() {
        let mut sink = AsciiSink::new(2, 1);

        sink.draw(SpriteInstance::new(
            AssetKind::Enemy(EnemyKind::Basic),
            TilePoint::new(1.9, 0.2),
        ));
        sink.draw(SpriteInstance::new(AssetKind::Rocket, TilePoint::new(-0.5, 0.5)));
        sink.draw(SpriteInstance::new(AssetKind::Rocket, TilePoint::new(2.5, 0.5)));

        assert_eq!(sink.render(), " e\n");
    }
}
