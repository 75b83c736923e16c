#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Terminal painter that draws Delve scenes as ASCII art.
//!
//! Two layouts are supported. The maze layout draws wall corners as `+` and
//! wall runs as `-` and `|`, marking the solution with `*`. The dungeon layout
//! draws rock as `#` and floor as `.`, replacing room cells next to a door with
//! the compass letter of that door. Either can be tinted with 24-bit ANSI
//! colors taken from the scene's palette.

use std::{collections::HashSet, io::Write};

use anyhow::{Context, Result};
use delve_core::CellKind;
use delve_rendering::{Color, GridCell, Painter, Scene};

/// Which ASCII layout to draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextStyle {
    /// Line-art maze with the solution route.
    Maze,
    /// Rock and floor map with door letters.
    Dungeon,
}

/// One character of output with the color it should be drawn in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    /// Character to print.
    pub symbol: char,
    /// Tint applied when colors are enabled.
    pub color: Color,
}

/// Painter that writes scenes to any [`Write`] sink.
#[derive(Debug)]
pub struct TextPainter<W> {
    out: W,
    style: TextStyle,
    colored: bool,
}

impl<W: Write> TextPainter<W> {
    /// Creates a painter writing plain text.
    #[must_use]
    pub const fn new(out: W, style: TextStyle) -> Self {
        Self {
            out,
            style,
            colored: false,
        }
    }

    /// Enables or disables ANSI colors.
    #[must_use]
    pub const fn with_colors(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Returns the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Painter for TextPainter<W> {
    fn paint(&mut self, scene: &Scene) -> Result<()> {
        for row in render(scene, self.style) {
            let mut line = String::with_capacity(row.len());
            for glyph in row {
                if self.colored {
                    let [red, green, blue] = glyph.color.to_rgb_u8();
                    line.push_str(&format!("\x1b[38;2;{red};{green};{blue}m{}\x1b[0m", glyph.symbol));
                } else {
                    line.push(glyph.symbol);
                }
            }
            writeln!(self.out, "{line}").context("failed to write scene row")?;
        }
        self.out.flush().context("failed to flush painter output")
    }
}

/// Lays the scene out as rows of glyphs.
#[must_use]
pub fn render(scene: &Scene, style: TextStyle) -> Vec<Vec<Glyph>> {
    match style {
        TextStyle::Maze => render_maze(scene),
        TextStyle::Dungeon => render_dungeon(scene),
    }
}

/// Lays the scene out and joins it into plain text, one line per row.
#[must_use]
pub fn render_plain(scene: &Scene, style: TextStyle) -> String {
    render(scene, style)
        .into_iter()
        .map(|row| row.into_iter().map(|glyph| glyph.symbol).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_maze(scene: &Scene) -> Vec<Vec<Glyph>> {
    let palette = scene.presentation.palette;
    let route = route_cells(scene);

    grid_rows(scene, |cell, kind| {
        let GridCell { column, row } = cell;
        match kind {
            CellKind::Wall => {
                let symbol = match (column % 2 == 0, row % 2 == 0) {
                    (true, true) => '+',
                    (false, true) => '-',
                    (true, false) => '|',
                    (false, false) => ' ',
                };
                Glyph {
                    symbol,
                    color: palette.wall_line,
                }
            }
            CellKind::Passage | CellKind::Room if route.contains(&cell) => Glyph {
                symbol: '*',
                color: palette.solution,
            },
            CellKind::Passage | CellKind::Room => Glyph {
                symbol: ' ',
                color: palette.fill(kind),
            },
        }
    })
}

fn render_dungeon(scene: &Scene) -> Vec<Vec<Glyph>> {
    let palette = scene.presentation.palette;

    grid_rows(scene, |cell, kind| match kind {
        CellKind::Wall => Glyph {
            symbol: '#',
            color: palette.wall,
        },
        CellKind::Passage => Glyph {
            symbol: '.',
            color: palette.passage,
        },
        CellKind::Room => door_letter(scene, cell).map_or(
            Glyph {
                symbol: '.',
                color: palette.room,
            },
            |(symbol, color)| Glyph { symbol, color },
        ),
    })
}

/// Letter for the door beside a room cell; later compass points win.
fn door_letter(scene: &Scene, cell: GridCell) -> Option<(char, Color)> {
    let GridCell { column, row } = cell;
    let neighbors = [
        ('w', column.checked_sub(1).map(|c| GridCell::new(c, row))),
        ('e', Some(GridCell::new(column + 1, row))),
        ('n', row.checked_sub(1).map(|r| GridCell::new(column, r))),
        ('s', Some(GridCell::new(column, row + 1))),
    ];

    neighbors
        .into_iter()
        .filter_map(|(letter, neighbor)| {
            let door = scene.door_between(cell, neighbor?)?;
            Some((letter, scene.presentation.palette.boundary(door.kind)))
        })
        .last()
}

fn route_cells(scene: &Scene) -> HashSet<GridCell> {
    let mut cells: HashSet<GridCell> = scene.route.iter().copied().collect();
    for pair in scene.route.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.column == b.column && a.row.abs_diff(b.row) == 2 {
            let _ = cells.insert(GridCell::new(a.column, a.row.min(b.row) + 1));
        } else if a.row == b.row && a.column.abs_diff(b.column) == 2 {
            let _ = cells.insert(GridCell::new(a.column.min(b.column) + 1, a.row));
        }
    }
    cells
}

fn grid_rows<F>(scene: &Scene, mut glyph: F) -> Vec<Vec<Glyph>>
where
    F: FnMut(GridCell, CellKind) -> Glyph,
{
    (0..scene.rows)
        .map(|row| {
            (0..scene.columns)
                .map(|column| {
                    let cell = GridCell::new(column, row);
                    glyph(cell, scene.cell(cell).unwrap_or_default())
                })
                .collect()
        })
        .collect()
}
