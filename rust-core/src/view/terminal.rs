//! Text rendering of a [`BarLayout`] for terminals
//!
//! One character cell is one layout unit. A cell is lit when a bar covers at
//! least half of it in both directions; left bars are drawn over right bars.

use super::layout::{sample_gradient, BarLayout, BarRect, BarStyle, GradientStop, Rgb};
use crate::spectrum::Spectra;

/// ANSI escape sequences
pub mod ansi {
    pub const RESET_COLOR: &str = "\x1b[0m";

    pub fn set_color(r: u8, g: u8, b: u8) -> String {
        format!("\x1b[38;2;{};{};{}m", r, g, b)
    }
}

const BLOCK: char = '█';

/// Renders spectra into a fixed-size block of text
pub struct TerminalRenderer {
    columns: usize,
    rows: usize,
    style: BarStyle,
    colour: bool,
}

impl TerminalRenderer {
    /// # Arguments
    /// * `columns`, `rows` - Size of the drawing area in cells
    /// * `bands` - Bands per channel, used to fit the bars to `columns`
    /// * `style` - Alignment, margins and colours; widths are recomputed
    pub fn new(columns: usize, rows: usize, bands: usize, style: BarStyle) -> Self {
        Self {
            columns,
            rows,
            style: style.fitted(columns as f32, bands),
            colour: true,
        }
    }

    /// Emit plain characters without colour escapes
    pub fn plain(mut self) -> Self {
        self.colour = false;
        self
    }

    /// Render one frame as `rows` lines of `columns` cells
    pub fn render(&self, spectra: &Spectra) -> String {
        let layout = BarLayout::compute(spectra, &self.style, self.columns as f32, self.rows as f32);
        let mut grid: Vec<Option<Rgb>> = vec![None; self.columns * self.rows];

        let right = self.style.right_gradient();
        let left = self.style.left_gradient();
        self.paint(&mut grid, &layout.right, &right, &layout.frame);
        self.paint(&mut grid, &layout.left, &left, &layout.frame);

        let mut out = String::with_capacity(grid.len() * 4);
        for (r, row) in grid.chunks(self.columns.max(1)).enumerate() {
            if r > 0 {
                out.push('\n');
            }
            let mut current: Option<Rgb> = None;
            for cell in row {
                match cell {
                    Some(rgb) => {
                        if self.colour && current != Some(*rgb) {
                            out.push_str(&ansi::set_color(rgb.r, rgb.g, rgb.b));
                            current = Some(*rgb);
                        }
                        out.push(BLOCK);
                    }
                    None => out.push(' '),
                }
            }
            if self.colour && current.is_some() {
                out.push_str(ansi::RESET_COLOR);
            }
        }
        out
    }

    fn paint(&self, grid: &mut [Option<Rgb>], bars: &[BarRect], stops: &[GradientStop], frame: &BarRect) {
        for bar in bars {
            let (c0, c1) = covered(bar.x, bar.right(), self.columns);
            let (r0, r1) = covered(bar.y, bar.bottom(), self.rows);

            for r in r0..r1 {
                let t = if frame.height > 0.0 {
                    (r as f32 + 0.5 - frame.y) / frame.height
                } else {
                    0.0
                };
                let rgb = sample_gradient(stops, t);
                for c in c0..c1 {
                    grid[r * self.columns + c] = Some(rgb);
                }
            }
        }
    }
}

/// Cells whose centre lies inside `[start, end)`
fn covered(start: f32, end: f32, limit: usize) -> (usize, usize) {
    let first = (start - 0.5).ceil().max(0.0) as usize;
    let last = ((end - 0.5).ceil().max(0.0) as usize).min(limit);
    (first.min(last), last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Align;

    fn lines(text: &str) -> Vec<&str> {
        text.split('\n').collect()
    }

    #[test]
    fn test_covered_cells() {
        assert_eq!(covered(0.0, 2.0, 10), (0, 2));
        assert_eq!(covered(0.6, 1.4, 10), (1, 1));
        assert_eq!(covered(0.4, 1.6, 10), (0, 2));
        assert_eq!(covered(8.0, 20.0, 10), (8, 10));
    }

    #[test]
    fn test_plain_full_scale_bottom() {
        let style = BarStyle {
            align: Align::Bottom,
            bar_min_height: 0.0,
            ..BarStyle::default()
        };
        // 2 bands in 5 columns: bars of width 2 at x = 1 and x = 4
        let renderer = TerminalRenderer::new(5, 4, 2, style).plain();
        let text = renderer.render(&Spectra::new(vec![vec![1.0, 0.5]]));
        let rows = lines(&text);

        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.chars().count() == 5));
        assert_eq!(rows[0], " ██  ");
        assert_eq!(rows[3], " ██ █");
    }

    #[test]
    fn test_silence_draws_min_height_stub() {
        let style = BarStyle {
            align: Align::Center,
            bar_min_height: 2.0,
            ..BarStyle::default()
        };
        let renderer = TerminalRenderer::new(8, 6, 2, style).plain();
        let text = renderer.render(&Spectra::silent(2, 2));
        let lit: usize = lines(&text)
            .iter()
            .filter(|row| row.contains(BLOCK))
            .count();
        assert_eq!(lit, 2);
    }

    #[test]
    fn test_colour_output_resets() {
        let renderer = TerminalRenderer::new(5, 3, 2, BarStyle::default());
        let text = renderer.render(&Spectra::new(vec![vec![1.0, 1.0], vec![1.0, 1.0]]));
        assert!(text.contains("\x1b[38;2;"));
        assert!(text.ends_with(ansi::RESET_COLOR));
    }
}
