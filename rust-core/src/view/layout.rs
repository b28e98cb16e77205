//! Bar geometry for the two-channel spectrum view
//!
//! Left channel bars run left to right, right channel bars are mirrored so
//! the lowest band of each channel sits at opposite edges. Coordinates are in
//! whatever unit the caller draws in (points, pixels, terminal cells) with
//! the origin at the top-left corner.

use crate::spectrum::Spectra;
use serde::{Deserialize, Serialize};

/// Vertical anchoring of the bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Top,
    #[default]
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear blend, `t` = 0 gives `self`, 1 gives `other`
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

/// Colour at a relative vertical position (0 = top edge)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub colour: Rgb,
    pub location: f32,
}

/// Appearance of the spectrum bars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarStyle {
    pub align: Align,
    pub bar_width: f32,
    pub bar_space: f32,
    /// Added to every bar so silence still shows a stub
    pub bar_min_height: f32,
    pub top_space: f32,
    pub bottom_space: f32,
    pub left_low: Rgb,
    pub left_high: Rgb,
    pub right_low: Rgb,
    pub right_high: Rgb,
}

impl Default for BarStyle {
    fn default() -> Self {
        Self {
            align: Align::Center,
            bar_width: 3.0,
            bar_space: 1.0,
            bar_min_height: 10.0,
            top_space: 0.0,
            bottom_space: 0.0,
            left_low: Rgb::new(255, 197, 0),
            left_high: Rgb::new(194, 21, 0),
            right_low: Rgb::new(15, 52, 67),
            right_high: Rgb::new(52, 232, 158),
        }
    }
}

impl BarStyle {
    /// Same style with bar width and spacing fitted to `width`
    pub fn fitted(mut self, width: f32, bands: usize) -> Self {
        let (bar_width, bar_space) = fit_metrics(width, bands);
        self.bar_width = bar_width;
        self.bar_space = bar_space;
        self
    }

    pub fn left_gradient(&self) -> Vec<GradientStop> {
        gradient(self.align, self.left_low, self.left_high)
    }

    pub fn right_gradient(&self) -> Vec<GradientStop> {
        gradient(self.align, self.right_low, self.right_high)
    }
}

/// Bar width and spacing that fill `width` with `bands` bars
///
/// Bars are twice as wide as the gaps between them.
///
/// # Returns
/// `(bar_width, bar_space)`
pub fn fit_metrics(width: f32, bands: usize) -> (f32, f32) {
    if bands == 0 || width <= 0.0 {
        return (0.0, 0.0);
    }
    let space = width / (bands * 3 - 1) as f32;
    (space * 2.0, space)
}

/// Gradient stops for a given alignment
///
/// The low colour sits where every bar starts, the high colour where only
/// loud bars reach.
pub fn gradient(align: Align, low: Rgb, high: Rgb) -> Vec<GradientStop> {
    let stop = |colour, location| GradientStop { colour, location };
    match align {
        Align::Top => vec![stop(low, 0.0), stop(high, 0.4)],
        Align::Center => vec![
            stop(high, 0.0),
            stop(low, 0.47),
            stop(low, 0.53),
            stop(high, 1.0),
        ],
        Align::Bottom => vec![stop(high, 0.6), stop(low, 1.0)],
    }
}

/// Colour of a gradient at `t` (0 = top), clamping outside the stops
pub fn sample_gradient(stops: &[GradientStop], t: f32) -> Rgb {
    let Some(first) = stops.first() else {
        return Rgb::new(255, 255, 255);
    };
    if t <= first.location {
        return first.colour;
    }

    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.location {
            let span = b.location - a.location;
            if span <= f32::EPSILON {
                return b.colour;
            }
            return a.colour.lerp(b.colour, (t - a.location) / span);
        }
    }

    stops[stops.len() - 1].colour
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BarRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BarRect {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Bars for one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BarLayout {
    pub left: Vec<BarRect>,
    pub right: Vec<BarRect>,
    /// Area the gradients are stretched over
    pub frame: BarRect,
}

impl BarLayout {
    /// Lay out `spectra` in a `width` x `height` area
    ///
    /// Only the first two channels are drawn; a missing right channel yields
    /// no right bars.
    pub fn compute(spectra: &Spectra, style: &BarStyle, width: f32, height: f32) -> Self {
        let usable = (height - style.top_space - style.bottom_space).max(0.0);

        let bar = |slot: usize, amplitude: f32| {
            let x = slot as f32 * (style.bar_width + style.bar_space) + style.bar_space;
            let h = (amplitude * usable + style.bar_min_height).min(usable);
            let y = match style.align {
                Align::Top => style.top_space,
                Align::Center => height / 2.0 - h / 2.0,
                Align::Bottom => height - style.bottom_space - h,
            };
            BarRect {
                x,
                y,
                width: style.bar_width,
                height: h,
            }
        };

        let left = spectra
            .left()
            .iter()
            .enumerate()
            .map(|(i, &a)| bar(i, a))
            .collect();

        let right_bands = spectra.right();
        let count = right_bands.len();
        let right = right_bands
            .iter()
            .enumerate()
            .map(|(i, &a)| bar(count - 1 - i, a))
            .collect();

        Self {
            left,
            right,
            frame: BarRect {
                x: 0.0,
                y: style.top_space,
                width,
                height: usable,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn style(align: Align) -> BarStyle {
        BarStyle {
            align,
            ..BarStyle::default()
        }
    }

    #[test]
    fn test_left_bar_positions() {
        let spectra = Spectra::new(vec![vec![0.0, 0.5, 1.0]]);
        let layout = BarLayout::compute(&spectra, &style(Align::Bottom), 100.0, 100.0);

        let xs: Vec<f32> = layout.left.iter().map(|r| r.x).collect();
        assert_eq!(xs, vec![1.0, 5.0, 9.0]);

        // h = min(a * 100 + 10, 100)
        let hs: Vec<f32> = layout.left.iter().map(|r| r.height).collect();
        assert_eq!(hs, vec![10.0, 60.0, 100.0]);
        assert!(layout.right.is_empty());
    }

    #[test]
    fn test_right_channel_is_mirrored() {
        let spectra = Spectra::new(vec![vec![0.0; 4], vec![0.1, 0.2, 0.3, 0.4]]);
        let layout = BarLayout::compute(&spectra, &style(Align::Center), 100.0, 100.0);

        // First right band lands in the last slot
        assert!(approx(layout.right[0].x, 3.0 * 4.0 + 1.0));
        assert!(approx(layout.right[3].x, 1.0));
        assert!(approx(layout.right[0].height, 20.0));
    }

    #[test]
    fn test_alignment_y() {
        let spectra = Spectra::new(vec![vec![0.3]]);
        let mut s = style(Align::Top);
        s.top_space = 5.0;
        s.bottom_space = 15.0;

        // usable = 80, h = 0.3 * 80 + 10 = 34
        let top = BarLayout::compute(&spectra, &s, 50.0, 100.0);
        assert!(approx(top.left[0].y, 5.0));
        assert!(approx(top.left[0].height, 34.0));

        s.align = Align::Center;
        let center = BarLayout::compute(&spectra, &s, 50.0, 100.0);
        assert!(approx(center.left[0].y, 50.0 - 17.0));

        s.align = Align::Bottom;
        let bottom = BarLayout::compute(&spectra, &s, 50.0, 100.0);
        assert!(approx(bottom.left[0].y, 100.0 - 15.0 - 34.0));
        assert!(approx(bottom.frame.height, 80.0));
        assert!(approx(bottom.frame.y, 5.0));
    }

    #[test]
    fn test_fit_metrics() {
        let (width, space) = fit_metrics(239.0, 80);
        assert!(approx(space, 1.0));
        assert!(approx(width, 2.0));

        let style = BarStyle::default().fitted(239.0, 80);
        let spectra = Spectra::silent(1, 80);
        let layout = BarLayout::compute(&spectra, &style, 239.0, 50.0);
        assert!(approx(layout.left[0].x, 1.0));
        assert!(approx(layout.left[1].x - layout.left[0].x, 3.0));

        assert_eq!(fit_metrics(100.0, 0), (0.0, 0.0));
    }

    #[test]
    fn test_gradient_stops() {
        let low = Rgb::new(0, 0, 0);
        let high = Rgb::new(255, 255, 255);

        let top = gradient(Align::Top, low, high);
        assert_eq!(top.len(), 2);
        assert_eq!(top[1].location, 0.4);

        let center = gradient(Align::Center, low, high);
        assert_eq!(center.iter().map(|s| s.location).collect::<Vec<_>>(), vec![0.0, 0.47, 0.53, 1.0]);
        assert_eq!(center[0].colour, high);

        let bottom = gradient(Align::Bottom, low, high);
        assert_eq!(sample_gradient(&bottom, 0.1), high);
        assert_eq!(sample_gradient(&bottom, 1.0), low);
        let mid = sample_gradient(&bottom, 0.8);
        assert!((127..=128).contains(&mid.r));
        assert_eq!(sample_gradient(&center, 0.5), low);
    }
}
