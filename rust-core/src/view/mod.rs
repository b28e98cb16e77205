//! Spectrum view: bar geometry and a terminal renderer

pub mod layout;
pub mod terminal;

pub use layout::{fit_metrics, gradient, Align, BarLayout, BarRect, BarStyle, GradientStop, Rgb};
pub use terminal::TerminalRenderer;
