//! Maps a filtered aggregate table to chart parameters and a plotly figure.

pub mod figure;
pub mod format;
pub mod points;

pub use figure::{figure, Figure, Theme};
pub use format::thousands;
pub use points::{hover_text, points, ChartSettings, PointSet};
