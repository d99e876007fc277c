//! Chart descriptions produced by analyses and rendered to PNG in the load
//! phase. Keeping the description separate from [`render`] lets analyses stay
//! pure and testable without a font stack.

pub mod render;

pub use render::render;

use crate::stats::descriptive::{quantile_sorted, sorted};
use crate::stats::dispersion::iqr_fences;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const RED: Rgb = Rgb(214, 39, 40);
    pub const BLUE: Rgb = Rgb(31, 119, 180);
    pub const GREEN: Rgb = Rgb(44, 160, 44);
    pub const ORANGE: Rgb = Rgb(255, 127, 14);
    pub const PURPLE: Rgb = Rgb(148, 103, 189);
    pub const SKY: Rgb = Rgb(135, 206, 235);
    pub const CYAN: Rgb = Rgb(23, 190, 207);
    pub const GRAY: Rgb = Rgb(127, 127, 127);
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Cycle used for per-category colouring.
    pub const PALETTE: [Rgb; 6] = [
        Rgb::RED,
        Rgb::GREEN,
        Rgb::CYAN,
        Rgb(188, 189, 34),
        Rgb(227, 119, 194),
        Rgb::BLUE,
    ];
}

/// Five-number box summary with Tukey whiskers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub fliers: Vec<f64>,
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let s = sorted(values);
        let fences = iqr_fences(&s)?;
        let inside: Vec<f64> = s.iter().copied().filter(|v| !fences.is_outlier(*v)).collect();
        Some(Self {
            q1: fences.q1,
            median: quantile_sorted(&s, 0.5)?,
            q3: fences.q3,
            lower_whisker: inside.first().copied().unwrap_or(fences.q1),
            upper_whisker: inside.last().copied().unwrap_or(fences.q3),
            fliers: s.into_iter().filter(|v| fences.is_outlier(*v)).collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Points {
        data: Vec<(f64, f64)>,
        color: Rgb,
        size: u32,
        opacity: f64,
        label: Option<String>,
    },
    Line {
        data: Vec<(f64, f64)>,
        color: Rgb,
        width: u32,
        markers: bool,
        label: Option<String>,
    },
    /// `(left, right, height)` rectangles from y = 0.
    Bars {
        bars: Vec<(f64, f64, f64)>,
        colors: Vec<Rgb>,
        opacity: f64,
        label: Option<String>,
    },
    Segments {
        segments: Vec<((f64, f64), (f64, f64))>,
        color: Rgb,
        width: u32,
        label: Option<String>,
    },
    /// Shaded region between the curve and y = 0.
    Area { data: Vec<(f64, f64)>, color: Rgb },
    BoxPlot {
        position: f64,
        stats: BoxStats,
        color: Rgb,
    },
}

impl Layer {
    pub fn points(data: Vec<(f64, f64)>, color: Rgb) -> Self {
        Layer::Points {
            data,
            color,
            size: 3,
            opacity: 0.7,
            label: None,
        }
    }

    pub fn line(data: Vec<(f64, f64)>, color: Rgb) -> Self {
        Layer::Line {
            data,
            color,
            width: 2,
            markers: false,
            label: None,
        }
    }

    pub fn bars(bars: Vec<(f64, f64, f64)>, color: Rgb) -> Self {
        Layer::Bars {
            bars,
            colors: vec![color],
            opacity: 0.8,
            label: None,
        }
    }

    /// Category bars centred on 0, 1, 2, ...
    pub fn category_bars(heights: &[f64], color: Rgb) -> Self {
        let bars = heights
            .iter()
            .enumerate()
            .map(|(i, h)| (i as f64 - 0.4, i as f64 + 0.4, *h))
            .collect();
        Layer::bars(bars, color)
    }

    pub fn with_label(mut self, text: impl Into<String>) -> Self {
        let text = Some(text.into());
        match &mut self {
            Layer::Points { label, .. }
            | Layer::Line { label, .. }
            | Layer::Bars { label, .. }
            | Layer::Segments { label, .. } => *label = text,
            Layer::Area { .. } | Layer::BoxPlot { .. } => {}
        }
        self
    }

    pub fn with_size(mut self, new_size: u32) -> Self {
        match &mut self {
            Layer::Points { size, .. } => *size = new_size,
            Layer::Line { width, .. } | Layer::Segments { width, .. } => *width = new_size,
            _ => {}
        }
        self
    }

    pub fn with_opacity(mut self, alpha: f64) -> Self {
        match &mut self {
            Layer::Points { opacity, .. } | Layer::Bars { opacity, .. } => *opacity = alpha,
            _ => {}
        }
        self
    }

    pub fn with_colors(mut self, palette: Vec<Rgb>) -> Self {
        if let Layer::Bars { colors, .. } = &mut self {
            *colors = palette;
        }
        self
    }

    pub fn with_markers(mut self) -> Self {
        if let Layer::Line { markers, .. } = &mut self {
            *markers = true;
        }
        self
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Layer::Points { label, .. }
            | Layer::Line { label, .. }
            | Layer::Bars { label, .. }
            | Layer::Segments { label, .. } => label.as_deref(),
            _ => None,
        }
    }

    /// Every coordinate the layer touches, for axis bounds.
    fn coordinates(&self) -> Vec<(f64, f64)> {
        match self {
            Layer::Points { data, .. } | Layer::Line { data, .. } => data.clone(),
            Layer::Area { data, .. } => data
                .iter()
                .flat_map(|&(x, y)| [(x, y), (x, 0.0)])
                .collect(),
            Layer::Bars { bars, .. } => bars
                .iter()
                .flat_map(|&(l, r, h)| [(l, 0.0), (r, h)])
                .collect(),
            Layer::Segments { segments, .. } => {
                segments.iter().flat_map(|&(a, b)| [a, b]).collect()
            }
            Layer::BoxPlot {
                position, stats, ..
            } => {
                let mut pts = vec![
                    (position - 0.5, stats.lower_whisker),
                    (position + 0.5, stats.upper_whisker),
                ];
                pts.extend(stats.fliers.iter().map(|f| (*position, *f)));
                pts
            }
        }
    }
}

pub const DEFAULT_SIZE: (u32, u32) = (1080, 720);

#[derive(Debug, Clone, PartialEq)]
pub struct Plot {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Tick labels for category axes; category `i` sits at x = i.
    pub x_categories: Option<Vec<String>>,
    pub layers: Vec<Layer>,
    pub size: (u32, u32),
}

impl Plot {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            x_categories: None,
            layers: Vec::new(),
            size: DEFAULT_SIZE,
        }
    }

    pub fn x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = label.into();
        self
    }

    pub fn y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = label.into();
        self
    }

    pub fn categories(mut self, categories: Vec<String>) -> Self {
        self.x_categories = Some(categories);
        self
    }

    pub fn layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn has_legend(&self) -> bool {
        self.layers.iter().any(|l| l.label().is_some())
    }

    /// Axis ranges with 5% padding; `None` when the plot has no finite data.
    pub fn bounds(&self) -> Option<((f64, f64), (f64, f64))> {
        let pts: Vec<(f64, f64)> = self
            .layers
            .iter()
            .flat_map(|l| l.coordinates())
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        if pts.is_empty() {
            return None;
        }

        let fold = |f: fn(f64, f64) -> f64, init: f64, pick: fn(&(f64, f64)) -> f64| {
            pts.iter().map(pick).fold(init, f)
        };
        let mut x = (
            fold(f64::min, f64::INFINITY, |p| p.0),
            fold(f64::max, f64::NEG_INFINITY, |p| p.0),
        );
        let y = (
            fold(f64::min, f64::INFINITY, |p| p.1),
            fold(f64::max, f64::NEG_INFINITY, |p| p.1),
        );

        if let Some(categories) = &self.x_categories {
            x = (
                x.0.min(-0.5),
                x.1.max(categories.len() as f64 - 0.5),
            );
        }

        Some((pad(x), pad(y)))
    }
}

fn pad((lo, hi): (f64, f64)) -> (f64, f64) {
    if lo == hi {
        let d = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        return (lo - d, hi + d);
    }
    let d = (hi - lo) * 0.05;
    (lo - d, hi + d)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
    pub size: (u32, u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub title: String,
    pub columns: usize,
    pub panels: Vec<Plot>,
    pub size: (u32, u32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Figure {
    Plot(Plot),
    Heatmap(Heatmap),
    Grid(Grid),
}

impl Figure {
    pub fn title(&self) -> &str {
        match self {
            Figure::Plot(p) => &p.title,
            Figure::Heatmap(h) => &h.title,
            Figure::Grid(g) => &g.title,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        match self {
            Figure::Plot(p) => p.size,
            Figure::Heatmap(h) => h.size,
            Figure::Grid(g) => g.size,
        }
    }
}

impl From<Plot> for Figure {
    fn from(plot: Plot) -> Self {
        Figure::Plot(plot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_include_bar_baseline() {
        let plot = Plot::new("bars").layer(Layer::category_bars(&[5.0, 10.0], Rgb::BLUE));
        let ((x0, x1), (y0, y1)) = plot.bounds().unwrap();
        assert!(y0 < 0.0 && y1 > 10.0);
        assert!(x0 < -0.4 && x1 > 1.4);
    }

    #[test]
    fn test_bounds_of_empty_plot() {
        assert!(Plot::new("empty").bounds().is_none());
        let flat = Plot::new("flat").layer(Layer::points(vec![(1.0, 2.0)], Rgb::RED));
        let ((x0, x1), _) = flat.bounds().unwrap();
        assert!(x0 < 1.0 && x1 > 1.0);
    }

    #[test]
    fn test_legend_detection() {
        let plot = Plot::new("p").layer(Layer::line(vec![(0.0, 0.0)], Rgb::RED));
        assert!(!plot.has_legend());
        let plot = plot.layer(Layer::points(vec![(1.0, 1.0)], Rgb::BLUE).with_label("Salary"));
        assert!(plot.has_legend());
    }

    #[test]
    fn test_box_stats() {
        let stats = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        assert_eq!(stats.median, 3.5);
        assert_eq!(stats.fliers, vec![100.0]);
        assert_eq!(stats.upper_whisker, 5.0);
        assert_eq!(stats.lower_whisker, 1.0);
    }
}
