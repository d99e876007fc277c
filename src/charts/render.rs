//! PNG rendering of [`Figure`]s with the plotters bitmap backend.

use super::{Figure, Grid, Heatmap, Layer, Plot, Rgb};
use crate::utils::error::{Result, StatsError};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fmt::Display;
use std::path::Path;

fn draw_err<E: Display>(e: E) -> StatsError {
    StatsError::chart(e.to_string())
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

/// Renders the figure and writes it to `path` as PNG.
pub fn render(figure: &Figure, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, figure.size()).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    match figure {
        Figure::Plot(plot) => draw_plot(&root, plot)?,
        Figure::Heatmap(heatmap) => draw_heatmap(&root, heatmap)?,
        Figure::Grid(grid) => draw_grid(&root, grid)?,
    }

    root.present().map_err(draw_err)?;
    Ok(())
}

fn draw_plot<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, plot: &Plot) -> Result<()> {
    let ((x0, x1), (y0, y1)) = plot
        .bounds()
        .ok_or_else(|| StatsError::chart(format!("nothing to draw in '{}'", plot.title)))?;

    let mut chart = ChartBuilder::on(area)
        .caption(plot.title.as_str(), ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(draw_err)?;

    let categories = plot.x_categories.clone().unwrap_or_default();
    let category_label = |x: &f64| -> String {
        let i = x.round();
        if (x - i).abs() < 1e-6 && i >= 0.0 {
            categories.get(i as usize).cloned().unwrap_or_default()
        } else {
            String::new()
        }
    };

    let mut mesh = chart.configure_mesh();
    mesh.x_desc(plot.x_label.as_str())
        .y_desc(plot.y_label.as_str())
        .label_style(("sans-serif", 14));
    if plot.x_categories.is_some() {
        mesh.disable_x_mesh()
            .x_labels(categories.len() * 2 + 2)
            .x_label_formatter(&category_label);
    }
    mesh.draw().map_err(draw_err)?;

    for layer in &plot.layers {
        match layer {
            Layer::Points {
                data,
                color,
                size,
                opacity,
                label,
            } => {
                let style = rgb(*color).mix(*opacity).filled();
                let size = *size as i32;
                let anno = chart
                    .draw_series(data.iter().map(|&p| Circle::new(p, size, style)))
                    .map_err(draw_err)?;
                if let Some(label) = label {
                    anno.label(label.as_str())
                        .legend(move |(x, y)| Circle::new((x, y), 4, style));
                }
            }
            Layer::Line {
                data,
                color,
                width,
                markers,
                label,
            } => {
                let style = rgb(*color).stroke_width(*width);
                let anno = chart
                    .draw_series(LineSeries::new(data.iter().copied(), style))
                    .map_err(draw_err)?;
                if let Some(label) = label {
                    anno.label(label.as_str())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
                }
                if *markers {
                    chart
                        .draw_series(data.iter().map(|&p| Circle::new(p, 3, style.filled())))
                        .map_err(draw_err)?;
                }
            }
            Layer::Bars {
                bars,
                colors,
                opacity,
                label,
            } => {
                let palette: Vec<RGBAColor> =
                    colors.iter().map(|c| rgb(*c).mix(*opacity)).collect();
                let fallback = rgb(Rgb::BLUE).mix(*opacity);
                let anno = chart
                    .draw_series(bars.iter().enumerate().map(|(i, &(left, right, height))| {
                        let color = palette
                            .get(i % palette.len().max(1))
                            .copied()
                            .unwrap_or(fallback);
                        Rectangle::new([(left, 0.0), (right, height)], color.filled())
                    }))
                    .map_err(draw_err)?;
                if let Some(label) = label {
                    let first = palette.first().copied().unwrap_or(fallback);
                    anno.label(label.as_str()).legend(move |(x, y)| {
                        Rectangle::new([(x, y - 5), (x + 15, y + 5)], first.filled())
                    });
                }
            }
            Layer::Segments {
                segments,
                color,
                width,
                label,
            } => {
                let style = rgb(*color).stroke_width(*width);
                let anno = chart
                    .draw_series(
                        segments
                            .iter()
                            .map(|&(a, b)| PathElement::new(vec![a, b], style)),
                    )
                    .map_err(draw_err)?;
                if let Some(label) = label {
                    anno.label(label.as_str())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
                }
            }
            Layer::Area { data, color } => {
                let mut outline = data.clone();
                if let (Some(first), Some(last)) = (data.first(), data.last()) {
                    outline.push((last.0, 0.0));
                    outline.push((first.0, 0.0));
                }
                chart
                    .draw_series(std::iter::once(Polygon::new(
                        outline,
                        rgb(*color).mix(0.3).filled(),
                    )))
                    .map_err(draw_err)?;
            }
            Layer::BoxPlot {
                position,
                stats,
                color,
            } => {
                let x = *position;
                let half = 0.25;
                let fill = rgb(*color);
                chart
                    .draw_series(std::iter::once(Rectangle::new(
                        [(x - half, stats.q1), (x + half, stats.q3)],
                        fill.mix(0.5).filled(),
                    )))
                    .map_err(draw_err)?;
                let strokes = vec![
                    vec![(x - half, stats.median), (x + half, stats.median)],
                    vec![(x, stats.q3), (x, stats.upper_whisker)],
                    vec![(x, stats.q1), (x, stats.lower_whisker)],
                    vec![(x - half / 2.0, stats.upper_whisker), (x + half / 2.0, stats.upper_whisker)],
                    vec![(x - half / 2.0, stats.lower_whisker), (x + half / 2.0, stats.lower_whisker)],
                ];
                chart
                    .draw_series(
                        strokes
                            .into_iter()
                            .map(|pts| PathElement::new(pts, BLACK.stroke_width(2))),
                    )
                    .map_err(draw_err)?;
                chart
                    .draw_series(stats.fliers.iter().map(|&f| Circle::new((x, f), 3, fill.filled())))
                    .map_err(draw_err)?;
            }
        }
    }

    if plot.has_legend() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;
    }

    Ok(())
}

/// Light yellow to dark blue, like a "YlGnBu" colormap.
fn heat_color(value: f64, lo: f64, hi: f64) -> (RGBColor, RGBColor) {
    let t = if hi > lo { ((value - lo) / (hi - lo)).clamp(0.0, 1.0) } else { 0.5 };
    let blend = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    let cell = RGBColor(blend(255, 8), blend(255, 29), blend(217, 88));
    let text = if t > 0.55 { WHITE } else { BLACK };
    (cell, text)
}

fn draw_heatmap<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    heatmap: &Heatmap,
) -> Result<()> {
    let n = heatmap.labels.len();
    if n == 0 || heatmap.values.len() != n || heatmap.values.iter().any(|r| r.len() != n) {
        return Err(StatsError::chart(format!(
            "heatmap '{}' must be a non-empty square matrix",
            heatmap.title
        )));
    }

    let finite: Vec<f64> = heatmap
        .values
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let size = n as i32;
    let mut chart = ChartBuilder::on(area)
        .caption(heatmap.title.as_str(), ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(130)
        .build_cartesian_2d((0..size).into_segmented(), (0..size).into_segmented())
        .map_err(draw_err)?;

    let labels = &heatmap.labels;
    // 第 0 列畫在最上方
    let x_label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    };
    let y_label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) if *i < size => labels
            .get((size - 1 - *i) as usize)
            .cloned()
            .unwrap_or_default(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .label_style(("sans-serif", 14))
        .draw()
        .map_err(draw_err)?;

    let cells: Vec<(i32, i32, f64)> = heatmap
        .values
        .iter()
        .enumerate()
        .flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(move |(c, v)| (c as i32, size - 1 - r as i32, *v))
        })
        .collect();

    chart
        .draw_series(cells.iter().map(|&(x, y, v)| {
            Rectangle::new(
                [
                    (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                ],
                heat_color(v, lo, hi).0.filled(),
            )
        }))
        .map_err(draw_err)?;

    chart
        .draw_series(cells.iter().map(|&(x, y, v)| {
            let style = ("sans-serif", 16)
                .into_font()
                .color(&heat_color(v, lo, hi).1)
                .pos(Pos::new(HPos::Center, VPos::Center));
            Text::new(
                format!("{:.2}", v),
                (SegmentValue::CenterOf(x), SegmentValue::CenterOf(y)),
                style,
            )
        }))
        .map_err(draw_err)?;

    Ok(())
}

fn draw_grid<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, grid: &Grid) -> Result<()> {
    let columns = grid.columns.max(1);
    let rows = grid.panels.len().div_ceil(columns).max(1);
    let inner = area
        .titled(grid.title.as_str(), ("sans-serif", 30))
        .map_err(draw_err)?;

    for (panel, cell) in grid.panels.iter().zip(inner.split_evenly((rows, columns)).iter()) {
        draw_plot(cell, panel)?;
    }
    Ok(())
}
