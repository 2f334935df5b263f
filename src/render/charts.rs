//! The four chart kinds, drawn with plotters into a [`Raster`]. Saving is
//! left to the caller.

use std::error::Error;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::raster::Raster;
use crate::color;
use crate::config::ChartSettings;
use crate::error::{AnalysisError, Result};
use crate::preprocess::MissingValueReport;
use crate::stats::{self, CorrelationMatrix, Kde};

const FONT: &str = "sans-serif";
const KDE_SAMPLES: usize = 200;
/// Extra height above the pair grid for its title.
pub const PAIR_TITLE_HEIGHT: u32 = 40;

type Root<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type DrawResult = std::result::Result<(), Box<dyn Error>>;

/// Allocate a raster, let `draw` fill it, and report plotting errors as a
/// render failure of `chart`.
fn render(
    chart: &str,
    width: u32,
    height: u32,
    draw: impl FnOnce(&Root<'_>) -> DrawResult,
) -> Result<Raster> {
    let mut raster = Raster::new(chart, width, height)?;
    {
        let root = raster.root();
        root.fill(&color::WHITE)
            .map_err(|e| AnalysisError::render(chart, e))?;
        draw(&root).map_err(|e| AnalysisError::render(chart, e))?;
        root.present()
            .map_err(|e| AnalysisError::render(chart, e))?;
    }
    Ok(raster)
}

/// Shorten `name` to `max` characters for axis labels.
fn short(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        return name.to_string();
    }
    let mut s: String = name.chars().take(max.saturating_sub(1)).collect();
    s.push('…');
    s
}

fn finite(cells: &[Option<f64>]) -> Vec<f64> {
    cells.iter().flatten().copied().filter(|v| v.is_finite()).collect()
}

/// Range of `values` padded by `fraction` of its span; degenerate ranges
/// get some width.
fn padded_range(values: &[f64], fraction: f64) -> (f64, f64) {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let pad = (hi - lo) * fraction;
    if pad > 0.0 {
        (lo - pad, hi + pad)
    } else {
        let pad = if lo == 0.0 { 0.5 } else { lo.abs() * 0.05 };
        (lo - pad, hi + pad)
    }
}

// ---------------------------------------------------------------------------
// Histogram with density overlay
// ---------------------------------------------------------------------------

/// Histogram of one numeric column with a Gaussian KDE scaled to counts.
pub fn distribution(column: &str, values: &[f64], settings: &ChartSettings) -> Result<Raster> {
    let name = format!("distribution of '{column}'");
    let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let hist = stats::histogram(&values)
        .ok_or_else(|| AnalysisError::render(&name, "column has no finite values"))?;

    let lo = hist.edges[0];
    let hi = hist.edges[hist.edges.len() - 1];
    let n = hist.counts.iter().sum::<usize>() as f64;
    let density: Vec<(f64, f64)> = Kde::fit(&values)
        .map(|kde| {
            kde.curve(lo, hi, KDE_SAMPLES)
                .into_iter()
                .map(|(x, d)| (x, d * n * hist.bin_width()))
                .collect()
        })
        .unwrap_or_default();
    let peak = density
        .iter()
        .map(|p| p.1)
        .fold(hist.max_count() as f64, f64::max);

    let bars: Vec<(f64, f64, f64)> = hist
        .counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(i, &count)| (hist.edges[i], hist.edges[i + 1], count as f64))
        .collect();

    render(&name, settings.histogram_width, settings.histogram_height, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(format!("Distribution of {column}"), (FONT, 22))
            .margin(12)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(lo..hi, 0f64..peak * 1.05)?;
        chart
            .configure_mesh()
            .light_line_style(color::GRID)
            .x_desc(column)
            .y_desc("Frequency")
            .draw()?;

        chart.draw_series(bars.iter().map(|&(x0, x1, c)| {
            Rectangle::new([(x0, 0.0), (x1, c)], color::SKY_BLUE.filled())
        }))?;
        chart.draw_series(bars.iter().map(|&(x0, x1, c)| {
            Rectangle::new([(x0, 0.0), (x1, c)], color::BAR_EDGE.stroke_width(1))
        }))?;
        chart.draw_series(LineSeries::new(
            density.iter().copied(),
            color::DENSITY_LINE.stroke_width(2),
        ))?;
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

/// Annotated correlation matrix on a blue-white-red scale centred at zero.
pub fn correlation_heatmap(
    matrix: &CorrelationMatrix,
    settings: &ChartSettings,
) -> Result<Raster> {
    let name = "correlation heatmap";
    let k = matrix.size();
    if k < 2 {
        return Err(AnalysisError::render(name, "need at least two numeric columns"));
    }
    let labels: Vec<String> = matrix.columns.iter().map(|c| short(c, 16)).collect();

    let size = settings.heatmap_size;
    render(name, size, size, |root| {
        let area = root.titled("Correlation Heatmap", (FONT, 22))?;
        let (w, h) = area.dim_in_pixel();
        let (w, h) = (w as i32, h as i32);
        let k = k as i32;
        let (left, top, right_margin, bottom_margin) = (110, 10, 90, 100);
        let cell = ((w - left - right_margin).min(h - top - bottom_margin) / k).max(1);

        let value_size = (cell / 4).clamp(9, 20);
        for i in 0..k {
            for j in 0..k {
                let r = matrix.get(i as usize, j as usize);
                let fill = color::diverging(r);
                let (x0, y0) = (left + j * cell, top + i * cell);
                let corners = [(x0, y0), (x0 + cell, y0 + cell)];
                area.draw(&Rectangle::new(corners, fill.filled()))?;
                area.draw(&Rectangle::new(corners, color::WHITE.stroke_width(1)))?;

                if cell >= 24 {
                    let text = if r.is_nan() { "nan".to_string() } else { format!("{r:.2}") };
                    let ink = color::text_on(fill);
                    let style = TextStyle::from((FONT, f64::from(value_size)).into_font())
                        .color(&ink)
                        .pos(Pos::new(HPos::Center, VPos::Center));
                    area.draw(&Text::new(text, (x0 + cell / 2, y0 + cell / 2), style))?;
                }
            }
        }

        let label_style = TextStyle::from((FONT, 12).into_font()).color(&color::AXIS);
        let row_style = label_style.pos(Pos::new(HPos::Right, VPos::Center));
        let column_style = label_style
            .transform(FontTransform::Rotate90)
            .pos(Pos::new(HPos::Left, VPos::Center));
        for (i, label) in labels.iter().enumerate() {
            let offset = i as i32 * cell + cell / 2;
            area.draw(&Text::new(label.clone(), (left - 6, top + offset), row_style.clone()))?;
            area.draw(&Text::new(
                label.clone(),
                (left + offset, top + k * cell + 6),
                column_style.clone(),
            ))?;
        }

        // colour bar from -1 (bottom) to 1 (top)
        let (bar_x, bar_w) = (left + k * cell + 25, 18);
        let (bar_top, bar_bottom) = (top, top + k * cell);
        let span = (bar_bottom - bar_top).max(1);
        for y in bar_top..bar_bottom {
            let t = 1.0 - 2.0 * f64::from(y - bar_top) / f64::from(span);
            area.draw(&Rectangle::new(
                [(bar_x, y), (bar_x + bar_w, y + 1)],
                color::diverging(t).filled(),
            ))?;
        }
        area.draw(&Rectangle::new(
            [(bar_x, bar_top), (bar_x + bar_w, bar_bottom)],
            color::AXIS.stroke_width(1),
        ))?;
        let tick_style = label_style.pos(Pos::new(HPos::Left, VPos::Center));
        for t in [-1.0f64, -0.5, 0.0, 0.5, 1.0] {
            let y = bar_top + ((1.0 - t) / 2.0 * f64::from(span)).round() as i32;
            area.draw(&PathElement::new(
                vec![(bar_x + bar_w, y), (bar_x + bar_w + 4, y)],
                color::AXIS,
            ))?;
            area.draw(&Text::new(format!("{t:.1}"), (bar_x + bar_w + 7, y), tick_style.clone()))?;
        }
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Pairwise scatter grid
// ---------------------------------------------------------------------------

/// Scatter plots for every pair of `columns`, density curves on the diagonal.
pub fn pair_grid(
    columns: &[(String, Vec<Option<f64>>)],
    settings: &ChartSettings,
) -> Result<Raster> {
    let name = "pair grid";
    let k = columns.len();
    if k < 2 {
        return Err(AnalysisError::render(name, "need at least two numeric columns"));
    }

    let cell = settings.pair_cell_size;
    let side = u32::try_from(k).unwrap_or(u32::MAX).saturating_mul(cell);
    let ranges: Vec<(f64, f64)> = columns
        .iter()
        .map(|(_, cells)| padded_range(&finite(cells), 0.05))
        .collect();
    let labels: Vec<String> = columns.iter().map(|(n, _)| short(n, 20)).collect();
    // label bands shrink with small cells so the plot area never goes negative
    let quarter = i32::try_from(cell / 4).unwrap_or(i32::MAX);
    let (x_band, y_band) = (quarter.min(32), quarter.min(50));

    render(name, side, side.saturating_add(PAIR_TITLE_HEIGHT), |root| {
        let grid = root.titled("Pairwise Relationships", (FONT, 20))?;
        for (idx, panel) in grid.split_evenly((k, k)).iter().enumerate() {
            let (row, col) = (idx / k, idx % k);
            let bottom_row = row + 1 == k;

            let curve = if row == col {
                let (lo, hi) = ranges[col];
                Kde::fit(&finite(&columns[col].1))
                    .map(|kde| kde.curve(lo, hi, KDE_SAMPLES))
                    .unwrap_or_default()
            } else {
                Vec::new()
            };
            let y_range = if row == col {
                let peak = curve.iter().map(|p| p.1).fold(0.0, f64::max);
                (0.0, if peak > 0.0 { peak * 1.1 } else { 1.0 })
            } else {
                ranges[row]
            };

            let mut chart = ChartBuilder::on(panel)
                .margin(4)
                .x_label_area_size(if bottom_row { x_band } else { 0 })
                .y_label_area_size(if col == 0 { y_band } else { 0 })
                .build_cartesian_2d(ranges[col].0..ranges[col].1, y_range.0..y_range.1)?;
            {
                let mut mesh = chart.configure_mesh();
                mesh.x_labels(3)
                    .y_labels(3)
                    .light_line_style(color::GRID)
                    .label_style((FONT, 10));
                if bottom_row {
                    mesh.x_desc(labels[col].as_str());
                }
                if col == 0 {
                    mesh.y_desc(labels[row].as_str());
                }
                mesh.draw()?;
            }

            if row == col {
                chart.draw_series(LineSeries::new(curve, color::DENSITY_LINE.stroke_width(2)))?;
            } else {
                let points = columns[col]
                    .1
                    .iter()
                    .zip(&columns[row].1)
                    .filter_map(|pair| match pair {
                        (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((*x, *y)),
                        _ => None,
                    });
                let dot = color::DENSITY_LINE.mix(0.6).filled();
                chart.draw_series(points.map(|p| Circle::new(p, 2, dot)))?;
            }
        }
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Missing values bar chart
// ---------------------------------------------------------------------------

/// One bar per column showing its null count.
pub fn missing_values(report: &MissingValueReport, settings: &ChartSettings) -> Result<Raster> {
    let name = "missing values";
    if !report.has_missing() {
        return Err(AnalysisError::render(name, "no missing values to plot"));
    }
    let entries = report.entries();
    let n = entries.len();
    let max = entries.iter().map(|e| e.1).max().unwrap_or(0) as f64;
    let labels: Vec<String> = entries.iter().map(|(c, _)| short(c, 12)).collect();
    let colors = color::generate_palette(n);

    render(name, settings.histogram_width, settings.histogram_height, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption("Missing Values by Column", (FONT, 22))
            .margin(12)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..n as f64 - 0.5, 0f64..max * 1.1)?;

        // bars sit on integer positions; only those get a column label
        let column_label = |v: &f64| {
            let i = v.round();
            if (v - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < n {
                labels[i as usize].clone()
            } else {
                String::new()
            }
        };
        let count_label = |v: &f64| format!("{v:.0}");
        chart
            .configure_mesh()
            .disable_x_mesh()
            .light_line_style(color::GRID)
            .x_labels(n.min(20))
            .x_label_formatter(&column_label)
            .y_label_formatter(&count_label)
            .y_desc("Missing Count")
            .draw()?;

        chart.draw_series(entries.iter().zip(&colors).enumerate().map(|(i, ((_, count), fill))| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *count as f64)], fill.filled())
        }))?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Column, Dataset};
    use crate::preprocess::summarize_missing;

    fn small_settings() -> ChartSettings {
        ChartSettings {
            histogram_width: 320,
            histogram_height: 200,
            heatmap_size: 300,
            pair_cell_size: 80,
        }
    }

    fn non_white(raster: &Raster) -> usize {
        raster
            .bytes()
            .chunks(3)
            .filter(|px| px.iter().any(|&b| b != 255))
            .count()
    }

    #[test]
    fn distribution_draws_bars() {
        let values: Vec<f64> = (0..200).map(|i| ((i * 37) % 101) as f64).collect();
        let raster = distribution("x", &values, &small_settings()).unwrap();
        assert_eq!((raster.width(), raster.height()), (320, 200));
        assert!(non_white(&raster) > 1000);
    }

    #[test]
    fn accented_labels_keep_their_glyphs() {
        let values: Vec<f64> = (0..50).map(|i| (i % 9) as f64).collect();
        let accented = distribution("Köln", &values, &small_settings()).unwrap();
        let placeholder = distribution("K?ln", &values, &small_settings()).unwrap();
        assert_ne!(accented.bytes(), placeholder.bytes());
    }

    #[test]
    fn distribution_of_nothing_is_a_render_error() {
        let err = distribution("x", &[], &small_settings()).err().unwrap();
        assert!(matches!(err, AnalysisError::Render { .. }));
        let err = distribution("x", &[f64::INFINITY], &small_settings()).err().unwrap();
        assert!(matches!(err, AnalysisError::Render { .. }));
    }

    #[test]
    fn heatmap_requires_two_columns() {
        let one =
            Dataset::new("d", vec![Column::numeric("a", vec![Some(1.0), Some(2.0)])]).unwrap();
        let m = CorrelationMatrix::compute(&one);
        assert!(correlation_heatmap(&m, &small_settings()).is_err());

        let two = Dataset::new(
            "d",
            vec![
                Column::numeric("a", vec![Some(1.0), Some(2.0), Some(3.0)]),
                Column::numeric("b", vec![Some(3.0), Some(1.0), Some(2.0)]),
            ],
        )
        .unwrap();
        let m = CorrelationMatrix::compute(&two);
        let raster = correlation_heatmap(&m, &small_settings()).unwrap();
        assert_eq!(raster.height(), 300);
        assert!(non_white(&raster) > 1000);
    }

    #[test]
    fn pair_grid_size_follows_columns() {
        let cols = vec![
            ("a".to_string(), vec![Some(1.0), Some(2.0), Some(4.0)]),
            ("b".to_string(), vec![Some(2.0), None, Some(1.0)]),
            ("c".to_string(), vec![Some(0.5), Some(0.7), Some(0.1)]),
        ];
        let raster = pair_grid(&cols, &small_settings()).unwrap();
        assert_eq!(raster.width(), 3 * 80);
        assert_eq!(raster.height(), 3 * 80 + PAIR_TITLE_HEIGHT);
        assert!(pair_grid(&cols[..1], &small_settings()).is_err());
    }

    #[test]
    fn oversized_pair_grid_is_a_render_error() {
        let cols: Vec<(String, Vec<Option<f64>>)> = (0..40)
            .map(|i| (format!("c{i}"), vec![Some(i as f64), Some(1.0)]))
            .collect();
        let err = pair_grid(&cols, &ChartSettings::default()).err().unwrap();
        assert!(matches!(err, AnalysisError::Render { .. }));
        assert!(err.to_string().contains("pixel limit"));
    }

    #[test]
    fn missing_chart_only_with_gaps() {
        let clean = Dataset::new("d", vec![Column::numeric("a", vec![Some(1.0)])]).unwrap();
        assert!(missing_values(&summarize_missing(&clean), &small_settings()).is_err());

        let gappy = Dataset::new("d", vec![Column::numeric("a", vec![Some(1.0), None])]).unwrap();
        assert!(missing_values(&summarize_missing(&gappy), &small_settings()).is_ok());
    }

    #[test]
    fn labels_are_shortened_by_characters() {
        assert_eq!(short("München", 10), "München");
        assert_eq!(short("Lebenszufriedenheit", 6), "Leben…");
    }
}
