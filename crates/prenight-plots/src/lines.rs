use plotters::prelude::*;

use prenight_provider::time::mjd_to_datetime;

use crate::error::{render_err, Result};
use crate::style::{Dash, Rgb};

/// One named curve. NaN `y` values break the line.
#[derive(Debug, Clone)]
pub struct Series {
    pub name: String,
    pub colour: Rgb,
    pub dash: Dash,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    /// Runs of consecutive finite points.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for &(x, y) in &self.points {
            if x.is_finite() && y.is_finite() {
                current.push((x, y));
            } else if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

/// Time-series chart with MJD on the x axis, labelled as UTC `HH:MM`.
#[derive(Debug, Clone)]
pub struct LinePlot {
    pub title: String,
    pub y_label: String,
    pub width: u32,
    pub height: u32,
    pub series: Vec<Series>,
}

impl LinePlot {
    fn x_range(&self) -> (f64, f64) {
        bounds(self.series.iter().flat_map(|s| s.points.iter().map(|p| p.0)))
    }

    fn y_range(&self) -> (f64, f64) {
        let (lo, hi) = bounds(self.series.iter().flat_map(|s| s.points.iter().map(|p| p.1)));
        let pad = (hi - lo) * 0.05;
        (lo - pad, hi + pad)
    }

    /// Render to a standalone SVG document.
    pub fn render(&self) -> Result<String> {
        let (x0, x1) = self.x_range();
        let (y0, y1) = self.y_range();

        let mut svg = String::new();
        {
            let root =
                SVGBackend::with_string(&mut svg, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(&self.title, ("sans-serif", 18))
                .set_label_area_size(LabelAreaPosition::Left, 50)
                .set_label_area_size(LabelAreaPosition::Bottom, 40)
                .margin(10)
                .margin_right(160)
                .build_cartesian_2d(x0..x1, y0..y1)
                .map_err(render_err)?;

            chart
                .configure_mesh()
                .x_desc("Time (UTC)")
                .y_desc(self.y_label.as_str())
                .x_label_formatter(&|mjd| {
                    mjd_to_datetime(*mjd)
                        .map(|t| t.format("%H:%M").to_string())
                        .unwrap_or_default()
                })
                .draw()
                .map_err(render_err)?;

            for series in &self.series {
                let colour = RGBColor::from(series.colour);
                let style = colour.stroke_width(2);
                let mut segments = series.segments();
                if segments.is_empty() {
                    // keeps an all-NaN series in the legend
                    segments.push(Vec::new());
                }
                for (i, segment) in segments.into_iter().enumerate() {
                    let pattern = series.dash.pattern().filter(|_| !segment.is_empty());
                    let annotation = match pattern {
                        None => chart
                            .draw_series(LineSeries::new(segment, style))
                            .map_err(render_err)?,
                        Some((size, spacing)) => chart
                            .draw_series(DashedLineSeries::new(segment, size, spacing, style))
                            .map_err(render_err)?,
                    };
                    if i == 0 {
                        annotation
                            .label(series.name.as_str())
                            .legend(move |(x, y)| {
                                PathElement::new(vec![(x, y), (x + 20, y)], style)
                            });
                    }
                }
            }

            chart
                .configure_series_labels()
                .border_style(&BLACK)
                .background_style(&WHITE.mix(0.8))
                .position(SeriesLabelPosition::UpperRight)
                .draw()
                .map_err(render_err)?;

            root.present().map_err(render_err)?;
        }
        Ok(svg)
    }
}

/// Min and max of the finite values; a unit range around 0 when there are
/// none, widened when all values are equal.
fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        (0.0, 1.0)
    } else if lo == hi {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}
