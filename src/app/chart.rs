//! The trace chart: decaying per-series trails, animated cursors and
//! scale-aware axes, drawn with `egui_plot`.
//!
//! Everything is plotted in projected coordinates (`0..=1` on both axes) so
//! linear and log modes share one code path; axis labels invert the
//! projection back to prices and interest values.

use eframe::egui;
use egui::{Align2, Color32, RichText};
use egui_plot::{GridMark, Legend, Line, Plot, PlotPoint, Points, Text};

use crate::data::sample::Sample;
use crate::data::scale::AxisScale;
use crate::data::series::SeriesDefinition;
use crate::data::trail::TrailWindow;

use super::view::ViewState;

/// Margin around the unit square so cursors at the edges stay visible.
const PAD: f64 = 0.03;
const X_TICKS: usize = 8;
const Y_TICKS: usize = 6;

#[derive(Debug, Clone, Copy)]
pub(crate) struct ChartStyle {
    pub legend: bool,
    pub grid: bool,
    pub cursor_labels: bool,
}

/// A run of consecutive trail segments sharing one color.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Polyline {
    pub color: Color32,
    pub points: Vec<[f64; 2]>,
}

/// Merge a trail into as few polylines as possible.
///
/// Segments come oldest first so newer ones land on top. A segment whose
/// endpoints miss a value for this series is skipped and breaks the run.
pub(crate) fn trail_polylines(
    samples: &[Sample],
    trail: &TrailWindow,
    series: &SeriesDefinition,
    project: impl Fn([f64; 2]) -> [f64; 2],
) -> Vec<Polyline> {
    let mut out: Vec<Polyline> = Vec::new();
    let mut last_end: Option<usize> = None;
    for seg in &trail.segments {
        let endpoints = samples
            .get(seg.start)
            .and_then(|s| s.point(&series.key))
            .zip(samples.get(seg.end).and_then(|s| s.point(&series.key)));
        let Some((a, b)) = endpoints else {
            last_end = None;
            continue;
        };
        let color = series.look.color.gamma_multiply(seg.opacity as f32);
        match out.last_mut() {
            Some(line) if line.color == color && last_end == Some(seg.start) => {
                line.points.push(project(b))
            }
            _ => out.push(Polyline {
                color,
                points: vec![project(a), project(b)],
            }),
        }
        last_end = Some(seg.end);
    }
    out
}

/// Grid marks at the scale's ticks, in projected coordinates.
fn grid_marks(scale: &AxisScale, approx: usize) -> Vec<GridMark> {
    let ticks = scale.ticks(approx);
    let step = 1.0 / ticks.len().max(1) as f64;
    ticks
        .into_iter()
        .map(|v| GridMark {
            value: scale.project(v),
            step_size: step,
        })
        .collect()
}

pub(crate) fn format_price(v: f64) -> String {
    if v >= 1000.0 {
        let k = v / 1000.0;
        if (k - k.round()).abs() < 1e-6 {
            format!("${:.0}k", k)
        } else {
            format!("${:.1}k", k)
        }
    } else if v >= 1.0 {
        format!("${:.0}", v)
    } else {
        format!("${:.2}", v)
    }
}

pub(crate) fn format_interest(v: f64) -> String {
    if v >= 10.0 {
        format!("{:.0}", v)
    } else if v >= 1.0 {
        format!("{:.1}", v)
    } else {
        format!("{:.2}", v)
    }
}

/// Draw the chart for the view's current frame.
pub(crate) fn show_chart(
    ui: &mut egui::Ui,
    view: &ViewState,
    series: &[SeriesDefinition],
    samples: &[Sample],
    style: ChartStyle,
) -> egui::Response {
    let (Some(frame), Some(domains)) = (view.frame(), view.domains_now()) else {
        return ui.weak("Nothing to show yet");
    };
    let xs = domains.x_scale((0.0, 1.0));
    let ys = domains.y_scale((0.0, 1.0));
    let x_marks = grid_marks(&xs, X_TICKS);
    let y_marks = grid_marks(&ys, Y_TICKS);

    let mut plot = Plot::new("trend_chart")
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_drag(false)
        .allow_boxed_zoom(false)
        .allow_double_click_reset(false)
        .show_grid(style.grid)
        .x_axis_label("BTC price (USD)")
        .y_axis_label("Search interest")
        .x_axis_formatter(move |mark, _range| format_price(xs.invert(mark.value)))
        .y_axis_formatter(move |mark, _range| format_interest(ys.invert(mark.value)))
        .x_grid_spacer(move |_input| x_marks.clone())
        .y_grid_spacer(move |_input| y_marks.clone())
        .label_formatter(move |name, point| {
            if name.is_empty() {
                String::new()
            } else {
                format!(
                    "{}\n{}\n{}",
                    name,
                    format_price(xs.invert(point.x)),
                    format_interest(ys.invert(point.y))
                )
            }
        });
    if style.legend {
        plot = plot.legend(Legend::default());
    }

    plot.show(ui, |plot_ui| {
        plot_ui.set_plot_bounds_x(-PAD..=1.0 + PAD);
        plot_ui.set_plot_bounds_y(-PAD..=1.0 + PAD);

        let project = |p: [f64; 2]| [xs.project(p[0]), ys.project(p[1])];
        for def in series {
            let Some(trail) = frame.trails.iter().find(|t| t.series == def.key) else {
                continue;
            };
            for line in trail_polylines(samples, &trail.window, def, project) {
                plot_ui.line(
                    Line::new(def.label.clone(), line.points)
                        .color(line.color)
                        .width(def.look.width),
                );
            }
        }

        for def in series {
            let Some(pos) = view.cursor(&def.key) else {
                continue;
            };
            let p = project(pos);
            plot_ui.points(
                Points::new(def.label.clone(), vec![p])
                    .radius(def.look.cursor_radius)
                    .color(def.look.color),
            );
            if style.cursor_labels {
                plot_ui.text(
                    Text::new(
                        def.label.clone(),
                        PlotPoint::new(p[0] + 0.012, p[1]),
                        RichText::new(&def.label).color(def.look.color).strong(),
                    )
                    .anchor(Align2::LEFT_CENTER),
                );
            }
        }
    })
    .response
}
