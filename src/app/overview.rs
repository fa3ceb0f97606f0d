//! Static full-history overview: BTC close over time and the keyword series
//! over time, each on its own plot with a linear, "nice" y axis.
//!
//! X values are days since the Unix epoch; missing readings split a series
//! into separate runs so gaps stay visible.

use chrono::{Datelike, NaiveDate};
use eframe::egui;
use egui::{Color32, RichText};
use egui_plot::{GridMark, Legend, Line, Plot};

use crate::data::sample::Sample;
use crate::data::scale::{linear_ticks, nice_domain, Domain};
use crate::data::series::SeriesDefinition;

use super::chart::{format_interest, format_price, ChartStyle};

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;
const PRICE_COLOR: Color32 = Color32::from_rgb(255, 0, 0);
const Y_TICKS: usize = 6;
const GAP: f32 = 24.0;

pub(crate) fn date_to_x(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce() - EPOCH_DAYS_FROM_CE)
}

pub(crate) fn x_to_date(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() || x.abs() > 1e7 {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32 + EPOCH_DAYS_FROM_CE)
}

/// Consecutive `[x, value]` runs for one series; a missing or non-finite
/// value ends the current run.
pub(crate) fn gap_runs(
    samples: &[Sample],
    value: impl Fn(&Sample) -> Option<f64>,
) -> Vec<Vec<[f64; 2]>> {
    let mut runs = Vec::new();
    let mut run: Vec<[f64; 2]> = Vec::new();
    for s in samples {
        match value(s).filter(|v| v.is_finite()) {
            Some(v) => run.push([date_to_x(s.date), v]),
            None if !run.is_empty() => runs.push(std::mem::take(&mut run)),
            None => {}
        }
    }
    if !run.is_empty() {
        runs.push(run);
    }
    runs
}

/// A grid line on every January 1st between `first` and `last`.
pub(crate) fn year_marks(first: NaiveDate, last: NaiveDate) -> Vec<GridMark> {
    (first.year()..=last.year())
        .filter_map(|y| NaiveDate::from_ymd_opt(y, 1, 1))
        .filter(|d| *d >= first && *d <= last)
        .map(|d| GridMark {
            value: date_to_x(d),
            step_size: 365.0,
        })
        .collect()
}

/// Nice y domain over every run's values, `None` when there are none.
pub(crate) fn runs_domain<'a>(runs: impl IntoIterator<Item = &'a Vec<[f64; 2]>>) -> Option<Domain> {
    let (lo, hi) = runs
        .into_iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p[1]), hi.max(p[1])));
    (lo <= hi).then(|| nice_domain(lo, hi, Y_TICKS))
}

struct OverviewSeries {
    label: String,
    color: Color32,
    runs: Vec<Vec<[f64; 2]>>,
}

#[allow(clippy::too_many_arguments)]
fn overview_plot(
    ui: &mut egui::Ui,
    id: &str,
    title: &str,
    series: Vec<OverviewSeries>,
    span: (NaiveDate, NaiveDate),
    height: f32,
    style: ChartStyle,
    format_y: fn(f64) -> String,
) {
    ui.label(RichText::new(title).strong());
    let Some(y) = runs_domain(series.iter().flat_map(|s| &s.runs)) else {
        ui.weak("No values to show");
        return;
    };
    let y_ticks = linear_ticks(y, Y_TICKS);
    let y_step = match y_ticks.as_slice() {
        [a, b, ..] => b - a,
        _ => y.max - y.min,
    };
    let y_marks: Vec<GridMark> = y_ticks
        .into_iter()
        .map(|value| GridMark { value, step_size: y_step })
        .collect();
    let x_marks = year_marks(span.0, span.1);
    let (x_min, x_max) = (date_to_x(span.0), date_to_x(span.1));

    let mut plot = Plot::new(id)
        .height(height)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_drag(false)
        .allow_boxed_zoom(false)
        .allow_double_click_reset(false)
        .show_grid(style.grid)
        .x_axis_formatter(|mark, _range| {
            x_to_date(mark.value)
                .map(|d| d.format("%Y").to_string())
                .unwrap_or_default()
        })
        .y_axis_formatter(move |mark, _range| format_y(mark.value))
        .x_grid_spacer(move |_input| x_marks.clone())
        .y_grid_spacer(move |_input| y_marks.clone())
        .label_formatter(move |name, point| {
            let date = x_to_date(point.x)
                .map(|d| d.format("%b %d, %Y").to_string())
                .unwrap_or_default();
            if name.is_empty() {
                date
            } else {
                format!("{}\n{}\n{}", name, date, format_y(point.y))
            }
        });
    if style.legend {
        plot = plot.legend(Legend::default());
    }
    plot.show(ui, |plot_ui| {
        plot_ui.set_plot_bounds_x(x_min..=x_max);
        plot_ui.set_plot_bounds_y(y.min..=y.max);
        for s in series {
            for run in s.runs {
                plot_ui.line(Line::new(s.label.clone(), run).color(s.color).width(2.0));
            }
        }
    });
}

/// Draw both overview plots, stacked, filling the available height.
pub(crate) fn show_overview(
    ui: &mut egui::Ui,
    series: &[SeriesDefinition],
    samples: &[Sample],
    style: ChartStyle,
) {
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        ui.weak("Nothing to show yet");
        return;
    };
    let span = (first.date, last.date);
    // Two titles and a spacer share the height with the plots.
    let titles = 2.0 * ui.spacing().interact_size.y;
    let height = ((ui.available_height() - GAP - titles) / 2.0).max(120.0);

    let price = vec![OverviewSeries {
        label: "close".to_string(),
        color: PRICE_COLOR,
        runs: gap_runs(samples, |s| Some(s.price)),
    }];
    overview_plot(
        ui,
        "overview_price",
        "BTC Close (USD)",
        price,
        span,
        height,
        style,
        format_price,
    );

    ui.add_space(GAP);

    let interest = series
        .iter()
        .map(|def| OverviewSeries {
            label: def.label.clone(),
            color: def.look.color,
            runs: gap_runs(samples, |s| s.interest(&def.key)),
        })
        .collect();
    overview_plot(
        ui,
        "overview_interest",
        "Keyword Search Volume (Scaled)",
        interest,
        span,
        height,
        style,
        format_interest,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn epoch_day_round_trip() {
        assert_eq!(date_to_x(d(1970, 1, 1)), 0.0);
        assert_eq!(date_to_x(d(1970, 1, 11)), 10.0);
        assert_eq!(x_to_date(date_to_x(d(2021, 3, 11))), Some(d(2021, 3, 11)));
        assert_eq!(x_to_date(f64::NAN), None);
    }

    #[test]
    fn missing_values_split_runs() {
        let samples: Vec<Sample> = [Some(1.0), Some(2.0), None, Some(f64::NAN), Some(5.0), None]
            .into_iter()
            .enumerate()
            .map(|(i, v)| Sample::new(d(2020, 1, 1 + i as u32), 100.0).with_interest("nft", v))
            .collect();
        let runs = gap_runs(&samples, |s| s.interest(&"nft".into()));
        let x0 = date_to_x(d(2020, 1, 1));
        assert_eq!(runs, vec![vec![[x0, 1.0], [x0 + 1.0, 2.0]], vec![[x0 + 4.0, 5.0]]]);

        let prices = gap_runs(&samples, |s| Some(s.price));
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].len(), 6);
    }

    #[test]
    fn year_marks_inside_span() {
        let marks = year_marks(d(2015, 1, 1), d(2017, 6, 30));
        let values: Vec<f64> = marks.iter().map(|m| m.value).collect();
        let expected: Vec<f64> = [2015, 2016, 2017].map(|y| date_to_x(d(y, 1, 1))).to_vec();
        assert_eq!(values, expected);
    }

    #[test]
    fn domain_is_widened_to_nice_bounds() {
        let runs = vec![vec![[0.0, 3.2], [1.0, 47.0]], vec![[2.0, 12.0]]];
        assert_eq!(runs_domain(&runs), Some(Domain::new(0.0, 50.0)));
        let empty: Vec<Vec<[f64; 2]>> = Vec::new();
        assert_eq!(runs_domain(&empty), None);
    }
}
