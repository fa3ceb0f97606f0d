//! Loader, scale provider and trail window through the public API.

use chrono::NaiveDate;
use trendtrace::data::trail::TrailWindow;
use trendtrace::{
    load_csv_reader, AxisScale, Ceilings, Domain, LoaderColumns, OpacityDecay, ScaleMode,
    SeriesDefinition, StoryConfig, TrendError,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn csv_rows_are_sorted_deduplicated_and_filtered() {
    let csv = "\
date,close,nft
2021-03-12,57000,40
2021-03-10,54000,12
not-a-date,1,1
2021-03-11,55000,
2021-03-11,99999,99
2021-03-13,,50
";
    let series = vec![SeriesDefinition::new("nft", "nft", 0)];
    let ds = load_csv_reader(csv.as_bytes(), &LoaderColumns::default(), &series).unwrap();
    let dates: Vec<_> = ds.dates().collect();
    assert_eq!(dates, vec![d(2021, 3, 10), d(2021, 3, 11), d(2021, 3, 12)]);
    // First row for a duplicated date wins; its missing reading stays missing.
    let s = ds.get(1).unwrap();
    assert_eq!(s.price, 55000.0);
    assert_eq!(s.interest(&"nft".into()), None);
}

#[test]
fn price_column_falls_back_to_price() {
    let csv = "date,price,nft\n2020-01-01,7200,3\n";
    let series = vec![SeriesDefinition::new("nft", "nft", 0)];
    let ds = load_csv_reader(csv.as_bytes(), &LoaderColumns::default(), &series).unwrap();
    assert_eq!(ds.samples()[0].price, 7200.0);
}

#[test]
fn search_volume_is_divided_at_load_time() {
    let cfg = StoryConfig::bitcoin();
    let csv = "date,close,bitcoin_price\n2020-01-01,7200,98.053525\n";
    let ds = load_csv_reader(csv.as_bytes(), &cfg.columns, &cfg.series).unwrap();
    let v = ds.samples()[0].interest(&"bitcoin_price".into()).unwrap();
    assert!((v - 1.0).abs() < 1e-12);
}

#[test]
fn no_valid_rows_is_an_empty_dataset() {
    let csv = "date,close\nbad,1\n2020-01-01,NaN\n";
    let err = load_csv_reader(csv.as_bytes(), &LoaderColumns::default(), &[]).unwrap_err();
    assert!(matches!(err, TrendError::EmptyDataset));
}

#[test]
fn log_projection_clamps_to_the_floor() {
    let scale = AxisScale::new(Domain::new(100.0, 1000.0), (0.0, 400.0), ScaleMode::Logarithmic);
    assert!((scale.project(100.0) - 0.0).abs() < 1e-9);
    assert!((scale.project(1000.0) - 400.0).abs() < 1e-9);
    assert!((scale.project(10.0) - 0.0).abs() < 1e-9);
    assert!((scale.project(0.0) - 0.0).abs() < 1e-9);
    assert!((scale.invert(200.0) - 316.227766).abs() < 1e-3);
}

#[test]
fn domains_follow_the_date_and_the_mode() {
    let mut scales = StoryConfig::bitcoin().scale_provider().unwrap();
    let log = scales.domains_for(d(2021, 6, 1));
    assert_eq!(log.ceilings(), Ceilings { x_max: 70_000.0, y_max: 100.0 });
    assert_eq!(log.x.min, 100.0);
    scales.set_mode(ScaleMode::Linear);
    let lin = scales.domains_for(d(2021, 6, 1));
    assert_eq!(lin.ceilings(), log.ceilings());
    assert_eq!(lin.x.min, 0.0);
}

#[test]
fn default_rules_cover_the_bitcoin_years() {
    let scales = StoryConfig::bitcoin().scale_provider().unwrap();
    let mut day = d(2015, 1, 1);
    let mut dates = Vec::new();
    while day <= d(2024, 12, 31) {
        dates.push(day);
        day = day.succ_opt().unwrap();
    }
    assert!(scales.rules().validate_coverage(dates).is_ok());
    assert!(scales.rules().validate_coverage([d(2025, 1, 1)]).is_err());
}

#[test]
fn trail_ages_grow_and_opacity_never_rises() {
    let decay = OpacityDecay::default();
    let a = TrailWindow::compute(10, &decay, None);
    let b = TrailWindow::compute(11, &decay, None);
    for seg in &a.segments {
        let later = b.segment(seg.end).unwrap();
        assert_eq!(later.age, seg.age + 1);
        assert!(later.opacity <= seg.opacity);
        assert!(later.opacity >= decay.floor_opacity);
    }
}
