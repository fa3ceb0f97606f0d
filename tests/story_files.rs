//! Story configuration files and the narrative table.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use trendtrace::persistence::{load_story_from_path, save_story_to_path};
use trendtrace::{SectionId, StoryConfig, StorySection, StoryTable, TrendError};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("trendtrace-{}-{}", std::process::id(), name))
}

#[test]
fn story_survives_a_yaml_file() {
    let mut cfg = StoryConfig::bitcoin();
    cfg.title = "Custom".to_string();
    cfg.timing.milestone_dwell_ms = 3000;
    let path = temp_path("story.yaml");
    save_story_to_path(&cfg, &path).unwrap();
    let back = load_story_from_path(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(back.title, "Custom");
    assert_eq!(back.timing.milestone_dwell_ms, 3000);
    assert_eq!(back.sections, cfg.sections);
    assert_eq!(back.series, cfg.series);
    assert_eq!(back.hotkeys, cfg.hotkeys);
}

#[test]
fn story_survives_a_json_file() {
    let cfg = StoryConfig::bitcoin();
    let path = temp_path("story.json");
    save_story_to_path(&cfg, &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let back = load_story_from_path(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert!(text.trim_start().starts_with('{'));
    assert_eq!(back.domain_rules, cfg.domain_rules);
}

#[test]
fn missing_story_file_is_an_io_error() {
    let result = load_story_from_path(&temp_path("does-not-exist.yaml"));
    assert!(matches!(result, Err(TrendError::Io(_))));
}

#[test]
fn sections_must_be_ordered_and_unique() {
    let a = StorySection::new("a", "A", d(2020, 1, 1), false);
    let b = StorySection::new("b", "B", d(2019, 1, 1), true);
    assert!(matches!(StoryTable::new(vec![a.clone(), b]), Err(TrendError::Configuration(_))));
    let dup = StorySection::new("a", "A again", d(2021, 1, 1), false);
    assert!(StoryTable::new(vec![a, dup]).is_err());
    assert!(StoryTable::new(Vec::new()).is_err());
}

#[test]
fn dates_map_to_exactly_one_section() {
    let table = StoryConfig::bitcoin().story_table().unwrap();
    assert_eq!(table.section_for(d(2014, 6, 1)).id, SectionId::from("phase1-intro"));
    assert_eq!(table.section_for(d(2017, 12, 1)).id, SectionId::from("2017-11-30"));
    assert_eq!(table.section_for(d(2021, 3, 11)).id, SectionId::from("2021-03-11"));
    assert_eq!(table.section_for(d(2030, 1, 1)).id, SectionId::from("2024-12-17"));
}

#[test]
fn a_fired_milestone_is_not_due_again() {
    let table = StoryConfig::bitcoin().story_table().unwrap();
    let mut fired = BTreeSet::new();
    let due = table.milestone_due(d(2016, 5, 25), &fired).unwrap();
    assert_eq!(due.id, SectionId::from("2016-05-25"));
    fired.insert(due.id);
    assert!(table.milestone_due(d(2016, 5, 26), &fired).is_none());
    // Intro of phase 1 does not pause.
    assert!(table.milestone_due(d(2015, 1, 1), &fired).is_none());
}
