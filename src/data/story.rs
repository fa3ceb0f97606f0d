//! Story sections, milestones and the narrative controller.
//!
//! A single ordered table of sections drives both the narrative panels and
//! the milestone pauses: each section starts on a calendar date and runs
//! until the next one starts; sections flagged `pause_on_enter` are
//! milestones.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrendError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionId(pub String);

impl From<&str> for SectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Milestones are identified by the section they open.
pub type MilestoneId = SectionId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySection {
    pub id: SectionId,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub starts: NaiveDate,
    /// Auto-play pauses once when it first enters this section.
    #[serde(default)]
    pub pause_on_enter: bool,
}

impl StorySection {
    pub fn new(id: &str, title: &str, starts: NaiveDate, pause_on_enter: bool) -> Self {
        Self {
            id: SectionId::from(id),
            title: title.to_string(),
            body: String::new(),
            starts,
            pause_on_enter,
        }
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }
}

/// A milestone date extracted from the story table.
#[derive(Debug, Clone, PartialEq)]
pub struct Milestone {
    pub id: MilestoneId,
    pub date: NaiveDate,
}

/// Ordered, non-overlapping story sections.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryTable {
    sections: Vec<StorySection>,
}

impl StoryTable {
    /// Validate and wrap the sections: at least one, strictly increasing
    /// start dates and unique ids.
    pub fn new(sections: Vec<StorySection>) -> Result<Self> {
        if sections.is_empty() {
            return Err(TrendError::Configuration("story table has no sections".into()));
        }
        for w in sections.windows(2) {
            if w[1].starts <= w[0].starts {
                return Err(TrendError::Configuration(format!(
                    "story section '{}' must start after '{}'",
                    w[1].id, w[0].id
                )));
            }
        }
        let mut seen = BTreeSet::new();
        for s in &sections {
            if !seen.insert(&s.id) {
                return Err(TrendError::Configuration(format!(
                    "duplicate story section id '{}'",
                    s.id
                )));
            }
        }
        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[StorySection] {
        &self.sections
    }

    pub fn get(&self, index: usize) -> Option<&StorySection> {
        self.sections.get(index)
    }

    /// Index of the section active on `date`. Dates before the first start
    /// belong to the first section.
    pub fn section_index_for(&self, date: NaiveDate) -> usize {
        self.sections
            .partition_point(|s| s.starts <= date)
            .saturating_sub(1)
    }

    pub fn section_for(&self, date: NaiveDate) -> &StorySection {
        &self.sections[self.section_index_for(date)]
    }

    pub fn milestones(&self) -> impl Iterator<Item = Milestone> + '_ {
        self.sections.iter().filter(|s| s.pause_on_enter).map(|s| Milestone {
            id: s.id.clone(),
            date: s.starts,
        })
    }

    /// The unfired milestone reached on `date`, if any.
    ///
    /// Only the milestone opening the section active on `date` is considered,
    /// so a milestone skipped over by scrubbing does not pause playback later
    /// inside an unrelated section.
    pub fn milestone_due(
        &self,
        date: NaiveDate,
        fired: &BTreeSet<MilestoneId>,
    ) -> Option<Milestone> {
        let section = self.section_for(date);
        let due = section.pause_on_enter && date >= section.starts && !fired.contains(&section.id);
        due.then(|| Milestone {
            id: section.id.clone(),
            date: section.starts,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Narrative controller
// ─────────────────────────────────────────────────────────────────────────────

/// Side-effect surface of a narrative panel (egui side panel, DOM, test double).
pub trait NarrativeView {
    fn set_visible(&mut self, section: &SectionId, visible: bool);
    fn scroll_into_view(&mut self, section: &SectionId);
}

impl<V: NarrativeView + ?Sized> NarrativeView for std::rc::Rc<std::cell::RefCell<V>> {
    fn set_visible(&mut self, section: &SectionId, visible: bool) {
        self.borrow_mut().set_visible(section, visible);
    }
    fn scroll_into_view(&mut self, section: &SectionId) {
        self.borrow_mut().scroll_into_view(section);
    }
}

/// A change of active section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionTransition {
    pub previous: Option<SectionId>,
    pub active: SectionId,
    pub hidden: Vec<SectionId>,
}

impl SectionTransition {
    /// Hide the others, show the active section and scroll it into view.
    pub fn apply(&self, view: &mut dyn NarrativeView) {
        for id in &self.hidden {
            view.set_visible(id, false);
        }
        view.set_visible(&self.active, true);
        view.scroll_into_view(&self.active);
    }
}

/// Tracks the active story section and reports transitions exactly once.
#[derive(Debug, Clone)]
pub struct NarrativeController {
    table: StoryTable,
    active: Option<usize>,
}

impl NarrativeController {
    pub fn new(table: StoryTable) -> Self {
        Self { table, active: None }
    }

    pub fn table(&self) -> &StoryTable {
        &self.table
    }

    pub fn active(&self) -> Option<&StorySection> {
        self.active.and_then(|i| self.table.get(i))
    }

    /// Resolve the section for `date`; `Some` only when it differs from the
    /// previously active one.
    pub fn on_index_changed(&mut self, date: NaiveDate) -> Option<SectionTransition> {
        let idx = self.table.section_index_for(date);
        if self.active == Some(idx) {
            return None;
        }
        let previous = self.active.and_then(|i| self.table.get(i)).map(|s| s.id.clone());
        self.active = Some(idx);
        Some(self.transition_to(idx, previous))
    }

    /// The active section as a full transition with no predecessor, for
    /// bringing a freshly attached view in sync.
    pub fn snapshot(&self) -> Option<SectionTransition> {
        self.active.map(|idx| self.transition_to(idx, None))
    }

    fn transition_to(&self, idx: usize, previous: Option<SectionId>) -> SectionTransition {
        let hidden = self
            .table
            .sections
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, s)| s.id.clone())
            .collect();
        SectionTransition {
            previous,
            active: self.table.sections[idx].id.clone(),
            hidden,
        }
    }
}
