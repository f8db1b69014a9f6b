use chrono::{Duration, NaiveDate};
use serde::Deserialize;

pub const PAGE_LIMIT: u32 = 3;

// One page of the date-keyed availability feed. `next_slot` is the server's
// cursor for where to resume the scan; a page without it is terminal.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityFeed {
    #[serde(default)]
    pub availabilities: Vec<AvailabilityDay>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub next_slot: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

// The feed serves slots either as a bare start timestamp or as an object
// carrying the pre-computed pairing with the mandatory second dose.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Slot {
    Plain(String),
    Detailed {
        start_date: String,
        #[serde(default)]
        steps: Vec<SlotStep>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotStep {
    pub start_date: String,
}

impl Slot {
    pub fn start_date(&self) -> &str {
        match self {
            Slot::Plain(start_date) => start_date,
            Slot::Detailed { start_date, .. } => start_date,
        }
    }

    // The second entry of the step list is the paired second dose; bare
    // slots have none.
    pub fn second_step(&self) -> Option<&SlotStep> {
        match self {
            Slot::Plain(_) => None,
            Slot::Detailed { steps, .. } => steps.get(1),
        }
    }
}

impl AvailabilityFeed {
    pub fn is_empty(&self) -> bool {
        self.availabilities.is_empty() || self.total == Some(0)
    }

    // First-dose pick: the last slot of the first day inside
    // [start, start + window] that has any slots. Days outside the window or
    // without slots are skipped; later matching days are never examined.
    pub fn best_slot_within(&self, start: NaiveDate, window_days: i64) -> Option<&Slot> {
        let end = start + Duration::days(window_days);
        for day in &self.availabilities {
            if day.date < start || day.date > end {
                continue;
            }
            if let Some(slot) = day.slots.last() {
                return Some(slot);
            }
        }
        None
    }

    // Second-dose pick: the last slot of the first non-empty day, with no
    // window bound.
    pub fn first_available_slot(&self) -> Option<&Slot> {
        self.availabilities
            .iter()
            .find(|day| !day.slots.is_empty())
            .and_then(|day| day.slots.last())
    }
}

// `destroy_temporary` is sent on the first-dose scan only; `first_slot`
// anchors the second-dose scan to the already-held first slot.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityQuery {
    pub start_date: NaiveDate,
    pub motive_id: u64,
    pub agenda_ids: Vec<u64>,
    pub practice_id: u64,
    pub first_slot: Option<String>,
    pub destroy_temporary: bool,
}

impl AvailabilityQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("start_date", self.start_date.format("%Y-%m-%d").to_string()),
            ("visit_motive_ids", self.motive_id.to_string()),
            ("agenda_ids", join_ids(&self.agenda_ids)),
            ("insurance_sector", "public".to_string()),
            ("practice_ids", self.practice_id.to_string()),
        ];
        if self.destroy_temporary {
            params.push(("destroy_temporary", "true".to_string()));
        }
        if let Some(first_slot) = &self.first_slot {
            params.push(("first_slot", first_slot.clone()));
        }
        params.push(("limit", PAGE_LIMIT.to_string()));
        params
    }
}

// Wire form of an agenda id list.
pub fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join("-")
}
