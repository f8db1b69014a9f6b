use std::time::Duration;

use chrono::NaiveDate;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum VaccinationStep {
    First,
    Second,
    Booster,
}

impl VaccinationStep {
    // Dose-stage keyword as it appears in the service's motive names.
    pub fn motive_keyword(&self) -> &'static str {
        match self {
            VaccinationStep::First => "Erstimpfung",
            VaccinationStep::Second => "Zweitimpfung",
            VaccinationStep::Booster => "Auffrischung",
        }
    }

    // First-dose motives must book their second dose in the same
    // transaction.
    pub fn requires_second_dose(&self) -> bool {
        matches!(self, VaccinationStep::First)
    }
}

impl std::fmt::Display for VaccinationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VaccinationStep::First => "first",
            VaccinationStep::Second => "second",
            VaccinationStep::Booster => "booster",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub center: String,
    pub step: VaccinationStep,
    pub start_date: NaiveDate,
    pub time_window: i64,
    pub excluded_centers: Vec<String>,
    pub motive_pattern: Regex,
    pub dry_run: bool,
    pub retry_delay: Duration,
}

// Motive filter: an alternation of the requested vaccine brands when any are
// given, the dose-stage keyword otherwise. Matching is case-sensitive.
pub fn motive_pattern(step: VaccinationStep, vaccines: &[String]) -> Regex {
    let pattern = if vaccines.is_empty() {
        format!("({})", step.motive_keyword())
    } else {
        let brands: Vec<String> = vaccines.iter().map(|v| regex::escape(v)).collect();
        format!("({})", brands.join("|"))
    };
    Regex::new(&pattern).expect("escaped motive pattern is always valid")
}
