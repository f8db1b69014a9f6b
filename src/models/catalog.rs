use regex::Regex;
use serde::Deserialize;

// The center booking document: everything bookable at one physical location
// group, fetched once per search pass.
#[derive(Debug, Clone, Deserialize)]
pub struct CenterCatalog {
    pub profile: Profile,
    #[serde(default)]
    pub visit_motives: Vec<VisitMotive>,
    #[serde(default)]
    pub places: Vec<Place>,
    #[serde(default)]
    pub agendas: Vec<Agenda>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisitMotive {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Place {
    pub name: String,
    #[serde(default)]
    pub practice_ids: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Agenda {
    pub id: u64,
    #[serde(default)]
    pub visit_motive_ids: Vec<u64>,
    #[serde(default)]
    pub booking_disabled: bool,
    pub practice_id: u64,
}

impl CenterCatalog {
    // Motives whose display name matches the caller's filter, in catalog
    // order. Empty is a diagnostic outcome, not an error.
    pub fn eligible_motives(&self, pattern: &Regex) -> Vec<&VisitMotive> {
        self.visit_motives
            .iter()
            .filter(|m| pattern.is_match(&m.name))
            .collect()
    }

    pub fn motive_names(&self) -> Vec<&str> {
        self.visit_motives.iter().map(|m| m.name.as_str()).collect()
    }

    // Agendas serving the motive with booking enabled, optionally restricted
    // to one practice. Empty means "skip this pair".
    pub fn agenda_ids(&self, motive_id: u64, practice_id: Option<u64>) -> Vec<u64> {
        self.agendas
            .iter()
            .filter(|a| {
                a.visit_motive_ids.contains(&motive_id)
                    && !a.booking_disabled
                    && practice_id.map_or(true, |p| a.practice_id == p)
            })
            .map(|a| a.id)
            .collect()
    }
}

impl Place {
    pub fn is_excluded(&self, excluded: &[String]) -> bool {
        excluded.iter().any(|center| self.name.contains(center))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> CenterCatalog {
        serde_json::from_str(
            r#"{
                "profile": {"id": 42},
                "visit_motives": [
                    {"id": 1, "name": "Corona-Schutzimpfung (Erstimpfung)"},
                    {"id": 2, "name": "Corona-Schutzimpfung (Zweitimpfung)"}
                ],
                "places": [
                    {"name": "Messe Berlin", "practice_ids": [100]},
                    {"name": "Flughafen Tegel", "practice_ids": [200, 201]}
                ],
                "agendas": [
                    {"id": 10, "visit_motive_ids": [1], "booking_disabled": false, "practice_id": 100},
                    {"id": 11, "visit_motive_ids": [1, 2], "booking_disabled": true, "practice_id": 100},
                    {"id": 12, "visit_motive_ids": [1], "booking_disabled": false, "practice_id": 200},
                    {"id": 13, "visit_motive_ids": [2], "booking_disabled": false, "practice_id": 100}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_eligible_motives_by_pattern() {
        let catalog = catalog();
        let pattern = Regex::new("(Erstimpfung)").unwrap();
        let motives = catalog.eligible_motives(&pattern);
        assert_eq!(motives.len(), 1);
        assert_eq!(motives[0].id, 1);
    }

    #[test]
    fn test_no_matching_motive_is_empty_not_error() {
        let catalog = catalog();
        let pattern = Regex::new("(Auffrischung)").unwrap();
        assert!(catalog.eligible_motives(&pattern).is_empty());
        assert_eq!(catalog.motive_names().len(), 2);
    }

    #[test]
    fn test_agenda_ids_skip_disabled_and_wrong_practice() {
        let catalog = catalog();
        // Agenda 11 serves the motive but is booking-disabled, 12 belongs to
        // another practice.
        assert_eq!(catalog.agenda_ids(1, Some(100)), vec![10]);
        assert_eq!(catalog.agenda_ids(1, Some(200)), vec![12]);
    }

    #[test]
    fn test_agenda_ids_without_practice_filter() {
        let catalog = catalog();
        assert_eq!(catalog.agenda_ids(1, None), vec![10, 12]);
    }

    #[test]
    fn test_agenda_ids_empty_for_unserved_motive() {
        let catalog = catalog();
        assert!(catalog.agenda_ids(99, Some(100)).is_empty());
    }

    #[test]
    fn test_place_exclusion_by_substring() {
        let catalog = catalog();
        let excluded = vec!["Messe".to_string()];
        assert!(catalog.places[0].is_excluded(&excluded));
        assert!(!catalog.places[1].is_excluded(&excluded));
        assert!(!catalog.places[0].is_excluded(&[]));
    }
}
