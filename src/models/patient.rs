use serde::{Deserialize, Serialize};

// A master patient record as served by the account endpoint. Unmodeled
// fields are kept in `extra` so the record round-trips unchanged into the
// final submission's `master_patient` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub gender: bool,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn has_phone_number(&self) -> bool {
        self.phone_number.as_deref().is_some_and(|p| !p.is_empty())
    }

    // Gender letter as the booking form expects it.
    pub fn gender_letter(&self) -> &'static str {
        if self.gender {
            "w"
        } else {
            "m"
        }
    }
}
