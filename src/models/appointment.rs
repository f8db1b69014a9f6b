use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::availability::join_ids;
use super::patient::Patient;

// Hold/finalize payload. This endpoint wants `agenda_ids` dash-joined and
// `visit_motive_ids` in string form, unlike the array forms used elsewhere.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentRequest {
    pub agenda_ids: String,
    pub appointment: AppointmentDraft,
    pub practice_ids: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_slot: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentDraft {
    pub profile_id: u64,
    pub source_action: String,
    pub start_date: String,
    pub visit_motive_ids: String,
}

impl AppointmentRequest {
    pub fn new(
        profile_id: u64,
        motive_id: u64,
        agenda_ids: &[u64],
        practice_id: u64,
        start_date: &str,
    ) -> Self {
        Self {
            agenda_ids: join_ids(agenda_ids),
            appointment: AppointmentDraft {
                profile_id,
                source_action: "profile".to_string(),
                start_date: start_date.to_string(),
                visit_motive_ids: motive_id.to_string(),
            },
            practice_ids: vec![practice_id],
            second_slot: None,
        }
    }

    pub fn with_second_slot(mut self, start_date: &str) -> Self {
        self.second_slot = Some(start_date.to_string());
        self
    }
}

// Reply to a hold/finalize POST: an id on success, an explicit error payload
// when another client raced the slot away.
#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentReply {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentEdit {
    pub appointment: AppointmentEditDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentEditDetails {
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomField {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
}

impl AppointmentEdit {
    pub fn required_fields(&self) -> impl Iterator<Item = &CustomField> {
        self.appointment.custom_fields.iter().filter(|f| f.required)
    }
}

// Final PUT body. The service expects the unused contact fields as explicit
// nulls, so the options here serialize even when None.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentSubmission {
    pub appointment: SubmissionDetails,
    pub bypass_mandatory_relative_contact_info: bool,
    pub email: Option<String>,
    pub master_patient: Patient,
    pub new_patient: bool,
    pub patient: Option<Patient>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionDetails {
    pub custom_fields_values: BTreeMap<String, String>,
    pub new_patient: bool,
    pub qualification_answers: serde_json::Map<String, serde_json::Value>,
    pub referrer_id: Option<String>,
    pub start_date: String,
}

impl AppointmentSubmission {
    pub fn new(
        patient: &Patient,
        custom_fields_values: BTreeMap<String, String>,
        start_date: &str,
    ) -> Self {
        Self {
            appointment: SubmissionDetails {
                custom_fields_values,
                new_patient: true,
                qualification_answers: serde_json::Map::new(),
                referrer_id: None,
                start_date: start_date.to_string(),
            },
            bypass_mandatory_relative_contact_info: false,
            email: None,
            master_patient: patient.clone(),
            new_patient: true,
            patient: None,
            phone_number: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReply {
    #[serde(default)]
    pub redirection: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentStatus {
    #[serde(default)]
    pub confirmed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let request = AppointmentRequest::new(42, 7, &[10, 12], 100, "2021-06-02T17:30:00");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["agenda_ids"], "10-12");
        assert_eq!(value["practice_ids"], serde_json::json!([100]));
        assert_eq!(value["appointment"]["profile_id"], 42);
        assert_eq!(value["appointment"]["source_action"], "profile");
        assert_eq!(value["appointment"]["visit_motive_ids"], "7");
        assert_eq!(value["appointment"]["start_date"], "2021-06-02T17:30:00");
        // Absent until the finalize step of a first-dose booking.
        assert!(value.get("second_slot").is_none());
    }

    #[test]
    fn test_request_with_second_slot() {
        let request = AppointmentRequest::new(42, 7, &[10], 100, "2021-06-02T17:30:00")
            .with_second_slot("2021-07-13T10:00:00");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["second_slot"], "2021-07-13T10:00:00");
    }

    #[test]
    fn test_reply_error_payload() {
        let reply: AppointmentReply =
            serde_json::from_str(r#"{"error": "slot no longer available"}"#).unwrap();
        assert!(reply.id.is_none());
        assert_eq!(reply.error.as_deref(), Some("slot no longer available"));
    }

    #[test]
    fn test_required_fields_filter() {
        let edit: AppointmentEdit = serde_json::from_str(
            r#"{"appointment": {"custom_fields": [
                {"id": "cov19_pos", "label": "Positiv getestet?", "placeholder": null, "required": true},
                {"id": "notes", "label": "Anmerkungen", "required": false}
            ]}}"#,
        )
        .unwrap();
        let required: Vec<_> = edit.required_fields().collect();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0].id, "cov19_pos");
    }

    #[test]
    fn test_submission_keeps_explicit_nulls() {
        let patient: Patient = serde_json::from_str(
            r#"{"id": 9001, "first_name": "Erika", "last_name": "Mustermann", "gender": true}"#,
        )
        .unwrap();
        let mut values = BTreeMap::new();
        values.insert("cov19_pos".to_string(), "Nein".to_string());

        let submission = AppointmentSubmission::new(&patient, values, "2021-06-02T17:30:00");
        let value = serde_json::to_value(&submission).unwrap();

        assert_eq!(value["appointment"]["custom_fields_values"]["cov19_pos"], "Nein");
        assert_eq!(value["appointment"]["new_patient"], true);
        assert_eq!(value["appointment"]["qualification_answers"], serde_json::json!({}));
        assert!(value["appointment"]["referrer_id"].is_null());
        assert_eq!(value["bypass_mandatory_relative_contact_info"], false);
        assert!(value["email"].is_null());
        assert!(value["patient"].is_null());
        assert!(value["phone_number"].is_null());
        assert_eq!(value["master_patient"]["id"], 9001);
        assert_eq!(value["new_patient"], true);
    }
}
