use std::collections::BTreeMap;

use anyhow::Context;
use chrono::NaiveDate;

use crate::api::BookingApi;
use crate::config::SearchConfig;
use crate::models::{AppointmentRequest, AppointmentSubmission, CustomField, Patient};
use crate::prompt::Prompter;
use crate::services::scanner;

// Terminal state of one booking attempt. Only Booked ends the search.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    Booked,
    // Submit went through but the confirmation flag came back false.
    Unconfirmed,
    // The hold or finalize step reported the slot raced away.
    SlotTaken(String),
    NoSecondDose,
    NoSlots,
}

// One reservation attempt against a single (motive, practice, agenda set):
// scan, hold, optional second-dose search and finalize, edit, custom fields,
// submit, confirm. Strictly sequential; any soft failure abandons the hold
// to expire server-side.
#[allow(clippy::too_many_arguments)]
pub async fn book_appointment(
    api: &dyn BookingApi,
    prompter: &dyn Prompter,
    patient: &Patient,
    config: &SearchConfig,
    profile_id: u64,
    motive_id: u64,
    practice_id: u64,
    agenda_ids: &[u64],
) -> anyhow::Result<BookingOutcome> {
    let Some(slot) = scanner::find_first_slot(
        api,
        motive_id,
        agenda_ids,
        practice_id,
        config.start_date,
        config.time_window,
    )
    .await?
    else {
        return Ok(BookingOutcome::NoSlots);
    };
    tracing::info!(start = slot.start_date(), "best slot found");

    // Hold
    let request =
        AppointmentRequest::new(profile_id, motive_id, agenda_ids, practice_id, slot.start_date());
    let mut reply = api.create_appointment(&request).await?;
    if let Some(error) = reply.error.as_deref() {
        tracing::warn!(error, "appointment not available anymore");
        return Ok(BookingOutcome::SlotTaken(error.to_string()));
    }

    if config.step.requires_second_dose() {
        let Some(step) = slot.second_step() else {
            tracing::warn!("chosen slot carries no second-dose step");
            return Ok(BookingOutcome::NoSecondDose);
        };
        let from_date = second_dose_start(&step.start_date)?;

        let Some(second) = scanner::find_second_slot(
            api,
            motive_id,
            agenda_ids,
            practice_id,
            from_date,
            slot.start_date(),
        )
        .await?
        else {
            tracing::warn!("no second-dose slot found");
            return Ok(BookingOutcome::NoSecondDose);
        };
        tracing::info!(start = second.start_date(), "second-dose slot found");

        // Finalize: the hold payload again, now carrying the second slot.
        let finalize = request.clone().with_second_slot(second.start_date());
        reply = api.create_appointment(&finalize).await?;
        if let Some(error) = reply.error.as_deref() {
            tracing::warn!(error, "appointment not available anymore");
            return Ok(BookingOutcome::SlotTaken(error.to_string()));
        }
    }

    let appointment_id = reply
        .id
        .context("appointment reply carried no id")?;

    // The first edit fetch reveals which custom fields exist, the second is
    // scoped to the patient to pick up patient-conditional requirements.
    api.appointment_edit(&appointment_id, None).await?;
    tracing::info!(patient = %patient.full_name(), "booking appointment");
    let edit = api.appointment_edit(&appointment_id, Some(patient.id)).await?;

    let values = resolve_custom_fields(edit.required_fields(), patient, prompter)?;
    let submission = AppointmentSubmission::new(patient, values, slot.start_date());

    if config.dry_run {
        tracing::info!("dry run, stopping before the final submission");
        return Ok(BookingOutcome::Booked);
    }

    let submitted = api.submit_appointment(&appointment_id, &submission).await?;
    if let Some(redirection) = submitted.redirection.as_deref() {
        tracing::info!(redirection, "complete the booking at this address");
    }

    // Confirmation, not submission, is authoritative.
    let status = api.appointment_status(&appointment_id).await?;
    if status.confirmed {
        tracing::info!("booking confirmed");
        Ok(BookingOutcome::Booked)
    } else {
        tracing::warn!("submission accepted but the booking is not confirmed");
        Ok(BookingOutcome::Unconfirmed)
    }
}

fn second_dose_start(step_start: &str) -> anyhow::Result<NaiveDate> {
    let date_part = step_start.split('T').next().unwrap_or(step_start);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .with_context(|| format!("invalid second-dose start date: {step_start}"))
}

// Resolution priority: the COVID-contact marker gets a fixed negation,
// gender fields derive from the patient record, a server placeholder wins
// next, anything else goes to the operator.
fn resolve_custom_fields<'a>(
    fields: impl Iterator<Item = &'a CustomField>,
    patient: &Patient,
    prompter: &dyn Prompter,
) -> anyhow::Result<BTreeMap<String, String>> {
    let mut values = BTreeMap::new();
    for field in fields {
        let value = if field.id.contains("cov19") {
            "Nein".to_string()
        } else if field.label.contains("Geschlecht") {
            patient.gender_letter().to_string()
        } else if let Some(placeholder) = field.placeholder.as_deref().filter(|p| !p.is_empty()) {
            placeholder.to_string()
        } else {
            prompter.prompt(&field.label)?
        };
        values.insert(field.id.clone(), value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedPrompter(&'static str);

    impl Prompter for ScriptedPrompter {
        fn prompt(&self, _label: &str) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn patient() -> Patient {
        serde_json::from_str(
            r#"{"id": 9001, "first_name": "Erika", "last_name": "Mustermann", "gender": true}"#,
        )
        .unwrap()
    }

    fn field(id: &str, label: &str, placeholder: Option<&str>) -> CustomField {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "label": label,
            "placeholder": placeholder,
            "required": true,
        }))
        .unwrap()
    }

    #[test]
    fn test_custom_field_priority_order() {
        let fields = vec![
            field("cov19_contact", "Kontakt mit Infizierten?", Some("ignored")),
            field("sex", "Geschlecht", None),
            field("insurance", "Versicherung", Some("AOK")),
            field("free_text", "Anmerkungen", None),
        ];
        let values = resolve_custom_fields(
            fields.iter(),
            &patient(),
            &ScriptedPrompter("typed by operator"),
        )
        .unwrap();

        assert_eq!(values["cov19_contact"], "Nein");
        assert_eq!(values["sex"], "w");
        assert_eq!(values["insurance"], "AOK");
        assert_eq!(values["free_text"], "typed by operator");
    }

    #[test]
    fn test_empty_placeholder_falls_through_to_prompt() {
        let fields = vec![field("other", "Sonstiges", Some(""))];
        let values =
            resolve_custom_fields(fields.iter(), &patient(), &ScriptedPrompter("answer")).unwrap();
        assert_eq!(values["other"], "answer");
    }

    #[test]
    fn test_second_dose_start_takes_date_part() {
        let date = second_dose_start("2021-07-13T10:00:00.000+02:00").unwrap();
        assert_eq!(date, NaiveDate::parse_from_str("2021-07-13", "%Y-%m-%d").unwrap());
        assert!(second_dose_start("not-a-date").is_err());
    }
}
