use crate::api::BookingApi;
use crate::config::SearchConfig;
use crate::models::Patient;
use crate::prompt::Prompter;
use crate::services::booking::{self, BookingOutcome};

// Top-level retry loop: run full search passes until one books, sleeping a
// fixed delay in between. The catalog is re-fetched on every pass since
// agendas and motives change between polls. Terminates only on success or
// external interruption.
pub async fn run(
    api: &dyn BookingApi,
    prompter: &dyn Prompter,
    patient: &Patient,
    config: &SearchConfig,
) -> anyhow::Result<()> {
    loop {
        match search_and_book(api, prompter, patient, config).await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(err) => tracing::error!(error = %err, "search pass failed"),
        }
        tokio::time::sleep(config.retry_delay).await;
    }
}

// One pass over the catalog's place × motive cross product. Every failure
// below the loop is logged and skipped so the pass can keep going.
pub async fn search_and_book(
    api: &dyn BookingApi,
    prompter: &dyn Prompter,
    patient: &Patient,
    config: &SearchConfig,
) -> anyhow::Result<bool> {
    let catalog = match api.center_catalog(&config.center).await {
        Ok(catalog) => catalog,
        Err(err) => {
            tracing::error!(error = %err, retryable = err.retryable(), "failed to load center catalog");
            return Ok(false);
        }
    };

    let motives = catalog.eligible_motives(&config.motive_pattern);
    if motives.is_empty() {
        tracing::error!(pattern = %config.motive_pattern, "no motive matches the filter");
        tracing::info!(available = catalog.motive_names().join(", "), "available motives");
        return Ok(false);
    }

    for place in &catalog.places {
        if place.is_excluded(&config.excluded_centers) {
            continue;
        }
        let Some(&practice_id) = place.practice_ids.first() else {
            continue;
        };
        tracing::info!(place = %place.name, "looking for slots");

        for motive in &motives {
            let agenda_ids = catalog.agenda_ids(motive.id, Some(practice_id));
            if agenda_ids.is_empty() {
                continue;
            }
            tracing::info!(motive = %motive.name, "trying motive");

            let attempt = booking::book_appointment(
                api,
                prompter,
                patient,
                config,
                catalog.profile.id,
                motive.id,
                practice_id,
                &agenda_ids,
            )
            .await;

            match attempt {
                Ok(BookingOutcome::Booked) => return Ok(true),
                Ok(outcome) => tracing::debug!(?outcome, "attempt did not book"),
                Err(err) => tracing::error!(error = %err, "booking attempt failed"),
            }
        }
    }

    Ok(false)
}
