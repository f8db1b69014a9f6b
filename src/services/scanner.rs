use chrono::NaiveDate;

use crate::api::BookingApi;
use crate::errors::ApiError;
use crate::models::{AvailabilityQuery, Slot};

// Windowed first-dose scan. Follows the server's `next_slot` cursor until a
// terminal page, then applies the selection policy to that page alone.
// Ok(None) means nothing bookable; transport and server failures stay errors
// so the caller can tell "nothing available" from "could not ask".
pub async fn find_first_slot(
    api: &dyn BookingApi,
    motive_id: u64,
    agenda_ids: &[u64],
    practice_id: u64,
    start_date: NaiveDate,
    time_window: i64,
) -> Result<Option<Slot>, ApiError> {
    let mut date = start_date;
    let feed = loop {
        let feed = api
            .availabilities(&AvailabilityQuery {
                start_date: date,
                motive_id,
                agenda_ids: agenda_ids.to_vec(),
                practice_id,
                first_slot: None,
                destroy_temporary: true,
            })
            .await?;

        match feed.next_slot {
            // The server decides how far to jump; it may skip weeks.
            Some(next) => {
                tracing::debug!(%next, "following availability cursor");
                date = next;
            }
            None => break feed,
        }
    };

    if feed.is_empty() {
        tracing::info!("no availabilities at this agenda set");
        return Ok(None);
    }

    let slot = feed.best_slot_within(start_date, time_window);
    if slot.is_none() {
        tracing::info!(window = time_window, "no slot inside the search window");
    }
    Ok(slot.cloned())
}

// Second-dose scan, anchored to the already-held first slot. No window bound
// and no emptiness precheck: the pick is the last slot of the first
// non-empty day the feed returns.
pub async fn find_second_slot(
    api: &dyn BookingApi,
    motive_id: u64,
    agenda_ids: &[u64],
    practice_id: u64,
    start_date: NaiveDate,
    first_slot_start: &str,
) -> Result<Option<Slot>, ApiError> {
    let feed = api
        .availabilities(&AvailabilityQuery {
            start_date,
            motive_id,
            agenda_ids: agenda_ids.to_vec(),
            practice_id,
            first_slot: Some(first_slot_start.to_string()),
            destroy_temporary: false,
        })
        .await?;

    Ok(feed.first_available_slot().cloned())
}
