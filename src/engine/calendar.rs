// Calendar save workflow - combines the event and calendar link stores

use crate::api::{CalendarStore, EventStore};
use crate::core::errors::AppError;
use crate::core::models::{CalendarLink, Event, EventId, UserId};
use std::collections::HashMap;
use tracing::{debug, warn};

const ALREADY_SAVED: &str = "Event already saved to calendar";

/// Save an event to the actor's calendar.
///
/// 1. Resolve the event (`NotFound` if absent)
/// 2. Reject an existing link for the pair (`AlreadyExists`)
/// 3. Create the link; a racing duplicate is rejected by the store's pair
///    uniqueness and reported the same way as step 2
pub async fn save_to_calendar(
    events: &dyn EventStore,
    calendar: &dyn CalendarStore,
    actor: UserId,
    event_id: EventId,
) -> Result<(CalendarLink, Event), AppError> {
    let event = events
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    if calendar.find_link(actor, event_id).await?.is_some() {
        return Err(AppError::AlreadyExists(ALREADY_SAVED.to_string()));
    }

    let link = match calendar.insert_link(actor, event_id).await {
        Ok(link) => link,
        Err(AppError::AlreadyExists(_)) => {
            warn!(user_id = %actor, event_id = %event_id, "Concurrent calendar save rejected by store");
            return Err(AppError::AlreadyExists(ALREADY_SAVED.to_string()));
        }
        Err(e) => return Err(e),
    };

    debug!(user_id = %actor, event_id = %event_id, "Event saved to calendar");
    Ok((link, event))
}

/// Remove the actor's link to an event; the actor is part of the delete filter
pub async fn remove_from_calendar(
    calendar: &dyn CalendarStore,
    actor: UserId,
    event_id: EventId,
) -> Result<(), AppError> {
    if calendar.delete_link(actor, event_id).await? {
        debug!(user_id = %actor, event_id = %event_id, "Event removed from calendar");
        Ok(())
    } else {
        Err(AppError::NotFound("Event not found in calendar".to_string()))
    }
}

/// The actor's saved events, newest-saved first. Links whose event has since
/// been deleted are skipped.
pub async fn list_calendar(
    events: &dyn EventStore,
    calendar: &dyn CalendarStore,
    actor: UserId,
) -> Result<Vec<(CalendarLink, Event)>, AppError> {
    let links = calendar.list_links(actor).await?;
    let ids: Vec<EventId> = links.iter().map(|link| link.event).collect();

    let mut by_id: HashMap<EventId, Event> = events
        .find_many(&ids)
        .await?
        .into_iter()
        .map(|event| (event.id, event))
        .collect();

    Ok(links
        .into_iter()
        .filter_map(|link| by_id.remove(&link.event).map(|event| (link, event)))
        .collect())
}
