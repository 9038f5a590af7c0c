// Like toggle - per (event, user) two-state machine

use crate::api::EventStore;
use crate::core::errors::AppError;
use crate::core::models::{Event, EventId, UserId};
use std::fmt;
use tracing::debug;

/// Whether a user currently likes an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    Liked,
    NotLiked,
}

impl LikeState {
    pub fn of(likes: &[UserId], user: UserId) -> Self {
        if likes.contains(&user) {
            LikeState::Liked
        } else {
            LikeState::NotLiked
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            LikeState::Liked => LikeState::NotLiked,
            LikeState::NotLiked => LikeState::Liked,
        }
    }
}

/// Result of one toggle call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    Liked,
    Unliked,
}

impl LikeOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            LikeOutcome::Liked => "Event liked",
            LikeOutcome::Unliked => "Event unliked",
        }
    }
}

impl fmt::Display for LikeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LikeOutcome::Liked => f.write_str("liked"),
            LikeOutcome::Unliked => f.write_str("unliked"),
        }
    }
}

/// Add `user` with set semantics; false if already present
pub fn add_to_likes(likes: &mut Vec<UserId>, user: UserId) -> bool {
    if likes.contains(&user) {
        return false;
    }
    likes.push(user);
    true
}

/// Remove every occurrence of `user`; false if absent
pub fn remove_from_likes(likes: &mut Vec<UserId>, user: UserId) -> bool {
    let before = likes.len();
    likes.retain(|id| *id != user);
    likes.len() != before
}

/// Flip the actor's like on an event.
///
/// The current state is read once to pick the direction; the write itself is a
/// single atomic append or remove in the store, so concurrent likes from other
/// users are never clobbered.
pub async fn toggle_like(
    events: &dyn EventStore,
    event_id: EventId,
    actor: UserId,
) -> Result<(LikeOutcome, Event), AppError> {
    let event = events
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    let (outcome, updated) = match LikeState::of(&event.likes, actor) {
        LikeState::Liked => (LikeOutcome::Unliked, events.remove_like(event_id, actor).await?),
        LikeState::NotLiked => (LikeOutcome::Liked, events.add_like(event_id, actor).await?),
    };

    // Deleted between the read and the write
    let updated = updated.ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    debug!(event_id = %event_id, user_id = %actor, outcome = %outcome, "Like toggled");
    Ok((outcome, updated))
}
