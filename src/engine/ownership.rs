// Ownership policy - who may mutate events and profiles

use crate::core::errors::AppError;
use crate::core::models::UserId;

/// True iff the actor is the owner
pub fn can_mutate(actor: UserId, owner: UserId) -> bool {
    actor == owner
}

/// Fail with `Forbidden` unless the actor owns the resource.
///
/// Must run before any store write; `denial` becomes the client message.
pub fn ensure_owner(actor: UserId, owner: UserId, denial: &str) -> Result<(), AppError> {
    if can_mutate(actor, owner) {
        Ok(())
    } else {
        Err(AppError::Forbidden(denial.to_string()))
    }
}
