// Request handlers for API endpoints

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Extension,
};
use serde_json::json;
use tracing::{info, warn};

use crate::api::extract::{parse_event_id, parse_user_id, ApiJson, ApiQuery};
use crate::api::requests::{
    EventListQuery, EventPayload, LoginRequest, ProfileUpdateRequest, RegisterRequest,
    UserListQuery,
};
use crate::api::responses::{ApiError, Envelope};
use crate::api::AppState;
use crate::auth::audit_logger::{AuditContext, AuthEvent};
use crate::auth::auth_middleware::{extract_ip_address, extract_user_agent, Actor};
use crate::core::crypto::match_password;
use crate::core::errors::AppError;
use crate::core::models::{
    CalendarEntryView, Event, EventFilter, EventView, NewUserRecord, Page, User, UserProfile,
};
use crate::engine::{calendar, likes, listing, ownership};
use crate::utils::validation::RequestValidator;

fn audit_context(headers: &HeaderMap, user: Option<&User>) -> AuditContext {
    AuditContext {
        user_id: user.map(|u| u.id),
        ip_address: extract_ip_address(headers),
        user_agent: extract_user_agent(headers),
        ..Default::default()
    }
}

/// One event with its author summary
async fn event_view(state: &AppState, event: Event) -> Result<EventView, AppError> {
    listing::with_authors(state.users.as_ref(), vec![event])
        .await?
        .pop()
        .ok_or_else(|| AppError::Store("Event view lost during author join".to_string()))
}

/// Profile plus the events the user saved to their calendar
async fn profile_with_saved_events(state: &AppState, user: &User) -> Result<UserProfile, AppError> {
    let saved = calendar::list_calendar(state.events.as_ref(), state.calendar.as_ref(), user.id).await?;
    let events = saved.into_iter().map(|(_, event)| event).collect();
    let views = listing::with_authors(state.users.as_ref(), events).await?;
    Ok(UserProfile::from_user(user).with_saved_events(views))
}

/// Health check handler
///
/// GET /api/health
pub async fn health_handler(State(app_state): State<AppState>) -> Result<Envelope, ApiError> {
    if let Err(e) = app_state.users.ping().await {
        warn!(error = %e, "Store health check failed");
        return Err(ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Service unavailable"));
    }
    Ok(Envelope::ok().message("Server is running"))
}

/// Register a new account
///
/// POST /api/auth/register
///
/// 1. Validate fields, password confirmation and email format
/// 2. Reject a taken email (the store's unique index backs this up)
/// 3. Hash the password, store the user, issue a token
pub async fn register_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<Envelope, ApiError> {
    let valid = RequestValidator::validate_registration(&request)?;

    if app_state.users.find_by_email(&valid.email).await?.is_some() {
        return Err(AppError::AlreadyExists("User already exists".to_string()).into());
    }

    let password_hash = app_state.passwords.hash_async(valid.password).await?;
    let user = app_state
        .users
        .insert_user(NewUserRecord {
            first_name: valid.first_name,
            last_name: valid.last_name,
            email: valid.email,
            password_hash,
        })
        .await?;
    let token = app_state.tokens.issue_token(user.id)?;

    app_state
        .audit_logger
        .log_auth_event(AuthEvent::Registered, audit_context(&headers, Some(&user)));
    info!(user_id = %user.id, "User registered");

    Ok(Envelope::created().field("token", token).field(
        "user",
        json!({
            "id": user.id,
            "firstName": user.first_name,
            "lastName": user.last_name,
            "email": user.email,
        }),
    ))
}

/// Log in with email and password
///
/// POST /api/auth/login
///
/// Unknown email and wrong password are indistinguishable to the client.
pub async fn login_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Envelope, ApiError> {
    let valid = RequestValidator::validate_login(&request)?;
    let invalid = || AppError::Unauthenticated("Invalid credentials".to_string());

    let Some(user) = app_state.users.find_by_email(&valid.email).await? else {
        app_state.audit_logger.log_auth_event(
            AuthEvent::LoginFailure { reason: "Unknown email".to_string() },
            audit_context(&headers, None),
        );
        return Err(invalid().into());
    };

    if !match_password(&user, &valid.password).await? {
        app_state.audit_logger.log_auth_event(
            AuthEvent::LoginFailure { reason: "Wrong password".to_string() },
            audit_context(&headers, Some(&user)),
        );
        return Err(invalid().into());
    }

    let token = app_state.tokens.issue_token(user.id)?;
    app_state
        .audit_logger
        .log_auth_event(AuthEvent::LoginSuccess, audit_context(&headers, Some(&user)));

    Ok(Envelope::ok().field("token", token).field(
        "user",
        json!({
            "id": user.id,
            "firstName": user.first_name,
            "lastName": user.last_name,
            "email": user.email,
            "profileImage": user.profile_image,
            "bio": user.bio,
            "location": user.location,
        }),
    ))
}

/// GET /api/auth/me
pub async fn me_handler(
    State(app_state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Envelope, ApiError> {
    let profile = profile_with_saved_events(&app_state, actor.user()).await?;
    Ok(Envelope::ok().field("user", profile))
}

/// List events
///
/// GET /api/events?area=&category=&familyName=&search=&page=&limit=
pub async fn list_events_handler(
    State(app_state): State<AppState>,
    ApiQuery(query): ApiQuery<EventListQuery>,
) -> Result<Envelope, ApiError> {
    let page = Page::from_query(query.page.as_deref(), query.limit.as_deref());
    let filter = EventFilter::from_query(&query);

    let found = listing::list_events(app_state.events.as_ref(), filter, page).await?;
    let events = listing::with_authors(app_state.users.as_ref(), found.items).await?;

    Ok(Envelope::ok()
        .field("count", events.len())
        .field("total", found.total)
        .field("pages", found.pages)
        .field("events", events))
}

/// GET /api/events/:id
pub async fn get_event_handler(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Envelope, ApiError> {
    let event_id = parse_event_id(&id)?;
    let event = app_state
        .events
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    let view = listing::with_details(app_state.users.as_ref(), event).await?;
    Ok(Envelope::ok().field("event", view))
}

/// Create an event owned by the caller
///
/// POST /api/events
pub async fn create_event_handler(
    State(app_state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiJson(payload): ApiJson<EventPayload>,
) -> Result<Envelope, ApiError> {
    let new_event = RequestValidator::validate_new_event(&payload)?;
    let event = app_state.events.insert_event(actor.id(), new_event).await?;

    info!(event_id = %event.id, user_id = %actor.id(), "Event created");

    let view = event_view(&app_state, event).await?;
    Ok(Envelope::created().field("event", view))
}

/// Update an event
///
/// PUT /api/events/:id
///
/// 1. Resolve the event (404)
/// 2. Ownership check before any write (403)
/// 3. Validate the partial update (400)
/// 4. Write with the owner in the filter
pub async fn update_event_handler(
    State(app_state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<EventPayload>,
) -> Result<Envelope, ApiError> {
    let event_id = parse_event_id(&id)?;
    let event = app_state
        .events
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    ownership::ensure_owner(actor.id(), event.created_by, "Not authorized to update this event")?;

    let changes = RequestValidator::validate_event_changes(&payload)?;
    let updated = app_state
        .events
        .update_event(event_id, actor.id(), changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    info!(event_id = %event_id, user_id = %actor.id(), "Event updated");

    let view = event_view(&app_state, updated).await?;
    Ok(Envelope::ok().field("event", view))
}

/// DELETE /api/events/:id
pub async fn delete_event_handler(
    State(app_state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Envelope, ApiError> {
    let event_id = parse_event_id(&id)?;
    let event = app_state
        .events
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    ownership::ensure_owner(actor.id(), event.created_by, "Not authorized to delete this event")?;

    if !app_state.events.delete_event(event_id, actor.id()).await? {
        return Err(AppError::NotFound("Event not found".to_string()).into());
    }

    info!(event_id = %event_id, user_id = %actor.id(), "Event deleted");
    Ok(Envelope::ok().message("Event deleted successfully"))
}

/// Toggle the caller's like
///
/// POST /api/events/:id/like
pub async fn toggle_like_handler(
    State(app_state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Envelope, ApiError> {
    let event_id = parse_event_id(&id)?;
    let (outcome, event) = likes::toggle_like(app_state.events.as_ref(), event_id, actor.id()).await?;

    let view = event_view(&app_state, event).await?;
    Ok(Envelope::ok().message(outcome.message()).field("event", view))
}

/// GET /api/calendar
pub async fn list_calendar_handler(
    State(app_state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Envelope, ApiError> {
    let saved =
        calendar::list_calendar(app_state.events.as_ref(), app_state.calendar.as_ref(), actor.id())
            .await?;

    let (links, events): (Vec<_>, Vec<_>) = saved.into_iter().unzip();
    let views = listing::with_authors(app_state.users.as_ref(), events).await?;

    let entries: Vec<CalendarEntryView> = links
        .into_iter()
        .zip(views)
        .map(|(link, event)| CalendarEntryView {
            id: link.id,
            user: link.user,
            event,
            saved_at: link.saved_at,
        })
        .collect();

    Ok(Envelope::ok()
        .field("count", entries.len())
        .field("events", entries))
}

/// Save an event to the caller's calendar
///
/// POST /api/calendar/:event_id
pub async fn save_to_calendar_handler(
    State(app_state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(event_id): Path<String>,
) -> Result<Envelope, ApiError> {
    let event_id = parse_event_id(&event_id)?;
    let (link, event) = calendar::save_to_calendar(
        app_state.events.as_ref(),
        app_state.calendar.as_ref(),
        actor.id(),
        event_id,
    )
    .await?;

    let entry = CalendarEntryView {
        id: link.id,
        user: link.user,
        event: event_view(&app_state, event).await?,
        saved_at: link.saved_at,
    };

    Ok(Envelope::created()
        .message("Event saved to calendar")
        .field("calendarEvent", entry))
}

/// DELETE /api/calendar/:event_id
pub async fn remove_from_calendar_handler(
    State(app_state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(event_id): Path<String>,
) -> Result<Envelope, ApiError> {
    let event_id = parse_event_id(&event_id)
        .map_err(|_| AppError::NotFound("Event not found in calendar".to_string()))?;
    calendar::remove_from_calendar(app_state.calendar.as_ref(), actor.id(), event_id).await?;

    Ok(Envelope::ok().message("Event removed from calendar"))
}

/// List users
///
/// GET /api/users?search=&page=&limit=
pub async fn list_users_handler(
    State(app_state): State<AppState>,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<Envelope, ApiError> {
    let page = Page::from_query(query.page.as_deref(), query.limit.as_deref());
    let found = listing::list_users(app_state.users.as_ref(), query.search.as_deref(), page)
        .await?
        .map(|user| UserProfile::from_user(&user));

    Ok(Envelope::ok()
        .field("count", found.items.len())
        .field("total", found.total)
        .field("pages", found.pages)
        .field("users", found.items))
}

/// GET /api/users/:id
pub async fn get_user_handler(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Envelope, ApiError> {
    let user_id = parse_user_id(&id)?;
    let user = app_state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let profile = profile_with_saved_events(&app_state, &user).await?;
    Ok(Envelope::ok().field("user", profile))
}

/// Update the caller's own profile
///
/// PUT /api/users/:id
///
/// A new password is validated and re-hashed; it is the only way a password changes.
pub async fn update_user_handler(
    State(app_state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ProfileUpdateRequest>,
) -> Result<Envelope, ApiError> {
    let forbidden = || AppError::Forbidden("Not authorized to update this profile".to_string());
    let target = id.parse().map_err(|_| forbidden())?;
    if !ownership::can_mutate(actor.id(), target) {
        return Err(forbidden().into());
    }

    let (mut changes, new_password) = RequestValidator::validate_profile_changes(&request)?;
    if let Some(password) = new_password {
        changes.password_hash = Some(app_state.passwords.hash_async(password).await?);
    }

    let user = app_state
        .users
        .update_profile(actor.id(), changes)
        .await?
        .ok_or(AppError::IdentityNotFound)?;

    info!(user_id = %user.id, "Profile updated");
    Ok(Envelope::ok().field("user", UserProfile::from_user(&user)))
}
