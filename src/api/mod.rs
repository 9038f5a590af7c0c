// Axum web server layer

use axum::{
    error_handling::HandleErrorLayer,
    extract::{Request, State},
    middleware::Next,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod requests;
pub mod responses;

use crate::auth::audit_logger::AuditLogger;
use crate::auth::auth_middleware::{auth_middleware, is_public_route, AuthState};
use crate::core::crypto::{PasswordHashing, TokenSigner};
use crate::core::errors::AppError;
use crate::core::models::{
    CalendarLink, Event, EventChanges, EventFilter, EventId, NewEvent, NewUserRecord, Page,
    ProfileChanges, User, UserId,
};

pub use crate::config::Config;

/// Application state containing all shared dependencies
///
/// Stores are trait objects so the same router runs on PostgreSQL or in memory.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore + Send + Sync>,
    pub events: Arc<dyn EventStore + Send + Sync>,
    pub calendar: Arc<dyn CalendarStore + Send + Sync>,
    pub passwords: Arc<PasswordHashing>,
    pub tokens: Arc<TokenSigner>,
    pub audit_logger: Arc<AuditLogger>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build state around one store that serves all three roles
    pub fn new<S>(store: Arc<S>, config: Config, audit_logger: AuditLogger) -> Result<Self, AppError>
    where
        S: UserStore + EventStore + CalendarStore + Send + Sync + 'static,
    {
        let passwords =
            PasswordHashing::new(config.password_hash_memory_kib, config.password_hash_iterations)?;
        let tokens = TokenSigner::new(&config.jwt_secret, config.jwt_expire);

        Ok(Self {
            users: store.clone(),
            events: store.clone(),
            calendar: store,
            passwords: Arc::new(passwords),
            tokens: Arc::new(tokens),
            audit_logger: Arc::new(audit_logger),
            config: Arc::new(config),
        })
    }

    pub fn auth_state(&self) -> Arc<AuthState> {
        Arc::new(AuthState {
            users: self.users.clone(),
            tokens: self.tokens.clone(),
            audit_logger: self.audit_logger.clone(),
        })
    }
}

/// Identity store; email is unique case-insensitively
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `AlreadyExists` when the email is taken
    async fn insert_user(&self, record: NewUserRecord) -> Result<User, AppError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn update_profile(&self, id: UserId, changes: ProfileChanges) -> Result<Option<User>, AppError>;
    /// Registration order; `search` matches first or last name
    async fn list_users(&self, search: Option<&str>, page: Page) -> Result<(Vec<User>, u64), AppError>;
    /// Missing ids are skipped
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, AppError>;
    async fn ping(&self) -> Result<(), AppError>;
}

/// Event store
#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    async fn insert_event(&self, owner: UserId, event: NewEvent) -> Result<Event, AppError>;
    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, AppError>;
    async fn find_many(&self, ids: &[EventId]) -> Result<Vec<Event>, AppError>;
    /// Newest first, with the total number of matches
    async fn list_events(&self, filter: &EventFilter, page: Page) -> Result<(Vec<Event>, u64), AppError>;
    /// `None` unless an event with this id AND owner exists
    async fn update_event(
        &self,
        id: EventId,
        owner: UserId,
        changes: EventChanges,
    ) -> Result<Option<Event>, AppError>;
    async fn delete_event(&self, id: EventId, owner: UserId) -> Result<bool, AppError>;
    /// Atomic set-insert into `likes`; `None` if the event is gone
    async fn add_like(&self, id: EventId, user: UserId) -> Result<Option<Event>, AppError>;
    /// Atomic removal from `likes`; `None` if the event is gone
    async fn remove_like(&self, id: EventId, user: UserId) -> Result<Option<Event>, AppError>;
}

/// Calendar link store; (user, event) is unique
#[async_trait::async_trait]
pub trait CalendarStore: Send + Sync {
    /// Fails with `AlreadyExists` when the pair is already linked
    async fn insert_link(&self, user: UserId, event: EventId) -> Result<CalendarLink, AppError>;
    async fn find_link(&self, user: UserId, event: EventId) -> Result<Option<CalendarLink>, AppError>;
    /// Single delete filtered on both user and event
    async fn delete_link(&self, user: UserId, event: EventId) -> Result<bool, AppError>;
    /// Newest-saved first
    async fn list_links(&self, user: UserId) -> Result<Vec<CalendarLink>, AppError>;
}

/// Create the Axum router with all routes and middleware
///
/// Middleware stack (outermost to innermost):
/// - Error envelope for bare error responses (unmatched routes, body limit)
/// - Tracing (tower-http::trace)
/// - CORS, permissive
/// - Request timeout (tower::timeout), rendered as 408
/// - Body size limit (tower-http::limit)
/// - Authorization guard, on matched routes except the public ones
pub fn create_router(app_state: &AppState) -> Router<AppState> {
    let auth_state = app_state.auth_state();

    let router = Router::new()
        .route("/api/health", get(handlers::health_handler))
        .route("/api/auth/register", post(handlers::register_handler))
        .route("/api/auth/login", post(handlers::login_handler))
        .route("/api/auth/me", get(handlers::me_handler))
        .route(
            "/api/events",
            get(handlers::list_events_handler).post(handlers::create_event_handler),
        )
        .route(
            "/api/events/:id",
            get(handlers::get_event_handler)
                .put(handlers::update_event_handler)
                .delete(handlers::delete_event_handler),
        )
        .route("/api/events/:id/like", post(handlers::toggle_like_handler))
        .route("/api/calendar", get(handlers::list_calendar_handler))
        .route(
            "/api/calendar/:event_id",
            post(handlers::save_to_calendar_handler).delete(handlers::remove_from_calendar_handler),
        )
        .route("/api/users", get(handlers::list_users_handler))
        .route(
            "/api/users/:id",
            get(handlers::get_user_handler).put(handlers::update_user_handler),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            auth_state,
            |state: State<Arc<AuthState>>, request: Request, next: Next| async move {
                if is_public_route(request.method(), request.uri().path()) {
                    return Ok(next.run(request).await);
                }
                auth_middleware(state, request, next).await
            },
        ));

    let timeout_stack = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(middleware::handle_timeout_error))
        .timeout(app_state.config.request_timeout())
        .into_inner();

    router
        .layer(middleware::body_size_limit_layer(app_state.config.body_size_limit_bytes))
        .layer(timeout_stack)
        .layer(middleware::cors_layer())
        .layer(middleware::tracing_layer())
        .layer(axum::middleware::map_response(middleware::envelope_bare_errors))
}
