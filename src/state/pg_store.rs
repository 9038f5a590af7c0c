// PostgreSQL-backed store for users, events and calendar links

use crate::api::{CalendarStore, EventStore, UserStore};
use crate::core::errors::AppError;
use crate::core::models::{
    CalendarLink, Category, Event, EventChanges, EventFilter, EventId, NewEvent, NewUserRecord,
    Page, ProfileChanges, User, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::time::Duration;
use uuid::Uuid;

const SCHEMA: &str = include_str!("../../migrations/schema.sql");

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, profile_image, \
                            bio, phone, location, created_at, updated_at";

const EVENT_COLUMNS: &str = "id, title, description, category, event_date, event_time, location, \
                             area, family_name, image, created_by, likes, attendees, \
                             created_at, updated_at";

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    profile_image: Option<String>,
    bio: String,
    phone: String,
    location: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: UserId::new(r.id),
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            password_hash: r.password_hash,
            profile_image: r.profile_image,
            bio: r.bio,
            phone: r.phone,
            location: r.location,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    description: String,
    category: String,
    event_date: NaiveDate,
    event_time: String,
    location: String,
    area: String,
    family_name: String,
    image: Option<String>,
    created_by: Uuid,
    likes: Vec<Uuid>,
    attendees: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = AppError;

    fn try_from(r: EventRow) -> Result<Self, Self::Error> {
        let category = r
            .category
            .parse::<Category>()
            .map_err(|e| AppError::Store(format!("Corrupt event row {}: {}", r.id, e)))?;

        Ok(Event {
            id: EventId::new(r.id),
            title: r.title,
            description: r.description,
            category,
            date: r.event_date,
            time: r.event_time,
            location: r.location,
            area: r.area,
            family_name: r.family_name,
            image: r.image,
            created_by: UserId::new(r.created_by),
            likes: r.likes.into_iter().map(UserId::new).collect(),
            attendees: r.attendees.into_iter().map(UserId::new).collect(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(FromRow)]
struct LinkRow {
    id: Uuid,
    user_id: Uuid,
    event_id: Uuid,
    saved_at: DateTime<Utc>,
}

impl From<LinkRow> for CalendarLink {
    fn from(r: LinkRow) -> Self {
        CalendarLink {
            id: r.id,
            user: UserId::new(r.user_id),
            event: EventId::new(r.event_id),
            saved_at: r.saved_at,
        }
    }
}

/// Rewrites the generic unique-violation message with a resource-specific one
fn unique_as(message: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |err| match AppError::from(err) {
        AppError::AlreadyExists(_) => AppError::AlreadyExists(message.to_string()),
        other => other,
    }
}

/// Escape LIKE metacharacters and wrap for a substring match
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn into_events(rows: Vec<EventRow>) -> Result<Vec<Event>, AppError> {
    rows.into_iter().map(Event::try_from).collect()
}

fn push_event_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &EventFilter) {
    builder.push(" WHERE TRUE");
    if let Some(area) = &filter.area {
        builder.push(" AND area = ").push_bind(area.clone());
    }
    if let Some(category) = filter.category {
        builder.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(family_name) = &filter.family_name {
        builder.push(" AND family_name = ").push_bind(family_name.clone());
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn push_user_search(builder: &mut QueryBuilder<'_, Postgres>, search: Option<&str>) {
    if let Some(search) = search {
        let pattern = like_pattern(search);
        builder
            .push(" WHERE (first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Store backed by a shared PostgreSQL pool
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect a pool; created once at startup and shared by all requests
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| AppError::Store(format!("Failed to connect to database: {}", e)))?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Store(format!("Failed to apply schema: {}", e)))?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, record: NewUserRecord) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (id, first_name, last_name, email, password_hash) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&record.first_name)
            .bind(&record.last_name)
            .bind(record.email.trim().to_lowercase())
            .bind(&record.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(unique_as("User already exists"))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE lower(email) = lower($1)", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn update_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
    ) -> Result<Option<User>, AppError> {
        let sql = format!(
            "UPDATE users SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name), \
                bio = COALESCE($4, bio), \
                phone = COALESCE($5, phone), \
                location = COALESCE($6, location), \
                profile_image = COALESCE($7, profile_image), \
                password_hash = COALESCE($8, password_hash), \
                updated_at = now() \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.as_uuid())
            .bind(changes.first_name)
            .bind(changes.last_name)
            .bind(changes.bio)
            .bind(changes.phone)
            .bind(changes.location)
            .bind(changes.profile_image)
            .bind(changes.password_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn list_users(
        &self,
        search: Option<&str>,
        page: Page,
    ) -> Result<(Vec<User>, u64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_user_search(&mut count, search);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users", USER_COLUMNS));
        push_user_search(&mut select, search);
        select
            .push(" ORDER BY created_at ASC, id ASC LIMIT ")
            .push_bind(page.size as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows: Vec<UserRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok((rows.into_iter().map(User::from).collect(), total as u64))
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let sql = format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(uuids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn insert_event(&self, owner: UserId, event: NewEvent) -> Result<Event, AppError> {
        let sql = format!(
            "INSERT INTO events \
                (id, title, description, category, event_date, event_time, location, area, \
                 family_name, image, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {}",
            EVENT_COLUMNS
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.category.as_str())
            .bind(event.date)
            .bind(&event.time)
            .bind(&event.location)
            .bind(&event.area)
            .bind(&event.family_name)
            .bind(&event.image)
            .bind(owner.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Event::try_from(row)
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, AppError> {
        let sql = format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS);
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Event::try_from).transpose()
    }

    async fn find_many(&self, ids: &[EventId]) -> Result<Vec<Event>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let sql = format!("SELECT {} FROM events WHERE id = ANY($1)", EVENT_COLUMNS);
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(uuids)
            .fetch_all(&self.pool)
            .await?;
        into_events(rows)
    }

    async fn list_events(
        &self,
        filter: &EventFilter,
        page: Page,
    ) -> Result<(Vec<Event>, u64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events");
        push_event_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM events", EVENT_COLUMNS));
        push_event_filter(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.size as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows: Vec<EventRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok((into_events(rows)?, total as u64))
    }

    async fn update_event(
        &self,
        id: EventId,
        owner: UserId,
        changes: EventChanges,
    ) -> Result<Option<Event>, AppError> {
        let sql = format!(
            "UPDATE events SET \
                title = COALESCE($3, title), \
                description = COALESCE($4, description), \
                category = COALESCE($5, category), \
                event_date = COALESCE($6, event_date), \
                event_time = COALESCE($7, event_time), \
                location = COALESCE($8, location), \
                area = COALESCE($9, area), \
                family_name = COALESCE($10, family_name), \
                image = CASE WHEN $12 THEN $11 ELSE image END, \
                updated_at = now() \
             WHERE id = $1 AND created_by = $2 RETURNING {}",
            EVENT_COLUMNS
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id.as_uuid())
            .bind(owner.as_uuid())
            .bind(changes.title)
            .bind(changes.description)
            .bind(changes.category.map(|c| c.as_str()))
            .bind(changes.date)
            .bind(changes.time)
            .bind(changes.location)
            .bind(changes.area)
            .bind(changes.family_name)
            .bind(changes.image.clone().flatten())
            .bind(changes.image.is_some())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Event::try_from).transpose()
    }

    async fn delete_event(&self, id: EventId, owner: UserId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND created_by = $2")
            .bind(id.as_uuid())
            .bind(owner.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_like(&self, id: EventId, user: UserId) -> Result<Option<Event>, AppError> {
        let sql = format!(
            "UPDATE events SET likes = CASE WHEN $2 = ANY(likes) THEN likes \
                                            ELSE array_append(likes, $2) END \
             WHERE id = $1 RETURNING {}",
            EVENT_COLUMNS
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id.as_uuid())
            .bind(user.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Event::try_from).transpose()
    }

    async fn remove_like(&self, id: EventId, user: UserId) -> Result<Option<Event>, AppError> {
        let sql = format!(
            "UPDATE events SET likes = array_remove(likes, $2) WHERE id = $1 RETURNING {}",
            EVENT_COLUMNS
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id.as_uuid())
            .bind(user.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Event::try_from).transpose()
    }
}

#[async_trait]
impl CalendarStore for PgStore {
    async fn insert_link(&self, user: UserId, event: EventId) -> Result<CalendarLink, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            "INSERT INTO calendar_links (id, user_id, event_id) VALUES ($1, $2, $3) \
             RETURNING id, user_id, event_id, saved_at",
        )
        .bind(Uuid::new_v4())
        .bind(user.as_uuid())
        .bind(event.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(unique_as("Event already saved to calendar"))?;
        Ok(row.into())
    }

    async fn find_link(
        &self,
        user: UserId,
        event: EventId,
    ) -> Result<Option<CalendarLink>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            "SELECT id, user_id, event_id, saved_at FROM calendar_links \
             WHERE user_id = $1 AND event_id = $2",
        )
        .bind(user.as_uuid())
        .bind(event.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(CalendarLink::from))
    }

    async fn delete_link(&self, user: UserId, event: EventId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM calendar_links WHERE user_id = $1 AND event_id = $2")
            .bind(user.as_uuid())
            .bind(event.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_links(&self, user: UserId) -> Result<Vec<CalendarLink>, AppError> {
        let rows = sqlx::query_as::<_, LinkRow>(
            "SELECT id, user_id, event_id, saved_at FROM calendar_links \
             WHERE user_id = $1 ORDER BY saved_at DESC, id DESC",
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CalendarLink::from).collect())
    }
}
