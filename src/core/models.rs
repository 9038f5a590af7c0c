//! Domain models for the events service.
//!
//! Stored records (`User`, `Event`, `CalendarLink`) are kept separate from the
//! serialized views returned to clients. `User` deliberately does not implement
//! `Serialize`: the password hash can only leave the process through a view that
//! omits it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Newtype wrapper around Uuid identifying a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(UserId)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype wrapper around Uuid identifying an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(EventId)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed set of event categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Sports,
    Music,
    Art,
    Food,
    Technology,
    Business,
    Social,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Sports,
        Category::Music,
        Category::Art,
        Category::Food,
        Category::Technology,
        Category::Business,
        Category::Social,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Sports => "Sports",
            Category::Music => "Music",
            Category::Art => "Art",
            Category::Food => "Food",
            Category::Technology => "Technology",
            Category::Business => "Business",
            Category::Social => "Social",
            Category::Other => "Other",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Invalid category '{}'", s))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored user record
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    /// Always trimmed and lower-cased
    pub email: String,
    pub password_hash: String,
    pub profile_image: Option<String>,
    pub bio: String,
    pub phone: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data needed to insert a new user
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial profile update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub profile_image: Option<String>,
    /// Freshly derived hash, never a plaintext password
    pub password_hash: Option<String>,
}

/// Stored event record
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub area: String,
    pub family_name: String,
    pub image: Option<String>,
    /// Owner, fixed at creation
    pub created_by: UserId,
    pub likes: Vec<UserId>,
    pub attendees: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated event creation data
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub area: String,
    pub family_name: String,
    pub image: Option<String>,
}

/// Validated partial event update
#[derive(Debug, Clone, Default)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub area: Option<String>,
    pub family_name: Option<String>,
    /// `Some(None)` clears the image
    pub image: Option<Option<String>>,
}

impl EventChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.location.is_none()
            && self.area.is_none()
            && self.family_name.is_none()
            && self.image.is_none()
    }

    /// Apply the changes to an event in place and refresh `updated_at`
    pub fn apply_to(&self, event: &mut Event, now: DateTime<Utc>) {
        if let Some(ref v) = self.title {
            event.title = v.clone();
        }
        if let Some(ref v) = self.description {
            event.description = v.clone();
        }
        if let Some(v) = self.category {
            event.category = v;
        }
        if let Some(v) = self.date {
            event.date = v;
        }
        if let Some(ref v) = self.time {
            event.time = v.clone();
        }
        if let Some(ref v) = self.location {
            event.location = v.clone();
        }
        if let Some(ref v) = self.area {
            event.area = v.clone();
        }
        if let Some(ref v) = self.family_name {
            event.family_name = v.clone();
        }
        if let Some(ref v) = self.image {
            event.image = v.clone();
        }
        event.updated_at = now;
    }
}

/// A user's saved-event relationship; unique per (user, event)
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarLink {
    pub id: Uuid,
    pub user: UserId,
    pub event: EventId,
    pub saved_at: DateTime<Utc>,
}

/// Conjunctive event listing filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub area: Option<String>,
    pub category: Option<Category>,
    pub family_name: Option<String>,
    /// Case-insensitive substring over title or description
    pub search: Option<String>,
}

/// One page of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    pub const DEFAULT_NUMBER: u32 = 1;
    pub const DEFAULT_SIZE: u32 = 10;
    pub const MAX_SIZE: u32 = 100;

    /// Build a page from raw query values, falling back to defaults on anything
    /// missing, non-numeric or below 1
    pub fn from_query(page: Option<&str>, size: Option<&str>) -> Self {
        let parse = |raw: Option<&str>, default: u32| {
            raw.and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|v| *v >= 1)
                .unwrap_or(default)
        };

        Self {
            number: parse(page, Self::DEFAULT_NUMBER),
            size: parse(size, Self::DEFAULT_SIZE).min(Self::MAX_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.number as u64 - 1) * self.size as u64
    }

    /// ceil(total / size)
    pub fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(self.size as u64)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: Self::DEFAULT_NUMBER,
            size: Self::DEFAULT_SIZE,
        }
    }
}

/// Public fields of a user, as embedded in other resources
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserSummary {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            profile_image: user.profile_image.clone(),
            email: None,
        }
    }

    pub fn with_email(user: &User) -> Self {
        Self {
            email: Some(user.email.clone()),
            ..Self::from_user(user)
        }
    }
}

/// A user reference that is either bare or resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(UserId),
    Resolved(UserSummary),
}

/// Event as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub area: String,
    pub family_name: String,
    pub image: Option<String>,
    /// `None` when the author record no longer exists
    pub created_by: Option<UserSummary>,
    pub likes: Vec<UserRef>,
    pub attendees: Vec<UserRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventView {
    /// View with the author resolved and likes/attendees left as ids
    pub fn new(event: Event, author: Option<UserSummary>) -> Self {
        Self {
            likes: event.likes.iter().copied().map(UserRef::Id).collect(),
            attendees: event.attendees.iter().copied().map(UserRef::Id).collect(),
            id: event.id,
            title: event.title,
            description: event.description,
            category: event.category,
            date: event.date,
            time: event.time,
            location: event.location,
            area: event.area,
            family_name: event.family_name,
            image: event.image,
            created_by: author,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

/// Full profile of a user, minus credentials
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_image: Option<String>,
    pub bio: String,
    pub phone: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_events: Option<Vec<EventView>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            profile_image: user.profile_image.clone(),
            bio: user.bio.clone(),
            phone: user.phone.clone(),
            location: user.location.clone(),
            saved_events: None,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn with_saved_events(mut self, events: Vec<EventView>) -> Self {
        self.saved_events = Some(events);
        self
    }
}

/// Calendar link as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntryView {
    pub id: Uuid,
    pub user: UserId,
    pub event: EventView,
    pub saved_at: DateTime<Utc>,
}
