// In-process store for users, events and calendar links
//
// Used when no DATABASE_URL is configured, and by tests. Each table sits behind its own
// tokio RwLock; every trait method takes a lock once, so the check-and-write inside a
// method is atomic with respect to other requests.

use crate::api::{CalendarStore, EventStore, UserStore};
use crate::core::errors::AppError;
use crate::core::models::{
    CalendarLink, Event, EventChanges, EventFilter, EventId, NewEvent, NewUserRecord, Page,
    ProfileChanges, User, UserId,
};
use crate::engine::likes::{add_to_likes, remove_from_likes};
use crate::engine::listing::user_matches_search;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Row plus insertion sequence, the tiebreaker for equal timestamps
struct Row<T> {
    seq: u64,
    value: T,
}

#[derive(Default)]
struct UserTable {
    next_seq: u64,
    rows: HashMap<UserId, Row<User>>,
    /// Unique index on lower-cased email
    by_email: HashMap<String, UserId>,
}

#[derive(Default)]
struct EventTable {
    next_seq: u64,
    rows: HashMap<EventId, Row<Event>>,
}

#[derive(Default)]
struct CalendarTable {
    next_seq: u64,
    rows: HashMap<Uuid, Row<CalendarLink>>,
    /// Unique index on (user, event)
    by_pair: HashMap<(UserId, EventId), Uuid>,
}

pub struct MemoryStore {
    users: RwLock<UserTable>,
    events: RwLock<EventTable>,
    calendar: RwLock<CalendarTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(UserTable::default()),
            events: RwLock::new(EventTable::default()),
            calendar: RwLock::new(CalendarTable::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn paginate<T: Clone>(mut rows: Vec<&Row<T>>, page: Page, newest_first: bool) -> (Vec<T>, u64) {
    if newest_first {
        rows.sort_by(|a, b| b.seq.cmp(&a.seq));
    } else {
        rows.sort_by_key(|row| row.seq);
    }
    let total = rows.len() as u64;
    let items = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.size as usize)
        .map(|row| row.value.clone())
        .collect();
    (items, total)
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, record: NewUserRecord) -> Result<User, AppError> {
        let mut table = self.users.write().await;
        let email = record.email.trim().to_lowercase();
        if table.by_email.contains_key(&email) {
            return Err(AppError::AlreadyExists("User already exists".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::generate(),
            first_name: record.first_name,
            last_name: record.last_name,
            email: email.clone(),
            password_hash: record.password_hash,
            profile_image: None,
            bio: String::new(),
            phone: String::new(),
            location: String::new(),
            created_at: now,
            updated_at: now,
        };

        let seq = table.next_seq;
        table.next_seq += 1;
        table.by_email.insert(email, user.id);
        table.rows.insert(user.id, Row { seq, value: user.clone() });
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        let table = self.users.read().await;
        Ok(table.rows.get(&id).map(|row| row.value.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let table = self.users.read().await;
        let key = email.trim().to_lowercase();
        Ok(table
            .by_email
            .get(&key)
            .and_then(|id| table.rows.get(id))
            .map(|row| row.value.clone()))
    }

    async fn update_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
    ) -> Result<Option<User>, AppError> {
        let mut table = self.users.write().await;
        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };

        let user = &mut row.value;
        if let Some(v) = changes.first_name {
            user.first_name = v;
        }
        if let Some(v) = changes.last_name {
            user.last_name = v;
        }
        if let Some(v) = changes.bio {
            user.bio = v;
        }
        if let Some(v) = changes.phone {
            user.phone = v;
        }
        if let Some(v) = changes.location {
            user.location = v;
        }
        if let Some(v) = changes.profile_image {
            user.profile_image = Some(v);
        }
        if let Some(v) = changes.password_hash {
            user.password_hash = v;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn list_users(
        &self,
        search: Option<&str>,
        page: Page,
    ) -> Result<(Vec<User>, u64), AppError> {
        let table = self.users.read().await;
        let rows = table
            .rows
            .values()
            .filter(|row| search.map_or(true, |s| user_matches_search(&row.value, s)))
            .collect();
        Ok(paginate(rows, page, false))
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, AppError> {
        let table = self.users.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| table.rows.get(id))
            .map(|row| row.value.clone())
            .collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait::async_trait]
impl EventStore for MemoryStore {
    async fn insert_event(&self, owner: UserId, event: NewEvent) -> Result<Event, AppError> {
        let mut table = self.events.write().await;
        let now = Utc::now();
        let event = Event {
            id: EventId::generate(),
            title: event.title,
            description: event.description,
            category: event.category,
            date: event.date,
            time: event.time,
            location: event.location,
            area: event.area,
            family_name: event.family_name,
            image: event.image,
            created_by: owner,
            likes: Vec::new(),
            attendees: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let seq = table.next_seq;
        table.next_seq += 1;
        table.rows.insert(event.id, Row { seq, value: event.clone() });
        Ok(event)
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, AppError> {
        let table = self.events.read().await;
        Ok(table.rows.get(&id).map(|row| row.value.clone()))
    }

    async fn find_many(&self, ids: &[EventId]) -> Result<Vec<Event>, AppError> {
        let table = self.events.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| table.rows.get(id))
            .map(|row| row.value.clone())
            .collect())
    }

    async fn list_events(
        &self,
        filter: &EventFilter,
        page: Page,
    ) -> Result<(Vec<Event>, u64), AppError> {
        let table = self.events.read().await;
        let rows = table
            .rows
            .values()
            .filter(|row| filter.matches(&row.value))
            .collect();
        Ok(paginate(rows, page, true))
    }

    async fn update_event(
        &self,
        id: EventId,
        owner: UserId,
        changes: EventChanges,
    ) -> Result<Option<Event>, AppError> {
        let mut table = self.events.write().await;
        match table.rows.get_mut(&id) {
            Some(row) if row.value.created_by == owner => {
                changes.apply_to(&mut row.value, Utc::now());
                Ok(Some(row.value.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_event(&self, id: EventId, owner: UserId) -> Result<bool, AppError> {
        let mut table = self.events.write().await;
        let owned = table
            .rows
            .get(&id)
            .is_some_and(|row| row.value.created_by == owner);
        if owned {
            table.rows.remove(&id);
        }
        Ok(owned)
    }

    async fn add_like(&self, id: EventId, user: UserId) -> Result<Option<Event>, AppError> {
        let mut table = self.events.write().await;
        Ok(table.rows.get_mut(&id).map(|row| {
            add_to_likes(&mut row.value.likes, user);
            row.value.clone()
        }))
    }

    async fn remove_like(&self, id: EventId, user: UserId) -> Result<Option<Event>, AppError> {
        let mut table = self.events.write().await;
        Ok(table.rows.get_mut(&id).map(|row| {
            remove_from_likes(&mut row.value.likes, user);
            row.value.clone()
        }))
    }
}

#[async_trait::async_trait]
impl CalendarStore for MemoryStore {
    async fn insert_link(&self, user: UserId, event: EventId) -> Result<CalendarLink, AppError> {
        let mut table = self.calendar.write().await;
        if table.by_pair.contains_key(&(user, event)) {
            return Err(AppError::AlreadyExists(
                "Event already saved to calendar".to_string(),
            ));
        }

        let link = CalendarLink {
            id: Uuid::new_v4(),
            user,
            event,
            saved_at: Utc::now(),
        };
        let seq = table.next_seq;
        table.next_seq += 1;
        table.by_pair.insert((user, event), link.id);
        table.rows.insert(link.id, Row { seq, value: link.clone() });
        Ok(link)
    }

    async fn find_link(
        &self,
        user: UserId,
        event: EventId,
    ) -> Result<Option<CalendarLink>, AppError> {
        let table = self.calendar.read().await;
        Ok(table
            .by_pair
            .get(&(user, event))
            .and_then(|id| table.rows.get(id))
            .map(|row| row.value.clone()))
    }

    async fn delete_link(&self, user: UserId, event: EventId) -> Result<bool, AppError> {
        let mut table = self.calendar.write().await;
        match table.by_pair.remove(&(user, event)) {
            Some(id) => {
                table.rows.remove(&id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_links(&self, user: UserId) -> Result<Vec<CalendarLink>, AppError> {
        let table = self.calendar.read().await;
        let mut rows: Vec<&Row<CalendarLink>> = table
            .rows
            .values()
            .filter(|row| row.value.user == user)
            .collect();
        rows.sort_by(|a, b| b.seq.cmp(&a.seq));
        Ok(rows.into_iter().map(|row| row.value.clone()).collect())
    }
}
