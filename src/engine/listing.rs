// Listing composition - filters, pagination and author joins

use crate::api::requests::EventListQuery;
use crate::api::{EventStore, UserStore};
use crate::core::errors::AppError;
use crate::core::models::{
    Category, Event, EventFilter, EventView, Page, User, UserId, UserRef, UserSummary,
};
use std::collections::HashMap;

/// One page of results plus the totals needed by clients
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub pages: u64,
}

impl<T> Listing<T> {
    pub fn new(items: Vec<T>, total: u64, page: Page) -> Self {
        Self {
            items,
            total,
            pages: page.page_count(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            pages: 0,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Listing<U> {
        Listing {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            pages: self.pages,
        }
    }
}

impl EventFilter {
    /// Build a filter from the list query.
    ///
    /// Returns `None` when the query can match nothing (an unknown category),
    /// so callers can skip the store entirely. Blank values are ignored.
    pub fn from_query(query: &EventListQuery) -> Option<Self> {
        let category = match non_blank(&query.category) {
            Some(raw) => Some(raw.parse::<Category>().ok()?),
            None => None,
        };

        Some(Self {
            area: non_blank(&query.area).map(str::to_string),
            category,
            family_name: non_blank(&query.family_name).map(str::to_string),
            search: non_blank(&query.search).map(str::to_string),
        })
    }

    /// Exact match on area, category and family name; case-insensitive
    /// substring over title OR description
    pub fn matches(&self, event: &Event) -> bool {
        self.area.as_ref().map_or(true, |area| event.area == *area)
            && self.category.map_or(true, |c| event.category == c)
            && self
                .family_name
                .as_ref()
                .map_or(true, |f| event.family_name == *f)
            && self.search.as_ref().map_or(true, |needle| {
                contains_ignore_case(&event.title, needle)
                    || contains_ignore_case(&event.description, needle)
            })
    }
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// A user matches a name search on first OR last name
pub fn user_matches_search(user: &User, search: &str) -> bool {
    contains_ignore_case(&user.first_name, search) || contains_ignore_case(&user.last_name, search)
}

/// List events newest first
pub async fn list_events(
    events: &dyn EventStore,
    filter: Option<EventFilter>,
    page: Page,
) -> Result<Listing<Event>, AppError> {
    let Some(filter) = filter else {
        return Ok(Listing::empty());
    };
    let (items, total) = events.list_events(&filter, page).await?;
    Ok(Listing::new(items, total, page))
}

/// List users, optionally filtered by name
pub async fn list_users(
    users: &dyn UserStore,
    search: Option<&str>,
    page: Page,
) -> Result<Listing<User>, AppError> {
    let search = search.map(str::trim).filter(|s| !s.is_empty());
    let (items, total) = users.list_users(search, page).await?;
    Ok(Listing::new(items, total, page))
}

/// Attach each event's author summary with one batched user fetch
pub async fn with_authors(
    users: &dyn UserStore,
    events: Vec<Event>,
) -> Result<Vec<EventView>, AppError> {
    let mut ids: Vec<UserId> = events.iter().map(|e| e.created_by).collect();
    ids.sort();
    ids.dedup();

    let authors: HashMap<UserId, UserSummary> = users
        .find_many(&ids)
        .await?
        .iter()
        .map(|u| (u.id, UserSummary::from_user(u)))
        .collect();

    Ok(events
        .into_iter()
        .map(|event| {
            let author = authors.get(&event.created_by).cloned();
            EventView::new(event, author)
        })
        .collect())
}

/// Single-event view: author with email, likes and attendees resolved.
/// References to users that no longer exist stay as bare ids.
pub async fn with_details(users: &dyn UserStore, event: Event) -> Result<EventView, AppError> {
    let mut ids: Vec<UserId> = event
        .likes
        .iter()
        .chain(event.attendees.iter())
        .copied()
        .chain(std::iter::once(event.created_by))
        .collect();
    ids.sort();
    ids.dedup();

    let found: HashMap<UserId, User> = users
        .find_many(&ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let resolve = |id: &UserId| match found.get(id) {
        Some(user) => UserRef::Resolved(UserSummary::from_user(user)),
        None => UserRef::Id(*id),
    };
    let likes = event.likes.iter().map(resolve).collect();
    let attendees = event.attendees.iter().map(resolve).collect();
    let author = found.get(&event.created_by).map(UserSummary::with_email);

    let mut view = EventView::new(event, author);
    view.likes = likes;
    view.attendees = attendees;
    Ok(view)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
