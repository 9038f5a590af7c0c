// Request validation - explicit checks producing typed, normalized input

use crate::api::requests::{EventPayload, LoginRequest, ProfileUpdateRequest, RegisterRequest};
use crate::core::errors::AppError;
use crate::core::models::{Category, EventChanges, NewEvent, ProfileChanges};
use chrono::{DateTime, NaiveDate, NaiveTime};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Registration input after validation; email is normalized
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Login input after validation; email is normalized
#[derive(Debug, Clone, PartialEq)]
pub struct ValidLogin {
    pub email: String,
    pub password: String,
}

/// Validates request bodies and converts them to domain input
pub struct RequestValidator;

impl RequestValidator {
    pub fn validate_registration(req: &RegisterRequest) -> Result<ValidRegistration, AppError> {
        let (Some(first_name), Some(last_name), Some(email), Some(password)) = (
            present(&req.first_name),
            present(&req.last_name),
            present(&req.email),
            req.password.as_deref().filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::Validation("Please provide all required fields".to_string()));
        };

        if req.confirm_password.as_deref() != Some(password) {
            return Err(AppError::Validation("Passwords do not match".to_string()));
        }

        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(AppError::Validation("Please provide a valid email".to_string()));
        }

        Self::validate_password(password)?;

        Ok(ValidRegistration {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email,
            password: password.to_string(),
        })
    }

    pub fn validate_login(req: &LoginRequest) -> Result<ValidLogin, AppError> {
        match (present(&req.email), req.password.as_deref().filter(|p| !p.is_empty())) {
            (Some(email), Some(password)) => Ok(ValidLogin {
                email: normalize_email(email),
                password: password.to_string(),
            }),
            _ => Err(AppError::Validation("Please provide email and password".to_string())),
        }
    }

    pub fn validate_new_event(payload: &EventPayload) -> Result<NewEvent, AppError> {
        let (
            Some(title),
            Some(description),
            Some(category),
            Some(date),
            Some(time),
            Some(location),
            Some(area),
        ) = (
            present(&payload.title),
            present(&payload.description),
            present(&payload.category),
            present(&payload.date),
            present(&payload.time),
            present(&payload.location),
            present(&payload.area),
        )
        else {
            return Err(AppError::Validation("Please provide all required fields".to_string()));
        };

        Ok(NewEvent {
            title: title.to_string(),
            description: description.to_string(),
            category: parse_category(category)?,
            date: parse_event_date(date)?,
            time: parse_event_time(time)?,
            location: location.to_string(),
            area: area.to_string(),
            family_name: payload
                .family_name
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            image: present(&payload.image).map(str::to_string),
        })
    }

    /// Fields that are sent must be valid; fields that are absent stay unchanged
    pub fn validate_event_changes(payload: &EventPayload) -> Result<EventChanges, AppError> {
        let changes = EventChanges {
            title: required_if_sent(&payload.title, "title")?,
            description: required_if_sent(&payload.description, "description")?,
            category: required_if_sent(&payload.category, "category")?
                .map(|c| parse_category(&c))
                .transpose()?,
            date: required_if_sent(&payload.date, "date")?
                .map(|d| parse_event_date(&d))
                .transpose()?,
            time: required_if_sent(&payload.time, "time")?
                .map(|t| parse_event_time(&t))
                .transpose()?,
            location: required_if_sent(&payload.location, "location")?,
            area: required_if_sent(&payload.area, "area")?,
            family_name: payload.family_name.as_deref().map(|f| f.trim().to_string()),
            image: payload.image.as_deref().map(|raw| {
                let trimmed = raw.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }),
        };

        if changes.is_empty() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }

        Ok(changes)
    }

    /// Returns the profile changes (without a hash) and the new plaintext password, if any
    pub fn validate_profile_changes(
        req: &ProfileUpdateRequest,
    ) -> Result<(ProfileChanges, Option<String>), AppError> {
        let new_password = match req.password.as_deref() {
            Some(password) => {
                Self::validate_password(password)?;
                Some(password.to_string())
            }
            None => None,
        };

        let changes = ProfileChanges {
            first_name: required_if_sent(&req.first_name, "firstName")?,
            last_name: required_if_sent(&req.last_name, "lastName")?,
            bio: req.bio.as_deref().map(|v| v.trim().to_string()),
            phone: req.phone.as_deref().map(|v| v.trim().to_string()),
            location: req.location.as_deref().map(|v| v.trim().to_string()),
            profile_image: present(&req.profile_image).map(str::to_string),
            password_hash: None,
        };

        Ok((changes, new_password))
    }

    fn validate_password(password: &str) -> Result<(), AppError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        Ok(())
    }
}

/// Trim and lower-case an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `local@domain.tld` where the tld is 2 or 3 word characters
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty()
        && !host.starts_with('.')
        && !host.ends_with('.')
        && !host.contains("..")
        && (2..=3).contains(&tld.len())
        && tld.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required_if_sent(value: &Option<String>, field: &str) -> Result<Option<String>, AppError> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => {
            Err(AppError::Validation(format!("Field '{}' cannot be empty", field)))
        }
        Some(v) => Ok(Some(v.trim().to_string())),
    }
}

fn parse_category(raw: &str) -> Result<Category, AppError> {
    raw.parse::<Category>().map_err(|_| {
        let allowed: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
        AppError::Validation(format!(
            "Invalid category '{}': must be one of {}",
            raw,
            allowed.join(", ")
        ))
    })
}

/// `YYYY-MM-DD`, or an RFC 3339 timestamp whose date part is used
fn parse_event_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| AppError::Validation(format!("Invalid event date '{}'", raw)))
}

/// 24h `HH:MM`, normalized to two-digit fields
fn parse_event_time(raw: &str) -> Result<String, AppError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| {
            AppError::Validation(format!("Invalid event time '{}': expected HH:MM format", raw))
        })
}
