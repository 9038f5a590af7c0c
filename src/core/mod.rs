// Core domain: errors, models, credentials

pub mod crypto;
pub mod errors;
pub mod models;
