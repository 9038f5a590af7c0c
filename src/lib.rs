// Library root for the events API

pub mod core;
pub mod state;
pub mod engine;
pub mod auth;
pub mod api;
pub mod utils;
pub mod config;
