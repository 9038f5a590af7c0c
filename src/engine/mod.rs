// Core decision logic, independent of how related records are fetched

pub mod calendar;
pub mod likes;
pub mod listing;
pub mod ownership;
