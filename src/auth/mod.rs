// Authentication: bearer tokens, the authorization guard, audit logging

pub mod audit_logger;
pub mod auth_middleware;
pub mod bearer;
