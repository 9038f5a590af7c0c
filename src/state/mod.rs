// Persistence: PostgreSQL in production, in-memory for tests and local runs

pub mod memory_store;
pub mod pg_store;
