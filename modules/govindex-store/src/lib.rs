//! Entity store for projected governance state.
//!
//! Handlers see the store only through `EntityStore`: keyed get and upsert for
//! the two entity kinds. `MemoryStore` backs tests and database-less runs;
//! `PgStore` persists to Postgres.

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::EntityStore;
