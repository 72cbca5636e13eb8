//! Database layer for data persistence and access.
//!
//! ```text
//! ┌─────────────┐
//! │  Services   │  (inventory, pricing, booking, sync, attendance)
//! └──────┬──────┘
//!        │  Arc<dyn Store>
//!        ↓
//! ┌─────────────┐
//! │ store traits│  (db::store - one trait per aggregate)
//! └──────┬──────┘
//!        │
//!    ┌───┴────────────┐
//!    ↓                ↓
//! InMemoryStore   PostgresStore
//! ```
//!
//! # Modules
//!
//! - [`store`]: Storage traits and the [`Store`] union
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types
//! - [`memory`]: Lock-guarded in-memory backend
//! - [`postgres`]: SQLx backend; migrations live in `migrations/`

pub mod errors;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

#[cfg(test)]
mod tests;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::Store;
