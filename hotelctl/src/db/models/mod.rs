//! Database record structures.
//!
//! `*CreateDBRequest` / `*UpdateDBRequest` types are what the stores accept, `*DBResponse` types
//! are what they return. API models convert to and from these at the handler boundary.

pub mod attendance;
pub mod bookings;
pub mod content;
pub mod hotels;
pub mod inventory;
pub mod pricing;
pub mod sync;
pub mod users;
