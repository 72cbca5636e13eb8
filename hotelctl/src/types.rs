//! Common type definitions and permission system types.
//!
//! This module defines:
//! - Type aliases for entity IDs (UserId, HotelId, BookingId, etc.)
//! - Permission and authorization types
//! - Resource and operation enums for access control
//!
//! # ID Types
//!
//! All entity IDs are UUIDs wrapped in type aliases:
//!
//! - [`UserId`]: User account identifier
//! - [`HotelId`]: Hotel identifier
//! - [`RoomTypeId`] / [`RoomId`]: Inventory identifiers
//! - [`HoldId`]: Reservation hold identifier
//! - [`BookingId`]: Booking identifier
//!
//! # Permission System
//!
//! - [`Resource`]: What entity type is being accessed (Hotels, Bookings, Pricing, etc.)
//! - [`Operation`]: What action is being performed (Read, Create, Update, Delete)
//! - [`Permission`]: Authorization requirement combining resource and operation
//!
//! Operations come in two flavors:
//! - **All**: Unrestricted access to all entities (e.g., `ReadAll`, `UpdateAll`)
//! - **Own**: Restricted to entities the user owns (e.g., `ReadOwn`, `CreateOwn`). Ownership is
//!   resolved by the handler: a customer owns their bookings, a manager owns their hotels and
//!   everything beneath them.

use std::fmt;
use uuid::Uuid;

pub type UserId = Uuid;
pub type DestinationId = Uuid;
pub type HotelId = Uuid;
pub type RoomTypeId = Uuid;
pub type RoomId = Uuid;
pub type HoldId = Uuid;
pub type BookingId = Uuid;
pub type PricingRuleId = Uuid;
pub type PromoCodeId = Uuid;
pub type ReviewId = Uuid;
pub type AttendanceLogId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

// Operations that can be performed on resources
// *-All means unrestricted access, *-Own means restricted to own resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateAll,
    CreateOwn,
    ReadAll,
    ReadOwn,
    UpdateAll,
    UpdateOwn,
    DeleteAll,
    DeleteOwn,
}

impl Operation {
    /// The unrestricted counterpart of this operation.
    pub fn all(self) -> Self {
        match self {
            Operation::CreateAll | Operation::CreateOwn => Operation::CreateAll,
            Operation::ReadAll | Operation::ReadOwn => Operation::ReadAll,
            Operation::UpdateAll | Operation::UpdateOwn => Operation::UpdateAll,
            Operation::DeleteAll | Operation::DeleteOwn => Operation::DeleteAll,
        }
    }
}

// Resources that can be operated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Destinations,
    Hotels,
    RoomTypes,
    Inventory,
    Holds,
    Pricing,
    Bookings,
    Reviews,
    Sync,
    Attendance,
}

// Permission types for authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    /// Simple permission: (Resource, Operation)
    Allow(Resource, Operation),
    /// Logical combinator
    Any(Vec<Permission>),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateAll | Operation::CreateOwn => write!(f, "Create"),
            Operation::ReadAll | Operation::ReadOwn => write!(f, "Read"),
            Operation::UpdateAll | Operation::UpdateOwn => write!(f, "Update"),
            Operation::DeleteAll | Operation::DeleteOwn => write!(f, "Delete"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Users => "users",
            Resource::Destinations => "destinations",
            Resource::Hotels => "hotels",
            Resource::RoomTypes => "room types",
            Resource::Inventory => "inventory",
            Resource::Holds => "reservation holds",
            Resource::Pricing => "pricing",
            Resource::Bookings => "bookings",
            Resource::Reviews => "reviews",
            Resource::Sync => "synchronization",
            Resource::Attendance => "attendance",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }

    #[test]
    fn test_operation_all() {
        assert_eq!(Operation::ReadOwn.all(), Operation::ReadAll);
        assert_eq!(Operation::DeleteAll.all(), Operation::DeleteAll);
        assert_eq!(Operation::UpdateOwn.to_string(), "Update");
    }
}
