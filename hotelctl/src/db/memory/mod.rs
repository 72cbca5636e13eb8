//! In-memory store.
//!
//! All tables live behind one `parking_lot::RwLock`. Every mutation takes the write lock for its
//! whole check-and-write, which gives the same serialization the PostgreSQL store gets from row
//! locks. Data is lost on restart; this backend is meant for tests and local development.

mod attendance;
mod bookings;
mod content;
mod hotels;
mod inventory;
mod pricing;
mod sync;
mod users;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;

use crate::db::models::{
    attendance::AttendanceLogDBResponse,
    bookings::{BookingDBResponse, BookingEventDBResponse},
    content::{DestinationDBResponse, ReviewDBResponse},
    hotels::{HotelDBResponse, HotelStatus, RoomDBResponse, RoomTypeDBResponse},
    inventory::{HoldDBResponse, NightOccupancy},
    pricing::{PricingRuleDBResponse, PromoCodeDBResponse},
    sync::SyncRecordDBResponse,
    users::UserDBResponse,
};
use crate::types::{
    AttendanceLogId, BookingId, DestinationId, HoldId, HotelId, PricingRuleId, PromoCodeId, ReviewId, RoomId, RoomTypeId, UserId,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, UserDBResponse>,
    destinations: HashMap<DestinationId, DestinationDBResponse>,
    hotels: HashMap<HotelId, HotelDBResponse>,
    room_types: HashMap<RoomTypeId, RoomTypeDBResponse>,
    rooms: HashMap<RoomId, RoomDBResponse>,
    holds: HashMap<HoldId, HoldDBResponse>,
    bookings: HashMap<BookingId, BookingDBResponse>,
    booking_events: Vec<BookingEventDBResponse>,
    pricing_rules: HashMap<PricingRuleId, PricingRuleDBResponse>,
    promo_codes: HashMap<PromoCodeId, PromoCodeDBResponse>,
    reviews: HashMap<ReviewId, ReviewDBResponse>,
    attendance_logs: HashMap<AttendanceLogId, AttendanceLogDBResponse>,
    sync_records: HashMap<String, SyncRecordDBResponse>,
}

impl Tables {
    /// Rooms that can be sold: active rooms of an available room type in an active hotel
    fn bookable_rooms(&self, room_type_id: RoomTypeId) -> i64 {
        let Some(room_type) = self.room_types.get(&room_type_id) else {
            return 0;
        };
        let hotel_active = self
            .hotels
            .get(&room_type.hotel_id)
            .is_some_and(|hotel| hotel.status == HotelStatus::Active);
        if !room_type.is_available || !hotel_active {
            return 0;
        }
        self.rooms
            .values()
            .filter(|room| room.room_type_id == room_type_id && room.is_active)
            .count() as i64
    }

    fn occupancy(
        &self,
        room_type_id: RoomTypeId,
        start: NaiveDate,
        end: NaiveDate,
        now: DateTime<Utc>,
        exclude_booking: Option<BookingId>,
    ) -> Vec<NightOccupancy> {
        let total_rooms = self.bookable_rooms(room_type_id);
        start
            .iter_days()
            .take_while(|date| *date < end)
            .map(|date| {
                let held = self
                    .holds
                    .values()
                    .filter(|hold| hold.room_type_id == room_type_id && hold.is_active(now))
                    .filter(|hold| hold.check_in <= date && hold.check_out > date)
                    .map(|hold| i64::from(hold.quantity))
                    .sum();
                let booked = self
                    .bookings
                    .values()
                    .filter(|booking| booking.room_type_id == room_type_id && booking.status.claims_inventory())
                    .filter(|booking| Some(booking.id) != exclude_booking)
                    .filter(|booking| booking.check_in <= date && booking.check_out > date)
                    .map(|booking| i64::from(booking.rooms))
                    .sum();
                NightOccupancy {
                    date,
                    total_rooms,
                    held,
                    booked,
                }
            })
            .collect()
    }
}

/// Apply offset pagination to an already ordered list, returning the page and the total count.
fn paginate<T>(items: Vec<T>, skip: i64, limit: i64) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let page = items
        .into_iter()
        .skip(skip.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    (page, total)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// In-memory implementation of every store trait.
///
/// # Example
/// ```ignore
/// let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
