use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{InMemoryStore, Tables, paginate};
use crate::db::errors::{DbError, Result};
use crate::db::models::bookings::{
    BookingCreateDBRequest, BookingDBResponse, BookingEventDBResponse, BookingFilter, BookingStatus, BookingStayUpdate, CreateBookingOutcome,
    UpdateStayOutcome,
};
use crate::db::models::inventory::{ReleaseReason, available_over};
use crate::db::store::BookingStore;
use crate::types::{BookingId, UserId};

impl Tables {
    fn push_booking_event(&mut self, booking_id: BookingId, from: Option<BookingStatus>, to: BookingStatus, actor: UserId, now: DateTime<Utc>) {
        self.booking_events.push(BookingEventDBResponse {
            id: Uuid::new_v4(),
            booking_id,
            from_status: from,
            to_status: to,
            actor_id: actor,
            created_at: now,
        });
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn create_booking(&self, request: &BookingCreateDBRequest, actor: UserId, now: DateTime<Utc>) -> Result<CreateBookingOutcome> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&request.user_id) {
            return Err(DbError::foreign_key("bookings", "bookings_user_id_fkey"));
        }
        if !tables.room_types.contains_key(&request.room_type_id) || !tables.hotels.contains_key(&request.hotel_id) {
            return Err(DbError::foreign_key("bookings", "bookings_room_type_id_fkey"));
        }

        match request.hold_id {
            Some(hold_id) => {
                let usable = tables.holds.get(&hold_id).is_some_and(|hold| {
                    hold.is_active(now) && hold.user_id == request.user_id && hold.room_type_id == request.room_type_id
                });
                if !usable {
                    return Ok(CreateBookingOutcome::HoldUnavailable);
                }
                if let Some(hold) = tables.holds.get_mut(&hold_id) {
                    hold.released_at = Some(now);
                    hold.release_reason = Some(ReleaseReason::Consumed);
                }
            }
            None => {
                let nights = tables.occupancy(request.room_type_id, request.check_in, request.check_out, now, None);
                let available = available_over(&nights);
                if available < i64::from(request.rooms) {
                    return Ok(CreateBookingOutcome::Insufficient { available });
                }
            }
        }

        let booking = BookingDBResponse {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            hotel_id: request.hotel_id,
            room_type_id: request.room_type_id,
            hold_id: request.hold_id,
            check_in: request.check_in,
            check_out: request.check_out,
            guests: request.guests,
            rooms: request.rooms,
            subtotal: request.subtotal,
            discount: request.discount,
            total_price: request.total_price,
            promo_code: request.promo_code.clone(),
            status: request.status,
            special_requests: request.special_requests.clone(),
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        };
        tables.bookings.insert(booking.id, booking.clone());
        tables.push_booking_event(booking.id, None, booking.status, actor, now);
        Ok(CreateBookingOutcome::Created(booking))
    }

    async fn get_booking(&self, id: BookingId) -> Result<Option<BookingDBResponse>> {
        Ok(self.tables.read().bookings.get(&id).cloned())
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> Result<(Vec<BookingDBResponse>, i64)> {
        let tables = self.tables.read();
        let mut bookings: Vec<_> = tables
            .bookings
            .values()
            .filter(|booking| filter.user_id.is_none_or(|user_id| booking.user_id == user_id))
            .filter(|booking| {
                filter
                    .hotel_owner_id
                    .is_none_or(|owner| tables.hotels.get(&booking.hotel_id).is_some_and(|hotel| hotel.owner_id == owner))
            })
            .filter(|booking| filter.hotel_id.is_none_or(|hotel_id| booking.hotel_id == hotel_id))
            .filter(|booking| filter.status.is_none_or(|status| booking.status == status))
            .filter(|booking| filter.check_in_from.is_none_or(|from| booking.check_in >= from))
            .filter(|booking| filter.check_in_to.is_none_or(|to| booking.check_in <= to))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(paginate(bookings, filter.skip, filter.limit))
    }

    async fn transition_booking(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<BookingDBResponse>> {
        let mut tables = self.tables.write();
        let updated = match tables.bookings.get_mut(&id) {
            Some(booking) if booking.status == from => {
                booking.status = to;
                booking.updated_at = now;
                if to == BookingStatus::Cancelled {
                    booking.cancelled_at = Some(now);
                }
                booking.clone()
            }
            _ => return Ok(None),
        };
        tables.push_booking_event(id, Some(from), to, actor, now);
        Ok(Some(updated))
    }

    async fn update_booking_stay(
        &self,
        id: BookingId,
        expected: BookingStatus,
        update: &BookingStayUpdate,
        now: DateTime<Utc>,
    ) -> Result<UpdateStayOutcome> {
        let mut tables = self.tables.write();
        let room_type_id = match tables.bookings.get(&id) {
            Some(booking) if booking.status == expected => booking.room_type_id,
            Some(_) => return Ok(UpdateStayOutcome::StatusChanged),
            None => return Err(DbError::NotFound),
        };

        let nights = tables.occupancy(room_type_id, update.check_in, update.check_out, now, Some(id));
        let available = available_over(&nights);
        if available < i64::from(update.rooms) {
            return Ok(UpdateStayOutcome::Insufficient { available });
        }

        let booking = tables.bookings.get_mut(&id).ok_or(DbError::NotFound)?;
        booking.check_in = update.check_in;
        booking.check_out = update.check_out;
        booking.guests = update.guests;
        booking.rooms = update.rooms;
        booking.subtotal = update.subtotal;
        booking.discount = update.discount;
        booking.total_price = update.total_price;
        booking.updated_at = now;
        Ok(UpdateStayOutcome::Updated(booking.clone()))
    }

    async fn list_booking_events(&self, booking_id: BookingId) -> Result<Vec<BookingEventDBResponse>> {
        Ok(self
            .tables
            .read()
            .booking_events
            .iter()
            .filter(|event| event.booking_id == booking_id)
            .cloned()
            .collect())
    }
}
