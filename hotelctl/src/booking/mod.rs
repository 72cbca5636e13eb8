//! Booking orchestration.
//!
//! Creating a booking prices the stay, then either consumes the caller's reservation hold or
//! claims inventory directly. Either way the claim and the insert are one store call, so a failed
//! insert never leaves a hold consumed. Status changes follow [`transitions`] and are
//! compare-and-set on the previous status.
//!
//! Checks run in a fixed order: visibility (invisible bookings are `NotFound`), then legality of
//! the transition (`InvalidTransition`), then the caller's role (`Forbidden`).

pub mod transitions;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::instrument;

use crate::api::models::users::{CurrentUser, Role};
use crate::auth::permissions::{can_manage_hotel, forbidden};
use crate::config::Config;
use crate::db::Store;
use crate::db::models::bookings::{
    BookingCreateDBRequest, BookingDBResponse, BookingEventDBResponse, BookingFilter, BookingStatus, BookingStayUpdate,
    CreateBookingOutcome, UpdateStayOutcome,
};
use crate::errors::{Error, Result};
use crate::pricing::PricingService;
use crate::stay::Stay;
use crate::types::{BookingId, HoldId, HotelId, Operation, Resource, RoomTypeId, abbrev_uuid};
use transitions::{Relationship, transition_party};

#[derive(Debug, Clone)]
pub struct CreateBookingRequest {
    pub room_type_id: RoomTypeId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub rooms: i32,
    pub hold_id: Option<HoldId>,
    pub promo_code: Option<String>,
    pub special_requests: Option<String>,
}

/// New stay details; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct UpdateBookingRequest {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guests: Option<i32>,
    pub rooms: Option<i32>,
}

/// Caller-supplied list filters. Scope (own, managed hotels, all) comes from the caller's role.
#[derive(Debug, Clone, Default)]
pub struct BookingQuery {
    pub status: Option<BookingStatus>,
    pub hotel_id: Option<HotelId>,
    pub check_in_from: Option<NaiveDate>,
    pub check_in_to: Option<NaiveDate>,
    pub skip: i64,
    pub limit: i64,
}

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn Store>,
    pricing: PricingService,
    auto_confirm: bool,
    max_stay_nights: i64,
}

impl BookingService {
    pub fn new(store: Arc<dyn Store>, pricing: PricingService, config: &Config) -> Self {
        Self {
            store,
            pricing,
            auto_confirm: config.booking.auto_confirm,
            max_stay_nights: config.inventory.max_stay_nights,
        }
    }

    #[instrument(skip(self, user, request), fields(user_id = %abbrev_uuid(&user.id), room_type_id = %abbrev_uuid(&request.room_type_id)), err)]
    pub async fn create_booking(&self, user: &CurrentUser, request: &CreateBookingRequest, now: DateTime<Utc>) -> Result<BookingDBResponse> {
        let stay = Stay::new(request.check_in, request.check_out, self.max_stay_nights)?.ensure_not_past(now.date_naive())?;
        let room_type = self.pricing.room_type(request.room_type_id).await?;

        if let Some(hold_id) = request.hold_id {
            let hold = self.store.get_hold(hold_id).await?;
            let matches = hold.is_some_and(|hold| {
                hold.room_type_id == request.room_type_id
                    && hold.check_in == stay.check_in
                    && hold.check_out == stay.check_out
                    && hold.quantity == request.rooms
            });
            if !matches {
                return Err(Error::invalid_field(
                    "hold_id",
                    "does not match the requested room type, dates and rooms",
                ));
            }
        }

        let quote = self
            .pricing
            .quote_for(&room_type, stay, request.guests, request.rooms, request.promo_code.as_deref(), now)
            .await?;
        let status = if self.auto_confirm {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Pending
        };

        let outcome = self
            .store
            .create_booking(
                &BookingCreateDBRequest {
                    user_id: user.id,
                    hotel_id: room_type.hotel_id,
                    room_type_id: room_type.id,
                    hold_id: request.hold_id,
                    check_in: stay.check_in,
                    check_out: stay.check_out,
                    guests: request.guests,
                    rooms: request.rooms,
                    subtotal: quote.subtotal,
                    discount: quote.discount,
                    total_price: quote.total,
                    promo_code: quote.applied_promo_code(),
                    status,
                    special_requests: request.special_requests.clone(),
                },
                user.id,
                now,
            )
            .await?;

        match outcome {
            CreateBookingOutcome::Created(booking) => {
                metrics::counter!("hotelctl_bookings_created_total", "status" => status.as_str()).increment(1);
                tracing::info!(booking_id = %abbrev_uuid(&booking.id), total_price = booking.total_price, "Created booking");
                Ok(booking)
            }
            CreateBookingOutcome::HoldUnavailable => Err(Error::Conflict {
                message: "Reservation hold has expired, was released, or belongs to another user".to_string(),
            }),
            CreateBookingOutcome::Insufficient { available } => Err(Error::InsufficientInventory {
                requested: i64::from(request.rooms),
                available,
            }),
        }
    }

    async fn relationship(&self, user: &CurrentUser, booking: &BookingDBResponse) -> Result<Relationship> {
        let manages_hotel = if user.role == Role::HotelManager {
            let hotel = self.store.get_hotel(booking.hotel_id).await?;
            hotel.is_some_and(|hotel| can_manage_hotel(user, &hotel))
        } else {
            false
        };
        Ok(Relationship {
            is_guest: booking.user_id == user.id,
            manages_hotel,
            is_admin: user.is_admin(),
        })
    }

    /// Loads a booking the caller can see, with the caller's relationship to it
    async fn visible_booking(&self, user: &CurrentUser, id: BookingId) -> Result<(BookingDBResponse, Relationship)> {
        let booking = self
            .store
            .get_booking(id)
            .await?
            .ok_or_else(|| Error::not_found("Booking", id))?;
        let relationship = self.relationship(user, &booking).await?;
        if !relationship.can_see() {
            return Err(Error::not_found("Booking", id));
        }
        Ok((booking, relationship))
    }

    pub async fn get_booking(&self, user: &CurrentUser, id: BookingId) -> Result<BookingDBResponse> {
        Ok(self.visible_booking(user, id).await?.0)
    }

    /// Customers see their own bookings, managers the bookings of hotels they own, admins all
    pub async fn list_bookings(&self, user: &CurrentUser, query: &BookingQuery) -> Result<(Vec<BookingDBResponse>, i64)> {
        let mut filter = BookingFilter {
            user_id: None,
            hotel_owner_id: None,
            hotel_id: query.hotel_id,
            status: query.status,
            check_in_from: query.check_in_from,
            check_in_to: query.check_in_to,
            skip: query.skip,
            limit: query.limit,
        };
        match user.role {
            Role::Customer => filter.user_id = Some(user.id),
            Role::HotelManager => filter.hotel_owner_id = Some(user.id),
            Role::Admin => {}
        }
        Ok(self.store.list_bookings(&filter).await?)
    }

    /// Bookings the caller made as a guest, whatever their role
    pub async fn list_own_bookings(&self, user: &CurrentUser, query: &BookingQuery) -> Result<(Vec<BookingDBResponse>, i64)> {
        let filter = BookingFilter {
            user_id: Some(user.id),
            hotel_owner_id: None,
            hotel_id: query.hotel_id,
            status: query.status,
            check_in_from: query.check_in_from,
            check_in_to: query.check_in_to,
            skip: query.skip,
            limit: query.limit,
        };
        Ok(self.store.list_bookings(&filter).await?)
    }

    #[instrument(skip(self, user), fields(user_id = %abbrev_uuid(&user.id), booking_id = %abbrev_uuid(&id), to = %to), err)]
    pub async fn update_status(&self, user: &CurrentUser, id: BookingId, to: BookingStatus, now: DateTime<Utc>) -> Result<BookingDBResponse> {
        let (booking, relationship) = self.visible_booking(user, id).await?;
        let from = booking.status;

        if from == BookingStatus::Cancelled && to == BookingStatus::Cancelled {
            return Ok(booking);
        }
        let Some(party) = transition_party(from, to) else {
            return Err(Error::InvalidTransition { from, to });
        };
        if !relationship.may_act_as(party) {
            return Err(forbidden(Resource::Bookings, Operation::UpdateOwn, format!("move this booking to {to}")));
        }

        match self.store.transition_booking(id, from, to, user.id, now).await? {
            Some(updated) => {
                metrics::counter!("hotelctl_booking_transitions_total", "to" => to.as_str()).increment(1);
                tracing::info!(from = %from, "Booking status changed");
                Ok(updated)
            }
            None => {
                let current = self.get_booking(user, id).await?;
                if current.status == to && to == BookingStatus::Cancelled {
                    return Ok(current);
                }
                Err(Error::InvalidTransition {
                    from: current.status,
                    to,
                })
            }
        }
    }

    pub async fn cancel_booking(&self, user: &CurrentUser, id: BookingId, now: DateTime<Utc>) -> Result<BookingDBResponse> {
        self.update_status(user, id, BookingStatus::Cancelled, now).await
    }

    /// Changes dates or party size of a pending or confirmed booking and re-prices it
    #[instrument(skip(self, user, request), fields(user_id = %abbrev_uuid(&user.id), booking_id = %abbrev_uuid(&id)), err)]
    pub async fn update_booking(
        &self,
        user: &CurrentUser,
        id: BookingId,
        request: &UpdateBookingRequest,
        now: DateTime<Utc>,
    ) -> Result<BookingDBResponse> {
        let (booking, relationship) = self.visible_booking(user, id).await?;
        if !matches!(booking.status, BookingStatus::Pending | BookingStatus::Confirmed) {
            return Err(Error::Conflict {
                message: format!("A {} booking can no longer be changed", booking.status),
            });
        }
        if !(relationship.is_guest || relationship.is_admin) {
            return Err(forbidden(Resource::Bookings, Operation::UpdateOwn, "this booking"));
        }

        let stay = Stay::new(
            request.check_in.unwrap_or(booking.check_in),
            request.check_out.unwrap_or(booking.check_out),
            self.max_stay_nights,
        )?
        .ensure_not_past(now.date_naive())?;
        let guests = request.guests.unwrap_or(booking.guests);
        let rooms = request.rooms.unwrap_or(booking.rooms);
        let room_type = self.pricing.room_type(booking.room_type_id).await?;
        let quote = self
            .pricing
            .quote_for(&room_type, stay, guests, rooms, booking.promo_code.as_deref(), now)
            .await?;

        let update = BookingStayUpdate {
            check_in: stay.check_in,
            check_out: stay.check_out,
            guests,
            rooms,
            subtotal: quote.subtotal,
            discount: quote.discount,
            total_price: quote.total,
        };
        match self.store.update_booking_stay(id, booking.status, &update, now).await? {
            UpdateStayOutcome::Updated(updated) => {
                tracing::info!(total_price = updated.total_price, "Updated booking stay");
                Ok(updated)
            }
            UpdateStayOutcome::StatusChanged => Err(Error::Conflict {
                message: "Booking status changed while it was being updated".to_string(),
            }),
            UpdateStayOutcome::Insufficient { available } => Err(Error::InsufficientInventory {
                requested: i64::from(rooms),
                available,
            }),
        }
    }

    pub async fn booking_events(&self, user: &CurrentUser, id: BookingId) -> Result<Vec<BookingEventDBResponse>> {
        self.visible_booking(user, id).await?;
        Ok(self.store.list_booking_events(id).await?)
    }
}
