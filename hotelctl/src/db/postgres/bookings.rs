use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use super::{PostgresStore, lock_room_type, occupancy_on};
use crate::db::errors::{DbError, Result};
use crate::db::models::bookings::{
    BookingCreateDBRequest, BookingDBResponse, BookingEventDBResponse, BookingFilter, BookingStatus, BookingStayUpdate, CreateBookingOutcome,
    UpdateStayOutcome,
};
use crate::db::models::inventory::available_over;
use crate::db::store::BookingStore;
use crate::types::{BookingId, RoomTypeId, UserId, abbrev_uuid};

async fn insert_event(
    conn: &mut PgConnection,
    booking_id: BookingId,
    from: Option<BookingStatus>,
    to: BookingStatus,
    actor: UserId,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("INSERT INTO booking_events (id, booking_id, from_status, to_status, actor_id, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
        .bind(Uuid::new_v4())
        .bind(booking_id)
        .bind(from)
        .bind(to)
        .bind(actor)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl BookingStore for PostgresStore {
    #[instrument(skip(self, request), fields(room_type_id = %abbrev_uuid(&request.room_type_id), rooms = request.rooms), err)]
    async fn create_booking(&self, request: &BookingCreateDBRequest, actor: UserId, now: DateTime<Utc>) -> Result<CreateBookingOutcome> {
        let mut tx = self.pool.begin().await?;
        lock_room_type(&mut tx, request.room_type_id, "bookings").await?;

        match request.hold_id {
            Some(hold_id) => {
                let consumed = sqlx::query_scalar::<_, Uuid>(
                    r#"
                    UPDATE reservation_holds SET released_at = $2, release_reason = 'consumed'
                    WHERE id = $1 AND user_id = $3 AND room_type_id = $4
                      AND released_at IS NULL AND expires_at > $2
                    RETURNING id
                    "#,
                )
                .bind(hold_id)
                .bind(now)
                .bind(request.user_id)
                .bind(request.room_type_id)
                .fetch_optional(&mut *tx)
                .await?;
                if consumed.is_none() {
                    tx.rollback().await?;
                    return Ok(CreateBookingOutcome::HoldUnavailable);
                }
            }
            None => {
                let nights = occupancy_on(&mut tx, request.room_type_id, request.check_in, request.check_out, now, None).await?;
                let available = available_over(&nights);
                if available < i64::from(request.rooms) {
                    tx.rollback().await?;
                    return Ok(CreateBookingOutcome::Insufficient { available });
                }
            }
        }

        let booking = sqlx::query_as::<_, BookingDBResponse>(
            r#"
            INSERT INTO bookings (id, user_id, hotel_id, room_type_id, hold_id, check_in, check_out, guests, rooms,
                                  subtotal, discount, total_price, promo_code, status, special_requests, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(request.hotel_id)
        .bind(request.room_type_id)
        .bind(request.hold_id)
        .bind(request.check_in)
        .bind(request.check_out)
        .bind(request.guests)
        .bind(request.rooms)
        .bind(request.subtotal)
        .bind(request.discount)
        .bind(request.total_price)
        .bind(&request.promo_code)
        .bind(request.status)
        .bind(&request.special_requests)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        insert_event(&mut tx, booking.id, None, booking.status, actor, now).await?;
        tx.commit().await?;
        Ok(CreateBookingOutcome::Created(booking))
    }

    #[instrument(skip(self), fields(booking_id = %abbrev_uuid(&id)), err)]
    async fn get_booking(&self, id: BookingId) -> Result<Option<BookingDBResponse>> {
        let booking = sqlx::query_as::<_, BookingDBResponse>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(booking)
    }

    #[instrument(skip(self, filter), err)]
    async fn list_bookings(&self, filter: &BookingFilter) -> Result<(Vec<BookingDBResponse>, i64)> {
        const WHERE: &str = r#"
            WHERE ($1::uuid IS NULL OR b.user_id = $1)
              AND ($2::uuid IS NULL OR b.hotel_id IN (SELECT id FROM hotels WHERE owner_id = $2))
              AND ($3::uuid IS NULL OR b.hotel_id = $3)
              AND ($4::booking_status IS NULL OR b.status = $4)
              AND ($5::date IS NULL OR b.check_in >= $5)
              AND ($6::date IS NULL OR b.check_in <= $6)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM bookings b {WHERE}"))
            .bind(filter.user_id)
            .bind(filter.hotel_owner_id)
            .bind(filter.hotel_id)
            .bind(filter.status)
            .bind(filter.check_in_from)
            .bind(filter.check_in_to)
            .fetch_one(&self.pool)
            .await?;
        let bookings = sqlx::query_as::<_, BookingDBResponse>(&format!(
            "SELECT b.* FROM bookings b {WHERE} ORDER BY b.created_at DESC, b.id LIMIT $7 OFFSET $8"
        ))
        .bind(filter.user_id)
        .bind(filter.hotel_owner_id)
        .bind(filter.hotel_id)
        .bind(filter.status)
        .bind(filter.check_in_from)
        .bind(filter.check_in_to)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&self.pool)
        .await?;
        Ok((bookings, total))
    }

    #[instrument(skip(self), fields(booking_id = %abbrev_uuid(&id), %from, %to), err)]
    async fn transition_booking(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<BookingDBResponse>> {
        let mut tx = self.pool.begin().await?;
        let booking = sqlx::query_as::<_, BookingDBResponse>(
            r#"
            UPDATE bookings SET
                status = $3,
                updated_at = $4,
                cancelled_at = CASE WHEN $3 = 'cancelled'::booking_status THEN $4 ELSE cancelled_at END
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(booking) = booking else {
            tx.rollback().await?;
            return Ok(None);
        };
        insert_event(&mut tx, id, Some(from), to, actor, now).await?;
        tx.commit().await?;
        Ok(Some(booking))
    }

    #[instrument(skip(self, update), fields(booking_id = %abbrev_uuid(&id)), err)]
    async fn update_booking_stay(
        &self,
        id: BookingId,
        expected: BookingStatus,
        update: &BookingStayUpdate,
        now: DateTime<Utc>,
    ) -> Result<UpdateStayOutcome> {
        let mut tx = self.pool.begin().await?;
        let room_type_id = sqlx::query_scalar::<_, RoomTypeId>("SELECT room_type_id FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;
        lock_room_type(&mut tx, room_type_id, "bookings").await?;

        let status = sqlx::query_scalar::<_, BookingStatus>("SELECT status FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if status != expected {
            tx.rollback().await?;
            return Ok(UpdateStayOutcome::StatusChanged);
        }

        let nights = occupancy_on(&mut tx, room_type_id, update.check_in, update.check_out, now, Some(id)).await?;
        let available = available_over(&nights);
        if available < i64::from(update.rooms) {
            tx.rollback().await?;
            return Ok(UpdateStayOutcome::Insufficient { available });
        }

        let booking = sqlx::query_as::<_, BookingDBResponse>(
            r#"
            UPDATE bookings SET
                check_in = $2, check_out = $3, guests = $4, rooms = $5,
                subtotal = $6, discount = $7, total_price = $8, updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.check_in)
        .bind(update.check_out)
        .bind(update.guests)
        .bind(update.rooms)
        .bind(update.subtotal)
        .bind(update.discount)
        .bind(update.total_price)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(UpdateStayOutcome::Updated(booking))
    }

    #[instrument(skip(self), fields(booking_id = %abbrev_uuid(&booking_id)), err)]
    async fn list_booking_events(&self, booking_id: BookingId) -> Result<Vec<BookingEventDBResponse>> {
        let events = sqlx::query_as::<_, BookingEventDBResponse>("SELECT * FROM booking_events WHERE booking_id = $1 ORDER BY created_at, id")
            .bind(booking_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }
}
