//! PostgreSQL store.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate builds without a live database.
//! Inventory-claiming writes run in a transaction that first takes a row lock on the room type
//! (`SELECT ... FOR UPDATE`), serializing concurrent holds and bookings for the same room type.

mod attendance;
mod bookings;
mod content;
mod hotels;
mod inventory;
mod pricing;
mod sync;
mod users;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};

use crate::db::errors::{DbError, Result};
use crate::db::models::inventory::NightOccupancy;
use crate::types::{BookingId, RoomTypeId};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Take the row lock that serializes inventory claims on a room type.
async fn lock_room_type(conn: &mut PgConnection, room_type_id: RoomTypeId, table: &str) -> Result<()> {
    let locked = sqlx::query_scalar::<_, RoomTypeId>("SELECT id FROM room_types WHERE id = $1 FOR UPDATE")
        .bind(room_type_id)
        .fetch_optional(&mut *conn)
        .await?;
    match locked {
        Some(_) => Ok(()),
        None => Err(DbError::foreign_key(table, &format!("{table}_room_type_id_fkey"))),
    }
}

async fn bookable_rooms(conn: &mut PgConnection, room_type_id: RoomTypeId) -> Result<i64> {
    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT CASE WHEN rt.is_available AND h.status = 'active'
                    THEN (SELECT COUNT(*) FROM rooms r WHERE r.room_type_id = rt.id AND r.is_active)
                    ELSE 0 END
        FROM room_types rt
        JOIN hotels h ON h.id = rt.hotel_id
        WHERE rt.id = $1
        "#,
    )
    .bind(room_type_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(total.unwrap_or(0))
}

async fn occupancy_on(
    conn: &mut PgConnection,
    room_type_id: RoomTypeId,
    start: NaiveDate,
    end: NaiveDate,
    now: DateTime<Utc>,
    exclude_booking: Option<BookingId>,
) -> Result<Vec<NightOccupancy>> {
    let total_rooms = bookable_rooms(&mut *conn, room_type_id).await?;
    let nights = sqlx::query_as::<_, NightOccupancy>(
        r#"
        SELECT n.night AS date,
               $5::bigint AS total_rooms,
               COALESCE((SELECT SUM(h.quantity) FROM reservation_holds h
                         WHERE h.room_type_id = $1
                           AND h.released_at IS NULL
                           AND h.expires_at > $4
                           AND h.check_in <= n.night AND h.check_out > n.night), 0)::bigint AS held,
               COALESCE((SELECT SUM(b.rooms) FROM bookings b
                         WHERE b.room_type_id = $1
                           AND b.status IN ('pending', 'confirmed', 'checked_in')
                           AND ($6::uuid IS NULL OR b.id <> $6)
                           AND b.check_in <= n.night AND b.check_out > n.night), 0)::bigint AS booked
        FROM (SELECT d::date AS night FROM generate_series($2::date, $3::date - 1, interval '1 day') AS d) n
        ORDER BY n.night
        "#,
    )
    .bind(room_type_id)
    .bind(start)
    .bind(end)
    .bind(now)
    .bind(total_rooms)
    .bind(exclude_booking)
    .fetch_all(&mut *conn)
    .await?;
    Ok(nights)
}
