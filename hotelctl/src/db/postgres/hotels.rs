use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use super::PostgresStore;
use crate::db::errors::{DbError, Result};
use crate::db::models::hotels::{
    HotelCreateDBRequest, HotelDBResponse, HotelFilter, HotelUpdateDBRequest, RoomCreateDBRequest, RoomDBResponse, RoomTypeCreateDBRequest,
    RoomTypeDBResponse, RoomTypeUpdateDBRequest, RoomUpdateDBRequest,
};
use crate::db::store::HotelStore;
use crate::types::{HotelId, RoomId, RoomTypeId, abbrev_uuid};

#[async_trait]
impl HotelStore for PostgresStore {
    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create_hotel(&self, request: &HotelCreateDBRequest) -> Result<HotelDBResponse> {
        let hotel = sqlx::query_as::<_, HotelDBResponse>(
            r#"
            INSERT INTO hotels (id, owner_id, destination_id, name, address, city, description, star_rating, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.owner_id)
        .bind(request.destination_id)
        .bind(&request.name)
        .bind(&request.address)
        .bind(&request.city)
        .bind(&request.description)
        .bind(request.star_rating)
        .bind(request.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(hotel)
    }

    #[instrument(skip(self), fields(hotel_id = %abbrev_uuid(&id)), err)]
    async fn get_hotel(&self, id: HotelId) -> Result<Option<HotelDBResponse>> {
        let hotel = sqlx::query_as::<_, HotelDBResponse>("SELECT * FROM hotels WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(hotel)
    }

    #[instrument(skip(self, filter), err)]
    async fn list_hotels(&self, filter: &HotelFilter) -> Result<(Vec<HotelDBResponse>, i64)> {
        const WHERE: &str = r#"
            WHERE ($1::uuid IS NULL OR owner_id = $1)
              AND ($2::uuid IS NULL OR destination_id = $2)
              AND ($3::text IS NULL OR lower(city) = lower($3))
              AND ($4::text IS NULL OR name ILIKE '%' || $4 || '%')
              AND ($5::hotel_status IS NULL OR status = $5)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM hotels {WHERE}"))
            .bind(filter.owner_id)
            .bind(filter.destination_id)
            .bind(&filter.city)
            .bind(&filter.search)
            .bind(filter.status)
            .fetch_one(&self.pool)
            .await?;
        let hotels = sqlx::query_as::<_, HotelDBResponse>(&format!("SELECT * FROM hotels {WHERE} ORDER BY name, id LIMIT $6 OFFSET $7"))
            .bind(filter.owner_id)
            .bind(filter.destination_id)
            .bind(&filter.city)
            .bind(&filter.search)
            .bind(filter.status)
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&self.pool)
            .await?;
        Ok((hotels, total))
    }

    #[instrument(skip(self, request), fields(hotel_id = %abbrev_uuid(&id)), err)]
    async fn update_hotel(&self, id: HotelId, request: &HotelUpdateDBRequest) -> Result<HotelDBResponse> {
        sqlx::query_as::<_, HotelDBResponse>(
            r#"
            UPDATE hotels SET
                destination_id = COALESCE($2, destination_id),
                name = COALESCE($3, name),
                address = COALESCE($4, address),
                city = COALESCE($5, city),
                description = COALESCE($6, description),
                star_rating = COALESCE($7, star_rating),
                status = COALESCE($8, status),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.destination_id)
        .bind(&request.name)
        .bind(&request.address)
        .bind(&request.city)
        .bind(&request.description)
        .bind(request.star_rating)
        .bind(request.status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(hotel_id = %abbrev_uuid(&id)), err)]
    async fn delete_hotel(&self, id: HotelId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM hotels WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(hotel_id = %abbrev_uuid(&request.hotel_id)), err)]
    async fn create_room_type(&self, request: &RoomTypeCreateDBRequest) -> Result<RoomTypeDBResponse> {
        let room_type = sqlx::query_as::<_, RoomTypeDBResponse>(
            r#"
            INSERT INTO room_types (id, hotel_id, name, description, base_price, max_guests)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.hotel_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.base_price)
        .bind(request.max_guests)
        .fetch_one(&self.pool)
        .await?;
        Ok(room_type)
    }

    #[instrument(skip(self), fields(room_type_id = %abbrev_uuid(&id)), err)]
    async fn get_room_type(&self, id: RoomTypeId) -> Result<Option<RoomTypeDBResponse>> {
        let room_type = sqlx::query_as::<_, RoomTypeDBResponse>("SELECT * FROM room_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(room_type)
    }

    #[instrument(skip(self), fields(hotel_id = %abbrev_uuid(&hotel_id)), err)]
    async fn list_room_types(&self, hotel_id: HotelId) -> Result<Vec<RoomTypeDBResponse>> {
        let room_types = sqlx::query_as::<_, RoomTypeDBResponse>("SELECT * FROM room_types WHERE hotel_id = $1 ORDER BY base_price, name")
            .bind(hotel_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(room_types)
    }

    #[instrument(skip(self, request), fields(room_type_id = %abbrev_uuid(&id)), err)]
    async fn update_room_type(&self, id: RoomTypeId, request: &RoomTypeUpdateDBRequest) -> Result<RoomTypeDBResponse> {
        sqlx::query_as::<_, RoomTypeDBResponse>(
            r#"
            UPDATE room_types SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                base_price = COALESCE($4, base_price),
                max_guests = COALESCE($5, max_guests),
                is_available = COALESCE($6, is_available),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.base_price)
        .bind(request.max_guests)
        .bind(request.is_available)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(room_type_id = %abbrev_uuid(&id)), err)]
    async fn delete_room_type(&self, id: RoomTypeId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM room_types WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(room_type_id = %abbrev_uuid(&request.room_type_id)), err)]
    async fn create_room(&self, request: &RoomCreateDBRequest) -> Result<RoomDBResponse> {
        let room = sqlx::query_as::<_, RoomDBResponse>("INSERT INTO rooms (id, room_type_id, room_number) VALUES ($1, $2, $3) RETURNING *")
            .bind(Uuid::new_v4())
            .bind(request.room_type_id)
            .bind(&request.room_number)
            .fetch_one(&self.pool)
            .await?;
        Ok(room)
    }

    #[instrument(skip(self), fields(room_id = %abbrev_uuid(&id)), err)]
    async fn get_room(&self, id: RoomId) -> Result<Option<RoomDBResponse>> {
        let room = sqlx::query_as::<_, RoomDBResponse>("SELECT * FROM rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(room)
    }

    #[instrument(skip(self), fields(room_type_id = %abbrev_uuid(&room_type_id)), err)]
    async fn list_rooms(&self, room_type_id: RoomTypeId) -> Result<Vec<RoomDBResponse>> {
        let rooms = sqlx::query_as::<_, RoomDBResponse>("SELECT * FROM rooms WHERE room_type_id = $1 ORDER BY room_number")
            .bind(room_type_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rooms)
    }

    #[instrument(skip(self, request), fields(room_id = %abbrev_uuid(&id)), err)]
    async fn update_room(&self, id: RoomId, request: &RoomUpdateDBRequest) -> Result<RoomDBResponse> {
        sqlx::query_as::<_, RoomDBResponse>(
            r#"
            UPDATE rooms SET
                room_number = COALESCE($2, room_number),
                is_active = COALESCE($3, is_active),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.room_number)
        .bind(request.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(room_id = %abbrev_uuid(&id)), err)]
    async fn delete_room(&self, id: RoomId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
