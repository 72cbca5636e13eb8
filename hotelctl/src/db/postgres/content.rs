use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use super::PostgresStore;
use crate::db::errors::{DbError, Result};
use crate::db::models::content::{
    DestinationCreateDBRequest, DestinationDBResponse, DestinationUpdateDBRequest, ReviewCreateDBRequest, ReviewDBResponse, ReviewSummary,
};
use crate::db::store::ContentStore;
use crate::types::{DestinationId, HotelId, abbrev_uuid};

#[async_trait]
impl ContentStore for PostgresStore {
    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create_destination(&self, request: &DestinationCreateDBRequest) -> Result<DestinationDBResponse> {
        let destination = sqlx::query_as::<_, DestinationDBResponse>(
            "INSERT INTO destinations (id, name, country, description) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.country)
        .bind(&request.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(destination)
    }

    #[instrument(skip(self), fields(destination_id = %abbrev_uuid(&id)), err)]
    async fn get_destination(&self, id: DestinationId) -> Result<Option<DestinationDBResponse>> {
        let destination = sqlx::query_as::<_, DestinationDBResponse>("SELECT * FROM destinations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(destination)
    }

    #[instrument(skip(self), err)]
    async fn list_destinations(&self, skip: i64, limit: i64) -> Result<(Vec<DestinationDBResponse>, i64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM destinations")
            .fetch_one(&self.pool)
            .await?;
        let destinations = sqlx::query_as::<_, DestinationDBResponse>("SELECT * FROM destinations ORDER BY name, id LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;
        Ok((destinations, total))
    }

    #[instrument(skip(self, request), fields(destination_id = %abbrev_uuid(&id)), err)]
    async fn update_destination(&self, id: DestinationId, request: &DestinationUpdateDBRequest) -> Result<DestinationDBResponse> {
        sqlx::query_as::<_, DestinationDBResponse>(
            r#"
            UPDATE destinations SET
                name = COALESCE($2, name),
                country = COALESCE($3, country),
                description = COALESCE($4, description),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.country)
        .bind(&request.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(destination_id = %abbrev_uuid(&id)), err)]
    async fn delete_destination(&self, id: DestinationId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM destinations WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(hotel_id = %abbrev_uuid(&request.hotel_id)), err)]
    async fn create_review(&self, request: &ReviewCreateDBRequest) -> Result<ReviewDBResponse> {
        let review = sqlx::query_as::<_, ReviewDBResponse>(
            "INSERT INTO reviews (id, hotel_id, user_id, rating, comment) VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(request.hotel_id)
        .bind(request.user_id)
        .bind(request.rating)
        .bind(&request.comment)
        .fetch_one(&self.pool)
        .await?;
        Ok(review)
    }

    #[instrument(skip(self), fields(hotel_id = %abbrev_uuid(&hotel_id)), err)]
    async fn list_reviews(&self, hotel_id: HotelId, skip: i64, limit: i64) -> Result<(Vec<ReviewDBResponse>, i64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews WHERE hotel_id = $1")
            .bind(hotel_id)
            .fetch_one(&self.pool)
            .await?;
        let reviews = sqlx::query_as::<_, ReviewDBResponse>(
            "SELECT * FROM reviews WHERE hotel_id = $1 ORDER BY created_at DESC, id LIMIT $2 OFFSET $3",
        )
        .bind(hotel_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        Ok((reviews, total))
    }

    #[instrument(skip(self), fields(hotel_id = %abbrev_uuid(&hotel_id)), err)]
    async fn review_summary(&self, hotel_id: HotelId) -> Result<ReviewSummary> {
        let summary = sqlx::query_as::<_, ReviewSummary>(
            "SELECT COUNT(*) AS review_count, AVG(rating)::float8 AS average_rating FROM reviews WHERE hotel_id = $1",
        )
        .bind(hotel_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }
}
