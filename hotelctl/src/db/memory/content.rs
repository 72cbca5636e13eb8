use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{InMemoryStore, paginate};
use crate::db::errors::{DbError, Result};
use crate::db::models::content::{
    DestinationCreateDBRequest, DestinationDBResponse, DestinationUpdateDBRequest, ReviewCreateDBRequest, ReviewDBResponse, ReviewSummary,
};
use crate::db::store::ContentStore;
use crate::types::{DestinationId, HotelId};

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn create_destination(&self, request: &DestinationCreateDBRequest) -> Result<DestinationDBResponse> {
        let mut tables = self.tables.write();
        if tables
            .destinations
            .values()
            .any(|d| d.name == request.name && d.country == request.country)
        {
            return Err(DbError::unique("destinations", "destinations_name_country_key"));
        }

        let now = Utc::now();
        let destination = DestinationDBResponse {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            country: request.country.clone(),
            description: request.description.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.destinations.insert(destination.id, destination.clone());
        Ok(destination)
    }

    async fn get_destination(&self, id: DestinationId) -> Result<Option<DestinationDBResponse>> {
        Ok(self.tables.read().destinations.get(&id).cloned())
    }

    async fn list_destinations(&self, skip: i64, limit: i64) -> Result<(Vec<DestinationDBResponse>, i64)> {
        let mut destinations: Vec<_> = self.tables.read().destinations.values().cloned().collect();
        destinations.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(paginate(destinations, skip, limit))
    }

    async fn update_destination(&self, id: DestinationId, request: &DestinationUpdateDBRequest) -> Result<DestinationDBResponse> {
        let mut tables = self.tables.write();
        let destination = tables.destinations.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(name) = &request.name {
            destination.name = name.clone();
        }
        if let Some(country) = &request.country {
            destination.country = country.clone();
        }
        if let Some(description) = &request.description {
            destination.description = Some(description.clone());
        }
        destination.updated_at = Utc::now();
        Ok(destination.clone())
    }

    async fn delete_destination(&self, id: DestinationId) -> Result<bool> {
        let mut tables = self.tables.write();
        if tables.hotels.values().any(|hotel| hotel.destination_id == Some(id)) {
            return Err(DbError::foreign_key("destinations", "hotels_destination_id_fkey"));
        }
        Ok(tables.destinations.remove(&id).is_some())
    }

    async fn create_review(&self, request: &ReviewCreateDBRequest) -> Result<ReviewDBResponse> {
        let mut tables = self.tables.write();
        if !tables.hotels.contains_key(&request.hotel_id) {
            return Err(DbError::foreign_key("reviews", "reviews_hotel_id_fkey"));
        }
        if tables
            .reviews
            .values()
            .any(|review| review.hotel_id == request.hotel_id && review.user_id == request.user_id)
        {
            return Err(DbError::unique("reviews", "reviews_hotel_user_key"));
        }

        let review = ReviewDBResponse {
            id: Uuid::new_v4(),
            hotel_id: request.hotel_id,
            user_id: request.user_id,
            rating: request.rating,
            comment: request.comment.clone(),
            created_at: Utc::now(),
        };
        tables.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn list_reviews(&self, hotel_id: HotelId, skip: i64, limit: i64) -> Result<(Vec<ReviewDBResponse>, i64)> {
        let mut reviews: Vec<_> = self
            .tables
            .read()
            .reviews
            .values()
            .filter(|review| review.hotel_id == hotel_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(paginate(reviews, skip, limit))
    }

    async fn review_summary(&self, hotel_id: HotelId) -> Result<ReviewSummary> {
        let tables = self.tables.read();
        let ratings: Vec<i64> = tables
            .reviews
            .values()
            .filter(|review| review.hotel_id == hotel_id)
            .map(|review| i64::from(review.rating))
            .collect();
        let review_count = ratings.len() as i64;
        let average_rating = (review_count > 0).then(|| ratings.iter().sum::<i64>() as f64 / review_count as f64);
        Ok(ReviewSummary {
            review_count,
            average_rating,
        })
    }
}
