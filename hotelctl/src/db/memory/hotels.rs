use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{InMemoryStore, Tables, contains_ci, paginate};
use crate::db::errors::{DbError, Result};
use crate::db::models::hotels::{
    HotelCreateDBRequest, HotelDBResponse, HotelFilter, HotelUpdateDBRequest, RoomCreateDBRequest, RoomDBResponse, RoomTypeCreateDBRequest,
    RoomTypeDBResponse, RoomTypeUpdateDBRequest, RoomUpdateDBRequest,
};
use crate::db::store::HotelStore;
use crate::types::{HotelId, RoomId, RoomTypeId};

impl Tables {
    /// Remove a room type and everything that cascades from it in the schema.
    fn cascade_room_type(&mut self, room_type_id: RoomTypeId) {
        self.room_types.remove(&room_type_id);
        self.rooms.retain(|_, room| room.room_type_id != room_type_id);
        self.pricing_rules.retain(|_, rule| rule.room_type_id != room_type_id);
        self.holds.retain(|_, hold| hold.room_type_id != room_type_id);
    }

    fn room_type_has_bookings(&self, room_type_id: RoomTypeId) -> bool {
        self.bookings.values().any(|booking| booking.room_type_id == room_type_id)
    }
}

#[async_trait]
impl HotelStore for InMemoryStore {
    async fn create_hotel(&self, request: &HotelCreateDBRequest) -> Result<HotelDBResponse> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&request.owner_id) {
            return Err(DbError::foreign_key("hotels", "hotels_owner_id_fkey"));
        }
        if let Some(destination_id) = request.destination_id
            && !tables.destinations.contains_key(&destination_id)
        {
            return Err(DbError::foreign_key("hotels", "hotels_destination_id_fkey"));
        }
        if tables
            .hotels
            .values()
            .any(|hotel| hotel.name == request.name && hotel.address == request.address)
        {
            return Err(DbError::unique("hotels", "hotels_name_address_key"));
        }

        let now = Utc::now();
        let hotel = HotelDBResponse {
            id: Uuid::new_v4(),
            owner_id: request.owner_id,
            destination_id: request.destination_id,
            name: request.name.clone(),
            address: request.address.clone(),
            city: request.city.clone(),
            description: request.description.clone(),
            star_rating: request.star_rating,
            status: request.status,
            created_at: now,
            updated_at: now,
        };
        tables.hotels.insert(hotel.id, hotel.clone());
        Ok(hotel)
    }

    async fn get_hotel(&self, id: HotelId) -> Result<Option<HotelDBResponse>> {
        Ok(self.tables.read().hotels.get(&id).cloned())
    }

    async fn list_hotels(&self, filter: &HotelFilter) -> Result<(Vec<HotelDBResponse>, i64)> {
        let tables = self.tables.read();
        let mut hotels: Vec<_> = tables
            .hotels
            .values()
            .filter(|hotel| filter.owner_id.is_none_or(|owner| hotel.owner_id == owner))
            .filter(|hotel| filter.destination_id.is_none_or(|d| hotel.destination_id == Some(d)))
            .filter(|hotel| filter.city.as_deref().is_none_or(|city| hotel.city.eq_ignore_ascii_case(city)))
            .filter(|hotel| filter.search.as_deref().is_none_or(|search| contains_ci(&hotel.name, search)))
            .filter(|hotel| filter.status.is_none_or(|status| hotel.status == status))
            .cloned()
            .collect();
        hotels.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(paginate(hotels, filter.skip, filter.limit))
    }

    async fn update_hotel(&self, id: HotelId, request: &HotelUpdateDBRequest) -> Result<HotelDBResponse> {
        let mut tables = self.tables.write();
        if let Some(destination_id) = request.destination_id
            && !tables.destinations.contains_key(&destination_id)
        {
            return Err(DbError::foreign_key("hotels", "hotels_destination_id_fkey"));
        }
        let hotel = tables.hotels.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(destination_id) = request.destination_id {
            hotel.destination_id = Some(destination_id);
        }
        if let Some(name) = &request.name {
            hotel.name = name.clone();
        }
        if let Some(address) = &request.address {
            hotel.address = address.clone();
        }
        if let Some(city) = &request.city {
            hotel.city = city.clone();
        }
        if let Some(description) = &request.description {
            hotel.description = Some(description.clone());
        }
        if let Some(star_rating) = request.star_rating {
            hotel.star_rating = Some(star_rating);
        }
        if let Some(status) = request.status {
            hotel.status = status;
        }
        hotel.updated_at = Utc::now();
        Ok(hotel.clone())
    }

    async fn delete_hotel(&self, id: HotelId) -> Result<bool> {
        let mut tables = self.tables.write();
        if !tables.hotels.contains_key(&id) {
            return Ok(false);
        }
        if tables.bookings.values().any(|booking| booking.hotel_id == id) {
            return Err(DbError::foreign_key("hotels", "bookings_hotel_id_fkey"));
        }
        let room_type_ids: Vec<_> = tables
            .room_types
            .values()
            .filter(|room_type| room_type.hotel_id == id)
            .map(|room_type| room_type.id)
            .collect();
        for room_type_id in room_type_ids {
            tables.cascade_room_type(room_type_id);
        }
        tables.reviews.retain(|_, review| review.hotel_id != id);
        tables.promo_codes.retain(|_, promo| promo.hotel_id != Some(id));
        tables.sync_records.retain(|_, record| record.hotel_id != id);
        tables.hotels.remove(&id);
        Ok(true)
    }

    async fn create_room_type(&self, request: &RoomTypeCreateDBRequest) -> Result<RoomTypeDBResponse> {
        let mut tables = self.tables.write();
        if !tables.hotels.contains_key(&request.hotel_id) {
            return Err(DbError::foreign_key("room_types", "room_types_hotel_id_fkey"));
        }
        if tables
            .room_types
            .values()
            .any(|room_type| room_type.hotel_id == request.hotel_id && room_type.name == request.name)
        {
            return Err(DbError::unique("room_types", "room_types_hotel_name_key"));
        }

        let now = Utc::now();
        let room_type = RoomTypeDBResponse {
            id: Uuid::new_v4(),
            hotel_id: request.hotel_id,
            name: request.name.clone(),
            description: request.description.clone(),
            base_price: request.base_price,
            max_guests: request.max_guests,
            is_available: true,
            created_at: now,
            updated_at: now,
        };
        tables.room_types.insert(room_type.id, room_type.clone());
        Ok(room_type)
    }

    async fn get_room_type(&self, id: RoomTypeId) -> Result<Option<RoomTypeDBResponse>> {
        Ok(self.tables.read().room_types.get(&id).cloned())
    }

    async fn list_room_types(&self, hotel_id: HotelId) -> Result<Vec<RoomTypeDBResponse>> {
        let mut room_types: Vec<_> = self
            .tables
            .read()
            .room_types
            .values()
            .filter(|room_type| room_type.hotel_id == hotel_id)
            .cloned()
            .collect();
        room_types.sort_by(|a, b| a.base_price.cmp(&b.base_price).then(a.name.cmp(&b.name)));
        Ok(room_types)
    }

    async fn update_room_type(&self, id: RoomTypeId, request: &RoomTypeUpdateDBRequest) -> Result<RoomTypeDBResponse> {
        let mut tables = self.tables.write();
        let room_type = tables.room_types.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(name) = &request.name {
            room_type.name = name.clone();
        }
        if let Some(description) = &request.description {
            room_type.description = Some(description.clone());
        }
        if let Some(base_price) = request.base_price {
            room_type.base_price = base_price;
        }
        if let Some(max_guests) = request.max_guests {
            room_type.max_guests = max_guests;
        }
        if let Some(is_available) = request.is_available {
            room_type.is_available = is_available;
        }
        room_type.updated_at = Utc::now();
        Ok(room_type.clone())
    }

    async fn delete_room_type(&self, id: RoomTypeId) -> Result<bool> {
        let mut tables = self.tables.write();
        if !tables.room_types.contains_key(&id) {
            return Ok(false);
        }
        if tables.room_type_has_bookings(id) {
            return Err(DbError::foreign_key("room_types", "bookings_room_type_id_fkey"));
        }
        tables.cascade_room_type(id);
        Ok(true)
    }

    async fn create_room(&self, request: &RoomCreateDBRequest) -> Result<RoomDBResponse> {
        let mut tables = self.tables.write();
        if !tables.room_types.contains_key(&request.room_type_id) {
            return Err(DbError::foreign_key("rooms", "rooms_room_type_id_fkey"));
        }
        if tables
            .rooms
            .values()
            .any(|room| room.room_type_id == request.room_type_id && room.room_number == request.room_number)
        {
            return Err(DbError::unique("rooms", "rooms_room_type_number_key"));
        }

        let now = Utc::now();
        let room = RoomDBResponse {
            id: Uuid::new_v4(),
            room_type_id: request.room_type_id,
            room_number: request.room_number.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn get_room(&self, id: RoomId) -> Result<Option<RoomDBResponse>> {
        Ok(self.tables.read().rooms.get(&id).cloned())
    }

    async fn list_rooms(&self, room_type_id: RoomTypeId) -> Result<Vec<RoomDBResponse>> {
        let mut rooms: Vec<_> = self
            .tables
            .read()
            .rooms
            .values()
            .filter(|room| room.room_type_id == room_type_id)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.room_number.cmp(&b.room_number));
        Ok(rooms)
    }

    async fn update_room(&self, id: RoomId, request: &RoomUpdateDBRequest) -> Result<RoomDBResponse> {
        let mut tables = self.tables.write();
        let room = tables.rooms.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(room_number) = &request.room_number {
            room.room_number = room_number.clone();
        }
        if let Some(is_active) = request.is_active {
            room.is_active = is_active;
        }
        room.updated_at = Utc::now();
        Ok(room.clone())
    }

    async fn delete_room(&self, id: RoomId) -> Result<bool> {
        Ok(self.tables.write().rooms.remove(&id).is_some())
    }
}
