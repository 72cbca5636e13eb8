//! API response model for attendance logs.

use crate::db::models::attendance::{AttendanceEvent, AttendanceLogDBResponse, FaceRecognitionStatus};
use crate::types::{AttendanceLogId, HotelId, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceLogResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AttendanceLogId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub hotel_id: Option<HotelId>,
    pub event: AttendanceEvent,
    pub image_name: Option<String>,
    pub face_recognition: FaceRecognitionStatus,
    pub confidence: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

impl From<AttendanceLogDBResponse> for AttendanceLogResponse {
    fn from(db: AttendanceLogDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            hotel_id: db.hotel_id,
            event: db.event,
            image_name: db.image_name,
            face_recognition: db.face_recognition,
            confidence: db.confidence,
            recorded_at: db.recorded_at,
        }
    }
}
