//! Database models for staff attendance logs.

use crate::types::{AttendanceLogId, HotelId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "attendance_event", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceEvent {
    CheckIn,
    CheckOut,
}

/// Result of the optional face-recognition step for an attendance event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "face_recognition_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FaceRecognitionStatus {
    Matched,
    NotMatched,
    /// The collaborator failed or is in its degraded cooldown
    Unavailable,
    /// No image supplied, or face recognition is disabled
    Skipped,
}

#[derive(Debug, Clone)]
pub struct AttendanceLogCreateDBRequest {
    pub user_id: UserId,
    pub hotel_id: Option<HotelId>,
    pub event: AttendanceEvent,
    pub image_name: Option<String>,
    pub face_recognition: FaceRecognitionStatus,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AttendanceLogDBResponse {
    pub id: AttendanceLogId,
    pub user_id: UserId,
    pub hotel_id: Option<HotelId>,
    pub event: AttendanceEvent,
    pub image_name: Option<String>,
    pub face_recognition: FaceRecognitionStatus,
    pub confidence: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub user_id: Option<UserId>,
    pub hotel_id: Option<HotelId>,
    pub event: Option<AttendanceEvent>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub skip: i64,
    pub limit: i64,
}
