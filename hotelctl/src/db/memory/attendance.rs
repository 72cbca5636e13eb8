use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{InMemoryStore, paginate};
use crate::db::errors::{DbError, Result};
use crate::db::models::attendance::{AttendanceFilter, AttendanceLogCreateDBRequest, AttendanceLogDBResponse};
use crate::db::store::AttendanceStore;

#[async_trait]
impl AttendanceStore for InMemoryStore {
    async fn create_attendance_log(&self, request: &AttendanceLogCreateDBRequest) -> Result<AttendanceLogDBResponse> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&request.user_id) {
            return Err(DbError::foreign_key("attendance_logs", "attendance_logs_user_id_fkey"));
        }

        let log = AttendanceLogDBResponse {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            hotel_id: request.hotel_id,
            event: request.event,
            image_name: request.image_name.clone(),
            face_recognition: request.face_recognition,
            confidence: request.confidence,
            recorded_at: Utc::now(),
        };
        tables.attendance_logs.insert(log.id, log.clone());
        Ok(log)
    }

    async fn list_attendance_logs(&self, filter: &AttendanceFilter) -> Result<(Vec<AttendanceLogDBResponse>, i64)> {
        let mut logs: Vec<_> = self
            .tables
            .read()
            .attendance_logs
            .values()
            .filter(|log| filter.user_id.is_none_or(|user_id| log.user_id == user_id))
            .filter(|log| filter.hotel_id.is_none_or(|hotel_id| log.hotel_id == Some(hotel_id)))
            .filter(|log| filter.event.is_none_or(|event| log.event == event))
            .filter(|log| filter.from.is_none_or(|from| log.recorded_at >= from))
            .filter(|log| filter.to.is_none_or(|to| log.recorded_at < to))
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at).then(a.id.cmp(&b.id)));
        Ok(paginate(logs, filter.skip, filter.limit))
    }
}
