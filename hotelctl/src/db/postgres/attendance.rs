use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use super::PostgresStore;
use crate::db::errors::Result;
use crate::db::models::attendance::{AttendanceFilter, AttendanceLogCreateDBRequest, AttendanceLogDBResponse};
use crate::db::store::AttendanceStore;
use crate::types::abbrev_uuid;

#[async_trait]
impl AttendanceStore for PostgresStore {
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), event = ?request.event), err)]
    async fn create_attendance_log(&self, request: &AttendanceLogCreateDBRequest) -> Result<AttendanceLogDBResponse> {
        let log = sqlx::query_as::<_, AttendanceLogDBResponse>(
            r#"
            INSERT INTO attendance_logs (id, user_id, hotel_id, event, image_name, face_recognition, confidence)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(request.hotel_id)
        .bind(request.event)
        .bind(&request.image_name)
        .bind(request.face_recognition)
        .bind(request.confidence)
        .fetch_one(&self.pool)
        .await?;
        Ok(log)
    }

    #[instrument(skip(self, filter), err)]
    async fn list_attendance_logs(&self, filter: &AttendanceFilter) -> Result<(Vec<AttendanceLogDBResponse>, i64)> {
        const WHERE: &str = r#"
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::uuid IS NULL OR hotel_id = $2)
              AND ($3::attendance_event IS NULL OR event = $3)
              AND ($4::timestamptz IS NULL OR recorded_at >= $4)
              AND ($5::timestamptz IS NULL OR recorded_at < $5)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM attendance_logs {WHERE}"))
            .bind(filter.user_id)
            .bind(filter.hotel_id)
            .bind(filter.event)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_one(&self.pool)
            .await?;
        let logs = sqlx::query_as::<_, AttendanceLogDBResponse>(&format!(
            "SELECT * FROM attendance_logs {WHERE} ORDER BY recorded_at DESC, id LIMIT $6 OFFSET $7"
        ))
        .bind(filter.user_id)
        .bind(filter.hotel_id)
        .bind(filter.event)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&self.pool)
        .await?;
        Ok((logs, total))
    }
}
