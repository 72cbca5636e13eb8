use axum::extract::{Multipart, Query, State};
use bytes::BytesMut;

use crate::{
    AppState,
    api::models::{attendance::AttendanceLogResponse, pagination::PaginatedResponse, response::ApiResponse},
    attendance::{AttendanceImage, AttendanceQuery, RecordAttendance},
    auth::permissions::{RequiresPermission, operation, resource},
    db::models::attendance::AttendanceEvent,
    errors::{Error, Result},
    types::HotelId,
};

fn multipart_error(e: impl std::fmt::Display) -> Error {
    Error::validation(format!("Failed to parse multipart data: {e}"))
}

fn parse_event(value: &str) -> Result<AttendanceEvent> {
    match value.trim() {
        "check_in" => Ok(AttendanceEvent::CheckIn),
        "check_out" => Ok(AttendanceEvent::CheckOut),
        _ => Err(Error::invalid_field("event", "must be check_in or check_out")),
    }
}

/// Record a staff check-in or check-out.
///
/// Multipart fields: `event` (required), `hotel_id` (optional) and `image` (optional JPEG or PNG).
/// Face recognition runs on the image when configured; its failure never rejects the event.
#[utoipa::path(
    post,
    path = "/attendance",
    tag = "attendance",
    request_body(content_type = "multipart/form-data", description = "Event, optional hotel and optional photo"),
    responses(
        (status = 201, description = "Attendance recorded", body = ApiResponse<AttendanceLogResponse>),
        (status = 403, description = "Staff only"),
        (status = 422, description = "Invalid event or image"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn record_attendance(
    State(state): State<AppState>,
    perm: RequiresPermission<resource::Attendance, operation::CreateOwn>,
    mut multipart: Multipart,
) -> Result<ApiResponse<AttendanceLogResponse>> {
    let max_image_bytes = state.attendance.max_image_bytes();
    let mut event = None;
    let mut hotel_id: Option<HotelId> = None;
    let mut image = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name().unwrap_or_default() {
            "event" => event = Some(parse_event(&field.text().await.map_err(multipart_error)?)?),
            "hotel_id" => {
                let text = field.text().await.map_err(multipart_error)?;
                if !text.trim().is_empty() {
                    hotel_id = Some(
                        text.trim()
                            .parse()
                            .map_err(|_| Error::invalid_field("hotel_id", "must be a UUID"))?,
                    );
                }
            }
            "image" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
                let mut bytes = BytesMut::new();
                // Abort as soon as the upload passes the limit
                while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                    if bytes.len() + chunk.len() > max_image_bytes {
                        return Err(Error::invalid_field(
                            "image",
                            format!("must be at most {max_image_bytes} bytes"),
                        ));
                    }
                    bytes.extend_from_slice(&chunk);
                }
                image = Some(AttendanceImage {
                    file_name,
                    content_type,
                    bytes: bytes.freeze(),
                });
            }
            other => tracing::debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    let event = event.ok_or_else(|| Error::invalid_field("event", "is required"))?;
    let log = state
        .attendance
        .record(&perm.user, RecordAttendance { hotel_id, event, image })
        .await?;
    Ok(ApiResponse::created("Attendance recorded", AttendanceLogResponse::from(log)))
}

/// List attendance logs visible to the caller
#[utoipa::path(
    get,
    path = "/attendance",
    tag = "attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Page of attendance logs", body = ApiResponse<PaginatedResponse<AttendanceLogResponse>>),
        (status = 404, description = "Hotel not found or not managed by the caller"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_attendance(
    State(state): State<AppState>,
    Query(query): Query<AttendanceQuery>,
    perm: RequiresPermission<resource::Attendance, operation::ReadOwn>,
) -> Result<ApiResponse<PaginatedResponse<AttendanceLogResponse>>> {
    let (logs, total_count) = state.attendance.list(&perm.user, &query).await?;
    let (skip, limit) = query.pagination.params();
    let logs = logs.into_iter().map(AttendanceLogResponse::from).collect();
    Ok(ApiResponse::ok(
        "Attendance logs retrieved",
        PaginatedResponse::new(logs, total_count, skip, limit),
    ))
}
