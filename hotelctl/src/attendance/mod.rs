//! Staff attendance logging.
//!
//! Managers and admins record check-in and check-out events, optionally with a photo. When face
//! recognition is configured the photo is verified through the [`Capability`] guard; any failure
//! of the collaborator is recorded as `unavailable` and never fails the attendance event itself.

pub mod face_recognition;

use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;
use tracing::instrument;
use utoipa::IntoParams;

use crate::api::models::{pagination::Pagination, users::CurrentUser};
use crate::auth::permissions::can_manage_hotel;
use crate::capability::Capability;
use crate::config::Config;
use crate::db::Store;
use crate::db::models::attendance::{
    AttendanceEvent, AttendanceFilter, AttendanceLogCreateDBRequest, AttendanceLogDBResponse, FaceRecognitionStatus,
};
use crate::errors::{Error, Result};
use crate::types::{HotelId, UserId, abbrev_uuid};
use face_recognition::{FaceRecognizer, HttpFaceRecognizer};

const ACCEPTED_CONTENT_TYPES: [&str; 2] = ["image/jpeg", "image/png"];
const MAX_IMAGE_NAME_LEN: usize = 255;

/// Uploaded attendance photo
#[derive(Debug, Clone)]
pub struct AttendanceImage {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct RecordAttendance {
    pub hotel_id: Option<HotelId>,
    pub event: AttendanceEvent,
    pub image: Option<AttendanceImage>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    #[param(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,
    #[param(value_type = Option<String>, format = "uuid")]
    pub hotel_id: Option<HotelId>,
    pub event: Option<AttendanceEvent>,
    pub from: Option<chrono::DateTime<chrono::Utc>>,
    pub to: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

#[derive(Clone)]
pub struct AttendanceService {
    store: Arc<dyn Store>,
    recognizer: Option<Arc<dyn FaceRecognizer>>,
    capability: Arc<Capability>,
    max_image_bytes: usize,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> anyhow::Result<Self> {
        let face = &config.attendance.face_recognition;
        let recognizer: Option<Arc<dyn FaceRecognizer>> = match (&face.url, face.enabled) {
            (Some(url), true) => Some(Arc::new(HttpFaceRecognizer::new(url.clone(), face.timeout)?)),
            _ => None,
        };
        Ok(Self::with_recognizer(store, recognizer, config))
    }

    pub fn with_recognizer(store: Arc<dyn Store>, recognizer: Option<Arc<dyn FaceRecognizer>>, config: &Config) -> Self {
        Self {
            store,
            recognizer,
            capability: Arc::new(Capability::new("face_recognition", config.attendance.face_recognition.cooldown)),
            max_image_bytes: config.attendance.max_image_bytes,
        }
    }

    pub fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }

    fn validate_image(&self, image: &AttendanceImage) -> Result<()> {
        if !ACCEPTED_CONTENT_TYPES.contains(&image.content_type.as_str()) {
            return Err(Error::invalid_field("image", "must be a JPEG or PNG image"));
        }
        if image.bytes.is_empty() {
            return Err(Error::invalid_field("image", "must not be empty"));
        }
        if image.bytes.len() > self.max_image_bytes {
            return Err(Error::invalid_field(
                "image",
                format!("must be at most {} bytes", self.max_image_bytes),
            ));
        }
        Ok(())
    }

    async fn recognize(&self, user_id: UserId, image: Option<&AttendanceImage>) -> (FaceRecognitionStatus, Option<f64>) {
        let (Some(recognizer), Some(image)) = (&self.recognizer, image) else {
            return (FaceRecognitionStatus::Skipped, None);
        };
        if !self.capability.is_available() {
            tracing::debug!(capability = self.capability.name(), "Skipping degraded collaborator");
            return (FaceRecognitionStatus::Unavailable, None);
        }
        match recognizer.verify(user_id, image).await {
            Ok(verdict) if verdict.matched => (FaceRecognitionStatus::Matched, verdict.confidence),
            Ok(verdict) => (FaceRecognitionStatus::NotMatched, verdict.confidence),
            Err(e) => {
                self.capability.mark_degraded(&e.to_string());
                (FaceRecognitionStatus::Unavailable, None)
            }
        }
    }

    #[instrument(skip_all, fields(user_id = %abbrev_uuid(&user.id), event = ?request.event), err)]
    pub async fn record(&self, user: &CurrentUser, request: RecordAttendance) -> Result<AttendanceLogDBResponse> {
        if let Some(image) = &request.image {
            self.validate_image(image)?;
        }
        if let Some(hotel_id) = request.hotel_id {
            let hotel = self
                .store
                .get_hotel(hotel_id)
                .await?
                .ok_or_else(|| Error::not_found("Hotel", hotel_id))?;
            if !can_manage_hotel(user, &hotel) {
                return Err(Error::not_found("Hotel", hotel_id));
            }
        }

        let (face_recognition, confidence) = self.recognize(user.id, request.image.as_ref()).await;
        let image_name = request
            .image
            .as_ref()
            .and_then(|image| image.file_name.as_deref())
            .map(|name| name.chars().take(MAX_IMAGE_NAME_LEN).collect());

        let log = self
            .store
            .create_attendance_log(&AttendanceLogCreateDBRequest {
                user_id: user.id,
                hotel_id: request.hotel_id,
                event: request.event,
                image_name,
                face_recognition,
                confidence,
            })
            .await?;
        tracing::info!(log_id = %abbrev_uuid(&log.id), face_recognition = ?face_recognition, "Recorded attendance");
        Ok(log)
    }

    /// Admins see every log. Managers see logs for hotels they own, or their own logs when no
    /// hotel is named.
    pub async fn list(&self, user: &CurrentUser, query: &AttendanceQuery) -> Result<(Vec<AttendanceLogDBResponse>, i64)> {
        let mut filter = AttendanceFilter {
            user_id: query.user_id,
            hotel_id: query.hotel_id,
            event: query.event,
            from: query.from,
            to: query.to,
            skip: query.pagination.skip(),
            limit: query.pagination.limit(),
        };
        if !user.is_admin() {
            match query.hotel_id {
                Some(hotel_id) => {
                    let hotel = self
                        .store
                        .get_hotel(hotel_id)
                        .await?
                        .ok_or_else(|| Error::not_found("Hotel", hotel_id))?;
                    if !can_manage_hotel(user, &hotel) {
                        return Err(Error::not_found("Hotel", hotel_id));
                    }
                }
                None => filter.user_id = Some(user.id),
            }
        }
        Ok(self.store.list_attendance_logs(&filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{create_test_config, create_test_room_type, create_test_store, create_test_user, current_user};
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn jpeg() -> AttendanceImage {
        AttendanceImage {
            file_name: Some("front-desk.jpg".to_string()),
            content_type: "image/jpeg".to_string(),
            bytes: Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0]),
        }
    }

    fn service_with(store: Arc<dyn Store>, url: Option<Url>) -> AttendanceService {
        crate::test_utils::install_crypto_provider();
        let config = create_test_config();
        let recognizer = url.map(|url| {
            Arc::new(HttpFaceRecognizer::new(url, Duration::from_millis(500)).unwrap()) as Arc<dyn FaceRecognizer>
        });
        AttendanceService::with_recognizer(store, recognizer, &config)
    }

    #[tokio::test]
    async fn test_record_without_recognizer_is_skipped() {
        let store = create_test_store();
        let manager = create_test_user(store.as_ref(), Role::HotelManager).await;
        let (hotel, _) = create_test_room_type(store.as_ref(), &manager, 1, 100).await;
        let service = service_with(store.clone(), None);

        let log = service
            .record(
                &current_user(&manager),
                RecordAttendance {
                    hotel_id: Some(hotel.id),
                    event: AttendanceEvent::CheckIn,
                    image: Some(jpeg()),
                },
            )
            .await
            .unwrap();
        assert_eq!(log.face_recognition, FaceRecognitionStatus::Skipped);
        assert_eq!(log.image_name.as_deref(), Some("front-desk.jpg"));
    }

    #[tokio::test]
    async fn test_recognizer_verdict_is_stored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "matched": true, "confidence": 0.93 })))
            .mount(&server)
            .await;

        let store = create_test_store();
        let manager = create_test_user(store.as_ref(), Role::HotelManager).await;
        let service = service_with(store, Some(Url::parse(&format!("{}/verify", server.uri())).unwrap()));

        let log = service
            .record(
                &current_user(&manager),
                RecordAttendance {
                    hotel_id: None,
                    event: AttendanceEvent::CheckOut,
                    image: Some(jpeg()),
                },
            )
            .await
            .unwrap();
        assert_eq!(log.face_recognition, FaceRecognitionStatus::Matched);
        assert_eq!(log.confidence, Some(0.93));
    }

    #[tokio::test]
    async fn test_collaborator_failure_degrades_without_failing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let store = create_test_store();
        let manager = current_user(&create_test_user(store.as_ref(), Role::HotelManager).await);
        let service = service_with(store, Some(Url::parse(&server.uri()).unwrap()));
        let request = || RecordAttendance {
            hotel_id: None,
            event: AttendanceEvent::CheckIn,
            image: Some(jpeg()),
        };

        let first = service.record(&manager, request()).await.unwrap();
        assert_eq!(first.face_recognition, FaceRecognitionStatus::Unavailable);

        // Inside the cooldown the collaborator is not called again
        let second = service.record(&manager, request()).await.unwrap();
        assert_eq!(second.face_recognition, FaceRecognitionStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_image_validation() {
        let store = create_test_store();
        let manager = current_user(&create_test_user(store.as_ref(), Role::HotelManager).await);
        let service = service_with(store, None);

        let mut gif = jpeg();
        gif.content_type = "image/gif".to_string();
        let err = service
            .record(
                &manager,
                RecordAttendance {
                    hotel_id: None,
                    event: AttendanceEvent::CheckIn,
                    image: Some(gif),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ValidationFailed { .. }));

        let mut huge = jpeg();
        huge.bytes = Bytes::from(vec![0u8; service.max_image_bytes() + 1]);
        let err = service
            .record(
                &manager,
                RecordAttendance {
                    hotel_id: None,
                    event: AttendanceEvent::CheckIn,
                    image: Some(huge),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ValidationFailed { .. }));
    }

    #[tokio::test]
    async fn test_managers_only_see_their_hotels() {
        let store = create_test_store();
        let owner = create_test_user(store.as_ref(), Role::HotelManager).await;
        let other = current_user(&create_test_user(store.as_ref(), Role::HotelManager).await);
        let (hotel, _) = create_test_room_type(store.as_ref(), &owner, 1, 100).await;
        let owner = current_user(&owner);
        let service = service_with(store, None);

        service
            .record(
                &owner,
                RecordAttendance {
                    hotel_id: Some(hotel.id),
                    event: AttendanceEvent::CheckIn,
                    image: None,
                },
            )
            .await
            .unwrap();

        let query = AttendanceQuery {
            hotel_id: Some(hotel.id),
            ..Default::default()
        };
        let (logs, total) = service.list(&owner, &query).await.unwrap();
        assert_eq!((logs.len(), total), (1, 1));

        let err = service.list(&other, &query).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        let (own, _) = service.list(&other, &AttendanceQuery::default()).await.unwrap();
        assert!(own.is_empty());
    }
}
