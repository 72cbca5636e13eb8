//! Synchronization with the external channel system.
//!
//! Outbound: availability and pricing snapshots of a hotel over a date range are pushed to the
//! configured [`SyncTarget`]. Every `(hotel, kind, range)` has a stable idempotency key, and the
//! hash of the last pushed snapshot is kept in `sync_records`; repeating a sync whose snapshot has
//! not changed pushes nothing, and a changed snapshot is pushed under the same key so the external
//! side upserts rather than duplicates.
//!
//! Inbound: signed pushes of base prices and room states are reconciled newest-wins. An update
//! is applied only when its `updated_at` is strictly newer than the local row's.

pub mod scheduler;
pub mod signing;
pub mod target;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::instrument;
use utoipa::ToSchema;

use crate::api::models::users::CurrentUser;
use crate::auth::permissions::can_manage_hotel;
use crate::config::Config;
use crate::db::Store;
use crate::db::models::hotels::{HotelDBResponse, HotelFilter, HotelStatus};
use crate::db::models::pricing::AdjustmentKind;
use crate::db::models::sync::{ApplyOutcome, SyncKind, SyncRecordDBResponse, SyncRecordUpsert};
use crate::errors::{Error, Result};
use crate::pricing::{NightlyPrice, PricingService};
use crate::pricing::rules::MAX_NIGHTLY_PRICE;
use crate::stay::DateRange;
use crate::types::{HotelId, RoomId, RoomTypeId, abbrev_uuid};
pub use target::{SyncError, SyncTarget, create_target};

/// Body of one outbound push
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SyncEnvelope {
    pub idempotency_key: String,
    #[schema(value_type = String, format = "uuid")]
    pub hotel_id: HotelId,
    pub kind: SyncKind,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub snapshot_hash: String,
    #[schema(value_type = Object)]
    pub snapshot: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct AvailabilitySnapshot {
    room_types: Vec<RoomTypeAvailability>,
}

#[derive(Debug, Serialize)]
struct RoomTypeAvailability {
    room_type_id: RoomTypeId,
    name: String,
    days: Vec<DayAvailability>,
}

#[derive(Debug, Serialize)]
struct DayAvailability {
    date: NaiveDate,
    total_rooms: i64,
    available: i64,
}

#[derive(Debug, Serialize)]
struct PricingSnapshot {
    currency: String,
    room_types: Vec<RoomTypePricing>,
}

#[derive(Debug, Serialize)]
struct RoomTypePricing {
    room_type_id: RoomTypeId,
    name: String,
    base_price: i64,
    rules: Vec<RuleSnapshot>,
    nightly: Vec<NightlyPrice>,
}

#[derive(Debug, Serialize)]
struct RuleSnapshot {
    label: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    weekdays: Option<i16>,
    kind: AdjustmentKind,
    value: i64,
    priority: i32,
}

/// What one sync call did
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SyncOutcome {
    pub kind: SyncKind,
    pub idempotency_key: String,
    /// False when the snapshot matched the last push and nothing was sent
    pub pushed: bool,
    pub records: i32,
    pub push_count: i32,
    pub last_synced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HotelSyncResult {
    #[schema(value_type = String, format = "uuid")]
    pub hotel_id: HotelId,
    pub availability: SyncOutcome,
    pub pricing: SyncOutcome,
}

/// Per-hotel entry of a multi-hotel sync, in request order
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchSyncItem {
    #[schema(value_type = String, format = "uuid")]
    pub hotel_id: HotelId,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<HotelSyncResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncReadiness {
    Ready,
    Incomplete,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SyncRecordSummary {
    pub idempotency_key: String,
    pub kind: SyncKind,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub snapshot_hash: String,
    pub records: i32,
    pub push_count: i32,
    pub last_synced_at: DateTime<Utc>,
}

impl From<SyncRecordDBResponse> for SyncRecordSummary {
    fn from(record: SyncRecordDBResponse) -> Self {
        Self {
            idempotency_key: record.idempotency_key,
            kind: record.kind,
            range_start: record.range_start,
            range_end: record.range_end,
            snapshot_hash: record.snapshot_hash,
            records: record.records,
            push_count: record.push_count,
            last_synced_at: record.last_synced_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SyncStatus {
    #[schema(value_type = String, format = "uuid")]
    pub hotel_id: HotelId,
    pub last_sync: Option<DateTime<Utc>>,
    pub status: SyncReadiness,
    pub room_types_count: usize,
    /// Every room type has a positive base price
    pub pricing_configured: bool,
    pub records: Vec<SyncRecordSummary>,
}

/// Externally pushed state for one hotel
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IncomingSync {
    #[schema(value_type = String, format = "uuid")]
    pub hotel_id: HotelId,
    #[serde(default)]
    pub pricing_updates: Vec<PricingUpdate>,
    #[serde(default)]
    pub availability_updates: Vec<AvailabilityUpdate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PricingUpdate {
    #[schema(value_type = String, format = "uuid")]
    pub room_type_id: RoomTypeId,
    pub base_price: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityUpdate {
    #[schema(value_type = String, format = "uuid")]
    pub room_id: RoomId,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RejectedUpdate {
    pub id: uuid::Uuid,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct IncomingSyncResult {
    pub applied: usize,
    /// Updates not newer than the local row
    pub stale: usize,
    pub rejected: Vec<RejectedUpdate>,
}

/// Signature headers of an inbound push
#[derive(Debug, Clone)]
pub struct SignedRequest<'a> {
    pub sync_id: &'a str,
    pub timestamp: i64,
    pub signature: &'a str,
    pub body: &'a str,
}

/// Stable key for a `(hotel, kind, range)` push
pub fn idempotency_key(hotel_id: HotelId, kind: SyncKind, range: DateRange) -> String {
    let digest = Sha256::digest(format!("{hotel_id}:{}:{}:{}", kind.as_str(), range.start, range.end).as_bytes());
    format!("sync_{}", &format!("{digest:x}")[..32])
}

fn snapshot_hash(snapshot: &serde_json::Value) -> String {
    format!("{:x}", Sha256::digest(snapshot.to_string().as_bytes()))
}

#[derive(Clone)]
pub struct SyncService {
    store: Arc<dyn Store>,
    pricing: PricingService,
    target: Arc<dyn SyncTarget>,
    inbound_secret: Option<String>,
    max_concurrency: usize,
}

impl SyncService {
    pub fn new(store: Arc<dyn Store>, pricing: PricingService, target: Arc<dyn SyncTarget>, config: &Config) -> Self {
        Self {
            store,
            pricing,
            target,
            inbound_secret: config.sync.inbound_secret.clone(),
            max_concurrency: config.sync.max_concurrency.max(1),
        }
    }

    async fn hotel(&self, hotel_id: HotelId) -> Result<HotelDBResponse> {
        self.store
            .get_hotel(hotel_id)
            .await?
            .ok_or_else(|| Error::not_found("Hotel", hotel_id))
    }

    async fn availability_snapshot(&self, hotel_id: HotelId, range: DateRange, now: DateTime<Utc>) -> Result<(serde_json::Value, i32)> {
        let mut room_types = self.store.list_room_types(hotel_id).await?;
        room_types.sort_by_key(|room_type| room_type.id);

        let mut snapshot = AvailabilitySnapshot { room_types: Vec::new() };
        let mut records = 0;
        for room_type in room_types {
            let nights = self
                .store
                .occupancy(room_type.id, range.start, range.end_exclusive(), now, None)
                .await?;
            let days: Vec<DayAvailability> = nights
                .iter()
                .map(|night| DayAvailability {
                    date: night.date,
                    total_rooms: night.total_rooms,
                    available: night.available(),
                })
                .collect();
            records += days.len() as i32;
            snapshot.room_types.push(RoomTypeAvailability {
                room_type_id: room_type.id,
                name: room_type.name,
                days,
            });
        }
        Ok((serde_json::to_value(&snapshot).map_err(anyhow::Error::from)?, records))
    }

    async fn pricing_snapshot(&self, hotel_id: HotelId, range: DateRange) -> Result<(serde_json::Value, i32)> {
        let mut room_types = self.store.list_room_types(hotel_id).await?;
        room_types.sort_by_key(|room_type| room_type.id);

        let mut snapshot = PricingSnapshot {
            currency: self.pricing.currency().to_string(),
            room_types: Vec::new(),
        };
        let mut records = 0;
        for room_type in room_types {
            let mut rules = self.store.list_pricing_rules(room_type.id).await?;
            rules.sort_by_key(|rule| rule.id);
            let nightly = self.pricing.price_range_for(&room_type, &rules, range).nightly;
            records += nightly.len() as i32;
            snapshot.room_types.push(RoomTypePricing {
                room_type_id: room_type.id,
                name: room_type.name,
                base_price: room_type.base_price,
                rules: rules
                    .into_iter()
                    .map(|rule| RuleSnapshot {
                        label: rule.label,
                        start_date: rule.start_date,
                        end_date: rule.end_date,
                        weekdays: rule.weekdays,
                        kind: rule.kind,
                        value: rule.value,
                        priority: rule.priority,
                    })
                    .collect(),
                nightly,
            });
        }
        Ok((serde_json::to_value(&snapshot).map_err(anyhow::Error::from)?, records))
    }

    /// Pushes one kind of snapshot unless it matches the last push for the same key
    #[instrument(skip(self), fields(hotel_id = %abbrev_uuid(&hotel_id), kind = kind.as_str()), err)]
    pub async fn sync_hotel(&self, hotel_id: HotelId, kind: SyncKind, start: NaiveDate, end: NaiveDate, now: DateTime<Utc>) -> Result<SyncOutcome> {
        let range = DateRange::new(start, end)?;
        self.hotel(hotel_id).await?;

        let (snapshot, records) = match kind {
            SyncKind::Availability => self.availability_snapshot(hotel_id, range, now).await?,
            SyncKind::Pricing => self.pricing_snapshot(hotel_id, range).await?,
        };
        let key = idempotency_key(hotel_id, kind, range);
        let hash = snapshot_hash(&snapshot);

        if let Some(existing) = self.store.get_sync_record(&key).await?
            && existing.snapshot_hash == hash
        {
            tracing::debug!(idempotency_key = %key, "Snapshot unchanged, skipping push");
            return Ok(SyncOutcome {
                kind,
                idempotency_key: key,
                pushed: false,
                records: existing.records,
                push_count: existing.push_count,
                last_synced_at: existing.last_synced_at,
            });
        }

        let envelope = SyncEnvelope {
            idempotency_key: key.clone(),
            hotel_id,
            kind,
            range_start: range.start,
            range_end: range.end,
            snapshot_hash: hash.clone(),
            snapshot,
        };
        if let Err(e) = self.target.push(&envelope).await {
            metrics::counter!("hotelctl_sync_pushes_total", "kind" => kind.as_str(), "outcome" => "failed").increment(1);
            return Err(Error::UpstreamFailure {
                service: format!("{} sync target", self.target.name()),
                message: e.to_string(),
            });
        }
        metrics::counter!("hotelctl_sync_pushes_total", "kind" => kind.as_str(), "outcome" => "pushed").increment(1);

        let stored = self
            .store
            .record_sync_push(
                &SyncRecordUpsert {
                    idempotency_key: key,
                    hotel_id,
                    kind,
                    range_start: range.start,
                    range_end: range.end,
                    snapshot_hash: hash,
                    records,
                },
                now,
            )
            .await?;
        tracing::info!(idempotency_key = %stored.idempotency_key, push_count = stored.push_count, "Pushed sync snapshot");

        Ok(SyncOutcome {
            kind,
            idempotency_key: stored.idempotency_key,
            pushed: true,
            records: stored.records,
            push_count: stored.push_count,
            last_synced_at: stored.last_synced_at,
        })
    }

    pub async fn sync_hotel_availability(&self, hotel_id: HotelId, start: NaiveDate, end: NaiveDate, now: DateTime<Utc>) -> Result<SyncOutcome> {
        self.sync_hotel(hotel_id, SyncKind::Availability, start, end, now).await
    }

    pub async fn sync_hotel_pricing(&self, hotel_id: HotelId, start: NaiveDate, end: NaiveDate, now: DateTime<Utc>) -> Result<SyncOutcome> {
        self.sync_hotel(hotel_id, SyncKind::Pricing, start, end, now).await
    }

    /// Availability and pricing together
    pub async fn sync_hotel_data(&self, hotel_id: HotelId, start: NaiveDate, end: NaiveDate, now: DateTime<Utc>) -> Result<HotelSyncResult> {
        let availability = self.sync_hotel_availability(hotel_id, start, end, now).await?;
        let pricing = self.sync_hotel_pricing(hotel_id, start, end, now).await?;
        Ok(HotelSyncResult {
            hotel_id,
            availability,
            pricing,
        })
    }

    /// Syncs each hotel independently, at most `max_concurrency` at a time. One entry per input,
    /// in input order. With a caller, hotels the caller does not manage fail individually.
    #[instrument(skip(self, caller, hotel_ids), fields(hotels = hotel_ids.len()))]
    pub async fn sync_multiple(
        &self,
        caller: Option<&CurrentUser>,
        hotel_ids: &[HotelId],
        start: NaiveDate,
        end: NaiveDate,
        now: DateTime<Utc>,
    ) -> Vec<BatchSyncItem> {
        stream::iter(hotel_ids.iter().copied())
            .map(|hotel_id| async move {
                let result = async {
                    if let Some(caller) = caller {
                        let hotel = self.hotel(hotel_id).await?;
                        if !can_manage_hotel(caller, &hotel) {
                            return Err(Error::not_found("Hotel", hotel_id));
                        }
                    }
                    self.sync_hotel_data(hotel_id, start, end, now).await
                }
                .await;
                match result {
                    Ok(result) => BatchSyncItem {
                        hotel_id,
                        success: true,
                        result: Some(result),
                        error: None,
                    },
                    Err(e) => {
                        tracing::warn!(hotel_id = %abbrev_uuid(&hotel_id), error = %e, "Hotel sync failed");
                        BatchSyncItem {
                            hotel_id,
                            success: false,
                            result: None,
                            error: Some(e.user_message()),
                        }
                    }
                }
            })
            .buffered(self.max_concurrency)
            .collect()
            .await
    }

    /// Every active hotel, for the periodic push
    pub async fn active_hotel_ids(&self) -> Result<Vec<HotelId>> {
        const PAGE: i64 = 100;
        let mut ids = Vec::new();
        let mut skip = 0;
        loop {
            let (hotels, total) = self
                .store
                .list_hotels(&HotelFilter {
                    status: Some(HotelStatus::Active),
                    skip,
                    limit: PAGE,
                    ..Default::default()
                })
                .await?;
            let fetched = hotels.len() as i64;
            ids.extend(hotels.into_iter().map(|hotel| hotel.id));
            skip += fetched;
            if fetched == 0 || skip >= total {
                return Ok(ids);
            }
        }
    }

    pub async fn sync_status(&self, hotel_id: HotelId) -> Result<SyncStatus> {
        self.hotel(hotel_id).await?;
        let room_types = self.store.list_room_types(hotel_id).await?;
        let records = self.store.list_sync_records(hotel_id).await?;

        let pricing_configured = !room_types.is_empty() && room_types.iter().all(|room_type| room_type.base_price > 0);
        let status = if pricing_configured {
            SyncReadiness::Ready
        } else {
            SyncReadiness::Incomplete
        };
        Ok(SyncStatus {
            hotel_id,
            last_sync: records.iter().map(|record| record.last_synced_at).max(),
            status,
            room_types_count: room_types.len(),
            pricing_configured,
            records: records.into_iter().map(SyncRecordSummary::from).collect(),
        })
    }

    /// Verifies and applies an inbound push, newest `updated_at` wins
    #[instrument(skip_all, fields(sync_id = %request.sync_id), err)]
    pub async fn handle_incoming(&self, request: &SignedRequest<'_>, now: DateTime<Utc>) -> Result<IncomingSyncResult> {
        let Some(secret) = self.inbound_secret.as_deref() else {
            return Err(Error::Unauthenticated {
                message: Some("Incoming sync is not enabled".to_string()),
            });
        };
        let fresh = (now.timestamp() - request.timestamp).abs() <= signing::TIMESTAMP_TOLERANCE_SECS;
        if !fresh || !signing::verify_signature(request.sync_id, request.timestamp, request.body, request.signature, secret) {
            return Err(Error::Unauthenticated {
                message: Some("Invalid sync signature".to_string()),
            });
        }

        let payload: IncomingSync =
            serde_json::from_str(request.body).map_err(|e| Error::validation(format!("Invalid sync payload: {e}")))?;
        self.hotel(payload.hotel_id).await?;

        let mut result = IncomingSyncResult::default();
        for update in &payload.pricing_updates {
            if !(0..=MAX_NIGHTLY_PRICE).contains(&update.base_price) {
                result.rejected.push(RejectedUpdate {
                    id: update.room_type_id,
                    reason: format!("base_price must be between 0 and {MAX_NIGHTLY_PRICE}"),
                });
                continue;
            }
            let outcome = self
                .store
                .apply_room_type_price(payload.hotel_id, update.room_type_id, update.base_price, update.updated_at)
                .await?;
            tally(&mut result, outcome, update.room_type_id, "room type");
        }
        for update in &payload.availability_updates {
            let outcome = self
                .store
                .apply_room_state(payload.hotel_id, update.room_id, update.is_active, update.updated_at)
                .await?;
            tally(&mut result, outcome, update.room_id, "room");
        }

        tracing::info!(
            hotel_id = %abbrev_uuid(&payload.hotel_id),
            applied = result.applied,
            stale = result.stale,
            rejected = result.rejected.len(),
            "Reconciled incoming sync"
        );
        Ok(result)
    }
}

fn tally(result: &mut IncomingSyncResult, outcome: ApplyOutcome, id: uuid::Uuid, entity: &str) {
    match outcome {
        ApplyOutcome::Applied => result.applied += 1,
        ApplyOutcome::Stale => result.stale += 1,
        ApplyOutcome::Unknown => result.rejected.push(RejectedUpdate {
            id,
            reason: format!("{entity} does not belong to this hotel"),
        }),
    }
}
