use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use ccl_consensus::{Cursor, PageOrder, PageRequest};
use ccl_ledger::{BatchRef, EventRequest, RecorderError};
use ccl_timeline::{merge_local, reconcile_complete, reconcile_page, MergedEntry, TimelineNote};
use ccl_types::{
    BatchId, CustodyEventKind, ExpiryDate, FacilityId, IdempotencyKey, ProductIdentity,
    PAYLOAD_VERSION,
};

use crate::error::{ServerError, ServerResult};
use crate::server::AppState;

/// Body of `POST /v1/events`. The batch may be referenced by id, by a raw
/// optical code, or by the identity triple.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSubmission {
    pub kind: CustodyEventKind,
    pub batch_id: Option<uuid::Uuid>,
    pub code: Option<String>,
    pub gtin: Option<String>,
    pub lot: Option<String>,
    pub exp: Option<String>,
    pub to: Option<String>,
    pub quantity: Option<u32>,
    pub meta: Option<BTreeMap<String, String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: String,
    pub external_tx_ref: String,
    pub sequence_number: Option<u64>,
    pub running_hash: Option<String>,
    pub payload_hash: String,
    pub delivered: bool,
    pub idempotent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TimelineQuery {
    pub code: Option<String>,
    pub gtin: Option<String>,
    pub lot: Option<String>,
    pub exp: Option<String>,
    /// `page` (default) or `complete`.
    pub mode: Option<String>,
    pub cursor: Option<u64>,
    pub limit: Option<u32>,
    /// `asc` (default) or `desc`.
    pub order: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntryView {
    pub sequence_number: Option<u64>,
    pub consensus_timestamp: Option<DateTime<Utc>>,
    pub kind: CustodyEventKind,
    pub facility_id: Option<String>,
    pub to_facility: Option<String>,
    pub payload_hash: String,
    pub prev_hash: Option<String>,
    pub delivered: bool,
    /// Where the entry was seen: `log`, `local`, or `both`.
    pub source: &'static str,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineResponse {
    pub entries: Vec<TimelineEntryView>,
    pub scanned: usize,
    pub truncated: bool,
    pub next_cursor: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

fn parse_expiry(raw: &str) -> ServerResult<ExpiryDate> {
    let parsed = if raw.len() == 6 && raw.bytes().all(|b| b.is_ascii_digit()) {
        ExpiryDate::parse_compact(raw)
    } else {
        ExpiryDate::parse_iso(raw)
    };
    parsed.map_err(|e| ServerError::BadRequest(format!("invalid expiry: {e}")))
}

fn identity_from_parts(gtin: &str, lot: &str, exp: &str) -> ServerResult<ProductIdentity> {
    let gtin14 = ccl_codec::normalize_gtin(gtin).map_err(RecorderError::Identifier)?;
    let expiry = parse_expiry(exp)?;
    Ok(ProductIdentity::new(gtin14, lot, expiry))
}

fn identity_from_code(code: &str) -> ServerResult<ProductIdentity> {
    let encoded = ccl_codec::decode(code).map_err(RecorderError::Identifier)?;
    Ok(encoded.identity())
}

fn batch_ref(body: &EventSubmission) -> ServerResult<BatchRef> {
    if let Some(id) = body.batch_id {
        return Ok(BatchRef::Id(BatchId::from_uuid(id)));
    }
    if let Some(code) = &body.code {
        return Ok(BatchRef::Identity(identity_from_code(code)?));
    }
    match (&body.gtin, &body.lot, &body.exp) {
        (Some(gtin), Some(lot), Some(exp)) => {
            Ok(BatchRef::Identity(identity_from_parts(gtin, lot, exp)?))
        }
        _ => Err(ServerError::BadRequest(
            "a batch reference is required: batchId, code, or gtin+lot+exp".into(),
        )),
    }
}

fn idempotency_key(headers: &HeaderMap) -> ServerResult<Option<IdempotencyKey>> {
    match headers.get("idempotency-key") {
        None => Ok(None),
        Some(value) => {
            let key = value.to_str().map_err(|_| {
                ServerError::BadRequest("idempotency-key header is not valid text".into())
            })?;
            Ok(Some(IdempotencyKey::new(key)))
        }
    }
}

pub async fn submit_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<EventSubmission>,
) -> ServerResult<Json<EventResponse>> {
    let actor = state.actors.resolve(&headers).await?;
    let request = EventRequest {
        kind: body.kind,
        batch: batch_ref(&body)?,
        to: body.to.as_deref().map(FacilityId::new),
        quantity: body.quantity,
        meta: body.meta.clone(),
        idempotency_key: idempotency_key(&headers)?,
    };
    let outcome = state.recorder.record(request, &actor).await?;
    Ok(Json(EventResponse {
        id: outcome.event_id.to_string(),
        external_tx_ref: outcome.external_tx_ref,
        sequence_number: outcome.sequence_number,
        running_hash: outcome.running_hash,
        payload_hash: outcome.payload_hash,
        delivered: outcome.delivered,
        idempotent: outcome.idempotent,
        warning: outcome.warning,
    }))
}

fn query_identity(query: &TimelineQuery) -> ServerResult<ProductIdentity> {
    if let Some(code) = &query.code {
        return identity_from_code(code);
    }
    match (&query.gtin, &query.lot, &query.exp) {
        (Some(gtin), Some(lot), Some(exp)) => identity_from_parts(gtin, lot, exp),
        _ => Err(ServerError::BadRequest(
            "an identity is required: code, or gtin+lot+exp".into(),
        )),
    }
}

fn page_order(query: &TimelineQuery) -> ServerResult<PageOrder> {
    match query.order.as_deref() {
        None | Some("asc") => Ok(PageOrder::Ascending),
        Some("desc") => Ok(PageOrder::Descending),
        Some(other) => Err(ServerError::BadRequest(format!(
            "unknown order {other:?}; expected asc or desc"
        ))),
    }
}

fn note_label(note: TimelineNote) -> &'static str {
    match note {
        TimelineNote::TryOlderPages => "try_older_pages",
        TimelineNote::NothingPublished => "nothing_published",
    }
}

fn entry_views(merged: &[MergedEntry]) -> Vec<TimelineEntryView> {
    merged
        .iter()
        .map(|item| match item {
            MergedEntry::Confirmed { entry, .. } | MergedEntry::LogOnly(entry) => {
                TimelineEntryView {
                    sequence_number: Some(entry.sequence_number),
                    consensus_timestamp: Some(entry.consensus_timestamp),
                    kind: entry.payload.kind,
                    facility_id: Some(entry.payload.actor.facility_id.clone()),
                    to_facility: entry.payload.to.as_ref().map(|t| t.facility_id.clone()),
                    payload_hash: entry.payload_digest.clone(),
                    prev_hash: entry.payload.prev.clone(),
                    delivered: true,
                    source: if matches!(item, MergedEntry::LogOnly(_)) {
                        "log"
                    } else {
                        "both"
                    },
                }
            }
            MergedEntry::LocalOnly(event) => TimelineEntryView {
                sequence_number: event.external_sequence,
                consensus_timestamp: None,
                kind: event.kind,
                facility_id: event.from_facility.as_ref().map(|f| f.to_string()),
                to_facility: event.to_facility.as_ref().map(|f| f.to_string()),
                payload_hash: event.payload_hash.clone(),
                prev_hash: event.prev_hash.clone(),
                delivered: event.delivered(),
                source: "local",
            },
        })
        .collect()
}

pub async fn timeline(
    State(state): State<AppState>,
    Query(query): Query<TimelineQuery>,
) -> ServerResult<Json<TimelineResponse>> {
    let identity = query_identity(&query)?;

    let reconciled = match query.mode.as_deref().unwrap_or("page") {
        "complete" => {
            let fetch = state
                .reader
                .fetch_complete(&state.log, state.page_limit, state.max_walk_pages)
                .await
                .map_err(ServerError::from_read)?;
            reconcile_complete(&fetch, &identity)
        }
        "page" => {
            let request = PageRequest {
                cursor: query.cursor.map(Cursor::new),
                limit: query.limit.unwrap_or(state.page_limit),
                order: page_order(&query)?,
            };
            let page = state
                .reader
                .fetch_page(&state.log, &request)
                .await
                .map_err(ServerError::from_read)?;
            reconcile_page(&page, &identity)
        }
        other => {
            return Err(ServerError::BadRequest(format!(
                "unknown mode {other:?}; expected page or complete"
            )))
        }
    };

    let local = match state
        .store
        .batch_by_identity(&identity)
        .await
        .map_err(RecorderError::from)?
    {
        Some(batch) => state
            .store
            .events_for_batch(&batch.id)
            .await
            .map_err(RecorderError::from)?,
        None => Vec::new(),
    };
    let merged = merge_local(&reconciled, &local);

    Ok(Json(TimelineResponse {
        entries: entry_views(&merged.entries),
        scanned: reconciled.scanned,
        truncated: reconciled.truncated,
        next_cursor: reconciled.next_cursor.map(|c| c.sequence()),
        note: reconciled.note.map(note_label),
    }))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn info() -> Json<serde_json::Value> {
    Json(json!({
        "name": "ccl-server",
        "version": env!("CARGO_PKG_VERSION"),
        "payload_version": PAYLOAD_VERSION,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_accepts_compact_and_iso() {
        assert_eq!(
            parse_expiry("270131").unwrap(),
            ExpiryDate::parse_iso("2027-01-31").unwrap()
        );
        assert_eq!(
            parse_expiry("2027-01-31").unwrap(),
            ExpiryDate::parse_compact("270131").unwrap()
        );
        assert!(parse_expiry("27-01").is_err());
    }

    #[test]
    fn batch_ref_precedence_and_validation() {
        let body = EventSubmission {
            kind: CustodyEventKind::Manufactured,
            batch_id: None,
            code: None,
            gtin: Some("950600013435".into()),
            lot: Some("LOT1".into()),
            exp: Some("270101".into()),
            to: None,
            quantity: Some(10),
            meta: None,
        };
        match batch_ref(&body).unwrap() {
            BatchRef::Identity(identity) => assert_eq!(identity.gtin14, "09506000134352"),
            other => panic!("expected identity ref, got {other:?}"),
        }

        let empty = EventSubmission {
            gtin: None,
            lot: None,
            exp: None,
            ..body
        };
        assert!(matches!(
            batch_ref(&empty),
            Err(ServerError::BadRequest(_))
        ));
    }

    #[test]
    fn order_parsing() {
        let mut query = TimelineQuery {
            code: None,
            gtin: None,
            lot: None,
            exp: None,
            mode: None,
            cursor: None,
            limit: None,
            order: None,
        };
        assert_eq!(page_order(&query).unwrap(), PageOrder::Ascending);
        query.order = Some("desc".into());
        assert_eq!(page_order(&query).unwrap(), PageOrder::Descending);
        query.order = Some("upside-down".into());
        assert!(page_order(&query).is_err());
    }
}
