use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, FacilityId, Role};
use crate::error::TypeError;
use crate::event::CustodyEventKind;
use crate::identity::ProductIdentity;

/// Current version of the consensus wire shape.
pub const PAYLOAD_VERSION: u32 = 1;

/// Batch identity as embedded in the wire payload (`exp` is compact YYMMDD).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadBatch {
    pub gtin: String,
    pub lot: String,
    pub exp: String,
}

impl From<&ProductIdentity> for PayloadBatch {
    fn from(identity: &ProductIdentity) -> Self {
        Self {
            gtin: identity.gtin14.clone(),
            lot: identity.lot.clone(),
            exp: identity.expiry.compact(),
        }
    }
}

/// Acting facility as embedded in the wire payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadActor {
    #[serde(rename = "facilityId")]
    pub facility_id: String,
    pub role: Role,
}

/// Destination facility for HANDOVER payloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadTo {
    #[serde(rename = "facilityId")]
    pub facility_id: String,
}

/// The versioned message shape published to the consensus log.
///
/// Struct declaration order is the canonical serialization order: the bytes
/// produced by [`ConsensusPayload::canonical_bytes`] are exactly what gets
/// hashed and what gets transmitted, so a local digest always matches what
/// an independent verifier recomputes from the log alone.
///
/// Decoding tolerates unknown fields and any version `>= 1`, keeping future
/// payload versions backward-decodable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusPayload {
    pub v: u32,
    #[serde(rename = "type")]
    pub kind: CustodyEventKind,
    pub batch: PayloadBatch,
    pub actor: PayloadActor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<PayloadTo>,
    pub ts: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<BTreeMap<String, String>>,
}

impl ConsensusPayload {
    /// Build a v1 payload for a custody event.
    pub fn for_event(
        kind: CustodyEventKind,
        identity: &ProductIdentity,
        actor: &Actor,
        to: Option<&FacilityId>,
        ts: DateTime<Utc>,
        prev: Option<String>,
        meta: Option<BTreeMap<String, String>>,
    ) -> Self {
        Self {
            v: PAYLOAD_VERSION,
            kind,
            batch: PayloadBatch::from(identity),
            actor: PayloadActor {
                facility_id: actor.facility.as_str().to_string(),
                role: actor.role,
            },
            to: to.map(|f| PayloadTo {
                facility_id: f.as_str().to_string(),
            }),
            ts,
            prev,
            meta,
        }
    }

    /// The exact UTF-8 bytes that are hashed and submitted to the log.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, TypeError> {
        serde_json::to_vec(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Decode a payload from raw log message bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        let payload: Self =
            serde_json::from_slice(bytes).map_err(|e| TypeError::Serialization(e.to_string()))?;
        if payload.v < 1 {
            return Err(TypeError::UnsupportedPayloadVersion(payload.v));
        }
        Ok(payload)
    }

    /// Whether this payload's embedded batch triple matches the identity.
    pub fn matches_identity(&self, identity: &ProductIdentity) -> bool {
        self.batch.gtin == identity.gtin14
            && self.batch.lot == identity.lot
            && self.batch.exp == identity.expiry.compact()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::FacilityType;
    use crate::identity::ExpiryDate;
    use chrono::TimeZone;

    fn identity() -> ProductIdentity {
        ProductIdentity::new(
            "09506000134352",
            "LOT7",
            ExpiryDate::parse_compact("261130").unwrap(),
        )
    }

    fn actor() -> Actor {
        Actor::new(
            "u1",
            FacilityId::new("fac-mfg"),
            FacilityType::Manufacturer,
            Role::Operator,
        )
    }

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 8, 30, 0).unwrap()
    }

    #[test]
    fn canonical_field_order_is_pinned() {
        let payload = ConsensusPayload::for_event(
            CustodyEventKind::Manufactured,
            &identity(),
            &actor(),
            None,
            ts(),
            None,
            None,
        );
        let bytes = payload.canonical_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "{\"v\":1,\"type\":\"MANUFACTURED\",\
             \"batch\":{\"gtin\":\"09506000134352\",\"lot\":\"LOT7\",\"exp\":\"261130\"},\
             \"actor\":{\"facilityId\":\"fac-mfg\",\"role\":\"operator\"},\
             \"ts\":\"2026-01-15T08:30:00Z\"}"
        );
    }

    #[test]
    fn absent_optionals_are_omitted() {
        let payload = ConsensusPayload::for_event(
            CustodyEventKind::Manufactured,
            &identity(),
            &actor(),
            None,
            ts(),
            None,
            None,
        );
        let text = String::from_utf8(payload.canonical_bytes().unwrap()).unwrap();
        assert!(!text.contains("\"to\""));
        assert!(!text.contains("\"prev\""));
        assert!(!text.contains("\"meta\""));
    }

    #[test]
    fn handover_carries_destination_and_prev() {
        let payload = ConsensusPayload::for_event(
            CustodyEventKind::Handover,
            &identity(),
            &actor(),
            Some(&FacilityId::new("fac-dist")),
            ts(),
            Some("abcd".into()),
            None,
        );
        let text = String::from_utf8(payload.canonical_bytes().unwrap()).unwrap();
        assert!(text.contains("\"to\":{\"facilityId\":\"fac-dist\"}"));
        assert!(text.contains("\"prev\":\"abcd\""));
    }

    #[test]
    fn bytes_roundtrip() {
        let payload = ConsensusPayload::for_event(
            CustodyEventKind::Handover,
            &identity(),
            &actor(),
            Some(&FacilityId::new("fac-dist")),
            ts(),
            Some("abcd".into()),
            None,
        );
        let bytes = payload.canonical_bytes().unwrap();
        let decoded = ConsensusPayload::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let raw = br#"{"v":2,"type":"RECALLED",
            "batch":{"gtin":"09506000134352","lot":"LOT7","exp":"261130"},
            "actor":{"facilityId":"fac-reg","role":"auditor"},
            "ts":"2026-01-15T08:30:00Z","reason":"contamination"}"#;
        let decoded = ConsensusPayload::from_bytes(raw).unwrap();
        assert_eq!(decoded.v, 2);
        assert_eq!(decoded.kind, CustodyEventKind::Recalled);
    }

    #[test]
    fn version_zero_rejected() {
        let raw = br#"{"v":0,"type":"MANUFACTURED",
            "batch":{"gtin":"1","lot":"L","exp":"261130"},
            "actor":{"facilityId":"f","role":"operator"},
            "ts":"2026-01-15T08:30:00Z"}"#;
        let err = ConsensusPayload::from_bytes(raw).unwrap_err();
        assert_eq!(err, TypeError::UnsupportedPayloadVersion(0));
    }

    #[test]
    fn garbage_bytes_are_a_serialization_error() {
        let err = ConsensusPayload::from_bytes(b"not json").unwrap_err();
        assert!(matches!(err, TypeError::Serialization(_)));
    }

    #[test]
    fn identity_matching() {
        let payload = ConsensusPayload::for_event(
            CustodyEventKind::Manufactured,
            &identity(),
            &actor(),
            None,
            ts(),
            None,
            None,
        );
        assert!(payload.matches_identity(&identity()));

        let other = ProductIdentity::new(
            "09506000134352",
            "LOT8",
            ExpiryDate::parse_compact("261130").unwrap(),
        );
        assert!(!payload.matches_identity(&other));
    }
}
