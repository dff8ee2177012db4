use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of a facility participating in the custody chain.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FacilityId(String);

impl FacilityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FacilityId({})", self.0)
    }
}

impl fmt::Display for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FacilityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Kind of facility, as registered with the identity provider.
///
/// Controls which custody transitions a facility may perform; only
/// dispensing-capable facilities can record DISPENSED events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityType {
    Manufacturer,
    Wholesaler,
    Pharmacy,
    Clinic,
}

impl FacilityType {
    /// Whether this facility type may dispense product to an end user.
    pub fn can_dispense(&self) -> bool {
        matches!(self, Self::Pharmacy | Self::Clinic)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manufacturer => "manufacturer",
            Self::Wholesaler => "wholesaler",
            Self::Pharmacy => "pharmacy",
            Self::Clinic => "clinic",
        }
    }
}

impl FromStr for FacilityType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manufacturer" => Ok(Self::Manufacturer),
            "wholesaler" => Ok(Self::Wholesaler),
            "pharmacy" => Ok(Self::Pharmacy),
            "clinic" => Ok(Self::Clinic),
            other => Err(TypeError::InvalidFacilityType(other.to_string())),
        }
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role of a caller, as asserted by the external identity provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular facility staff; custody rights follow facility ownership.
    Operator,
    /// Regulator/auditor; may act on any batch regardless of ownership.
    Auditor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Auditor => "auditor",
        }
    }
}

impl FromStr for Role {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operator" => Ok(Self::Operator),
            "auditor" => Ok(Self::Auditor),
            other => Err(TypeError::InvalidRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller identity for a custody action.
///
/// CCL does not authenticate anyone; the external identity provider supplies
/// this triple and CCL only enforces custody rules against it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub facility: FacilityId,
    pub facility_type: FacilityType,
    pub role: Role,
}

impl Actor {
    pub fn new(
        user_id: impl Into<String>,
        facility: FacilityId,
        facility_type: FacilityType,
        role: Role,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            facility,
            facility_type,
            role,
        }
    }

    pub fn is_auditor(&self) -> bool {
        self.role == Role::Auditor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispensing_capability() {
        assert!(FacilityType::Pharmacy.can_dispense());
        assert!(FacilityType::Clinic.can_dispense());
        assert!(!FacilityType::Manufacturer.can_dispense());
        assert!(!FacilityType::Wholesaler.can_dispense());
    }

    #[test]
    fn facility_type_parse_roundtrip() {
        for t in [
            FacilityType::Manufacturer,
            FacilityType::Wholesaler,
            FacilityType::Pharmacy,
            FacilityType::Clinic,
        ] {
            assert_eq!(t.as_str().parse::<FacilityType>().unwrap(), t);
        }
        assert!("warehouse".parse::<FacilityType>().is_err());
    }

    #[test]
    fn role_parse_roundtrip() {
        assert_eq!("operator".parse::<Role>().unwrap(), Role::Operator);
        assert_eq!("auditor".parse::<Role>().unwrap(), Role::Auditor);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn auditor_flag() {
        let actor = Actor::new(
            "u1",
            FacilityId::new("fac-1"),
            FacilityType::Pharmacy,
            Role::Auditor,
        );
        assert!(actor.is_auditor());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::Auditor).unwrap();
        assert_eq!(json, "\"auditor\"");
        let json = serde_json::to_string(&FacilityType::Wholesaler).unwrap();
        assert_eq!(json, "\"wholesaler\"");
    }
}
