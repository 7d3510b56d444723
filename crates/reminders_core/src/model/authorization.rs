//! Authorization status model and capability normalization.
//!
//! # Responsibility
//! - Define the single ordered status enum exposed to callers.
//! - Map raw backing-service capability levels from either capability
//!   generation (binary or tiered) into that enum.
//! - Answer "is this operation class allowed" without platform conditionals
//!   at call sites.
//!
//! # Invariants
//! - `Authorized` and `FullAccess` permit every operation class.
//! - `WriteOnly` permits writes and never permits reads.
//! - A tiered-only raw value reported under the binary model normalizes to
//!   `Unknown`.

use serde::{Deserialize, Serialize};

/// Normalized authorization status.
///
/// Variant order is the public ordering of the enum and matches the stable
/// wire strings returned by `as_str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    WriteOnly,
    Authorized,
    FullAccess,
    Unknown,
}

/// Operation class used by sufficiency checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationClass {
    /// Enumeration and fetch operations.
    Read,
    /// Create, update and delete operations.
    Write,
}

/// Capability generation reported by a backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityModel {
    /// Legacy authorized/denied/restricted/not-determined scheme.
    Binary,
    /// Scheme with distinct full-access and write-only grants.
    Tiered,
}

/// Raw authorization level as reported by a backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawAuthorization {
    NotDetermined,
    Restricted,
    Denied,
    Authorized,
    FullAccess,
    WriteOnly,
    /// Value the adapter could not map to a known level.
    Unrecognized(i64),
}

impl AuthorizationStatus {
    /// Normalizes a raw store value under the given capability model.
    pub fn normalize(raw: RawAuthorization, model: CapabilityModel) -> Self {
        match (model, raw) {
            (_, RawAuthorization::NotDetermined) => Self::NotDetermined,
            (_, RawAuthorization::Restricted) => Self::Restricted,
            (_, RawAuthorization::Denied) => Self::Denied,
            (_, RawAuthorization::Unrecognized(_)) => Self::Unknown,
            (CapabilityModel::Binary, RawAuthorization::Authorized) => Self::Authorized,
            (CapabilityModel::Binary, RawAuthorization::FullAccess)
            | (CapabilityModel::Binary, RawAuthorization::WriteOnly) => Self::Unknown,
            // Tiered stores still report the legacy value for full grants.
            (CapabilityModel::Tiered, RawAuthorization::Authorized)
            | (CapabilityModel::Tiered, RawAuthorization::FullAccess) => Self::FullAccess,
            (CapabilityModel::Tiered, RawAuthorization::WriteOnly) => Self::WriteOnly,
        }
    }

    /// Returns whether this status permits the given operation class.
    pub fn permits(self, class: OperationClass) -> bool {
        match self {
            Self::Authorized | Self::FullAccess => true,
            Self::WriteOnly => class == OperationClass::Write,
            Self::NotDetermined | Self::Restricted | Self::Denied | Self::Unknown => false,
        }
    }

    /// Returns whether this status permits every operation class.
    pub fn is_sufficient(self) -> bool {
        self.permits(OperationClass::Read) && self.permits(OperationClass::Write)
    }

    /// Stable wire string for transport responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotDetermined => "notDetermined",
            Self::Restricted => "restricted",
            Self::Denied => "denied",
            Self::WriteOnly => "writeOnly",
            Self::Authorized => "authorized",
            Self::FullAccess => "fullAccess",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CapabilityModel {
    /// Raw value a store of this model records after a successful prompt.
    pub fn granted_level(self) -> RawAuthorization {
        match self {
            Self::Binary => RawAuthorization::Authorized,
            Self::Tiered => RawAuthorization::FullAccess,
        }
    }

    /// Parses `binary|tiered` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "binary" => Some(Self::Binary),
            "tiered" => Some(Self::Tiered),
            _ => None,
        }
    }
}

impl RawAuthorization {
    /// Stable storage label.
    pub fn as_db_str(self) -> String {
        match self {
            Self::NotDetermined => "not_determined".to_string(),
            Self::Restricted => "restricted".to_string(),
            Self::Denied => "denied".to_string(),
            Self::Authorized => "authorized".to_string(),
            Self::FullAccess => "full_access".to_string(),
            Self::WriteOnly => "write_only".to_string(),
            Self::Unrecognized(code) => code.to_string(),
        }
    }

    /// Parses a storage label written by `as_db_str`.
    ///
    /// Numeric labels round-trip as `Unrecognized`; anything else is `None`.
    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "not_determined" => Some(Self::NotDetermined),
            "restricted" => Some(Self::Restricted),
            "denied" => Some(Self::Denied),
            "authorized" => Some(Self::Authorized),
            "full_access" => Some(Self::FullAccess),
            "write_only" => Some(Self::WriteOnly),
            other => other.parse::<i64>().ok().map(Self::Unrecognized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthorizationStatus, CapabilityModel, OperationClass, RawAuthorization};

    #[test]
    fn binary_model_maps_tiered_values_to_unknown() {
        for raw in [RawAuthorization::FullAccess, RawAuthorization::WriteOnly] {
            assert_eq!(
                AuthorizationStatus::normalize(raw, CapabilityModel::Binary),
                AuthorizationStatus::Unknown
            );
        }
        assert_eq!(
            AuthorizationStatus::normalize(RawAuthorization::Authorized, CapabilityModel::Binary),
            AuthorizationStatus::Authorized
        );
    }

    #[test]
    fn tiered_model_reports_legacy_grant_as_full_access() {
        assert_eq!(
            AuthorizationStatus::normalize(RawAuthorization::Authorized, CapabilityModel::Tiered),
            AuthorizationStatus::FullAccess
        );
        assert_eq!(
            AuthorizationStatus::normalize(RawAuthorization::WriteOnly, CapabilityModel::Tiered),
            AuthorizationStatus::WriteOnly
        );
    }

    #[test]
    fn unrecognized_values_are_unknown_in_both_models() {
        for model in [CapabilityModel::Binary, CapabilityModel::Tiered] {
            assert_eq!(
                AuthorizationStatus::normalize(RawAuthorization::Unrecognized(42), model),
                AuthorizationStatus::Unknown
            );
        }
    }

    #[test]
    fn write_only_permits_writes_but_not_reads() {
        let status = AuthorizationStatus::WriteOnly;
        assert!(status.permits(OperationClass::Write));
        assert!(!status.permits(OperationClass::Read));
        assert!(!status.is_sufficient());
    }

    #[test]
    fn sufficiency_holds_only_for_full_grants() {
        let sufficient = [
            AuthorizationStatus::Authorized,
            AuthorizationStatus::FullAccess,
        ];
        for status in [
            AuthorizationStatus::NotDetermined,
            AuthorizationStatus::Restricted,
            AuthorizationStatus::Denied,
            AuthorizationStatus::WriteOnly,
            AuthorizationStatus::Authorized,
            AuthorizationStatus::FullAccess,
            AuthorizationStatus::Unknown,
        ] {
            assert_eq!(status.is_sufficient(), sufficient.contains(&status), "{status}");
        }
    }

    #[test]
    fn wire_strings_match_serde_names() {
        let json = serde_json::to_string(&AuthorizationStatus::NotDetermined).unwrap();
        assert_eq!(json, "\"notDetermined\"");
        assert_eq!(AuthorizationStatus::FullAccess.as_str(), "fullAccess");
        assert_eq!(AuthorizationStatus::WriteOnly.as_str(), "writeOnly");
    }

    #[test]
    fn raw_storage_labels_round_trip() {
        for raw in [
            RawAuthorization::NotDetermined,
            RawAuthorization::FullAccess,
            RawAuthorization::Unrecognized(-3),
        ] {
            assert_eq!(RawAuthorization::from_db_str(&raw.as_db_str()), Some(raw));
        }
        assert_eq!(RawAuthorization::from_db_str("granted"), None);
    }
}
