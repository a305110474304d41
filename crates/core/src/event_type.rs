//! Provenance event type enumeration
//!
//! Every provenance event describes exactly one kind of lineage occurrence.
//! The kind decides which type-specific fields travel with the record:
//!
//! | Event Type | Type-specific fields |
//! |------------|----------------------|
//! | FORK / JOIN / CLONE / REPLAY | parent UUIDs, child UUIDs |
//! | RECEIVE | transit URI, source-system flow file identifier |
//! | SEND | transit URI |
//! | ADDINFO | alternate identifier URI |
//! | ROUTE | relationship |
//! | everything else | none |

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The kinds of lineage events a journal can hold
///
/// The wire name of each variant is its upper-case identifier
/// (see [`EventType::name`]); records store the name, not a numeric tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// A flow file was created from data generated inside the flow
    Create,
    /// Data was received from an external system
    Receive,
    /// Data was sent to an external system
    Send,
    /// A flow file was removed from the flow by a component
    Drop,
    /// A flow file aged out of the flow
    Expire,
    /// One flow file was split into several children
    Fork,
    /// Several parents were merged into one child
    Join,
    /// A flow file was duplicated
    Clone,
    /// Content of a flow file changed
    ContentModified,
    /// Attributes of a flow file changed
    AttributesModified,
    /// A flow file was routed to a relationship
    Route,
    /// An alternate identifier was attached to a flow file
    #[serde(rename = "ADDINFO")]
    AddInfo,
    /// A flow file was replayed from an earlier event
    Replay,
    /// Event kind could not be determined
    Unknown,
}

impl EventType {
    /// All event types (for iteration)
    pub const ALL: [EventType; 14] = [
        EventType::Create,
        EventType::Receive,
        EventType::Send,
        EventType::Drop,
        EventType::Expire,
        EventType::Fork,
        EventType::Join,
        EventType::Clone,
        EventType::ContentModified,
        EventType::AttributesModified,
        EventType::Route,
        EventType::AddInfo,
        EventType::Replay,
        EventType::Unknown,
    ];

    /// Get all event types as a slice
    pub fn all() -> &'static [EventType] {
        &Self::ALL
    }

    /// Wire name, as stored in every record
    pub const fn name(&self) -> &'static str {
        match self {
            EventType::Create => "CREATE",
            EventType::Receive => "RECEIVE",
            EventType::Send => "SEND",
            EventType::Drop => "DROP",
            EventType::Expire => "EXPIRE",
            EventType::Fork => "FORK",
            EventType::Join => "JOIN",
            EventType::Clone => "CLONE",
            EventType::ContentModified => "CONTENT_MODIFIED",
            EventType::AttributesModified => "ATTRIBUTES_MODIFIED",
            EventType::Route => "ROUTE",
            EventType::AddInfo => "ADDINFO",
            EventType::Replay => "REPLAY",
            EventType::Unknown => "UNKNOWN",
        }
    }

    /// Parse from wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Whether records of this type carry parent and child UUID lists
    pub const fn carries_lineage_lists(&self) -> bool {
        matches!(
            self,
            EventType::Fork | EventType::Join | EventType::Clone | EventType::Replay
        )
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when parsing a name that is not an event type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_all() {
        let all = EventType::all();
        assert_eq!(all.len(), 14);
        assert!(all.contains(&EventType::Create));
        assert!(all.contains(&EventType::AddInfo));
        assert!(all.contains(&EventType::Unknown));
    }

    #[test]
    fn test_name_roundtrip() {
        for t in EventType::all() {
            assert_eq!(EventType::from_name(t.name()), Some(*t));
            assert_eq!(t.name().parse::<EventType>().unwrap(), *t);
        }
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(EventType::AddInfo.name(), "ADDINFO");
        assert_eq!(EventType::ContentModified.name(), "CONTENT_MODIFIED");
        assert_eq!(EventType::AttributesModified.to_string(), "ATTRIBUTES_MODIFIED");
    }

    #[test]
    fn test_unknown_name_rejected() {
        assert_eq!(EventType::from_name("create"), None);
        let err = "TELEPORT".parse::<EventType>().unwrap_err();
        assert_eq!(err, UnknownEventType("TELEPORT".to_string()));
        assert!(err.to_string().contains("TELEPORT"));
    }

    #[test]
    fn test_lineage_list_types() {
        let with_lists: Vec<_> = EventType::all()
            .iter()
            .filter(|t| t.carries_lineage_lists())
            .copied()
            .collect();
        assert_eq!(
            with_lists,
            vec![
                EventType::Fork,
                EventType::Join,
                EventType::Clone,
                EventType::Replay
            ]
        );
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&EventType::AddInfo).unwrap();
        assert_eq!(json, "\"ADDINFO\"");
        let json = serde_json::to_string(&EventType::ContentModified).unwrap();
        assert_eq!(json, "\"CONTENT_MODIFIED\"");
        let parsed: EventType = serde_json::from_str("\"ROUTE\"").unwrap();
        assert_eq!(parsed, EventType::Route);
    }
}
