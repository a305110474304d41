//! Provenance event record
//!
//! A `ProvenanceEvent` describes one lineage-relevant occurrence to a flow
//! file. Records are built once through [`EventBuilder`](crate::EventBuilder)
//! and are immutable afterwards; the only reader-assigned state is the
//! [`StorageLocation`].

use crate::event_type::EventType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Full attribute snapshot (key → value)
pub type Attributes = BTreeMap<String, String>;

/// Attribute delta (key → new value, `None` means the attribute was removed)
pub type AttributeUpdates = BTreeMap<String, Option<String>>;

/// Reference to where a flow file's content bytes physically reside
///
/// Container, section and identifier locate the claim; `offset` is the
/// position of the content inside the claim and `size` its length.
/// Records decoded from old journals carry only a size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentClaim {
    /// Content repository container name
    pub container: Option<String>,
    /// Section within the container
    pub section: Option<String>,
    /// Claim identifier within the section
    pub identifier: Option<String>,
    /// Byte offset of the content within the claim
    pub offset: Option<u64>,
    /// Content size in bytes
    pub size: u64,
}

impl ContentClaim {
    /// Create a fully located claim
    pub fn new(
        container: impl Into<String>,
        section: impl Into<String>,
        identifier: impl Into<String>,
        offset: u64,
        size: u64,
    ) -> Self {
        ContentClaim {
            container: Some(container.into()),
            section: Some(section.into()),
            identifier: Some(identifier.into()),
            offset: Some(offset),
            size,
        }
    }

    /// Create a claim that only knows the content size
    pub fn size_only(size: u64) -> Self {
        ContentClaim {
            size,
            ..Default::default()
        }
    }

    /// Whether container, section and identifier are all known
    ///
    /// Only resolved claims are written to a journal.
    pub fn is_resolved(&self) -> bool {
        self.container.is_some() && self.section.is_some() && self.identifier.is_some()
    }
}

/// Where a decoded record physically began in its journal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageLocation {
    /// Name of the journal the record was read from
    pub filename: String,
    /// Byte offset of the first byte of the record
    pub offset: u64,
}

impl StorageLocation {
    /// Create a storage location
    pub fn new(filename: impl Into<String>, offset: u64) -> Self {
        StorageLocation {
            filename: filename.into(),
            offset,
        }
    }
}

/// An immutable provenance event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceEvent {
    pub(crate) event_id: u64,
    pub(crate) event_type: EventType,
    pub(crate) event_time: i64,
    pub(crate) flow_file_entry_date: i64,
    pub(crate) event_duration: i64,
    pub(crate) lineage_start_date: i64,
    pub(crate) flow_file_uuid: Uuid,
    pub(crate) lineage_identifiers: BTreeSet<Uuid>,
    pub(crate) component_id: Option<String>,
    pub(crate) component_type: Option<String>,
    pub(crate) details: Option<String>,
    pub(crate) source_queue_identifier: Option<String>,
    pub(crate) transit_uri: Option<String>,
    pub(crate) alternate_identifier_uri: Option<String>,
    pub(crate) relationship: Option<String>,
    pub(crate) source_system_flow_file_identifier: Option<String>,
    pub(crate) previous_attributes: Attributes,
    pub(crate) updated_attributes: AttributeUpdates,
    pub(crate) current_claim: ContentClaim,
    pub(crate) previous_claim: Option<ContentClaim>,
    pub(crate) parent_uuids: Vec<Uuid>,
    pub(crate) child_uuids: Vec<Uuid>,
    pub(crate) storage_location: Option<StorageLocation>,
}

impl ProvenanceEvent {
    /// Repository-assigned event identifier
    pub fn event_id(&self) -> u64 {
        self.event_id
    }

    /// Kind of event
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// When the event happened (milliseconds since epoch)
    pub fn event_time(&self) -> i64 {
        self.event_time
    }

    /// When the flow file entered the flow (milliseconds since epoch)
    pub fn flow_file_entry_date(&self) -> i64 {
        self.flow_file_entry_date
    }

    /// How long the event took in milliseconds, -1 if unknown
    pub fn event_duration(&self) -> i64 {
        self.event_duration
    }

    /// Start of the flow file's lineage (milliseconds since epoch), -1 if unknown
    pub fn lineage_start_date(&self) -> i64 {
        self.lineage_start_date
    }

    /// Flow file UUID
    pub fn flow_file_uuid(&self) -> Uuid {
        self.flow_file_uuid
    }

    /// Identifiers of the lineage chains this flow file belongs to
    pub fn lineage_identifiers(&self) -> &BTreeSet<Uuid> {
        &self.lineage_identifiers
    }

    /// Component that emitted the event
    pub fn component_id(&self) -> Option<&str> {
        self.component_id.as_deref()
    }

    /// Type of the component that emitted the event
    pub fn component_type(&self) -> Option<&str> {
        self.component_type.as_deref()
    }

    /// Free-form details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Queue the flow file was pulled from
    pub fn source_queue_identifier(&self) -> Option<&str> {
        self.source_queue_identifier.as_deref()
    }

    /// URI of the external system (RECEIVE / SEND)
    pub fn transit_uri(&self) -> Option<&str> {
        self.transit_uri.as_deref()
    }

    /// Alternate identifier (ADDINFO)
    pub fn alternate_identifier_uri(&self) -> Option<&str> {
        self.alternate_identifier_uri.as_deref()
    }

    /// Relationship the flow file was routed to (ROUTE)
    pub fn relationship(&self) -> Option<&str> {
        self.relationship.as_deref()
    }

    /// Identifier the source system used for the data (RECEIVE)
    pub fn source_system_flow_file_identifier(&self) -> Option<&str> {
        self.source_system_flow_file_identifier.as_deref()
    }

    /// Attributes before the event
    pub fn previous_attributes(&self) -> &Attributes {
        &self.previous_attributes
    }

    /// Attributes changed by the event
    pub fn updated_attributes(&self) -> &AttributeUpdates {
        &self.updated_attributes
    }

    /// Attributes after the event: previous attributes with updates applied
    pub fn attributes(&self) -> Attributes {
        let mut merged = self.previous_attributes.clone();
        for (key, value) in &self.updated_attributes {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        merged
    }

    /// Content claim after the event
    pub fn current_claim(&self) -> &ContentClaim {
        &self.current_claim
    }

    /// Content claim before the event, if it changed
    pub fn previous_claim(&self) -> Option<&ContentClaim> {
        self.previous_claim.as_ref()
    }

    /// Size of the current content
    pub fn file_size(&self) -> u64 {
        self.current_claim.size
    }

    /// Parent flow files (FORK / JOIN / CLONE / REPLAY)
    pub fn parent_uuids(&self) -> &[Uuid] {
        &self.parent_uuids
    }

    /// Child flow files (FORK / JOIN / CLONE / REPLAY)
    pub fn child_uuids(&self) -> &[Uuid] {
        &self.child_uuids
    }

    /// Where the record was read from; `None` for records not read from a journal
    pub fn storage_location(&self) -> Option<&StorageLocation> {
        self.storage_location.as_ref()
    }

    /// Drop the reader-assigned storage location
    ///
    /// Useful when comparing a decoded record against the one that was written.
    pub fn without_storage_location(mut self) -> Self {
        self.storage_location = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventBuilder;

    fn event_with_updates() -> ProvenanceEvent {
        let mut previous = Attributes::new();
        previous.insert("filename".to_string(), "a.txt".to_string());
        previous.insert("path".to_string(), "/in".to_string());

        let mut updates = AttributeUpdates::new();
        updates.insert("filename".to_string(), Some("b.txt".to_string()));
        updates.insert("path".to_string(), None);
        updates.insert("mime.type".to_string(), Some("text/plain".to_string()));

        EventBuilder::new()
            .event_type(EventType::AttributesModified)
            .attributes(previous, updates)
            .build()
            .unwrap()
    }

    #[test]
    fn test_attributes_applies_updates() {
        let event = event_with_updates();
        let merged = event.attributes();

        assert_eq!(merged.get("filename").map(String::as_str), Some("b.txt"));
        assert_eq!(merged.get("mime.type").map(String::as_str), Some("text/plain"));
        assert!(!merged.contains_key("path"));
    }

    #[test]
    fn test_deleted_attribute_distinct_from_absent() {
        let event = event_with_updates();
        assert_eq!(event.updated_attributes().get("path"), Some(&None));
        assert_eq!(event.updated_attributes().get("missing"), None);
    }

    #[test]
    fn test_content_claim_resolution() {
        assert!(ContentClaim::new("c", "s", "id", 0, 10).is_resolved());
        assert!(!ContentClaim::size_only(10).is_resolved());
        assert!(!ContentClaim::default().is_resolved());

        let partial = ContentClaim {
            container: Some("c".to_string()),
            section: Some("s".to_string()),
            ..Default::default()
        };
        assert!(!partial.is_resolved());
    }

    #[test]
    fn test_without_storage_location() {
        let event = EventBuilder::new()
            .event_type(EventType::Drop)
            .storage_location("journal-1.prov", 128)
            .build()
            .unwrap();
        assert_eq!(
            event.storage_location(),
            Some(&StorageLocation::new("journal-1.prov", 128))
        );

        let stripped = event.without_storage_location();
        assert!(stripped.storage_location().is_none());
    }

    #[test]
    fn test_event_json_dump() {
        let event = event_with_updates();
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event_type"], "ATTRIBUTES_MODIFIED");
        assert_eq!(json["updated_attributes"]["path"], serde_json::Value::Null);

        let back: ProvenanceEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
