//! Builder for provenance events
//!
//! The builder accepts fields in any order and applies defaults at
//! [`EventBuilder::build`]. The event type is the only required field.
//! No cross-field validation is performed: a RECEIVE event without a transit
//! URI is still a valid record.
//!
//! # Example
//!
//! ```
//! use provlog_core::{EventBuilder, EventType, Uuid};
//!
//! let event = EventBuilder::new()
//!     .event_type(EventType::Create)
//!     .flow_file_uuid(Uuid::new_v4())
//!     .component_id("generate-1")
//!     .updated_attribute("filename", "data.csv")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(event.lineage_start_date(), -1);
//! ```

use crate::error::{ModelError, ModelResult};
use crate::event::{
    AttributeUpdates, Attributes, ContentClaim, ProvenanceEvent, StorageLocation,
};
use crate::event_type::EventType;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Conversion into an optional string field
///
/// Lets builder setters accept `&str`, `String`, or their `Option` forms.
pub trait IntoOptionalString {
    /// Convert into the stored representation
    fn into_optional_string(self) -> Option<String>;
}

impl IntoOptionalString for &str {
    fn into_optional_string(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl IntoOptionalString for String {
    fn into_optional_string(self) -> Option<String> {
        Some(self)
    }
}

impl IntoOptionalString for Option<String> {
    fn into_optional_string(self) -> Option<String> {
        self
    }
}

impl IntoOptionalString for Option<&str> {
    fn into_optional_string(self) -> Option<String> {
        self.map(str::to_string)
    }
}

/// Builder for [`ProvenanceEvent`]
#[derive(Debug, Clone)]
pub struct EventBuilder {
    event_id: u64,
    event_type: Option<EventType>,
    event_time: i64,
    flow_file_entry_date: i64,
    event_duration: i64,
    lineage_start_date: i64,
    flow_file_uuid: Uuid,
    lineage_identifiers: BTreeSet<Uuid>,
    component_id: Option<String>,
    component_type: Option<String>,
    details: Option<String>,
    source_queue_identifier: Option<String>,
    transit_uri: Option<String>,
    alternate_identifier_uri: Option<String>,
    relationship: Option<String>,
    source_system_flow_file_identifier: Option<String>,
    previous_attributes: Attributes,
    updated_attributes: AttributeUpdates,
    current_claim: ContentClaim,
    previous_claim: Option<ContentClaim>,
    parent_uuids: Vec<Uuid>,
    child_uuids: Vec<Uuid>,
    storage_location: Option<StorageLocation>,
}

impl Default for EventBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBuilder {
    /// Create a builder with every field at its default
    pub fn new() -> Self {
        EventBuilder {
            event_id: 0,
            event_type: None,
            event_time: 0,
            flow_file_entry_date: 0,
            event_duration: -1,
            lineage_start_date: -1,
            flow_file_uuid: Uuid::nil(),
            lineage_identifiers: BTreeSet::new(),
            component_id: None,
            component_type: None,
            details: None,
            source_queue_identifier: None,
            transit_uri: None,
            alternate_identifier_uri: None,
            relationship: None,
            source_system_flow_file_identifier: None,
            previous_attributes: Attributes::new(),
            updated_attributes: AttributeUpdates::new(),
            current_claim: ContentClaim::default(),
            previous_claim: None,
            parent_uuids: Vec::new(),
            child_uuids: Vec::new(),
            storage_location: None,
        }
    }

    /// Set the repository-assigned event identifier
    pub fn event_id(mut self, event_id: u64) -> Self {
        self.event_id = event_id;
        self
    }

    /// Set the event type (required)
    pub fn event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    /// Set the event time in milliseconds
    pub fn event_time(mut self, millis: i64) -> Self {
        self.event_time = millis;
        self
    }

    /// Set the flow file entry date in milliseconds
    pub fn flow_file_entry_date(mut self, millis: i64) -> Self {
        self.flow_file_entry_date = millis;
        self
    }

    /// Set the event duration in milliseconds
    pub fn event_duration(mut self, millis: i64) -> Self {
        self.event_duration = millis;
        self
    }

    /// Set the lineage start date in milliseconds
    pub fn lineage_start_date(mut self, millis: i64) -> Self {
        self.lineage_start_date = millis;
        self
    }

    /// Set the flow file UUID
    pub fn flow_file_uuid(mut self, uuid: Uuid) -> Self {
        self.flow_file_uuid = uuid;
        self
    }

    /// Replace the lineage identifier set
    pub fn lineage_identifiers(mut self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.lineage_identifiers = ids.into_iter().collect();
        self
    }

    /// Add one lineage identifier
    pub fn add_lineage_identifier(mut self, id: Uuid) -> Self {
        self.lineage_identifiers.insert(id);
        self
    }

    /// Set the component identifier
    pub fn component_id(mut self, value: impl IntoOptionalString) -> Self {
        self.component_id = value.into_optional_string();
        self
    }

    /// Set the component type
    pub fn component_type(mut self, value: impl IntoOptionalString) -> Self {
        self.component_type = value.into_optional_string();
        self
    }

    /// Set the details text
    pub fn details(mut self, value: impl IntoOptionalString) -> Self {
        self.details = value.into_optional_string();
        self
    }

    /// Set the source queue identifier
    pub fn source_queue_identifier(mut self, value: impl IntoOptionalString) -> Self {
        self.source_queue_identifier = value.into_optional_string();
        self
    }

    /// Set the transit URI
    pub fn transit_uri(mut self, value: impl IntoOptionalString) -> Self {
        self.transit_uri = value.into_optional_string();
        self
    }

    /// Set the alternate identifier URI
    pub fn alternate_identifier_uri(mut self, value: impl IntoOptionalString) -> Self {
        self.alternate_identifier_uri = value.into_optional_string();
        self
    }

    /// Set the relationship name
    pub fn relationship(mut self, value: impl IntoOptionalString) -> Self {
        self.relationship = value.into_optional_string();
        self
    }

    /// Set the source-system flow file identifier
    pub fn source_system_flow_file_identifier(mut self, value: impl IntoOptionalString) -> Self {
        self.source_system_flow_file_identifier = value.into_optional_string();
        self
    }

    /// Replace both attribute maps
    pub fn attributes(mut self, previous: Attributes, updates: AttributeUpdates) -> Self {
        self.previous_attributes = previous;
        self.updated_attributes = updates;
        self
    }

    /// Add one attribute to the previous snapshot
    pub fn previous_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.previous_attributes.insert(key.into(), value.into());
        self
    }

    /// Add one attribute update; `None` records a removal
    pub fn updated_attribute(mut self, key: impl Into<String>, value: impl IntoOptionalString) -> Self {
        self.updated_attributes
            .insert(key.into(), value.into_optional_string());
        self
    }

    /// Set the current content claim
    pub fn current_content_claim(mut self, claim: ContentClaim) -> Self {
        self.current_claim = claim;
        self
    }

    /// Set the previous content claim
    pub fn previous_content_claim(mut self, claim: ContentClaim) -> Self {
        self.previous_claim = Some(claim);
        self
    }

    /// Add a parent flow file UUID
    pub fn add_parent_uuid(mut self, uuid: Uuid) -> Self {
        self.parent_uuids.push(uuid);
        self
    }

    /// Add a child flow file UUID
    pub fn add_child_uuid(mut self, uuid: Uuid) -> Self {
        self.child_uuids.push(uuid);
        self
    }

    /// Set where the record was read from
    pub fn storage_location(mut self, filename: impl Into<String>, offset: u64) -> Self {
        self.storage_location = Some(StorageLocation::new(filename, offset));
        self
    }

    /// Produce the immutable event
    ///
    /// # Errors
    ///
    /// - `MissingRequiredField("event_type")` if no event type was set
    pub fn build(self) -> ModelResult<ProvenanceEvent> {
        let event_type = self
            .event_type
            .ok_or(ModelError::MissingRequiredField("event_type"))?;

        Ok(ProvenanceEvent {
            event_id: self.event_id,
            event_type,
            event_time: self.event_time,
            flow_file_entry_date: self.flow_file_entry_date,
            event_duration: self.event_duration,
            lineage_start_date: self.lineage_start_date,
            flow_file_uuid: self.flow_file_uuid,
            lineage_identifiers: self.lineage_identifiers,
            component_id: self.component_id,
            component_type: self.component_type,
            details: self.details,
            source_queue_identifier: self.source_queue_identifier,
            transit_uri: self.transit_uri,
            alternate_identifier_uri: self.alternate_identifier_uri,
            relationship: self.relationship,
            source_system_flow_file_identifier: self.source_system_flow_file_identifier,
            previous_attributes: self.previous_attributes,
            updated_attributes: self.updated_attributes,
            current_claim: default_offset(self.current_claim),
            previous_claim: self.previous_claim.map(default_offset),
            parent_uuids: self.parent_uuids,
            child_uuids: self.child_uuids,
            storage_location: self.storage_location,
        })
    }
}

/// A located claim without an offset starts at the beginning of the claim.
fn default_offset(mut claim: ContentClaim) -> ContentClaim {
    if claim.is_resolved() && claim.offset.is_none() {
        claim.offset = Some(0);
    }
    claim
}
