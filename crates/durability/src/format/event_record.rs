//! Provenance event record layouts.
//!
//! The writer only ever emits the current layout (version 7). The reader
//! selects one of three layouts once, from the segment's serialization
//! version, and decodes every record with it.
//!
//! # Version 7 (current)
//!
//! ```text
//! event id (u64) │ event type (short string) │ event time, entry date, duration (i64 ×3)
//! lineage ids (i32 count + ids) │ lineage start date (i64)
//! component id, component type (nullable) │ flow file uuid (id) │ details (nullable)
//! previous attributes │ updated attributes (nullable values)
//! current claim (flag + container, section, identifier, offset u64, size u64)
//! previous claim (same shape) │ source queue identifier (nullable)
//! type-specific tail
//! ```
//!
//! # Version 6
//!
//! Same order up to the lineage start date, followed by the file size as a
//! bare `u64`; a single flat attribute map replaces both maps and there is no
//! claim tuple, previous claim or source queue identifier.
//!
//! # Versions 1-5 (legacy)
//!
//! ```text
//! event id │ [v4: event uuid string, discarded] │ event type │ event time
//! [v4+: duration] │ flow file numeric id (discarded) │ file size
//! component id, component type (nullable) │ flow file uuid (nullable text)
//! parent uuids (text list) │ [v3+: child uuids (text list)]
//! source system uri (nullable) │ [v4+: source system flow file id (nullable)]
//! destination system uri (nullable) │ content type (nullable, discarded)
//! alternate identifier uri (nullable) │ attributes (flat)
//! ```
//!
//! Legacy records have no type-specific tail.

use super::header::CURRENT_SERIALIZATION_VERSION;
use super::primitives::*;
use crate::error::{CodecError, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use provlog_core::{
    AttributeUpdates, Attributes, ContentClaim, EventBuilder, EventType, ProvenanceEvent,
};
use std::io::{self, Read, Write};

/// Record layout selected from a serialization version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    /// Versions 1 through 5
    Legacy(u32),
    /// Version 6: modern field order, size-only content claim
    ModernV6,
    /// Version 7: full content claims and attribute deltas
    ModernV7,
}

impl RecordLayout {
    /// Layout the writer emits
    pub const CURRENT: RecordLayout = RecordLayout::ModernV7;

    /// Select the layout for a serialization version.
    ///
    /// # Errors
    ///
    /// - `UnsupportedVersion` outside 1..=7
    pub fn for_version(version: u32) -> Result<Self> {
        match version {
            1..=5 => Ok(RecordLayout::Legacy(version)),
            6 => Ok(RecordLayout::ModernV6),
            CURRENT_SERIALIZATION_VERSION => Ok(RecordLayout::ModernV7),
            _ => Err(CodecError::UnsupportedVersion { version }),
        }
    }

    /// Serialization version this layout decodes
    pub const fn version(&self) -> u32 {
        match self {
            RecordLayout::Legacy(v) => *v,
            RecordLayout::ModernV6 => 6,
            RecordLayout::ModernV7 => CURRENT_SERIALIZATION_VERSION,
        }
    }

    /// Decode one record's wire fields.
    ///
    /// Returns a builder carrying every decoded field; the caller adds the
    /// storage location and builds. Structural problems are reported as
    /// `InvalidData` or `UnexpectedEof`.
    pub fn decode<R: Read>(&self, input: &mut R) -> io::Result<EventBuilder> {
        match self {
            RecordLayout::Legacy(version) => decode_legacy(input, *version),
            RecordLayout::ModernV6 => decode_modern(input, false),
            RecordLayout::ModernV7 => decode_modern(input, true),
        }
    }
}

// ============================================================================
// Encoding (current layout only)
// ============================================================================

/// Encode `event` in the current layout under the repository-assigned `record_id`.
///
/// Appends to `out`; on error `out` may hold a partial record.
pub fn encode_event<W: Write>(event: &ProvenanceEvent, record_id: u64, out: &mut W) -> Result<()> {
    out.write_u64::<BigEndian>(record_id)?;
    write_short_string(out, "event_type", event.event_type().name())?;
    out.write_i64::<BigEndian>(event.event_time())?;
    out.write_i64::<BigEndian>(event.flow_file_entry_date())?;
    out.write_i64::<BigEndian>(event.event_duration())?;

    write_uuids(out, event.lineage_identifiers().iter())?;
    out.write_i64::<BigEndian>(event.lineage_start_date())?;

    write_nullable_string(out, "component_id", event.component_id())?;
    write_nullable_string(out, "component_type", event.component_type())?;
    write_uuid(out, &event.flow_file_uuid())?;
    write_nullable_string(out, "details", event.details())?;

    write_attributes(out, event.previous_attributes())?;
    write_attribute_updates(out, event.updated_attributes())?;

    write_claim(out, Some(event.current_claim()))?;
    write_claim(out, event.previous_claim())?;

    write_nullable_string(
        out,
        "source_queue_identifier",
        event.source_queue_identifier(),
    )?;

    match event.event_type() {
        t if t.carries_lineage_lists() => {
            write_uuids(out, event.parent_uuids().iter())?;
            write_uuids(out, event.child_uuids().iter())?;
        }
        EventType::Receive => {
            write_nullable_string(out, "transit_uri", event.transit_uri())?;
            write_nullable_string(
                out,
                "source_system_flow_file_identifier",
                event.source_system_flow_file_identifier(),
            )?;
        }
        EventType::Send => {
            write_nullable_string(out, "transit_uri", event.transit_uri())?;
        }
        EventType::AddInfo => {
            write_nullable_string(
                out,
                "alternate_identifier_uri",
                event.alternate_identifier_uri(),
            )?;
        }
        EventType::Route => {
            write_nullable_string(out, "relationship", event.relationship())?;
        }
        _ => {}
    }

    Ok(())
}

/// Only resolved claims are written; anything else is a single `false` flag.
fn write_claim<W: Write>(out: &mut W, claim: Option<&ContentClaim>) -> Result<()> {
    match claim {
        Some(ContentClaim {
            container: Some(container),
            section: Some(section),
            identifier: Some(identifier),
            offset,
            size,
        }) => {
            write_bool(out, true)?;
            write_short_string(out, "claim_container", container)?;
            write_short_string(out, "claim_section", section)?;
            write_short_string(out, "claim_identifier", identifier)?;
            out.write_u64::<BigEndian>(offset.unwrap_or(0))?;
            out.write_u64::<BigEndian>(*size)?;
            Ok(())
        }
        _ => write_bool(out, false),
    }
}

// ============================================================================
// Decoding
// ============================================================================

fn read_event_type<R: Read>(input: &mut R) -> io::Result<EventType> {
    let name = read_short_string(input)?;
    EventType::from_name(&name).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unknown event type '{}'", name),
        )
    })
}

fn read_claim<R: Read>(input: &mut R) -> io::Result<ContentClaim> {
    let container = read_short_string(input)?;
    let section = read_short_string(input)?;
    let identifier = read_short_string(input)?;
    let offset = input.read_u64::<BigEndian>()?;
    let size = input.read_u64::<BigEndian>()?;
    Ok(ContentClaim::new(container, section, identifier, offset, size))
}

/// Flat attribute maps become the update set against an empty snapshot.
fn as_updates(flat: Attributes) -> AttributeUpdates {
    flat.into_iter().map(|(k, v)| (k, Some(v))).collect()
}

fn decode_modern<R: Read>(input: &mut R, full_claims: bool) -> io::Result<EventBuilder> {
    let event_id = input.read_u64::<BigEndian>()?;
    let event_type = read_event_type(input)?;
    let event_time = input.read_i64::<BigEndian>()?;
    let entry_date = input.read_i64::<BigEndian>()?;
    let duration = input.read_i64::<BigEndian>()?;
    let lineage = read_uuids(input)?;
    let lineage_start = input.read_i64::<BigEndian>()?;

    let mut builder = EventBuilder::new()
        .event_id(event_id)
        .event_type(event_type)
        .event_time(event_time)
        .flow_file_entry_date(entry_date)
        .event_duration(duration)
        .lineage_identifiers(lineage)
        .lineage_start_date(lineage_start);

    if !full_claims {
        let file_size = input.read_u64::<BigEndian>()?;
        builder = builder.current_content_claim(ContentClaim::size_only(file_size));
    }

    builder = builder.component_id(read_nullable_string(input)?);
    builder = builder.component_type(read_nullable_string(input)?);
    builder = builder.flow_file_uuid(read_uuid(input)?);
    builder = builder.details(read_nullable_string(input)?);

    if full_claims {
        let previous = read_attributes(input)?;
        let updates = read_attribute_updates(input)?;
        builder = builder.attributes(previous, updates);

        if read_bool(input)? {
            builder = builder.current_content_claim(read_claim(input)?);
        }
        if read_bool(input)? {
            builder = builder.previous_content_claim(read_claim(input)?);
        }
        builder = builder.source_queue_identifier(read_nullable_string(input)?);
    } else {
        let flat = read_attributes(input)?;
        builder = builder.attributes(Attributes::new(), as_updates(flat));
    }

    decode_type_specific(input, event_type, builder)
}

fn decode_type_specific<R: Read>(
    input: &mut R,
    event_type: EventType,
    mut builder: EventBuilder,
) -> io::Result<EventBuilder> {
    match event_type {
        t if t.carries_lineage_lists() => {
            for parent in read_uuids(input)? {
                builder = builder.add_parent_uuid(parent);
            }
            for child in read_uuids(input)? {
                builder = builder.add_child_uuid(child);
            }
        }
        EventType::Receive => {
            builder = builder.transit_uri(read_nullable_string(input)?);
            builder = builder.source_system_flow_file_identifier(read_nullable_string(input)?);
        }
        EventType::Send => {
            builder = builder.transit_uri(read_nullable_string(input)?);
        }
        EventType::AddInfo => {
            builder = builder.alternate_identifier_uri(read_nullable_string(input)?);
        }
        EventType::Route => {
            builder = builder.relationship(read_nullable_string(input)?);
        }
        _ => {}
    }
    Ok(builder)
}

fn decode_legacy<R: Read>(input: &mut R, version: u32) -> io::Result<EventBuilder> {
    let event_id = input.read_u64::<BigEndian>()?;
    if version == 4 {
        // Per-event UUID, only ever written by version 4.
        read_short_string(input)?;
    }
    let event_type = read_event_type(input)?;

    let mut builder = EventBuilder::new()
        .event_id(event_id)
        .event_type(event_type)
        .event_time(input.read_i64::<BigEndian>()?);

    if version > 3 {
        builder = builder.event_duration(input.read_i64::<BigEndian>()?);
    }

    input.read_u64::<BigEndian>()?; // numeric flow file id, unused
    let file_size = input.read_u64::<BigEndian>()?;

    builder = builder.component_id(read_nullable_string(input)?);
    builder = builder.component_type(read_nullable_string(input)?);
    if let Some(text) = read_nullable_string(input)? {
        builder = builder.flow_file_uuid(parse_uuid(&text)?);
    }

    for parent in read_text_uuids(input)? {
        builder = builder.add_parent_uuid(parent);
    }
    if version > 2 {
        for child in read_text_uuids(input)? {
            builder = builder.add_child_uuid(child);
        }
    }

    let source_uri = read_nullable_string(input)?;
    if version > 3 {
        builder = builder.source_system_flow_file_identifier(read_nullable_string(input)?);
    }
    let destination_uri = read_nullable_string(input)?;
    builder = builder.transit_uri(source_uri.or(destination_uri));

    read_nullable_string(input)?; // content type, unused
    builder = builder.alternate_identifier_uri(read_nullable_string(input)?);

    let flat = read_attributes(input)?;

    Ok(builder
        .flow_file_entry_date(chrono::Utc::now().timestamp_millis())
        .lineage_start_date(-1)
        .attributes(Attributes::new(), as_updates(flat))
        .current_content_claim(ContentClaim::size_only(file_size)))
}
