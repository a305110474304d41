//! Segment header and serialization versions.
//!
//! The header is written once when a segment is created. Readers are normally
//! told the version out-of-band and only parse the header when first
//! establishing trust in a segment.

use super::primitives::{read_short_string, write_short_string};
use crate::error::Result;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// Identifier written at the start of every segment.
///
/// Kept byte-identical to the identifier found in existing archived segments
/// so they pass header validation.
pub const FORMAT_IDENTIFIER: &str = "org.apache.nifi.provenance.PersistentProvenanceRepository";

/// Serialization version emitted by the writer
pub const CURRENT_SERIALIZATION_VERSION: u32 = 7;

/// Oldest serialization version the reader can decode
pub const MIN_SERIALIZATION_VERSION: u32 = 1;

/// Segment header: format identifier + serialization version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHeader {
    /// Format identifier
    pub identifier: String,

    /// Serialization version of every record in the segment
    pub version: u32,
}

impl SegmentHeader {
    /// Header for a segment written by this codec.
    pub fn current() -> Self {
        SegmentHeader {
            identifier: FORMAT_IDENTIFIER.to_string(),
            version: CURRENT_SERIALIZATION_VERSION,
        }
    }

    /// Encoded size in bytes.
    pub fn encoded_len(&self) -> u64 {
        2 + self.identifier.len() as u64 + 4
    }

    /// Write the header.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        write_short_string(out, "format_identifier", &self.identifier)?;
        out.write_u32::<BigEndian>(self.version)?;
        Ok(())
    }

    /// Read a header.
    pub fn read_from<R: Read>(input: &mut R) -> io::Result<Self> {
        let identifier = read_short_string(input)?;
        let version = input.read_u32::<BigEndian>()?;
        Ok(SegmentHeader {
            identifier,
            version,
        })
    }

    /// Validate the header names this format.
    pub fn is_valid(&self) -> bool {
        self.identifier == FORMAT_IDENTIFIER
    }

    /// Whether the version is one the reader can decode.
    pub fn is_supported(&self) -> bool {
        (MIN_SERIALIZATION_VERSION..=CURRENT_SERIALIZATION_VERSION).contains(&self.version)
    }
}
