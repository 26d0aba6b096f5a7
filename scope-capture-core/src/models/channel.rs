use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Byte order of a channel's samples on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    Big,
    Little,
    /// Host byte order; used by devices that do not declare one.
    Native,
}

/// Wire-format metadata for one acquisition channel.
///
/// Produced by the device-enumeration collaborator, one entry per hardware
/// scan element, in scan order. Immutable once built: the demultiplexer and
/// the capture session derive every stride and decode decision from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    pub name: String,
    pub enabled: bool,
    /// Sample width on the wire, in bytes. Supported widths: 1, 2, 4.
    pub bytes: u32,
    /// Right-shift applied to the raw word before masking.
    pub shift: u32,
    /// Mask applied after shifting.
    pub mask: u32,
    pub is_signed: bool,
    /// Number of significant bits in the masked value; drives sign extension.
    pub bits_used: u32,
    pub endianness: Endianness,
}

impl ChannelDescriptor {
    /// Whether this is an input scan element worth offering for capture.
    ///
    /// The timestamp channel is part of the scan but carries no signal.
    pub fn is_scan_input(&self) -> bool {
        self.name.starts_with("in") && self.name != "in_timestamp"
    }
}

/// Bytes occupied by one interleaved sample across all enabled channels.
pub fn sample_stride(descriptors: &[ChannelDescriptor]) -> usize {
    descriptors
        .iter()
        .filter(|c| c.enabled)
        .map(|c| c.bytes as usize)
        .sum()
}

/// Number of enabled channels.
pub fn active_count(descriptors: &[ChannelDescriptor]) -> usize {
    descriptors.iter().filter(|c| c.enabled).count()
}

/// Parse an ordered channel table from JSON.
///
/// Enumeration collaborators hand descriptor lists over in this form.
pub fn parse_channel_table(json: &str) -> Result<Vec<ChannelDescriptor>, CaptureError> {
    serde_json::from_str(json)
        .map_err(|e| CaptureError::InvalidConfiguration(format!("channel table: {}", e)))
}
