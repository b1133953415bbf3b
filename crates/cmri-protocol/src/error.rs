//! Protocol error types.

use crate::settings::ProtocolVariant;
use crate::types::{NodeAddress, NodeType};
use thiserror::Error;

/// Errors that can occur while talking to C/MRI nodes.
///
/// Recoverable anomalies (wrong address byte, wrong response type, bad
/// trailer) are not errors; they are reported as
/// [`Diagnostic`](crate::Diagnostic)s and resolved by resynchronizing.
#[derive(Debug, Error)]
pub enum CmriError {
    /// Node address outside 0..=127.
    #[error("invalid node address {0}: valid range is 0-127")]
    InvalidAddress(i64),

    /// Session configuration value out of range.
    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// The node type is not supported by the selected protocol variant.
    #[error("node type {node_type} is not implemented in the {variant} protocol variant")]
    UnsupportedNodeType {
        /// Requested node type.
        node_type: NodeType,
        /// Active protocol variant.
        variant: ProtocolVariant,
    },

    /// A CT array is required for this node type but none was given.
    #[error("node type {0} requires a CT configuration array")]
    MissingConfiguration(NodeType),

    /// CT array has the wrong length.
    #[error("CT array for {node_type} has length {actual}, expected {expected}")]
    InvalidCtLength {
        /// Node type being configured.
        node_type: NodeType,
        /// Length received.
        actual: usize,
        /// Description of the accepted lengths.
        expected: &'static str,
    },

    /// CT byte with an illegal bit pattern.
    #[error("CT[{index}] = 0x{value:02X} ({value:#010b}) is not a valid {node_type} setting")]
    InvalidCtByte {
        /// Node type being configured.
        node_type: NodeType,
        /// Position in the CT array.
        index: usize,
        /// Offending byte.
        value: u8,
    },

    /// Unescaped control byte where a payload byte was expected.
    #[error("no DLE ahead of 0x{byte:02X} in payload from node {address}")]
    Framing {
        /// Node being read.
        address: NodeAddress,
        /// Control byte found.
        byte: u8,
    },

    /// A buffered frame ended before its trailer.
    #[error("incomplete frame: {0}")]
    IncompleteFrame(&'static str),

    /// More bytes buffered than the session tolerates.
    #[error("node {address}: {available} bytes waiting exceeds max buffer of {max_buf}")]
    Overrun {
        /// Node being read.
        address: NodeAddress,
        /// Bytes reported available.
        available: usize,
        /// Configured limit.
        max_buf: usize,
    },

    /// No byte arrived within the attempt budget.
    #[error("input tries exceeded {tries} for node {address}, aborting input")]
    Timeout {
        /// Node being read.
        address: NodeAddress,
        /// Attempts made.
        tries: u32,
    },

    /// The node kept answering with the wrong address.
    #[error("node {address}: gave up after {attempts} re-polls")]
    ResyncLimit {
        /// Node being polled.
        address: NodeAddress,
        /// Re-polls made.
        attempts: u32,
    },

    /// Transport failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for protocol operations.
pub type CmriResult<T> = Result<T, CmriError>;
