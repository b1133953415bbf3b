//! Common types used in the protocol.

use crate::constants::*;
use crate::error::{CmriError, CmriResult};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Node Address
// ============================================================================

/// A node address (UA) in the range 0..=127.
///
/// On the wire the address is sent as `address + 65`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct NodeAddress(u8);

impl NodeAddress {
    /// Create an address, rejecting values above 127.
    pub fn new(address: u8) -> CmriResult<Self> {
        if address > MAX_ADDRESS {
            return Err(CmriError::InvalidAddress(address as i64));
        }
        Ok(NodeAddress(address))
    }

    /// Recover an address from its wire byte.
    pub fn from_wire(byte: u8) -> CmriResult<Self> {
        match byte.checked_sub(ADDRESS_OFFSET) {
            Some(address) => NodeAddress::new(address),
            None => Err(CmriError::InvalidAddress(byte as i64 - ADDRESS_OFFSET as i64)),
        }
    }

    /// The numeric address.
    pub fn get(self) -> u8 {
        self.0
    }

    /// The byte transmitted for this address.
    pub fn wire_byte(self) -> u8 {
        self.0 + ADDRESS_OFFSET
    }
}

impl TryFrom<i64> for NodeAddress {
    type Error = CmriError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(address) => NodeAddress::new(address),
            Err(_) => Err(CmriError::InvalidAddress(value)),
        }
    }
}

impl TryFrom<i32> for NodeAddress {
    type Error = CmriError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        NodeAddress::try_from(value as i64)
    }
}

impl From<NodeAddress> for u8 {
    fn from(address: NodeAddress) -> Self {
        address.0
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Node Type
// ============================================================================

/// The kind of node hardware being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeType {
    /// Super mini node: fixed 24 outputs / 48 inputs, six CT bytes.
    Smini,
    /// Maxi node with 24-bit I/O cards.
    Maxi24,
    /// Maxi node with 32-bit I/O cards.
    Maxi32,
    /// cpNode.
    Cpnode,
}

impl NodeType {
    /// All node types.
    pub const ALL: [NodeType; 4] = [
        NodeType::Smini,
        NodeType::Maxi24,
        NodeType::Maxi32,
        NodeType::Cpnode,
    ];

    /// The node definition code sent as the first init payload byte.
    pub fn code(self) -> u8 {
        match self {
            NodeType::Smini => NODE_CODE_SMINI,
            NodeType::Maxi24 => NODE_CODE_MAXI24,
            NodeType::Maxi32 => NODE_CODE_MAXI32,
            NodeType::Cpnode => NODE_CODE_CPNODE,
        }
    }

    /// Upper-case name.
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Smini => "SMINI",
            NodeType::Maxi24 => "MAXI24",
            NodeType::Maxi32 => "MAXI32",
            NodeType::Cpnode => "CPNODE",
        }
    }

    /// Whether this is one of the maxi variants.
    pub fn is_maxi(self) -> bool {
        matches!(self, NodeType::Maxi24 | NodeType::Maxi32)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown node type '{}' (expected SMINI, MAXI24, MAXI32 or CPNODE)", s)
            })
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Message type byte carried in every host frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Initialize a node.
    Init,
    /// Request a node's inputs. Carries no payload on the wire.
    Poll,
    /// Send output bits.
    Transmit,
}

impl MessageType {
    /// Wire byte for this message type.
    pub fn byte(self) -> u8 {
        match self {
            MessageType::Init => MSG_INIT,
            MessageType::Poll => MSG_POLL,
            MessageType::Transmit => MSG_TRANSMIT,
        }
    }
}

/// A logical host-to-node message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Destination node.
    pub address: NodeAddress,
    /// Message type.
    pub message_type: MessageType,
    /// Unstuffed payload bytes.
    pub payload: Bytes,
}

impl Message {
    /// Create a message.
    pub fn new(address: NodeAddress, message_type: MessageType, payload: impl Into<Bytes>) -> Self {
        Message {
            address,
            message_type,
            payload: payload.into(),
        }
    }

    /// A poll request for `address`.
    pub fn poll(address: NodeAddress) -> Self {
        Message::new(address, MessageType::Poll, Bytes::new())
    }

    /// Encode into wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        crate::frame::FrameCodec::encode(self.address, self.message_type, &self.payload)
    }
}
