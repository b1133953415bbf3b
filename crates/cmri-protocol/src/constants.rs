//! Protocol constants
//!
//! Byte values and defaults used on the C/MRI serial link.

// ============================================================================
// Framing Bytes
// ============================================================================

/// Preamble byte; every host frame starts with two of these.
pub const PREAMBLE: u8 = 0xFF;
/// Start of text. Marks the start of a frame.
pub const STX: u8 = 0x02;
/// End of text. Marks the end of a frame.
pub const ETX: u8 = 0x03;
/// Data link escape. Precedes any control byte carried inside a payload.
pub const DLE: u8 = 0x10;

/// Added to a node address to form its wire byte.
pub const ADDRESS_OFFSET: u8 = 65;
/// Highest valid node address.
pub const MAX_ADDRESS: u8 = 127;

// ============================================================================
// Message Types
// ============================================================================

/// Initialize a node ('I').
pub const MSG_INIT: u8 = b'I';
/// Poll a node for its inputs ('P').
pub const MSG_POLL: u8 = b'P';
/// Transmit output bits to a node ('T').
pub const MSG_TRANSMIT: u8 = b'T';
/// Response carrying a node's inputs ('R').
pub const MSG_RECEIVE: u8 = b'R';

// ============================================================================
// Node Type Codes (first byte of an init payload)
// ============================================================================

/// Super mini node.
pub const NODE_CODE_SMINI: u8 = b'M';
/// Maxi node with 24-bit cards.
pub const NODE_CODE_MAXI24: u8 = b'N';
/// Maxi node with 32-bit cards.
pub const NODE_CODE_MAXI32: u8 = b'X';
/// cpNode.
pub const NODE_CODE_CPNODE: u8 = b'C';

/// Required CT array length for an SMINI.
pub const SMINI_CT_LEN: usize = 6;

// ============================================================================
// Session Defaults
// ============================================================================

/// Receive attempts before a byte read times out.
pub const DEFAULT_MAX_TRIES: u32 = 1500;
/// Buffered input bytes tolerated before reporting an overrun.
pub const DEFAULT_MAX_BUF: usize = 50;
/// Upper bound for `max_buf`.
pub const MAX_MAX_BUF: usize = 262;
/// Inter-byte delay sent to nodes at init.
pub const DEFAULT_DELAY: u16 = 0;
/// Input bytes returned by a poll (an SMINI has three input ports).
pub const DEFAULT_INPUT_BYTES: usize = 3;
/// Upper bound for `input_bytes`.
pub const MAX_INPUT_BYTES: usize = 64;
/// Pause between pending-write checks while draining output.
pub const DEFAULT_DRAIN_PAUSE_MS: u64 = 10;
