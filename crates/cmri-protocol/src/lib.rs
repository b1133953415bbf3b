//! C/MRI Serial Protocol
//!
//! This crate implements the host side of the C/MRI (Computer/Model Railroad
//! Interface) protocol used to initialize, poll and drive remote I/O nodes
//! over an asynchronous serial link.
//!
//! # Protocol Overview
//!
//! Every message from the host is a frame:
//!
//! ```text
//! 0xFF 0xFF STX <address + 65> <type> <stuffed payload> ETX
//! ```
//!
//! - **Init** (`'I'`): node type code, inter-byte delay and card configuration
//! - **Poll** (`'P'`): no payload; the node answers with an `'R'` frame
//!   carrying its input bytes
//! - **Transmit** (`'T'`): raw output bits
//!
//! Payload bytes equal to STX (0x02), ETX (0x03) or DLE (0x10) are preceded
//! by a DLE.
//!
//! The crate does not open ports. It drives any [`Channel`], a byte
//! transport that can report waiting bytes and drain its writes.
//!
//! # Example
//!
//! ```rust
//! use cmri_protocol::{MemoryChannel, NodeAddress, NodeSession, NodeType, SessionConfig};
//!
//! let mut session = NodeSession::new(MemoryChannel::new(), SessionConfig::default())?;
//! let node = NodeAddress::new(5)?;
//!
//! session.init(node, NodeType::Smini, Some(&[0b11, 0, 0, 0, 0, 0]))?;
//!
//! // The node's reply becomes readable once the poll frame is written.
//! session.channel_mut().queue_reply(&[0x02, 70, b'R', 10, 20, 30, 0x03]);
//! assert_eq!(session.poll(node)?, vec![10, 20, 30]);
//!
//! session.output(node, &[0xFF, 0x00, 0x0F])?;
//! # Ok::<(), cmri_protocol::CmriError>(())
//! ```

mod channel;
mod constants;
mod diagnostic;
mod error;
mod frame;
mod node_config;
mod poll;
mod receiver;
mod session;
mod settings;
mod types;

pub use channel::{write_and_drain, Channel, MemoryChannel};
pub use constants::*;
pub use diagnostic::{Diagnostic, DiagnosticSink, TracingSink};
pub use error::{CmriError, CmriResult};
pub use frame::{needs_escape, DecodedFrame, FrameCodec};
pub use node_config::{maxi_card_sets, smini_two_lead_signals, NodeConfigEncoder};
pub use poll::{PollEngine, PollState};
pub use receiver::{retry_with_budget, RetryReceiver};
pub use session::{NodeHandle, NodeSession};
pub use settings::{ProtocolVariant, SessionConfig};
pub use types::{Message, MessageType, NodeAddress, NodeType};
