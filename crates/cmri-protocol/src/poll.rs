//! Poll/response state machine.
//!
//! A poll sends a 'P' frame and then reads the node's 'R' response byte by
//! byte. Noise before the STX is discarded. A response with another node's
//! address restarts the whole poll, while a wrong type byte only re-syncs
//! on the next STX. A bad trailer is reported but the payload is kept.

use crate::channel::{write_and_drain, Channel};
use crate::constants::*;
use crate::diagnostic::{emit, Diagnostic, DiagnosticSink};
use crate::error::{CmriError, CmriResult};
use crate::frame::FrameCodec;
use crate::receiver::RetryReceiver;
use crate::settings::SessionConfig;
use crate::types::{Message, NodeAddress};
use std::time::Duration;
use tracing::{debug, trace};

/// Steps of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Discard stale input and transmit the poll frame.
    SendPoll,
    /// Skip bytes until an STX arrives.
    AwaitStx,
    /// Expect the polled node's address byte.
    CheckAddress,
    /// Expect the 'R' response type.
    CheckType,
    /// Read the fixed-length payload.
    ReadPayload,
    /// Expect the ETX trailer.
    CheckEtx,
    /// Payload ready.
    Complete,
}

/// Polls one node for its input bytes.
#[derive(Debug, Clone)]
pub struct PollEngine {
    address: NodeAddress,
    receiver: RetryReceiver,
    input_bytes: usize,
    drain_pause: Duration,
    max_repolls: Option<u32>,
}

impl PollEngine {
    /// Create an engine for `address` using a session's settings.
    pub fn new(address: NodeAddress, config: &SessionConfig) -> Self {
        PollEngine {
            address,
            receiver: RetryReceiver::from_config(address, config),
            input_bytes: config.input_bytes,
            drain_pause: config.drain_pause(),
            max_repolls: config.max_repolls,
        }
    }

    /// Run one poll to completion.
    ///
    /// Only fatal conditions (timeout, overrun, framing, I/O, re-poll limit)
    /// are returned as errors; everything else goes to `sink`.
    pub fn poll<C: Channel + ?Sized>(
        &self,
        channel: &mut C,
        sink: &mut dyn DiagnosticSink,
    ) -> CmriResult<Vec<u8>> {
        let address = self.address;
        let mut payload = Vec::with_capacity(self.input_bytes);
        let mut repolls = 0u32;
        let mut state = PollState::SendPoll;

        loop {
            trace!(node = address.get(), ?state, "poll step");
            state = match state {
                PollState::SendPoll => {
                    channel.discard_input()?;
                    write_and_drain(channel, &Message::poll(address).encode(), self.drain_pause)?;
                    payload.clear();
                    PollState::AwaitStx
                }
                PollState::AwaitStx => {
                    let byte = self.receiver.read_byte(channel)?;
                    if byte == STX {
                        PollState::CheckAddress
                    } else {
                        trace!(node = address.get(), byte, "discarding byte before STX");
                        PollState::AwaitStx
                    }
                }
                PollState::CheckAddress => {
                    let byte = self.receiver.read_byte(channel)?;
                    if byte == address.wire_byte() {
                        PollState::CheckType
                    } else {
                        emit(sink, Diagnostic::BadAddress { expected: address, received: byte });
                        repolls += 1;
                        if let Some(max) = self.max_repolls {
                            if repolls > max {
                                return Err(CmriError::ResyncLimit { address, attempts: max });
                            }
                        }
                        PollState::SendPoll
                    }
                }
                PollState::CheckType => {
                    let byte = self.receiver.read_byte(channel)?;
                    if byte == MSG_RECEIVE {
                        PollState::ReadPayload
                    } else {
                        emit(sink, Diagnostic::BadResponseType { address, received: byte });
                        PollState::AwaitStx
                    }
                }
                PollState::ReadPayload => {
                    for _ in 0..self.input_bytes {
                        let byte = FrameCodec::read_payload_byte(address, || {
                            self.receiver.read_byte(&mut *channel)
                        })?;
                        payload.push(byte);
                    }
                    PollState::CheckEtx
                }
                PollState::CheckEtx => {
                    let byte = self.receiver.read_byte(channel)?;
                    if byte != ETX {
                        emit(sink, Diagnostic::MissingEtx { address, received: byte });
                    }
                    PollState::Complete
                }
                PollState::Complete => {
                    debug!(node = address.get(), inputs = ?payload, "poll complete");
                    return Ok(payload);
                }
            };
        }
    }
}
