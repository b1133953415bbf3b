//! Frame encoding/decoding utilities.
//!
//! Every host frame has the same shape:
//!
//! ```text
//! +------+------+-----+----------+------+-------------------+-----+
//! | 0xFF | 0xFF | STX | addr+65  | type | stuffed payload   | ETX |
//! +------+------+-----+----------+------+-------------------+-----+
//! ```
//!
//! Inside the payload any STX, ETX or DLE byte is preceded by a DLE.
//! Header and trailer bytes are never escaped. Poll frames carry no payload.

use crate::constants::*;
use crate::error::{CmriError, CmriResult};
use crate::types::{MessageType, NodeAddress};
use bytes::{BufMut, BytesMut};

/// Whether `byte` must be escaped inside a payload.
pub fn needs_escape(byte: u8) -> bool {
    matches!(byte, STX | ETX | DLE)
}

/// A frame recovered from a complete byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Address taken from the address byte.
    pub address: NodeAddress,
    /// Raw message type byte.
    pub message_type: u8,
    /// Unstuffed payload.
    pub payload: Vec<u8>,
}

/// Stateless encoder/decoder for C/MRI frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameCodec;

impl FrameCodec {
    /// Encode a message for transmission.
    ///
    /// The payload of a poll message is never emitted.
    pub fn encode(address: NodeAddress, message_type: MessageType, payload: &[u8]) -> Vec<u8> {
        let body: &[u8] = match message_type {
            MessageType::Poll => &[],
            _ => payload,
        };

        // Worst case every payload byte is escaped.
        let mut buf = BytesMut::with_capacity(6 + body.len() * 2);
        buf.put_u8(PREAMBLE);
        buf.put_u8(PREAMBLE);
        buf.put_u8(STX);
        buf.put_u8(address.wire_byte());
        buf.put_u8(message_type.byte());
        Self::stuff(body, &mut buf);
        buf.put_u8(ETX);
        buf.to_vec()
    }

    /// Append `payload` to `buf`, escaping control bytes.
    pub fn stuff(payload: &[u8], buf: &mut BytesMut) {
        for &byte in payload {
            if needs_escape(byte) {
                buf.put_u8(DLE);
            }
            buf.put_u8(byte);
        }
    }

    /// Read one payload byte using `next` as the byte source.
    ///
    /// A DLE is consumed and the byte after it returned verbatim. An
    /// unescaped STX or ETX is a framing violation.
    pub fn read_payload_byte<F>(address: NodeAddress, mut next: F) -> CmriResult<u8>
    where
        F: FnMut() -> CmriResult<u8>,
    {
        match next()? {
            byte @ (STX | ETX) => Err(CmriError::Framing { address, byte }),
            DLE => next(),
            byte => Ok(byte),
        }
    }

    /// Decode a complete frame held in memory.
    ///
    /// Leading bytes before the first STX (preamble or noise) are skipped.
    /// The payload runs until the first unescaped ETX.
    pub fn decode(frame: &[u8]) -> CmriResult<DecodedFrame> {
        let mut bytes = frame.iter().copied();

        if !bytes.by_ref().any(|b| b == STX) {
            return Err(CmriError::IncompleteFrame("no STX"));
        }
        let address_byte = bytes.next().ok_or(CmriError::IncompleteFrame("missing address"))?;
        let address = NodeAddress::from_wire(address_byte)?;
        let message_type = bytes.next().ok_or(CmriError::IncompleteFrame("missing type"))?;

        let mut payload = Vec::new();
        loop {
            match bytes.next() {
                None => return Err(CmriError::IncompleteFrame("missing ETX")),
                Some(ETX) => break,
                Some(STX) => return Err(CmriError::Framing { address, byte: STX }),
                Some(DLE) => {
                    let byte = bytes
                        .next()
                        .ok_or(CmriError::IncompleteFrame("DLE at end of frame"))?;
                    payload.push(byte);
                }
                Some(byte) => payload.push(byte),
            }
        }

        Ok(DecodedFrame {
            address,
            message_type,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> NodeAddress {
        NodeAddress::new(n).unwrap()
    }

    #[test]
    fn test_encode_header_and_trailer() {
        let frame = FrameCodec::encode(addr(5), MessageType::Transmit, &[0x41, 0x42]);
        assert_eq!(frame, vec![0xFF, 0xFF, 0x02, 70, b'T', 0x41, 0x42, 0x03]);
    }

    #[test]
    fn test_encode_escapes_control_bytes() {
        let frame = FrameCodec::encode(addr(0), MessageType::Transmit, &[2, 3, 16, 4]);
        assert_eq!(
            frame,
            vec![0xFF, 0xFF, 0x02, 65, b'T', 16, 2, 16, 3, 16, 16, 4, 0x03]
        );
    }

    #[test]
    fn test_encode_poll_has_no_body() {
        let frame = FrameCodec::encode(addr(1), MessageType::Poll, &[1, 2, 3]);
        assert_eq!(frame, vec![0xFF, 0xFF, 0x02, 66, b'P', 0x03]);
    }

    #[test]
    fn test_round_trip_every_byte_value() {
        let payload: Vec<u8> = (0..=255).collect();
        let frame = FrameCodec::encode(addr(127), MessageType::Transmit, &payload);
        let decoded = FrameCodec::decode(&frame).unwrap();
        assert_eq!(decoded.address, addr(127));
        assert_eq!(decoded.message_type, b'T');
        assert_eq!(decoded.payload, payload);

        for byte in [0u8, 2, 3, 16, 255] {
            let frame = FrameCodec::encode(addr(9), MessageType::Init, &[byte, byte]);
            assert_eq!(FrameCodec::decode(&frame).unwrap().payload, vec![byte, byte]);
        }
    }

    #[test]
    fn test_decode_rejects_unescaped_stx() {
        let frame = [0x02, 70, b'R', 1, 0x02, 0x03];
        assert!(matches!(
            FrameCodec::decode(&frame),
            Err(CmriError::Framing { byte: 0x02, .. })
        ));
    }

    #[test]
    fn test_decode_incomplete() {
        assert!(matches!(
            FrameCodec::decode(&[0xFF, 0xFF]),
            Err(CmriError::IncompleteFrame(_))
        ));
        assert!(matches!(
            FrameCodec::decode(&[0x02, 70, b'R', 1, 4]),
            Err(CmriError::IncompleteFrame(_))
        ));
        assert!(matches!(
            FrameCodec::decode(&[0x02, 70, b'R', 0x10]),
            Err(CmriError::IncompleteFrame(_))
        ));
    }

    #[test]
    fn test_read_payload_byte() {
        let a = addr(5);
        let mut source = vec![0x10, 0x03, 0x07, 0x03].into_iter();
        let mut next = || -> CmriResult<u8> { Ok(source.next().unwrap()) };

        assert_eq!(FrameCodec::read_payload_byte(a, &mut next).unwrap(), 0x03);
        assert_eq!(FrameCodec::read_payload_byte(a, &mut next).unwrap(), 0x07);
        assert!(matches!(
            FrameCodec::read_payload_byte(a, &mut next),
            Err(CmriError::Framing { byte: 0x03, .. })
        ));
    }
}
