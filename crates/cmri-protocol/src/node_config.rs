//! Node initialization payloads.
//!
//! An init payload is the node type code, the two-byte delay (high byte
//! first), then bytes derived from the node's CT (card type) array:
//!
//! - SMINI: number of two-lead signals, then the six CT bytes. Each run of
//!   set bits in a CT byte must have even length, one signal per bit pair.
//! - MAXI24/MAXI32: card set count, then the CT bytes. A bit pair may not
//!   have both bits set (a slot cannot be input and output at once).
//! - CPNODE: a single zero byte.

use crate::constants::*;
use crate::error::{CmriError, CmriResult};
use crate::settings::ProtocolVariant;
use crate::types::NodeType;

/// Builds init payloads for one protocol variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeConfigEncoder {
    variant: ProtocolVariant,
}

impl NodeConfigEncoder {
    /// Create an encoder for `variant`.
    pub fn new(variant: ProtocolVariant) -> Self {
        NodeConfigEncoder { variant }
    }

    /// The protocol variant in use.
    pub fn variant(&self) -> ProtocolVariant {
        self.variant
    }

    /// Full init payload: type code, delay, then the CT-derived bytes.
    pub fn init_payload(
        &self,
        node_type: NodeType,
        delay: u16,
        ct: Option<&[u8]>,
    ) -> CmriResult<Vec<u8>> {
        let body = self.validate_and_build(node_type, ct)?;
        let mut payload = Vec::with_capacity(3 + body.len());
        payload.push(node_type.code());
        payload.extend_from_slice(&delay.to_be_bytes());
        payload.extend_from_slice(&body);
        Ok(payload)
    }

    /// Validate `ct` for `node_type` and return the type-specific bytes.
    pub fn validate_and_build(
        &self,
        node_type: NodeType,
        ct: Option<&[u8]>,
    ) -> CmriResult<Vec<u8>> {
        if !self.variant.supports(node_type) {
            return Err(CmriError::UnsupportedNodeType {
                node_type,
                variant: self.variant,
            });
        }

        match node_type {
            NodeType::Smini => match ct {
                // No CT array: no two-lead signals.
                None => Ok(vec![0]),
                Some(ct) => {
                    let signals = smini_two_lead_signals(ct)?;
                    Ok(with_count(signals, ct))
                }
            },
            NodeType::Maxi24 | NodeType::Maxi32 => {
                let ct = ct.ok_or(CmriError::MissingConfiguration(node_type))?;
                let count = maxi_card_sets(node_type, ct)?;
                Ok(with_count(count, ct))
            }
            NodeType::Cpnode => Ok(vec![0]),
        }
    }
}

fn with_count(count: u8, ct: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + ct.len());
    out.push(count);
    out.extend_from_slice(ct);
    out
}

/// Count the two-lead signals in an SMINI CT array.
///
/// Bits are scanned low to high with an implicit clear ninth bit, so a run
/// reaching bit 7 is closed too. Every run must be an even number of bits.
pub fn smini_two_lead_signals(ct: &[u8]) -> CmriResult<u8> {
    if ct.len() != SMINI_CT_LEN {
        return Err(CmriError::InvalidCtLength {
            node_type: NodeType::Smini,
            actual: ct.len(),
            expected: "exactly 6",
        });
    }

    let mut signals = 0u8;
    for (index, &value) in ct.iter().enumerate() {
        let mut run = 0u8;
        for bit in 0..=8 {
            if bit < 8 && value & (1 << bit) != 0 {
                run += 1;
                continue;
            }
            if run % 2 != 0 {
                return Err(CmriError::InvalidCtByte {
                    node_type: NodeType::Smini,
                    index,
                    value,
                });
            }
            signals += run / 2;
            run = 0;
        }
    }
    Ok(signals)
}

/// Check the direction bit pairs of a MAXI CT array and return the count
/// byte sent ahead of it.
pub fn maxi_card_sets(node_type: NodeType, ct: &[u8]) -> CmriResult<u8> {
    if ct.is_empty() || ct.len() > u8::MAX as usize {
        return Err(CmriError::InvalidCtLength {
            node_type,
            actual: ct.len(),
            expected: "1 to 255",
        });
    }

    for (index, &value) in ct.iter().enumerate() {
        let conflict = (0..4).any(|pair| (value >> (pair * 2)) & 0b11 == 0b11);
        if conflict {
            return Err(CmriError::InvalidCtByte {
                node_type,
                index,
                value,
            });
        }
    }

    let len = ct.len();
    let count = if len % 4 == 0 { len } else { len / 4 + 1 };
    Ok(count as u8)
}
