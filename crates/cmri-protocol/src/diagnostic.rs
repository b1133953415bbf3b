//! Recoverable protocol anomalies.
//!
//! These never fail a call. The poll engine reports them and then
//! resynchronizes, so the only visible effect is latency and a log line.

use crate::types::NodeAddress;
use std::fmt;
use std::sync::mpsc;
use tracing::warn;

/// An anomaly the poll engine recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// A response carried another node's address. Triggers a full re-poll.
    BadAddress {
        /// Node being polled.
        expected: NodeAddress,
        /// Raw address byte received.
        received: u8,
    },
    /// The byte after the address was not 'R'. Triggers a frame re-sync.
    BadResponseType {
        /// Node being polled.
        address: NodeAddress,
        /// Byte received instead.
        received: u8,
    },
    /// The byte after the payload was not ETX. The payload is still returned.
    MissingEtx {
        /// Node being polled.
        address: NodeAddress,
        /// Byte received instead.
        received: u8,
    },
}

impl Diagnostic {
    /// Node the anomaly relates to.
    pub fn address(&self) -> NodeAddress {
        match *self {
            Diagnostic::BadAddress { expected, .. } => expected,
            Diagnostic::BadResponseType { address, .. } => address,
            Diagnostic::MissingEtx { address, .. } => address,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::BadAddress { expected, received } => write!(
                f,
                "received bad UA byte {} (0x{:02X}) while polling node {}",
                received, received, expected
            ),
            Diagnostic::BadResponseType { address, received } => write!(
                f,
                "received 0x{:02X} instead of 'R' from node {}",
                received, address
            ),
            Diagnostic::MissingEtx { address, received } => write!(
                f,
                "ETX not properly received from node {} (got 0x{:02X})",
                address, received
            ),
        }
    }
}

/// Destination for [`Diagnostic`]s.
pub trait DiagnosticSink {
    /// Handle one diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Drops diagnostics. The engine has already logged each one at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl DiagnosticSink for mpsc::Sender<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        // A dropped receiver only means nobody is listening.
        let _ = self.send(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Box<S> {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Log `diagnostic` and hand it to `sink`.
pub(crate) fn emit(sink: &mut dyn DiagnosticSink, diagnostic: Diagnostic) {
    warn!(node = diagnostic.address().get(), "{}", diagnostic);
    sink.report(diagnostic);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> NodeAddress {
        NodeAddress::new(n).unwrap()
    }

    #[test]
    fn test_vec_sink_records() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        emit(&mut sink, Diagnostic::MissingEtx { address: addr(3), received: 0x41 });
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].address(), addr(3));
    }

    #[test]
    fn test_channel_sink_forwards() {
        let (tx, rx) = mpsc::channel::<Diagnostic>();
        let mut sink = tx;
        emit(&mut sink, Diagnostic::BadAddress { expected: addr(1), received: 70 });
        assert_eq!(
            rx.try_recv().unwrap(),
            Diagnostic::BadAddress { expected: addr(1), received: 70 }
        );

        drop(rx);
        emit(&mut sink, Diagnostic::BadAddress { expected: addr(1), received: 70 });
    }

    #[test]
    fn test_tracing_sink_keeps_nothing() {
        let mut sink = TracingSink;
        emit(&mut sink, Diagnostic::MissingEtx { address: addr(3), received: 0x41 });
        sink.report(Diagnostic::MissingEtx { address: addr(3), received: 0x41 });
    }

    #[test]
    fn test_display_mentions_node() {
        let text = Diagnostic::BadResponseType { address: addr(9), received: 0x51 }.to_string();
        assert!(text.contains("node 9"));
        assert!(text.contains("0x51"));
    }
}
