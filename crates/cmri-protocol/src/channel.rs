//! Byte transport abstraction.
//!
//! The protocol engine never opens a port itself. It talks to anything that
//! can report how many bytes are waiting, hand them over one at a time, and
//! accept writes whose completion can be observed by polling a pending-write
//! counter.

use std::collections::VecDeque;
use std::io;
use std::thread;
use std::time::Duration;
use tracing::trace;

/// A byte-oriented duplex link to the nodes.
pub trait Channel {
    /// Number of received bytes waiting to be read.
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Consume one received byte. Only called after
    /// [`bytes_available`](Channel::bytes_available) reported data.
    fn read_byte(&mut self) -> io::Result<u8>;

    /// Queue bytes for transmission.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Number of written bytes not yet sent on the wire.
    fn bytes_pending_write(&mut self) -> io::Result<usize>;

    /// Drop everything in the receive buffer.
    fn discard_input(&mut self) -> io::Result<()>;

    /// Drop everything in the transmit buffer.
    fn discard_output(&mut self) -> io::Result<()>;
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn bytes_available(&mut self) -> io::Result<usize> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        (**self).read_byte()
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }

    fn bytes_pending_write(&mut self) -> io::Result<usize> {
        (**self).bytes_pending_write()
    }

    fn discard_input(&mut self) -> io::Result<()> {
        (**self).discard_input()
    }

    fn discard_output(&mut self) -> io::Result<()> {
        (**self).discard_output()
    }
}

/// Discard pending output, write `frame`, then wait until the transport
/// reports nothing left to send, sleeping `pause` between checks.
pub fn write_and_drain<C: Channel + ?Sized>(
    channel: &mut C,
    frame: &[u8],
    pause: Duration,
) -> io::Result<()> {
    channel.discard_output()?;
    channel.write(frame)?;
    loop {
        let pending = channel.bytes_pending_write()?;
        if pending == 0 {
            return Ok(());
        }
        trace!(pending, "waiting for transmit buffer to drain");
        thread::sleep(pause);
    }
}

// ============================================================================
// In-memory Channel
// ============================================================================

/// A scripted in-memory [`Channel`].
///
/// Bytes pushed with [`push_inbound`](MemoryChannel::push_inbound) are
/// readable immediately. Replies queued with
/// [`queue_reply`](MemoryChannel::queue_reply) become readable one per
/// write, the way a node answers a request; this matters because a poll
/// discards stale input before it transmits.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    inbound: VecDeque<u8>,
    replies: VecDeque<Vec<u8>>,
    writes: Vec<Vec<u8>>,
    reported_available: Option<usize>,
    availability_checks: usize,
    bytes_read: usize,
}

impl MemoryChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make bytes readable right away.
    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes);
    }

    /// Queue bytes that become readable after the next write.
    pub fn queue_reply(&mut self, bytes: &[u8]) {
        self.replies.push_back(bytes.to_vec());
    }

    /// Override the count reported by `bytes_available`, e.g. to simulate an
    /// overrun. `None` reports the real queue length.
    pub fn set_reported_available(&mut self, available: Option<usize>) {
        self.reported_available = available;
    }

    /// Each `write` call, in order.
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// All written bytes concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.writes.concat()
    }

    /// How many times `bytes_available` was queried.
    pub fn availability_checks(&self) -> usize {
        self.availability_checks
    }

    /// How many bytes were consumed by `read_byte`.
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    /// Bytes still waiting to be read.
    pub fn remaining_inbound(&self) -> usize {
        self.inbound.len()
    }

    /// Replies not yet released by a write.
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }
}

impl Channel for MemoryChannel {
    fn bytes_available(&mut self) -> io::Result<usize> {
        self.availability_checks += 1;
        Ok(self.reported_available.unwrap_or(self.inbound.len()))
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let byte = self
            .inbound
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no inbound bytes"))?;
        self.bytes_read += 1;
        Ok(byte)
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writes.push(bytes.to_vec());
        if let Some(reply) = self.replies.pop_front() {
            self.inbound.extend(reply);
        }
        Ok(())
    }

    fn bytes_pending_write(&mut self) -> io::Result<usize> {
        Ok(0)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.inbound.clear();
        Ok(())
    }

    fn discard_output(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reports pending bytes for a fixed number of checks.
    struct SlowDrain {
        inner: MemoryChannel,
        pending_checks: usize,
        discarded_output: bool,
    }

    impl Channel for SlowDrain {
        fn bytes_available(&mut self) -> io::Result<usize> {
            self.inner.bytes_available()
        }
        fn read_byte(&mut self) -> io::Result<u8> {
            self.inner.read_byte()
        }
        fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
            self.inner.write(bytes)
        }
        fn bytes_pending_write(&mut self) -> io::Result<usize> {
            if self.pending_checks > 0 {
                self.pending_checks -= 1;
                Ok(1)
            } else {
                Ok(0)
            }
        }
        fn discard_input(&mut self) -> io::Result<()> {
            self.inner.discard_input()
        }
        fn discard_output(&mut self) -> io::Result<()> {
            self.discarded_output = true;
            Ok(())
        }
    }

    #[test]
    fn test_write_and_drain_waits_for_pending() {
        let mut channel = SlowDrain {
            inner: MemoryChannel::new(),
            pending_checks: 3,
            discarded_output: false,
        };
        write_and_drain(&mut channel, &[1, 2, 3], Duration::from_millis(1)).unwrap();
        assert_eq!(channel.pending_checks, 0);
        assert!(channel.discarded_output);
        assert_eq!(channel.inner.written(), vec![1, 2, 3]);
    }

    #[test]
    fn test_reply_released_on_write() {
        let mut channel = MemoryChannel::new();
        channel.queue_reply(&[9, 8]);
        assert_eq!(channel.bytes_available().unwrap(), 0);

        channel.write(&[1]).unwrap();
        assert_eq!(channel.bytes_available().unwrap(), 2);
        assert_eq!(channel.read_byte().unwrap(), 9);
        assert_eq!(channel.read_byte().unwrap(), 8);
        assert!(channel.read_byte().is_err());
        assert_eq!(channel.bytes_read(), 2);
    }

    #[test]
    fn test_discard_input_clears_inbound_only() {
        let mut channel = MemoryChannel::new();
        channel.push_inbound(&[1, 2, 3]);
        channel.queue_reply(&[4]);
        channel.discard_input().unwrap();
        assert_eq!(channel.remaining_inbound(), 0);
        assert_eq!(channel.pending_replies(), 1);
    }
}
