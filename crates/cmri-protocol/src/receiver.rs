//! Bounded-attempt byte reception.
//!
//! The transport only exposes a count of waiting bytes, so waiting for input
//! is a counted poll of that count. A read times out after exactly
//! `max_tries` empty checks.

use crate::channel::Channel;
use crate::error::{CmriError, CmriResult};
use crate::settings::SessionConfig;
use crate::types::NodeAddress;
use std::thread;
use std::time::Duration;

/// Call `attempt` up to `attempts` times until it yields a value.
///
/// Returns `Ok(None)` when the budget runs out, and stops early on the
/// first error. A non-zero `pause` sleeps between attempts; otherwise the
/// loop only issues a spin hint.
pub fn retry_with_budget<T, E, F>(
    attempts: u32,
    pause: Duration,
    mut attempt: F,
) -> Result<Option<T>, E>
where
    F: FnMut() -> Result<Option<T>, E>,
{
    for tried in 0..attempts {
        if let Some(value) = attempt()? {
            return Ok(Some(value));
        }
        if tried + 1 < attempts {
            if pause.is_zero() {
                std::hint::spin_loop();
            } else {
                thread::sleep(pause);
            }
        }
    }
    Ok(None)
}

/// Reads single bytes for one node under a try budget.
#[derive(Debug, Clone, Copy)]
pub struct RetryReceiver {
    address: NodeAddress,
    max_tries: u32,
    max_buf: usize,
    pause: Duration,
}

impl RetryReceiver {
    /// Create a receiver with explicit limits.
    pub fn new(address: NodeAddress, max_tries: u32, max_buf: usize) -> Self {
        RetryReceiver {
            address,
            max_tries,
            max_buf,
            pause: Duration::ZERO,
        }
    }

    /// Create a receiver using a session's limits.
    pub fn from_config(address: NodeAddress, config: &SessionConfig) -> Self {
        RetryReceiver::new(address, config.max_tries, config.max_buf)
            .with_pause(config.attempt_pause())
    }

    /// Sleep `pause` between empty checks.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Read one byte.
    ///
    /// Fails with [`CmriError::Overrun`] as soon as more than `max_buf`
    /// bytes are waiting (nothing is consumed), and with
    /// [`CmriError::Timeout`] once `max_tries` checks found nothing.
    pub fn read_byte<C: Channel + ?Sized>(&self, channel: &mut C) -> CmriResult<u8> {
        let ready = retry_with_budget(self.max_tries, self.pause, || -> CmriResult<Option<()>> {
            let available = channel.bytes_available()?;
            if available > self.max_buf {
                return Err(CmriError::Overrun {
                    address: self.address,
                    available,
                    max_buf: self.max_buf,
                });
            }
            Ok((available > 0).then_some(()))
        })?;

        match ready {
            Some(()) => Ok(channel.read_byte()?),
            None => Err(CmriError::Timeout {
                address: self.address,
                tries: self.max_tries,
            }),
        }
    }
}
