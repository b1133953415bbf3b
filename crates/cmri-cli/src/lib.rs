//! Command-line host for C/MRI nodes.
//!
//! Supplies what the protocol crate leaves to its caller: a serial port
//! [`Channel`](cmri_protocol::Channel), a YAML layout file and logging setup.

pub mod config;
pub mod serial;

pub use config::{ConfigError, LayoutConfig, NodeSpec};
pub use serial::SerialChannel;

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` selects debug output
/// and the default is info.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse output bytes written as hex, e.g. `ff000f` or `ff 00 0f`.
pub fn parse_hex_bytes(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(compact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_bytes() {
        assert_eq!(parse_hex_bytes("ff000f").unwrap(), vec![0xFF, 0x00, 0x0F]);
        assert_eq!(parse_hex_bytes("FF 00 0F").unwrap(), vec![0xFF, 0x00, 0x0F]);
        assert!(parse_hex_bytes("f").is_err());
        assert!(parse_hex_bytes("zz").is_err());
    }
}
