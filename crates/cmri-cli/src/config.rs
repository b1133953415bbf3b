//! Layout file describing the serial link and its nodes.
//!
//! ```yaml
//! port: /dev/ttyUSB0
//! baud: 115200
//! session:
//!   max_tries: 1500
//!   variant: extended
//! nodes:
//!   - address: 0
//!     node_type: SMINI
//!     ct: [0, 0, 0, 0, 0, 0]
//!   - address: 3
//!     node_type: MAXI24
//!     ct: [0x01, 0x01]
//! ```

use cmri_protocol::{NodeAddress, NodeType, SessionConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Baud rates C/MRI nodes can be jumpered for.
pub const SUPPORTED_BAUD_RATES: [u32; 5] = [9600, 19200, 28800, 57600, 115200];

/// Default baud rate.
pub const DEFAULT_BAUD: u32 = 115200;

/// Errors loading or validating a layout file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Could not read the file.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// YAML did not parse.
    #[error("failed to parse layout: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Unsupported baud rate.
    #[error("unsupported baud rate {0}: valid rates are 9600, 19200, 28800, 57600 and 115200")]
    InvalidBaud(u32),

    /// The same address appears twice.
    #[error("node address {0} is configured more than once")]
    DuplicateAddress(NodeAddress),

    /// Session settings out of range.
    #[error(transparent)]
    Session(#[from] cmri_protocol::CmriError),
}

/// One node on the link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Node address (UA).
    pub address: NodeAddress,
    /// Hardware type.
    pub node_type: NodeType,
    /// Card type array, if the node type uses one.
    #[serde(default)]
    pub ct: Option<Vec<u8>>,
}

/// Contents of a layout file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Serial device path.
    pub port: Option<String>,
    /// Baud rate.
    pub baud: u32,
    /// Protocol session settings.
    pub session: SessionConfig,
    /// Nodes on the link.
    pub nodes: Vec<NodeSpec>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            port: None,
            baud: DEFAULT_BAUD,
            session: SessionConfig::default(),
            nodes: Vec::new(),
        }
    }
}

impl LayoutConfig {
    /// Load and validate a layout file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Parse and validate layout YAML.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: LayoutConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check baud rate, session limits and address uniqueness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_baud(self.baud)?;
        self.session.validate()?;
        let mut seen = std::collections::HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.address) {
                return Err(ConfigError::DuplicateAddress(node.address));
            }
        }
        Ok(())
    }

    /// Look up a configured node.
    pub fn node(&self, address: NodeAddress) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.address == address)
    }
}

/// Reject baud rates the nodes cannot run at.
pub fn validate_baud(baud: u32) -> Result<(), ConfigError> {
    if SUPPORTED_BAUD_RATES.contains(&baud) {
        Ok(())
    } else {
        Err(ConfigError::InvalidBaud(baud))
    }
}
