//! Node session: init, poll and output over one owned channel.

use crate::channel::{write_and_drain, Channel};
use crate::diagnostic::{DiagnosticSink, TracingSink};
use crate::error::CmriResult;
use crate::node_config::NodeConfigEncoder;
use crate::poll::PollEngine;
use crate::settings::SessionConfig;
use crate::types::{Message, MessageType, NodeAddress, NodeType};
use tracing::{debug, info};

/// Drives the nodes attached to one serial link.
///
/// The session owns its channel and an immutable configuration. All calls
/// are synchronous and one request is in flight at a time; sharing a link
/// between threads means wrapping the session in a mutex.
pub struct NodeSession<C> {
    channel: C,
    config: SessionConfig,
    encoder: NodeConfigEncoder,
    sink: Box<dyn DiagnosticSink + Send>,
}

impl<C: Channel> NodeSession<C> {
    /// Create a session, validating `config`.
    ///
    /// Stale bytes in both directions are discarded.
    pub fn new(mut channel: C, config: SessionConfig) -> CmriResult<Self> {
        config.validate()?;
        channel.discard_input()?;
        channel.discard_output()?;
        Ok(NodeSession {
            channel,
            encoder: NodeConfigEncoder::new(config.variant),
            config,
            sink: Box::new(TracingSink),
        })
    }

    /// Send recovered-anomaly diagnostics to `sink` as well as the log.
    pub fn with_sink(mut self, sink: impl DiagnosticSink + Send + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Initialize a node.
    ///
    /// `ct` is the node's card type array; see
    /// [`NodeConfigEncoder`] for the rules per node type.
    pub fn init(
        &mut self,
        address: NodeAddress,
        node_type: NodeType,
        ct: Option<&[u8]>,
    ) -> CmriResult<()> {
        let payload = self.encoder.init_payload(node_type, self.config.delay, ct)?;
        info!(node = address.get(), %node_type, "initializing node");
        self.transmit(&Message::new(address, MessageType::Init, payload))
    }

    /// Poll a node and return its input bytes.
    pub fn poll(&mut self, address: NodeAddress) -> CmriResult<Vec<u8>> {
        PollEngine::new(address, &self.config).poll(&mut self.channel, self.sink.as_mut())
    }

    /// Send raw output bytes to a node.
    pub fn output(&mut self, address: NodeAddress, bytes: &[u8]) -> CmriResult<()> {
        self.transmit(&Message::new(address, MessageType::Transmit, bytes.to_vec()))
    }

    /// Bind an address and node type.
    pub fn node(&mut self, address: NodeAddress, node_type: NodeType) -> NodeHandle<'_, C> {
        NodeHandle {
            session: self,
            address,
            node_type,
        }
    }

    fn transmit(&mut self, message: &Message) -> CmriResult<()> {
        let frame = message.encode();
        debug!(
            node = message.address.get(),
            len = frame.len(),
            "transmitting {:?}",
            message.message_type
        );
        write_and_drain(&mut self.channel, &frame, self.config.drain_pause())?;
        Ok(())
    }
}

impl<C> NodeSession<C> {
    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The underlying channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// The underlying channel, mutably.
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Give the channel back.
    pub fn into_inner(self) -> C {
        self.channel
    }
}

/// A node address and type bound to a session.
pub struct NodeHandle<'a, C> {
    session: &'a mut NodeSession<C>,
    address: NodeAddress,
    node_type: NodeType,
}

impl<C: Channel> NodeHandle<'_, C> {
    /// The bound address.
    pub fn address(&self) -> NodeAddress {
        self.address
    }

    /// The bound node type.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Initialize the node.
    pub fn init(&mut self, ct: Option<&[u8]>) -> CmriResult<()> {
        self.session.init(self.address, self.node_type, ct)
    }

    /// Poll the node's inputs.
    pub fn poll(&mut self) -> CmriResult<Vec<u8>> {
        self.session.poll(self.address)
    }

    /// Send output bytes to the node.
    pub fn output(&mut self, bytes: &[u8]) -> CmriResult<()> {
        self.session.output(self.address, bytes)
    }
}
