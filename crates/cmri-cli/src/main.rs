//! `cmri` - initialize, poll and drive C/MRI nodes on a serial port.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use cmri_cli::{
    config::validate_baud, init_logging, parse_hex_bytes, serial, LayoutConfig, SerialChannel,
};
use cmri_protocol::{NodeAddress, NodeSession, NodeType};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cmri", version, about = "Host for C/MRI railroad I/O nodes")]
struct Cli {
    /// Layout file (YAML) with port, session settings and nodes.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serial device, overrides the layout file.
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// Baud rate, overrides the layout file.
    #[arg(short, long, global = true)]
    baud: Option<u32>,

    /// Debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize nodes from the layout file, or a single node.
    Init {
        /// Only this node.
        #[arg(short, long)]
        address: Option<u8>,
        /// Node type when the node is not in the layout file.
        #[arg(short = 't', long)]
        node_type: Option<NodeType>,
    },
    /// Poll a node and print its input bytes.
    Poll {
        #[arg(short, long)]
        address: u8,
        /// Print JSON instead of hex.
        #[arg(long)]
        json: bool,
    },
    /// Send output bytes (hex) to a node.
    Output {
        #[arg(short, long)]
        address: u8,
        /// Output bytes, e.g. "ff000f".
        bytes: String,
    },
    /// List serial ports.
    Ports,
}

#[derive(Serialize)]
struct PollReport {
    address: u8,
    inputs: Vec<u8>,
}

fn main() -> Result<()> {
    let Cli {
        config,
        port,
        baud,
        verbose,
        command,
    } = Cli::parse();
    init_logging(verbose);

    match command {
        Command::Ports => {
            for port in serial::available_ports().context("listing serial ports")? {
                println!("{}", port);
            }
        }
        Command::Init { address, node_type } => {
            let (layout, mut session) = connect(config.as_deref(), port, baud)?;
            let targets = match address {
                Some(address) => {
                    let address = NodeAddress::new(address)?;
                    let entry = layout.node(address);
                    let node_type = node_type.or(entry.map(|s| s.node_type)).with_context(|| {
                        format!("node {} is not in the layout; pass --node-type", address)
                    })?;
                    vec![(address, node_type, entry.and_then(|s| s.ct.clone()))]
                }
                None => layout
                    .nodes
                    .iter()
                    .map(|s| (s.address, s.node_type, s.ct.clone()))
                    .collect(),
            };
            if targets.is_empty() {
                bail!("no nodes to initialize");
            }
            for (address, node_type, ct) in targets {
                session
                    .init(address, node_type, ct.as_deref())
                    .with_context(|| format!("initializing {} node {}", node_type, address))?;
            }
            info!("initialization complete");
        }
        Command::Poll { address, json } => {
            let address = NodeAddress::new(address)?;
            let (_, mut session) = connect(config.as_deref(), port, baud)?;
            let inputs = session
                .poll(address)
                .with_context(|| format!("polling node {}", address))?;
            if json {
                let report = PollReport { address: address.get(), inputs };
                println!("{}", serde_json::to_string(&report)?);
            } else {
                println!("{}", hex::encode(&inputs));
            }
        }
        Command::Output { address, bytes } => {
            let address = NodeAddress::new(address)?;
            let bytes = parse_hex_bytes(&bytes).context("output bytes must be hex")?;
            let (_, mut session) = connect(config.as_deref(), port, baud)?;
            session
                .output(address, &bytes)
                .with_context(|| format!("sending outputs to node {}", address))?;
        }
    }

    Ok(())
}

/// Load the layout, apply command-line overrides and open the port.
fn connect(
    config: Option<&Path>,
    port: Option<String>,
    baud: Option<u32>,
) -> Result<(LayoutConfig, NodeSession<SerialChannel>)> {
    let mut layout = match config {
        Some(path) => LayoutConfig::load(path)
            .with_context(|| format!("loading layout {}", path.display()))?,
        None => LayoutConfig::default(),
    };
    if let Some(port) = port {
        layout.port = Some(port);
    }
    if let Some(baud) = baud {
        validate_baud(baud)?;
        layout.baud = baud;
    }
    let Some(port) = layout.port.clone() else {
        bail!("no serial port given (use --port or set `port` in the layout file)");
    };

    let channel = SerialChannel::open(&port, layout.baud)
        .with_context(|| format!("opening {} at {} baud", port, layout.baud))?;
    let session = NodeSession::new(channel, layout.session.clone())?;
    Ok((layout, session))
}
