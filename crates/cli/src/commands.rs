//! CLI subcommands.

use clap::Subcommand;
use lfring::{HashRing, Node, RingError, RingState, VirtualNode};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the nodes responsible for each key
    Lookup {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Print every virtual node with its replica owners
    Show,
    /// Print the ring neighbours of the position a key lands on
    Neighbors { key: String },
}

/// Placement of one key.
#[derive(Debug, Serialize)]
pub struct KeyPlacement {
    pub key: String,
    pub virtual_node: VirtualNode,
    pub owners: Vec<Node>,
}

/// Neighbourhood of the position a key lands on.
///
/// The node walks are absent on rings with a single distinct node.
#[derive(Debug, Serialize)]
pub struct Neighbors {
    pub key: String,
    pub virtual_node: VirtualNode,
    pub predecessor: VirtualNode,
    pub successor: VirtualNode,
    pub predecessor_node: Option<VirtualNode>,
    pub successor_node: Option<VirtualNode>,
}

#[derive(Debug)]
pub enum CommandResult {
    Lookup(Vec<KeyPlacement>),
    Show(Arc<RingState>),
    Neighbors(Box<Neighbors>),
}

fn owned(vn: Arc<VirtualNode>) -> VirtualNode {
    VirtualNode::clone(&vn)
}

fn other_owner(walk: lfring::Result<Arc<VirtualNode>>) -> lfring::Result<Option<VirtualNode>> {
    match walk {
        Ok(vn) => Ok(Some(owned(vn))),
        Err(RingError::SingleOwner) => Ok(None),
        Err(err) => Err(err),
    }
}

impl Command {
    pub fn execute(&self, ring: &HashRing) -> anyhow::Result<CommandResult> {
        let result = match self {
            Command::Lookup { keys } => {
                // One snapshot for all keys.
                let snapshot = ring.snapshot();
                let placements = keys
                    .iter()
                    .map(|key| {
                        let vn = snapshot.virtual_node_for_key(key.as_bytes())?;
                        Ok(KeyPlacement {
                            key: key.clone(),
                            virtual_node: VirtualNode::clone(vn),
                            owners: snapshot.nodes_for_key(key.as_bytes())?.to_vec(),
                        })
                    })
                    .collect::<lfring::Result<Vec<_>>>()?;
                CommandResult::Lookup(placements)
            }
            Command::Show => CommandResult::Show(ring.snapshot()),
            Command::Neighbors { key } => CommandResult::Neighbors(Box::new(Neighbors {
                key: key.clone(),
                virtual_node: owned(ring.virtual_node_for_key(key)?),
                predecessor: owned(ring.predecessor(key)?),
                successor: owned(ring.successor(key)?),
                predecessor_node: other_owner(ring.predecessor_node(key))?,
                successor_node: other_owner(ring.successor_node(key))?,
            })),
        };
        Ok(result)
    }
}

impl CommandResult {
    pub fn write<W: Write>(&self, out: &mut W, json: bool) -> anyhow::Result<()> {
        if json {
            match self {
                CommandResult::Lookup(placements) => {
                    serde_json::to_writer_pretty(&mut *out, placements)?
                }
                CommandResult::Show(state) => {
                    serde_json::to_writer_pretty(&mut *out, &state.view())?
                }
                CommandResult::Neighbors(neighbors) => {
                    serde_json::to_writer_pretty(&mut *out, neighbors)?
                }
            }
            writeln!(out)?;
            return Ok(());
        }

        match self {
            CommandResult::Lookup(placements) => {
                for placement in placements {
                    writeln!(
                        out,
                        "{}  ->  {:?}  (at {})",
                        placement.key, placement.owners, placement.virtual_node
                    )?;
                }
            }
            CommandResult::Show(state) => write!(out, "{}", state)?,
            CommandResult::Neighbors(n) => {
                writeln!(out, "key:              {}", n.key)?;
                writeln!(out, "virtual node:     {}", n.virtual_node)?;
                writeln!(out, "predecessor:      {}", n.predecessor)?;
                writeln!(out, "successor:        {}", n.successor)?;
                for (label, walk) in [
                    ("predecessor node", &n.predecessor_node),
                    ("successor node", &n.successor_node),
                ] {
                    match walk {
                        Some(vn) => writeln!(out, "{}: {}", label, vn)?,
                        None => writeln!(out, "{}: none (single node ring)", label)?,
                    }
                }
            }
        }
        Ok(())
    }
}
