//! Topology store: the node/port graph discovery builds and the subnet-wide
//! aggregates it maintains. Lives behind one `RwLock`; every mutation below
//! assumes the caller holds it exclusively.

pub mod node;
pub mod port;

use std::io;

use hashbrown::HashMap;

use crate::enums::{IbMtu, IbRate};
use crate::mad::sminfo::IB_SMINFO_STATE_NOTACTIVE;

pub use node::{Node, NodeKind, Switch};
pub use port::{PhysPort, Port, PortKey};

#[derive(Debug, Clone, Default)]
pub struct SubnetOptions {
    /// Do not query SMInfo of other managers seen on the fabric.
    pub ignore_other_sm: bool,
}

/// Another manager observed on the fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteSm {
    pub port_guid: u64,
    /// SMInfo priority (high nibble) and state (low nibble).
    pub pri_state: u8,
}

impl RemoteSm {
    pub fn new(port_guid: u64, pri_state: u8) -> Self {
        RemoteSm { port_guid, pri_state }
    }

    pub fn priority(&self) -> u8 {
        self.pri_state >> 4
    }

    pub fn state(&self) -> u8 {
        self.pri_state & 0x0f
    }

    /// Drops the state back to "not active" until an SMInfo reply says
    /// otherwise.
    pub fn clear_state(&mut self) {
        self.pri_state = (self.pri_state & 0xf0) | IB_SMINFO_STATE_NOTACTIVE;
    }
}

#[derive(Debug)]
pub struct Subnet {
    pub opt: SubnetOptions,
    pub sm_port_guid: u64,
    pub master_sm_base_lid: u16,
    pub min_ca_mtu: IbMtu,
    pub min_ca_rate: IbRate,
    pub in_sweep_hop_0: bool,
    /// Heavy sweep generation. Nodes and ports remember the generation they
    /// were last walked in.
    pub sweep_gen: u64,
    pub node_guid_tbl: HashMap<u64, Node>,
    pub port_guid_tbl: HashMap<u64, Port>,
    pub sm_guid_tbl: HashMap<u64, RemoteSm>,
}

impl Subnet {
    pub fn new(opt: SubnetOptions, sm_port_guid: u64) -> Self {
        Subnet {
            opt,
            sm_port_guid,
            master_sm_base_lid: 0,
            min_ca_mtu: IbMtu::Mtu4096,
            min_ca_rate: IbRate::MAX,
            in_sweep_hop_0: false,
            sweep_gen: 0,
            node_guid_tbl: HashMap::new(),
            port_guid_tbl: HashMap::new(),
            sm_guid_tbl: HashMap::new(),
        }
    }

    /// Opens a new sweep generation and resets the endport minimums.
    pub fn begin_sweep(&mut self) {
        self.sweep_gen = self.sweep_gen.wrapping_add(1);
        self.min_ca_mtu = IbMtu::Mtu4096;
        self.min_ca_rate = IbRate::MAX;
    }

    pub fn node(&self, guid: u64) -> Option<&Node> {
        self.node_guid_tbl.get(&guid)
    }

    pub fn node_mut(&mut self, guid: u64) -> Option<&mut Node> {
        self.node_guid_tbl.get_mut(&guid)
    }

    pub fn port(&self, port_guid: u64) -> Option<&Port> {
        self.port_guid_tbl.get(&port_guid)
    }

    pub fn physp(&self, key: PortKey) -> Option<&PhysPort> {
        self.node_guid_tbl.get(&key.node_guid)?.physp(key.port_num)
    }

    pub fn physp_mut(&mut self, key: PortKey) -> Option<&mut PhysPort> {
        self.node_guid_tbl.get_mut(&key.node_guid)?.physp_mut(key.port_num)
    }

    pub fn remote_of(&self, key: PortKey) -> Option<PortKey> {
        self.physp(key)?.remote
    }

    /// Connects two valid physical ports. Any previous peer of either end is
    /// unlinked first so adjacency stays mutual.
    pub fn link(&mut self, a: PortKey, b: PortKey) -> io::Result<()> {
        for key in [a, b] {
            match self.physp(key) {
                Some(p) if p.valid => {}
                Some(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("port {} of node 0x{:016x} is not discovered", key.port_num, key.node_guid),
                    ));
                }
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("no port {} on node 0x{:016x}", key.port_num, key.node_guid),
                    ));
                }
            }
        }

        if self.remote_of(a) == Some(b) && self.remote_of(b) == Some(a) {
            return Ok(());
        }

        self.unlink(a);
        self.unlink(b);

        if let Some(p) = self.physp_mut(a) {
            p.remote = Some(b);
        }
        if let Some(p) = self.physp_mut(b) {
            p.remote = Some(a);
        }
        log::trace!(
            "[subnet] linked 0x{:016x}:{} <--> 0x{:016x}:{}",
            a.node_guid,
            a.port_num,
            b.node_guid,
            b.port_num
        );
        Ok(())
    }

    /// Clears the adjacency of `key` on both ends. Returns the former peer.
    pub fn unlink(&mut self, key: PortKey) -> Option<PortKey> {
        let peer = self.physp_mut(key)?.remote.take()?;
        if let Some(p) = self.physp_mut(peer) {
            if p.remote == Some(key) {
                p.remote = None;
            }
        }
        Some(peer)
    }
}
