use hashbrown::HashMap;

use crate::dr_path::{BindHandle, DrPath};
use crate::mad::{IB_PKEY_BASE_MASK, IB_PKEY_FULL_MEMBER, pkey_table, port_info};

/// Arena key of a physical port: owning node GUID plus port number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortKey {
    pub node_guid: u64,
    pub port_num: u8,
}

impl PortKey {
    pub fn new(node_guid: u64, port_num: u8) -> Self {
        PortKey { node_guid, port_num }
    }
}

/// One physical port of a node. Slots exist for every port number from the
/// moment the node is created but stay invalid until the port is seen.
#[derive(Debug, Clone)]
pub struct PhysPort {
    pub node_guid: u64,
    pub port_num: u8,
    pub port_guid: u64,
    pub dr_path: DrPath,
    pub port_info: port_info,
    pub remote: Option<PortKey>,
    pub got_set_resp: bool,
    pub valid: bool,
    pub pkey_blocks: HashMap<u16, pkey_table>,
    /// Sweep generation this endport was last queried in.
    pub walked_gen: u64,
}

impl PhysPort {
    pub fn new(node_guid: u64, port_num: u8) -> Self {
        PhysPort {
            node_guid,
            port_num,
            port_guid: 0,
            dr_path: DrPath::local(BindHandle::default()),
            port_info: port_info::default(),
            remote: None,
            got_set_resp: false,
            valid: false,
            pkey_blocks: HashMap::new(),
            walked_gen: 0,
        }
    }

    pub fn key(&self) -> PortKey {
        PortKey::new(self.node_guid, self.port_num)
    }

    pub fn init(&mut self, port_guid: u64, dr_path: DrPath) {
        self.port_guid = port_guid;
        self.dr_path = dr_path;
        self.port_info = port_info::default();
        self.remote = None;
        self.got_set_resp = false;
        self.pkey_blocks.clear();
        self.valid = true;
    }

    pub fn set_port_info(&mut self, pi: &port_info) {
        self.port_info = *pi;
    }

    pub fn pkeys(&self) -> impl Iterator<Item = u16> + '_ {
        self.pkey_blocks.values().flat_map(|blk| blk.pkeys())
    }

    /// Whether the two ports are in a common partition. A port with no
    /// table recorded yet is treated as sharing with everyone.
    pub fn shares_pkey_with(&self, other: &PhysPort) -> bool {
        if self.pkey_blocks.is_empty() || other.pkey_blocks.is_empty() {
            return true;
        }

        let ours: Vec<u16> = self.pkeys().filter(|k| k & IB_PKEY_BASE_MASK != 0).collect();
        other
            .pkeys()
            .filter(|k| k & IB_PKEY_BASE_MASK != 0)
            .any(|theirs| {
                ours.iter().any(|&k| {
                    k & IB_PKEY_BASE_MASK == theirs & IB_PKEY_BASE_MASK && (k | theirs) & IB_PKEY_FULL_MEMBER != 0
                })
            })
    }

    /// First and last LID of the port's range, `base .. base + 2^LMC - 1`.
    pub fn lid_range(&self) -> (u16, u16) {
        let base = self.port_info.lid();
        let span = (1u16 << self.port_info.lmc()) - 1;
        (base, base.saturating_add(span))
    }
}

/// Logical port: one per port GUID. A switch has a single one (its port 0
/// GUID) covering every physical port; a CA has one per physical port.
#[derive(Debug, Clone)]
pub struct Port {
    pub port_guid: u64,
    pub node_guid: u64,
    pub discovery_count: u32,
    pub default_port_num: u8,
    pub physp_nums: Vec<u8>,
}

impl Port {
    pub fn new(port_guid: u64, node_guid: u64, default_port_num: u8) -> Self {
        Port {
            port_guid,
            node_guid,
            discovery_count: 0,
            default_port_num,
            physp_nums: vec![default_port_num],
        }
    }

    pub fn add_new_physp(&mut self, port_num: u8) {
        if !self.physp_nums.contains(&port_num) {
            self.physp_nums.push(port_num);
        }
    }

    pub fn default_key(&self) -> PortKey {
        PortKey::new(self.node_guid, self.default_port_num)
    }
}
